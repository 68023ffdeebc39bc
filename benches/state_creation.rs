use criterion::{criterion_group, criterion_main, Criterion};
use meos::{builtin_registry, Fluid, Property, SolverOptions, StateSpec, TemperatureOrPressure};

/// Resolve a state from two independent properties.
fn resolve((fluid, spec): (&Fluid, StateSpec)) {
    fluid.resolve(spec, &SolverOptions::default()).unwrap();
}

/// Saturation for given temperature or pressure.
fn saturation((fluid, t_or_p): (&Fluid, TemperatureOrPressure)) {
    fluid.saturation(t_or_p, &SolverOptions::default()).unwrap();
}

fn bench_states(c: &mut Criterion, group_name: &str, fluid: &Fluid) {
    let options = SolverOptions::default();
    let t = 0.8 * fluid.variant().tc;
    let sat = fluid
        .saturation(TemperatureOrPressure::Temperature(t), &options)
        .unwrap();
    let p = 0.5 * sat.pressure;
    let vapor = fluid.state_t_p(t, p, &options).unwrap();
    let spec = |a, b| StateSpec::new(a, b).unwrap();

    let mut group = c.benchmark_group(group_name);
    group.bench_function("saturation_t", |b| {
        b.iter(|| saturation((fluid, TemperatureOrPressure::Temperature(t))))
    });
    group.bench_function("saturation_p", |b| {
        b.iter(|| saturation((fluid, TemperatureOrPressure::Pressure(sat.pressure))))
    });
    let tp = spec((Property::Temperature, t), (Property::Pressure, p));
    group.bench_function("tp_vapor", |b| b.iter(|| resolve((fluid, tp))));
    let tp = spec((Property::Temperature, t), (Property::Pressure, 2.0 * sat.pressure));
    group.bench_function("tp_liquid", |b| b.iter(|| resolve((fluid, tp))));
    let ph = spec((Property::Pressure, p), (Property::Enthalpy, vapor.enthalpy));
    group.bench_function("ph", |b| b.iter(|| resolve((fluid, ph))));
    let ps = spec((Property::Pressure, p), (Property::Entropy, vapor.entropy));
    group.bench_function("ps", |b| b.iter(|| resolve((fluid, ps))));
    let ts = spec((Property::Temperature, t), (Property::Entropy, vapor.entropy));
    group.bench_function("ts", |b| b.iter(|| resolve((fluid, ts))));
    let px = spec((Property::Pressure, sat.pressure), (Property::Quality, 0.5));
    group.bench_function("px", |b| b.iter(|| resolve((fluid, px))));
}

fn states_multiparameter(c: &mut Criterion) {
    let registry = builtin_registry().unwrap();
    let r227ea = Fluid::new(registry.get("R227ea").unwrap(), None).unwrap();
    bench_states(c, "state_creation_r227ea", &r227ea);
    let r123 = Fluid::new(registry.get("R123").unwrap(), Some("tillner")).unwrap();
    bench_states(c, "state_creation_r123_tillner", &r123);
    let undecane = Fluid::new(registry.get("undecane").unwrap(), None).unwrap();
    bench_states(c, "state_creation_undecane", &undecane);
}

criterion_group!(bench, states_multiparameter);
criterion_main!(bench);
