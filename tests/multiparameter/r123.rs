use approx::assert_relative_eq;
use meos::{
    builtin_registry, resolve_state, saturation_at, Fluid, MeosResult, Phase, Property,
    ReferenceState, SolverOptions, TemperatureOrPressure,
};

const CELSIUS: f64 = 273.15;

/// Saturation states of the Tillner-Roth equation:
/// (t in °C, p in MPa, rho_l, rho_v in kg/m³, h_l, h_v in kJ/kg, s_l, s_v in kJ/(kg K))
const SATURATION_T: [(f64, f64, f64, f64, f64, f64, f64, f64); 7] = [
    (-55.0, 0.00121, 1653.9, 0.1020, 147.12, 349.42, 0.7842, 1.7115),
    (0.0, 0.03265, 1526.1, 2.2417, 200.00, 381.44, 1.0000, 1.6642),
    (50.0, 0.21246, 1397.8, 13.031, 251.06, 411.50, 1.1711, 1.6676),
    (100.0, 0.78553, 1246.9, 46.996, 305.76, 439.77, 1.3271, 1.6862),
    (150.0, 2.09868, 1036.8, 142.23, 367.10, 461.05, 1.4782, 1.7003),
    (180.0, 3.45057, 765.91, 341.95, 416.22, 456.82, 1.5867, 1.6763),
    (183.0, 3.62135, 665.76, 433.97, 426.94, 448.46, 1.6097, 1.6569),
];

/// (p in Pa, t in °C, rho_l, rho_v, h_l, h_v, s_l, s_v)
const SATURATION_P: [(f64, f64, f64, f64, f64, f64, f64, f64); 4] = [
    (1e3, -57.38, 1659.2, 0.0854, 144.90, 348.10, 0.7739, 1.7157),
    (1e4, -23.27, 1581.4, 0.7422, 177.25, 367.59, 0.9130, 1.6747),
    (1e5, 27.46, 1457.6, 6.3918, 227.65, 398.00, 1.0963, 1.6629),
    (1e6, 111.15, 1207.7, 60.445, 318.66, 445.45, 1.3607, 1.6906),
];

/// (t in °C, p in Pa, rho in kg/m³, h in kJ/kg, s in kJ/(kg K))
const SINGLE_PHASE: [(f64, f64, f64, f64, f64); 10] = [
    (0.0, 1e4, 0.6773, 382.19, 1.7306),
    (175.0, 2e4, 0.8225, 511.64, 2.0555),
    (-5.0, 3e4, 1538.2, 195.06, 0.9818),
    (10.0, 5e4, 3.3352, 387.47, 1.6633),
    (100.0, 1e5, 5.0265, 451.10, 1.8209),
    (45.0, 2e5, 1411.4, 245.81, 1.1548),
    (-25.0, 3e5, 1585.9, 175.70, 0.9061),
    (80.0, 5e5, 1311.3, 283.35, 1.2660),
    (120.0, 1e6, 57.583, 453.52, 1.7114),
    (200.0, 2e6, 95.885, 514.78, 1.8225),
];

fn tillner() -> MeosResult<Fluid> {
    let registry = builtin_registry()?;
    Ok(Fluid::new(registry.get("R123")?, Some("tillner"))?)
}

#[test]
fn saturation_temperature_table() -> MeosResult<()> {
    let fluid = tillner()?;
    assert_eq!(fluid.variant().reference_state, ReferenceState::Iir);
    let options = SolverOptions::default();
    for (t, p, rho_l, rho_v, h_l, h_v, s_l, s_v) in SATURATION_T {
        let t = t + CELSIUS;
        let [liquid, vapor] = fluid.saturated_states(TemperatureOrPressure::Temperature(t), &options)?;
        // the tabulated pressure at -55 °C deviates by 6 Pa
        assert_relative_eq!(liquid.pressure, p * 1e6, epsilon = 10.0, max_relative = 1e-5);
        assert_relative_eq!(liquid.density, rho_l, max_relative = 1e-4);
        assert_relative_eq!(vapor.density, rho_v, max_relative = 2e-4);
        assert_relative_eq!(liquid.enthalpy, h_l * 1e3, epsilon = 10.0);
        assert_relative_eq!(vapor.enthalpy, h_v * 1e3, epsilon = 10.0);
        assert_relative_eq!(liquid.entropy, s_l * 1e3, epsilon = 0.1);
        assert_relative_eq!(vapor.entropy, s_v * 1e3, epsilon = 0.1);
    }
    Ok(())
}

#[test]
fn saturation_pressure_table() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let options = SolverOptions::default();
    for (p, t, rho_l, rho_v, h_l, h_v, s_l, s_v) in SATURATION_P {
        let sat = saturation_at(
            &registry,
            "R123",
            Some("tillner"),
            TemperatureOrPressure::Pressure(p),
            &options,
        )?;
        assert_relative_eq!(sat.temperature, t + CELSIUS, epsilon = 0.02);
        assert_relative_eq!(sat.liquid_density, rho_l, max_relative = 1e-4);
        assert_relative_eq!(sat.vapor_density, rho_v, max_relative = 3e-3);

        let liquid = resolve_state(
            &registry,
            "R123",
            Some("tillner"),
            (Property::Pressure, p),
            (Property::Quality, 0.0),
            &options,
        )?;
        let vapor = resolve_state(
            &registry,
            "R123",
            Some("tillner"),
            (Property::Pressure, p),
            (Property::Quality, 1.0),
            &options,
        )?;
        assert_eq!(liquid.phase, Phase::SaturatedLiquid);
        assert_eq!(vapor.phase, Phase::SaturatedVapor);
        assert_relative_eq!(liquid.enthalpy, h_l * 1e3, epsilon = 20.0);
        assert_relative_eq!(vapor.enthalpy, h_v * 1e3, epsilon = 20.0);
        assert_relative_eq!(liquid.entropy, s_l * 1e3, epsilon = 0.1);
        assert_relative_eq!(vapor.entropy, s_v * 1e3, epsilon = 0.1);
    }
    Ok(())
}

#[test]
fn single_phase_table() -> MeosResult<()> {
    let fluid = tillner()?;
    let options = SolverOptions::default();
    for (t, p, rho, h, s) in SINGLE_PHASE {
        let state = fluid.state_t_p(t + CELSIUS, p, &options)?;
        assert_eq!(state.phase, Phase::SinglePhase);
        assert_relative_eq!(state.density, rho, max_relative = 1e-4);
        assert_relative_eq!(state.enthalpy, h * 1e3, epsilon = 10.0);
        assert_relative_eq!(state.entropy, s * 1e3, epsilon = 0.1);
    }
    Ok(())
}

#[test]
fn short_equation() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let fluid = Fluid::new(registry.get("R123")?, Some("shortSpan"))?;
    assert_eq!(fluid.variant().molar_weight, 0.152931);
    let first = fluid.state_t_rho(500.0, 500.0)?;
    assert_relative_eq!(first.cp0, 866.7, epsilon = 0.05);
    assert_relative_eq!(first.pressure, 6.018e6, epsilon = 500.0);
    assert_relative_eq!(first.cp.unwrap_or_default(), 1950.9, epsilon = 0.05);

    let second = fluid.state_t_rho(600.0, 100.0)?;
    assert_relative_eq!(second.enthalpy - first.enthalpy, 144.33e3, epsilon = 5.0);
    assert_relative_eq!(second.entropy - first.entropy, 295.82, epsilon = 0.005);
    Ok(())
}

#[test]
fn enthalpy_of_vaporization() -> MeosResult<()> {
    let fluid = tillner()?;
    let options = SolverOptions::default();
    let dh = fluid.enthalpy_of_vaporization(TemperatureOrPressure::Temperature(CELSIUS), &options)?;
    assert_relative_eq!(dh, 181.44e3, epsilon = 10.0);
    Ok(())
}

#[test]
fn surface_tension() -> MeosResult<()> {
    let fluid = tillner()?;
    let options = SolverOptions::default();
    // 15.2 mN/m at 25 °C
    let sat = fluid.saturation(TemperatureOrPressure::Temperature(25.0 + CELSIUS), &options)?;
    let sigma = sat.surface_tension.unwrap_or(f64::NAN);
    assert_relative_eq!(sigma, 15.2e-3, epsilon = 1e-4);
    assert_eq!(fluid.variant().surface_tension(456.831), Some(0.0));

    let registry = builtin_registry()?;
    let undecane = Fluid::new(registry.get("undecane")?, None)?;
    assert_eq!(undecane.variant().surface_tension(400.0), None);
    Ok(())
}
