use approx::assert_relative_eq;
use meos::{builtin_registry, resolve_state, MeosResult, Property, SolverOptions};

/// (T in K, rho in mol/dm³, p in MPa, cv, cp in J/(mol K), w in m/s)
const REFERENCE: [(f64, f64, f64, f64, f64, f64); 2] = [
    (300.0, 9.0, 31.71911, 140.7151, 184.6787, 646.6591),
    (375.0, 3.5, 2.931467, 194.8406, 83893.36, 59.90978),
];

#[test]
fn reference_points() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let substance = registry.get("R227ea")?;
    let molar_weight = substance.molar_weight;
    for (t, rho, p, cv, cp, w) in REFERENCE {
        let state = resolve_state(
            &registry,
            "HFC-227ea",
            None,
            (Property::Temperature, t),
            (Property::Density, rho * 1e3 * molar_weight),
            &SolverOptions::default(),
        )?;
        assert_relative_eq!(state.pressure, p * 1e6, max_relative = 1e-6);
        assert_relative_eq!(state.molar_cv().unwrap_or_default(), cv, max_relative = 1e-6);
        assert_relative_eq!(state.molar_cp().unwrap_or_default(), cp, max_relative = 1e-6);
        assert_relative_eq!(state.speed_of_sound.unwrap_or_default(), w, max_relative = 1e-6);
    }
    Ok(())
}

#[test]
fn ideal_gas_limit() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let state = registry.get("R227ea")?.variant(None)?.properties(300.0, 0.0)?;
    assert_eq!(state.pressure, 0.0);
    assert_relative_eq!(state.molar_cv().unwrap_or_default(), 127.9514, max_relative = 1e-6);
    assert_relative_eq!(state.molar_cp().unwrap_or_default(), 136.2659, max_relative = 1e-6);
    assert_relative_eq!(state.speed_of_sound.unwrap_or_default(), 124.9935, max_relative = 1e-6);
    Ok(())
}

#[test]
fn repeated_resolution_is_idempotent() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let options = SolverOptions::default();
    let resolve = |a, b| resolve_state(&registry, "R227ea", None, a, b, &options);
    let first = resolve((Property::Pressure, 2e6), (Property::Enthalpy, 3.5e5))?;
    let second = resolve(
        (Property::Pressure, first.pressure),
        (Property::Enthalpy, first.enthalpy),
    )?;
    assert_relative_eq!(first.temperature, second.temperature, max_relative = 1e-9);
    assert_relative_eq!(first.density, second.density, max_relative = 1e-9);
    let third = resolve(
        (Property::Temperature, second.temperature),
        (Property::Entropy, second.entropy),
    )?;
    assert_relative_eq!(third.density, second.density, max_relative = 1e-7);
    Ok(())
}
