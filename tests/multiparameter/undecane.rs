use approx::assert_relative_eq;
use meos::{
    builtin_registry, resolve_state, saturation_at, MeosResult, Phase, Property, ReferenceState,
    SolverOptions, TemperatureOrPressure,
};

#[test]
fn reference_state_at_ambient_conditions() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let substance = registry.get("C11")?;
    assert_eq!(substance.variant(None)?.reference_state, ReferenceState::Oto);
    let state = resolve_state(
        &registry,
        "undecane",
        Some("aleksandrov"),
        (Property::Temperature, 298.15),
        (Property::Pressure, 101325.0),
        &SolverOptions::default(),
    )?;
    assert_eq!(state.phase, Phase::SinglePhase);
    assert_relative_eq!(state.enthalpy, 0.0, epsilon = 1e-6);
    assert_relative_eq!(state.entropy, 0.0, epsilon = 1e-8);
    Ok(())
}

#[test]
fn normal_boiling_point() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let sat = saturation_at(
        &registry,
        "1120-21-4",
        None,
        TemperatureOrPressure::Pressure(101325.0),
        &SolverOptions::default(),
    )?;
    assert_relative_eq!(sat.temperature, 468.934, epsilon = 0.01);
    assert_relative_eq!(sat.liquid_molar_density(), 3834.33, max_relative = 1e-4);
    assert_relative_eq!(sat.vapor_molar_density(), 27.9148, max_relative = 1e-4);
    Ok(())
}

#[test]
fn saturation_at_400_k() -> MeosResult<()> {
    let registry = builtin_registry()?;
    let sat = saturation_at(
        &registry,
        "undecane",
        None,
        TemperatureOrPressure::Temperature(400.0),
        &SolverOptions::default(),
    )?;
    assert_relative_eq!(sat.pressure, 12893.2, max_relative = 1e-5);
    assert_relative_eq!(sat.liquid_density, 657.805, max_relative = 1e-5);
    assert_relative_eq!(sat.vapor_density, 0.61629, max_relative = 1e-4);
    Ok(())
}
