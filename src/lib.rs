#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
//! Thermodynamic properties of pure fluids from multiparameter Helmholtz
//! energy equations of state, and of gas mixtures from the virial equation.
//!
//! ```no_run
//! use meos::{builtin_registry, resolve_state, Property, SolverOptions};
//!
//! let registry = builtin_registry()?;
//! let state = resolve_state(
//!     &registry,
//!     "R123",
//!     Some("tillner"),
//!     (Property::Temperature, 300.0),
//!     (Property::Pressure, 1e5),
//!     &SolverOptions::default(),
//! )?;
//! println!("{state}");
//! # Ok::<(), meos::MeosError>(())
//! ```
pub use meos_core;
pub use meos_core::parameter::{Registry, RegistryError};
pub use meos_core::{
    EquationVariant, Fluid, MeosError, MeosResult, Phase, Property, PropertyBundle,
    ReferenceState, SaturationPoint, SaturationStage, SolverOptions, StateSpec, Substance,
    TemperatureOrPressure, Verbosity, RGAS,
};

pub mod grid;
pub mod virial;

use virial::{Virial, VirialOptions, VirialProperties};

const SUBSTANCES: &str = include_str!("../parameters/substances.json");

/// Registry with the substances bundled with this crate.
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    Registry::from_json_str(SUBSTANCES)
}

/// Resolve the state of a substance given by two independent properties.
///
/// `variant` selects the equation of state, the first one listed for the
/// substance is used if it is `None`.
pub fn resolve_state(
    registry: &Registry,
    substance: &str,
    variant: Option<&str>,
    a: (Property, f64),
    b: (Property, f64),
    options: &SolverOptions,
) -> MeosResult<PropertyBundle> {
    let fluid = Fluid::new(registry.get(substance)?, variant)?;
    fluid.resolve(StateSpec::new(a, b)?, options)
}

/// Vapor-liquid equilibrium of a substance at given temperature or pressure.
pub fn saturation_at(
    registry: &Registry,
    substance: &str,
    variant: Option<&str>,
    temperature_or_pressure: TemperatureOrPressure,
    options: &SolverOptions,
) -> MeosResult<SaturationPoint> {
    let fluid = Fluid::new(registry.get(substance)?, variant)?;
    fluid.saturation(temperature_or_pressure, options)
}

/// Properties of a gas mixture from the virial equation at given
/// temperature (K) and pressure (Pa).
pub fn virial_properties(
    registry: &Registry,
    substances: &[&str],
    molefracs: &[f64],
    temperature: f64,
    pressure: f64,
    options: &VirialOptions,
) -> MeosResult<VirialProperties> {
    Virial::from_registry(registry, substances, *options)?.properties_tp(
        temperature,
        pressure,
        molefracs,
    )
}
