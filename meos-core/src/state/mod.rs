use crate::equation_of_state::{EquationVariant, Substance};
use crate::errors::{MeosError, MeosResult};
use crate::parameter::RegistryError;
use crate::phase_equilibria::{SaturationPoint, TemperatureOrPressure};
use crate::SolverOptions;
use std::fmt;
use std::sync::Arc;

mod properties;
mod resolve;

pub use properties::properties;

/// Phase of a resolved state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    SinglePhase,
    /// Above the critical temperature and pressure.
    Supercritical,
    SaturatedLiquid,
    SaturatedVapor,
    /// Mixture of saturated liquid and vapor with vapor mass fraction `quality`.
    TwoPhase { quality: f64 },
}

/// Properties that can be used to specify a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Property {
    /// K
    Temperature,
    /// Pa
    Pressure,
    /// kg/m³
    Density,
    /// J/kg
    Enthalpy,
    /// J/(kg K)
    Entropy,
    /// J/kg
    InternalEnergy,
    /// Vapor mass fraction
    Quality,
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Density => "density",
            Self::Enthalpy => "enthalpy",
            Self::Entropy => "entropy",
            Self::InternalEnergy => "internal energy",
            Self::Quality => "quality",
        };
        write!(f, "{s}")
    }
}

/// Two independent properties that define a state of a pure substance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StateSpec {
    TemperatureDensity { temperature: f64, density: f64 },
    TemperaturePressure { temperature: f64, pressure: f64 },
    TemperatureQuality { temperature: f64, quality: f64 },
    PressureQuality { pressure: f64, quality: f64 },
    /// Temperature and one of enthalpy, entropy or internal energy.
    Temperature {
        temperature: f64,
        property: Property,
        value: f64,
    },
    /// Pressure and one of density, enthalpy, entropy or internal energy.
    Pressure {
        pressure: f64,
        property: Property,
        value: f64,
    },
}

impl StateSpec {
    /// Build a specification from two property/value pairs in any order.
    pub fn new(a: (Property, f64), b: (Property, f64)) -> MeosResult<Self> {
        use Property::*;
        for (p, v) in [a, b] {
            if !v.is_finite() {
                return Err(MeosError::InvalidInput(format!("{p} = {v}")));
            }
        }
        let spec = match (a, b) {
            ((Temperature, t), (Density, d)) | ((Density, d), (Temperature, t)) => {
                Self::TemperatureDensity {
                    temperature: t,
                    density: d,
                }
            }
            ((Temperature, t), (Pressure, p)) | ((Pressure, p), (Temperature, t)) => {
                Self::TemperaturePressure {
                    temperature: t,
                    pressure: p,
                }
            }
            ((Temperature, t), (Quality, x)) | ((Quality, x), (Temperature, t)) => {
                Self::TemperatureQuality {
                    temperature: t,
                    quality: x,
                }
            }
            ((Pressure, p), (Quality, x)) | ((Quality, x), (Pressure, p)) => Self::PressureQuality {
                pressure: p,
                quality: x,
            },
            ((Temperature, t), (property @ (Enthalpy | Entropy | InternalEnergy), value))
            | ((property @ (Enthalpy | Entropy | InternalEnergy), value), (Temperature, t)) => {
                Self::Temperature {
                    temperature: t,
                    property,
                    value,
                }
            }
            ((Pressure, p), (property @ (Density | Enthalpy | Entropy | InternalEnergy), value))
            | ((property @ (Density | Enthalpy | Entropy | InternalEnergy), value), (Pressure, p)) => {
                Self::Pressure {
                    pressure: p,
                    property,
                    value,
                }
            }
            ((pa, _), (pb, _)) => {
                return Err(MeosError::InvalidInput(format!(
                    "unsupported pair of state variables ({pa}, {pb})"
                )))
            }
        };
        if let Self::TemperatureQuality { quality, .. } | Self::PressureQuality { quality, .. } = spec
        {
            if !(0.0..=1.0).contains(&quality) {
                return Err(MeosError::out_of_range("quality", quality, 0.0, 1.0));
            }
        }
        Ok(spec)
    }
}

/// Thermodynamic properties of a resolved state.
///
/// Specific quantities are given per unit mass, all in SI units.
/// Heat capacities, the speed of sound and the derivatives of the
/// pressure are not defined in the two-phase region.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyBundle {
    pub temperature: f64,
    pub pressure: f64,
    /// kg/m³
    pub density: f64,
    /// kg/mol
    pub molar_weight: f64,
    pub compressibility: f64,
    pub internal_energy: f64,
    pub enthalpy: f64,
    pub entropy: f64,
    pub gibbs_energy: f64,
    pub helmholtz_energy: f64,
    pub cv: Option<f64>,
    pub cp: Option<f64>,
    /// Isobaric heat capacity of the ideal gas
    pub cp0: f64,
    pub speed_of_sound: Option<f64>,
    pub fugacity: f64,
    pub fugacity_coefficient: f64,
    /// (∂p/∂T) at constant density in Pa/K
    pub dp_dt: Option<f64>,
    /// (∂p/∂ρ) at constant temperature in Pa m³/kg
    pub dp_drho: Option<f64>,
    /// 1/Pa
    pub isothermal_compressibility: Option<f64>,
    /// 1/K
    pub isobaric_expansivity: Option<f64>,
    /// K/Pa
    pub joule_thomson: Option<f64>,
    pub isentropic_exponent: Option<f64>,
    pub phase: Phase,
    pub saturation: Option<SaturationPoint>,
}

impl PropertyBundle {
    /// mol/m³
    pub fn molar_density(&self) -> f64 {
        self.density / self.molar_weight
    }

    /// J/mol
    pub fn molar_enthalpy(&self) -> f64 {
        self.enthalpy * self.molar_weight
    }

    /// J/(mol K)
    pub fn molar_entropy(&self) -> f64 {
        self.entropy * self.molar_weight
    }

    /// J/mol
    pub fn molar_internal_energy(&self) -> f64 {
        self.internal_energy * self.molar_weight
    }

    /// J/mol
    pub fn molar_gibbs_energy(&self) -> f64 {
        self.gibbs_energy * self.molar_weight
    }

    /// J/(mol K)
    pub fn molar_cv(&self) -> Option<f64> {
        self.cv.map(|cv| cv * self.molar_weight)
    }

    /// J/(mol K)
    pub fn molar_cp(&self) -> Option<f64> {
        self.cp.map(|cp| cp * self.molar_weight)
    }

    /// Value of one of the properties that can specify a state.
    pub fn get(&self, property: Property) -> Option<f64> {
        match property {
            Property::Temperature => Some(self.temperature),
            Property::Pressure => Some(self.pressure),
            Property::Density => Some(self.density),
            Property::Enthalpy => Some(self.enthalpy),
            Property::Entropy => Some(self.entropy),
            Property::InternalEnergy => Some(self.internal_energy),
            Property::Quality => match self.phase {
                Phase::TwoPhase { quality } => Some(quality),
                Phase::SaturatedLiquid => Some(0.0),
                Phase::SaturatedVapor => Some(1.0),
                _ => None,
            },
        }
    }
}

impl fmt::Display for PropertyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T = {:.5} K, p = {:.5} Pa, ρ = {:.5} kg/m³, h = {:.5} J/kg, s = {:.5} J/(kg K), {:?}",
            self.temperature, self.pressure, self.density, self.enthalpy, self.entropy, self.phase
        )
    }
}

/// Handle to one equation of state of a substance in a registry.
#[derive(Clone, Debug)]
pub struct Fluid {
    substance: Arc<Substance>,
    variant: usize,
}

impl Fluid {
    /// Select an equation of state of the substance, the first one if `variant` is `None`.
    pub fn new(substance: Arc<Substance>, variant: Option<&str>) -> Result<Self, RegistryError> {
        let variant = substance.variant_index(variant)?;
        Ok(Self { substance, variant })
    }

    pub fn substance(&self) -> &Substance {
        &self.substance
    }

    pub fn variant(&self) -> &EquationVariant {
        &self.substance.variants()[self.variant]
    }

    /// Resolve the state given by two independent properties.
    pub fn resolve(&self, spec: StateSpec, options: &SolverOptions) -> MeosResult<PropertyBundle> {
        self.variant().resolve(spec, options)
    }

    /// Properties at given temperature (K) and density (kg/m³).
    pub fn state_t_rho(&self, temperature: f64, density: f64) -> MeosResult<PropertyBundle> {
        self.resolve(
            StateSpec::TemperatureDensity {
                temperature,
                density,
            },
            &SolverOptions::default(),
        )
    }

    /// Properties at given temperature (K) and pressure (Pa).
    pub fn state_t_p(
        &self,
        temperature: f64,
        pressure: f64,
        options: &SolverOptions,
    ) -> MeosResult<PropertyBundle> {
        self.resolve(
            StateSpec::TemperaturePressure {
                temperature,
                pressure,
            },
            options,
        )
    }

    /// Vapor-liquid equilibrium at given temperature or pressure.
    pub fn saturation(
        &self,
        temperature_or_pressure: TemperatureOrPressure,
        options: &SolverOptions,
    ) -> MeosResult<SaturationPoint> {
        self.variant().saturation(temperature_or_pressure, options)
    }

    /// Saturated liquid and vapor states.
    pub fn saturated_states(
        &self,
        temperature_or_pressure: TemperatureOrPressure,
        options: &SolverOptions,
    ) -> MeosResult<[PropertyBundle; 2]> {
        let sat = self.saturation(temperature_or_pressure, options)?;
        self.variant().saturated_states(&sat)
    }

    /// Enthalpy of vaporization in J/kg.
    pub fn enthalpy_of_vaporization(
        &self,
        temperature_or_pressure: TemperatureOrPressure,
        options: &SolverOptions,
    ) -> MeosResult<f64> {
        let [liquid, vapor] = self.saturated_states(temperature_or_pressure, options)?;
        Ok(vapor.enthalpy - liquid.enthalpy)
    }
}
