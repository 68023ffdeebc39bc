use crate::equation_of_state::{EquationVariant, IdealGasTerm};
use crate::errors::MeosResult;
use crate::state::Property;
use crate::SolverOptions;
use serde::{Deserialize, Serialize};

const NORMAL_PRESSURE: f64 = 101325.0;

/// Convention that fixes the zero point of enthalpy and entropy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceState {
    /// Use the integration constants of the published ideal gas part.
    #[default]
    #[serde(rename = "none")]
    AsPublished,
    /// h = 200 kJ/kg, s = 1 kJ/(kg K) for the saturated liquid at 0 °C.
    #[serde(rename = "IIR")]
    Iir,
    /// h = s = 0 for the saturated liquid at -40 °C.
    #[serde(rename = "ASHRAE")]
    Ashrae,
    /// h = s = 0 for the saturated liquid at the normal boiling point.
    #[serde(rename = "NBP")]
    Nbp,
    /// h = s = 0 at 25 °C and 1 atm.
    #[serde(rename = "OTO")]
    Oto,
}

impl ReferenceState {
    /// Specific enthalpy (J/kg) and entropy (J/(kg K)) at the reference point.
    pub fn target(&self) -> Option<(f64, f64)> {
        match self {
            Self::AsPublished => None,
            Self::Iir => Some((200e3, 1e3)),
            Self::Ashrae | Self::Nbp | Self::Oto => Some((0.0, 0.0)),
        }
    }
}

impl EquationVariant {
    /// Temperature and molar density of the reference point.
    fn reference_point(&self, options: &SolverOptions) -> MeosResult<Option<(f64, f64)>> {
        let point = match self.reference_state {
            ReferenceState::AsPublished => return Ok(None),
            ReferenceState::Iir => {
                let sat = self.saturation_t(273.15, options)?;
                (sat.temperature, sat.liquid_molar_density())
            }
            ReferenceState::Ashrae => {
                let sat = self.saturation_t(233.15, options)?;
                (sat.temperature, sat.liquid_molar_density())
            }
            ReferenceState::Nbp => {
                let sat = self.saturation_p(NORMAL_PRESSURE, options)?;
                (sat.temperature, sat.liquid_molar_density())
            }
            ReferenceState::Oto => (298.15, self.density_tp(298.15, NORMAL_PRESSURE, options)?),
        };
        Ok(Some(point))
    }

    /// Append the ideal gas offset that moves enthalpy and entropy onto
    /// the reference state of the equation.
    pub(crate) fn with_reference_state(mut self) -> MeosResult<Self> {
        let options = SolverOptions::default();
        let (Some((temperature, density)), Some((h_target, s_target))) =
            (self.reference_point(&options)?, self.reference_state.target())
        else {
            return Ok(self);
        };
        let h = self
            .partial_derivatives(Property::Enthalpy, temperature, density)
            .value;
        let s = self
            .partial_derivatives(Property::Entropy, temperature, density)
            .value;
        let rgas = self.gas_constant;
        self.ideal_gas.push(IdealGasTerm::Offset {
            a1: -(s_target * self.molar_weight - s) / rgas,
            a2: (h_target * self.molar_weight - h) / (rgas * self.tc),
        });
        Ok(self)
    }
}
