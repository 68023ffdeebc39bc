use crate::equation_of_state::EquationVariant;
use crate::errors::MeosResult;
use crate::state::{Phase, PropertyBundle};
use crate::SolverOptions;
use std::fmt;

mod vle_pure;

const TRIVIAL_REL_DEVIATION: f64 = 1e-5;

/// Stages of the saturation solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaturationStage {
    /// Correct the vapor density seed onto the stable vapor branch.
    DryVaporSearch,
    /// Correct the liquid density seed onto the stable liquid branch.
    DryLiquidSearch,
    /// Solve equal pressure and equal Gibbs energy simultaneously.
    SimultaneousRefine,
    Converged,
    Failed,
}

/// Specification of a saturation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TemperatureOrPressure {
    /// K
    Temperature(f64),
    /// Pa
    Pressure(f64),
}

/// Coexisting liquid and vapor of a pure substance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaturationPoint {
    pub temperature: f64,
    pub pressure: f64,
    /// kg/m³
    pub liquid_density: f64,
    /// kg/m³
    pub vapor_density: f64,
    pub molar_weight: f64,
    /// |p(ρ_l) - p(ρ_v)| in Pa
    pub pressure_residual: f64,
    /// |g(ρ_l) - g(ρ_v)| in J/kg
    pub gibbs_residual: f64,
    pub iterations: usize,
    pub stage: SaturationStage,
    /// N/m, if the equation comes with a surface tension correlation
    pub surface_tension: Option<f64>,
}

impl SaturationPoint {
    /// mol/m³
    pub fn liquid_molar_density(&self) -> f64 {
        self.liquid_density / self.molar_weight
    }

    /// mol/m³
    pub fn vapor_molar_density(&self) -> f64 {
        self.vapor_density / self.molar_weight
    }
}

impl fmt::Display for SaturationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T = {:.5} K, p = {:.5} Pa, ρ_l = {:.5} kg/m³, ρ_v = {:.5} kg/m³",
            self.temperature, self.pressure, self.liquid_density, self.vapor_density
        )
    }
}

impl EquationVariant {
    /// Vapor-liquid equilibrium at given temperature or pressure.
    pub fn saturation(
        &self,
        temperature_or_pressure: TemperatureOrPressure,
        options: &SolverOptions,
    ) -> MeosResult<SaturationPoint> {
        match temperature_or_pressure {
            TemperatureOrPressure::Temperature(t) => self.saturation_t(t, options),
            TemperatureOrPressure::Pressure(p) => self.saturation_p(p, options),
        }
    }

    /// Properties of the saturated liquid and the saturated vapor.
    pub fn saturated_states(&self, sat: &SaturationPoint) -> MeosResult<[PropertyBundle; 2]> {
        let state = |density, phase| -> MeosResult<PropertyBundle> {
            let mut state = self.properties(sat.temperature, density)?;
            state.phase = phase;
            state.saturation = Some(*sat);
            Ok(state)
        };
        Ok([
            state(sat.liquid_molar_density(), Phase::SaturatedLiquid)?,
            state(sat.vapor_molar_density(), Phase::SaturatedVapor)?,
        ])
    }

    /// Two-phase state with the given vapor mass fraction.
    pub fn two_phase(&self, sat: &SaturationPoint, quality: f64) -> MeosResult<PropertyBundle> {
        let [liquid, vapor] = self.saturated_states(sat)?;
        if quality <= 0.0 {
            return Ok(liquid);
        }
        if quality >= 1.0 {
            return Ok(vapor);
        }
        let mix = |l: f64, v: f64| l + quality * (v - l);
        let density = 1.0 / mix(1.0 / liquid.density, 1.0 / vapor.density);
        let pressure = sat.pressure;
        Ok(PropertyBundle {
            temperature: sat.temperature,
            pressure,
            density,
            molar_weight: liquid.molar_weight,
            compressibility: pressure * liquid.molar_weight
                / (density * self.gas_constant * sat.temperature),
            internal_energy: mix(liquid.internal_energy, vapor.internal_energy),
            enthalpy: mix(liquid.enthalpy, vapor.enthalpy),
            entropy: mix(liquid.entropy, vapor.entropy),
            gibbs_energy: mix(liquid.gibbs_energy, vapor.gibbs_energy),
            helmholtz_energy: mix(liquid.helmholtz_energy, vapor.helmholtz_energy),
            cv: None,
            cp: None,
            cp0: vapor.cp0,
            speed_of_sound: None,
            fugacity: vapor.fugacity,
            fugacity_coefficient: vapor.fugacity_coefficient,
            dp_dt: None,
            dp_drho: None,
            isothermal_compressibility: None,
            isobaric_expansivity: None,
            joule_thomson: None,
            isentropic_exponent: None,
            phase: Phase::TwoPhase { quality },
            saturation: Some(*sat),
        })
    }
}
