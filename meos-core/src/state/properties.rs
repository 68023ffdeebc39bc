use super::{Phase, Property, PropertyBundle};
use crate::equation_of_state::{EquationVariant, HelmholtzDerivatives, Order};
use crate::errors::{MeosError, MeosResult};

/// Convert Helmholtz energy derivatives into the properties of a
/// homogeneous state at temperature `T` (K) and molar density `ρ` (mol/m³).
pub fn properties(
    variant: &EquationVariant,
    temperature: f64,
    density: f64,
    derivs: &HelmholtzDerivatives,
) -> MeosResult<PropertyBundle> {
    PropertyBundle::from_derivatives(variant, temperature, density, derivs)
}

impl PropertyBundle {
    pub fn from_derivatives(
        variant: &EquationVariant,
        temperature: f64,
        density: f64,
        derivs: &HelmholtzDerivatives,
    ) -> MeosResult<Self> {
        let HelmholtzDerivatives { ideal: i, residual: r } = derivs;
        let (delta, tau) = variant.reduce(temperature, density);
        let rgas = variant.gas_constant;
        let rt = rgas * temperature;
        let mw = variant.molar_weight;

        let z = 1.0 + delta * r.a_delta;
        let stiffness = 1.0 + 2.0 * delta * r.a_delta + delta * delta * r.a_delta_delta;
        let dp_drho = rt * stiffness;
        if dp_drho <= 0.0 || !dp_drho.is_finite() {
            return Err(MeosError::UnstableState {
                temperature,
                density,
                dp_drho,
            });
        }
        let pressure = density * rt * z;
        let coupling = 1.0 + delta * r.a_delta - delta * tau * r.a_delta_tau;
        let dp_dt = density * rgas * coupling;

        let tau_phi_tau = tau * (i.a_tau + r.a_tau);
        let u = rt * tau_phi_tau;
        let h = rt * (tau_phi_tau + z);
        let s = rgas * (tau_phi_tau - i.a - r.a);
        let a = rt * (i.a + r.a);
        let g = rt * (1.0 + i.a + r.a + delta * r.a_delta);
        let cv = -rgas * tau * tau * (i.a_tau_tau + r.a_tau_tau);
        let cp = cv + rgas * coupling * coupling / stiffness;
        let cp0 = rgas * (1.0 - tau * tau * i.a_tau_tau);
        let w2 = rt / mw * cp / cv * stiffness;
        let ln_phi = r.a + delta * r.a_delta - z.ln();
        let isothermal_compressibility = 1.0 / (density * dp_drho);

        let phase = if temperature >= variant.tc && pressure >= variant.pc {
            Phase::Supercritical
        } else {
            Phase::SinglePhase
        };

        Ok(Self {
            temperature,
            pressure,
            density: density * mw,
            molar_weight: mw,
            compressibility: z,
            internal_energy: u / mw,
            enthalpy: h / mw,
            entropy: s / mw,
            gibbs_energy: g / mw,
            helmholtz_energy: a / mw,
            cv: Some(cv / mw),
            cp: Some(cp / mw),
            cp0: cp0 / mw,
            speed_of_sound: Some(w2.sqrt()),
            fugacity: pressure * ln_phi.exp(),
            fugacity_coefficient: ln_phi.exp(),
            dp_dt: Some(dp_dt),
            dp_drho: Some(dp_drho / mw),
            isothermal_compressibility: (density > 0.0).then_some(isothermal_compressibility),
            isobaric_expansivity: (density > 0.0).then_some(isothermal_compressibility * dp_dt),
            joule_thomson: (density > 0.0).then(|| {
                (temperature * dp_dt / (density * density * dp_drho) - 1.0 / density) / cp
            }),
            isentropic_exponent: (pressure > 0.0).then(|| density * mw * w2 / pressure),
            phase,
            saturation: None,
        })
    }
}

/// Value of a state variable in molar units and its partial derivatives
/// with respect to temperature (at constant density) and molar density
/// (at constant temperature).
#[derive(Clone, Copy, Debug)]
pub(crate) struct PartialDerivatives {
    pub value: f64,
    pub d_dt: f64,
    pub d_drho: f64,
}

impl EquationVariant {
    /// Properties of the homogeneous state at `T` (K) and `ρ` (mol/m³).
    pub fn properties(&self, temperature: f64, density: f64) -> MeosResult<PropertyBundle> {
        let (delta, tau) = self.reduce(temperature, density);
        let derivs = self.evaluate(delta, tau, Order::Second);
        PropertyBundle::from_derivatives(self, temperature, density, &derivs)
    }

    /// Molar value of a state variable with its derivatives, used for the
    /// Jacobian of the state resolution.
    pub(crate) fn partial_derivatives(
        &self,
        property: Property,
        temperature: f64,
        density: f64,
    ) -> PartialDerivatives {
        let (delta, tau) = self.reduce(temperature, density);
        let HelmholtzDerivatives { ideal: i, residual: r } =
            self.evaluate(delta, tau, Order::Second);
        let rgas = self.gas_constant;
        let rt = rgas * temperature;
        let coupling = 1.0 + delta * r.a_delta - delta * tau * r.a_delta_tau;
        let cv = -rgas * tau * tau * (i.a_tau_tau + r.a_tau_tau);
        let tau_phi_tau = tau * (i.a_tau + r.a_tau);
        let (value, d_dt, d_drho) = match property {
            Property::Temperature => (temperature, 1.0, 0.0),
            Property::Density => (density, 0.0, 1.0),
            Property::Pressure => (
                density * rt * (1.0 + delta * r.a_delta),
                density * rgas * coupling,
                rt * (1.0 + 2.0 * delta * r.a_delta + delta * delta * r.a_delta_delta),
            ),
            Property::Enthalpy => (
                rt * (1.0 + tau_phi_tau + delta * r.a_delta),
                cv + rgas * coupling,
                rt / density
                    * (delta * tau * r.a_delta_tau
                        + delta * r.a_delta
                        + delta * delta * r.a_delta_delta),
            ),
            Property::Entropy => (
                rgas * (tau_phi_tau - i.a - r.a),
                cv / temperature,
                -rgas / density * coupling,
            ),
            Property::InternalEnergy => (
                rt * tau_phi_tau,
                cv,
                rt / density * delta * tau * r.a_delta_tau,
            ),
            // not a property of a homogeneous state
            Property::Quality => (f64::NAN, 0.0, 0.0),
        };
        PartialDerivatives {
            value,
            d_dt,
            d_drho,
        }
    }
}
