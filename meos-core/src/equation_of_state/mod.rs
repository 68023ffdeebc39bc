use crate::parameter::{
    check_positive, EquationRecord, Identifier, RegistryError, SubstanceRecord, VirialTableRecord,
};
use crate::ReferenceState;
use num_dual::{first_derivative, second_derivative, Dual2_64, Dual64, DualNum, HyperDual64};
use num_traits::Zero;

mod ancillary;
mod ideal_gas;
mod residual;
pub use ancillary::{Ancillary, AncillaryKind, SurfaceTension};
pub use ideal_gas::{IdealGasTerm, IdealGasTermJson};
pub use residual::{ResidualTerm, ResidualTermJson};

/// Highest order of derivatives that is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Order {
    Zero,
    First,
    Second,
}

/// Reduced Helmholtz energy `φ = a/(RT)` and its partial derivatives.
///
/// Derivatives above the requested [Order] are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReducedHelmholtz {
    pub a: f64,
    pub a_delta: f64,
    pub a_tau: f64,
    pub a_delta_delta: f64,
    pub a_tau_tau: f64,
    pub a_delta_tau: f64,
}

/// Ideal gas and residual contributions, kept separate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HelmholtzDerivatives {
    pub ideal: ReducedHelmholtz,
    pub residual: ReducedHelmholtz,
}

/// A multiparameter equation of state for a pure substance.
///
/// All quantities in SI units, amounts in mol.
#[derive(Clone, Debug)]
pub struct EquationVariant {
    pub id: String,
    pub reference: String,
    pub gas_constant: f64,
    /// Reducing temperature
    pub tc: f64,
    /// Reducing density in mol/m³
    pub rhoc: f64,
    pub pc: f64,
    pub molar_weight: f64,
    pub t_min: f64,
    pub t_max: f64,
    pub p_max: f64,
    pub rho_max: f64,
    pub reference_state: ReferenceState,
    pub(crate) ideal_gas: Vec<IdealGasTerm>,
    pub(crate) residual: Vec<ResidualTerm>,
    pub vapor_pressure: Ancillary,
    pub liquid_density: Ancillary,
    pub vapor_density: Ancillary,
    pub(crate) surface_tension: Option<SurfaceTension>,
}

impl EquationVariant {
    fn from_record(substance: &SubstanceRecord, record: EquationRecord) -> Result<Self, RegistryError> {
        let context = format!("{}/{}", substance.identifier.name, record.id);
        let mut ideal_gas = Vec::new();
        for table in &record.ideal_gas {
            ideal_gas.extend(table.terms(&context)?);
        }
        let mut residual = Vec::new();
        for table in &record.residual {
            residual.extend(table.terms(&context)?);
        }
        if residual.is_empty() {
            return Err(RegistryError::InconsistentTable(
                context,
                "no residual terms".into(),
            ));
        }
        let ancillary = record.ancillary;
        ancillary.vapor_pressure.validate(&context)?;
        ancillary.liquid_density.validate(&context)?;
        ancillary.vapor_density.validate(&context)?;
        if let Some(sigma) = &record.surface_tension {
            sigma.validate(&context)?;
        }

        let variant = Self {
            gas_constant: record.gas_constant,
            tc: record.tc.unwrap_or(substance.tc),
            rhoc: record.rhoc.unwrap_or(substance.rhoc),
            pc: record.pc.unwrap_or(substance.pc),
            molar_weight: record.molar_weight.unwrap_or(substance.molar_weight),
            t_min: record.t_min.unwrap_or(substance.tt).max(substance.tt),
            t_max: record.t_max,
            p_max: record.p_max,
            rho_max: record.rho_max,
            reference_state: record.reference_state,
            id: record.id,
            reference: record.reference,
            ideal_gas,
            residual,
            vapor_pressure: ancillary.vapor_pressure,
            liquid_density: ancillary.liquid_density,
            vapor_density: ancillary.vapor_density,
            surface_tension: record.surface_tension,
        };
        for (name, value) in [
            ("gas_constant", variant.gas_constant),
            ("tc", variant.tc),
            ("rhoc", variant.rhoc),
            ("pc", variant.pc),
            ("molar_weight", variant.molar_weight),
            ("t_max", variant.t_max - variant.t_min),
            ("p_max", variant.p_max),
            ("rho_max", variant.rho_max - variant.rhoc),
        ] {
            check_positive(&context, name, value)?;
        }
        variant
            .with_reference_state()
            .map_err(|e| RegistryError::ReferenceState(context, e.to_string()))
    }

    /// Surface tension (N/m) of the saturated liquid at `T`, if the
    /// equation comes with a correlation.
    pub fn surface_tension(&self, temperature: f64) -> Option<f64> {
        self.surface_tension
            .as_ref()
            .map(|sigma| sigma.value(temperature, self.tc))
    }

    /// Reduced residual Helmholtz energy.
    pub fn phi_r<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        self.residual
            .iter()
            .fold(D::zero(), |acc, r| acc + r.evaluate(delta, tau))
    }

    /// Reduced ideal gas Helmholtz energy without the `ln δ` term.
    pub fn phi_0_tau<D: DualNum<f64> + Copy>(&self, tau: D) -> D {
        self.ideal_gas
            .iter()
            .fold(D::zero(), |acc, r| acc + r.evaluate(tau, self.tc))
    }

    /// Evaluate the ideal gas and residual parts up to the given order.
    pub fn evaluate(&self, delta: f64, tau: f64, order: Order) -> HelmholtzDerivatives {
        HelmholtzDerivatives {
            ideal: self.ideal_derivatives(delta, tau, order),
            residual: self.residual_derivatives(delta, tau, order),
        }
    }

    pub fn residual_derivatives(&self, delta: f64, tau: f64, order: Order) -> ReducedHelmholtz {
        match order {
            Order::Zero => ReducedHelmholtz {
                a: self.phi_r(delta, tau),
                ..Default::default()
            },
            Order::First => {
                let (a, a_delta) = first_derivative(|d| self.phi_r(d, Dual64::from(tau)), delta);
                let (_, a_tau) = first_derivative(|t| self.phi_r(Dual64::from(delta), t), tau);
                ReducedHelmholtz {
                    a,
                    a_delta,
                    a_tau,
                    ..Default::default()
                }
            }
            Order::Second => {
                let (a, a_delta, a_delta_delta) =
                    second_derivative(|d| self.phi_r(d, Dual2_64::from(tau)), delta);
                let (_, a_tau, a_tau_tau) =
                    second_derivative(|t| self.phi_r(Dual2_64::from(delta), t), tau);
                let a_delta_tau = self
                    .phi_r(
                        HyperDual64::new(delta, 1.0, 0.0, 0.0),
                        HyperDual64::new(tau, 0.0, 1.0, 0.0),
                    )
                    .eps1eps2;
                ReducedHelmholtz {
                    a,
                    a_delta,
                    a_tau,
                    a_delta_delta,
                    a_tau_tau,
                    a_delta_tau,
                }
            }
        }
    }

    pub fn ideal_derivatives(&self, delta: f64, tau: f64, order: Order) -> ReducedHelmholtz {
        let ln_delta = delta.ln();
        match order {
            Order::Zero => ReducedHelmholtz {
                a: ln_delta + self.phi_0_tau(tau),
                ..Default::default()
            },
            Order::First => {
                let (a, a_tau) = first_derivative(|t| self.phi_0_tau(t), tau);
                ReducedHelmholtz {
                    a: ln_delta + a,
                    a_delta: delta.recip(),
                    a_tau,
                    ..Default::default()
                }
            }
            Order::Second => {
                let (a, a_tau, a_tau_tau) = second_derivative(|t| self.phi_0_tau(t), tau);
                ReducedHelmholtz {
                    a: ln_delta + a,
                    a_delta: delta.recip(),
                    a_tau,
                    a_delta_delta: -delta.powi(-2),
                    a_tau_tau,
                    a_delta_tau: 0.0,
                }
            }
        }
    }

    /// Reduced variables `(δ, τ)` of a state given in K and mol/m³.
    pub fn reduce(&self, temperature: f64, density: f64) -> (f64, f64) {
        (density / self.rhoc, self.tc / temperature)
    }

    /// Pressure and its derivative with respect to the molar density.
    pub(crate) fn p_dpdrho(&self, temperature: f64, density: f64) -> (f64, f64) {
        let (delta, tau) = self.reduce(temperature, density);
        let (_, phi_d, phi_dd) = second_derivative(|d| self.phi_r(d, Dual2_64::from(tau)), delta);
        let rt = self.gas_constant * temperature;
        (
            density * rt * (1.0 + delta * phi_d),
            rt * (1.0 + 2.0 * delta * phi_d + delta * delta * phi_dd),
        )
    }

    /// Molar Gibbs energy difference to the ideal gas at unit reduced density, divided by RT.
    pub(crate) fn reduced_chemical_potential(&self, temperature: f64, density: f64) -> f64 {
        let (delta, tau) = self.reduce(temperature, density);
        let (phi, phi_d) = first_derivative(|d| self.phi_r(d, Dual64::from(tau)), delta);
        phi + delta * phi_d + delta.ln()
    }

    /// Second and third virial coefficient of the equation of state
    /// in m³/mol and m⁶/mol².
    pub fn virial_coefficients(&self, temperature: f64) -> (f64, f64) {
        let tau = self.tc / temperature;
        let (_, phi_d, phi_dd) = second_derivative(|d| self.phi_r(d, Dual2_64::from(tau)), 0.0);
        (phi_d / self.rhoc, phi_dd / (self.rhoc * self.rhoc))
    }
}

/// A pure substance: critical constants and available equations of state.
#[derive(Clone, Debug)]
pub struct Substance {
    pub identifier: Identifier,
    pub tc: f64,
    pub pc: f64,
    /// Critical density in mol/m³
    pub rhoc: f64,
    pub molar_weight: f64,
    pub acentric_factor: f64,
    pub dipole: f64,
    pub tt: f64,
    pub tb: Option<f64>,
    pub virial: Vec<VirialTableRecord>,
    variants: Vec<EquationVariant>,
}

impl Substance {
    pub fn from_record(mut record: SubstanceRecord) -> Result<Self, RegistryError> {
        let name = record.identifier.name.clone();
        for (property, value) in [
            ("tc", record.tc),
            ("pc", record.pc),
            ("rhoc", record.rhoc),
            ("molar_weight", record.molar_weight),
            ("tt", record.tt),
        ] {
            check_positive(&name, property, value)?;
        }
        for table in &record.virial {
            if table.coefficients.is_empty() {
                return Err(RegistryError::InconsistentTable(
                    name,
                    "empty virial coefficient table".into(),
                ));
            }
        }
        let equations = std::mem::take(&mut record.equations);
        let mut variants = Vec::with_capacity(equations.len());
        for e in equations {
            if variants.iter().any(|v: &EquationVariant| v.id == e.id) {
                return Err(RegistryError::Duplicate(format!("{name}/{}", e.id)));
            }
            variants.push(EquationVariant::from_record(&record, e)?);
        }
        Ok(Self {
            identifier: record.identifier,
            tc: record.tc,
            pc: record.pc,
            rhoc: record.rhoc,
            molar_weight: record.molar_weight,
            acentric_factor: record.acentric_factor,
            dipole: record.dipole,
            tt: record.tt,
            tb: record.tb,
            virial: record.virial,
            variants,
        })
    }

    /// Critical compressibility factor.
    pub fn zc(&self) -> f64 {
        self.pc / (self.rhoc * crate::RGAS * self.tc)
    }

    pub fn variants(&self) -> &[EquationVariant] {
        &self.variants
    }

    /// The equation of state with the given id, or the first one listed.
    pub fn variant(&self, id: Option<&str>) -> Result<&EquationVariant, RegistryError> {
        match id {
            Some(id) => self
                .variants
                .iter()
                .find(|v| v.id.eq_ignore_ascii_case(id))
                .ok_or_else(|| RegistryError::VariantNotFound(self.identifier.name.clone(), id.into())),
            None => self
                .variants
                .first()
                .ok_or_else(|| RegistryError::NoEquationOfState(self.identifier.name.clone())),
        }
    }

    pub(crate) fn variant_index(&self, id: Option<&str>) -> Result<usize, RegistryError> {
        let variant = self.variant(id)?;
        Ok(self
            .variants
            .iter()
            .position(|v| std::ptr::eq(v, variant))
            .unwrap_or(0))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parameter::RegistryRecord;
    use approx::assert_relative_eq;

    pub(crate) const R227EA: &str = r#"{
        "version": "1.0",
        "substances": [{
            "identifier": {"name": "R227ea", "cas": "431-89-0", "formula": "CF3CHFCF3"},
            "tc": 374.9, "pc": 2925000.0, "rhoc": 3495.0,
            "molar_weight": 0.17002886, "acentric_factor": 0.357, "dipole": 1.456,
            "tt": 146.35, "tb": 256.81,
            "equations": [{
                "id": "lemmon",
                "reference": "Lemmon, E.W., Span, R. J. Chem. Eng. Data 60 (2015) 3745-3758",
                "gas_constant": 8.3144621,
                "t_max": 475.0, "p_max": 60.0e6, "rho_max": 11050.0,
                "ideal_gas": [
                    {"type": "Lead", "a1": -15.8291124137, "a2": 11.0879509962},
                    {"type": "LogTau", "a": 3.0},
                    {"type": "PlanckEinstein", "n": [11.43, 12.83], "theta": [403.0, 1428.0]}
                ],
                "residual": [
                    {"type": "Power",
                     "n": [2.024341, -2.60593, 0.4957216, -0.824082, 0.06543703],
                     "d": [1, 1, 2, 2, 4], "t": [0.34, 0.77, 0.36, 0.9, 1.0]},
                    {"type": "Exponential",
                     "n": [-1.02461, 0.6247065, 0.2997521, -0.353917, -1.232043, -0.8824483],
                     "d": [1, 3, 6, 6, 2, 3], "t": [2.82, 2.1, 0.9, 1.13, 3.8, 2.75],
                     "c": [1, 1, 1, 1, 2, 2]},
                    {"type": "Gaussian",
                     "n": [0.1349661, -0.2662928, 0.1764733, 0.01536163, -0.004667185, -11.70854, 0.9114512],
                     "d": [1, 2, 1, 1, 4, 2, 1], "t": [1.5, 2.5, 2.5, 5.4, 4.0, 1.0, 3.5],
                     "alpha": [0.83, 2.19, 2.44, 3.65, 8.88, 8.23, 2.01],
                     "beta": [1.72, 5.2, 2.31, 1.02, 5.63, 50.9, 1.56],
                     "gamma": [0.414, 1.051, 1.226, 1.7, 0.904, 1.42, 0.926],
                     "epsilon": [1.13, 0.71, 1.2, 1.7, 0.546, 0.896, 0.747]}
                ],
                "ancillary": {
                    "vapor_pressure": {"kind": "ExponentialScaled",
                        "n": [-7.7961, 2.1366, -2.6023, -5.7444, 2.3982], "t": [1.0, 1.5, 2.2, 4.8, 6.2]},
                    "liquid_density": {"kind": "Linear",
                        "n": [2.0032, 0.49235, 0.13738, 0.21057, -0.12834], "t": [0.345, 0.74, 1.2, 2.6, 7.2]},
                    "vapor_density": {"kind": "Exponential",
                        "n": [-2.135, -6.8425, -21.447, -204.57, 517.95, -459.08], "t": [0.324, 1.03, 3.0, 7.4, 9.0, 10.0]}
                },
                "surface_tension": {"sigma": [0.06127, -0.009516, -0.00192], "exponent": [1.192, 0.9795, 1.421]}
            }]
        }]
    }"#;

    pub(crate) fn r227ea() -> EquationVariant {
        let mut record: RegistryRecord = serde_json::from_str(R227EA).unwrap();
        let substance = Substance::from_record(record.substances.remove(0)).unwrap();
        substance.variant(None).unwrap().clone()
    }

    #[test]
    fn second_derivatives_match_finite_differences() {
        let eos = r227ea();
        let (delta, tau) = eos.reduce(330.0, 8000.0);
        let r = eos.residual_derivatives(delta, tau, Order::Second);
        let h = 1e-6;
        let first = |d, t| eos.residual_derivatives(d, t, Order::First);
        let (dp, dm) = (first(delta + h, tau), first(delta - h, tau));
        let (tp, tm) = (first(delta, tau + h), first(delta, tau - h));
        assert_relative_eq!(r.a_delta_delta, (dp.a_delta - dm.a_delta) / (2.0 * h), max_relative = 1e-6);
        assert_relative_eq!(r.a_tau_tau, (tp.a_tau - tm.a_tau) / (2.0 * h), max_relative = 1e-6);
        assert_relative_eq!(r.a_delta_tau, (tp.a_delta - tm.a_delta) / (2.0 * h), max_relative = 1e-6);
        assert_relative_eq!(r.a_delta_tau, (dp.a_tau - dm.a_tau) / (2.0 * h), max_relative = 1e-6);

        let f = first(delta, tau);
        assert_eq!(f.a_delta_delta, 0.0);
        assert_relative_eq!(f.a_delta, r.a_delta, max_relative = 1e-14);
        assert_relative_eq!(f.a_tau, r.a_tau, max_relative = 1e-14);
        assert_relative_eq!(eos.residual_derivatives(delta, tau, Order::Zero).a, r.a);
    }

    #[test]
    fn ideal_gas_part_is_density_independent() {
        let eos = r227ea();
        let tau = eos.tc / 300.0;
        let a = eos.ideal_derivatives(0.5, tau, Order::Second);
        let b = eos.ideal_derivatives(2.0, tau, Order::Second);
        assert_relative_eq!(b.a - a.a, 4f64.ln(), max_relative = 1e-14);
        assert_eq!(a.a_tau, b.a_tau);
        assert_relative_eq!(a.a_delta_delta, -4.0);
        assert_eq!(a.a_delta_tau, 0.0);
    }

    #[test]
    fn zero_density_limit() {
        let eos = r227ea();
        let r = eos.residual_derivatives(0.0, eos.tc / 300.0, Order::Second);
        assert_eq!(r.a, 0.0);
        assert!(r.a_delta.is_finite() && r.a_delta_delta.is_finite());
        let (b, c) = eos.virial_coefficients(300.0);
        assert_relative_eq!(b, r.a_delta / eos.rhoc, max_relative = 1e-14);
        assert!(b < 0.0);
        assert!(c.is_finite());
    }

    #[test]
    fn variant_lookup() -> Result<(), RegistryError> {
        let mut record: RegistryRecord = serde_json::from_str(R227EA)?;
        let substance = Substance::from_record(record.substances.remove(0))?;
        assert_eq!(substance.variant(Some("LEMMON"))?.id, "lemmon");
        assert!(matches!(
            substance.variant(Some("span")),
            Err(RegistryError::VariantNotFound(..))
        ));
        Ok(())
    }
}
