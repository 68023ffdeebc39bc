use crate::parameter::RegistryError;
use itertools::izip;
use serde::{Deserialize, Serialize};

/// Functional form of an ancillary equation in `θ = 1 - T/Tc`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AncillaryKind {
    /// `X/Xc = 1 + Σ n θ^t`
    Linear,
    /// `ln(X/Xc) = Σ n θ^t`
    Exponential,
    /// `ln(X/Xc) = Tc/T Σ n θ^t`
    ExponentialScaled,
}

/// Closed form estimate of a saturation property.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ancillary {
    pub kind: AncillaryKind,
    n: Vec<f64>,
    t: Vec<f64>,
}

impl Ancillary {
    pub fn new(kind: AncillaryKind, n: Vec<f64>, t: Vec<f64>) -> Self {
        Self { kind, n, t }
    }

    pub(crate) fn validate(&self, context: &str) -> Result<(), RegistryError> {
        if self.n.is_empty() || self.n.len() != self.t.len() {
            return Err(RegistryError::InconsistentTable(
                context.into(),
                format!("{} coefficients but {} exponents", self.n.len(), self.t.len()),
            ));
        }
        Ok(())
    }

    /// Value relative to its critical value at the given temperature.
    ///
    /// Only meaningful for `T ≤ Tc`.
    pub fn reduced_value(&self, temperature: f64, tc: f64) -> f64 {
        let theta = 1.0 - temperature / tc;
        let sum: f64 = izip!(&self.n, &self.t)
            .map(|(n, t)| n * theta.powf(*t))
            .sum();
        match self.kind {
            AncillaryKind::Linear => 1.0 + sum,
            AncillaryKind::Exponential => sum.exp(),
            AncillaryKind::ExponentialScaled => (tc / temperature * sum).exp(),
        }
    }
}

/// Surface tension of the saturated liquid `σ = Σ σ_i θ^n_i` in N/m.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SurfaceTension {
    sigma: Vec<f64>,
    exponent: Vec<f64>,
}

impl SurfaceTension {
    pub fn new(sigma: Vec<f64>, exponent: Vec<f64>) -> Self {
        Self { sigma, exponent }
    }

    pub(crate) fn validate(&self, context: &str) -> Result<(), RegistryError> {
        if self.sigma.is_empty() || self.sigma.len() != self.exponent.len() {
            return Err(RegistryError::InconsistentTable(
                context.into(),
                format!(
                    "{} surface tension coefficients but {} exponents",
                    self.sigma.len(),
                    self.exponent.len()
                ),
            ));
        }
        Ok(())
    }

    /// Surface tension at `T ≤ Tc`, zero at the critical point.
    pub fn value(&self, temperature: f64, tc: f64) -> f64 {
        let theta = (1.0 - temperature / tc).max(0.0);
        izip!(&self.sigma, &self.exponent)
            .map(|(s, n)| s * theta.powf(*n))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn r123_vapor_pressure() {
        let ancillary = Ancillary::new(
            AncillaryKind::ExponentialScaled,
            vec![-7.4610, 2.0293, -2.1897, -3.4945],
            vec![1.0, 1.5, 2.25, 4.5],
        );
        let p = 3661.8e3 * ancillary.reduced_value(273.15, 456.831);
        assert_relative_eq!(p, 32.65e3, max_relative = 5e-3);
        assert_relative_eq!(ancillary.reduced_value(456.831, 456.831), 1.0);
    }

    #[test]
    fn inconsistent_coefficients() {
        let ancillary = Ancillary::new(AncillaryKind::Linear, vec![1.0, 2.0], vec![0.3]);
        assert!(ancillary.validate("test").is_err());
        let sigma = SurfaceTension::new(vec![0.06127, -0.009516], vec![1.192]);
        assert!(sigma.validate("test").is_err());
    }

    #[test]
    fn r227ea_surface_tension() {
        let sigma = SurfaceTension::new(vec![0.06127, -0.009516, -0.00192], vec![1.192, 0.9795, 1.421]);
        assert_relative_eq!(sigma.value(298.15, 374.9), 7.036e-3, max_relative = 1e-3);
        assert_eq!(sigma.value(374.9, 374.9), 0.0);
        assert_eq!(sigma.value(380.0, 374.9), 0.0);
    }
}
