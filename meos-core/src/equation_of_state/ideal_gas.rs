use crate::parameter::RegistryError;
use indexmap::IndexMap;
use num_dual::DualNum;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Table of ideal gas terms of the same type.
///
/// Parameters are either scalars (shared by all terms of the table)
/// or arrays with one entry per term.
#[derive(Clone, Debug, Deserialize)]
pub struct IdealGasTermJson {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(flatten)]
    parameters: IndexMap<String, Value>,
}

impl IdealGasTermJson {
    /// Split the table into individual terms.
    pub(crate) fn terms(&self, context: &str) -> Result<Vec<IdealGasTerm>, RegistryError> {
        let lengths: Vec<_> = self
            .parameters
            .values()
            .filter_map(|v| v.as_array().map(Vec::len))
            .collect();
        let count = lengths.iter().copied().max().unwrap_or(1);
        if count == 0 || lengths.iter().any(|&l| l != count) {
            return Err(RegistryError::InconsistentTable(
                context.into(),
                format!("columns of `{}` terms have different lengths", self.ty),
            ));
        }
        (0..count)
            .map(|index| {
                let mut parameters: Map<String, Value> = self
                    .parameters
                    .iter()
                    .map(|(k, v)| (k.clone(), v.as_array().map_or(v, |v| &v[index]).clone()))
                    .collect();
                parameters.insert("type".into(), Value::String(self.ty.clone()));
                Ok(serde_json::from_value(Value::Object(parameters))?)
            })
            .collect()
    }
}

/// Ideal gas Helmholtz energy terms as functions of the inverse
/// reduced temperature. The `ln δ` contribution is not part of the
/// term list.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum IdealGasTerm {
    /// `a1 + a2 τ`
    Lead { a1: f64, a2: f64 },
    /// `a ln τ`
    LogTau { a: f64 },
    /// `n τ^t`
    Power { n: f64, t: f64 },
    /// `n τ ln τ`
    TauLogTau { n: f64 },
    /// `n ln(1 - exp(-θ τ / Tc))` with θ in K
    PlanckEinstein { n: f64, theta: f64 },
    /// Integrated `cp0 / R = c`
    Cp0Constant { c: f64, t0: f64 },
    /// Integrated `cp0 / R = c T^t`
    Cp0PolyT { c: f64, t: f64, t0: f64 },
    /// `a1 + a2 τ`, shifts the zero of enthalpy and entropy
    Offset { a1: f64, a2: f64 },
}

impl IdealGasTerm {
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, tau: D, tc: f64) -> D {
        match *self {
            Self::Lead { a1, a2 } | Self::Offset { a1, a2 } => tau * a2 + a1,
            Self::LogTau { a } => tau.ln() * a,
            Self::Power { n, t } => tau.powf(t) * n,
            Self::TauLogTau { n } => tau * tau.ln() * n,
            Self::PlanckEinstein { n, theta } => (-(-tau * theta / tc).exp()).ln_1p() * n,
            Self::Cp0Constant { c, t0 } => {
                let tau0 = tc / t0;
                (-tau / tau0 + 1.0 + (tau / tau0).ln()) * c
            }
            Self::Cp0PolyT { c, t, t0 } => {
                let tau0 = tc / t0;
                if t.abs() < 10.0 * f64::EPSILON {
                    (-tau / tau0 + 1.0 + (tau / tau0).ln()) * c
                } else if (t + 1.0).abs() < 10.0 * f64::EPSILON {
                    (-tau / tc * (tau / tau0).ln() + (tau - tau0) / tc) * c
                } else {
                    (-tau.powf(-t) * tc.powf(t) / (t * (t + 1.0))
                        - tau * t0.powf(t + 1.0) / (tc * (t + 1.0))
                        + t0.powf(t) / t)
                        * c
                }
            }
        }
    }
}
