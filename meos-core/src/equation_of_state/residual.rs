use crate::parameter::RegistryError;
use indexmap::IndexMap;
use num_dual::DualNum;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Table of residual terms of the same type, stored column wise.
///
/// ```json
/// {"type": "Power", "n": [2.024341, -2.60593], "d": [1, 1], "t": [0.34, 0.77]}
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct ResidualTermJson {
    #[serde(rename = "type")]
    ty: String,
    #[serde(flatten)]
    parameters: IndexMap<String, Vec<Value>>,
}

impl ResidualTermJson {
    /// Split the table into individual terms.
    pub(crate) fn terms(&self, context: &str) -> Result<Vec<ResidualTerm>, RegistryError> {
        let count = self.parameters.values().map(Vec::len).max().unwrap_or(0);
        if count == 0 || self.parameters.values().any(|v| v.len() != count) {
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
                    .map(|(k, v)| (k.clone(), v[index].clone()))
                    .collect();
                parameters.insert("type".into(), Value::String(self.ty.clone()));
                Ok(serde_json::from_value(Value::Object(parameters))?)
            })
            .collect()
    }
}

fn unity() -> f64 {
    1.0
}

/// Residual Helmholtz energy terms.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ResidualTerm {
    /// `n δ^d τ^t`
    Power { n: f64, d: i32, t: f64 },
    /// `n δ^d τ^t exp(-γ δ^c)`
    Exponential {
        n: f64,
        d: i32,
        t: f64,
        c: i32,
        #[serde(default = "unity")]
        gamma: f64,
    },
    /// `n δ^d τ^t exp(-α (δ - ε)² - β (τ - γ)²)`
    Gaussian {
        n: f64,
        d: i32,
        t: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
        epsilon: f64,
    },
}

impl ResidualTerm {
    pub fn evaluate<D: DualNum<f64> + Copy>(&self, delta: D, tau: D) -> D {
        match *self {
            Self::Power { n, d, t } => delta.powi(d) * tau.powf(t) * n,
            Self::Exponential { n, d, t, c, gamma } => {
                delta.powi(d) * tau.powf(t) * n * (-delta.powi(c) * gamma).exp()
            }
            Self::Gaussian {
                n,
                d,
                t,
                alpha,
                beta,
                gamma,
                epsilon,
            } => {
                (delta.powi(d) * tau.powf(t) * n)
                    * (-(delta - epsilon).powi(2) * alpha - (tau - gamma).powi(2) * beta).exp()
            }
        }
    }
}
