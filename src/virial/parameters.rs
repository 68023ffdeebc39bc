use super::correlations::{tabulated, CriticalConstants, SecondVirial};
use meos_core::parameter::{Registry, RegistryError, VirialTableRecord};
use meos_core::Substance;
use ndarray::{Array1, Array2};
use num_dual::DualNum;
use std::fmt;
use std::sync::Arc;

/// Source of the second virial coefficient of a pair of components.
#[derive(Clone, Debug, PartialEq)]
pub enum PairVirial {
    /// Tabulated coefficients, possibly split into temperature ranges.
    Tabulated(Vec<VirialTableRecord>),
    /// Corresponding states correlation with (pseudo-)critical constants.
    Correlation,
}

/// Virial parameters for one or more substances.
pub struct VirialParameters {
    /// Molar weight in kg/mol
    pub molar_weight: Array1<f64>,
    /// Pure and pseudo-critical constants of all pairs
    pub critical: Array2<CriticalConstants>,
    pub second: Array2<PairVirial>,
    substances: Vec<Arc<Substance>>,
}

impl VirialParameters {
    /// Collect the parameters of the given substances from a registry.
    ///
    /// Cross coefficients are taken from the tabulated pairs of the
    /// registry, all other unlike pairs use combining rules.
    pub fn from_registry(registry: &Registry, ids: &[&str]) -> Result<Self, RegistryError> {
        let substances = ids
            .iter()
            .map(|id| registry.get(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(substances, |a, b| {
            registry.cross_virial(a, b).map(<[f64]>::to_vec)
        }))
    }

    /// Build the parameters from substances and a lookup for tabulated
    /// cross coefficients.
    pub fn new<F>(substances: Vec<Arc<Substance>>, cross: F) -> Self
    where
        F: Fn(&Substance, &Substance) -> Option<Vec<f64>>,
    {
        let n = substances.len();
        let pure: Vec<_> = substances
            .iter()
            .map(|s| CriticalConstants::from_substance(s))
            .collect();
        let critical = Array2::from_shape_fn([n; 2], |(i, j)| {
            if i == j {
                pure[i]
            } else {
                pure[i].combine(&pure[j])
            }
        });
        let second = Array2::from_shape_fn([n; 2], |(i, j)| {
            let tables = if i == j {
                substances[i].virial.clone()
            } else {
                cross(&substances[i], &substances[j])
                    .map(|coefficients| {
                        vec![VirialTableRecord {
                            t_max: None,
                            coefficients,
                        }]
                    })
                    .unwrap_or_default()
            };
            if tables.is_empty() {
                PairVirial::Correlation
            } else {
                PairVirial::Tabulated(tables)
            }
        });
        let molar_weight = substances.iter().map(|s| s.molar_weight).collect();
        Self {
            molar_weight,
            critical,
            second,
            substances,
        }
    }

    pub fn components(&self) -> usize {
        self.substances.len()
    }

    pub fn substances(&self) -> &[Arc<Substance>] {
        &self.substances
    }

    /// Second virial coefficient of the pair `(i, j)` in m³/mol.
    ///
    /// Outside of all tabulated temperature ranges the correlation is used.
    pub fn b_ij<D: DualNum<f64> + Copy>(
        &self,
        temperature: D,
        i: usize,
        j: usize,
        correlation: SecondVirial,
    ) -> D {
        match &self.second[(i, j)] {
            PairVirial::Tabulated(tables) => {
                match VirialTableRecord::select(tables, temperature.re()) {
                    Some(table) => tabulated(temperature, &table.coefficients),
                    None => correlation.evaluate(temperature, &self.critical[(i, j)]),
                }
            }
            PairVirial::Correlation => correlation.evaluate(temperature, &self.critical[(i, j)]),
        }
    }
}

impl fmt::Display for VirialParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.substances.iter().enumerate() {
            writeln!(f, "{}: {}", s.identifier, self.critical[(i, i)])?;
        }
        let n = self.components();
        for i in 0..n {
            for j in i + 1..n {
                let source = match self.second[(i, j)] {
                    PairVirial::Tabulated(_) => "tabulated",
                    PairVirial::Correlation => "correlation",
                };
                writeln!(
                    f,
                    "B({}, {}): {source}",
                    self.substances[i].identifier.name, self.substances[j].identifier.name
                )?;
            }
        }
        Ok(())
    }
}
