//! Structures and methods to load and look up substance data.
use crate::equation_of_state::{
    Ancillary, IdealGasTermJson, ResidualTermJson, Substance, SurfaceTension,
};
use crate::ReferenceState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

mod identifier;
pub use identifier::Identifier;

/// Major version of the registry file format understood by this crate.
pub const REGISTRY_VERSION: u32 = 1;

/// Errors that occur while loading or querying substance data.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    FileIO(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("Unsupported registry version `{0}`, expected {REGISTRY_VERSION}.x.")]
    UnsupportedVersion(String),
    #[error("The following component(s) were not found: {0}")]
    ComponentsNotFound(String),
    #[error("Substance `{0}` has no equation of state `{1}`.")]
    VariantNotFound(String, String),
    #[error("Substance `{0}` has no multiparameter equation of state.")]
    NoEquationOfState(String),
    #[error("A substance was defined more than once: {0}")]
    Duplicate(String),
    #[error("Inconsistent coefficient table in {0}: {1}")]
    InconsistentTable(String, String),
    #[error("Non-physical value in {0}: {1} = {2}")]
    NonPhysical(String, String, f64),
    #[error("Reference state of {0} could not be applied: {1}")]
    ReferenceState(String, String),
}

/// Content of a registry file.
#[derive(Deserialize, Debug, Clone)]
pub struct RegistryRecord {
    pub version: String,
    pub substances: Vec<SubstanceRecord>,
    #[serde(default)]
    pub cross_virial: Vec<CrossVirialRecord>,
}

/// Constants, equations of state and virial data of a single substance.
#[derive(Deserialize, Debug, Clone)]
pub struct SubstanceRecord {
    pub identifier: Identifier,
    /// Critical temperature in K
    pub tc: f64,
    /// Critical pressure in Pa
    pub pc: f64,
    /// Critical density in mol/m³
    pub rhoc: f64,
    /// Molar weight in kg/mol
    pub molar_weight: f64,
    pub acentric_factor: f64,
    /// Dipole moment in debye
    #[serde(default)]
    pub dipole: f64,
    /// Triple point temperature in K
    pub tt: f64,
    /// Normal boiling temperature in K
    #[serde(default)]
    pub tb: Option<f64>,
    /// Tabulated second virial coefficients, see [VirialTableRecord].
    #[serde(default)]
    pub virial: Vec<VirialTableRecord>,
    #[serde(default)]
    pub equations: Vec<EquationRecord>,
}

/// A multiparameter equation of state as stored in the registry file.
#[derive(Deserialize, Debug, Clone)]
pub struct EquationRecord {
    pub id: String,
    #[serde(default)]
    pub reference: String,
    /// Gas constant used in the fit of the equation in J/(mol K)
    pub gas_constant: f64,
    /// Reducing temperature, if different from the critical temperature of the substance.
    #[serde(default)]
    pub tc: Option<f64>,
    /// Reducing density, if different from the critical density of the substance.
    #[serde(default)]
    pub rhoc: Option<f64>,
    #[serde(default)]
    pub pc: Option<f64>,
    #[serde(default)]
    pub molar_weight: Option<f64>,
    #[serde(default)]
    pub t_min: Option<f64>,
    pub t_max: f64,
    pub p_max: f64,
    /// Maximum density in mol/m³
    pub rho_max: f64,
    #[serde(default)]
    pub reference_state: ReferenceState,
    pub ideal_gas: Vec<IdealGasTermJson>,
    pub residual: Vec<ResidualTermJson>,
    pub ancillary: AncillaryRecord,
    /// Surface tension correlation of the saturated liquid
    #[serde(default)]
    pub surface_tension: Option<SurfaceTension>,
}

/// Ancillary equations used to seed the saturation solver.
#[derive(Deserialize, Debug, Clone)]
pub struct AncillaryRecord {
    pub vapor_pressure: Ancillary,
    pub liquid_density: Ancillary,
    pub vapor_density: Ancillary,
}

/// Second virial coefficients `B = Σ a_i / T^i` in cm³/mol.
///
/// A table applies below `t_max`; the last table without `t_max`
/// covers the remaining temperature range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VirialTableRecord {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t_max: Option<f64>,
    pub coefficients: Vec<f64>,
}

impl VirialTableRecord {
    /// Select the table valid at the given temperature.
    pub fn select(tables: &[Self], temperature: f64) -> Option<&Self> {
        tables
            .iter()
            .find(|r| r.t_max.map_or(true, |t_max| temperature < t_max))
    }
}

/// Tabulated cross second virial coefficient of a binary pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CrossVirialRecord {
    pub components: [String; 2],
    pub coefficients: Vec<f64>,
}

/// Immutable, cheaply clonable collection of substances.
///
/// Adding a substance creates a new registry, so that evaluations
/// holding on to the previous one never observe a partial update.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    version: String,
    substances: Arc<IndexMap<String, Arc<Substance>>>,
    cross_virial: Arc<Vec<CrossVirialRecord>>,
}

impl Registry {
    /// Read a registry from a json file.
    pub fn from_json<P: AsRef<Path>>(file: P) -> Result<Self, RegistryError> {
        let reader = BufReader::new(File::open(file)?);
        let record: RegistryRecord = serde_json::from_reader(reader)?;
        Self::from_record(record)
    }

    /// Read a registry from a json string.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Self::from_record(serde_json::from_str(json)?)
    }

    /// Validate all records and build the registry.
    pub fn from_record(record: RegistryRecord) -> Result<Self, RegistryError> {
        let major = record.version.split('.').next().and_then(|v| v.parse::<u32>().ok());
        if major != Some(REGISTRY_VERSION) {
            return Err(RegistryError::UnsupportedVersion(record.version));
        }
        let mut substances = IndexMap::with_capacity(record.substances.len());
        for r in record.substances {
            let key = r.identifier.name.to_lowercase();
            if substances.contains_key(&key) {
                return Err(RegistryError::Duplicate(r.identifier.name));
            }
            substances.insert(key, Arc::new(Substance::from_record(r)?));
        }
        let registry = Self {
            version: record.version,
            substances: Arc::new(substances),
            cross_virial: Arc::new(record.cross_virial),
        };
        for c in registry.cross_virial.iter() {
            for s in &c.components {
                registry.get(s)?;
            }
        }
        Ok(registry)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.substances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }

    /// Names of all substances in the order of the registry file.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.substances.values().map(|s| s.identifier.name.as_str())
    }

    /// Find a substance by name, CAS number, formula or alias (case insensitive).
    pub fn get(&self, id: &str) -> Result<Arc<Substance>, RegistryError> {
        self.substances
            .get(&id.to_lowercase())
            .or_else(|| self.substances.values().find(|s| s.identifier.matches(id)))
            .cloned()
            .ok_or_else(|| RegistryError::ComponentsNotFound(id.into()))
    }

    /// Tabulated cross second virial coefficients of a pair, if available.
    pub fn cross_virial(&self, a: &Substance, b: &Substance) -> Option<&[f64]> {
        self.cross_virial
            .iter()
            .find(|c| {
                let [c1, c2] = &c.components;
                (a.identifier.matches(c1) && b.identifier.matches(c2))
                    || (a.identifier.matches(c2) && b.identifier.matches(c1))
            })
            .map(|c| c.coefficients.as_slice())
    }

    /// Return a new registry that additionally contains the given substance.
    pub fn with_substance(&self, record: SubstanceRecord) -> Result<Self, RegistryError> {
        let key = record.identifier.name.to_lowercase();
        if self.substances.contains_key(&key) {
            return Err(RegistryError::Duplicate(record.identifier.name));
        }
        let mut substances = (*self.substances).clone();
        substances.insert(key, Arc::new(Substance::from_record(record)?));
        Ok(Self {
            version: self.version.clone(),
            substances: Arc::new(substances),
            cross_virial: self.cross_virial.clone(),
        })
    }
}

pub(crate) fn check_positive(context: &str, name: &str, value: f64) -> Result<(), RegistryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RegistryError::NonPhysical(context.into(), name.into(), value))
    }
}
