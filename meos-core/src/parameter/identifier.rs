use serde::{Deserialize, Serialize};
use std::fmt;

/// A collection of identifiers for a substance.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Identifier {
    /// Commonly used english name, also the key of the substance in a registry
    pub name: String,
    /// CAS number
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    /// IUPAC name
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iupac_name: Option<String>,
    /// Chemical formula
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Synonyms such as refrigerant numbers
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl Identifier {
    /// Create a new identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// # use meos_core::parameter::Identifier;
    /// let r123 = Identifier::new("R123", Some("306-83-2"), None, Some("CHCl2CF3"));
    /// assert!(r123.matches("306-83-2"));
    /// assert!(r123.matches("r123"));
    /// ```
    pub fn new(name: &str, cas: Option<&str>, iupac_name: Option<&str>, formula: Option<&str>) -> Self {
        Self {
            name: name.into(),
            cas: cas.map(Into::into),
            iupac_name: iupac_name.map(Into::into),
            formula: formula.map(Into::into),
            aliases: Vec::new(),
        }
    }

    /// Case insensitive comparison against all identifiers.
    pub fn matches(&self, query: &str) -> bool {
        let eq = |s: &str| s.eq_ignore_ascii_case(query);
        eq(&self.name)
            || self.cas.as_deref().is_some_and(eq)
            || self.iupac_name.as_deref().is_some_and(eq)
            || self.formula.as_deref().is_some_and(eq)
            || self.aliases.iter().any(|a| eq(a))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier(name={}", self.name)?;
        if let Some(n) = &self.cas {
            write!(f, ", cas={n}")?;
        }
        if let Some(n) = &self.iupac_name {
            write!(f, ", iupac_name={n}")?;
        }
        if let Some(n) = &self.formula {
            write!(f, ", formula={n}")?;
        }
        write!(f, ")")
    }
}
