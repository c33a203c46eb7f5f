#![deny(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// A Define-XML object identifier (e.g. `CL.FA.FAORRES.AGE`).
///
/// Construction is unchecked; OIDs are produced by the OID generator in
/// `define-core`, which owns the segment and token rules.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Oid(String);

impl Oid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dataset-qualified variable name (`FA.FAORRES`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableKey {
    dataset: String,
    variable: String,
}

impl VariableKey {
    pub fn new(dataset: impl Into<String>, variable: impl Into<String>) -> Result<Self, ModelError> {
        let dataset = dataset.into();
        let variable = variable.into();
        let ds = dataset.trim();
        let var = variable.trim();
        if ds.is_empty() || var.is_empty() || ds.contains('.') || var.contains('.') {
            return Err(ModelError::InvalidVariableKey(format!("{dataset}.{variable}")));
        }
        Ok(Self {
            dataset: ds.to_string(),
            variable: var.to_string(),
        })
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl FromStr for VariableKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dataset, variable) = s
            .split_once('.')
            .ok_or_else(|| ModelError::InvalidVariableKey(s.to_string()))?;
        Self::new(dataset, variable).map_err(|_| ModelError::InvalidVariableKey(s.to_string()))
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.variable)
    }
}

impl serde::Serialize for VariableKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for VariableKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
