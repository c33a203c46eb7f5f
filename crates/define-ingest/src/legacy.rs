//! Subset files in the layout written by the mapping-spreadsheet tooling.
//!
//! ```json
//! {
//!   "FA.FAORRES": {
//!     "IsNonStandard": ["Yes", "No"],
//!     "VLM": "Yes",
//!     "type": ["text", "integer"],
//!     "whereclause": [
//!       [{"variable": "FATESTCD", "comparator": "EQ", "value": ["OCCUR"]}],
//!       [{"variable": "FATESTCD", "comparator": "EQ", "value": ["AGE"]}]
//!     ],
//!     "subset_terms": ["Y, N", ""]
//!   }
//! }
//! ```
//!
//! Older files hold a single condition object per slot with a string
//! `value`; both forms are accepted. Entry order is preserved.

use std::fmt;
use std::fs;
use std::path::Path;

use define_model::{
    Comparator, Condition, DataType, ModelError, StandardMarker, SubsetSpecification,
    VariableKey, VariableSubsetSpec,
};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Separator between terms in a `subset_terms` cell.
pub const TERM_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyValues {
    Many(Vec<String>),
    One(String),
}

impl LegacyValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Many(values) => values,
            Self::One(value) => vec![value],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCondition {
    pub variable: String,
    pub comparator: String,
    pub value: LegacyValues,
}

impl LegacyCondition {
    fn into_condition(self) -> std::result::Result<Condition, ModelError> {
        let comparator: Comparator = self.comparator.parse()?;
        Condition::new(self.variable, comparator, self.value.into_vec())
    }
}

/// Conditions of one slot: a list (AND-ed) or, in older files, one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacySlotConditions {
    All(Vec<LegacyCondition>),
    Single(LegacyCondition),
}

impl LegacySlotConditions {
    fn into_conditions(self) -> std::result::Result<Vec<Condition>, ModelError> {
        let conditions = match self {
            Self::All(conditions) => conditions,
            Self::Single(condition) => vec![condition],
        };
        conditions
            .into_iter()
            .map(LegacyCondition::into_condition)
            .collect()
    }
}

fn default_vlm() -> String {
    "No".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    #[serde(rename = "IsNonStandard", default)]
    pub markers: Vec<String>,
    #[serde(rename = "VLM", default = "default_vlm")]
    pub vlm: String,
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    #[serde(rename = "whereclause", default)]
    pub where_clauses: Vec<LegacySlotConditions>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subset_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extend_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub length: Vec<Option<u32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub significant_digits: Vec<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl LegacyEntry {
    /// Convert to the model. List lengths are kept as declared; alignment
    /// is checked at derivation time.
    pub fn into_spec(self, key: &str) -> std::result::Result<VariableSubsetSpec, ModelError> {
        let key: VariableKey = key.parse()?;
        let value_level = self.vlm.trim().eq_ignore_ascii_case("yes");
        let mut spec = VariableSubsetSpec::new(key, value_level);
        spec.data_types = self
            .types
            .iter()
            .map(|raw| raw.parse::<DataType>())
            .collect::<std::result::Result<_, _>>()?;
        spec.markers = self
            .markers
            .iter()
            .map(String::as_str)
            .map(StandardMarker::parse_legacy)
            .collect::<std::result::Result<_, _>>()?;
        if value_level {
            spec.conditions = self
                .where_clauses
                .into_iter()
                .map(LegacySlotConditions::into_conditions)
                .collect::<std::result::Result<_, _>>()?;
        } else if !self.where_clauses.is_empty() {
            debug!(
                variable = %spec.key,
                "ignoring where clauses of a variable without value-level metadata"
            );
        }
        spec.inclusions = self
            .subset_terms
            .iter()
            .map(String::as_str)
            .map(split_terms)
            .collect();
        spec.extensions = self
            .extend_terms
            .iter()
            .map(String::as_str)
            .map(split_terms)
            .collect();
        spec.lengths = self.length;
        spec.significant_digits = self.significant_digits;
        Ok(spec)
    }

    pub fn from_spec(spec: &VariableSubsetSpec) -> Self {
        Self {
            markers: spec
                .markers
                .iter()
                .map(|marker| marker.legacy_str().to_string())
                .collect(),
            vlm: if spec.value_level { "Yes" } else { "No" }.to_string(),
            types: spec.data_types.iter().map(ToString::to_string).collect(),
            where_clauses: spec
                .conditions
                .iter()
                .map(|conditions| {
                    LegacySlotConditions::All(
                        conditions
                            .iter()
                            .map(|condition| LegacyCondition {
                                variable: condition.variable.clone(),
                                comparator: condition.comparator.to_string(),
                                value: LegacyValues::Many(condition.values().to_vec()),
                            })
                            .collect(),
                    )
                })
                .collect(),
            subset_terms: join_terms(&spec.inclusions),
            extend_terms: join_terms(&spec.extensions),
            length: spec.lengths.clone(),
            significant_digits: spec.significant_digits.clone(),
            domain: Some(spec.key.dataset().to_string()),
        }
    }
}

fn join_terms(lists: &[Vec<String>]) -> Vec<String> {
    lists.iter().map(|terms| terms.join(TERM_SEPARATOR)).collect()
}

/// Split a `subset_terms` cell into terms, dropping blanks.
pub fn split_terms(raw: &str) -> Vec<String> {
    raw.split(TERM_SEPARATOR)
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Top-level object of a subset file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyFile {
    pub entries: Vec<(String, LegacyEntry)>,
}

impl<'de> Deserialize<'de> for LegacyFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = LegacyFile;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by DATASET.VARIABLE")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, entry)) = map.next_entry::<String, LegacyEntry>()? {
                    entries.push((key, entry));
                }
                Ok(LegacyFile { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Serialize for LegacyFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(key, entry)| (key, entry)))
    }
}

impl LegacyFile {
    pub fn from_specification(spec: &SubsetSpecification) -> Self {
        Self {
            entries: spec
                .variables()
                .iter()
                .map(|variable| (variable.key.to_string(), LegacyEntry::from_spec(variable)))
                .collect(),
        }
    }

    pub fn into_specification(self, path: &Path) -> Result<SubsetSpecification> {
        let variables = self
            .entries
            .into_iter()
            .map(|(key, entry)| {
                entry.into_spec(&key).map_err(|source| IngestError::InvalidEntry {
                    key,
                    path: path.to_path_buf(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SubsetSpecification::new(variables))
    }
}

/// Parse subset-file JSON. `path` is only used in error messages.
pub fn parse_specification(json: &str, path: &Path) -> Result<SubsetSpecification> {
    let file: LegacyFile = serde_json::from_str(json).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    file.into_specification(path)
}

pub fn load_specification(path: &Path) -> Result<SubsetSpecification> {
    let json = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let spec = parse_specification(&json, path)?;
    info!(path = %path.display(), variables = spec.len(), "loaded subset specification");
    Ok(spec)
}

/// Write `spec` back in the subset-file layout.
pub fn write_specification(path: &Path, spec: &SubsetSpecification) -> Result<()> {
    let json = serde_json::to_string_pretty(&LegacyFile::from_specification(spec)).map_err(
        |source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        },
    )?;
    fs::write(path, json).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), variables = spec.len(), "wrote subset specification");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_comma_space() {
        assert_eq!(split_terms("Y, N, U"), vec!["Y", "N", "U"]);
        assert_eq!(split_terms(""), Vec::<String>::new());
        assert_eq!(split_terms("1,000 MG"), vec!["1,000 MG"]);
    }

    #[test]
    fn old_single_condition_form_is_accepted() {
        let json = r#"{"variable": "FATESTCD", "comparator": "EQ", "value": "OCCUR"}"#;
        let slot: LegacySlotConditions = serde_json::from_str(json).unwrap();
        let conditions = slot.into_conditions().unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].values(), ["OCCUR"]);
    }

    #[test]
    fn unknown_comparator_is_rejected() {
        let json = r#"[{"variable": "FATESTCD", "comparator": "LIKE", "value": ["X"]}]"#;
        let slot: LegacySlotConditions = serde_json::from_str(json).unwrap();
        assert_eq!(
            slot.into_conditions(),
            Err(ModelError::InvalidComparator("LIKE".to_string()))
        );
    }
}
