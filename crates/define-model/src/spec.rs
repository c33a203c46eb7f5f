//! Subset specification: the declarative input of a derivation run.
//!
//! One [`VariableSubsetSpec`] per dataset-qualified variable. Per-condition
//! data lives in parallel lists, one slot per conditional subset. The lists
//! are kept exactly as declared so that misalignment can be reported instead
//! of being truncated away; [`VariableSubsetSpec::slots`] is the only way to
//! view them as aligned slots.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Condition, DataType, ModelError, VariableKey};

/// Legacy marker values this short are never concept codes.
const MIN_CODE_LEN: usize = 3;

/// How a conditional subset relates to the authority terminology.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum StandardMarker {
    /// Subset of the authority codelist with this concept code.
    Authority(String),
    /// Entirely sponsor-defined terms; the authority is never consulted.
    NonStandard,
    /// The slot has no codelist.
    NoCodelist,
}

impl StandardMarker {
    /// Parse the marker spelling used by mapping-spreadsheet subset files:
    /// `"Yes"` (non-standard), `"No"` (no codelist), or a concept code of
    /// more than three characters.
    pub fn parse_legacy(raw: &str) -> Result<Self, ModelError> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("yes") || value.is_empty() {
            Ok(Self::NonStandard)
        } else if value.eq_ignore_ascii_case("no") {
            Ok(Self::NoCodelist)
        } else if value.chars().count() > MIN_CODE_LEN {
            Ok(Self::Authority(value.to_uppercase()))
        } else {
            Err(ModelError::InvalidMarker(value.to_string()))
        }
    }

    pub fn legacy_str(&self) -> &str {
        match self {
            Self::Authority(code) => code,
            Self::NonStandard => "Yes",
            Self::NoCodelist => "No",
        }
    }

    pub fn authority_code(&self) -> Option<&str> {
        match self {
            Self::Authority(code) => Some(code),
            _ => None,
        }
    }
}

/// Declared subsets for one dataset-qualified variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSubsetSpec {
    pub key: VariableKey,
    /// Whether the variable is described by value-level metadata.
    pub value_level: bool,
    pub data_types: Vec<DataType>,
    pub markers: Vec<StandardMarker>,
    /// One AND-ed condition list per slot; empty for non value-level variables.
    pub conditions: Vec<Vec<Condition>>,
    /// Submission values or concept codes to include, per slot.
    #[serde(default)]
    pub inclusions: Vec<Vec<String>>,
    /// Local terms appended after the authority terms, per slot.
    #[serde(default)]
    pub extensions: Vec<Vec<String>>,
    #[serde(default)]
    pub lengths: Vec<Option<u32>>,
    #[serde(default)]
    pub significant_digits: Vec<Option<u32>>,
}

/// Aligned view of one conditional subset.
#[derive(Debug, Clone, Copy)]
pub struct SubsetSlot<'a> {
    /// 0-based slot index.
    pub index: usize,
    pub data_type: DataType,
    pub marker: &'a StandardMarker,
    pub conditions: &'a [Condition],
    pub inclusions: &'a [String],
    pub extensions: &'a [String],
    pub length: Option<u32>,
    pub significant_digits: Option<u32>,
}

impl VariableSubsetSpec {
    pub fn new(key: VariableKey, value_level: bool) -> Self {
        Self {
            key,
            value_level,
            data_types: Vec::new(),
            markers: Vec::new(),
            conditions: Vec::new(),
            inclusions: Vec::new(),
            extensions: Vec::new(),
            lengths: Vec::new(),
            significant_digits: Vec::new(),
        }
    }

    /// Number of conditional subsets, or the misalignment that prevents
    /// the variable from being derived.
    pub fn slot_count(&self) -> Result<usize, ModelError> {
        let count = self.data_types.len();
        let misaligned = |detail: String| ModelError::Misaligned {
            key: self.key.to_string(),
            detail,
        };
        if count == 0 {
            return Err(misaligned("no data types declared".to_string()));
        }
        if self.markers.len() != count {
            return Err(misaligned(format!(
                "{count} data types but {} standard markers",
                self.markers.len()
            )));
        }
        if self.value_level {
            if self.conditions.len() != count {
                return Err(misaligned(format!(
                    "{count} data types but {} conditions",
                    self.conditions.len()
                )));
            }
            if let Some(idx) = self.conditions.iter().position(Vec::is_empty) {
                return Err(misaligned(format!("condition {} is empty", idx + 1)));
            }
        } else {
            if count != 1 {
                return Err(misaligned(format!(
                    "{count} data types declared for a variable without value-level metadata"
                )));
            }
            if !self.conditions.is_empty() {
                return Err(misaligned(
                    "conditions declared for a variable without value-level metadata".to_string(),
                ));
            }
        }
        let optional = [
            ("inclusion lists", self.inclusions.len()),
            ("extension lists", self.extensions.len()),
            ("lengths", self.lengths.len()),
            ("significant digits", self.significant_digits.len()),
        ];
        for (label, len) in optional {
            if len != 0 && len != count {
                return Err(misaligned(format!("{count} data types but {len} {label}")));
            }
        }
        Ok(count)
    }

    pub fn slots(&self) -> Result<Vec<SubsetSlot<'_>>, ModelError> {
        let count = self.slot_count()?;
        let slots = (0..count)
            .map(|index| SubsetSlot {
                index,
                data_type: self.data_types[index],
                marker: &self.markers[index],
                conditions: self.conditions.get(index).map_or(&[][..], Vec::as_slice),
                inclusions: self.inclusions.get(index).map_or(&[][..], Vec::as_slice),
                extensions: self.extensions.get(index).map_or(&[][..], Vec::as_slice),
                length: self.lengths.get(index).copied().flatten(),
                significant_digits: self.significant_digits.get(index).copied().flatten(),
            })
            .collect();
        Ok(slots)
    }
}

/// The whole specification of one run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetSpecification {
    variables: Vec<VariableSubsetSpec>,
}

impl SubsetSpecification {
    pub fn new(variables: Vec<VariableSubsetSpec>) -> Self {
        Self { variables }
    }

    pub fn variables(&self) -> &[VariableSubsetSpec] {
        &self.variables
    }

    pub fn get(&self, key: &VariableKey) -> Option<&VariableSubsetSpec> {
        self.variables.iter().find(|spec| &spec.key == key)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Return a copy with the inclusion lists of `key` replaced.
    pub fn with_inclusions(
        &self,
        key: &VariableKey,
        inclusions: Vec<Vec<String>>,
    ) -> Result<Self, ModelError> {
        let mut next = self.clone();
        let spec = next
            .variables
            .iter_mut()
            .find(|spec| &spec.key == key)
            .ok_or_else(|| ModelError::UnknownVariable(key.to_string()))?;
        spec.inclusions = inclusions;
        Ok(next)
    }

    /// Authority codelist codes referenced by aligned variables.
    pub fn authority_codes(&self) -> BTreeSet<String> {
        self.variables
            .iter()
            .filter(|spec| spec.slot_count().is_ok())
            .flat_map(|spec| spec.markers.iter())
            .filter_map(|marker| marker.authority_code().map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Comparator;

    fn condition(value: &str) -> Vec<Condition> {
        vec![Condition::new("FATESTCD", Comparator::Eq, [value]).unwrap()]
    }

    fn faorres() -> VariableSubsetSpec {
        let mut spec = VariableSubsetSpec::new("FA.FAORRES".parse().unwrap(), true);
        spec.data_types = vec![DataType::Text, DataType::Integer];
        spec.markers = vec![StandardMarker::NonStandard, StandardMarker::NoCodelist];
        spec.conditions = vec![condition("INSCHFL"), condition("AGE")];
        spec
    }

    #[test]
    fn legacy_markers() {
        assert_eq!(StandardMarker::parse_legacy("Yes"), Ok(StandardMarker::NonStandard));
        assert_eq!(StandardMarker::parse_legacy("No"), Ok(StandardMarker::NoCodelist));
        assert_eq!(
            StandardMarker::parse_legacy("c141665"),
            Ok(StandardMarker::Authority("C141665".to_string()))
        );
    }

    #[test]
    fn short_legacy_markers_are_rejected() {
        for raw in ["N/A", "Y", " N "] {
            assert_eq!(
                StandardMarker::parse_legacy(raw),
                Err(ModelError::InvalidMarker(raw.trim().to_string()))
            );
        }
    }

    #[test]
    fn aligned_spec_yields_slots() {
        let spec = faorres();
        let slots = spec.slots().unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].data_type, DataType::Integer);
        assert_eq!(slots[1].conditions[0].leading_value(), "AGE");
        assert!(slots[0].inclusions.is_empty());
    }

    #[test]
    fn misaligned_condition_list_is_reported() {
        let mut spec = faorres();
        spec.data_types.push(DataType::Float);
        spec.markers.push(StandardMarker::NoCodelist);
        let err = spec.slot_count().unwrap_err();
        assert_eq!(
            err,
            ModelError::Misaligned {
                key: "FA.FAORRES".to_string(),
                detail: "3 data types but 2 conditions".to_string(),
            }
        );
    }

    #[test]
    fn optional_lists_must_match_when_present() {
        let mut spec = faorres();
        spec.lengths = vec![Some(8)];
        assert!(spec.slot_count().is_err());
        spec.lengths = vec![Some(8), None];
        assert!(spec.slot_count().is_ok());
    }

    #[test]
    fn non_value_level_variable_has_one_slot() {
        let mut spec = VariableSubsetSpec::new("DM.RACE".parse().unwrap(), false);
        spec.data_types = vec![DataType::Text];
        spec.markers = vec![StandardMarker::Authority("C74457".to_string())];
        assert_eq!(spec.slot_count().unwrap(), 1);
        spec.conditions = condition("X").into_iter().map(|c| vec![c]).collect();
        assert!(spec.slot_count().is_err());
    }

    #[test]
    fn with_inclusions_returns_a_new_value() {
        let original = SubsetSpecification::new(vec![faorres()]);
        let key: VariableKey = "FA.FAORRES".parse().unwrap();
        let enriched = original
            .with_inclusions(&key, vec![vec!["Y".into(), "N".into()], vec![]])
            .unwrap();
        assert!(original.get(&key).unwrap().inclusions.is_empty());
        assert_eq!(enriched.get(&key).unwrap().inclusions[0], vec!["Y", "N"]);

        let missing: VariableKey = "DM.SEX".parse().unwrap();
        assert!(original.with_inclusions(&missing, Vec::new()).is_err());
    }
}
