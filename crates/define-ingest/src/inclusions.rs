//! Externally supplied inclusion lists.
//!
//! ```json
//! { "FA.FAORRES": ["Y, N", "INSULIN, ORAL"], "DM.RACE": [["WHITE", "ASIAN"]] }
//! ```
//!
//! One entry per slot, either a `", "`-joined cell or a list of terms.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use define_model::{SubsetSpecification, VariableKey};
use serde::Deserialize;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::legacy::split_terms;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SlotTerms {
    List(Vec<String>),
    Joined(String),
}

impl SlotTerms {
    fn into_terms(self) -> Vec<String> {
        match self {
            Self::List(terms) => terms
                .into_iter()
                .map(|term| term.trim().to_string())
                .filter(|term| !term.is_empty())
                .collect(),
            Self::Joined(raw) => split_terms(&raw),
        }
    }
}

/// Inclusion lists per variable, sorted by key.
pub fn parse_inclusions(
    json: &str,
    path: &Path,
) -> Result<Vec<(VariableKey, Vec<Vec<String>>)>> {
    let raw: BTreeMap<String, Vec<SlotTerms>> =
        serde_json::from_str(json).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    raw.into_iter()
        .map(|(key, slots)| {
            let parsed = key
                .parse::<VariableKey>()
                .map_err(|source| IngestError::InvalidEntry {
                    key: key.clone(),
                    path: path.to_path_buf(),
                    source,
                })?;
            Ok((parsed, slots.into_iter().map(SlotTerms::into_terms).collect()))
        })
        .collect()
}

/// Attach inclusion lists to `spec`, returning the enriched specification.
pub fn apply_inclusions(
    spec: &SubsetSpecification,
    inclusions: Vec<(VariableKey, Vec<Vec<String>>)>,
    path: &Path,
) -> Result<SubsetSpecification> {
    let mut enriched = spec.clone();
    for (key, lists) in inclusions {
        enriched = enriched
            .with_inclusions(&key, lists)
            .map_err(|_| IngestError::UnknownVariable {
                key: key.to_string(),
                path: path.to_path_buf(),
            })?;
    }
    Ok(enriched)
}

/// Load an inclusion file and attach it to `spec`.
pub fn load_inclusions(spec: &SubsetSpecification, path: &Path) -> Result<SubsetSpecification> {
    let json = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let inclusions = parse_inclusions(&json, path)?;
    info!(path = %path.display(), variables = inclusions.len(), "loaded inclusion lists");
    apply_inclusions(spec, inclusions, path)
}
