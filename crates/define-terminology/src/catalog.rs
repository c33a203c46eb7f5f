//! Offline resolver over NCI EVS CT exports (e.g. `SDTM_CT_2021-12-17.csv`).
//!
//! In a CT export, codelist rows have a blank `Codelist Code` and carry the
//! codelist NCI code in `Code`; term rows carry their parent codelist in
//! `Codelist Code`. Terms keep file order.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::TerminologyError;
use crate::{
    AuthorityCodelist, AuthorityTerm, FailureKind, Resolution, ResolutionFailure,
    TerminologyResolver,
};

type Row = BTreeMap<String, String>;

/// Codelists from CT export files, grouped by package identifier.
#[derive(Debug, Default)]
pub struct CatalogResolver {
    packages: HashMap<String, HashMap<String, Arc<AuthorityCodelist>>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file, each as its own package.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, TerminologyError> {
        let mut catalog = Self::new();
        for path in paths {
            catalog.load_file(path.as_ref())?;
        }
        Ok(catalog)
    }

    /// Load one CT export and return the package identifier it was filed under.
    pub fn load_file(&mut self, path: &Path) -> Result<String, TerminologyError> {
        let package = package_id_for(path).ok_or_else(|| TerminologyError::PackageName {
            path: path.to_path_buf(),
        })?;
        let rows = read_csv_rows(path)?;
        let codelists = parse_rows(&rows);
        info!(
            package = %package,
            codelists = codelists.len(),
            path = %path.display(),
            "loaded CT export"
        );
        self.insert_package(&package, codelists);
        Ok(package)
    }

    pub fn insert_package(&mut self, package: &str, codelists: Vec<AuthorityCodelist>) {
        let entry = self.packages.entry(package.to_string()).or_default();
        for codelist in codelists {
            entry.insert(codelist.concept_code.to_uppercase(), Arc::new(codelist));
        }
    }

    pub fn packages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.packages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl TerminologyResolver for CatalogResolver {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        let failure = |kind| ResolutionFailure::new(package, codelist_code, kind);
        let codelists = self
            .packages
            .get(package)
            .ok_or_else(|| failure(FailureKind::UnknownPackage))?;
        codelists
            .get(&codelist_code.to_uppercase())
            .cloned()
            .ok_or_else(|| failure(FailureKind::NotFound))
    }

    fn describe(&self) -> String {
        format!("CT catalog ({})", self.packages().join(", "))
    }
}

/// Package identifier for a CT export file name.
///
/// `SDTM_CT_2021-12-17.csv` maps to `sdtmct-2021-12-17`, the identifier the
/// CDISC Library uses for the same release.
pub fn package_id_for(path: &Path) -> Option<String> {
    let stem = path.file_stem().and_then(|v| v.to_str())?;
    let (prefix, date) = stem.split_once("_CT_")?;
    if prefix.is_empty() || date.is_empty() {
        return None;
    }
    Some(format!("{}ct-{}", prefix.to_lowercase(), date))
}

fn parse_rows(rows: &[Row]) -> Vec<AuthorityCodelist> {
    let mut order: Vec<String> = Vec::new();
    let mut codelists: HashMap<String, AuthorityCodelist> = HashMap::new();

    // First pass: codelist definition rows
    for row in rows {
        let code = get_field(row, "Code");
        if get_field(row, "Codelist Code").is_empty() && !code.is_empty() {
            let mut codelist = AuthorityCodelist::new(&code, get_field(row, "Codelist Name"));
            codelist.submission_value = get_optional(row, "CDISC Submission Value");
            codelist.extensible =
                get_field(row, "Codelist Extensible (Yes/No)").eq_ignore_ascii_case("yes");
            let key = code.to_uppercase();
            if !codelists.contains_key(&key) {
                order.push(key.clone());
            }
            codelists.insert(key, codelist);
        }
    }

    // Second pass: term rows
    for row in rows {
        let parent = get_field(row, "Codelist Code");
        let submission_value = get_field(row, "CDISC Submission Value");
        if parent.is_empty() || submission_value.is_empty() {
            continue;
        }
        match codelists.get_mut(&parent.to_uppercase()) {
            Some(codelist) => codelist.terms.push(AuthorityTerm {
                concept_code: get_field(row, "Code"),
                submission_value,
                preferred_term: get_optional(row, "NCI Preferred Term"),
            }),
            None => debug!(codelist = %parent, "term row without codelist row"),
        }
    }

    order
        .into_iter()
        .filter_map(|key| codelists.remove(&key))
        .collect()
}

fn read_csv_rows(path: &Path) -> Result<Vec<Row>, TerminologyError> {
    let csv_error = |error: csv::Error| TerminologyError::Csv {
        path: path.to_path_buf(),
        message: error.to_string(),
    };
    let file = std::fs::File::open(path).map_err(|source| TerminologyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let mut row = BTreeMap::new();
        for (idx, value) in record.iter().enumerate() {
            let key = headers
                .get(idx)
                .unwrap_or("")
                .trim_matches('\u{feff}')
                .to_string();
            row.insert(key, value.trim().to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

fn get_field(row: &Row, key: &str) -> String {
    row.get(key).cloned().unwrap_or_default()
}

fn get_optional(row: &Row, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn package_id_from_file_name() {
        assert_eq!(
            package_id_for(&PathBuf::from("ct/SDTM_CT_2021-12-17.csv")).as_deref(),
            Some("sdtmct-2021-12-17")
        );
        assert_eq!(
            package_id_for(&PathBuf::from("SEND_CT_2023-03-31.csv")).as_deref(),
            Some("sendct-2023-03-31")
        );
        assert_eq!(package_id_for(&PathBuf::from("terms.csv")), None);
    }

    #[test]
    fn unknown_package_is_distinguished_from_missing_codelist() {
        let mut catalog = CatalogResolver::new();
        catalog.insert_package("sdtmct-2021-12-17", vec![AuthorityCodelist::new("C66731", "Sex")]);
        assert!(catalog.resolve("sdtmct-2021-12-17", "c66731").is_ok());
        assert_eq!(
            catalog.resolve("sdtmct-2021-12-17", "C1").unwrap_err().kind,
            FailureKind::NotFound
        );
        assert_eq!(
            catalog.resolve("sdtmct-2020-01-01", "C66731").unwrap_err().kind,
            FailureKind::UnknownPackage
        );
    }
}
