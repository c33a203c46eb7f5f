//! Run configuration loaded from `define-meta.toml`.
//!
//! Every key is optional; a missing file means defaults throughout. The
//! Library API key is deliberately not a key here: only the name of the
//! environment variable holding it is configurable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use define_core::{
    DEFAULT_PACKAGE, DEFAULT_STANDARD_OID, DOMAIN_ABBREVIATION_CODELIST, DerivationOptions,
};
use define_terminology::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, LibraryConfig};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "define-meta.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub terminology: TerminologyConfig,
    pub standards: StandardsConfig,
    pub codelists: CodelistsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminologyConfig {
    /// CT package identifier, e.g. `sdtmct-2021-12-17`.
    pub package: String,
    pub base_url: String,
    /// Environment variable holding the Library API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_parallel: usize,
    /// CT export used instead of the Library.
    pub ct_file: Option<PathBuf>,
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 30,
            max_parallel: 4,
            ct_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StandardsConfig {
    pub ct_standard_oid: String,
}

impl Default for StandardsConfig {
    fn default() -> Self {
        Self {
            ct_standard_oid: DEFAULT_STANDARD_OID.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodelistsConfig {
    /// Authority codelists emitted in full.
    pub full: Vec<String>,
    /// Authority codelists emitted with only the listed submission values
    /// or concept codes, keyed by codelist code.
    pub subsets: BTreeMap<String, Vec<String>>,
    /// Datasets that get a domain abbreviation codelist.
    pub domains: Vec<String>,
    pub domain_codelist: String,
}

impl Default for CodelistsConfig {
    fn default() -> Self {
        Self {
            full: Vec::new(),
            subsets: BTreeMap::new(),
            domains: Vec::new(),
            domain_codelist: DOMAIN_ABBREVIATION_CODELIST.to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse run configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read configuration {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load `explicit`, else `define-meta.toml` from `dir` if present,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    pub fn derivation_options(&self) -> DerivationOptions {
        let subsets = self
            .codelists
            .subsets
            .iter()
            .map(|(code, values)| (code.clone(), values.clone()))
            .collect();
        DerivationOptions {
            package: self.terminology.package.clone(),
            standard_oid: self.standards.ct_standard_oid.clone(),
            max_parallel: self.terminology.max_parallel.max(1),
            domain_codelist: self.codelists.domain_codelist.clone(),
            ..DerivationOptions::default()
        }
        .with_full_codelists(self.codelists.full.clone())
        .with_codelist_subsets(subsets)
        .with_domains(self.codelists.domains.clone())
    }

    /// Library client settings; the key is read from the environment.
    pub fn library_config(&self) -> LibraryConfig {
        let api_key = std::env::var(&self.terminology.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        LibraryConfig {
            base_url: self.terminology.base_url.clone(),
            api_key,
            timeout: Duration::from_secs(self.terminology.timeout_secs),
        }
    }
}
