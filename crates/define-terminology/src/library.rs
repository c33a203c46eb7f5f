//! CDISC Library API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use crate::error::TerminologyError;
use crate::{
    AuthorityCodelist, AuthorityTerm, FailureKind, Resolution, ResolutionFailure,
    TerminologyResolver,
};

/// CDISC Library API base URL.
pub const DEFAULT_BASE_URL: &str = "https://library.cdisc.org/api";

/// Environment variable holding the API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "CDISC_LIBRARY_API_KEY";

const API_KEY_HEADER: &str = "api-key";

/// User agent string for API requests.
const USER_AGENT_VALUE: &str = concat!("define-meta/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves codelists against the CDISC Library REST API.
#[derive(Debug, Clone)]
pub struct LibraryClient {
    client: Client,
    base_url: String,
}

impl LibraryClient {
    pub fn new(config: &LibraryConfig) -> Result<Self, TerminologyError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        if let Some(key) = &config.api_key {
            let mut value =
                HeaderValue::from_str(key).map_err(|_| TerminologyError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(TerminologyError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of a codelist within a CT package.
    pub fn endpoint(&self, package: &str, codelist_code: &str) -> String {
        format!(
            "{}/mdr/ct/packages/{}/codelists/{}",
            self.base_url, package, codelist_code
        )
    }

    /// Check the status and decode the codelist body.
    fn handle_response(
        response: Response,
        failure: impl Fn(FailureKind) -> ResolutionFailure,
    ) -> Resolution {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(failure(FailureKind::NotFound));
        }
        if !status.is_success() {
            return Err(failure(FailureKind::Status(status.as_u16())));
        }
        let wire: WireCodelist = response
            .json()
            .map_err(|error| failure(classify(&error)))?;
        Ok(Arc::new(wire.into()))
    }
}

impl TerminologyResolver for LibraryClient {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        let url = self.endpoint(package, codelist_code);
        debug!("Fetching codelist from {}", url);
        let failure = |kind| ResolutionFailure::new(package, codelist_code, kind);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|error| failure(classify(&error)))?;
        Self::handle_response(response, failure)
    }

    fn describe(&self) -> String {
        format!("CDISC Library ({})", self.base_url)
    }
}

fn classify(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_decode() {
        FailureKind::Decode(error.to_string())
    } else {
        FailureKind::Transport(error.to_string())
    }
}

/// Codelist resource as returned by `/mdr/ct/packages/{package}/codelists/{code}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCodelist {
    concept_id: String,
    name: String,
    #[serde(default)]
    submission_value: Option<String>,
    #[serde(default)]
    extensible: Option<String>,
    #[serde(default)]
    terms: Vec<WireTerm>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTerm {
    concept_id: String,
    submission_value: String,
    #[serde(default)]
    preferred_term: Option<String>,
}

impl From<WireCodelist> for AuthorityCodelist {
    fn from(wire: WireCodelist) -> Self {
        Self {
            concept_code: wire.concept_id,
            name: wire.name,
            submission_value: wire.submission_value,
            extensible: wire
                .extensible
                .is_some_and(|value| value.eq_ignore_ascii_case("true")),
            terms: wire
                .terms
                .into_iter()
                .map(|term| AuthorityTerm {
                    concept_code: term.concept_id,
                    submission_value: term.submission_value,
                    preferred_term: term.preferred_term,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let config = LibraryConfig {
            base_url: "https://library.example.org/api/".to_string(),
            ..LibraryConfig::default()
        };
        let client = LibraryClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("sdtmct-2021-12-17", "C66731"),
            "https://library.example.org/api/mdr/ct/packages/sdtmct-2021-12-17/codelists/C66731"
        );
    }

    #[test]
    fn api_key_must_be_header_safe() {
        let config = LibraryConfig {
            api_key: Some("bad\nkey".to_string()),
            ..LibraryConfig::default()
        };
        assert!(matches!(
            LibraryClient::new(&config),
            Err(TerminologyError::InvalidApiKey)
        ));
    }

    #[test]
    fn wire_codelist_converts_in_published_order() {
        let json = r#"{
            "conceptId": "C66731",
            "name": "Sex",
            "submissionValue": "SEX",
            "extensible": "false",
            "definition": "The assemblage of physical properties.",
            "terms": [
                {"conceptId": "C16576", "submissionValue": "F", "preferredTerm": "Female"},
                {"conceptId": "C20197", "submissionValue": "M", "preferredTerm": "Male"},
                {"conceptId": "C17998", "submissionValue": "U"}
            ],
            "_links": {}
        }"#;
        let wire: WireCodelist = serde_json::from_str(json).unwrap();
        let codelist = AuthorityCodelist::from(wire);
        assert_eq!(codelist.concept_code, "C66731");
        assert_eq!(codelist.submission_value.as_deref(), Some("SEX"));
        assert!(!codelist.extensible);
        let values: Vec<&str> = codelist
            .terms
            .iter()
            .map(|t| t.submission_value.as_str())
            .collect();
        assert_eq!(values, vec!["F", "M", "U"]);
        assert_eq!(codelist.terms[2].preferred_term, None);
    }
}
