use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::{
    AuthorityCodelist, CodelistKey, FailureKind, Resolution, ResolutionFailure,
    TerminologyResolver,
};

/// In-memory resolver for tests and pre-loaded terminology.
///
/// Counts every lookup. An optional delay makes concurrent lookups overlap.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    codelists: HashMap<CodelistKey, Arc<AuthorityCodelist>>,
    failures: HashMap<CodelistKey, FailureKind>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_codelist(mut self, package: &str, codelist: AuthorityCodelist) -> Self {
        self.insert(package, codelist);
        self
    }

    /// Make lookups of `codelist_code` fail with `kind`.
    #[must_use]
    pub fn with_failure(mut self, package: &str, codelist_code: &str, kind: FailureKind) -> Self {
        self.failures
            .insert(CodelistKey::new(package, codelist_code), kind);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&mut self, package: &str, codelist: AuthorityCodelist) {
        let key = CodelistKey::new(package, &codelist.concept_code);
        self.codelists.insert(key, Arc::new(codelist));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl TerminologyResolver for MemoryResolver {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let key = CodelistKey::new(package, codelist_code);
        if let Some(kind) = self.failures.get(&key) {
            return Err(ResolutionFailure::new(&key.package, &key.codelist, kind.clone()));
        }
        self.codelists.get(&key).cloned().ok_or_else(|| {
            ResolutionFailure::new(key.package, key.codelist, FailureKind::NotFound)
        })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
