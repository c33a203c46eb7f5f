//! Run-scoped resolution cache.
//!
//! Every (package, codelist) pair is fetched at most once per cache,
//! including under concurrent lookups: the first caller runs the fetch and
//! every other caller for the same key blocks on the same slot and receives
//! the same result. Failures are cached as well, so a missing codelist is
//! reported once rather than retried for every variable that references it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, warn};

use crate::{CodelistKey, Resolution, TerminologyResolver};

type Slot = Arc<OnceLock<Resolution>>;

pub struct CachingResolver<R> {
    inner: R,
    slots: Mutex<HashMap<CodelistKey, Slot>>,
    fetches: AtomicUsize,
}

impl<R: TerminologyResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of lookups that reached the wrapped resolver.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Keys with a settled result, sorted.
    pub fn cached_keys(&self) -> Vec<CodelistKey> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<CodelistKey> = slots
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn slot(&self, key: &CodelistKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}

impl<R: TerminologyResolver> TerminologyResolver for CachingResolver<R> {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        let key = CodelistKey::new(package, codelist_code);
        let slot = self.slot(&key);
        if let Some(result) = slot.get() {
            debug!(codelist = %key, "terminology cache hit");
            return result.clone();
        }
        slot.get_or_init(|| {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            debug!(codelist = %key, resolver = %self.inner.describe(), "fetching codelist");
            let result = self.inner.resolve(&key.package, &key.codelist);
            if let Err(failure) = &result {
                warn!(codelist = %key, error = %failure.kind, "codelist resolution failed");
            }
            result
        })
        .clone()
    }

    fn describe(&self) -> String {
        format!("cached {}", self.inner.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorityCodelist, MemoryResolver};

    #[test]
    fn repeated_lookups_fetch_once() {
        let memory = MemoryResolver::new().with_codelist(
            "sdtmct-2021-12-17",
            AuthorityCodelist::new("C66731", "Sex").with_term("C20197", "M", Some("Male")),
        );
        let cache = CachingResolver::new(memory);
        for _ in 0..3 {
            let codelist = cache.resolve("sdtmct-2021-12-17", "c66731").unwrap();
            assert_eq!(codelist.name, "Sex");
        }
        assert_eq!(cache.fetch_count(), 1);
        assert_eq!(cache.inner().fetch_count(), 1);
    }

    #[test]
    fn failures_are_cached() {
        let cache = CachingResolver::new(MemoryResolver::new());
        assert!(cache.resolve("sdtmct-2021-12-17", "C99999").is_err());
        assert!(cache.resolve("sdtmct-2021-12-17", "C99999").is_err());
        assert_eq!(cache.fetch_count(), 1);
        assert_eq!(
            cache.cached_keys(),
            vec![CodelistKey::new("sdtmct-2021-12-17", "C99999")]
        );
    }
}
