use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::{CodelistKey, Resolution, TerminologyResolver};

/// Resolve every distinct key, at most `max_parallel` at a time.
///
/// Results come back in key order. Intended to warm a
/// [`CachingResolver`](crate::CachingResolver) before derivation so that
/// lookups during derivation are cache hits.
pub fn prefetch<R, I>(resolver: &R, keys: I, max_parallel: usize) -> Vec<(CodelistKey, Resolution)>
where
    R: TerminologyResolver + ?Sized,
    I: IntoIterator<Item = CodelistKey>,
{
    let keys: Vec<CodelistKey> = keys.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
    if keys.is_empty() {
        return Vec::new();
    }
    let threads = max_parallel.max(1).min(keys.len());
    info!(codelists = keys.len(), threads, "prefetching authority codelists");

    let fetch = |key: CodelistKey| {
        let result = resolver.resolve(&key.package, &key.codelist);
        (key, result)
    };
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(|| keys.into_par_iter().map(fetch).collect()),
        Err(error) => {
            warn!(%error, "failed to build prefetch pool, resolving sequentially");
            keys.into_iter().map(fetch).collect()
        }
    }
}
