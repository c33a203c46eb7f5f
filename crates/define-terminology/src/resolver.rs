use std::fmt;
use std::sync::Arc;

use crate::{AuthorityCodelist, ResolutionFailure};

/// Outcome of one authority lookup.
pub type Resolution = Result<Arc<AuthorityCodelist>, ResolutionFailure>;

/// Identity of an authority codelist: terminology package plus concept code.
///
/// Codes are compared case-insensitively (stored uppercased).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodelistKey {
    pub package: String,
    pub codelist: String,
}

impl CodelistKey {
    pub fn new(package: impl AsRef<str>, codelist: impl AsRef<str>) -> Self {
        Self {
            package: package.as_ref().trim().to_string(),
            codelist: codelist.as_ref().trim().to_uppercase(),
        }
    }
}

impl fmt::Display for CodelistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.codelist)
    }
}

/// A source of authority codelists.
///
/// Implementations must be usable from several threads at once; prefetch
/// resolves distinct keys concurrently.
pub trait TerminologyResolver: Send + Sync {
    /// Fetch the full codelist `codelist_code` from `package`.
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution;

    /// Short human-readable name used in logs.
    fn describe(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("resolver")
            .to_string()
    }
}

impl<R: TerminologyResolver + ?Sized> TerminologyResolver for &R {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        (**self).resolve(package, codelist_code)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<R: TerminologyResolver + ?Sized> TerminologyResolver for Arc<R> {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        (**self).resolve(package, codelist_code)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<R: TerminologyResolver + ?Sized> TerminologyResolver for Box<R> {
    fn resolve(&self, package: &str, codelist_code: &str) -> Resolution {
        (**self).resolve(package, codelist_code)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
