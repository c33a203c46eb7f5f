//! Authority terminology resolution.
//!
//! A [`TerminologyResolver`] turns a (package, codelist code) pair into the
//! full published codelist. Sources:
//!
//! - [`LibraryClient`]: the CDISC Library REST API
//! - [`CatalogResolver`]: NCI EVS CT export files, for offline runs
//! - [`MemoryResolver`]: pre-loaded codelists, mostly for tests
//!
//! Wrap any of them in a [`CachingResolver`] so each pair is fetched once per
//! run, and warm the cache with [`prefetch`].

pub mod cache;
pub mod catalog;
pub mod error;
pub mod library;
pub mod memory;
pub mod prefetch;
pub mod resolver;
pub mod types;

pub use cache::CachingResolver;
pub use catalog::{CatalogResolver, package_id_for};
pub use error::{FailureKind, ResolutionFailure, TerminologyError};
pub use library::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, LibraryClient, LibraryConfig};
pub use memory::MemoryResolver;
pub use prefetch::prefetch;
pub use resolver::{CodelistKey, Resolution, TerminologyResolver};
pub use types::{AuthorityCodelist, AuthorityTerm};
