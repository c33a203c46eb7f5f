//! Library components of the define-meta CLI.

pub mod config;
pub mod logging;
pub mod run;
