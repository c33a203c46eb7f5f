//! CLI argument definitions for define-meta.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "define-meta",
    version,
    about = "Derive Define-XML codelists, where clauses and value-level metadata",
    long_about = "Derive Define-XML codelists, where clauses and value-level metadata\n\
                  from a subset specification, resolving controlled terminology against\n\
                  the CDISC Library or an offline CT export."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive worksheets from a subset specification.
    Derive(DeriveArgs),

    /// Check a subset specification for misaligned variables.
    Validate(ValidateArgs),
}

#[derive(Parser)]
pub struct DeriveArgs {
    /// Subset specification JSON file.
    #[arg(value_name = "SPEC")]
    pub specification: PathBuf,

    /// JSON file of inclusion lists to attach to the specification.
    #[arg(long = "inclusions", value_name = "PATH")]
    pub inclusions: Option<PathBuf>,

    /// Write the specification, with inclusion lists attached, to PATH.
    #[arg(long = "write-spec", value_name = "PATH")]
    pub write_spec: Option<PathBuf>,

    /// Output directory (default: <SPEC directory>/define).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run configuration (default: ./define-meta.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// CT package to resolve codelists against (overrides the configuration).
    #[arg(long = "package", value_name = "ID")]
    pub package: Option<String>,

    /// Offline CT export to resolve codelists from (overrides the configuration).
    #[arg(long = "ct-file", value_name = "PATH")]
    pub ct_file: Option<PathBuf>,

    /// Never contact the CDISC Library.
    #[arg(long = "offline")]
    pub offline: bool,

    /// Derive and report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Subset specification JSON file.
    #[arg(value_name = "SPEC")]
    pub specification: PathBuf,

    /// JSON file of inclusion lists to attach before checking.
    #[arg(long = "inclusions", value_name = "PATH")]
    pub inclusions: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
