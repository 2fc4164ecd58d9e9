//! Packlint - static analyzer for YunoHost application packages.
//!
//! A package is analyzed as a set of subjects (manifest, scripts,
//! configuration files, catalog entry) against per-subject rule suites.
//! Every rule produces plain severity-tagged reports; a run-wide
//! aggregation table feeds the final qualification rules and the exit
//! verdict.
//!
//! # Architecture
//!
//! - `engine`: rule registry, suite execution, report aggregation
//! - `suites`: the actual checks, one module per subject
//! - `render`: human (colored) and JSON output
//! - `shell`: minimal shell tokenizer the script suite runs on
//! - `remote`: cached reference data (SPDX list, app catalog clone)

pub mod cli;
pub mod engine;
pub mod remote;
pub mod render;
pub mod shell;
pub mod suites;

pub use engine::{AggregateTable, Engine, Registry, Report, Rule, Scope, Severity, Subject};
pub use render::OutputMode;
pub use suites::package::App;
pub use suites::register_all;
