//! # QC Deploy Runtime
//!
//! Command-line runtime for `qc-deploy-orchestrator`.
//!
//! ## Modules
//!
//! - `cli` - Command-line arguments
//! - `config` - Deploy configuration (TOML file, `QC_DEPLOY_*` env, flags)
//! - `app` - One deployment run against the in-memory chain
//! - `summary` - Printed summaries and the JSON address book
//!
//! ## Exit codes
//!
//! `0` when every component and step confirmed (or `--validate-only` found
//! the plan valid), `1` otherwise.

#![warn(missing_docs)]

pub mod app;
pub mod cli;
pub mod config;
pub mod summary;

pub use app::{run, Outcome};
pub use cli::Args;
pub use config::{ConfigError, DeployConfig};
