//! Configuration for the `qlog` binary.
//!
//! ## config.kdl
//!
//! Located at `~/.config/questlog/config.kdl` (platform config directory). Contains:
//! - `data-dir` - Directory holding the vault artifacts
//! - `log-filter` - `tracing` filter directive
//! - `output-format` - "json" or "human"
//!
//! The vault password is never read from config; it comes from the command line or
//! `QLOG_PASSWORD`.
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DATA_DIR_ENV, DEFAULT_LOG_FILTER, LOG_ENV, Resolved, ResolvedConfig,
    ValueSource, config_file_path, default_data_dir, load_config_file, resolve_config,
    resolve_with,
};
pub use schema::{OutputFormat, QuestlogConfig};
