//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`QLOG_DATA_DIR`, `QLOG_LOG`)
//! 3. config.kdl (`~/.config/questlog/config.kdl`)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use kdl::KdlDocument;

use crate::config::{OutputFormat, QuestlogConfig};
use crate::{Error, Result};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "QLOG_DATA_DIR";

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "QLOG_LOG";

/// Log filter used when nothing else sets one.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from a config.kdl file
    ConfigFile(PathBuf),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile(path) => write!(f, "config:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: Resolved<PathBuf>,
    pub log_filter: Resolved<String>,
    pub output_format: Resolved<OutputFormat>,
}

impl ResolvedConfig {
    pub fn data_dir(&self) -> &Path {
        &self.data_dir.value
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter.value
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// `~/.config/questlog/config.kdl`, if the platform has a config directory.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("questlog").join("config.kdl"))
}

/// `~/.local/share/questlog`, falling back to `./.questlog` without a platform data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("questlog"))
        .unwrap_or_else(|| PathBuf::from(".questlog"))
}

/// Read and validate a config.kdl. A missing file is an empty config.
pub fn load_config_file(path: &Path) -> Result<QuestlogConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(QuestlogConfig::new()),
        Err(e) => return Err(e.into()),
    };
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    QuestlogConfig::from_kdl(&doc).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Resolve configuration from the CLI, the process environment and the default config file.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let path = config_file_path();
    let file = match &path {
        Some(path) => load_config_file(path)?,
        None => QuestlogConfig::new(),
    };
    Ok(resolve_with(overrides, &file, path.as_deref(), |name| {
        std::env::var(name).ok()
    }))
}

/// Apply the precedence chain to already-loaded inputs.
///
/// Empty environment values are treated as unset.
pub fn resolve_with(
    overrides: &ConfigOverrides,
    file: &QuestlogConfig,
    file_path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let from_file = || {
        ValueSource::ConfigFile(file_path.map(Path::to_path_buf).unwrap_or_default())
    };

    let data_dir = if let Some(dir) = &overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = env(DATA_DIR_ENV) {
        Resolved::new(
            PathBuf::from(dir),
            ValueSource::EnvVar(DATA_DIR_ENV.to_string()),
        )
    } else if let Some(dir) = &file.data_dir {
        Resolved::new(dir.clone(), from_file())
    } else {
        Resolved::new(default_data_dir(), ValueSource::Default)
    };

    let log_filter = if let Some(filter) = env(LOG_ENV) {
        Resolved::new(filter, ValueSource::EnvVar(LOG_ENV.to_string()))
    } else if let Some(filter) = &file.log_filter {
        Resolved::new(filter.clone(), from_file())
    } else {
        Resolved::new(DEFAULT_LOG_FILTER.to_string(), ValueSource::Default)
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = file.output_format {
        Resolved::new(format, from_file())
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    ResolvedConfig {
        data_dir,
        log_filter,
        output_format,
    }
}
