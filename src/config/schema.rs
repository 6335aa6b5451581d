//! KDL schema for config.kdl.
//!
//! ```kdl
//! // Where the vault artifacts live
//! data-dir "/home/me/.local/share/questlog"
//! // tracing EnvFilter directive for the qlog binary
//! log-filter "questlog=debug"
//! output-format "human"  // or "json"
//! ```

use std::path::PathBuf;

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl. Every field is optional; unset fields fall through to
/// the next layer of the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestlogConfig {
    /// Directory holding the vault artifacts
    pub data_dir: Option<PathBuf>,

    /// `tracing` filter directive for the binary
    pub log_filter: Option<String>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

/// First string argument of node `name`, if the node exists.
fn string_arg<'a>(doc: &'a KdlDocument, name: &str) -> Result<Option<&'a str>, String> {
    let Some(node) = doc.get(name) else {
        return Ok(None);
    };
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_string())
        .map(Some)
        .ok_or_else(|| format!("{} must have a string value", name))
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

impl QuestlogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err("log-filter must not be empty".to_string());
            }
        }
        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err("data-dir must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self, String> {
        let mut config = Self::new();

        config.data_dir = string_arg(doc, "data-dir")?.map(PathBuf::from);
        config.log_filter = string_arg(doc, "log-filter")?.map(str::to_string);
        config.output_format = string_arg(doc, "output-format")?
            .map(|s| {
                OutputFormat::parse(s)
                    .ok_or_else(|| format!("output-format must be json or human, got {:?}", s))
            })
            .transpose()?;

        config.validate()?;
        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();
        if let Some(dir) = &self.data_dir {
            doc.nodes_mut()
                .push(string_node("data-dir", &dir.to_string_lossy()));
        }
        if let Some(filter) = &self.log_filter {
            doc.nodes_mut().push(string_node("log-filter", filter));
        }
        if let Some(format) = self.output_format {
            doc.nodes_mut()
                .push(string_node("output-format", format.as_str()));
        }
        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &QuestlogConfig) {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir.clone();
        }
        if other.log_filter.is_some() {
            self.log_filter = other.log_filter.clone();
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let config = QuestlogConfig::from_kdl(&KdlDocument::new()).unwrap();
        assert_eq!(config, QuestlogConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            data-dir "/tmp/qlog"
            log-filter "questlog=debug"
            output-format "human"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = QuestlogConfig::from_kdl(&doc).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/qlog")));
        assert_eq!(config.log_filter.as_deref(), Some("questlog=debug"));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
    }

    #[test]
    fn test_config_rejects_bad_output_format() {
        let doc: KdlDocument = r#"output-format "yaml""#.parse().unwrap();
        let err = QuestlogConfig::from_kdl(&doc).unwrap_err();
        assert!(err.contains("output-format"));
    }

    #[test]
    fn test_config_rejects_empty_log_filter() {
        let doc: KdlDocument = r#"log-filter "  ""#.parse().unwrap();
        assert!(QuestlogConfig::from_kdl(&doc).is_err());
    }

    #[test]
    fn test_config_rejects_non_string_value() {
        let doc: KdlDocument = "log-filter 3".parse().unwrap();
        assert!(QuestlogConfig::from_kdl(&doc).is_err());
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = QuestlogConfig {
            data_dir: Some(PathBuf::from("/srv/questlog")),
            log_filter: Some("warn".to_string()),
            output_format: Some(OutputFormat::Json),
        };
        let parsed = QuestlogConfig::from_kdl(&config.to_kdl()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_merge() {
        let mut base = QuestlogConfig {
            log_filter: Some("warn".to_string()),
            output_format: Some(OutputFormat::Json),
            ..Default::default()
        };
        base.merge(&QuestlogConfig {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        });
        assert_eq!(base.log_filter.as_deref(), Some("warn"));
        assert_eq!(base.output_format, Some(OutputFormat::Human));
    }
}
