//! Configuration loading and merging.
//!
//! The scanner consumes this configuration read-only. An embedded default
//! (`default_config.yaml`) always applies; a user-supplied YAML file is
//! merged over it: pattern lists are appended (de-duplicated), every other
//! field is replaced when present.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The default configuration shipped inside the binary.
const DEFAULT_CONFIG: &str = include_str!("default_config.yaml");

/// Identifiers for the supported scan formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    Go,
    Json,
    Yaml,
    Xml,
    Php,
    Properties,
    PrivateKey,
    GenericCode,
    Generic,
}

impl ScanType {
    /// Parse a configured scan type identifier.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "go" => Some(ScanType::Go),
            "json" => Some(ScanType::Json),
            "yaml" => Some(ScanType::Yaml),
            "xml" => Some(ScanType::Xml),
            "php" => Some(ScanType::Php),
            "properties" => Some(ScanType::Properties),
            "privatekey" => Some(ScanType::PrivateKey),
            "generic_code" => Some(ScanType::GenericCode),
            "generic" => Some(ScanType::Generic),
            _ => None,
        }
    }
}

/// A named value-inclusion pattern: matching values are flagged regardless of
/// the variable name, and the entry's name becomes the finding's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMatchPattern {
    pub name: String,
    pub pattern: String,
}

/// Scanner configuration, deserialized from YAML (camelCase keys).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Variable-name suspicion patterns; any match is sufficient.
    pub variable_name_patterns: Vec<String>,
    /// Suppresses a name-driven match; empty means unset.
    pub variable_name_exclusion_pattern: String,
    /// Suppresses the markup attribute-group heuristic; empty means unset.
    pub xml_attribute_name_exclusion_pattern: String,
    pub value_match_patterns: Vec<ValueMatchPattern>,
    /// Checked only against declared values (name+value path).
    pub variable_value_exclude_patterns: Vec<String>,
    /// Checked against declared values and free text alike.
    pub full_text_value_exclude_patterns: Vec<String>,
    /// Values shorter than this are never considered.
    pub min_password_length: usize,
    pub exclude_tests: bool,
    pub exclude_comments: bool,
    /// Directory names skipped entirely when tests are excluded.
    pub test_directories: Vec<String>,
    /// File/directory names skipped outright, subtree included.
    pub ignore_files: Vec<String>,
    pub scan_types: Vec<String>,
    pub generic_code_file_extensions: Vec<String>,
    pub generic_file_extensions: Vec<String>,
    pub disable_output_colors: bool,
    pub verbose: bool,
}

/// User-supplied configuration file; every field optional so that absent keys
/// fall through to the embedded default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigOverlay {
    variable_name_patterns: Option<Vec<String>>,
    variable_name_exclusion_pattern: Option<String>,
    xml_attribute_name_exclusion_pattern: Option<String>,
    value_match_patterns: Option<Vec<ValueMatchPattern>>,
    variable_value_exclude_patterns: Option<Vec<String>>,
    full_text_value_exclude_patterns: Option<Vec<String>>,
    min_password_length: Option<usize>,
    exclude_tests: Option<bool>,
    exclude_comments: Option<bool>,
    test_directories: Option<Vec<String>>,
    ignore_files: Option<Vec<String>>,
    scan_types: Option<Vec<String>>,
    generic_code_file_extensions: Option<Vec<String>>,
    generic_file_extensions: Option<Vec<String>>,
    disable_output_colors: Option<bool>,
    verbose: Option<bool>,
}

impl Config {
    /// Load the embedded default configuration, optionally merged with a
    /// user-supplied YAML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: Config = serde_yml::from_str(DEFAULT_CONFIG)
            .context("Failed to parse embedded default configuration")?;

        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let overlay: ConfigOverlay = serde_yml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.merge(overlay);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a complete configuration from a YAML string (no defaults applied).
    pub fn parse(data: &str) -> Result<Self> {
        let config: Config = serde_yml::from_str(data).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, overlay: ConfigOverlay) {
        if let Some(v) = overlay.variable_name_patterns {
            append_unique(&mut self.variable_name_patterns, v);
        }
        if let Some(v) = overlay.value_match_patterns {
            for p in v {
                if !self.value_match_patterns.contains(&p) {
                    self.value_match_patterns.push(p);
                }
            }
        }
        if let Some(v) = overlay.variable_value_exclude_patterns {
            append_unique(&mut self.variable_value_exclude_patterns, v);
        }
        if let Some(v) = overlay.full_text_value_exclude_patterns {
            append_unique(&mut self.full_text_value_exclude_patterns, v);
        }

        if let Some(v) = overlay.variable_name_exclusion_pattern {
            self.variable_name_exclusion_pattern = v;
        }
        if let Some(v) = overlay.xml_attribute_name_exclusion_pattern {
            self.xml_attribute_name_exclusion_pattern = v;
        }
        if let Some(v) = overlay.min_password_length {
            self.min_password_length = v;
        }
        if let Some(v) = overlay.exclude_tests {
            self.exclude_tests = v;
        }
        if let Some(v) = overlay.exclude_comments {
            self.exclude_comments = v;
        }
        if let Some(v) = overlay.test_directories {
            self.test_directories = v;
        }
        if let Some(v) = overlay.ignore_files {
            self.ignore_files = v;
        }
        if let Some(v) = overlay.scan_types {
            self.scan_types = v;
        }
        if let Some(v) = overlay.generic_code_file_extensions {
            self.generic_code_file_extensions = v;
        }
        if let Some(v) = overlay.generic_file_extensions {
            self.generic_file_extensions = v;
        }
        if let Some(v) = overlay.disable_output_colors {
            self.disable_output_colors = v;
        }
        if let Some(v) = overlay.verbose {
            self.verbose = v;
        }
    }

    /// Validate invariants that don't require pattern compilation; invalid
    /// regexes are caught when the classifier is built.
    pub fn validate(&self) -> Result<()> {
        if self.min_password_length == 0 {
            anyhow::bail!("minPasswordLength must be at least 1");
        }
        if self.scan_types.is_empty() {
            anyhow::bail!("At least one scan type must be enabled");
        }
        Ok(())
    }

    /// The enabled scan types; unknown identifiers are warned about and skipped.
    pub fn enabled_scan_types(&self) -> HashSet<ScanType> {
        let mut types = HashSet::new();
        for s in &self.scan_types {
            match ScanType::parse(s) {
                Some(t) => {
                    types.insert(t);
                }
                None => tracing::warn!("Unknown scan type in configuration: {s}"),
            }
        }
        types
    }

    /// Whether a directory name is configured as a test directory.
    pub fn is_test_directory(&self, name: &str) -> bool {
        self.test_directories.iter().any(|d| d == name)
    }

    /// Whether a file or directory name is on the ignore list.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore_files.iter().any(|f| f == name)
    }
}

fn append_unique(base: &mut Vec<String>, extra: Vec<String>) {
    for item in extra {
        if !base.contains(&item) {
            base.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::load(None).unwrap();
        assert!(!config.variable_name_patterns.is_empty());
        assert_eq!(config.min_password_length, 6);
        assert!(config
            .value_match_patterns
            .iter()
            .any(|p| p.name == "Postgres URI"));
        assert_eq!(config.enabled_scan_types().len(), 9);
    }

    #[test]
    fn overlay_appends_patterns_and_replaces_scalars() {
        let mut config = Config::load(None).unwrap();
        let overlay: ConfigOverlay = serde_yml::from_str(
            r#"
variableNamePatterns:
  - (?i)secret
  - mycustompattern
minPasswordLength: 10
excludeTests: true
scanTypes:
  - go
  - json
"#,
        )
        .unwrap();

        let before = config.variable_name_patterns.len();
        config.merge(overlay);

        // "(?i)secret" already exists, only the custom pattern is appended
        assert_eq!(config.variable_name_patterns.len(), before + 1);
        assert_eq!(config.min_password_length, 10);
        assert!(config.exclude_tests);
        assert_eq!(config.scan_types, vec!["go", "json"]);
    }

    #[test]
    fn predicates() {
        let config = Config::load(None).unwrap();
        assert!(config.is_test_directory("testdata"));
        assert!(!config.is_test_directory("src"));
        assert!(config.is_ignored(".git"));
        assert!(!config.is_ignored("main.go"));
    }

    #[test]
    fn invalid_min_length_rejected() {
        assert!(Config::parse("minPasswordLength: 0\nscanTypes: [go]").is_err());
    }
}
