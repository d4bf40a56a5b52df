//! Configuration handling.
//!
//! Thresholds and output directories, loadable from a TOML file. Every field
//! has a default, so an empty file is a valid configuration.

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Threshold '{0}' must lie in [0, 1], got {1}")]
    ThresholdError(&'static str, f64),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Workbooks known up front, listed before discovered ones.
    #[serde(default)]
    pub workbooks: Vec<String>,

    /// Cleaning thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Output directory layout.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Fractions that drive column pruning, header recovery and row pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Columns with a larger fraction of missing cells are dropped.
    #[serde(default = "default_max_missing_column_fraction")]
    pub max_missing_column_fraction: f64,

    /// Header rows are promoted while the placeholder fraction is larger.
    #[serde(default = "default_max_unnamed_header_fraction")]
    pub max_unnamed_header_fraction: f64,

    /// Rows need at least this fraction of present cells.
    #[serde(default = "default_min_present_row_fraction")]
    pub min_present_row_fraction: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_missing_column_fraction: default_max_missing_column_fraction(),
            max_unnamed_header_fraction: default_max_unnamed_header_fraction(),
            min_present_row_fraction: default_min_present_row_fraction(),
        }
    }
}

fn default_max_missing_column_fraction() -> f64 {
    0.9
}

fn default_max_unnamed_header_fraction() -> f64 {
    0.8
}

fn default_min_present_row_fraction() -> f64 {
    0.8
}

/// Output directories; relative ones resolve against `base_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Whole-sheet conversions of question workbooks.
    #[serde(default = "default_input_questions_dir")]
    pub input_questions_dir: PathBuf,

    /// Whole-sheet conversions of knowledge workbooks, also searched for workbooks.
    #[serde(default = "default_knowledge_dir")]
    pub knowledge_dir: PathBuf,

    /// Parent of the `numerical/` and `text/` split outputs.
    #[serde(default = "default_split_dir")]
    pub split_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            input_questions_dir: default_input_questions_dir(),
            knowledge_dir: default_knowledge_dir(),
            split_dir: default_split_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_input_questions_dir() -> PathBuf {
    PathBuf::from("input_questions")
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from("knowledge")
}

fn default_split_dir() -> PathBuf {
    PathBuf::from("knowledge/csv")
}

impl OutputConfig {
    pub fn input_questions_path(&self) -> PathBuf {
        self.base_dir.join(&self.input_questions_dir)
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.base_dir.join(&self.knowledge_dir)
    }

    pub fn numerical_path(&self) -> PathBuf {
        self.base_dir.join(&self.split_dir).join("numerical")
    }

    pub fn text_path(&self) -> PathBuf {
        self.base_dir.join(&self.split_dir).join("text")
    }
}

impl ThresholdConfig {
    /// Checks every threshold lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("max_missing_column_fraction", self.max_missing_column_fraction),
            ("max_unnamed_header_fraction", self.max_unnamed_header_fraction),
            ("min_present_row_fraction", self.min_present_row_fraction),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdError(name, value));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Config rooted at `base_dir`, with default thresholds.
    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        let mut config = Config::default();
        config.output.base_dir = base_dir.into();
        config
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Parses and validates TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.thresholds.validate()?;
        Ok(config)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.thresholds.max_missing_column_fraction, 0.9);
        assert_eq!(config.thresholds.max_unnamed_header_fraction, 0.8);
        assert_eq!(config.thresholds.min_present_row_fraction, 0.8);
        assert_eq!(config.output.numerical_path(), Path::new("data/knowledge/csv/numerical"));
        assert_eq!(config.output.text_path(), Path::new("data/knowledge/csv/text"));
        assert_eq!(config.output.input_questions_path(), Path::new("data/input_questions"));
        assert!(config.workbooks.is_empty());
    }

    #[test]
    fn parse_config() {
        let toml_content = r#"
workbooks = ["data/knowledge/portfolio.xlsx"]

[thresholds]
max_missing_column_fraction = 0.5

[output]
base_dir = "/srv/normalizer"
split_dir = "split"
"#;

        let config = Config::parse(toml_content).unwrap();
        assert_eq!(config.thresholds.max_missing_column_fraction, 0.5);
        assert_eq!(config.thresholds.min_present_row_fraction, 0.8);
        assert_eq!(config.output.knowledge_path(), Path::new("/srv/normalizer/knowledge"));
        assert_eq!(config.output.numerical_path(), Path::new("/srv/normalizer/split/numerical"));
        assert_eq!(config.workbooks, vec!["data/knowledge/portfolio.xlsx"]);
    }

    #[test]
    fn invalid_threshold() {
        let error = Config::parse("[thresholds]\nmin_present_row_fraction = 1.5\n").unwrap_err();
        assert!(error.to_string().contains("min_present_row_fraction"), "{error}");
    }

    #[test]
    fn load_from_file() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("normalizer.toml");
        std::fs::write(&path, Config::default_toml()).unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
        assert!(Config::load(&directory.path().join("absent.toml")).is_err());
    }
}
