//! TOML configuration loading, gated by the
//! `serde` feature.
//!
//! Mirrors `evo_common::config`'s `ConfigError`/`ConfigLoader` split: a
//! thiserror enum for load/parse/validate failures, `#[serde(deny_unknown_fields)]`
//! on every struct, and named `default_*` functions for optional fields
//! rather than inline closures.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating an [`RfcConfig`].
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the given path.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed after parsing.
    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

fn default_class_width() -> f64 {
    1.0
}
fn default_class_offset() -> f64 {
    0.0
}

/// Class quantization section (`[class]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassConfig {
    /// Number of classes; `0` disables histograms.
    pub class_count: u16,
    #[serde(default = "default_class_width")]
    pub class_width: f64,
    #[serde(default = "default_class_offset")]
    pub class_offset: f64,
}

fn default_sx() -> f64 {
    1e3
}
fn default_nx() -> f64 {
    1e7
}
fn default_k() -> f64 {
    5.0
}
fn default_k2() -> f64 {
    5.0
}
fn default_sd() -> f64 {
    0.0
}
fn default_nd() -> f64 {
    f64::INFINITY
}
fn default_omission() -> f64 {
    0.0
}

/// Wöhler curve section (`[wohler]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WohlerConfig {
    #[serde(default = "default_sx")]
    pub sx: f64,
    #[serde(default = "default_nx")]
    pub nx: f64,
    #[serde(default = "default_k")]
    pub k: f64,
    #[serde(default = "default_k2")]
    pub k2: f64,
    #[serde(default = "default_sd")]
    pub sd: f64,
    #[serde(default = "default_nd")]
    pub nd: f64,
    #[serde(default = "default_omission")]
    pub omission: f64,
}

/// Which default-path detector to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorConfig {
    None,
    FourPoint,
    Hcm,
    Astm,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::FourPoint
    }
}

/// Residue finalization policy selection, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResiduePolicyConfig {
    None,
    Ignore,
    NoFinalize,
    Discard,
    HalfCycles,
    FullCycles,
    ClormannSeeger,
    RpDin45667,
    Repeated,
}

impl Default for ResiduePolicyConfig {
    fn default() -> Self {
        Self::HalfCycles
    }
}

fn default_full_inc() -> u32 {
    2
}

/// Root configuration for one [`crate::context::RainflowContext`]
/// (`[class]`, `[wohler]`, plus scalar top-level fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RfcConfig {
    pub class: ClassConfig,
    pub wohler: WohlerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub residue_policy: ResiduePolicyConfig,
    #[serde(default = "default_full_inc")]
    pub full_inc: u32,
    #[serde(default)]
    pub minimal: bool,
}

impl RfcConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation beyond what serde/`ClassParam`/`WohlerCurve`
    /// constructors already check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.class.class_width <= 0.0 {
            return Err(ConfigError::ValidationError(
                "class.class_width must be > 0".into(),
            ));
        }
        if self.wohler.k.abs() < 1.0 || self.wohler.k2.abs() < 1.0 {
            return Err(ConfigError::ValidationError(
                "wohler.k and wohler.k2 magnitudes must be >= 1".into(),
            ));
        }
        if self.full_inc == 0 || self.full_inc % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "full_inc must be a positive even number".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let f = write_toml(
            r#"
            [class]
            class_count = 64

            [wohler]
            "#,
        );
        let cfg = RfcConfig::load(f.path()).unwrap();
        assert_eq!(cfg.class.class_count, 64);
        assert_eq!(cfg.class.class_width, 1.0);
        assert_eq!(cfg.wohler.sx, 1e3);
        assert_eq!(cfg.detector, DetectorConfig::FourPoint);
        assert_eq!(cfg.full_inc, 2);
    }

    #[test]
    fn missing_file_reports_file_not_found() {
        let err = RfcConfig::load(Path::new("/nonexistent/rainflow.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let f = write_toml(
            r#"
            [class]
            class_count = 64
            bogus_field = 1

            [wohler]
            "#,
        );
        assert!(matches!(
            RfcConfig::load(f.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn rejects_bad_full_inc() {
        let f = write_toml(
            r#"
            [class]
            class_count = 64

            [wohler]

            full_inc = 3
            "#,
        );
        assert!(matches!(
            RfcConfig::load(f.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
