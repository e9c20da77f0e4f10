//! Editor configuration: defaults for newly created scores.
//!
//! ```toml
//! title = "Untitled"
//! initial_bars = 1
//!
//! [time_signature]
//! numerator = 4
//! denominator = 4
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::time_signature::TimeSignature;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// Title given to new scores
    #[serde(default = "default_title")]
    pub title: String,
    /// Number of empty bars in a new score
    #[serde(default = "default_initial_bars")]
    pub initial_bars: usize,
    /// Signature of the bars a new score starts with
    #[serde(default)]
    pub time_signature: TimeSignatureConfig,
}

/// Unvalidated signature as written in the file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeSignatureConfig {
    #[serde(default = "default_numerator")]
    pub numerator: u32,
    #[serde(default = "default_denominator")]
    pub denominator: u32,
}

fn default_title() -> String {
    "Untitled".to_string()
}
fn default_initial_bars() -> usize {
    1
}
fn default_numerator() -> u32 {
    4
}
fn default_denominator() -> u32 {
    4
}

impl Default for TimeSignatureConfig {
    fn default() -> Self {
        Self {
            numerator: default_numerator(),
            denominator: default_denominator(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            initial_bars: default_initial_bars(),
            time_signature: TimeSignatureConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ScoreError::Config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| ScoreError::Config(format!("Invalid TOML: {e}")))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| ScoreError::Config(format!("TOML serialization error: {e}")))
    }

    pub fn time_signature(&self) -> Result<TimeSignature> {
        TimeSignature::new(self.time_signature.numerator, self.time_signature.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = EditorConfig::from_toml_str("").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.time_signature().unwrap(), TimeSignature::FOUR_FOUR);
    }

    #[test]
    fn partial_time_signature_uses_defaults() {
        let config = EditorConfig::from_toml_str("[time_signature]\nnumerator = 3\n").unwrap();
        assert_eq!(config.time_signature().unwrap().units(), 36);
        assert_eq!(config.title, "Untitled");
    }

    #[test]
    fn unsupported_signature_surfaces_on_use() {
        let toml = "[time_signature]\nnumerator = 5\ndenominator = 16\n";
        let config = EditorConfig::from_toml_str(toml).unwrap();
        assert!(matches!(
            config.time_signature(),
            Err(ScoreError::UnsupportedTimeSignature { numerator: 5, denominator: 16 })
        ));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            EditorConfig::from_toml_str("title = "),
            Err(ScoreError::Config(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let config = EditorConfig {
            title: "Paradiddles".to_string(),
            initial_bars: 8,
            ..EditorConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), config);
    }
}
