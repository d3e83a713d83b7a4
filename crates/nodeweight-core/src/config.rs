//! nodeweight.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Annotation inspected when none is configured.
pub const DEFAULT_ANNOTATION: &str = "nodeweight.io/weight";

/// Weight assigned to nodes without a usable annotation.
pub const DEFAULT_NODE_WEIGHT: u32 = 1;

/// Largest weight a node may carry. Anything above resolves to the default.
pub const MAX_NODE_WEIGHT: u32 = 128;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeightConfig {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeightsConfig {
    /// Node annotation holding the weight value.
    #[serde(default = "default_annotation")]
    pub annotation: String,
    /// Fallback weight for absent, unparsable, or out-of-range annotations.
    #[serde(default = "default_weight")]
    pub default: u32,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            annotation: default_annotation(),
            default: default_weight(),
        }
    }
}

fn default_annotation() -> String {
    DEFAULT_ANNOTATION.to_string()
}

fn default_weight() -> u32 {
    DEFAULT_NODE_WEIGHT
}

impl WeightConfig {
    pub fn new(annotation: impl Into<String>, default: u32) -> Self {
        Self {
            weights: WeightsConfig {
                annotation: annotation.into(),
                default,
            },
        }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: WeightConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a nodeweight.toml with the built-in defaults.
    pub fn scaffold() -> Self {
        Self::default()
    }

    /// Apply command-line overrides on top of file values.
    pub fn with_overrides(mut self, annotation: Option<String>, default: Option<u32>) -> ConfigResult<Self> {
        if let Some(annotation) = annotation {
            self.weights.annotation = annotation;
        }
        if let Some(default) = default {
            self.weights.default = default;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn annotation(&self) -> &str {
        &self.weights.annotation
    }

    pub fn default_weight(&self) -> u32 {
        self.weights.default
    }

    /// Reject settings that would break the weight table invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.weights.annotation.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "weights.annotation must not be empty".to_string(),
            ));
        }
        if self.weights.default > MAX_NODE_WEIGHT {
            return Err(ConfigError::Invalid(format!(
                "weights.default {} exceeds the maximum weight {MAX_NODE_WEIGHT}",
                self.weights.default
            )));
        }
        Ok(())
    }
}
