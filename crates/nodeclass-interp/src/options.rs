//! Interpolation options: sentinels, path delimiter and mutator hooks.
//!
//! Options are usually embedded in a larger configuration file; the
//! recognised keys are `parameter_sentinels`, `function_sentinels`,
//! `path_delimiter` and `mutators`.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An opening/closing marker pair such as `${` and `}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 2]", into = "[String; 2]")]
pub struct Sentinels {
    pub open: String,
    pub close: String,
}

impl Sentinels {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Wrap `body` back in this sentinel pair.
    pub fn wrap(&self, body: &str) -> String {
        format!("{}{}{}", self.open, body, self.close)
    }
}

impl From<[String; 2]> for Sentinels {
    fn from([open, close]: [String; 2]) -> Self {
        Self { open, close }
    }
}

impl From<Sentinels> for [String; 2] {
    fn from(s: Sentinels) -> Self {
        [s.open, s.close]
    }
}

/// Options controlling how references are recognised and resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterpolationOptions {
    #[serde(default = "default_parameter_sentinels")]
    pub parameter_sentinels: Sentinels,

    #[serde(default = "default_function_sentinels")]
    pub function_sentinels: Sentinels,

    /// Separator between path segments in parameter references.
    #[serde(default = "default_path_delimiter")]
    pub path_delimiter: String,

    /// Dotted mutator names, applied most recently listed first.
    #[serde(default)]
    pub mutators: Vec<String>,
}

fn default_parameter_sentinels() -> Sentinels {
    Sentinels::new("${", "}")
}

fn default_function_sentinels() -> Sentinels {
    Sentinels::new("$[", "]")
}

fn default_path_delimiter() -> String {
    ":".to_string()
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            parameter_sentinels: default_parameter_sentinels(),
            function_sentinels: default_function_sentinels(),
            path_delimiter: default_path_delimiter(),
            mutators: Vec::new(),
        }
    }
}

impl InterpolationOptions {
    /// Parse and validate options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("loading interpolation options from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (kind, s) in [
            ("parameter", &self.parameter_sentinels),
            ("function", &self.function_sentinels),
        ] {
            if s.open.is_empty() || s.close.is_empty() {
                return Err(ConfigError::Invalid(format!("{kind} sentinels must not be empty")));
            }
        }
        if self.parameter_sentinels.open == self.function_sentinels.open {
            return Err(ConfigError::Invalid(format!(
                "parameter and function references share the opening sentinel '{}'",
                self.parameter_sentinels.open
            )));
        }
        if self.path_delimiter.is_empty() {
            return Err(ConfigError::Invalid("path delimiter must not be empty".into()));
        }
        Ok(())
    }
}
