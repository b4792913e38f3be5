//! Encoder configuration.
//!
//! Loaded from `semql.toml`; every key is optional.
//!
//! ```toml
//! max_select_columns = 5
//! max_where_conditions = 3
//! strict = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{SemqlError, SemqlResult};

/// Widest select list the `N` symbol can express.
pub const GRAMMAR_MAX_SELECT_COLUMNS: usize = 5;

/// Most WHERE conditions the `Filter` combinators can express.
pub const GRAMMAR_MAX_WHERE_CONDITIONS: usize = 3;

const CONFIG_FILE: &str = "semql.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Records with a wider select list are skipped by the batch driver.
    pub max_select_columns: usize,

    /// Queries with more WHERE conditions fail to encode.
    pub max_where_conditions: usize,

    /// Abort the batch on the first record that fails to encode.
    pub strict: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            max_select_columns: GRAMMAR_MAX_SELECT_COLUMNS,
            max_where_conditions: GRAMMAR_MAX_WHERE_CONDITIONS,
            strict: false,
        }
    }
}

impl EncoderConfig {
    /// Create a new configuration builder
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::default()
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> SemqlResult<Self> {
        let config: EncoderConfig = toml::from_str(content)?;
        config.validate()
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> SemqlResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SemqlError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the configuration: an explicit path, then `./semql.toml`,
    /// then the user config directory, then defaults.
    pub fn discover(explicit: Option<&Path>) -> SemqlResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(self) -> SemqlResult<Self> {
        if !(1..=GRAMMAR_MAX_SELECT_COLUMNS).contains(&self.max_select_columns) {
            return Err(SemqlError::Config(format!(
                "max_select_columns must be between 1 and {}, got {}",
                GRAMMAR_MAX_SELECT_COLUMNS, self.max_select_columns
            )));
        }
        if !(1..=GRAMMAR_MAX_WHERE_CONDITIONS).contains(&self.max_where_conditions) {
            return Err(SemqlError::Config(format!(
                "max_where_conditions must be between 1 and {}, got {}",
                GRAMMAR_MAX_WHERE_CONDITIONS, self.max_where_conditions
            )));
        }
        Ok(self)
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("semql").join(CONFIG_FILE));
    }
    paths
}

/// Builder for EncoderConfig
#[derive(Debug, Default)]
pub struct EncoderConfigBuilder {
    config: EncoderConfig,
}

impl EncoderConfigBuilder {
    pub fn max_select_columns(mut self, n: usize) -> Self {
        self.config.max_select_columns = n;
        self
    }

    pub fn max_where_conditions(mut self, n: usize) -> Self {
        self.config.max_where_conditions = n;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> SemqlResult<EncoderConfig> {
        self.config.validate()
    }
}
