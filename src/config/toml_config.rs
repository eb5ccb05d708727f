use crate::core::cart::{CorruptPolicy, StoreOptions, DEFAULT_STORAGE_KEY};
use crate::core::persist::PersistMode;
use crate::utils::error::{CartError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    pub storage: StorageConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub key: String,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub mode: PersistMode,
    pub on_corrupt: CorruptPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: bool,
}

impl CartConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CartError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CartError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CartError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key: self.storage.key.clone(),
            mode: self.persistence.mode,
            on_corrupt: self.persistence.on_corrupt,
        }
    }
}

impl Validate for CartConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("storage.key", &self.storage.key)?;
        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;
        if let Some(level) = &self.logging.level {
            validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }
        Ok(())
    }
}
