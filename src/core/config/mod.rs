//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. An explicit path (the CLI `--config` flag)
//! 2. `$REPOMETA_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/repometa/config.toml`
//! 4. `~/.repometa/config.toml`
//!
//! A missing file is not an error; defaults are used. An explicit path
//! that does not exist is an error.
//!
//! # Example
//!
//! ```no_run
//! use repometa::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! let registry = config.build_registry().unwrap();
//! println!("{} fields, locales {:?}", registry.len(), config.supported_languages());
//! ```

pub mod schema;

pub use schema::{AuthorityRule, FieldConfig, I18nConfig, RepoMetaConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::authority::ConfiguredAuthorityPolicy;
use crate::core::registry::{InMemoryFieldRegistry, RegistryError};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "REPOMETA_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,

    #[error("field registry: {0}")]
    Registry(#[from] RegistryError),
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed document
    pub file: RepoMetaConfig,
    /// Path the document was loaded from (if any)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated, or if `explicit` does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::ReadError {
                        path: path.to_path_buf(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "no such file",
                        ),
                    });
                }
                Some(path.to_path_buf())
            }
            None => Self::search(),
        };

        let file = match &path {
            Some(p) => Self::read_config(p)?,
            None => RepoMetaConfig::default(),
        };
        file.validate()?;

        tracing::debug!(path = ?path, fields = file.fields.len(), "configuration loaded");
        Ok(Config { file, path })
    }

    /// Parse and validate a configuration document held in memory.
    pub fn from_toml_str(contents: &str) -> Result<Config, ConfigError> {
        let file: RepoMetaConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;
        file.validate()?;
        Ok(Config { file, path: None })
    }

    /// First existing file among the default locations.
    fn search() -> Option<PathBuf> {
        // 1. Check $REPOMETA_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/repometa/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("repometa/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.repometa/config.toml
        if let Ok(path) = Self::home_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn read_config(path: &Path) -> Result<RepoMetaConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The per-user config path, `~/.repometa/config.toml`.
    pub fn home_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".repometa/config.toml"))
    }

    /// Path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // =========================================================================
    // Derived collaborators
    // =========================================================================

    /// Build a field registry seeded with the configured fields.
    pub fn build_registry(&self) -> Result<InMemoryFieldRegistry, ConfigError> {
        let mut registry = InMemoryFieldRegistry::new();
        for field in &self.file.fields {
            registry.register_name(field.name.clone(), field.scope_note.clone())?;
        }
        Ok(registry)
    }

    /// Build the authority policy from the `[[authority]]` rows.
    pub fn authority_policy(&self) -> ConfiguredAuthorityPolicy {
        ConfiguredAuthorityPolicy::from_rules(&self.file.authority)
    }

    /// Supported locale languages in fallback order.
    pub fn supported_languages(&self) -> Vec<String> {
        self.file.i18n.supported_languages()
    }

    pub fn default_locale(&self) -> &str {
        &self.file.i18n.default_locale
    }
}
