//! Configuration management for the keystroke form.
//!
//! Loaded with figment from defaults, an optional TOML file and
//! `KEYSTROKES_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::Verbosity;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "keystrokes.toml";

/// Prefix for environment overrides. Nested keys use `__`, as in
/// `KEYSTROKES_SERVER__PORT`.
pub const ENV_PREFIX: &str = "KEYSTROKES_";

/// Application configuration.
///
/// Precedence, highest first:
/// 1. Environment variables
/// 2. TOML config file
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Spreadsheet holding the keystroke table.
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbosity: Verbosity,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("keystrokes.xlsx"),
        }
    }
}

impl Config {
    /// Load from `path` (or the default file name) plus the environment.
    ///
    /// A missing TOML file is not an error; its layer is simply empty.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(CONFIG_FILE_NAME));
        let figment = Self::figment()
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// Base figment holding only the defaults.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "server.host must not be empty".to_string(),
            });
        }
        if self.storage.data_file.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.data_file must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.data_file, PathBuf::from("keystrokes.xlsx"));
        assert_eq!(config.logging.verbosity, Verbosity::Normal);
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Config::figment().merge(Toml::string(
            r#"
            [server]
            port = 8080

            [storage]
            data_file = "data/typing.xlsx"

            [logging]
            verbosity = "verbose"
            "#,
        ));
        let config = Config::from_figment(&figment).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.data_file, PathBuf::from("data/typing.xlsx"));
        assert_eq!(config.logging.verbosity, Verbosity::Verbose);
    }

    #[test]
    fn test_empty_data_file_rejected() {
        let figment = Config::figment().merge(Toml::string("[storage]\ndata_file = \"\"\n"));
        let err = Config::from_figment(&figment).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_bad_type_is_load_error() {
        let figment = Config::figment().merge(Toml::string("[server]\nport = \"eighty\"\n"));
        let err = Config::from_figment(&figment).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let figment = Config::figment().merge(Toml::file(dir.path().join("absent.toml")));
        assert_eq!(Config::from_figment(&figment).unwrap(), Config::default());
    }
}
