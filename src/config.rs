//! This module provides functionality for loading and handling the relay's configuration.
//!
//! It defines the `RelayConfig` struct, which holds the configuration parameters,
//! and a `load_config` function to load the configuration from a YAML file.
//!
//! # Examples
//!
//! Loading the configuration from a file:
//!
//! ```no_run
//! use chat_relay::config::{RelayConfig, load_config};
//!
//! let config_file_path = "/path/to/config.yaml";
//! let config: RelayConfig = load_config(config_file_path).unwrap();
//! println!("{:?}", config);
//! ```

use serde::{Deserialize, Serialize};
use std::{error::Error, fs, path::Path};

use crate::api::DEFAULT_API_URL;
use crate::catalog::DEFAULT_MODEL;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_STORAGE_DB_URL: &str = "relay.db";

/// Represents the relay's configuration.
///
/// Every field has a default, so a partial (or empty) YAML document is valid.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct RelayConfig {
    /// Completions endpoint the proxy forwards to.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token for the completions endpoint, if it needs one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used by the CLI when none is given on the command line.
    #[serde(default = "default_model")]
    pub model: String,

    /// Address the proxy listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Base URL the CLI uses to reach the proxy.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,

    // Settings and conversation database (SQLite)
    #[serde(default = "default_storage_db_url")]
    pub storage_db_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_proxy_url() -> String {
    DEFAULT_PROXY_URL.to_string()
}

fn default_storage_db_url() -> String {
    DEFAULT_STORAGE_DB_URL.to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            bind_address: default_bind_address(),
            proxy_url: default_proxy_url(),
            storage_db_url: default_storage_db_url(),
        }
    }
}

/// Loads the relay's configuration from a YAML file.
///
/// # Returns
///
/// - `Ok(RelayConfig)`: The loaded configuration.
/// - `Err(Box<dyn Error>)`: An error occurred while reading the file or parsing the YAML.
///
/// # Examples
///
/// ```no_run
/// use chat_relay::config::load_config;
///
/// match load_config("/path/to/config.yaml") {
///     Ok(config) => println!("{:?}", config),
///     Err(err) => eprintln!("Error loading config: {}", err),
/// }
/// ```
pub fn load_config(file: &str) -> Result<RelayConfig, Box<dyn Error>> {
    tracing::debug!("Loading config: {}", file);
    let content = fs::read_to_string(file)?;
    let config: RelayConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields [`RelayConfig::default`].
pub fn load_config_or_default(file: &Path) -> Result<RelayConfig, Box<dyn Error>> {
    if !file.exists() {
        tracing::info!(
            "No config at {}, using defaults (run `relay init` to create one)",
            file.display()
        );
        return Ok(RelayConfig::default());
    }
    let path = file.to_str().ok_or("Config path is not valid UTF-8")?;
    load_config(path)
}
