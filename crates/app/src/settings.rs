// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Application settings, loaded from a TOML file with `BASELAYER__`-prefixed
//! environment overrides (`BASELAYER__DATABASE__HOST=...`), mirroring the
//! teacher's own `K3K_CTRL__`-prefixed settings loader.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    #[serde(default)]
    pub security: Security,
    pub app: App,
    pub ports: Ports,
    #[serde(default)]
    pub services: Services,
}

impl Settings {
    /// Loads settings from `file_name`, then applies any `BASELAYER__...`
    /// environment overrides on top.
    pub fn load(file_name: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut cfg = Config::new();
        cfg.merge(File::from(file_name.as_ref()))?;
        cfg.merge(Environment::with_prefix("BASELAYER").separator("__"))?;
        cfg.try_into()
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,
    #[serde(default = "default_pool_recycle")]
    pub pool_recycle: u64,
}

impl Database {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

fn default_db_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    5
}

fn default_max_overflow() -> u32 {
    10
}

fn default_pool_recycle() -> u64 {
    3600
}

/// The leak policy and its optional Slack webhook notification.
#[derive(Debug, Deserialize)]
pub struct Security {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub slack: Slack,
}

impl Default for Security {
    fn default() -> Self {
        Self {
            strict: false,
            slack: Slack::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Slack {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub secret_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Ports {
    pub websocket_path_in: String,
    pub websocket_path_out: String,
    pub websocket: u16,
    pub app_internal: u16,
    pub migration_manager: u16,
    pub status: u16,
}

#[derive(Debug, Default, Deserialize)]
pub struct Services {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub enabled: Vec<String>,
    #[serde(default)]
    pub disabled: Vec<String>,
}
