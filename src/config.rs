use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::scanner::DEFAULT_LOUDNESS;

/// Configuration key the scanner's target loudness is read from.
pub const TARGET_DB_KEY: &str = "rg_scanner.target_db";

const DEFAULT_CONFIG: &[u8] = include_bytes!("../config/default.yml");

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub session_id: String,
    #[serde(default = "default_target_db")]
    pub target_db: f32,
    #[serde(default = "default_title_format")]
    pub title_format: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Named floating point setting, falling back to `default` for keys this
    /// configuration does not carry.
    pub fn get_float(&self, key: &str, default: f32) -> f32 {
        match key {
            TARGET_DB_KEY => self.target_db,
            _ => default,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            target_db: default_target_db(),
            title_format: default_title_format(),
            tick_interval_ms: default_tick_interval_ms(),
            worker_name: default_worker_name(),
        }
    }
}

fn default_target_db() -> f32 {
    DEFAULT_LOUDNESS
}

fn default_title_format() -> String {
    "%title%".to_string()
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_worker_name() -> String {
    "rg-scan".to_string()
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_hash: String,
}

/// Load `path`, or the embedded default when no path is given. The hash
/// covers the raw bytes so a run can be matched to its exact config file.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let bytes = match path {
        Some(p) => std::fs::read(p).with_context(|| format!("reading config {}", p.display()))?,
        None => DEFAULT_CONFIG.to_vec(),
    };
    let config_hash = hex::encode(Sha256::digest(&bytes));

    let mut config: Config = serde_yaml::from_slice(&bytes).context("parsing config")?;
    if config.session_id.trim().is_empty() {
        config.session_id = generate_session_id();
    }

    Ok(LoadedConfig {
        config,
        config_hash,
    })
}

/// Local time to the second plus the process id, e.g. `20261016-142233-4711`.
fn generate_session_id() -> String {
    let now = chrono::Local::now();
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), std::process::id())
}
