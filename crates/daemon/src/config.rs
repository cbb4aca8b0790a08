//! Daemon settings
//!
//! Layered with the `config` crate: built-in defaults, then the TOML file
//! named by `TOKENLINE_CONFIG` (if any), then `TOKENLINE_*` variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tokenline_api_rpc::server::{
    DEFAULT_RATE_LIMIT_BURST, DEFAULT_RATE_LIMIT_RATE, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT,
};
use tokenline_core::application::{
    DuplicateJoinPolicy, EngineConfig, DEFAULT_MAX_CAS_RETRIES, DEFAULT_MINUTES_PER_PERSON,
};

pub const ENV_PREFIX: &str = "TOKENLINE";
pub const CONFIG_FILE_ENV: &str = "TOKENLINE_CONFIG";

const DEFAULT_DB_PATH: &str = "~/.tokenline/queues.db";
const DEFAULT_PRUNE_INTERVAL_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    pub db_path: String,
    pub storage: StorageBackend,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub duplicate_join: DuplicateJoinPolicy,
    pub max_cas_retries: u32,
    pub minutes_per_person: u64,
    /// 0 disables the background prune
    pub prune_interval_secs: u64,
    pub seed_catalog: bool,
    pub rate_limit_burst: u32,
    pub rate_limit_rate: u32,
    pub log_format: LogFormat,
    /// Also write JSON logs to a daily file here
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl DaemonConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::from_sources(file.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    fn from_sources(file: Option<&str>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("storage", "sqlite")?
            .set_default("rpc_host", DEFAULT_RPC_HOST)?
            .set_default("rpc_port", i64::from(DEFAULT_RPC_PORT))?
            .set_default("duplicate_join", "return_existing")?
            .set_default("max_cas_retries", i64::from(DEFAULT_MAX_CAS_RETRIES))?
            .set_default("minutes_per_person", DEFAULT_MINUTES_PER_PERSON as i64)?
            .set_default("prune_interval_secs", DEFAULT_PRUNE_INTERVAL_SECS)?
            .set_default("seed_catalog", true)?
            .set_default("rate_limit_burst", i64::from(DEFAULT_RATE_LIMIT_BURST))?
            .set_default("rate_limit_rate", i64::from(DEFAULT_RATE_LIMIT_RATE))?
            .set_default("log_format", "pretty")?;

        if let Some(path) = file {
            let path = shellexpand::tilde(path).into_owned();
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let mut config: DaemonConfig = builder
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.db_path = shellexpand::tilde(&config.db_path).into_owned();
        config.log_dir = config
            .log_dir
            .map(|dir| shellexpand::tilde(&dir).into_owned());

        Ok(config)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            duplicate_join: self.duplicate_join,
            max_cas_retries: self.max_cas_retries,
            minutes_per_person: self.minutes_per_person,
        }
    }
}
