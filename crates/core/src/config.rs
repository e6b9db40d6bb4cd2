//! Application configuration handling.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ledger::{DEFAULT_DATA_DIR, LEDGER_FILE};

/// Directory under the user config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "innkeep";

const DEFAULT_PAYMENT_DELAY_MS: i64 = 1000;

/// User-tunable application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the ledger backing file.
    pub data_root: PathBuf,
    /// Simulated payment settlement delay in milliseconds.
    pub payment_delay_ms: u64,
}

impl AppConfig {
    /// Load configuration from defaults, the optional config file, and
    /// `INNKEEP_`-prefixed environment overrides.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default(
                "data_root",
                default_data_root().to_string_lossy().to_string(),
            )?
            .set_default("payment_delay_ms", DEFAULT_PAYMENT_DELAY_MS)?
            .add_source(File::from(config_path()).required(false))
            .add_source(Environment::with_prefix("INNKEEP"))
            .build()
            .context("failed to build configuration")?;
        settings
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Path of the ledger backing file under `data_root`.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_root.join(LEDGER_FILE)
    }

    /// Settlement delay as a `Duration`.
    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.payment_delay_ms)
    }
}

/// Location of the user config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DATA_DIR)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let contents = format!(
        "# innkeep configuration\n\
         # data_root = \"{}\"\n\
         # payment_delay_ms = {}\n",
        default_data_root().display(),
        DEFAULT_PAYMENT_DELAY_MS
    );
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}
