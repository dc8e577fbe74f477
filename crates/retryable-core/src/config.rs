use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Numeric retry settings (the `[retry]` section in config.toml).
///
/// Triggers are typed and stay in code; only timing and budget come from the file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub interval_millis: u64,
    /// Multiplier applied to the delay after every retry.
    pub backoff_factor: f64,
    /// Lower bound of the additive jitter window, in milliseconds.
    pub jitter_min_millis: i64,
    /// Upper bound of the additive jitter window, in milliseconds.
    pub jitter_max_millis: i64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval_millis: 1000,
            backoff_factor: 1.0,
            jitter_min_millis: 0,
            jitter_max_millis: 0,
        }
    }
}

/// Configuration loaded from `~/.config/retryable/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryableConfig {
    /// Optional retry section; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional tracing filter directive (e.g. "info,retryable_core=debug"). `RUST_LOG` wins.
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl RetryableConfig {
    /// The retry section, or defaults when the file has none.
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("retryable")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RetryableConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RetryableConfig {
            retry: Some(RetryConfig::default()),
            log_filter: None,
        };
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<RetryableConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: RetryableConfig = toml::from_str(&data)?;
    Ok(cfg)
}
