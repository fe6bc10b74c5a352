//! Layered startup configuration: compiled defaults → optional JSON config file
//! under `config-root` → environment variable overrides (§6).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SyncError;
use crate::utils::config_root;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "SyncConfig::default_sync_interval_seconds")]
    pub sync_interval_seconds: u64,
    #[serde(default)]
    pub always_full_sync: bool,
    #[serde(default = "SyncConfig::default_true")]
    pub drift_detection: bool,
    #[serde(default = "SyncConfig::default_drift_check_interval_syncs")]
    pub drift_check_interval_syncs: u32,
    #[serde(default)]
    pub drift_check_interval_minutes: u32,
    #[serde(default = "SyncConfig::default_drift_sample_rate")]
    pub drift_sample_rate: u32,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub static_budget_file: Option<PathBuf>,
    #[serde(skip)]
    pub config_root: PathBuf,
    #[serde(default = "SyncConfig::default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "SyncConfig::default_log_level")]
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_seconds: Self::default_sync_interval_seconds(),
            always_full_sync: false,
            drift_detection: true,
            drift_check_interval_syncs: Self::default_drift_check_interval_syncs(),
            drift_check_interval_minutes: 0,
            drift_sample_rate: Self::default_drift_sample_rate(),
            read_only: false,
            static_budget_file: None,
            config_root: config_root(),
            api_base_url: Self::default_api_base_url(),
            api_token: None,
            log_level: Self::default_log_level(),
        }
    }
}

impl SyncConfig {
    fn default_sync_interval_seconds() -> u64 {
        600
    }
    fn default_drift_check_interval_syncs() -> u32 {
        1
    }
    fn default_drift_sample_rate() -> u32 {
        1
    }
    fn default_api_base_url() -> String {
        "https://api.youneedabudget.com/v1".into()
    }
    fn default_log_level() -> String {
        "info".into()
    }
    fn default_true() -> bool {
        true
    }

    /// Whether writes should be blocked: explicit read-only mode, or a static budget
    /// file forcing a non-writing provider (§4.8).
    pub fn is_effectively_read_only(&self) -> bool {
        self.read_only || self.static_budget_file.is_some()
    }
}

/// Loads [`SyncConfig`] in three layers: compiled defaults, then an optional
/// `<config-root>/config.json`, then environment variables, each layer overriding
/// the previous one.
pub struct SyncConfigLoader;

impl SyncConfigLoader {
    pub fn load() -> Result<SyncConfig, SyncError> {
        let root = Self::resolve_config_root();
        Self::load_from(&root)
    }

    pub fn load_from(root: &Path) -> Result<SyncConfig, SyncError> {
        let mut config = Self::load_file(root)?;
        config.config_root = root.to_path_buf();
        Self::apply_env(&mut config);
        Ok(config)
    }

    fn resolve_config_root() -> PathBuf {
        std::env::var("YNAB_CONFIG_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_root())
    }

    fn load_file(root: &Path) -> Result<SyncConfig, SyncError> {
        let path = root.join("config.json");
        if !path.exists() {
            return Ok(SyncConfig::default());
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn apply_env(config: &mut SyncConfig) {
        if let Some(v) = env_u64("YNAB_SYNC_INTERVAL_SECONDS") {
            config.sync_interval_seconds = v;
        }
        if let Some(v) = env_bool("YNAB_ALWAYS_FULL_SYNC") {
            config.always_full_sync = v;
        }
        if let Some(v) = env_bool("YNAB_DRIFT_DETECTION") {
            config.drift_detection = v;
        }
        if let Some(v) = env_u32("YNAB_DRIFT_CHECK_INTERVAL_SYNCS") {
            config.drift_check_interval_syncs = v;
        }
        if let Some(v) = env_u32("YNAB_DRIFT_CHECK_INTERVAL_MINUTES") {
            config.drift_check_interval_minutes = v;
        }
        if let Some(v) = env_u32("YNAB_DRIFT_SAMPLE_RATE") {
            config.drift_sample_rate = v;
        }
        if let Some(v) = env_bool("YNAB_READ_ONLY") {
            config.read_only = v;
        }
        if let Ok(v) = std::env::var("YNAB_STATIC_BUDGET_FILE") {
            config.static_budget_file = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("YNAB_API_BASE_URL") {
            config.api_base_url = v;
        }
        if let Ok(v) = std::env::var("YNAB_API_TOKEN") {
            config.api_token = Some(v);
        }
        if let Ok(v) = std::env::var("YNAB_LOG_LEVEL") {
            config.log_level = v;
        } else if let Ok(v) = std::env::var("RUST_LOG") {
            config.log_level = v;
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_file_present() {
        let temp = TempDir::new().unwrap();
        let config = SyncConfigLoader::load_from(temp.path()).unwrap();
        assert_eq!(config.sync_interval_seconds, 600);
        assert!(!config.read_only);
        assert!(config.drift_detection);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("config.json"),
            r#"{"sync_interval_seconds": 120, "read_only": true}"#,
        )
        .unwrap();
        let config = SyncConfigLoader::load_from(temp.path()).unwrap();
        assert_eq!(config.sync_interval_seconds, 120);
        assert!(config.read_only);
    }

    #[test]
    fn static_budget_file_implies_read_only() {
        let mut config = SyncConfig::default();
        config.static_budget_file = Some(PathBuf::from("/tmp/budget.json"));
        assert!(config.is_effectively_read_only());
    }
}
