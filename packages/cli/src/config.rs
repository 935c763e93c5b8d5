use genui_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "genui.config.json";

/// genui configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory `run` writes outputs to; outputs are only printed when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    /// Element poller period for `run --live`
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_poll_interval() -> u64 {
    50
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn get_output_dir(&self, cwd: &str) -> Option<PathBuf> {
        self.output_dir
            .as_ref()
            .map(|dir| PathBuf::from(cwd).join(dir))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: None,
            poll_interval_ms: default_poll_interval(),
            engine: EngineConfig::default(),
        }
    }
}
