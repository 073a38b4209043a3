use crate::error::ConfigError;
use crate::history::DEFAULT_MAX_RECORDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Host-level settings. Missing keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorConfig {
    pub autoplay_interval_ms: u64,
    pub history_max_records: usize,
    pub history_list_limit: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: 1500,
            history_max_records: DEFAULT_MAX_RECORDS,
            history_list_limit: 20,
        }
    }
}

impl SimulatorConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = SimulatorConfig::from_json(r#"{ "autoplayIntervalMs": 250 }"#).unwrap();
        assert_eq!(config.autoplay_interval(), Duration::from_millis(250));
        assert_eq!(config.history_max_records, 50);
        assert_eq!(config.history_list_limit, 20);
    }
}
