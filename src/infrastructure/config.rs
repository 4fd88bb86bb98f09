//! Configuration management

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL webhook URLs are constructed from
    pub webhook_base_url: String,
    /// Team identifier appended to constructed webhook URLs
    pub team_id: String,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_base_url: "https://webhook.example.com/ci".to_string(),
            team_id: String::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads overrides from `HOOKLINE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("HOOKLINE_WEBHOOK_BASE_URL") {
            config.webhook_base_url = base;
        }
        if let Ok(team) = std::env::var("HOOKLINE_TEAM_ID") {
            config.team_id = team;
        }
        if let Ok(level) = std::env::var("HOOKLINE_LOG") {
            config.log_level = level;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(config.team_id.is_empty());
    }
}
