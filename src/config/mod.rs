//! Configuration management.
//!
//! Layered defaults + optional config files + environment variables
//! (CHARTFORGE__ prefix) via .env.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub stats: StatsConfig,
    pub persistence: PersistenceConfig,
    pub rewards: RewardsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Multiplexed ticker stream endpoint
    pub ws_url: String,
    /// Fixed reconnect delay in milliseconds
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    /// Batch 24h stats endpoint
    pub url: String,
    /// Refresh interval in seconds
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory for the JSON state files
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardsConfig {
    /// Reward coins credited per completed trade
    pub coins_per_trade: f64,
}

impl AppConfig {
    /// Load configuration from defaults, files and environment.
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("feed.ws_url", crate::feed::DEFAULT_WS_URL)?
            .set_default("feed.reconnect_delay_ms", 2000)?
            .set_default("stats.url", crate::feed::DEFAULT_STATS_URL)?
            .set_default("stats.refresh_secs", 300)?
            .set_default("persistence.data_dir", "./data")?
            .set_default("rewards.coins_per_trade", 2.0)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("CHARTFORGE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Short config digest for startup logging.
    pub fn digest(&self) -> String {
        format!(
            "ws={} stats_refresh={}s data_dir={} reward={:.1}",
            self.feed.ws_url, self.stats.refresh_secs, self.persistence.data_dir,
            self.rewards.coins_per_trade
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                ws_url: crate::feed::DEFAULT_WS_URL.to_string(),
                reconnect_delay_ms: 2000,
            },
            stats: StatsConfig {
                url: crate::feed::DEFAULT_STATS_URL.to_string(),
                refresh_secs: 300,
            },
            persistence: PersistenceConfig {
                data_dir: "./data".to_string(),
            },
            rewards: RewardsConfig {
                coins_per_trade: 2.0,
            },
        }
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_constants() {
        let config = AppConfig::default();
        assert_eq!(config.feed.reconnect_delay_ms, 2000);
        assert_eq!(config.stats.refresh_secs, 300);
        assert_eq!(config.rewards.coins_per_trade, 2.0);
    }
}
