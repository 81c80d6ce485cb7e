//! 24-hour statistics enricher.
//!
//! One batch GET covers every symbol; parsed stats merge onto assets the
//! feed has already observed. The refresh timer is self-perpetuating: it
//! reschedules unconditionally whether the previous attempt succeeded or
//! not, and a failed fetch leaves existing stats untouched.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::AssetRegistry;
use crate::types::DayStats;

pub const DEFAULT_STATS_URL: &str = "https://api.binance.com/api/v3/ticker/24hr";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// One row of the batch 24h ticker response. All numeric fields are
/// transmitted as strings.
#[derive(Debug, Deserialize)]
struct StatsEntry {
    symbol: String,
    #[serde(rename = "priceChangePercent")]
    price_change_percent: String,
    #[serde(rename = "highPrice")]
    high_price: String,
    #[serde(rename = "lowPrice")]
    low_price: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

impl StatsEntry {
    /// All four fields must parse or the entry is skipped.
    fn day_stats(&self) -> Option<DayStats> {
        Some(DayStats {
            change_pct: self.price_change_percent.parse().ok()?,
            high: self.high_price.parse().ok()?,
            low: self.low_price.parse().ok()?,
            quote_volume: self.quote_volume.parse().ok()?,
        })
    }
}

pub struct StatsEnricher {
    url: String,
    refresh_interval: Duration,
    http: reqwest::Client,
    registry: Arc<AssetRegistry>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatsEnricher {
    pub fn new(registry: Arc<AssetRegistry>) -> Self {
        Self {
            url: DEFAULT_STATS_URL.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            http: reqwest::Client::new(),
            registry,
            task: Mutex::new(None),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Start the periodic refresh. The first fetch fires immediately, then
    /// every interval regardless of the previous outcome. Restarting tears
    /// down the previous timer first.
    pub fn start(&self) {
        self.stop();
        let url = self.url.clone();
        let http = self.http.clone();
        let registry = self.registry.clone();
        let refresh = self.refresh_interval;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match Self::fetch_and_merge(&http, &url, &registry).await {
                    Ok(merged) => debug!(merged, "24h stats refreshed"),
                    Err(e) => warn!(error = %e, "24h stats fetch failed, keeping previous stats"),
                }
            }
        });
        *self.task.lock().unwrap() = Some(handle);
    }

    /// Stop the refresh timer. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
            info!("Stats enricher stopped");
        }
    }

    /// One batch fetch + merge pass. Returns how many symbols were updated.
    async fn fetch_and_merge(
        http: &reqwest::Client,
        url: &str,
        registry: &AssetRegistry,
    ) -> Result<usize> {
        let rows: Vec<serde_json::Value> = http
            .get(url)
            .send()
            .await
            .context("24h stats request failed")?
            .json()
            .await
            .context("24h stats response was not a JSON array")?;
        Ok(Self::merge_rows(&rows, registry))
    }

    /// Merge raw response rows into the registry. Rows that fail to decode
    /// or carry unparseable numbers are skipped individually.
    fn merge_rows(rows: &[serde_json::Value], registry: &AssetRegistry) -> usize {
        let mut merged = 0;
        for row in rows {
            let Ok(entry) = serde_json::from_value::<StatsEntry>(row.clone()) else {
                continue;
            };
            let Some(stats) = entry.day_stats() else {
                continue;
            };
            if registry.get(&entry.symbol).is_some() {
                registry.apply_day_stats(&entry.symbol, stats);
                merged += 1;
            }
        }
        merged
    }
}

impl Drop for StatsEnricher {
    fn drop(&mut self) {
        self.stop();
    }
}
