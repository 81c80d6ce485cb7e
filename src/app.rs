//! Composition root.
//!
//! Wires store → registry → engine → watchlist → feed → enricher with
//! explicit ownership. Collaborators are constructed once and passed by
//! Arc; there is no ambient global state and no runtime lookup of
//! collaborators.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::engine::OrderBookEngine;
use crate::feed::{PriceFeedClient, StatsEnricher};
use crate::persistence::{JsonFileStore, StateStore};
use crate::registry::AssetRegistry;
use crate::watchlist::WatchlistStore;

pub struct ChartForge {
    pub registry: Arc<AssetRegistry>,
    pub engine: Arc<OrderBookEngine>,
    pub watchlist: Arc<WatchlistStore>,
    pub feed: PriceFeedClient,
    pub stats: StatsEnricher,
}

impl ChartForge {
    /// Build the full service graph from configuration, loading persisted
    /// state. Nothing is running yet; call [`start`](Self::start).
    pub fn init(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn StateStore> = Arc::new(
            JsonFileStore::new(&config.persistence.data_dir)
                .context("Failed to open state directory")?,
        );
        Self::init_with_store(config, store)
    }

    /// Same wiring against a caller-supplied store (tests, ephemeral
    /// sessions).
    pub fn init_with_store(config: &AppConfig, store: Arc<dyn StateStore>) -> Result<Self> {
        let registry = Arc::new(AssetRegistry::new(store.clone()));
        let engine = Arc::new(
            OrderBookEngine::load(registry.clone(), store.clone())
                .with_trade_reward(config.rewards.coins_per_trade),
        );
        let watchlist = Arc::new(WatchlistStore::load(store));
        let feed = PriceFeedClient::new(registry.clone(), engine.clone())
            .with_ws_url(&config.feed.ws_url)
            .with_reconnect_delay(Duration::from_millis(config.feed.reconnect_delay_ms));
        let stats = StatsEnricher::new(registry.clone())
            .with_url(&config.stats.url)
            .with_refresh_interval(Duration::from_secs(config.stats.refresh_secs));

        info!(config = %config.digest(), "ChartForge core initialized");
        Ok(Self {
            registry,
            engine,
            watchlist,
            feed,
            stats,
        })
    }

    /// Connect the price feed and start the stats refresh.
    pub fn start(&self) {
        self.feed.connect();
        self.stats.start();
    }

    /// Tear down background tasks. Idempotent.
    pub fn shutdown(&self) {
        self.feed.disconnect();
        self.stats.stop();
    }
}
