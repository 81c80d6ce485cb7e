//! Asset registry - single source of truth for live prices.
//!
//! The feed task writes normalized ticks in, the stats enricher merges 24h
//! aggregates, and every consumer (views, order engine, home-screen widget)
//! reads snapshots out. Writes replace the whole per-symbol record under one
//! lock so a reader never observes a half-updated asset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::persistence::{self, StateStore, KEY_WIDGET_HISTORY, KEY_WIDGET_PRICES};
use crate::types::{Asset, DayStats};

/// Rolling price window per symbol, enough for a sparkline.
pub const HISTORY_LIMIT: usize = 20;

/// Per-symbol entry of the cross-process widget snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetQuote {
    pub price: f64,
    pub last_updated: DateTime<Utc>,
}

pub struct AssetRegistry {
    assets: RwLock<HashMap<String, Asset>>,
    history: RwLock<HashMap<String, VecDeque<f64>>>,
    store: Arc<dyn StateStore>,
}

impl AssetRegistry {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            assets: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Replace or insert the asset for its symbol and append the price to
    /// the rolling history, evicting from the front past the window limit.
    pub fn upsert(&self, asset: Asset) {
        {
            let mut history = self.history.write().unwrap();
            let window = history.entry(asset.symbol.clone()).or_default();
            window.push_back(asset.price);
            while window.len() > HISTORY_LIMIT {
                window.pop_front();
            }
        }
        {
            let mut assets = self.assets.write().unwrap();
            assets.insert(asset.symbol.clone(), asset);
        }
        self.save_widget_snapshot();
    }

    /// Merge 24h stats onto an already-known symbol. Stats never create
    /// assets; a symbol with no tick yet is skipped.
    pub fn apply_day_stats(&self, symbol: &str, stats: DayStats) {
        let updated = {
            let mut assets = self.assets.write().unwrap();
            match assets.get_mut(symbol) {
                Some(asset) => {
                    asset.change_24h = Some(stats.change_pct);
                    asset.high_24h = Some(stats.high);
                    asset.low_24h = Some(stats.low);
                    asset.volume_24h = Some(stats.quote_volume);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.save_widget_snapshot();
        }
    }

    /// Assets in the caller-specified order, omitting symbols never yet
    /// observed. Consumers see a growing list as first ticks arrive.
    pub fn snapshot<S: AsRef<str>>(&self, ordered_symbols: &[S]) -> Vec<Asset> {
        let assets = self.assets.read().unwrap();
        ordered_symbols
            .iter()
            .filter_map(|s| assets.get(s.as_ref()).cloned())
            .collect()
    }

    /// Latest price per known symbol; the evaluate() input.
    pub fn price_map(&self) -> HashMap<String, f64> {
        self.assets
            .read()
            .unwrap()
            .iter()
            .map(|(symbol, asset)| (symbol.clone(), asset.price))
            .collect()
    }

    /// Copy of the rolling price window for one symbol.
    pub fn history(&self, symbol: &str) -> Vec<f64> {
        self.history
            .read()
            .unwrap()
            .get(symbol)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, symbol: &str) -> Option<Asset> {
        self.assets.read().unwrap().get(symbol).cloned()
    }

    /// Write the widget snapshot (latest quotes + sparkline history) through
    /// the shared store so the widget process can render without the feed.
    fn save_widget_snapshot(&self) {
        let quotes: HashMap<String, WidgetQuote> = self
            .assets
            .read()
            .unwrap()
            .iter()
            .map(|(symbol, asset)| {
                (
                    symbol.clone(),
                    WidgetQuote {
                        price: asset.price,
                        last_updated: asset.last_updated,
                    },
                )
            })
            .collect();
        let history: HashMap<String, Vec<f64>> = self
            .history
            .read()
            .unwrap()
            .iter()
            .map(|(symbol, w)| (symbol.clone(), w.iter().copied().collect()))
            .collect();
        persistence::save(self.store.as_ref(), KEY_WIDGET_PRICES, &quotes);
        persistence::save(self.store.as_ref(), KEY_WIDGET_HISTORY, &history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn make_registry() -> AssetRegistry {
        AssetRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn tick(symbol: &str, price: f64) -> Asset {
        Asset::from_tick(symbol, "Test", price, Utc::now())
    }

    #[test]
    fn upsert_replaces_by_symbol() {
        let registry = make_registry();
        registry.upsert(tick("BTCUSDT", 50_000.0));
        registry.upsert(tick("BTCUSDT", 51_000.0));

        let snapshot = registry.snapshot(&["BTCUSDT"]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].price, 51_000.0);
    }

    #[test]
    fn snapshot_omits_unseen_symbols_and_keeps_order() {
        let registry = make_registry();
        registry.upsert(tick("ETHUSDT", 3_000.0));
        registry.upsert(tick("BTCUSDT", 50_000.0));

        let snapshot = registry.snapshot(&["BTCUSDT", "SOLUSDT", "ETHUSDT"]);
        let symbols: Vec<&str> = snapshot.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn history_keeps_last_twenty_in_arrival_order() {
        let registry = make_registry();
        for i in 1..=25 {
            registry.upsert(tick("BTCUSDT", i as f64));
        }
        let history = registry.history("BTCUSDT");
        assert_eq!(history.len(), HISTORY_LIMIT);
        let expected: Vec<f64> = (6..=25).map(|i| i as f64).collect();
        assert_eq!(history, expected);
    }

    #[test]
    fn day_stats_merge_only_onto_known_assets() {
        let registry = make_registry();
        let stats = DayStats {
            change_pct: 2.5,
            high: 52_000.0,
            low: 49_000.0,
            quote_volume: 1.0e9,
        };

        registry.apply_day_stats("BTCUSDT", stats);
        assert!(registry.get("BTCUSDT").is_none());

        registry.upsert(tick("BTCUSDT", 50_000.0));
        registry.apply_day_stats("BTCUSDT", stats);
        let asset = registry.get("BTCUSDT").unwrap();
        assert_eq!(asset.change_24h, Some(2.5));
        assert_eq!(asset.high_24h, Some(52_000.0));

        // A later tick replaces the record; stats fields start over until
        // the next enrichment pass.
        registry.upsert(tick("BTCUSDT", 50_500.0));
        assert_eq!(registry.get("BTCUSDT").unwrap().change_24h, None);
    }

    #[test]
    fn price_map_covers_known_symbols_only() {
        let registry = make_registry();
        registry.upsert(tick("BTCUSDT", 50_000.0));
        let prices = registry.price_map();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["BTCUSDT"], 50_000.0);
    }

    #[test]
    fn widget_snapshot_written_after_mutation() {
        let store = Arc::new(MemoryStore::new());
        let registry = AssetRegistry::new(store.clone());
        registry.upsert(tick("BTCUSDT", 50_000.0));

        let quotes: HashMap<String, WidgetQuote> =
            persistence::load(store.as_ref(), KEY_WIDGET_PRICES).unwrap();
        assert_eq!(quotes["BTCUSDT"].price, 50_000.0);
        let history: HashMap<String, Vec<f64>> =
            persistence::load(store.as_ref(), KEY_WIDGET_HISTORY).unwrap();
        assert_eq!(history["BTCUSDT"], vec![50_000.0]);
    }
}
