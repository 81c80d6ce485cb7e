//! Persisted watchlist of favorited symbols.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::persistence::{self, StateStore, KEY_WATCHLIST};

pub struct WatchlistStore {
    symbols: RwLock<HashSet<String>>,
    store: Arc<dyn StateStore>,
}

impl WatchlistStore {
    pub fn load(store: Arc<dyn StateStore>) -> Self {
        let symbols: HashSet<String> =
            persistence::load(store.as_ref(), KEY_WATCHLIST).unwrap_or_default();
        Self {
            symbols: RwLock::new(symbols),
            store,
        }
    }

    /// Add the symbol if absent, remove it if present. Symbols are not
    /// validated against the registry.
    pub fn toggle(&self, symbol: &str) {
        {
            let mut symbols = self.symbols.write().unwrap();
            if !symbols.remove(symbol) {
                symbols.insert(symbol.to_string());
            }
        }
        self.save();
    }

    pub fn is_favorited(&self, symbol: &str) -> bool {
        self.symbols.read().unwrap().contains(symbol)
    }

    pub fn symbols(&self) -> HashSet<String> {
        self.symbols.read().unwrap().clone()
    }

    fn save(&self) {
        let symbols = self.symbols.read().unwrap().clone();
        persistence::save(self.store.as_ref(), KEY_WATCHLIST, &symbols);
    }
}
