//! Reward-coin ledger.
//!
//! Gamified balance credited on every filled trade. Invariant: the balance
//! always equals the signed sum of the transaction list; a spend that would
//! drive the balance negative is rejected outright.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::persistence::{self, StateStore, KEY_COIN_LEDGER};
use crate::types::{CoinDirection, CoinTransaction};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    balance: f64,
    /// Newest first.
    transactions: Vec<CoinTransaction>,
}

pub struct RewardLedger {
    state: RwLock<LedgerState>,
    store: Arc<dyn StateStore>,
}

impl RewardLedger {
    /// Load the persisted ledger, starting fresh at zero when absent.
    pub fn load(store: Arc<dyn StateStore>) -> Self {
        let state: LedgerState =
            persistence::load(store.as_ref(), KEY_COIN_LEDGER).unwrap_or_default();
        Self {
            state: RwLock::new(state),
            store,
        }
    }

    /// Credit coins. Always succeeds for a positive amount.
    pub fn earn(&self, amount: f64, reason: &str) {
        if amount <= 0.0 {
            return;
        }
        {
            let mut state = self.state.write().unwrap();
            state.balance += amount;
            state.transactions.insert(
                0,
                CoinTransaction {
                    id: Uuid::new_v4(),
                    amount,
                    direction: CoinDirection::Earn,
                    reason: reason.to_string(),
                    timestamp: Utc::now(),
                },
            );
        }
        info!(amount, reason, "🪙 Coins earned");
        self.save();
    }

    /// Debit coins. Rejected (returns false, state unchanged) when the
    /// balance does not cover the amount.
    pub fn spend(&self, amount: f64, reason: &str) -> bool {
        if amount <= 0.0 {
            return false;
        }
        {
            let mut state = self.state.write().unwrap();
            if state.balance < amount {
                debug!(amount, balance = state.balance, "Coin spend rejected");
                return false;
            }
            state.balance -= amount;
            state.transactions.insert(
                0,
                CoinTransaction {
                    id: Uuid::new_v4(),
                    amount,
                    direction: CoinDirection::Spend,
                    reason: reason.to_string(),
                    timestamp: Utc::now(),
                },
            );
        }
        info!(amount, reason, "🪙 Coins spent");
        self.save();
        true
    }

    pub fn balance(&self) -> f64 {
        self.state.read().unwrap().balance
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> Vec<CoinTransaction> {
        self.state.read().unwrap().transactions.clone()
    }

    fn save(&self) {
        let state = self.state.read().unwrap().clone();
        persistence::save(self.store.as_ref(), KEY_COIN_LEDGER, &state);
    }
}
