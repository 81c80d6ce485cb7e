//! Order book engine - paper-trading order lifecycle.
//!
//! Holds the committed order history and the resting (open) limit/stop set.
//! Every price update re-evaluates the resting set; matched orders move to
//! history through the same commit path as market orders, so each fill
//! updates holdings and credits the flat trade reward. No operation here
//! returns an error to the caller: invalid input degrades to "state
//! unchanged, keep running".

mod rewards;

pub use rewards::RewardLedger;

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::persistence::{self, StateStore, KEY_OPEN_ORDERS, KEY_ORDERS};
use crate::registry::AssetRegistry;
use crate::types::{Direction, Order, OrderKind};

/// Flat reward credited per completed trade.
pub const DEFAULT_TRADE_REWARD: f64 = 2.0;
const TRADE_REWARD_REASON: &str = "Trade completed";

/// Request for an immediate fill at the current feed price.
#[derive(Debug, Clone)]
pub struct MarketOrderRequest {
    pub symbol: String,
    pub amount: f64,
    pub direction: Direction,
}

/// Request for a resting limit or stop order.
#[derive(Debug, Clone)]
pub struct RestingOrderRequest {
    pub symbol: String,
    pub amount: f64,
    pub direction: Direction,
    pub kind: OrderKind,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
}

pub struct OrderBookEngine {
    /// Committed history, oldest first. Holdings are derived from this.
    orders: RwLock<Vec<Order>>,
    /// Resting limit/stop orders awaiting a trigger.
    open_orders: RwLock<Vec<Order>>,
    /// symbol → signed net quantity, recomputed after every history change.
    holdings: RwLock<HashMap<String, f64>>,
    rewards: RewardLedger,
    registry: Arc<AssetRegistry>,
    store: Arc<dyn StateStore>,
    trade_reward: f64,
}

impl OrderBookEngine {
    /// Load persisted orders and the reward ledger, then derive holdings by
    /// replaying the history.
    pub fn load(registry: Arc<AssetRegistry>, store: Arc<dyn StateStore>) -> Self {
        let orders: Vec<Order> =
            persistence::load(store.as_ref(), KEY_ORDERS).unwrap_or_default();
        let open_orders: Vec<Order> =
            persistence::load(store.as_ref(), KEY_OPEN_ORDERS).unwrap_or_default();
        let engine = Self {
            orders: RwLock::new(orders),
            open_orders: RwLock::new(open_orders),
            holdings: RwLock::new(HashMap::new()),
            rewards: RewardLedger::load(store.clone()),
            registry,
            store,
            trade_reward: DEFAULT_TRADE_REWARD,
        };
        engine.recalculate_holdings();
        engine
    }

    pub fn with_trade_reward(mut self, coins: f64) -> Self {
        self.trade_reward = coins;
        self
    }

    /// Fill immediately at the asset's current price. No-op unless the
    /// amount is positive and the asset has been observed by the feed.
    pub fn place_market_order(&self, req: MarketOrderRequest) -> Option<Order> {
        if req.amount <= 0.0 {
            debug!(symbol = %req.symbol, amount = req.amount, "Rejected non-positive market order");
            return None;
        }
        let asset = self.registry.get(&req.symbol)?;
        let order = Order {
            id: Uuid::new_v4(),
            symbol: asset.symbol,
            name: asset.name,
            amount: req.amount,
            price: asset.price,
            direction: req.direction,
            created_at: Utc::now(),
            kind: OrderKind::Market,
            limit_price: None,
            stop_price: None,
        };
        self.commit(order.clone());
        Some(order)
    }

    /// Enqueue a limit or stop order into the resting set. Holdings and
    /// rewards are untouched until it fills. Rejected when the amount is
    /// non-positive, the kind is not limit/stop, or the trigger price for
    /// the kind is missing.
    pub fn place_resting_order(&self, req: RestingOrderRequest) -> Option<Order> {
        if req.amount <= 0.0 {
            debug!(symbol = %req.symbol, amount = req.amount, "Rejected non-positive resting order");
            return None;
        }
        match req.kind {
            OrderKind::Limit if req.limit_price.is_some() => {}
            OrderKind::Stop if req.stop_price.is_some() => {}
            _ => {
                debug!(symbol = %req.symbol, kind = %req.kind, "Rejected resting order without trigger price");
                return None;
            }
        }
        let (name, placement_price) = match self.registry.get(&req.symbol) {
            Some(asset) => (asset.name, asset.price),
            None => (req.symbol.clone(), 0.0),
        };
        let order = Order {
            id: Uuid::new_v4(),
            symbol: req.symbol,
            name,
            amount: req.amount,
            price: placement_price,
            direction: req.direction,
            created_at: Utc::now(),
            kind: req.kind,
            limit_price: req.limit_price,
            stop_price: req.stop_price,
        };
        {
            let mut open = self.open_orders.write().unwrap();
            open.push(order.clone());
        }
        info!(symbol = %order.symbol, kind = %order.kind, direction = %order.direction, "Resting order placed");
        self.save_open_orders();
        Some(order)
    }

    /// Remove a resting order by id. No-op if absent.
    pub fn cancel_resting_order(&self, id: Uuid) {
        let removed = {
            let mut open = self.open_orders.write().unwrap();
            let before = open.len();
            open.retain(|o| o.id != id);
            before != open.len()
        };
        if removed {
            info!(%id, "Resting order cancelled");
            self.save_open_orders();
        }
    }

    /// Evaluate every resting order against the latest prices and fill the
    /// matches at the current feed price (not at the limit/stop price).
    ///
    /// A symbol absent from the map compares against 0.0, faithfully
    /// mirroring the original app: a stop-sell for a never-seen symbol
    /// triggers spuriously since 0 ≤ stop. Kept pending product
    /// clarification; see the zero-default test below.
    pub fn evaluate(&self, latest_prices: &HashMap<String, f64>) {
        let triggered: Vec<Order> = {
            let open = self.open_orders.read().unwrap();
            open.iter()
                .filter(|order| {
                    let price = latest_prices.get(&order.symbol).copied().unwrap_or(0.0);
                    Self::is_triggered(order, price)
                })
                .cloned()
                .collect()
        };
        if triggered.is_empty() {
            return;
        }
        for mut order in triggered {
            let fill_price = latest_prices.get(&order.symbol).copied().unwrap_or(0.0);
            let id = order.id;
            order.price = fill_price;
            order.created_at = Utc::now();
            info!(symbol = %order.symbol, kind = %order.kind, fill_price, "✅ Resting order filled");
            self.commit(order);
            {
                let mut open = self.open_orders.write().unwrap();
                open.retain(|o| o.id != id);
            }
        }
        self.save_open_orders();
    }

    fn is_triggered(order: &Order, price: f64) -> bool {
        match order.kind {
            OrderKind::Limit => match (order.limit_price, order.direction) {
                (Some(limit), Direction::Buy) => price <= limit,
                (Some(limit), Direction::Sell) => price >= limit,
                (None, _) => false,
            },
            OrderKind::Stop => match (order.stop_price, order.direction) {
                (Some(stop), Direction::Buy) => price >= stop,
                (Some(stop), Direction::Sell) => price <= stop,
                (None, _) => false,
            },
            OrderKind::Market => false,
        }
    }

    /// Shared commit path for market fills and triggered resting orders:
    /// append to history, replay holdings, credit the flat reward.
    fn commit(&self, order: Order) {
        info!(
            symbol = %order.symbol,
            direction = %order.direction,
            amount = order.amount,
            price = order.price,
            "Trade committed"
        );
        {
            let mut orders = self.orders.write().unwrap();
            orders.push(order);
        }
        self.save_orders();
        self.recalculate_holdings();
        self.rewards.earn(self.trade_reward, TRADE_REWARD_REASON);
    }

    fn recalculate_holdings(&self) {
        let mut recomputed: HashMap<String, f64> = HashMap::new();
        {
            let orders = self.orders.read().unwrap();
            for order in orders.iter() {
                *recomputed.entry(order.symbol.clone()).or_default() += order.quantity_delta();
            }
        }
        *self.holdings.write().unwrap() = recomputed;
    }

    /// Committed history, oldest first.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.read().unwrap().clone()
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.open_orders.read().unwrap().clone()
    }

    pub fn holdings(&self) -> HashMap<String, f64> {
        self.holdings.read().unwrap().clone()
    }

    pub fn holding(&self, symbol: &str) -> f64 {
        self.holdings
            .read()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn rewards(&self) -> &RewardLedger {
        &self.rewards
    }

    fn save_orders(&self) {
        let orders = self.orders.read().unwrap().clone();
        persistence::save(self.store.as_ref(), KEY_ORDERS, &orders);
    }

    fn save_open_orders(&self) {
        let open = self.open_orders.read().unwrap().clone();
        persistence::save(self.store.as_ref(), KEY_OPEN_ORDERS, &open);
    }
}
