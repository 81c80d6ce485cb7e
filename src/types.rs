//! Core types shared across the feed, registry and order engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tracked symbols and their display names. The feed subscribes to exactly
/// this set; ticks for anything else are dropped at the edge.
pub const TRACKED_SYMBOLS: &[(&str, &str)] = &[
    ("BTCUSDT", "Bitcoin"),
    ("ETHUSDT", "Ethereum"),
    ("SOLUSDT", "Solana"),
    ("ADAUSDT", "Cardano"),
    ("XRPUSDT", "XRP"),
    ("DOGEUSDT", "Dogecoin"),
    ("BNBUSDT", "Binance Coin"),
    ("AVAXUSDT", "Avalanche"),
    ("MATICUSDT", "Polygon"),
    ("DOTUSDT", "Polkadot"),
];

/// Display name for a tracked symbol, `None` for anything unknown.
pub fn display_name(symbol: &str) -> Option<&'static str> {
    TRACKED_SYMBOLS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, name)| *name)
}

/// Symbols in their canonical listing order.
pub fn tracked_symbols() -> Vec<&'static str> {
    TRACKED_SYMBOLS.iter().map(|(s, _)| *s).collect()
}

/// One normalized asset snapshot. Price and timestamp come from the live
/// feed; the 24h fields are merged in later by the stats enricher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub change_24h: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
}

impl Asset {
    pub fn from_tick(symbol: &str, name: &str, price: f64, ts: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            last_updated: ts,
            change_24h: None,
            high_24h: None,
            low_24h: None,
            volume_24h: None,
        }
    }
}

/// 24-hour aggregate statistics for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayStats {
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub quote_volume: f64,
}

/// Trade side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
        }
    }
}

/// Order kind. Market orders fill immediately at the current feed price;
/// limit and stop orders rest in the open set until triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Market,
    Limit,
    Stop,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Market => write!(f, "market"),
            OrderKind::Limit => write!(f, "limit"),
            OrderKind::Stop => write!(f, "stop"),
        }
    }
}

/// One trade order. In the committed history `price` is the execution
/// price; on a resting order it records the price seen at placement and is
/// overwritten with the feed price when the order fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub amount: f64,
    pub price: f64,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
    pub kind: OrderKind,
    #[serde(default)]
    pub limit_price: Option<f64>,
    #[serde(default)]
    pub stop_price: Option<f64>,
}

impl Order {
    /// Signed holdings delta this order contributes once filled.
    pub fn quantity_delta(&self) -> f64 {
        match self.direction {
            Direction::Buy => self.amount,
            Direction::Sell => -self.amount,
        }
    }
}

/// Reward-coin transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinDirection {
    Earn,
    Spend,
}

/// One entry in the reward-coin ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub id: Uuid,
    pub amount: f64,
    pub direction: CoinDirection,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl CoinTransaction {
    /// Signed contribution to the ledger balance.
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            CoinDirection::Earn => self.amount,
            CoinDirection::Spend => -self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_lookup() {
        assert_eq!(display_name("BTCUSDT"), Some("Bitcoin"));
        assert_eq!(display_name("DOTUSDT"), Some("Polkadot"));
        assert_eq!(display_name("SHIBUSDT"), None);
    }

    #[test]
    fn tracked_symbols_order_is_stable() {
        let symbols = tracked_symbols();
        assert_eq!(symbols.len(), 10);
        assert_eq!(symbols[0], "BTCUSDT");
        assert_eq!(symbols[9], "DOTUSDT");
    }

    #[test]
    fn quantity_delta_signs() {
        let mut order = Order {
            id: Uuid::new_v4(),
            symbol: "BTCUSDT".into(),
            name: "Bitcoin".into(),
            amount: 2.5,
            price: 50_000.0,
            direction: Direction::Buy,
            created_at: Utc::now(),
            kind: OrderKind::Market,
            limit_price: None,
            stop_price: None,
        };
        assert_eq!(order.quantity_delta(), 2.5);
        order.direction = Direction::Sell;
        assert_eq!(order.quantity_delta(), -2.5);
    }
}
