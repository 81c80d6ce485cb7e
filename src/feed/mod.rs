//! Live market data: streaming ticker feed and periodic 24h stats.

mod client;
mod stats;

pub use client::{PriceFeedClient, DEFAULT_RECONNECT_DELAY, DEFAULT_WS_URL};
pub use stats::{StatsEnricher, DEFAULT_REFRESH_INTERVAL, DEFAULT_STATS_URL};
