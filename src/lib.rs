//! ChartForge Core
//!
//! Streaming price ingestion and paper-trading engine: a persistent
//! Binance ticker feed normalizes ticks into a shared asset registry,
//! and a resting-order engine fills limit/stop orders against every
//! price update. Hosts embed this library and render its snapshots.

pub mod app;
pub mod config;
pub mod engine;
pub mod feed;
pub mod logging;
pub mod persistence;
pub mod registry;
pub mod types;
pub mod watchlist;

pub use app::ChartForge;
pub use config::AppConfig;
