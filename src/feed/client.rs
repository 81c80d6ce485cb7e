//! Binance WebSocket client for real-time ticker data.
//!
//! One multiplexed stream carries a `@ticker` channel per tracked symbol.
//! Each tick is normalized into the asset registry and immediately
//! re-evaluates the resting order set, so fills happen on the same price
//! update that triggered them. Message handling is strictly sequential
//! within the stream task, preserving per-symbol ordering.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::engine::OrderBookEngine;
use crate::registry::AssetRegistry;
use crate::types::{display_name, Asset, TRACKED_SYMBOLS};

pub const DEFAULT_WS_URL: &str = "wss://stream.binance.com:9443/stream";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Combined-stream envelope: `{"stream":"btcusdt@ticker","data":{...}}`.
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[allow(dead_code)]
    stream: String,
    data: TickerEvent,
}

#[derive(Debug, Deserialize)]
struct TickerEvent {
    /// Symbol, e.g. "BTCUSDT".
    s: String,
    /// Last trade price, string-encoded decimal.
    c: String,
    /// Event time in epoch milliseconds.
    #[serde(rename = "E")]
    event_time: i64,
}

pub struct PriceFeedClient {
    ws_url: String,
    reconnect_delay: Duration,
    registry: Arc<AssetRegistry>,
    engine: Arc<OrderBookEngine>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PriceFeedClient {
    pub fn new(registry: Arc<AssetRegistry>, engine: Arc<OrderBookEngine>) -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            registry,
            engine,
            task: Mutex::new(None),
        }
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Start streaming. Always tears down any existing connection first, so
    /// two live sockets can never coexist.
    pub fn connect(&self) {
        self.disconnect();
        let url = Self::stream_url(&self.ws_url);
        let delay = self.reconnect_delay;
        let registry = self.registry.clone();
        let engine = self.engine.clone();
        let handle = tokio::spawn(async move {
            Self::run(url, delay, registry, engine).await;
        });
        *self.task.lock().unwrap() = Some(handle);
    }

    /// Stop streaming. Idempotent.
    pub fn disconnect(&self) {
        if let Some(handle) = self.task.lock().unwrap().take() {
            handle.abort();
            info!("Price feed disconnected");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn stream_url(base: &str) -> String {
        let streams: Vec<String> = TRACKED_SYMBOLS
            .iter()
            .map(|(symbol, _)| format!("{}@ticker", symbol.to_lowercase()))
            .collect();
        format!("{}?streams={}", base, streams.join("/"))
    }

    /// Connect-read-reconnect loop. Any transport failure or close sleeps
    /// the fixed delay and reconnects; no backoff growth, no retry ceiling.
    async fn run(
        url: String,
        delay: Duration,
        registry: Arc<AssetRegistry>,
        engine: Arc<OrderBookEngine>,
    ) {
        loop {
            info!(url = %url.split('?').next().unwrap_or(url.as_str()), "Connecting to ticker stream...");
            match connect_async(&url).await {
                Ok((ws_stream, _)) => {
                    info!("✅ Ticker stream connected");
                    let (mut write, mut read) = ws_stream.split();
                    loop {
                        match read.next().await {
                            Some(Ok(Message::Text(text))) => {
                                Self::apply_message(&text, &registry, &engine);
                            }
                            Some(Ok(Message::Ping(data))) => {
                                let _ = write.send(Message::Pong(data)).await;
                            }
                            Some(Ok(Message::Close(_))) => {
                                warn!("Ticker stream closed by server");
                                break;
                            }
                            Some(Err(e)) => {
                                error!(error = %e, "Ticker stream error");
                                break;
                            }
                            None => {
                                warn!("Ticker stream ended");
                                break;
                            }
                            _ => {}
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Ticker stream connection failed");
                }
            }
            info!(delay_secs = delay.as_secs(), "🔄 Reconnecting...");
            tokio::time::sleep(delay).await;
        }
    }

    /// Decode one inbound message and, on success, upsert the normalized
    /// asset and re-evaluate resting orders. Malformed payloads, unparseable
    /// prices, unknown symbols and bad timestamps are all silently dropped.
    /// Returns whether a tick was applied.
    pub fn apply_message(
        text: &str,
        registry: &AssetRegistry,
        engine: &OrderBookEngine,
    ) -> bool {
        let envelope: StreamEnvelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "Dropping malformed ticker message");
                return false;
            }
        };
        let tick = envelope.data;
        let Some(name) = display_name(&tick.s) else {
            debug!(symbol = %tick.s, "Dropping tick for untracked symbol");
            return false;
        };
        let Ok(price) = tick.c.parse::<f64>() else {
            debug!(symbol = %tick.s, raw = %tick.c, "Dropping tick with unparseable price");
            return false;
        };
        let Some(ts) = chrono::DateTime::from_timestamp_millis(tick.event_time) else {
            debug!(symbol = %tick.s, event_time = tick.event_time, "Dropping tick with invalid timestamp");
            return false;
        };

        registry.upsert(Asset::from_tick(&tick.s, name, price, ts));
        engine.evaluate(&registry.price_map());
        true
    }
}

impl Drop for PriceFeedClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
