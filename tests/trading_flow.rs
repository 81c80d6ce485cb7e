//! End-to-end tests: feed messages through the registry into the order
//! engine, exercising the whole tick → upsert → evaluate → fill path.

#[cfg(test)]
mod tests {
    use chartforge_core::config::AppConfig;
    use chartforge_core::engine::{MarketOrderRequest, RestingOrderRequest, DEFAULT_TRADE_REWARD};
    use chartforge_core::feed::PriceFeedClient;
    use chartforge_core::persistence::{self, MemoryStore, StateStore};
    use chartforge_core::registry::WidgetQuote;
    use chartforge_core::types::{Direction, OrderKind};
    use chartforge_core::ChartForge;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn app_with_store() -> (ChartForge, Arc<dyn StateStore>) {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let app = ChartForge::init_with_store(&AppConfig::default(), store.clone()).unwrap();
        (app, store)
    }

    fn ticker_json(symbol: &str, price: &str, event_time: i64) -> String {
        format!(
            r#"{{"stream":"{}@ticker","data":{{"s":"{}","c":"{}","E":{}}}}}"#,
            symbol.to_lowercase(),
            symbol,
            price,
            event_time
        )
    }

    fn push_tick(app: &ChartForge, symbol: &str, price: &str, event_time: i64) -> bool {
        PriceFeedClient::apply_message(
            &ticker_json(symbol, price, event_time),
            &app.registry,
            &app.engine,
        )
    }

    #[test]
    fn tick_stream_builds_growing_deduplicated_snapshot() {
        let (app, _store) = app_with_store();

        assert!(push_tick(&app, "BTCUSDT", "50000.0", 1_700_000_000_000));
        assert!(push_tick(&app, "ETHUSDT", "3000.0", 1_700_000_001_000));
        assert!(push_tick(&app, "BTCUSDT", "50100.0", 1_700_000_002_000));

        let snapshot = app.registry.snapshot(&["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
        assert_eq!(snapshot.len(), 2);
        let symbols: Vec<&str> = snapshot.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(snapshot[0].price, 50_100.0);
    }

    #[test]
    fn resting_limit_buy_fills_from_live_tick_at_feed_price() {
        let (app, _store) = app_with_store();
        push_tick(&app, "BTCUSDT", "50000.0", 1_700_000_000_000);

        let order = app
            .engine
            .place_resting_order(RestingOrderRequest {
                symbol: "BTCUSDT".into(),
                amount: 1.0,
                direction: Direction::Buy,
                kind: OrderKind::Limit,
                limit_price: Some(49_500.0),
                stop_price: None,
            })
            .unwrap();
        assert_eq!(order.price, 50_000.0);

        // Above the limit: stays open.
        push_tick(&app, "BTCUSDT", "49800.0", 1_700_000_001_000);
        assert_eq!(app.engine.open_orders().len(), 1);

        // At/below the limit: fills at the feed price, not the limit.
        push_tick(&app, "BTCUSDT", "49200.0", 1_700_000_002_000);
        assert!(app.engine.open_orders().is_empty());
        let history = app.engine.orders();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, 49_200.0);
        assert_eq!(app.engine.holding("BTCUSDT"), 1.0);
        assert_eq!(app.engine.rewards().balance(), DEFAULT_TRADE_REWARD);
    }

    #[test]
    fn holdings_and_rewards_across_mixed_trading_session() {
        let (app, _store) = app_with_store();
        push_tick(&app, "ETHUSDT", "3000.0", 1_700_000_000_000);

        app.engine
            .place_market_order(MarketOrderRequest {
                symbol: "ETHUSDT".into(),
                amount: 4.0,
                direction: Direction::Buy,
            })
            .unwrap();
        app.engine
            .place_resting_order(RestingOrderRequest {
                symbol: "ETHUSDT".into(),
                amount: 1.5,
                direction: Direction::Sell,
                kind: OrderKind::Stop,
                limit_price: None,
                stop_price: Some(2_900.0),
            })
            .unwrap();

        push_tick(&app, "ETHUSDT", "2850.0", 1_700_000_001_000);

        assert_eq!(app.engine.holding("ETHUSDT"), 2.5);
        assert_eq!(app.engine.rewards().balance(), 2.0 * DEFAULT_TRADE_REWARD);

        // Holdings equal the signed replay of the full history.
        let replayed: f64 = app
            .engine
            .orders()
            .iter()
            .map(|o| o.quantity_delta())
            .sum();
        assert_eq!(app.engine.holding("ETHUSDT"), replayed);
    }

    #[test]
    fn cancelled_order_survives_later_trigger_ticks() {
        let (app, _store) = app_with_store();
        push_tick(&app, "BTCUSDT", "50000.0", 1_700_000_000_000);

        let order = app
            .engine
            .place_resting_order(RestingOrderRequest {
                symbol: "BTCUSDT".into(),
                amount: 1.0,
                direction: Direction::Buy,
                kind: OrderKind::Limit,
                limit_price: Some(49_000.0),
                stop_price: None,
            })
            .unwrap();
        app.engine.cancel_resting_order(order.id);

        push_tick(&app, "BTCUSDT", "48000.0", 1_700_000_001_000);
        assert!(app.engine.orders().is_empty());
        assert_eq!(app.engine.holding("BTCUSDT"), 0.0);
    }

    #[test]
    fn widget_snapshot_follows_the_feed() {
        let (app, store) = app_with_store();
        push_tick(&app, "BTCUSDT", "50000.0", 1_700_000_000_000);
        push_tick(&app, "BTCUSDT", "50100.0", 1_700_000_001_000);

        let quotes: HashMap<String, WidgetQuote> =
            persistence::load(store.as_ref(), persistence::KEY_WIDGET_PRICES).unwrap();
        assert_eq!(quotes["BTCUSDT"].price, 50_100.0);

        let history: HashMap<String, Vec<f64>> =
            persistence::load(store.as_ref(), persistence::KEY_WIDGET_HISTORY).unwrap();
        assert_eq!(history["BTCUSDT"], vec![50_000.0, 50_100.0]);
    }

    #[test]
    fn session_state_reloads_into_fresh_app() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        {
            let app =
                ChartForge::init_with_store(&AppConfig::default(), store.clone()).unwrap();
            push_tick(&app, "BTCUSDT", "50000.0", 1_700_000_000_000);
            app.engine
                .place_market_order(MarketOrderRequest {
                    symbol: "BTCUSDT".into(),
                    amount: 2.0,
                    direction: Direction::Buy,
                })
                .unwrap();
            app.watchlist.toggle("BTCUSDT");
        }

        let app = ChartForge::init_with_store(&AppConfig::default(), store).unwrap();
        assert_eq!(app.engine.orders().len(), 1);
        assert_eq!(app.engine.holding("BTCUSDT"), 2.0);
        assert_eq!(app.engine.rewards().balance(), DEFAULT_TRADE_REWARD);
        assert!(app.watchlist.is_favorited("BTCUSDT"));
    }
}
