//! Multi-symbol engine coordinator
//!
//! Owns the symbol → order book table, validates submissions against the
//! configured risk limits, and serves market-data queries. One
//! reader-writer lock guards the table and every book within it: writes
//! (submit, cancel, symbol management) are serialized, reads run
//! concurrently. Trade and order observers are dispatched in two phases:
//! matching and counter updates commit under the exclusive lock, then
//! observers run after release, so a slow or panicking observer cannot
//! hold up or poison the book.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, info};

use types::depth::MarketDepth;
use types::errors::{EngineError, RiskLimit, ValidationError};
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind};
use types::trade::Trade;

use crate::book::OrderBook;
use crate::clock;
use crate::config::EngineConfig;

/// Callback invoked for every executed trade, in registration order.
pub type TradeObserver = Arc<dyn Fn(&Trade) + Send + Sync>;

/// Callback invoked with the submitted order's post-match state.
pub type OrderObserver = Arc<dyn Fn(&Order) + Send + Sync>;

/// Engine statistics snapshot
///
/// Rates are derived from uptime at capture; both are zero immediately
/// after start or reset.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatistics {
    pub orders_processed: u64,
    pub trades_executed: u64,
    pub symbols_active: usize,
    pub uptime: Duration,
    pub orders_per_second: f64,
    pub trades_per_second: f64,
}

/// State guarded by the engine lock
struct EngineInner {
    books: HashMap<String, OrderBook>,
    config: EngineConfig,
    start_time: Instant,
    trade_observers: Vec<TradeObserver>,
    order_observers: Vec<OrderObserver>,
}

impl EngineInner {
    /// Shape validation beyond what the types enforce structurally: under
    /// strict validation, limit prices must also sit on the configured
    /// tick grid.
    fn validate(&self, order: &Order) -> Result<(), EngineError> {
        order.validate()?;
        if self.config.strict_validation {
            if let Some(price) = order.price {
                if !price.aligned_to(self.config.tick_size) {
                    return Err(ValidationError::PriceNotTickAligned {
                        price: price.to_string(),
                        tick: self.config.tick_size.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Enforce the configured risk limits against one submission.
    fn check_risk_limits(&self, order: &Order) -> Result<(), EngineError> {
        if let Some(price) = order.price {
            if price > self.config.max_order_price {
                return Err(EngineError::RiskLimitExceeded {
                    limit: RiskLimit::MaxOrderPrice,
                });
            }
        }
        if order.quantity > self.config.max_order_quantity {
            return Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxOrderQuantity,
            });
        }
        if let Some(book) = self.books.get(order.symbol.as_str()) {
            if book.order_count() >= self.config.max_orders_per_symbol {
                return Err(EngineError::RiskLimitExceeded {
                    limit: RiskLimit::MaxOrdersPerSymbol,
                });
            }
        }
        if self.books.len() > self.config.max_symbols {
            return Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxSymbols,
            });
        }
        Ok(())
    }
}

/// Multi-symbol matching engine
///
/// All methods take `&self`; the engine serializes conflicting operations
/// internally and is safe to share across threads behind an `Arc`.
pub struct MatchingEngine {
    inner: RwLock<EngineInner>,
    orders_processed: AtomicU64,
    trades_executed: AtomicU64,
    running: AtomicBool,
}

impl MatchingEngine {
    /// Create a new engine with the given configuration, initially stopped
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: RwLock::new(EngineInner {
                books: HashMap::new(),
                config,
                start_time: Instant::now(),
                trade_observers: Vec::new(),
                order_observers: Vec::new(),
            }),
            orders_processed: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    // A poisoned lock means a writer panicked mid-mutation; the book state
    // can no longer be trusted, so die rather than trade on it.
    fn read_inner(&self) -> RwLockReadGuard<'_, EngineInner> {
        self.inner.read().expect("engine lock poisoned")
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, EngineInner> {
        self.inner.write().expect("engine lock poisoned")
    }

    /// Transition to running and reset the uptime origin
    pub fn start(&self) {
        let mut inner = self.write_inner();
        self.running.store(true, Ordering::SeqCst);
        inner.start_time = Instant::now();
        if inner.config.enable_logging {
            info!("matching engine started");
        }
    }

    /// Transition to stopped; subsequent submissions fail
    pub fn stop(&self) {
        let inner = self.write_inner();
        self.running.store(false, Ordering::SeqCst);
        if inner.config.enable_logging {
            info!("matching engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Submit an order for matching
    ///
    /// Validates, enforces risk limits, matches against the symbol's book,
    /// and returns the executed trades, earliest first. The engine never
    /// creates books on submission; unknown symbols are rejected.
    pub fn submit(&self, order: Order) -> Result<Vec<Trade>, EngineError> {
        if !self.is_running() {
            return Err(EngineError::EngineStopped);
        }

        let (trades, update, trade_observers, order_observers) = {
            let mut inner = self.write_inner();
            inner.validate(&order)?;
            inner.check_risk_limits(&order)?;

            let book = inner.books.get_mut(order.symbol.as_str()).ok_or_else(|| {
                EngineError::UnknownSymbol {
                    symbol: order.symbol.as_str().to_string(),
                }
            })?;

            let mut update = order.clone();
            let trades = book.add(order);

            // Counters commit inside the critical section so statistics()
            // reads are coherent with the book state.
            self.orders_processed.fetch_add(1, Ordering::Relaxed);
            self.trades_executed
                .fetch_add(trades.len() as u64, Ordering::Relaxed);

            apply_fills(&mut update, &trades);
            if inner.config.enable_logging {
                debug!(
                    order_id = update.id.as_u64(),
                    symbol = update.symbol.as_str(),
                    trades = trades.len(),
                    remaining = update.remaining.as_u64(),
                    "order processed"
                );
            }

            (
                trades,
                update,
                inner.trade_observers.clone(),
                inner.order_observers.clone(),
            )
        };

        // Phase two: observers run outside the lock and may query the
        // engine freely, but see only committed state.
        for trade in &trades {
            for observer in &trade_observers {
                observer(trade);
            }
        }
        for observer in &order_observers {
            observer(&update);
        }

        Ok(trades)
    }

    /// Cancel a resting order
    ///
    /// Returns false when the symbol or the order is unknown. Fills
    /// already executed stand.
    pub fn cancel(&self, order_id: OrderId, symbol: &str) -> bool {
        let mut inner = self.write_inner();
        let Some(book) = inner.books.get_mut(symbol) else {
            return false;
        };
        let cancelled = book.cancel(order_id);
        if cancelled && inner.config.enable_logging {
            debug!(order_id = order_id.as_u64(), symbol, "order cancelled");
        }
        cancelled
    }

    /// Replace a resting order's price and quantity (cancel and resubmit)
    ///
    /// The rebuilt order keeps its id and side but gets a fresh timestamp
    /// and re-queues at the tail of its level: time priority is lost by
    /// design. The resubmission may itself cross and trade; those trades
    /// are counted and broadcast like any others.
    pub fn modify(
        &self,
        order_id: OrderId,
        symbol: &str,
        new_price: Price,
        new_quantity: Quantity,
    ) -> bool {
        let Ok(sym) = Symbol::try_new(symbol) else {
            return false;
        };

        let (trades, update, trade_observers, order_observers) = {
            let mut inner = self.write_inner();
            let Some(side) = inner
                .books
                .get(symbol)
                .and_then(|book| book.resting_side(order_id))
            else {
                return false;
            };

            let rebuilt = Order::limit(
                order_id,
                sym,
                side,
                new_price,
                new_quantity,
                clock::now_nanos(),
            );
            // Reject bad replacements before touching the original order.
            // The per-symbol count limit is not applied here: a modify
            // nets zero resting orders.
            if inner.validate(&rebuilt).is_err()
                || new_price > inner.config.max_order_price
                || new_quantity > inner.config.max_order_quantity
            {
                return false;
            }

            let Some(book) = inner.books.get_mut(symbol) else {
                return false;
            };
            book.cancel(order_id);

            let mut update = rebuilt.clone();
            let trades = book.add(rebuilt);
            self.trades_executed
                .fetch_add(trades.len() as u64, Ordering::Relaxed);

            apply_fills(&mut update, &trades);
            if inner.config.enable_logging {
                debug!(
                    order_id = order_id.as_u64(),
                    symbol,
                    trades = trades.len(),
                    "order modified"
                );
            }

            (
                trades,
                update,
                inner.trade_observers.clone(),
                inner.order_observers.clone(),
            )
        };

        for trade in &trades {
            for observer in &trade_observers {
                observer(trade);
            }
        }
        for observer in &order_observers {
            observer(&update);
        }

        true
    }

    /// Create an empty order book for a new symbol
    pub fn add_symbol(&self, symbol: &str) -> Result<(), EngineError> {
        let sym = Symbol::try_new(symbol)?;
        let mut inner = self.write_inner();
        if inner.books.contains_key(sym.as_str()) {
            return Err(EngineError::SymbolExists {
                symbol: symbol.to_string(),
            });
        }
        if inner.books.len() >= inner.config.max_symbols {
            return Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxSymbols,
            });
        }
        inner
            .books
            .insert(sym.as_str().to_string(), OrderBook::new());
        if inner.config.enable_logging {
            info!(symbol, "symbol added");
        }
        Ok(())
    }

    /// Remove a symbol's order book, refusing while orders rest on it
    pub fn remove_symbol(&self, symbol: &str) -> Result<(), EngineError> {
        let mut inner = self.write_inner();
        let Some(book) = inner.books.get(symbol) else {
            return Err(EngineError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        };
        if book.order_count() > 0 {
            return Err(EngineError::SymbolNotEmpty {
                symbol: symbol.to_string(),
            });
        }
        inner.books.remove(symbol);
        if inner.config.enable_logging {
            info!(symbol, "symbol removed");
        }
        Ok(())
    }

    /// Currently listed symbols, sorted for deterministic output
    pub fn active_symbols(&self) -> Vec<String> {
        let inner = self.read_inner();
        let mut symbols: Vec<String> = inner.books.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Best bid for a symbol; `None` for unknown symbols or empty sides
    pub fn best_bid(&self, symbol: &str) -> Option<Price> {
        self.read_inner().books.get(symbol).and_then(|b| b.best_bid())
    }

    /// Best ask for a symbol; `None` for unknown symbols or empty sides
    pub fn best_ask(&self, symbol: &str) -> Option<Price> {
        self.read_inner().books.get(symbol).and_then(|b| b.best_ask())
    }

    /// Bid-ask spread; `None` unless both sides are populated
    pub fn spread(&self, symbol: &str) -> Option<Decimal> {
        self.read_inner().books.get(symbol).and_then(|b| b.spread())
    }

    /// Depth snapshot with up to `levels` aggregated levels per side
    pub fn market_depth(&self, symbol: &str, levels: usize) -> Option<MarketDepth> {
        let inner = self.read_inner();
        let book = inner.books.get(symbol)?;
        let sym = Symbol::try_new(symbol).ok()?;
        Some(MarketDepth {
            symbol: sym,
            bids: book.bid_levels(levels),
            asks: book.ask_levels(levels),
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            spread: book.spread(),
            total_orders: book.order_count(),
            timestamp: clock::now_nanos(),
        })
    }

    /// Register a callback for executed trades
    pub fn register_trade_observer(&self, observer: impl Fn(&Trade) + Send + Sync + 'static) {
        self.write_inner().trade_observers.push(Arc::new(observer));
    }

    /// Register a callback for order updates
    pub fn register_order_observer(&self, observer: impl Fn(&Order) + Send + Sync + 'static) {
        self.write_inner().order_observers.push(Arc::new(observer));
    }

    /// Drop every registered observer
    pub fn unregister_all_observers(&self) {
        let mut inner = self.write_inner();
        inner.trade_observers.clear();
        inner.order_observers.clear();
    }

    /// Statistics snapshot; rates are zero while uptime is zero
    pub fn statistics(&self) -> EngineStatistics {
        let inner = self.read_inner();
        let uptime = inner.start_time.elapsed();
        let orders_processed = self.orders_processed.load(Ordering::Relaxed);
        let trades_executed = self.trades_executed.load(Ordering::Relaxed);

        let seconds = uptime.as_secs_f64();
        let (orders_per_second, trades_per_second) = if seconds > 0.0 {
            (
                orders_processed as f64 / seconds,
                trades_executed as f64 / seconds,
            )
        } else {
            (0.0, 0.0)
        };

        EngineStatistics {
            orders_processed,
            trades_executed,
            symbols_active: inner.books.len(),
            uptime,
            orders_per_second,
            trades_per_second,
        }
    }

    /// One-line status report for monitoring
    pub fn engine_status(&self) -> String {
        let stats = self.statistics();
        format!(
            "Engine running: {}\nSymbols: {}, Orders: {}, Trades: {}\nUptime (ms): {}",
            if self.is_running() { "YES" } else { "NO" },
            stats.symbols_active,
            stats.orders_processed,
            stats.trades_executed,
            stats.uptime.as_millis()
        )
    }

    /// Zero the counters and restart the uptime clock
    pub fn reset_statistics(&self) {
        let mut inner = self.write_inner();
        self.orders_processed.store(0, Ordering::Relaxed);
        self.trades_executed.store(0, Ordering::Relaxed);
        inner.start_time = Instant::now();
    }

    /// Replace the engine configuration
    pub fn update_config(&self, config: EngineConfig) {
        self.write_inner().config = config;
    }

    /// Current configuration snapshot
    pub fn config(&self) -> EngineConfig {
        self.read_inner().config.clone()
    }

    /// Formatted top-of-book view for debugging; `None` for unknown symbols
    pub fn order_book_state(&self, symbol: &str, max_levels: usize) -> Option<String> {
        let inner = self.read_inner();
        let book = inner.books.get(symbol)?;

        let mut out = String::new();
        out.push_str("=== ORDER BOOK ===\n");
        out.push_str("ASKS (lowest first):\n");
        for (price, qty) in book.ask_levels(max_levels) {
            out.push_str(&format!("  ASK {} [{} qty]\n", price, qty));
        }
        match book.spread() {
            Some(spread) => out.push_str(&format!("SPREAD: {}\n", spread)),
            None => out.push_str("SPREAD: N/A\n"),
        }
        out.push_str("BIDS (highest first):\n");
        for (price, qty) in book.bid_levels(max_levels) {
            out.push_str(&format!("  BID {} [{} qty]\n", price, qty));
        }
        out.push_str(&format!("Total Orders: {}\n", book.order_count()));
        Some(out)
    }

    /// Destroy every order book, symbols included (testing/recovery aid)
    pub fn clear_all_order_books(&self) {
        self.write_inner().books.clear();
    }

    /// Drop books with no resting orders
    pub fn cleanup_empty_order_books(&self) {
        self.write_inner().books.retain(|_, book| book.order_count() > 0);
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Mirror the fills from `trades` onto the submitted order's snapshot so
/// order observers see the post-match residual.
fn apply_fills(update: &mut Order, trades: &[Trade]) {
    let filled: u64 = trades.iter().map(|t| t.quantity.as_u64()).sum();
    if filled > 0 {
        update.fill(Quantity::new(filled));
    }
    // A market order's unfilled remainder is discarded with the order
    if update.kind == OrderKind::Market {
        update.remaining = Quantity::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use types::order::Side;

    fn started_engine(symbols: &[&str]) -> MatchingEngine {
        let engine = MatchingEngine::new(EngineConfig {
            enable_logging: false,
            ..EngineConfig::default()
        });
        engine.start();
        for sym in symbols {
            engine.add_symbol(sym).unwrap();
        }
        engine
    }

    fn limit(id: u64, symbol: &str, side: Side, price: &str, qty: u64) -> Order {
        Order::limit(
            OrderId::new(id),
            Symbol::new(symbol),
            side,
            Price::from_str(price).unwrap(),
            Quantity::new(qty),
            clock::now_nanos(),
        )
    }

    #[test]
    fn test_submit_requires_running_engine() {
        let engine = MatchingEngine::default();
        let result = engine.submit(limit(1, "AAPL", Side::Buy, "100.00", 10));
        assert_eq!(result, Err(EngineError::EngineStopped));

        engine.start();
        assert!(engine.is_running());
        engine.stop();
        assert!(!engine.is_running());
        let result = engine.submit(limit(1, "AAPL", Side::Buy, "100.00", 10));
        assert_eq!(result, Err(EngineError::EngineStopped));
    }

    #[test]
    fn test_submit_rejects_unknown_symbol() {
        let engine = started_engine(&[]);
        let result = engine.submit(limit(1, "AAPL", Side::Buy, "100.00", 10));
        assert_eq!(
            result,
            Err(EngineError::UnknownSymbol {
                symbol: "AAPL".to_string()
            })
        );
        // No auto-created book
        assert!(engine.active_symbols().is_empty());
    }

    #[test]
    fn test_submit_rejects_invalid_order() {
        let engine = started_engine(&["AAPL"]);
        let result = engine.submit(limit(0, "AAPL", Side::Buy, "100.00", 10));
        assert!(matches!(result, Err(EngineError::InvalidOrder(_))));
    }

    #[test]
    fn test_strict_validation_enforces_tick_alignment() {
        let engine = started_engine(&["AAPL"]);
        let result = engine.submit(limit(1, "AAPL", Side::Buy, "100.005", 10));
        assert!(matches!(
            result,
            Err(EngineError::InvalidOrder(
                ValidationError::PriceNotTickAligned { .. }
            ))
        ));

        let mut config = engine.config();
        config.strict_validation = false;
        engine.update_config(config);
        assert!(engine
            .submit(limit(1, "AAPL", Side::Buy, "100.005", 10))
            .is_ok());
    }

    #[test]
    fn test_risk_limit_quantity() {
        let engine = MatchingEngine::new(EngineConfig {
            max_order_quantity: Quantity::new(100),
            enable_logging: false,
            ..EngineConfig::default()
        });
        engine.start();
        engine.add_symbol("W").unwrap();

        let before = engine.statistics().orders_processed;
        let result = engine.submit(limit(40, "W", Side::Buy, "5", 101));
        assert_eq!(
            result,
            Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxOrderQuantity
            })
        );
        assert_eq!(engine.statistics().orders_processed, before);
        assert_eq!(engine.market_depth("W", 5).unwrap().total_orders, 0);
    }

    #[test]
    fn test_risk_limit_price() {
        let engine = MatchingEngine::new(EngineConfig {
            max_order_price: Price::from_u64(100),
            enable_logging: false,
            ..EngineConfig::default()
        });
        engine.start();
        engine.add_symbol("W").unwrap();

        let result = engine.submit(limit(1, "W", Side::Buy, "100.01", 1));
        assert_eq!(
            result,
            Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxOrderPrice
            })
        );
    }

    #[test]
    fn test_risk_limit_orders_per_symbol() {
        let engine = MatchingEngine::new(EngineConfig {
            max_orders_per_symbol: 2,
            enable_logging: false,
            ..EngineConfig::default()
        });
        engine.start();
        engine.add_symbol("X").unwrap();

        engine.submit(limit(1, "X", Side::Buy, "10", 1)).unwrap();
        engine.submit(limit(2, "X", Side::Buy, "11", 1)).unwrap();
        let result = engine.submit(limit(3, "X", Side::Buy, "12", 1));
        assert_eq!(
            result,
            Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxOrdersPerSymbol
            })
        );
    }

    #[test]
    fn test_add_symbol_errors() {
        let engine = started_engine(&["AAPL"]);
        assert_eq!(
            engine.add_symbol("AAPL"),
            Err(EngineError::SymbolExists {
                symbol: "AAPL".to_string()
            })
        );
        assert!(matches!(
            engine.add_symbol("BAD SYM"),
            Err(EngineError::InvalidOrder(_))
        ));
        assert_eq!(engine.active_symbols(), vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_add_symbol_respects_max_symbols() {
        let engine = MatchingEngine::new(EngineConfig {
            max_symbols: 1,
            enable_logging: false,
            ..EngineConfig::default()
        });
        engine.start();
        engine.add_symbol("A").unwrap();
        assert_eq!(
            engine.add_symbol("B"),
            Err(EngineError::RiskLimitExceeded {
                limit: RiskLimit::MaxSymbols
            })
        );
    }

    #[test]
    fn test_remove_symbol_refuses_non_empty() {
        let engine = started_engine(&["AAPL"]);
        engine
            .submit(limit(1, "AAPL", Side::Buy, "100.00", 10))
            .unwrap();

        assert_eq!(
            engine.remove_symbol("AAPL"),
            Err(EngineError::SymbolNotEmpty {
                symbol: "AAPL".to_string()
            })
        );

        assert!(engine.cancel(OrderId::new(1), "AAPL"));
        assert!(engine.remove_symbol("AAPL").is_ok());
        assert_eq!(
            engine.remove_symbol("AAPL"),
            Err(EngineError::UnknownSymbol {
                symbol: "AAPL".to_string()
            })
        );
    }

    #[test]
    fn test_remove_then_add_yields_empty_book() {
        let engine = started_engine(&["Z"]);
        engine.submit(limit(1, "Z", Side::Buy, "10", 5)).unwrap();
        engine.cancel(OrderId::new(1), "Z");
        engine.remove_symbol("Z").unwrap();
        engine.add_symbol("Z").unwrap();
        assert_eq!(engine.market_depth("Z", 5).unwrap().total_orders, 0);
    }

    #[test]
    fn test_counters_track_submissions_and_trades() {
        let engine = started_engine(&["AAPL"]);
        engine
            .submit(limit(1, "AAPL", Side::Sell, "100.00", 10))
            .unwrap();
        let trades = engine
            .submit(limit(2, "AAPL", Side::Buy, "100.00", 10))
            .unwrap();
        assert_eq!(trades.len(), 1);

        let stats = engine.statistics();
        assert_eq!(stats.orders_processed, 2);
        assert_eq!(stats.trades_executed, 1);
        assert_eq!(stats.symbols_active, 1);
    }

    #[test]
    fn test_reset_statistics() {
        let engine = started_engine(&["AAPL"]);
        engine
            .submit(limit(1, "AAPL", Side::Buy, "100.00", 10))
            .unwrap();
        engine.reset_statistics();

        let stats = engine.statistics();
        assert_eq!(stats.orders_processed, 0);
        assert_eq!(stats.trades_executed, 0);
        assert_eq!(stats.orders_per_second, 0.0);
    }

    #[test]
    fn test_observers_receive_trades_then_order_update() {
        let engine = started_engine(&["AAPL"]);
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let trade_log = Arc::clone(&log);
        engine.register_trade_observer(move |trade: &Trade| {
            trade_log
                .lock()
                .unwrap()
                .push(format!("trade:{}", trade.trade_id));
        });
        let order_log = Arc::clone(&log);
        engine.register_order_observer(move |order: &Order| {
            order_log
                .lock()
                .unwrap()
                .push(format!("order:{}:{}", order.id, order.remaining));
        });

        engine
            .submit(limit(1, "AAPL", Side::Sell, "100.00", 10))
            .unwrap();
        engine
            .submit(limit(2, "AAPL", Side::Buy, "100.00", 4))
            .unwrap();

        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "order:1:10".to_string(), // rested untouched
                "trade:1".to_string(),
                "order:2:0".to_string(), // aggressor fully filled
            ]
        );
    }

    #[test]
    fn test_observers_may_query_engine() {
        // Two-phase dispatch: reads from inside an observer must not
        // deadlock against the submission lock.
        let engine = Arc::new(started_engine(&["AAPL"]));
        let seen = Arc::new(Mutex::new(None));

        let engine_ref = Arc::clone(&engine);
        let seen_ref = Arc::clone(&seen);
        engine.register_order_observer(move |_order: &Order| {
            *seen_ref.lock().unwrap() = Some(engine_ref.best_bid("AAPL"));
        });

        engine
            .submit(limit(1, "AAPL", Side::Buy, "99.00", 10))
            .unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            Some(Some(Price::from_u64(99)))
        );
    }

    #[test]
    fn test_unregister_all_observers() {
        let engine = started_engine(&["AAPL"]);
        let count = Arc::new(AtomicU64::new(0));

        let count_ref = Arc::clone(&count);
        engine.register_trade_observer(move |_t: &Trade| {
            count_ref.fetch_add(1, Ordering::Relaxed);
        });
        engine.unregister_all_observers();

        engine
            .submit(limit(1, "AAPL", Side::Sell, "100.00", 10))
            .unwrap();
        engine
            .submit(limit(2, "AAPL", Side::Buy, "100.00", 10))
            .unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_modify_preserves_side_and_loses_priority() {
        let engine = started_engine(&["Y"]);
        engine.submit(limit(1, "Y", Side::Buy, "50", 10)).unwrap();
        engine.submit(limit(2, "Y", Side::Buy, "50", 10)).unwrap();

        // Re-price order 1 at the same level: it goes to the tail
        assert!(engine.modify(OrderId::new(1), "Y", Price::from_u64(50), Quantity::new(10)));

        let trades = engine.submit(limit(3, "Y", Side::Sell, "50", 10)).unwrap();
        assert_eq!(trades[0].buy_order_id, OrderId::new(2));
    }

    #[test]
    fn test_modify_unknown_order_or_symbol() {
        let engine = started_engine(&["Y"]);
        assert!(!engine.modify(OrderId::new(9), "Y", Price::from_u64(50), Quantity::new(1)));
        assert!(!engine.modify(OrderId::new(9), "NOPE", Price::from_u64(50), Quantity::new(1)));
    }

    #[test]
    fn test_modify_can_cross_and_trade() {
        let engine = started_engine(&["Y"]);
        engine.submit(limit(1, "Y", Side::Buy, "49", 10)).unwrap();
        engine.submit(limit(2, "Y", Side::Sell, "51", 10)).unwrap();

        let trades: Arc<Mutex<Vec<Trade>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&trades);
        engine.register_trade_observer(move |t: &Trade| sink.lock().unwrap().push(t.clone()));

        // Lift the bid through the offer
        assert!(engine.modify(OrderId::new(1), "Y", Price::from_u64(51), Quantity::new(10)));

        let seen = trades.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].price, Price::from_u64(51)); // passive side's price
        assert_eq!(seen[0].buy_order_id, OrderId::new(1));
        assert_eq!(engine.statistics().trades_executed, 1);
    }

    #[test]
    fn test_modify_rejects_invalid_replacement_without_losing_original() {
        let engine = started_engine(&["Y"]);
        engine.submit(limit(1, "Y", Side::Buy, "50", 10)).unwrap();

        // Zero quantity replacement refused; original still resting
        assert!(!engine.modify(OrderId::new(1), "Y", Price::from_u64(50), Quantity::new(0)));
        assert_eq!(engine.best_bid("Y"), Some(Price::from_u64(50)));
    }

    #[test]
    fn test_market_depth_snapshot_fields() {
        let engine = started_engine(&["AAPL"]);
        engine
            .submit(limit(1, "AAPL", Side::Buy, "150.00", 100))
            .unwrap();
        engine
            .submit(limit(2, "AAPL", Side::Sell, "150.10", 50))
            .unwrap();

        let depth = engine.market_depth("AAPL", 5).unwrap();
        assert_eq!(depth.symbol.as_str(), "AAPL");
        assert_eq!(depth.best_bid, Some(Price::from_str("150.00").unwrap()));
        assert_eq!(depth.best_ask, Some(Price::from_str("150.10").unwrap()));
        assert_eq!(depth.spread, Some(Decimal::new(10, 2)));
        assert_eq!(depth.total_orders, 2);
        assert_eq!(depth.bids.len(), 1);
        assert_eq!(depth.asks.len(), 1);
        assert!(depth.timestamp > 0);

        assert!(engine.market_depth("NOPE", 5).is_none());
    }

    #[test]
    fn test_order_book_state_formatting() {
        let engine = started_engine(&["AAPL"]);
        engine
            .submit(limit(1, "AAPL", Side::Buy, "150.00", 100))
            .unwrap();

        let state = engine.order_book_state("AAPL", 5).unwrap();
        assert!(state.contains("BID 150.00 [100 qty]"));
        assert!(state.contains("SPREAD: N/A"));
        assert!(state.contains("Total Orders: 1"));
        assert!(engine.order_book_state("NOPE", 5).is_none());
    }

    #[test]
    fn test_engine_status_report() {
        let engine = started_engine(&["AAPL", "TSLA"]);
        let status = engine.engine_status();
        assert!(status.contains("Engine running: YES"));
        assert!(status.contains("Symbols: 2"));
    }

    #[test]
    fn test_clear_all_and_cleanup() {
        let engine = started_engine(&["A", "B"]);
        engine.submit(limit(1, "A", Side::Buy, "10", 5)).unwrap();

        engine.cleanup_empty_order_books();
        // A has a resting order and survives; B was empty and is gone
        assert_eq!(engine.active_symbols(), vec!["A".to_string()]);

        engine.clear_all_order_books();
        assert!(engine.active_symbols().is_empty());
    }
}
