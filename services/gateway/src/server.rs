//! TCP line server
//!
//! One task per connection; each request line produces one or more
//! response lines. All engine access goes through the shared
//! [`MatchingEngine`] handle; this layer only frames and parses.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use matching_engine::MatchingEngine;
use types::trade::Trade;

use crate::protocol::{self, Message, MessageKind, Request};

/// Serve connections until the listener fails
pub async fn run(listener: TcpListener, engine: Arc<MatchingEngine>) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "gateway listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(%peer, "client connected");
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, engine).await {
                warn!(%peer, error = %e, "connection closed with error");
            }
        });
    }
}

async fn serve_connection(
    stream: TcpStream,
    engine: Arc<MatchingEngine>,
) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        for response in handle_line(&engine, &line) {
            writer.write_all(response.to_string().as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
    }
    Ok(())
}

/// Process one request line into response messages
///
/// Synchronous on purpose: the engine completes every call without
/// suspension, so there is nothing to await between parse and reply.
pub fn handle_line(engine: &MatchingEngine, line: &str) -> Vec<Message> {
    let message = Message::deserialize(line);
    let request = match message.kind {
        MessageKind::Order | MessageKind::Cancel => {
            match protocol::parse_request(&message.payload, matching_engine::clock::now_nanos()) {
                Ok(request) => request,
                Err(e) => return vec![error(e.to_string())],
            }
        }
        _ => return vec![error(format!("unsupported message kind: {}", message.kind.as_str()))],
    };

    dispatch(engine, request)
}

fn dispatch(engine: &MatchingEngine, request: Request) -> Vec<Message> {
    match request {
        Request::Submit(order) => match engine.submit(order) {
            Ok(trades) => {
                let mut out: Vec<Message> = trades.iter().map(protocol::trade_message).collect();
                out.push(ok(format!("EXECUTED,{}", trades.len())));
                out
            }
            Err(e) => vec![error(e.to_string())],
        },
        Request::Cancel { order_id, symbol } => {
            if engine.cancel(order_id, &symbol) {
                vec![ok("CANCELLED")]
            } else {
                vec![error(format!("order {} not found on {}", order_id, symbol))]
            }
        }
        Request::Modify {
            order_id,
            symbol,
            price,
            quantity,
        } => {
            if engine.modify(order_id, &symbol, price, quantity) {
                vec![ok("MODIFIED")]
            } else {
                vec![error(format!("cannot modify order {} on {}", order_id, symbol))]
            }
        }
        Request::BestBid { symbol } => {
            vec![ok(format!(
                "BEST_BID,{},{}",
                symbol,
                price_or_na(engine.best_bid(&symbol).map(|p| p.to_string()))
            ))]
        }
        Request::BestAsk { symbol } => {
            vec![ok(format!(
                "BEST_ASK,{},{}",
                symbol,
                price_or_na(engine.best_ask(&symbol).map(|p| p.to_string()))
            ))]
        }
        Request::Spread { symbol } => {
            vec![ok(format!(
                "SPREAD,{},{}",
                symbol,
                price_or_na(engine.spread(&symbol).map(|s| s.to_string()))
            ))]
        }
        Request::MarketDepth { symbol, levels } => match engine.market_depth(&symbol, levels) {
            Some(depth) => match serde_json::to_string(&depth) {
                Ok(json) => vec![ok(format!("DEPTH,{}", json))],
                Err(e) => vec![error(format!("serialization failed: {}", e))],
            },
            None => vec![error(format!("unknown symbol: {}", symbol))],
        },
        Request::AddSymbol { symbol } => match engine.add_symbol(&symbol) {
            Ok(()) => vec![ok("SYMBOL_ADDED")],
            Err(e) => vec![error(e.to_string())],
        },
        Request::RemoveSymbol { symbol } => match engine.remove_symbol(&symbol) {
            Ok(()) => vec![ok("SYMBOL_REMOVED")],
            Err(e) => vec![error(e.to_string())],
        },
    }
}

/// Forward executed trades to subscribers as `TRADE|…` lines on a side
/// channel (the engine observer hook); kept separate from the
/// request/response path.
pub fn trade_report_line(trade: &Trade) -> String {
    protocol::trade_message(trade).to_string()
}

fn ok(payload: impl Into<String>) -> Message {
    Message::new(MessageKind::Ok, payload)
}

fn error(payload: impl Into<String>) -> Message {
    Message::new(MessageKind::Error, payload)
}

fn price_or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use matching_engine::EngineConfig;

    fn test_engine() -> MatchingEngine {
        let engine = MatchingEngine::new(EngineConfig {
            enable_logging: false,
            ..EngineConfig::default()
        });
        engine.start();
        engine.add_symbol("AAPL").unwrap();
        engine
    }

    fn texts(messages: &[Message]) -> Vec<String> {
        messages.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_submit_then_query_roundtrip() {
        let engine = test_engine();

        let responses = handle_line(&engine, "ORDER|SUBMIT_ORDER|1,AAPL,0,1,150.00,100");
        assert_eq!(texts(&responses), vec!["OK|EXECUTED,0"]);

        let responses = handle_line(&engine, "ORDER|GET_BEST_BID|AAPL");
        assert_eq!(texts(&responses), vec!["OK|BEST_BID,AAPL,150.00"]);

        let responses = handle_line(&engine, "ORDER|GET_BEST_ASK|AAPL");
        assert_eq!(texts(&responses), vec!["OK|BEST_ASK,AAPL,N/A"]);
    }

    #[test]
    fn test_crossing_submission_reports_trades() {
        let engine = test_engine();
        handle_line(&engine, "ORDER|SUBMIT_ORDER|1,AAPL,1,1,150.00,100");

        let responses = handle_line(&engine, "ORDER|SUBMIT_ORDER|2,AAPL,0,1,150.00,40");
        assert_eq!(
            texts(&responses),
            vec!["TRADE|1,AAPL,150.00,40,2,1", "OK|EXECUTED,1"]
        );
    }

    #[test]
    fn test_cancel_paths() {
        let engine = test_engine();
        handle_line(&engine, "ORDER|SUBMIT_ORDER|1,AAPL,0,1,150.00,100");

        let responses = handle_line(&engine, "CANCEL|CANCEL_ORDER|1,AAPL");
        assert_eq!(texts(&responses), vec!["OK|CANCELLED"]);

        let responses = handle_line(&engine, "CANCEL|CANCEL_ORDER|1,AAPL");
        assert_eq!(texts(&responses), vec!["ERROR|order 1 not found on AAPL"]);
    }

    #[test]
    fn test_market_depth_returns_json() {
        let engine = test_engine();
        handle_line(&engine, "ORDER|SUBMIT_ORDER|1,AAPL,0,1,150.00,100");

        let responses = handle_line(&engine, "ORDER|GET_MARKET_DEPTH|AAPL,5");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].kind, MessageKind::Ok);
        let json = responses[0].payload.strip_prefix("DEPTH,").unwrap();
        let depth: types::depth::MarketDepth = serde_json::from_str(json).unwrap();
        assert_eq!(depth.total_orders, 1);
    }

    #[test]
    fn test_symbol_management() {
        let engine = test_engine();

        let responses = handle_line(&engine, "ORDER|ADD_SYMBOL|TSLA");
        assert_eq!(texts(&responses), vec!["OK|SYMBOL_ADDED"]);

        let responses = handle_line(&engine, "ORDER|ADD_SYMBOL|TSLA");
        assert_eq!(
            texts(&responses),
            vec!["ERROR|symbol already exists: TSLA"]
        );

        let responses = handle_line(&engine, "ORDER|REMOVE_SYMBOL|TSLA");
        assert_eq!(texts(&responses), vec!["OK|SYMBOL_REMOVED"]);
    }

    #[test]
    fn test_engine_errors_surface_as_error_lines() {
        let engine = test_engine();

        let responses = handle_line(&engine, "ORDER|SUBMIT_ORDER|1,MSFT,0,1,150.00,100");
        assert_eq!(texts(&responses), vec!["ERROR|unknown symbol: MSFT"]);

        engine.stop();
        let responses = handle_line(&engine, "ORDER|SUBMIT_ORDER|1,AAPL,0,1,150.00,100");
        assert_eq!(texts(&responses), vec!["ERROR|engine is stopped"]);
    }

    #[test]
    fn test_malformed_lines() {
        let engine = test_engine();

        let responses = handle_line(&engine, "junk with no separator");
        assert_eq!(responses[0].kind, MessageKind::Error);

        let responses = handle_line(&engine, "ORDER|SUBMIT_ORDER|not,enough");
        assert_eq!(responses[0].kind, MessageKind::Error);

        let responses = handle_line(&engine, "TRADE|1,AAPL,1,1,1,1");
        assert_eq!(responses[0].kind, MessageKind::Error);
    }
}
