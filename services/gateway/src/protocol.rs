//! Wire protocol for the line-framed text transport
//!
//! Every message is one line: `TYPE|PAYLOAD\n`. Requests carry a command
//! verb and comma-separated fields in the payload, e.g.
//! `ORDER|SUBMIT_ORDER|1,AAPL,0,1,150.00,100`. The core engine never sees
//! these strings; all parsing happens here.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

/// Message envelope kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Order,
    Cancel,
    Trade,
    Ok,
    Error,
    Unknown,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Order => "ORDER",
            MessageKind::Cancel => "CANCEL",
            MessageKind::Trade => "TRADE",
            MessageKind::Ok => "OK",
            MessageKind::Error => "ERROR",
            MessageKind::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ORDER" => MessageKind::Order,
            "CANCEL" => MessageKind::Cancel,
            "TRADE" => MessageKind::Trade,
            "OK" => MessageKind::Ok,
            "ERROR" => MessageKind::Error,
            _ => MessageKind::Unknown,
        }
    }
}

/// One framed message: kind plus raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub payload: String,
}

impl Message {
    pub fn new(kind: MessageKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Split a line at the first `|` into kind and payload
    ///
    /// A line with no separator becomes `UNKNOWN` with the whole line as
    /// payload.
    pub fn deserialize(line: &str) -> Self {
        match line.split_once('|') {
            Some((kind, payload)) => Self::new(MessageKind::parse(kind), payload),
            None => Self::new(MessageKind::Unknown, line),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.kind.as_str(), self.payload)
    }
}

/// Protocol-level errors, reported back to the client as `ERROR|…`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("malformed payload for {command}: expected {expected} fields")]
    FieldCount {
        command: &'static str,
        expected: usize,
    },

    #[error("invalid field {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// A parsed client request
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Submit(Order),
    Cancel {
        order_id: OrderId,
        symbol: String,
    },
    Modify {
        order_id: OrderId,
        symbol: String,
        price: Price,
        quantity: Quantity,
    },
    BestBid {
        symbol: String,
    },
    BestAsk {
        symbol: String,
    },
    Spread {
        symbol: String,
    },
    MarketDepth {
        symbol: String,
        levels: usize,
    },
    AddSymbol {
        symbol: String,
    },
    RemoveSymbol {
        symbol: String,
    },
}

/// Parse a request payload of the form `VERB|field,field,…`
///
/// `SUBMIT_ORDER|id,symbol,side,kind,price,quantity` uses side 0=BUY /
/// 1=SELL, kind 0=MARKET / 1=LIMIT, and price 0 for market orders. The
/// submission timestamp is stamped by the caller, not parsed.
pub fn parse_request(payload: &str, timestamp: i64) -> Result<Request, ProtocolError> {
    let (verb, rest) = payload.split_once('|').unwrap_or((payload, ""));
    let fields: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').collect()
    };

    match verb {
        "SUBMIT_ORDER" => {
            expect_fields("SUBMIT_ORDER", &fields, 6)?;
            let id = OrderId::new(parse_u64("id", fields[0])?);
            let symbol = parse_symbol(fields[1])?;
            let side = match fields[2] {
                "0" => Side::Buy,
                "1" => Side::Sell,
                other => return Err(invalid("side", other)),
            };
            let kind = match fields[3] {
                "0" => OrderKind::Market,
                "1" => OrderKind::Limit,
                other => return Err(invalid("kind", other)),
            };
            let quantity = Quantity::new(parse_u64("quantity", fields[5])?);

            let order = match kind {
                OrderKind::Market => {
                    // Market orders send 0 in the price slot; anything else
                    // in that slot is still accepted and ignored per the
                    // "any price" sentinel convention.
                    Order::market(id, symbol, side, quantity, timestamp)
                }
                OrderKind::Limit => {
                    let price = parse_price(fields[4])?;
                    Order::limit(id, symbol, side, price, quantity, timestamp)
                }
            };
            Ok(Request::Submit(order))
        }
        "CANCEL_ORDER" => {
            expect_fields("CANCEL_ORDER", &fields, 2)?;
            Ok(Request::Cancel {
                order_id: OrderId::new(parse_u64("id", fields[0])?),
                symbol: fields[1].to_string(),
            })
        }
        "MODIFY_ORDER" => {
            expect_fields("MODIFY_ORDER", &fields, 4)?;
            Ok(Request::Modify {
                order_id: OrderId::new(parse_u64("id", fields[0])?),
                symbol: fields[1].to_string(),
                price: parse_price(fields[2])?,
                quantity: Quantity::new(parse_u64("quantity", fields[3])?),
            })
        }
        "GET_BEST_BID" => {
            expect_fields("GET_BEST_BID", &fields, 1)?;
            Ok(Request::BestBid {
                symbol: fields[0].to_string(),
            })
        }
        "GET_BEST_ASK" => {
            expect_fields("GET_BEST_ASK", &fields, 1)?;
            Ok(Request::BestAsk {
                symbol: fields[0].to_string(),
            })
        }
        "GET_SPREAD" => {
            expect_fields("GET_SPREAD", &fields, 1)?;
            Ok(Request::Spread {
                symbol: fields[0].to_string(),
            })
        }
        "GET_MARKET_DEPTH" => {
            expect_fields("GET_MARKET_DEPTH", &fields, 2)?;
            Ok(Request::MarketDepth {
                symbol: fields[0].to_string(),
                levels: parse_u64("levels", fields[1])? as usize,
            })
        }
        "ADD_SYMBOL" => {
            expect_fields("ADD_SYMBOL", &fields, 1)?;
            Ok(Request::AddSymbol {
                symbol: fields[0].to_string(),
            })
        }
        "REMOVE_SYMBOL" => {
            expect_fields("REMOVE_SYMBOL", &fields, 1)?;
            Ok(Request::RemoveSymbol {
                symbol: fields[0].to_string(),
            })
        }
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

/// Serialize a trade as a `TRADE|…` report line
pub fn trade_message(trade: &Trade) -> Message {
    Message::new(
        MessageKind::Trade,
        format!(
            "{},{},{},{},{},{}",
            trade.trade_id,
            trade.symbol,
            trade.price,
            trade.quantity,
            trade.buy_order_id,
            trade.sell_order_id
        ),
    )
}

fn expect_fields(
    command: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ProtocolError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount { command, expected })
    }
}

fn invalid(field: &'static str, value: &str) -> ProtocolError {
    ProtocolError::InvalidField {
        field,
        value: value.to_string(),
    }
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ProtocolError> {
    value.parse::<u64>().map_err(|_| invalid(field, value))
}

fn parse_price(value: &str) -> Result<Price, ProtocolError> {
    let decimal = value
        .parse::<Decimal>()
        .map_err(|_| invalid("price", value))?;
    Price::try_new(decimal).ok_or_else(|| invalid("price", value))
}

fn parse_symbol(value: &str) -> Result<types::ids::Symbol, ProtocolError> {
    types::ids::Symbol::try_new(value).map_err(|_| invalid("symbol", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Symbol;

    #[test]
    fn test_message_roundtrip() {
        let msg = Message::new(MessageKind::Order, "SUBMIT_ORDER|1,AAPL,0,1,150.00,100");
        let line = msg.to_string();
        assert_eq!(line, "ORDER|SUBMIT_ORDER|1,AAPL,0,1,150.00,100");
        assert_eq!(Message::deserialize(&line), msg);
    }

    #[test]
    fn test_deserialize_without_separator() {
        let msg = Message::deserialize("garbage");
        assert_eq!(msg.kind, MessageKind::Unknown);
        assert_eq!(msg.payload, "garbage");
    }

    #[test]
    fn test_parse_submit_limit() {
        let request = parse_request("SUBMIT_ORDER|1,AAPL,0,1,150.00,100", 42).unwrap();
        match request {
            Request::Submit(order) => {
                assert_eq!(order.id, OrderId::new(1));
                assert_eq!(order.symbol, Symbol::new("AAPL"));
                assert_eq!(order.side, Side::Buy);
                assert_eq!(order.kind, OrderKind::Limit);
                assert_eq!(order.price, Some(Price::from_str("150.00").unwrap()));
                assert_eq!(order.quantity, Quantity::new(100));
                assert_eq!(order.timestamp, 42);
            }
            other => panic!("expected Submit, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_submit_market_ignores_price_slot() {
        let request = parse_request("SUBMIT_ORDER|5,AAPL,0,0,0,150", 1).unwrap();
        match request {
            Request::Submit(order) => {
                assert_eq!(order.kind, OrderKind::Market);
                assert_eq!(order.price, None);
                assert_eq!(order.quantity, Quantity::new(150));
            }
            other => panic!("expected Submit, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_submit_rejects_bad_side() {
        let err = parse_request("SUBMIT_ORDER|1,AAPL,2,1,150.00,100", 1).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidField {
                field: "side",
                value: "2".to_string()
            }
        );
    }

    #[test]
    fn test_parse_cancel_and_modify() {
        assert_eq!(
            parse_request("CANCEL_ORDER|7,AAPL", 1).unwrap(),
            Request::Cancel {
                order_id: OrderId::new(7),
                symbol: "AAPL".to_string()
            }
        );
        assert_eq!(
            parse_request("MODIFY_ORDER|7,AAPL,151.00,50", 1).unwrap(),
            Request::Modify {
                order_id: OrderId::new(7),
                symbol: "AAPL".to_string(),
                price: Price::from_str("151.00").unwrap(),
                quantity: Quantity::new(50)
            }
        );
    }

    #[test]
    fn test_parse_queries() {
        assert_eq!(
            parse_request("GET_BEST_BID|AAPL", 1).unwrap(),
            Request::BestBid {
                symbol: "AAPL".to_string()
            }
        );
        assert_eq!(
            parse_request("GET_MARKET_DEPTH|AAPL,5", 1).unwrap(),
            Request::MarketDepth {
                symbol: "AAPL".to_string(),
                levels: 5
            }
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_request("NO_SUCH_VERB|x", 1).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownCommand("NO_SUCH_VERB".to_string()));
    }

    #[test]
    fn test_parse_field_count_mismatch() {
        let err = parse_request("SUBMIT_ORDER|1,AAPL", 1).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FieldCount {
                command: "SUBMIT_ORDER",
                expected: 6
            }
        );
    }

    #[test]
    fn test_trade_message_format() {
        let trade = Trade::new(
            types::ids::TradeId::new(9),
            Symbol::new("AAPL"),
            OrderId::new(5),
            OrderId::new(3),
            Price::from_str("150.10").unwrap(),
            Quantity::new(100),
            1,
        );
        assert_eq!(
            trade_message(&trade).to_string(),
            "TRADE|9,AAPL,150.10,100,5,3"
        );
    }
}
