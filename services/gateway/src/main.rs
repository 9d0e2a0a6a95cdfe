mod protocol;
mod server;

use std::sync::Arc;

use tokio::net::TcpListener;

use matching_engine::{EngineConfig, MatchingEngine};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting matching engine gateway");

    let engine = Arc::new(MatchingEngine::new(EngineConfig::default()));
    engine.start();

    // Seed a default instrument set; clients can add more over the wire
    for symbol in ["AAPL", "GOOGL", "TSLA"] {
        engine.add_symbol(symbol)?;
    }

    // Log executed trades as they happen
    engine.register_trade_observer(|trade| {
        tracing::info!(report = %server::trade_report_line(trade), "trade executed");
    });

    let addr = std::env::var("GATEWAY_ADDR").unwrap_or_else(|_| "127.0.0.1:7001".to_string());
    let listener = TcpListener::bind(&addr).await?;

    server::run(listener, engine).await?;

    Ok(())
}
