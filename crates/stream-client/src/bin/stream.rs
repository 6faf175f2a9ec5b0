//! UDP feed consumer: subscribes to a list of symbols, prints decoded
//! events with their latency, and unsubscribes everything on Ctrl-C.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use feed_protocol::{FeedClient, FeedConfig};
use market_types::{MarketEvent, QuoteSide, TradeSide};
use stream_client::{now_ns, setup_console_logging};
use tracing::{info, warn};

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

const DEFAULT_SYMBOLS: &[&str] = &[
    "binance-futures:btcusdt",
    "binance:btcusdt",
    "okx-swap:BTC-USDT-SWAP",
    "okx-spot:BTC-USDT",
    "bybit:BTCUSDT",
    "gate-io-futures:BTC_USDT",
    "bitget-futures:BTCUSDT",
    "bitget:BTCUSDT",
];

#[derive(Parser)]
#[command(about = "Consume the UDP market data feed")]
struct Args {
    /// Optional JSON config overriding the default endpoints.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbols to subscribe to; repeat for several.
    #[arg(long = "symbol")]
    symbols: Vec<String>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_console_logging(&args.log_level);

    let config = match &args.config {
        Some(path) => FeedConfig::load(path)?,
        None => FeedConfig::default(),
    };

    let symbols: Vec<String> = if args.symbols.is_empty() {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    } else {
        args.symbols
    };

    let mut client = FeedClient::connect(&config).await?;
    for symbol in &symbols {
        if let Err(e) = client.subscribe(symbol).await {
            warn!("failed to subscribe to {symbol}: {e}");
        }
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    // Cooperative cancellation: each bounded receive completes before
    // the flag is checked.
    while !shutdown.load(Ordering::SeqCst) {
        match client.poll_event(POLL_TIMEOUT).await {
            Ok(Some(event)) => print_event(&event),
            Ok(None) => {}
            Err(e) => warn!("receive error: {e}"),
        }
    }

    print_status(&client);
    client.unsubscribe_all().await;
    info!("gracefully shut down");
    Ok(())
}

fn print_status(client: &FeedClient) {
    let subs = client.registry().snapshot();
    println!("=== Current Status ===");
    println!("Total symbols: {}", subs.len());
    for sub in subs {
        println!("Symbol: {} (index: {})", sub.symbol, sub.index);
    }
    println!("======================");
}

fn print_event(event: &MarketEvent) {
    let latency = event.latency_ns(now_ns());
    match event {
        MarketEvent::Quote {
            symbol,
            side,
            price,
            size,
            ..
        } => {
            let side = match side {
                QuoteSide::Bid => "bid",
                QuoteSide::Ask => "ask",
            };
            println!("{symbol}: ticker, {side}, {price}, {size}, {latency}");
        }
        MarketEvent::Trade {
            symbol,
            side,
            price,
            size,
            ..
        } => {
            let side = match side {
                TradeSide::Buy => "buy",
                TradeSide::Sell => "sell",
            };
            println!("{symbol}: trade, {side}, {price}, {size}, {latency}");
        }
        MarketEvent::Depth {
            symbol, asks, bids, ..
        } => {
            println!("{symbol}: depth, {}, {}, {latency}", asks.len(), bids.len());
            print!("asks: ");
            for ask in asks {
                print!("{}:{}, ", ask.price, ask.size);
            }
            print!("\nbids: ");
            for bid in bids {
                print!("{}:{}, ", bid.price, bid.size);
            }
            println!();
        }
    }
}
