//! Shared-memory ring buffer dump: attaches to the producer's segment
//! and prints every published record, unfiltered.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use feed_protocol::{FeedConfig, RingBufferConsumer};
use stream_client::setup_console_logging;
use tracing::info;

#[derive(Parser)]
#[command(about = "Dump the shared-memory market data ring buffer")]
struct Args {
    /// Optional JSON config overriding the default segment path.
    #[arg(long)]
    config: Option<PathBuf>,

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

    let mut consumer = RingBufferConsumer::open(&config.shm_path)?;
    info!("attached to segment {} at slot {}", config.shm_path.display(), consumer.cursor());

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    while !shutdown.load(Ordering::SeqCst) {
        let start = consumer.cursor();
        let mut slot = start;
        for record in consumer.poll() {
            println!(
                "{}: {}, {}, {}, {}, {}, {}, {}, {}",
                slot,
                record.instrument_id,
                record.kind,
                record.sn_id,
                record.tx_ms,
                record.event_ms,
                record.local_ns,
                record.price_text(),
                record.size_text()
            );
            slot = (slot + 1) % feed_protocol::RING_CAPACITY;
        }
        // Busy-wait path: the segment has no blocking primitive, so
        // sleep briefly between drains.
        tokio::time::sleep(Duration::from_micros(1)).await;
    }

    info!("gracefully shut down");
    Ok(())
}
