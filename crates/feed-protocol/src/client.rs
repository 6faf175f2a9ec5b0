//! Subscription lifecycle and datagram dispatch for the UDP feed.

use std::sync::Arc;
use std::time::Duration;

use market_types::{MarketEvent, QuoteSide, TradeSide};
use tracing::{info, warn};

use crate::codec::{self, KIND_DEPTH, KIND_QUOTE, KIND_TRADE};
use crate::config::FeedConfig;
use crate::control;
use crate::error::Result;
use crate::registry::SubscriptionRegistry;
use crate::transport::UdpTransport;

/// Client side of the push feed: owns the socket, drives the control
/// protocol, and decodes data datagrams into [`MarketEvent`]s.
///
/// The caller owns the poll loop: call [`FeedClient::poll_event`]
/// repeatedly and check a cancellation condition on each `Ok(None)`.
pub struct FeedClient {
    transport: UdpTransport,
    registry: Arc<SubscriptionRegistry>,
}

impl FeedClient {
    pub async fn connect(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            transport: UdpTransport::bind(config).await?,
            registry: Arc::new(SubscriptionRegistry::new()),
        })
    }

    /// Shared handle on the registry, e.g. for a teardown path running
    /// on another task.
    pub fn registry(&self) -> Arc<SubscriptionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Request a subscription. The feed confirms asynchronously with an
    /// ack datagram; the registry is updated when that ack is polled.
    pub async fn subscribe(&self, symbol: &str) -> Result<()> {
        info!("subscribing to {symbol}");
        self.transport
            .send_control(&control::encode_subscribe(symbol))
            .await
    }

    /// Notify the feed, then drop the subscription locally. A failed
    /// send leaves the registry untouched so the caller can retry.
    /// Unknown symbols are logged and ignored.
    pub async fn unsubscribe(&self, symbol: &str) -> Result<()> {
        let index = self
            .registry
            .snapshot()
            .into_iter()
            .find(|s| s.symbol == symbol)
            .map(|s| s.index);
        let Some(index) = index else {
            warn!("{symbol} not found in subscriptions");
            return Ok(());
        };

        info!("unsubscribing from {symbol} (index {index})");
        self.transport
            .send_control(&control::encode_unsubscribe(symbol))
            .await?;
        self.registry.remove(symbol);
        Ok(())
    }

    /// Tear down every subscription, tolerating per-symbol send
    /// failures so a partial teardown still releases the rest. For
    /// teardown paths with no socket at hand,
    /// [`SubscriptionRegistry::remove_all`] is the local-only
    /// counterpart.
    pub async fn unsubscribe_all(&self) {
        for sub in self.registry.snapshot() {
            if let Err(e) = self.unsubscribe(&sub.symbol).await {
                warn!("failed to unsubscribe from {}: {e}", sub.symbol);
            }
        }
    }

    /// One step of the receive loop: a single bounded receive, then
    /// dispatch. Returns `Ok(None)` on timeout, on control-channel
    /// traffic, and on datagrams that are dropped (unknown index,
    /// unknown kind, or decode failure); decode failures are logged
    /// and never abort the loop.
    pub async fn poll_event(&mut self, timeout: Duration) -> Result<Option<MarketEvent>> {
        let control_port = self.transport.control_port();
        let Some((source_port, data)) = self.transport.recv(timeout).await? else {
            return Ok(None);
        };

        // Acks come from the control port, data from everywhere else.
        if source_port == control_port {
            match control::decode_subscription_ack(data) {
                Ok((index, symbol)) => self.registry.add(index, &symbol),
                Err(e) => warn!("bad subscription ack: {e}"),
            }
            return Ok(None);
        }

        let Some((kind, index)) = codec::peek_kind_index(data) else {
            return Ok(None);
        };

        // The feed broadcasts indices we may never have subscribed to,
        // or have since unsubscribed from.
        let Some(symbol) = self.registry.lookup(index) else {
            return Ok(None);
        };

        let event = if kind == KIND_DEPTH {
            match codec::decode_depth(data) {
                Ok((header, levels)) => {
                    let split = header.ask_count as usize;
                    let (asks, bids) = levels.split_at(split);
                    MarketEvent::Depth {
                        symbol,
                        tx_ms: header.tx_ms,
                        event_ms: header.event_ms,
                        local_ns: header.local_ns,
                        sequence: header.sn_id,
                        asks: asks.to_vec(),
                        bids: bids.to_vec(),
                    }
                }
                Err(e) => {
                    warn!("dropping depth datagram for {symbol}: {e}");
                    return Ok(None);
                }
            }
        } else if kind.abs() == KIND_QUOTE || kind.abs() == KIND_TRADE {
            let record = match codec::decode_ticker_or_trade(data) {
                Ok(record) => record,
                Err(e) => {
                    warn!("dropping data datagram for {symbol}: {e}");
                    return Ok(None);
                }
            };
            if kind.abs() == KIND_QUOTE {
                MarketEvent::Quote {
                    symbol,
                    side: if record.kind > 0 {
                        QuoteSide::Bid
                    } else {
                        QuoteSide::Ask
                    },
                    price: record.price,
                    size: record.size,
                    tx_ms: record.tx_ms,
                    event_ms: record.event_ms,
                    local_ns: record.local_ns,
                    sequence: record.sn_id,
                }
            } else {
                MarketEvent::Trade {
                    symbol,
                    side: if record.kind > 0 {
                        TradeSide::Buy
                    } else {
                        TradeSide::Sell
                    },
                    price: record.price,
                    size: record.size,
                    tx_ms: record.tx_ms,
                    event_ms: record.event_ms,
                    local_ns: record.local_ns,
                    trade_id: record.sn_id,
                }
            }
        } else {
            // Unknown kind, e.g. protocol extensions this consumer
            // does not speak.
            return Ok(None);
        };

        Ok(Some(event))
    }
}
