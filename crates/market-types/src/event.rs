use serde::{Deserialize, Serialize};

use crate::{Price, Quantity, Symbol, Timestamp};

/// Side of a top-of-book quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSide {
    Bid,
    Ask,
}

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A single price level of an order book snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub size: Quantity,
}

/// A decoded market data event, independent of which transport carried it.
///
/// Both the UDP codec and the shared-memory codec decode into this one
/// model; the wire shapes themselves are not interoperable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Best bid or ask update (L1).
    Quote {
        symbol: Symbol,
        side: QuoteSide,
        price: Price,
        size: Quantity,
        tx_ms: Timestamp,
        event_ms: Timestamp,
        local_ns: i64,
        sequence: i64,
    },
    /// An executed trade.
    Trade {
        symbol: Symbol,
        side: TradeSide,
        price: Price,
        size: Quantity,
        tx_ms: Timestamp,
        event_ms: Timestamp,
        local_ns: i64,
        trade_id: i64,
    },
    /// An order book snapshot update, asks and bids in published order.
    Depth {
        symbol: Symbol,
        tx_ms: Timestamp,
        event_ms: Timestamp,
        local_ns: i64,
        sequence: i64,
        asks: Vec<DepthLevel>,
        bids: Vec<DepthLevel>,
    },
}

impl MarketEvent {
    pub fn symbol(&self) -> &str {
        match self {
            MarketEvent::Quote { symbol, .. }
            | MarketEvent::Trade { symbol, .. }
            | MarketEvent::Depth { symbol, .. } => symbol,
        }
    }

    /// The feed's local receive timestamp embedded in the message.
    pub fn local_ns(&self) -> i64 {
        match self {
            MarketEvent::Quote { local_ns, .. }
            | MarketEvent::Trade { local_ns, .. }
            | MarketEvent::Depth { local_ns, .. } => *local_ns,
        }
    }

    /// Elapsed nanoseconds between the embedded local timestamp and `now_ns`.
    pub fn latency_ns(&self, now_ns: i64) -> i64 {
        now_ns - self.local_ns()
    }
}
