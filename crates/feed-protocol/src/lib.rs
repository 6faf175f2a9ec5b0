//! Transport and codec core for the upstream market data feed.
//!
//! Two independent paths deliver the same conceptual events:
//!
//! - **UDP push feed**: a text control protocol (subscribe /
//!   unsubscribe / ack) plus fixed little-endian binary data records,
//!   all on one socket demultiplexed by source port.
//! - **Shared-memory ring buffer**: a lock-free SPSC circular array
//!   written by a co-located producer, with its own non-interoperable
//!   record shape.
//!
//! ## Architecture
//!
//! ```text
//! Feed aggregator ──control acks / data──▶ UdpTransport ──▶ FeedClient
//!                                                             │ lookup
//!                                                  SubscriptionRegistry
//!
//! Producer process ──mmap segment──▶ RingBufferConsumer
//! ```
//!
//! Both paths decode into `market_types::MarketEvent`-shaped results;
//! the caller owns the poll loops and their shutdown signals.

pub mod client;
pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod registry;
pub mod ring;
pub mod transport;

pub use client::FeedClient;
pub use config::FeedConfig;
pub use error::{FeedError, Result};
pub use registry::{SubscriptionRegistry, MAX_SYMBOLS};
pub use ring::{RingBufferConsumer, RingRecord, RING_CAPACITY};
pub use transport::UdpTransport;
