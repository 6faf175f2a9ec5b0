//! Shared market data types used across all components

pub mod event;
pub mod subscription;

pub use event::{DepthLevel, MarketEvent, QuoteSide, TradeSide};
pub use subscription::Subscription;

pub type Timestamp = i64; // Milliseconds since epoch
pub type Price = f64;
pub type Quantity = f64;
pub type Symbol = String;
