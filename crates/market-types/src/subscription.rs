use serde::{Deserialize, Serialize};

use crate::Symbol;

/// A live subscription: the feed-assigned index and the symbol it stands for.
///
/// The index is the on-wire key; at most one live subscription carries a
/// given index at a time. Symbols are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub symbol: Symbol,
    pub index: u32,
}

impl Subscription {
    pub fn new(symbol: impl Into<Symbol>, index: u32) -> Self {
        Self {
            symbol: symbol.into(),
            index,
        }
    }
}
