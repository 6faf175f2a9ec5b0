//! Thread-safe registry of live subscriptions.
//!
//! Shared between the receive loop and the signal-triggered teardown
//! path. Readers of `lookup` run concurrently with each other; all
//! writes serialize behind the lock.

use std::collections::HashMap;

use market_types::Subscription;
use parking_lot::RwLock;
use tracing::{info, warn};

/// Upper bound on simultaneous subscriptions, agreed with the feed.
/// Acks arriving beyond it are silently dropped.
pub const MAX_SYMBOLS: usize = 100;

#[derive(Default)]
struct Inner {
    subs: Vec<Subscription>,
    by_index: HashMap<u32, String>,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<Inner>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an acked subscription. Idempotent on index: a second ack
    /// for an index already present is ignored, whatever its symbol.
    pub fn add(&self, index: u32, symbol: &str) {
        let mut inner = self.inner.write();
        if inner.by_index.contains_key(&index) {
            return;
        }
        if inner.subs.len() >= MAX_SYMBOLS {
            warn!("subscription table full ({MAX_SYMBOLS}), dropping {symbol} (index {index})");
            return;
        }
        inner.subs.push(Subscription::new(symbol, index));
        inner.by_index.insert(index, symbol.to_string());
        info!("subscribed to {symbol} with index {index}");
    }

    /// Remove the first subscription matching `symbol`, returning its
    /// index, or `None` if the symbol is not subscribed.
    pub fn remove(&self, symbol: &str) -> Option<u32> {
        let mut inner = self.inner.write();
        let pos = inner.subs.iter().position(|s| s.symbol == symbol)?;
        let removed = inner.subs.remove(pos);
        inner.by_index.remove(&removed.index);
        Some(removed.index)
    }

    /// Remove every subscription, one at a time, logging rather than
    /// aborting on symbols that disappear concurrently.
    pub fn remove_all(&self) {
        for sub in self.snapshot() {
            if self.remove(&sub.symbol).is_none() {
                warn!("{} vanished during teardown", sub.symbol);
            }
        }
    }

    /// Hot-path lookup of the symbol for a feed index.
    pub fn lookup(&self, index: u32) -> Option<String> {
        self.inner.read().by_index.get(&index).cloned()
    }

    /// Point-in-time copy of the subscription list; does not alias
    /// internal storage.
    pub fn snapshot(&self) -> Vec<Subscription> {
        self.inner.read().subs.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().subs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_on_index() {
        let registry = SubscriptionRegistry::new();
        registry.add(7, "btcusdt");
        registry.add(7, "ethusdt");

        assert_eq!(registry.lookup(7).as_deref(), Some("btcusdt"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_unknown_symbol_leaves_state_unchanged() {
        let registry = SubscriptionRegistry::new();
        registry.add(1, "btcusdt");

        assert_eq!(registry.remove("ethusdt"), None);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(1).as_deref(), Some("btcusdt"));
    }

    #[test]
    fn remove_returns_index_and_clears_lookup() {
        let registry = SubscriptionRegistry::new();
        registry.add(5, "btcusdt");

        assert_eq!(registry.remove("btcusdt"), Some(5));
        assert_eq!(registry.lookup(5), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn capacity_overflow_drops_silently() {
        let registry = SubscriptionRegistry::new();
        for i in 0..MAX_SYMBOLS as u32 {
            registry.add(i, &format!("sym{i}"));
        }
        registry.add(10_000, "overflow");

        assert_eq!(registry.len(), MAX_SYMBOLS);
        assert_eq!(registry.lookup(10_000), None);
    }

    #[test]
    fn snapshot_does_not_alias_internal_storage() {
        let registry = SubscriptionRegistry::new();
        registry.add(1, "btcusdt");

        let snapshot = registry.snapshot();
        registry.remove("btcusdt");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].symbol, "btcusdt");
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_all_clears_everything() {
        let registry = SubscriptionRegistry::new();
        registry.add(1, "a");
        registry.add(2, "b");
        registry.add(3, "c");

        registry.remove_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_symbols_under_distinct_indices_are_kept() {
        let registry = SubscriptionRegistry::new();
        registry.add(1, "btcusdt");
        registry.add(2, "btcusdt");

        assert_eq!(registry.len(), 2);
        // Linear scan removes the first match only.
        assert_eq!(registry.remove("btcusdt"), Some(1));
        assert_eq!(registry.lookup(2).as_deref(), Some("btcusdt"));
    }
}
