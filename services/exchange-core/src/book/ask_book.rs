//! Ask (sell-side) order book
//!
//! Sell orders keyed by limit price; the best ask is the lowest price,
//! and within a price level the oldest order matches first.

use std::collections::BTreeMap;
use types::ids::{AccountId, OrderId};
use types::numeric::Price;

use super::price_level::{LevelEntry, PriceLevel};

/// Sell side of a symbol's book
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an open order at its limit price
    pub fn insert(&mut self, order_id: OrderId, account_id: AccountId, price: Price) {
        self.levels
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .push_back(order_id, account_id);
    }

    /// Remove an order from its price level
    ///
    /// Returns true if the order was found and removed.
    pub fn remove(&mut self, order_id: OrderId, price: Price) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id) {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Best ask: oldest order at the lowest price
    pub fn best(&self) -> Option<(Price, LevelEntry)> {
        self.levels
            .iter()
            .next()
            .and_then(|(price, level)| level.front().map(|e| (*price, e.clone())))
    }

    /// Drop the order returned by [`AskBook::best`]
    ///
    /// # Panics
    /// Panics if the book is empty.
    pub fn pop_best(&mut self) -> LevelEntry {
        let (price, level) = self
            .levels
            .iter_mut()
            .next()
            .expect("pop_best on empty ask book");
        let price = *price;
        let entry = level.pop_front().expect("empty level left in ask book");
        if level.is_empty() {
            self.levels.remove(&price);
        }
        entry
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Total resting orders across all levels
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::len).sum()
    }
}
