//! Order registry: id assignment and the authoritative record of every
//! order ever accepted
//!
//! Ids come from a single atomic counter, so they are strictly increasing
//! in acceptance order; the matching engine relies on that for
//! deterministic tie-breaking. Execution state mutates under the order's
//! map-entry guard; callers serialize fills and cancels per symbol with
//! the book lock, so the guard only has to protect against concurrent
//! status queries.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use types::errors::ExchangeError;
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{CancelRecord, Order, Side};

/// Compact per-order view used by the match loop
#[derive(Debug, Clone)]
pub(crate) struct OrderView {
    pub id: OrderId,
    pub account_id: AccountId,
    pub side: Side,
    pub limit_price: Price,
    pub created_at: i64,
    pub open_shares: Quantity,
}

/// Concurrent order store with monotonic id assignment
#[derive(Debug, Default)]
pub struct OrderRegistry {
    next_id: AtomicU64,
    orders: DashMap<OrderId, Order>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next id and store the order in its initial open state
    pub fn register(
        &self,
        account_id: AccountId,
        symbol: Symbol,
        side: Side,
        limit_price: Price,
        amount: Quantity,
        created_at: i64,
    ) -> OrderId {
        let id = OrderId::from_u64(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let order = Order::new(id, account_id, symbol, side, limit_price, amount, created_at);
        let clash = self.orders.insert(id, order);
        assert!(clash.is_none(), "order id {id} assigned twice");
        id
    }

    /// Immutable snapshot of an order, sufficient for a status reply
    pub fn get(&self, id: OrderId) -> Result<Order, ExchangeError> {
        self.orders
            .get(&id)
            .map(|o| o.clone())
            .ok_or_else(|| ExchangeError::UnknownOrder {
                order_id: id.to_string(),
            })
    }

    /// Append a fill and decrement the open remainder
    ///
    /// Called under the symbol lock of the order's book.
    ///
    /// # Panics
    /// Panics if the order is unknown, closed, or the fill exceeds the
    /// open remainder: fills are derived from the book under its lock,
    /// so any of those means the book and registry disagree.
    pub fn apply_fill(&self, id: OrderId, shares: Quantity, price: Price, time: i64) {
        let mut order = self
            .orders
            .get_mut(&id)
            .unwrap_or_else(|| panic!("registry corruption: fill on unknown order {id}"));
        order.apply_fill(shares, price, time);
    }

    /// Cancel the order's current open remainder
    ///
    /// Called under the symbol lock. Returns the cancellation record;
    /// a second cancel (or a cancel of a fully executed order) reports
    /// `NotOpen`.
    pub fn apply_cancel(&self, id: OrderId, time: i64) -> Result<CancelRecord, ExchangeError> {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| ExchangeError::UnknownOrder {
                order_id: id.to_string(),
            })?;
        if !order.is_open() {
            return Err(ExchangeError::NotOpen {
                order_id: id.to_string(),
            });
        }
        Ok(order.apply_cancel(time))
    }

    /// Match-loop view of an order
    ///
    /// # Panics
    /// Panics if the order is unknown (book entries always reference
    /// registered orders).
    pub(crate) fn view(&self, id: OrderId) -> OrderView {
        let order = self
            .orders
            .get(&id)
            .unwrap_or_else(|| panic!("registry corruption: view of unknown order {id}"));
        OrderView {
            id: order.id,
            account_id: order.account_id.clone(),
            side: order.side,
            limit_price: order.limit_price,
            created_at: order.created_at,
            open_shares: order.open_shares,
        }
    }
}
