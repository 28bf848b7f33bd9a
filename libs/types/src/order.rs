//! Order lifecycle types
//!
//! An order carries an immutable descriptor (who, what, side, limit,
//! original size, acceptance time) and mutable execution state (open
//! remainder, fill history, cancellation record). State changes flow
//! through `apply_fill` and `apply_cancel` only, which keep the share
//! conservation identity intact:
//!
//! `open_shares + Σ fills.shares + cancel.shares = original_amount`

use crate::ids::{AccountId, OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// A single execution against an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub shares: Quantity,
    pub price: Price,
    /// Seconds since the epoch, stamped under the symbol lock
    pub time: i64,
}

/// Cancellation of an order's open remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRecord {
    /// Shares that were still open at the moment of cancellation
    pub shares: Quantity,
    pub time: i64,
}

/// Complete order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub symbol: Symbol,
    pub side: Side,
    pub limit_price: Price,
    pub original_amount: Quantity,
    /// Seconds since the epoch, stamped under the symbol lock
    pub created_at: i64,
    pub open_shares: Quantity,
    pub fills: Vec<Fill>,
    pub cancel: Option<CancelRecord>,
}

impl Order {
    /// Create a new open order
    ///
    /// # Panics
    /// Panics if the original amount is zero
    pub fn new(
        id: OrderId,
        account_id: AccountId,
        symbol: Symbol,
        side: Side,
        limit_price: Price,
        original_amount: Quantity,
        created_at: i64,
    ) -> Self {
        assert!(!original_amount.is_zero(), "order amount must be non-zero");
        Self {
            id,
            account_id,
            symbol,
            side,
            limit_price,
            original_amount,
            created_at,
            open_shares: original_amount,
            fills: Vec::new(),
            cancel: None,
        }
    }

    /// An order is open iff it has an unmatched remainder and was never canceled
    pub fn is_open(&self) -> bool {
        !self.open_shares.is_zero() && self.cancel.is_none()
    }

    /// Check if the order has fully executed
    pub fn is_fully_executed(&self) -> bool {
        self.open_shares.is_zero() && self.cancel.is_none()
    }

    /// Total shares executed so far
    pub fn executed_shares(&self) -> Quantity {
        self.fills
            .iter()
            .fold(Quantity::zero(), |acc, f| acc + f.shares)
    }

    /// Check the share conservation identity
    pub fn check_conservation(&self) -> bool {
        let canceled = self.cancel.map_or(Quantity::zero(), |c| c.shares);
        self.open_shares + self.executed_shares() + canceled == self.original_amount
    }

    /// Record an execution of `shares` at `price`
    ///
    /// # Panics
    /// Panics if the order is not open, the fill is empty, or the fill
    /// exceeds the open remainder
    pub fn apply_fill(&mut self, shares: Quantity, price: Price, time: i64) {
        assert!(self.is_open(), "fill applied to a non-open order");
        assert!(!shares.is_zero(), "fill must move at least one share");
        assert!(
            shares <= self.open_shares,
            "fill exceeds open remainder"
        );

        self.open_shares = self.open_shares - shares;
        self.fills.push(Fill { shares, price, time });

        assert!(self.check_conservation(), "share conservation violated after fill");
    }

    /// Cancel the entire open remainder, returning the cancellation record
    ///
    /// # Panics
    /// Panics if the order is not open
    pub fn apply_cancel(&mut self, time: i64) -> CancelRecord {
        assert!(self.is_open(), "cancel applied to a non-open order");

        let record = CancelRecord {
            shares: self.open_shares,
            time,
        };
        self.open_shares = Quantity::zero();
        self.cancel = Some(record);

        assert!(self.check_conservation(), "share conservation violated after cancel");
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order(side: Side, limit: u64, amount: &str) -> Order {
        Order::new(
            OrderId::from_u64(1),
            AccountId::new("123456"),
            Symbol::new("SPY"),
            side,
            Price::from_u64(limit),
            Quantity::parse(amount).unwrap(),
            1700000000,
        )
    }

    #[test]
    fn test_new_order_is_open() {
        let order = test_order(Side::Buy, 125, "300");
        assert!(order.is_open());
        assert!(!order.is_fully_executed());
        assert_eq!(order.open_shares, order.original_amount);
        assert!(order.check_conservation());
    }

    #[test]
    fn test_partial_fill_keeps_order_open() {
        let mut order = test_order(Side::Sell, 124, "400");
        order.apply_fill(Quantity::from_u64(200), Price::from_u64(127), 1700000001);

        assert!(order.is_open());
        assert_eq!(order.open_shares, Quantity::from_u64(200));
        assert_eq!(order.executed_shares(), Quantity::from_u64(200));
        assert!(order.check_conservation());
    }

    #[test]
    fn test_full_fill_closes_order() {
        let mut order = test_order(Side::Buy, 50, "100");
        order.apply_fill(Quantity::from_u64(40), Price::from_u64(40), 1700000001);
        order.apply_fill(Quantity::from_u64(60), Price::from_u64(45), 1700000002);

        assert!(!order.is_open());
        assert!(order.is_fully_executed());
        assert_eq!(order.fills.len(), 2);
        assert!(order.check_conservation());
    }

    #[test]
    #[should_panic(expected = "fill exceeds open remainder")]
    fn test_overfill_panics() {
        let mut order = test_order(Side::Buy, 50, "100");
        order.apply_fill(Quantity::from_u64(150), Price::from_u64(40), 1700000001);
    }

    #[test]
    fn test_cancel_records_remainder() {
        let mut order = test_order(Side::Buy, 50, "100");
        order.apply_fill(Quantity::from_u64(40), Price::from_u64(40), 1700000001);

        let record = order.apply_cancel(1700000002);
        assert_eq!(record.shares, Quantity::from_u64(60));
        assert!(!order.is_open());
        assert!(!order.is_fully_executed());
        assert!(order.check_conservation());
    }

    #[test]
    #[should_panic(expected = "cancel applied to a non-open order")]
    fn test_double_cancel_panics() {
        let mut order = test_order(Side::Sell, 30, "10");
        order.apply_cancel(1700000001);
        order.apply_cancel(1700000002);
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_serialization() {
        let mut order = test_order(Side::Buy, 50, "100");
        order.apply_fill(Quantity::from_u64(40), Price::from_u64(40), 1700000001);

        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
