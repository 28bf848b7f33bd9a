//! Account balance and position types
//!
//! An account holds a USD balance and a per-symbol share position map.
//! Both are non-negative at every externally observable moment: buys
//! reserve funds up front and sells reserve shares up front, so a
//! negative value can only mean a bookkeeping bug.

use crate::ids::{AccountId, Symbol};
use crate::numeric::Quantity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Account state: balance plus share positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Decimal,
    pub positions: HashMap<Symbol, Quantity>,
}

impl Account {
    /// Create a new account with an initial balance and no positions
    ///
    /// # Panics
    /// Panics if the initial balance is negative
    pub fn new(id: AccountId, balance: Decimal) -> Self {
        assert!(balance >= Decimal::ZERO, "initial balance must be non-negative");
        Self {
            id,
            balance,
            positions: HashMap::new(),
        }
    }

    /// Shares held in `symbol` (zero if no position exists)
    pub fn position(&self, symbol: &Symbol) -> Quantity {
        self.positions
            .get(symbol)
            .copied()
            .unwrap_or_else(Quantity::zero)
    }

    /// Conditionally debit `amount` from the balance
    ///
    /// Returns false (and leaves the balance untouched) if funds are
    /// insufficient. `amount` must be non-negative.
    pub fn try_debit(&mut self, amount: Decimal) -> bool {
        assert!(amount >= Decimal::ZERO, "debit amount must be non-negative");
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }

    /// Credit `amount` to the balance
    ///
    /// # Panics
    /// Panics if `amount` is negative
    pub fn credit(&mut self, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "credit amount must be non-negative");
        self.balance += amount;
    }

    /// Conditionally remove `shares` from the position in `symbol`
    ///
    /// Returns false (and leaves the position untouched) if the position
    /// is insufficient. A position drained to zero stays in the map;
    /// nothing externally visible distinguishes that from removal.
    pub fn try_reserve_shares(&mut self, symbol: &Symbol, shares: Quantity) -> bool {
        match self.positions.get_mut(symbol) {
            Some(held) if *held >= shares => {
                *held = *held - shares;
                true
            }
            _ => false,
        }
    }

    /// Add `shares` to the position in `symbol`, creating it if absent
    pub fn credit_shares(&mut self, symbol: &Symbol, shares: Quantity) {
        let held = self
            .positions
            .entry(symbol.clone())
            .or_insert_with(Quantity::zero);
        *held = *held + shares;
    }

    /// Check the non-negativity invariant over balance and positions
    pub fn check_invariant(&self) -> bool {
        self.balance >= Decimal::ZERO
            && self.positions.values().all(|q| !q.as_decimal().is_sign_negative())
    }
}
