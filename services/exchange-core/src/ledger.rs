//! Ledger: authoritative store of accounts and the symbol registry
//!
//! Every mutation happens under the account's map-entry guard, so each
//! operation is indivisible to other threads. Reservations (the
//! conditional debits backing order acceptance) are the only fallible
//! mutations; credits can only fail if the account has vanished, which
//! is a bookkeeping bug and panics.

use dashmap::DashMap;
use rust_decimal::Decimal;
use types::account::Account;
use types::errors::ExchangeError;
use types::ids::{AccountId, Symbol};
use types::numeric::Quantity;

/// Concurrent account and symbol store
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<AccountId, Account>,
    symbols: DashMap<Symbol, ()>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with an initial balance
    pub fn create_account(&self, id: AccountId, balance: Decimal) -> Result<(), ExchangeError> {
        if balance < Decimal::ZERO {
            return Err(ExchangeError::malformed("balance must be non-negative"));
        }
        match self.accounts.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ExchangeError::DuplicateAccount {
                account_id: id.to_string(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Account::new(id, balance));
                Ok(())
            }
        }
    }

    /// Register `symbol` (idempotent) and add `shares` to the account's position
    pub fn create_or_add_shares(
        &self,
        symbol: &Symbol,
        id: &AccountId,
        shares: Quantity,
    ) -> Result<(), ExchangeError> {
        if shares.is_zero() {
            return Err(ExchangeError::malformed("share amount must be positive"));
        }
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| ExchangeError::UnknownAccount {
                account_id: id.to_string(),
            })?;
        self.symbols.entry(symbol.clone()).or_insert(());
        account.credit_shares(symbol, shares);
        Ok(())
    }

    /// Atomically debit `amount` if the balance covers it
    pub fn reserve_funds(&self, id: &AccountId, amount: Decimal) -> Result<(), ExchangeError> {
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| ExchangeError::UnknownAccount {
                account_id: id.to_string(),
            })?;
        if account.try_debit(amount) {
            Ok(())
        } else {
            Err(ExchangeError::InsufficientFunds {
                required: amount.normalize().to_string(),
                available: account.balance.normalize().to_string(),
            })
        }
    }

    /// Return previously reserved funds
    pub fn refund_funds(&self, id: &AccountId, amount: Decimal) {
        self.credit_funds(id, amount);
    }

    /// Credit `amount` to the balance
    ///
    /// # Panics
    /// Panics if the account does not exist: callers only credit accounts
    /// that already passed a reservation, so a miss means corrupted state.
    pub fn credit_funds(&self, id: &AccountId, amount: Decimal) {
        let mut account = self
            .accounts
            .get_mut(id)
            .unwrap_or_else(|| panic!("ledger corruption: crediting unknown account {id}"));
        account.credit(amount);
    }

    /// Atomically remove `shares` from the position if it covers them
    pub fn reserve_shares(
        &self,
        id: &AccountId,
        symbol: &Symbol,
        shares: Quantity,
    ) -> Result<(), ExchangeError> {
        let mut account = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| ExchangeError::UnknownAccount {
                account_id: id.to_string(),
            })?;
        if account.try_reserve_shares(symbol, shares) {
            Ok(())
        } else {
            Err(ExchangeError::InsufficientShares {
                symbol: symbol.to_string(),
            })
        }
    }

    /// Add `shares` to the position, creating it if absent
    ///
    /// # Panics
    /// Panics if the account does not exist (see [`Ledger::credit_funds`]).
    pub fn credit_shares(&self, id: &AccountId, symbol: &Symbol, shares: Quantity) {
        let mut account = self
            .accounts
            .get_mut(id)
            .unwrap_or_else(|| panic!("ledger corruption: crediting unknown account {id}"));
        self.symbols.entry(symbol.clone()).or_insert(());
        account.credit_shares(symbol, shares);
    }

    pub fn has_account(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id)
    }

    /// Current balance, if the account exists
    pub fn balance_of(&self, id: &AccountId) -> Option<Decimal> {
        self.accounts.get(id).map(|a| a.balance)
    }

    /// Current position in `symbol`, if the account exists
    pub fn position_of(&self, id: &AccountId, symbol: &Symbol) -> Option<Quantity> {
        self.accounts.get(id).map(|a| a.position(symbol))
    }

    /// Every symbol ever mentioned
    pub fn known_symbols(&self) -> Vec<Symbol> {
        self.symbols.iter().map(|e| e.key().clone()).collect()
    }
}
