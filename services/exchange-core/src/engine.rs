//! Exchange engine
//!
//! Owns the per-symbol books and orchestrates acceptance, matching,
//! cancellation, and status queries across the ledger and the registry.
//!
//! Locking: one mutex per symbol guards both sides of that symbol's book
//! and every fill touching that symbol. Acceptance timestamps and fill
//! times are taken while the lock is held, so "stamped earlier" implies
//! "was observably open first" on that book. Ledger and registry are
//! internally synchronized; workers on different symbols never contend.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use types::errors::ExchangeError;
use types::ids::{AccountId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use crate::book::SymbolBook;
use crate::clock::Clock;
use crate::ledger::Ledger;
use crate::matching::crossing;
use crate::matching::executor::FillExecutor;
use crate::registry::OrderRegistry;

/// The exchange core: ledger, order registry, and one locked book per
/// symbol
///
/// A single `Exchange` value is shared across workers behind an `Arc`.
#[derive(Debug, Default)]
pub struct Exchange {
    ledger: Ledger,
    registry: OrderRegistry,
    books: DashMap<Symbol, Arc<Mutex<SymbolBook>>>,
    clock: Clock,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account with an initial balance
    pub fn create_account(&self, id: AccountId, balance: Decimal) -> Result<(), ExchangeError> {
        self.ledger.create_account(id, balance)
    }

    /// Register `symbol` if needed and grant `shares` to an account
    pub fn create_or_add_shares(
        &self,
        symbol: &Symbol,
        id: &AccountId,
        shares: Quantity,
    ) -> Result<(), ExchangeError> {
        self.ledger.create_or_add_shares(symbol, id, shares)
    }

    /// Accept a limit order
    ///
    /// `amount` follows the sign convention: positive buys, negative
    /// sells. Funds (buy) or shares (sell) are reserved before the order
    /// exists anywhere; if the reservation fails, nothing was registered
    /// and nothing reached the book. The accepted order then matches
    /// against the contra side under the symbol lock and any remainder
    /// is parked in the book.
    pub fn place_order(
        &self,
        account_id: &AccountId,
        symbol: &Symbol,
        amount: Decimal,
        limit: Decimal,
    ) -> Result<OrderId, ExchangeError> {
        if amount.is_zero() {
            return Err(ExchangeError::malformed("order amount must be non-zero"));
        }
        let limit = Price::try_new(limit)
            .ok_or_else(|| ExchangeError::malformed("limit price must be positive"))?;
        let side = if amount > Decimal::ZERO {
            Side::Buy
        } else {
            Side::Sell
        };
        let shares = Quantity::new(amount.abs());

        match side {
            Side::Buy => self
                .ledger
                .reserve_funds(account_id, limit.notional(shares))?,
            Side::Sell => self.ledger.reserve_shares(account_id, symbol, shares)?,
        }

        let book = self.book(symbol);
        let mut book = book.lock();

        let created_at = self.clock.now();
        let id = self.registry.register(
            account_id.clone(),
            symbol.clone(),
            side,
            limit,
            shares,
            created_at,
        );

        match side {
            Side::Buy => self.match_buy(&mut book, id, symbol),
            Side::Sell => self.match_sell(&mut book, id, symbol),
        }

        let remainder = self.registry.view(id).open_shares;
        if !remainder.is_zero() {
            book.insert(side, id, account_id.clone(), limit);
        }

        tracing::debug!(
            order = %id,
            account = %account_id,
            symbol = %symbol,
            ?side,
            %shares,
            %limit,
            %remainder,
            "order accepted"
        );
        Ok(id)
    }

    /// Status snapshot of an order, straight from the registry
    pub fn query(&self, order_id: OrderId) -> Result<Order, ExchangeError> {
        self.registry.get(order_id)
    }

    /// Cancel an order's open remainder and refund the unconsumed
    /// reservation
    ///
    /// The openness check happens under the symbol lock: whatever matched
    /// before the lock was acquired stays executed, and only the
    /// remainder at that instant is returned (funds at the original
    /// limit for buys, shares for sells).
    pub fn cancel(&self, order_id: OrderId) -> Result<Order, ExchangeError> {
        let snapshot = self.registry.get(order_id)?;
        let book = self.book(&snapshot.symbol);
        let mut book = book.lock();

        let time = self.clock.now();
        let record = self.registry.apply_cancel(order_id, time)?;

        let removed = book.remove(snapshot.side, order_id, snapshot.limit_price);
        assert!(removed, "open order {order_id} missing from its book");

        match snapshot.side {
            Side::Buy => self.ledger.refund_funds(
                &snapshot.account_id,
                snapshot.limit_price.notional(record.shares),
            ),
            Side::Sell => {
                self.ledger
                    .credit_shares(&snapshot.account_id, &snapshot.symbol, record.shares)
            }
        }

        tracing::debug!(
            order = %order_id,
            account = %snapshot.account_id,
            shares = %record.shares,
            "order canceled"
        );
        self.registry.get(order_id)
    }

    pub fn account_exists(&self, id: &AccountId) -> bool {
        self.ledger.has_account(id)
    }

    /// Current balance, if the account exists
    pub fn balance_of(&self, id: &AccountId) -> Option<Decimal> {
        self.ledger.balance_of(id)
    }

    /// Current position in `symbol`, if the account exists
    pub fn position_of(&self, id: &AccountId, symbol: &Symbol) -> Option<Quantity> {
        self.ledger.position_of(id, symbol)
    }

    /// Every symbol ever mentioned
    pub fn known_symbols(&self) -> Vec<Symbol> {
        self.ledger.known_symbols()
    }

    fn book(&self, symbol: &Symbol) -> Arc<Mutex<SymbolBook>> {
        self.books.entry(symbol.clone()).or_default().clone()
    }

    /// Match an incoming buy against the asks, best price first
    fn match_buy(&self, book: &mut SymbolBook, incoming_id: OrderId, symbol: &Symbol) {
        loop {
            let incoming = self.registry.view(incoming_id);
            if incoming.open_shares.is_zero() {
                break;
            }
            let Some((ask_price, entry)) = book.asks.best() else {
                break;
            };
            if !crossing::crosses(incoming.limit_price, ask_price) {
                break;
            }

            let resting = self.registry.view(entry.order_id);
            let time = self.clock.now();
            FillExecutor::new(&self.ledger, &self.registry)
                .execute(symbol, &incoming, &resting, time);

            if self.registry.view(entry.order_id).open_shares.is_zero() {
                book.asks.pop_best();
            }
        }
    }

    /// Match an incoming sell against the bids, best price first
    fn match_sell(&self, book: &mut SymbolBook, incoming_id: OrderId, symbol: &Symbol) {
        loop {
            let incoming = self.registry.view(incoming_id);
            if incoming.open_shares.is_zero() {
                break;
            }
            let Some((bid_price, entry)) = book.bids.best() else {
                break;
            };
            if !crossing::crosses(bid_price, incoming.limit_price) {
                break;
            }

            let resting = self.registry.view(entry.order_id);
            let time = self.clock.now();
            FillExecutor::new(&self.ledger, &self.registry)
                .execute(symbol, &incoming, &resting, time);

            if self.registry.view(entry.order_id).open_shares.is_zero() {
                book.bids.pop_best();
            }
        }
    }
}
