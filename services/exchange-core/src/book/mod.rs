//! Per-symbol order book
//!
//! Two sides holding only open orders: as soon as an order's remainder
//! reaches zero or it is canceled, it leaves the book. Both sides of one
//! symbol are guarded by a single lock owned by the engine.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::LevelEntry;

use types::ids::{AccountId, OrderId};
use types::numeric::Price;
use types::order::Side;

/// Both sides of one symbol's book
#[derive(Debug, Clone, Default)]
pub struct SymbolBook {
    pub bids: BidBook,
    pub asks: AskBook,
}

impl SymbolBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park an open order on its own side
    pub fn insert(&mut self, side: Side, order_id: OrderId, account_id: AccountId, price: Price) {
        match side {
            Side::Buy => self.bids.insert(order_id, account_id, price),
            Side::Sell => self.asks.insert(order_id, account_id, price),
        }
    }

    /// Remove an order from its own side
    pub fn remove(&mut self, side: Side, order_id: OrderId, price: Price) -> bool {
        match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove_by_side() {
        let mut book = SymbolBook::new();
        let acct = AccountId::new("1");

        book.insert(Side::Buy, OrderId::from_u64(1), acct.clone(), Price::from_u64(125));
        book.insert(Side::Sell, OrderId::from_u64(2), acct, Price::from_u64(130));

        assert_eq!(book.bids.order_count(), 1);
        assert_eq!(book.asks.order_count(), 1);

        assert!(book.remove(Side::Buy, OrderId::from_u64(1), Price::from_u64(125)));
        assert!(!book.remove(Side::Sell, OrderId::from_u64(2), Price::from_u64(128)));
        assert!(book.remove(Side::Sell, OrderId::from_u64(2), Price::from_u64(130)));
    }
}
