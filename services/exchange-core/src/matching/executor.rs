//! Fill execution
//!
//! One fill settles in a single step under the symbol lock: the seller
//! is credited the notional, the buyer is credited the shares, the
//! buyer's reservation surplus (if any) is returned, and both orders
//! record the execution with identical shares, price, and time.

use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::order::Side;

use crate::ledger::Ledger;
use crate::registry::{OrderRegistry, OrderView};

/// The trade prints at the limit of whichever order was open first;
/// orders stamped the same second are ordered by ascending id.
pub(crate) fn execution_price(a: &OrderView, b: &OrderView) -> Price {
    if (a.created_at, a.id) <= (b.created_at, b.id) {
        a.limit_price
    } else {
        b.limit_price
    }
}

/// Executes single fills against ledger and registry
pub(crate) struct FillExecutor<'a> {
    ledger: &'a Ledger,
    registry: &'a OrderRegistry,
}

impl<'a> FillExecutor<'a> {
    pub fn new(ledger: &'a Ledger, registry: &'a OrderRegistry) -> Self {
        Self { ledger, registry }
    }

    /// Execute one fill between the incoming order and the best resting
    /// contra order, returning the number of shares moved
    ///
    /// Funds and shares were reserved when each order was accepted, so
    /// settlement only credits: the seller receives `price × shares`,
    /// the buyer receives the shares, and an incoming buyer filled below
    /// its limit gets the reservation difference back.
    pub fn execute(
        &self,
        symbol: &Symbol,
        incoming: &OrderView,
        resting: &OrderView,
        time: i64,
    ) -> Quantity {
        assert_eq!(
            incoming.side,
            resting.side.opposite(),
            "matched orders on the same side"
        );
        let shares = incoming.open_shares.min(resting.open_shares);
        assert!(!shares.is_zero(), "fill between exhausted orders");

        let price = execution_price(incoming, resting);
        let (buyer, seller) = match incoming.side {
            Side::Buy => (incoming, resting),
            Side::Sell => (resting, incoming),
        };

        self.ledger
            .credit_funds(&seller.account_id, price.notional(shares));
        self.ledger.credit_shares(&buyer.account_id, symbol, shares);

        if buyer.id == incoming.id && price < buyer.limit_price {
            // Acceptance reserved limit × amount; the trade consumed
            // only price × shares.
            let surplus = (buyer.limit_price - price) * shares.as_decimal();
            self.ledger.refund_funds(&buyer.account_id, surplus);
        } else {
            debug_assert_eq!(price, buyer.limit_price, "resting buyer filled off its limit");
        }

        self.registry.apply_fill(resting.id, shares, price, time);
        self.registry.apply_fill(incoming.id, shares, price, time);

        tracing::debug!(
            symbol = %symbol,
            buyer = %buyer.id,
            seller = %seller.id,
            %shares,
            %price,
            "fill executed"
        );
        shares
    }
}
