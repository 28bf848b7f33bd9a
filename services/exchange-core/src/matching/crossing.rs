//! Crossing detection
//!
//! A buy and a sell are compatible iff the buy limit is at or above the
//! sell limit; the admissible execution price range is then
//! `[sell.limit, buy.limit]`.

use types::numeric::Price;
use types::order::Side;

/// Check whether a bid and an ask can trade
pub fn crosses(bid_limit: Price, ask_limit: Price) -> bool {
    bid_limit >= ask_limit
}

/// Check whether an incoming order crosses a resting contra order
pub fn incoming_crosses(incoming_side: Side, incoming_limit: Price, resting_limit: Price) -> bool {
    match incoming_side {
        Side::Buy => crosses(incoming_limit, resting_limit),
        Side::Sell => crosses(resting_limit, incoming_limit),
    }
}
