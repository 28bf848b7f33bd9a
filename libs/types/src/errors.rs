//! Error taxonomy for the exchange core
//!
//! Every recoverable failure a single request child can produce is a
//! distinct variant; the wire layer renders the message into the child's
//! `<error>` element without aborting siblings. `Internal` is reserved
//! for failures of the backing store and is fatal to the whole request.

use thiserror::Error;

/// Per-operation error taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Account {account_id} does not exist")]
    UnknownAccount { account_id: String },

    #[error("Account {account_id} already exists")]
    DuplicateAccount { account_id: String },

    #[error("Order {order_id} does not exist")]
    UnknownOrder { order_id: String },

    #[error("Order {order_id} has no open shares")]
    NotOpen { order_id: String },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("Insufficient shares of {symbol}")]
    InsufficientShares { symbol: String },

    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ExchangeError {
    /// Shorthand for a malformed-request error
    pub fn malformed(reason: impl Into<String>) -> Self {
        ExchangeError::MalformedRequest {
            reason: reason.into(),
        }
    }
}
