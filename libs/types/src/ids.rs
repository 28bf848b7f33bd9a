//! Identifier types for exchange entities
//!
//! Account ids and symbols are client-supplied opaque strings, validated
//! once at the boundary and round-tripped verbatim on output. Order ids
//! are process-assigned monotonic integers; the id doubles as a
//! deterministic tie-breaker for orders stamped with the same second.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account
///
/// One or more base-10 digits, as supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId
    ///
    /// # Panics
    /// Panics if the id is empty or contains a non-digit character
    pub fn new(id: impl Into<String>) -> Self {
        Self::try_new(id).expect("account id must be one or more decimal digits")
    }

    /// Try to create an AccountId, returning None if invalid
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(s))
        } else {
            None
        }
    }

    /// Get the id string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbol identifying a tradable instrument
///
/// One or more alphanumeric characters (e.g. "SPY", "BTC2").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol
    ///
    /// # Panics
    /// Panics if the symbol is empty or contains a non-alphanumeric character
    pub fn new(sym: impl Into<String>) -> Self {
        Self::try_new(sym).expect("symbol must be one or more alphanumeric characters")
    }

    /// Try to create a Symbol, returning None if invalid
    pub fn try_new(sym: impl Into<String>) -> Option<Self> {
        let s = sym.into();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Some(Self(s))
        } else {
            None
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order
///
/// Assigned by the order registry from a single atomic counter, so ids are
/// strictly increasing in acceptance order across the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create from a raw counter value
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
