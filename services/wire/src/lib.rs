//! Wire boundary for the exchange
//!
//! Translates the XML request/response grammar into a strongly typed
//! algebra, dispatches bundles against the core, and speaks the
//! length-prefixed framing used on the TCP connection. Structural
//! failures (bad XML, missing attributes) reject the whole document;
//! per-child failures (bad numbers, core errors) become per-child
//! `<error>` elements and never disturb sibling children.

pub mod framing;
pub mod handler;
pub mod request;
pub mod response;

use thiserror::Error;

/// Boundary-layer errors
#[derive(Error, Debug)]
pub enum WireError {
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("frame error: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        WireError::Malformed(reason.into())
    }
}
