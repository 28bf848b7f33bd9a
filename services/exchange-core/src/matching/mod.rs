//! Matching logic: price compatibility and atomic fill execution
//!
//! The match loop itself lives in the engine, which owns the symbol
//! locks; this module supplies the two pure decisions (do the limits
//! cross, and at whose price does the trade print) and the execution
//! step that moves funds and shares for one fill.

pub mod crossing;
pub mod executor;
