//! Leaderboard Engine - ranked leaderboards with exactly-once score accumulation.
//!
//! Progress events carry an external event id. Each event is applied to every
//! scope it targets (all-time, weekly, daily) exactly once, however often it
//! is delivered, and the boards answer top-N, rank, and around-me queries.
//! All state lives in an [`store::OrderedStore`]; the engine itself is
//! stateless.

pub mod clock;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod leaderboard;
pub mod orders;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{EngineError, Result, ValidationError};
