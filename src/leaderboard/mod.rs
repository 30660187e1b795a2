//! Ranked leaderboards with exactly-once score accumulation.
//!
//! - [`keys`] maps a scope and a date to an aggregate key and handles
//!   retention of time-partitioned aggregates.
//! - [`board`] runs the per-aggregate store operations.
//! - [`service`] validates requests and ties the two together.

pub mod board;
pub mod keys;
pub mod model;
pub mod service;

pub use board::RankedBoard;
pub use keys::{KeyResolver, ResolvedKey, Scope};
pub use model::{
    ActorRank, BoardSummary, ClearReceipt, ProgressReceipt, RankScore, RankedEntry,
    ScopeProgress, SubmitProgress,
};
pub use service::LeaderboardService;
