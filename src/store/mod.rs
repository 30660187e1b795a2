//! The ordered key-value store the engine runs against.
//!
//! All durable state lives behind [`OrderedStore`]. The engine holds no copies:
//! every read is a fresh call, and every correctness guarantee rests on each
//! trait method being a single atomic operation on the store side.
//!
//! # Key families
//!
//! ```text
//! <key prefix><scope window>        ranked set (one per aggregate)
//! <dedup prefix><scope>:<event>     text marker "1" with TTL
//! <claim prefix><claim key>          reservation text with TTL
//! ```
//!
//! # Expiry
//!
//! Expiry is passive. An expired key behaves exactly like an absent one; no
//! background task is needed to reclaim it.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod memory;
pub mod ranked;

pub use error::{StoreError, StoreErrorKind};
pub use memory::MemoryStore;
pub use ranked::{RankedSet, Standing};

/// A member and its score, as returned by range reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

/// Outcome of an atomic create-if-absent on a text key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    /// The key did not exist and now holds the placeholder.
    Created,
    /// The key already existed; carries its current value.
    Existing(String),
}

/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    Missing,
    Persistent,
    ExpiresIn(Duration),
}

/// Outcome of [`OrderedStore::increment_once`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncrementOutcome {
    /// The member's score after the call.
    pub total: f64,
    /// True if this call created the dedup marker and applied the delta.
    pub applied: bool,
}

/// A contiguous slice of a ranked set, with the rank of its first member.
#[derive(Debug, Clone, PartialEq)]
pub struct RankWindow {
    pub start_rank: u64,
    pub members: Vec<ScoredMember>,
}

/// The atomic once-only increment request.
#[derive(Debug, Clone, Copy)]
pub struct IncrementOnce<'a> {
    pub aggregate_key: &'a str,
    pub dedup_key: &'a str,
    pub member: &'a str,
    pub delta: f64,
    pub dedup_ttl: Duration,
    /// Lifetime given to the aggregate if it has none yet. Never extends an
    /// existing deadline.
    pub retention: Option<Duration>,
}

/// Operations of the shared ordered store.
///
/// Every method is one round trip and one atomic step. In particular
/// [`increment_once`](OrderedStore::increment_once) must check the dedup key and
/// mutate the score in the same step; two separate calls would let a concurrent
/// duplicate slip in between.
pub trait OrderedStore: Send + Sync {
    /// Creates `key` with `placeholder` and `ttl` if absent, otherwise returns
    /// its current value.
    fn claim_or_get(
        &self,
        key: &str,
        placeholder: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<ClaimState, StoreError>> + Send;

    /// Sets `key` to `value` with `ttl`, overwriting any existing value.
    fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes `key`. Returns true if it existed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Returns the remaining lifetime of `key`.
    fn ttl(&self, key: &str) -> impl Future<Output = Result<KeyTtl, StoreError>> + Send;

    /// If the dedup key is absent, creates it with its TTL and adds `delta` to
    /// the member; otherwise leaves everything untouched and reports the
    /// member's current score (0 if absent).
    ///
    /// In the same step, an existing aggregate without a deadline receives
    /// `retention`, so a new time-partitioned aggregate is never left
    /// without one.
    fn increment_once(
        &self,
        request: IncrementOnce<'_>,
    ) -> impl Future<Output = Result<IncrementOutcome, StoreError>> + Send;

    /// Members at descending ranks `start..=stop`.
    fn rev_range(
        &self,
        key: &str,
        start: u64,
        stop: u64,
    ) -> impl Future<Output = Result<Vec<ScoredMember>, StoreError>> + Send;

    /// Descending rank and score of `member`, if present.
    fn rev_rank_and_score(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<Option<(u64, f64)>, StoreError>> + Send;

    /// Up to `radius` members either side of `member`, clipped at the
    /// boundaries, read in the same step as the member's rank.
    fn rev_range_around(
        &self,
        key: &str,
        member: &str,
        radius: u64,
    ) -> impl Future<Output = Result<Option<RankWindow>, StoreError>> + Send;

    /// Number of members in the ranked set at `key`.
    fn cardinality(&self, key: &str) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Runs one store call under a deadline.
///
/// An elapsed deadline becomes [`StoreErrorKind::Timeout`]: the call may still
/// have been committed.
pub async fn with_deadline<T, F>(
    deadline: Duration,
    op: &'static str,
    key: &str,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::new(op, key, StoreErrorKind::Timeout)),
    }
}
