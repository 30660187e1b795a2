//! Single-key idempotency guard.
//!
//! A reservation record moves from [`PENDING`] to a final value exactly once:
//!
//! ```text
//! try_claim(k)   absent  → create "PENDING" with TTL → First
//!                present → AlreadyClaimed(value)
//! complete(k, v)         → overwrite with v, TTL refreshed to the same window
//! ```
//!
//! The check-and-create is one atomic store call. There is no release: a
//! claimant that dies between `First` and `complete` leaves a pending record
//! that expires after the TTL, after which the key can be claimed again. The
//! business side effect behind a claim is therefore at-least-once across that
//! window, while the record itself is exactly-once within it.

use std::time::Duration;

use tracing::debug;

use crate::config::EngineConfig;
use crate::store::{ClaimState, OrderedStore, StoreError, with_deadline};
use crate::types::ClaimKey;

/// Placeholder value of a reservation that has not been completed.
pub const PENDING: &str = "PENDING";

/// Result of [`IdempotencyGuard::try_claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller owns the key and must call `complete`.
    First,
    /// Someone else claimed the key; carries the stored value.
    AlreadyClaimed(String),
}

impl ClaimOutcome {
    pub fn is_first(&self) -> bool {
        matches!(self, ClaimOutcome::First)
    }

    /// True if the key is claimed but the holder has not completed it.
    pub fn is_pending(&self) -> bool {
        matches!(self, ClaimOutcome::AlreadyClaimed(value) if value == PENDING)
    }
}

/// Claim-and-complete over reservation records in the shared store.
#[derive(Debug, Clone)]
pub struct IdempotencyGuard<S> {
    store: S,
    prefix: String,
    ttl: Duration,
    deadline: Duration,
}

impl<S: OrderedStore> IdempotencyGuard<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        IdempotencyGuard {
            store,
            prefix: config.claim_prefix.clone(),
            ttl: config.claim_ttl,
            deadline: config.store_timeout,
        }
    }

    fn record_key(&self, key: &ClaimKey) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Atomically claims `key` or reports who got there first.
    pub async fn try_claim(&self, key: &ClaimKey) -> Result<ClaimOutcome, StoreError> {
        let record = self.record_key(key);
        let state = with_deadline(
            self.deadline,
            "CLAIM_OR_GET",
            &record,
            self.store.claim_or_get(&record, PENDING, self.ttl),
        )
        .await?;

        Ok(match state {
            ClaimState::Created => {
                debug!(claim_key = %key, "First claim");
                ClaimOutcome::First
            }
            ClaimState::Existing(value) => {
                debug!(claim_key = %key, existing = %value, "Duplicate claim");
                ClaimOutcome::AlreadyClaimed(value)
            }
        })
    }

    /// Records the final value for a claim and refreshes its TTL.
    ///
    /// Only the caller that received [`ClaimOutcome::First`] calls this. If the
    /// reservation already expired the record is recreated with `value`, so
    /// later duplicates still observe the result.
    pub async fn complete(&self, key: &ClaimKey, value: &str) -> Result<(), StoreError> {
        let record = self.record_key(key);
        with_deadline(
            self.deadline,
            "SET",
            &record,
            self.store.set_with_ttl(&record, value, self.ttl),
        )
        .await?;
        debug!(claim_key = %key, result = %value, "Claim completed");
        Ok(())
    }
}
