//! In-process implementation of [`OrderedStore`].
//!
//! Each operation takes the keyspace lock once, runs to completion, and
//! releases it before yielding, so every call is atomic with respect to every
//! other call on any clone of the same store. Expired keys are purged lazily
//! when an operation touches them.
//!
//! The store also supports fault injection (unavailability and delayed
//! replies) so callers can exercise their timeout and failure paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::{
    ClaimState, IncrementOnce, IncrementOutcome, KeyTtl, OrderedStore, RankWindow, RankedSet,
    ScoredMember, StoreError, StoreErrorKind,
};
use crate::clock::{Clock, SystemClock};

/// Value stored under a dedup key.
const DEDUP_MARKER: &str = "1";

#[derive(Debug)]
enum Value {
    Text(String),
    Ranked(RankedSet),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Entry {
            value,
            expires_at: None,
        }
    }

    fn expiring(value: Value, expires_at: DateTime<Utc>) -> Self {
        Entry {
            value,
            expires_at: Some(expires_at),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    unavailable: bool,
    response_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    /// Recency counter stamped on every applied increment.
    next_sequence: u64,
    faults: Faults,
}

impl Keyspace {
    fn purge_if_expired(&mut self, key: &str, now: DateTime<Utc>) {
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    fn text(&self, key: &str) -> Result<Option<String>, StoreErrorKind> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(StoreErrorKind::WrongType),
        }
    }

    fn ranked(&self, key: &str) -> Result<Option<&RankedSet>, StoreErrorKind> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Ranked(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(StoreErrorKind::WrongType),
        }
    }

    fn ranked_or_create(&mut self, key: &str) -> Result<&mut RankedSet, StoreErrorKind> {
        let entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| Entry::persistent(Value::Ranked(RankedSet::new())));
        match &mut entry.value {
            Value::Ranked(set) => Ok(set),
            Value::Text(_) => Err(StoreErrorKind::WrongType),
        }
    }

    fn assign_retention_if_unset(&mut self, key: &str, expires_at: Option<DateTime<Utc>>) {
        let Some(expires_at) = expires_at else {
            return;
        };
        match self.entries.get_mut(key) {
            Some(entry) if entry.expires_at.is_none() => entry.expires_at = Some(expires_at),
            _ => {}
        }
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, StoreErrorKind> {
    if ttl.is_zero() {
        return Err(StoreErrorKind::InvalidValue);
    }
    let delta = TimeDelta::from_std(ttl).map_err(|_| StoreErrorKind::InvalidValue)?;
    now.checked_add_signed(delta)
        .ok_or(StoreErrorKind::InvalidValue)
}

/// A shared in-memory ordered store. Clones are handles to the same keyspace.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    keyspace: Arc<Mutex<Keyspace>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    /// Creates an empty store whose expiry follows `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemoryStore {
            keyspace: Arc::new(Mutex::new(Keyspace::default())),
            clock,
        }
    }

    /// Makes every subsequent call fail with [`StoreErrorKind::Unavailable`]
    /// without executing.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock_faults(|faults| faults.unavailable = unavailable);
    }

    /// Delays every reply by `delay` after the operation has been applied.
    pub fn set_response_delay(&self, delay: Option<Duration>) {
        self.lock_faults(|faults| faults.response_delay = delay);
    }

    fn lock_faults(&self, update: impl FnOnce(&mut Faults)) {
        let mut keyspace = self.keyspace.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut keyspace.faults);
    }

    async fn execute<T>(
        &self,
        op: &'static str,
        key: &str,
        apply: impl FnOnce(&mut Keyspace, DateTime<Utc>) -> Result<T, StoreErrorKind>,
    ) -> Result<T, StoreError> {
        let (outcome, delay) = {
            let mut keyspace = self
                .keyspace
                .lock()
                .map_err(|_| StoreError::new(op, key, StoreErrorKind::Unavailable))?;
            if keyspace.faults.unavailable {
                return Err(StoreError::new(op, key, StoreErrorKind::Unavailable));
            }
            let now = self.clock.now();
            (apply(&mut keyspace, now), keyspace.faults.response_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome.map_err(|kind| StoreError::new(op, key, kind))
    }
}

impl OrderedStore for MemoryStore {
    async fn claim_or_get(
        &self,
        key: &str,
        placeholder: &str,
        ttl: Duration,
    ) -> Result<ClaimState, StoreError> {
        self.execute("CLAIM_OR_GET", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            if let Some(existing) = keyspace.text(key)? {
                return Ok(ClaimState::Existing(existing));
            }
            let expires_at = expiry(now, ttl)?;
            keyspace.entries.insert(
                key.to_owned(),
                Entry::expiring(Value::Text(placeholder.to_owned()), expires_at),
            );
            Ok(ClaimState::Created)
        })
        .await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.execute("SET", key, |keyspace, now| {
            let expires_at = expiry(now, ttl)?;
            keyspace.entries.insert(
                key.to_owned(),
                Entry::expiring(Value::Text(value.to_owned()), expires_at),
            );
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.execute("DELETE", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            Ok(keyspace.entries.remove(key).is_some())
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        self.execute("TTL", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            Ok(match keyspace.entries.get(key) {
                None => KeyTtl::Missing,
                Some(Entry {
                    expires_at: None, ..
                }) => KeyTtl::Persistent,
                Some(Entry {
                    expires_at: Some(at),
                    ..
                }) => KeyTtl::ExpiresIn((*at - now).to_std().unwrap_or(Duration::ZERO)),
            })
        })
        .await
    }

    async fn increment_once(&self, request: IncrementOnce<'_>) -> Result<IncrementOutcome, StoreError> {
        self.execute("INCREMENT_ONCE", request.aggregate_key, |keyspace, now| {
            if !request.delta.is_finite() {
                return Err(StoreErrorKind::InvalidValue);
            }
            let marker_expires_at = expiry(now, request.dedup_ttl)?;
            let retention_expires_at = request
                .retention
                .map(|ttl| expiry(now, ttl))
                .transpose()?;
            keyspace.purge_if_expired(request.aggregate_key, now);
            keyspace.purge_if_expired(request.dedup_key, now);

            // Type-check the aggregate before the marker exists, so a rejected
            // call leaves nothing behind.
            let current = keyspace
                .ranked(request.aggregate_key)?
                .and_then(|set| set.score(request.member));

            if keyspace.entries.contains_key(request.dedup_key) {
                keyspace.assign_retention_if_unset(request.aggregate_key, retention_expires_at);
                return Ok(IncrementOutcome {
                    total: current.unwrap_or(0.0),
                    applied: false,
                });
            }

            keyspace.entries.insert(
                request.dedup_key.to_owned(),
                Entry::expiring(Value::Text(DEDUP_MARKER.to_owned()), marker_expires_at),
            );
            let sequence = keyspace.next_sequence();
            let total = keyspace
                .ranked_or_create(request.aggregate_key)?
                .increment(request.member, request.delta, sequence);
            keyspace.assign_retention_if_unset(request.aggregate_key, retention_expires_at);
            Ok(IncrementOutcome {
                total,
                applied: true,
            })
        })
        .await
    }

    async fn rev_range(&self, key: &str, start: u64, stop: u64) -> Result<Vec<ScoredMember>, StoreError> {
        self.execute("REV_RANGE", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            Ok(keyspace
                .ranked(key)?
                .map(|set| set.window(start, stop))
                .unwrap_or_default())
        })
        .await
    }

    async fn rev_rank_and_score(&self, key: &str, member: &str) -> Result<Option<(u64, f64)>, StoreError> {
        self.execute("REV_RANK_SCORE", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            Ok(keyspace
                .ranked(key)?
                .and_then(|set| Some((set.rank(member)?, set.score(member)?))))
        })
        .await
    }

    async fn rev_range_around(
        &self,
        key: &str,
        member: &str,
        radius: u64,
    ) -> Result<Option<RankWindow>, StoreError> {
        self.execute("REV_RANGE_AROUND", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            let Some(set) = keyspace.ranked(key)? else {
                return Ok(None);
            };
            let Some(rank) = set.rank(member) else {
                return Ok(None);
            };
            let start = rank.saturating_sub(radius);
            let stop = rank.saturating_add(radius);
            Ok(Some(RankWindow {
                start_rank: start,
                members: set.window(start, stop),
            }))
        })
        .await
    }

    async fn cardinality(&self, key: &str) -> Result<u64, StoreError> {
        self.execute("CARDINALITY", key, |keyspace, now| {
            keyspace.purge_if_expired(key, now);
            Ok(keyspace.ranked(key)?.map_or(0, RankedSet::len))
        })
        .await
    }
}
