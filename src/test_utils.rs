//! Shared fixtures and arbitrary generators for tests.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;

use crate::clock::ManualClock;
use crate::config::EngineConfig;
use crate::leaderboard::{LeaderboardService, SubmitProgress};
use crate::store::MemoryStore;
use crate::types::ActorId;

/// A service, its store, and the clock both of them read, frozen at
/// 2025-09-09 00:00 UTC (a Tuesday in ISO week 37).
pub struct Fixture {
    pub service: LeaderboardService<MemoryStore>,
    pub store: MemoryStore,
    pub clock: ManualClock,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = ManualClock::at_date(fixture_date());
        let store = MemoryStore::new(Arc::new(clock.clone()));
        let service = LeaderboardService::new(store.clone(), &config, Arc::new(clock.clone()));
        Fixture {
            service,
            store,
            clock,
        }
    }
}

pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 9).unwrap()
}

pub fn actor(id: &str) -> ActorId {
    ActorId::parse(id).unwrap()
}

pub fn progress(actor: &str, delta: f64, event: &str, scopes: &[&str]) -> SubmitProgress {
    SubmitProgress {
        actor_id: actor.to_string(),
        delta,
        event_id: event.to_string(),
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn arb_actor_id() -> impl Strategy<Value = ActorId> {
    "[a-z][a-z0-9_-]{0,15}".prop_map(|s| ActorId::parse(s).unwrap())
}

/// Deltas with exact binary sums, so totals can be compared with `==`.
pub fn arb_delta() -> impl Strategy<Value = f64> {
    (1u32..=400).prop_map(|quarters| f64::from(quarters) / 4.0)
}
