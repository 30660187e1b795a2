//! Leaderboard orchestration: validation, key resolution, once-per-scope
//! application, and query shaping.
//!
//! The service keeps no state of its own. Every call reads the current day
//! from the clock, resolves keys, and talks to the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use super::board::RankedBoard;
use super::keys::{KeyResolver, ResolvedKey, Scope};
use super::model::{
    ActorRank, BoardSummary, ClearReceipt, ProgressReceipt, RankedEntry, ScopeProgress,
    SubmitProgress,
};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{Result, ValidationError};
use crate::store::{KeyTtl, OrderedStore};
use crate::types::{ActorId, EventId};

pub const DEFAULT_TOP_LIMIT: i64 = 10;
pub const MAX_TOP_LIMIT: i64 = 100;
pub const DEFAULT_AROUND_RADIUS: i64 = 3;
pub const MAX_AROUND_RADIUS: i64 = 20;

fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> std::result::Result<u64, ValidationError> {
    match u64::try_from(value) {
        Ok(checked) if (min..=max).contains(&value) => Ok(checked),
        _ => Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        }),
    }
}

/// A validated progress event.
struct Progress {
    actor: ActorId,
    event: EventId,
    delta: f64,
    scopes: Vec<Scope>,
}

impl TryFrom<SubmitProgress> for Progress {
    type Error = ValidationError;

    fn try_from(request: SubmitProgress) -> std::result::Result<Self, Self::Error> {
        let actor = ActorId::parse(request.actor_id)?;
        let event = EventId::parse(request.event_id)?;
        if !request.delta.is_finite() || request.delta <= 0.0 {
            return Err(ValidationError::InvalidDelta(request.delta));
        }
        if request.scopes.is_empty() {
            return Err(ValidationError::NoScopes);
        }

        let mut scopes = Vec::with_capacity(request.scopes.len());
        for raw in &request.scopes {
            let scope: Scope = raw.parse()?;
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        Ok(Progress {
            actor,
            event,
            delta: request.delta,
            scopes,
        })
    }
}

/// Entry point for progress submission and leaderboard queries.
///
/// Cheap to clone; clones share the store and clock.
#[derive(Debug, Clone)]
pub struct LeaderboardService<S> {
    board: RankedBoard<S>,
    keys: KeyResolver,
    clock: Arc<dyn Clock>,
    dedup_ttl: Duration,
}

impl<S: OrderedStore> LeaderboardService<S> {
    pub fn new(store: S, config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        LeaderboardService {
            board: RankedBoard::new(store, config),
            keys: KeyResolver::new(config),
            clock,
            dedup_ttl: config.dedup_ttl,
        }
    }

    fn resolve(&self, scope: Scope) -> ResolvedKey {
        self.keys.resolve(scope, self.clock.today())
    }

    /// Applies one progress event to every requested scope, once per scope.
    ///
    /// Redelivering the same event id is harmless: scopes that already saw it
    /// report the current total with `applied == false`. A store failure
    /// aborts the remaining scopes; scopes already processed keep their
    /// contribution and a retry will skip them.
    #[instrument(skip(self, request), fields(actor = %request.actor_id, event = %request.event_id))]
    pub async fn submit(&self, request: SubmitProgress) -> Result<ProgressReceipt> {
        let progress = Progress::try_from(request)?;
        let today = self.clock.today();

        let mut results = Vec::with_capacity(progress.scopes.len());
        for scope in &progress.scopes {
            results.push(self.apply(&progress, *scope, today).await?);
        }

        Ok(ProgressReceipt {
            actor_id: progress.actor,
            event_id: progress.event.as_str().to_string(),
            results,
        })
    }

    async fn apply(&self, progress: &Progress, scope: Scope, today: NaiveDate) -> Result<ScopeProgress> {
        let resolved = self.keys.resolve(scope, today);
        let dedup = self.keys.dedup_key(scope, &progress.event);

        let outcome = self
            .board
            .increment_once(
                &resolved.key,
                &dedup,
                &progress.actor,
                progress.delta,
                self.dedup_ttl,
                resolved.retention,
            )
            .await?;
        let standing = self.board.rank_and_score(&resolved.key, &progress.actor).await?;

        if outcome.applied {
            info!(
                scope = %scope,
                aggregate = %resolved.key,
                delta = progress.delta,
                total = outcome.total,
                rank = standing.rank,
                "Applied progress"
            );
        } else {
            debug!(scope = %scope, aggregate = %resolved.key, "Duplicate event ignored");
        }

        Ok(ScopeProgress {
            scope,
            aggregate_key: resolved.key,
            total_score: outcome.total,
            rank: standing.rank,
            applied: outcome.applied,
        })
    }

    /// The best `limit` entries (1..=100) of the current window.
    #[instrument(skip(self))]
    pub async fn top(&self, scope: Scope, limit: i64) -> Result<Vec<RankedEntry>> {
        let n = in_range("limit", limit, 1, MAX_TOP_LIMIT)?;
        let resolved = self.resolve(scope);
        Ok(self.board.top_n(&resolved.key, n).await?)
    }

    /// Rank and score of `actor`, or rank -1 and score 0 if absent.
    #[instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn rank(&self, scope: Scope, actor: &ActorId) -> Result<ActorRank> {
        let resolved = self.resolve(scope);
        let standing = self.board.rank_and_score(&resolved.key, actor).await?;
        Ok(ActorRank {
            actor_id: actor.clone(),
            scope,
            rank: standing.rank,
            score: standing.score,
        })
    }

    /// Up to `radius` (0..=20) neighbours either side of `actor`, with
    /// absolute ranks. Empty if the actor has no score in this window.
    #[instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn around(&self, scope: Scope, actor: &ActorId, radius: i64) -> Result<Vec<RankedEntry>> {
        let radius = in_range("radius", radius, 0, MAX_AROUND_RADIUS)?;
        let resolved = self.resolve(scope);
        Ok(self.board.around(&resolved.key, actor, radius).await?)
    }

    /// Deletes the current window's aggregate.
    #[instrument(skip(self))]
    pub async fn clear(&self, scope: Scope) -> Result<ClearReceipt> {
        let resolved = self.resolve(scope);
        let cleared = self.board.clear(&resolved.key).await?;
        info!(aggregate = %resolved.key, cleared, "Cleared leaderboard");
        Ok(ClearReceipt {
            scope,
            aggregate_key: resolved.key,
            cleared,
        })
    }

    pub async fn member_count(&self, scope: Scope) -> Result<u64> {
        let resolved = self.resolve(scope);
        Ok(self.board.member_count(&resolved.key).await?)
    }

    /// Size and remaining retention of the current window.
    pub async fn describe(&self, scope: Scope) -> Result<BoardSummary> {
        let resolved = self.resolve(scope);
        let members = self.board.member_count(&resolved.key).await?;
        let expires_in_secs = match self.board.remaining_retention(&resolved.key).await? {
            KeyTtl::ExpiresIn(left) => Some(left.as_secs()),
            KeyTtl::Missing | KeyTtl::Persistent => None,
        };
        Ok(BoardSummary {
            scope,
            aggregate_key: resolved.key,
            members,
            expires_in_secs,
        })
    }
}
