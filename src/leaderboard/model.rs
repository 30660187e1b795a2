//! Request and result shapes of the leaderboard service.
//!
//! Everything here serializes as camelCase JSON, which is what the HTTP
//! surface sends and receives.

use serde::{Deserialize, Serialize};

use super::keys::Scope;
use crate::types::{ActorId, AggregateKey};

/// One position on a leaderboard. `rank` is 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: u64,
    pub actor_id: ActorId,
    pub score: f64,
}

/// Rank and score of one member; `rank` is -1 and `score` 0 when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankScore {
    pub rank: i64,
    pub score: f64,
}

impl RankScore {
    pub const ABSENT: RankScore = RankScore {
        rank: -1,
        score: 0.0,
    };
}

/// A progress event as submitted by a caller, before validation.
///
/// `userId` and `deltaKm` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProgress {
    #[serde(alias = "userId")]
    pub actor_id: String,
    #[serde(alias = "deltaKm")]
    pub delta: f64,
    pub event_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Result of applying one event to one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeProgress {
    pub scope: Scope,
    pub aggregate_key: AggregateKey,
    pub total_score: f64,
    pub rank: i64,
    /// False if the event had already been applied to this aggregate.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReceipt {
    pub actor_id: ActorId,
    pub event_id: String,
    pub results: Vec<ScopeProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRank {
    pub actor_id: ActorId,
    pub scope: Scope,
    pub rank: i64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReceipt {
    pub scope: Scope,
    pub aggregate_key: AggregateKey,
    pub cleared: bool,
}

/// Size and remaining retention of the current aggregate for a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub scope: Scope,
    pub aggregate_key: AggregateKey,
    pub members: u64,
    /// `None` for all-time boards and for boards that do not exist yet.
    pub expires_in_secs: Option<u64>,
}
