//! Leaderboard endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use crate::leaderboard::service::{DEFAULT_AROUND_RADIUS, DEFAULT_TOP_LIMIT};
use crate::leaderboard::{
    ActorRank, BoardSummary, ClearReceipt, ProgressReceipt, RankedEntry, Scope, SubmitProgress,
};
use crate::store::OrderedStore;
use crate::types::ActorId;

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    scope: String,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    scope: String,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AroundQuery {
    scope: String,
    #[serde(alias = "around")]
    radius: Option<i64>,
}

/// `POST /v1/leaderboard/progress`
pub async fn submit_progress<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SubmitProgress>, JsonRejection>,
) -> Result<Json<ProgressReceipt>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.leaderboard().submit(request).await?))
}

/// `GET /v1/leaderboard/top?scope=&limit=`
pub async fn top<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    let Query(query) = query?;
    let scope: Scope = query.scope.parse()?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(Json(state.leaderboard().top(scope, limit).await?))
}

/// `GET /v1/leaderboard/rank/{actor_id}?scope=`
pub async fn rank<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path(actor_id): Path<String>,
    query: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<ActorRank>, ApiError> {
    let Query(query) = query?;
    let scope: Scope = query.scope.parse()?;
    let actor = ActorId::parse(actor_id)?;
    Ok(Json(state.leaderboard().rank(scope, &actor).await?))
}

/// `GET /v1/leaderboard/around/{actor_id}?scope=&radius=`
pub async fn around<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    Path(actor_id): Path<String>,
    query: Result<Query<AroundQuery>, QueryRejection>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    let Query(query) = query?;
    let scope: Scope = query.scope.parse()?;
    let actor = ActorId::parse(actor_id)?;
    let radius = query.radius.unwrap_or(DEFAULT_AROUND_RADIUS);
    Ok(Json(state.leaderboard().around(scope, &actor, radius).await?))
}

/// `GET /v1/leaderboard/summary?scope=`
pub async fn summary<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<BoardSummary>, ApiError> {
    let Query(query) = query?;
    let scope: Scope = query.scope.parse()?;
    Ok(Json(state.leaderboard().describe(scope).await?))
}

/// `DELETE /v1/leaderboard/clear?scope=`
pub async fn clear<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    query: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<ClearReceipt>, ApiError> {
    let Query(query) = query?;
    let scope: Scope = query.scope.parse()?;
    Ok(Json(state.leaderboard().clear(scope).await?))
}
