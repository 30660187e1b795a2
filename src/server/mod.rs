//! HTTP surface of the leaderboard engine.
//!
//! # Endpoints
//!
//! - `POST /v1/leaderboard/progress` - Applies a progress event once per scope
//! - `GET /v1/leaderboard/top?scope=&limit=` - Best entries of a scope (limit 1..=100, default 10)
//! - `GET /v1/leaderboard/rank/{actor_id}?scope=` - Rank and score of one actor
//! - `GET /v1/leaderboard/around/{actor_id}?scope=&radius=` - Neighbours of an actor (radius 0..=20, default 3)
//! - `GET /v1/leaderboard/summary?scope=` - Member count and remaining retention
//! - `DELETE /v1/leaderboard/clear?scope=` - Deletes the current window of a scope
//! - `POST /idem/orders` - Places an order once per `Idempotency-Key`
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::leaderboard::LeaderboardService;
use crate::orders::{OrderRepository, OrderService};
use crate::store::OrderedStore;

pub mod error;
pub mod health;
pub mod leaderboard;
pub mod orders;

pub use error::ApiError;
pub use health::health_handler;

/// Shared application state, passed to handlers via axum's `State` extractor.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    leaderboard: LeaderboardService<S>,
    orders: OrderService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OrderedStore + Clone> AppState<S> {
    pub fn new(
        store: S,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
        repository: Arc<dyn OrderRepository>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                leaderboard: LeaderboardService::new(store.clone(), config, clock),
                orders: OrderService::new(store, config, repository),
            }),
        }
    }

    pub fn leaderboard(&self) -> &LeaderboardService<S> {
        &self.inner.leaderboard
    }

    pub fn orders(&self) -> &OrderService<S> {
        &self.inner.orders
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<S: OrderedStore + Clone + 'static>(app_state: AppState<S>) -> Router {
    Router::new()
        .route("/v1/leaderboard/progress", post(leaderboard::submit_progress::<S>))
        .route("/v1/leaderboard/top", get(leaderboard::top::<S>))
        .route("/v1/leaderboard/rank/{actor_id}", get(leaderboard::rank::<S>))
        .route("/v1/leaderboard/around/{actor_id}", get(leaderboard::around::<S>))
        .route("/v1/leaderboard/summary", get(leaderboard::summary::<S>))
        .route("/v1/leaderboard/clear", delete(leaderboard::clear::<S>))
        .route("/idem/orders", post(orders::place_order::<S>))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
