//! Liveness probe.
//!
//! Reports that the process is serving requests. It does not touch the store,
//! so a healthy response says nothing about store availability.

use axum::http::StatusCode;

/// Returns 200 with the text "OK".
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
