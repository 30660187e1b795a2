//! Idempotent order endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};

use super::AppState;
use super::error::ApiError;
use crate::error::ValidationError;
use crate::orders::{OrderReceipt, OrderRequest};
use crate::store::OrderedStore;
use crate::types::ClaimKey;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// `POST /idem/orders`
///
/// Requires an `Idempotency-Key` header. Responds 201 when the order is
/// created and 200 when the key already produced one.
pub async fn place_order<S: OrderedStore + Clone + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderReceipt>), ApiError> {
    let raw = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .ok_or(ValidationError::MissingHeader {
            name: "Idempotency-Key",
        })?
        .to_str()
        .map_err(|_| ApiError::BadRequest("Idempotency-Key must be visible ASCII".to_string()))?;
    let key = ClaimKey::parse(raw)?;
    let Json(request) = payload?;

    let receipt = state.orders().place_order(&key, request).await?;
    let status = if receipt.duplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(receipt)))
}
