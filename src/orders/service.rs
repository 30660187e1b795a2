use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Order, OrderReceipt, OrderRepository, OrderRequest};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result, ValidationError};
use crate::idempotency::{ClaimOutcome, IdempotencyGuard, PENDING};
use crate::store::OrderedStore;
use crate::types::ClaimKey;

/// Places orders at most once per idempotency key.
///
/// The guard decides who may create the order; the repository holds the
/// orders themselves.
#[derive(Debug, Clone)]
pub struct OrderService<S> {
    guard: IdempotencyGuard<S>,
    repository: Arc<dyn OrderRepository>,
}

fn validate(request: &OrderRequest) -> std::result::Result<u32, ValidationError> {
    if request.item_name.trim().is_empty() {
        return Err(ValidationError::Blank { field: "item_name" });
    }
    match u32::try_from(request.amount) {
        Ok(amount) if amount >= 1 => Ok(amount),
        _ => Err(ValidationError::OutOfRange {
            field: "amount",
            min: 1,
            max: i64::from(u32::MAX),
            value: request.amount,
        }),
    }
}

impl<S: OrderedStore> OrderService<S> {
    pub fn new(store: S, config: &EngineConfig, repository: Arc<dyn OrderRepository>) -> Self {
        OrderService {
            guard: IdempotencyGuard::new(store, config),
            repository,
        }
    }

    /// Places an order at most once per `key` within the claim window.
    ///
    /// A repeat of a completed key returns the original order id with
    /// `duplicated == true`. A repeat that arrives while the first request is
    /// still running gets [`EngineError::ClaimInFlight`].
    #[instrument(skip(self, key, request), fields(claim_key = %key))]
    pub async fn place_order(&self, key: &ClaimKey, request: OrderRequest) -> Result<OrderReceipt> {
        let amount = validate(&request)?;

        match self.guard.try_claim(key).await? {
            ClaimOutcome::First => {
                let order = Order {
                    order_id: Uuid::now_v7(),
                    item_name: request.item_name,
                    amount,
                };
                self.repository.insert(order.clone());
                self.guard.complete(key, &order.order_id.to_string()).await?;
                info!(order_id = %order.order_id, "Created order");

                Ok(OrderReceipt {
                    duplicated: false,
                    idempotency_key: key.to_string(),
                    order_id: order.order_id.to_string(),
                    item_name: order.item_name,
                    amount: i64::from(order.amount),
                })
            }
            ClaimOutcome::AlreadyClaimed(existing) if existing == PENDING => {
                warn!("Order request arrived while the first one is still running");
                Err(EngineError::ClaimInFlight {
                    key: key.to_string(),
                })
            }
            ClaimOutcome::AlreadyClaimed(order_id) => {
                info!(order_id = %order_id, "Returning existing order");
                let stored = order_id
                    .parse::<Uuid>()
                    .ok()
                    .and_then(|id| self.repository.get(&id));
                let (item_name, amount) = match stored {
                    Some(order) => (order.item_name, i64::from(order.amount)),
                    None => (request.item_name, request.amount),
                };

                Ok(OrderReceipt {
                    duplicated: true,
                    idempotency_key: key.to_string(),
                    order_id,
                    item_name,
                    amount,
                })
            }
        }
    }
}
