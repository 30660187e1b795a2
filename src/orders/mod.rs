//! Order placement guarded by a caller-supplied idempotency key.
//!
//! The first request for a key creates the order and records its id against
//! the key. Repeats within the claim window get the same order back instead of
//! a new one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod repository;
pub mod service;

pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: Uuid,
    pub item_name: String,
    pub amount: u32,
}

/// An order as requested by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub item_name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// True if the key had already produced an order.
    pub duplicated: bool,
    pub idempotency_key: String,
    pub order_id: String,
    pub item_name: String,
    pub amount: i64,
}
