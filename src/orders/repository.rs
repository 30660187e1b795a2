//! Where orders are kept once created.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use super::Order;

/// Repository port for created orders.
pub trait OrderRepository: Send + Sync + fmt::Debug {
    fn insert(&self, order: Order);

    fn get(&self, id: &Uuid) -> Option<Order>;
}

/// Process-local order repository.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: Order) {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(order.order_id, order);
    }

    fn get(&self, id: &Uuid) -> Option<Order> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_orders() {
        let repo = InMemoryOrderRepository::new();
        let order = Order {
            order_id: Uuid::now_v7(),
            item_name: "Coffee".to_string(),
            amount: 2,
        };

        assert!(repo.is_empty());
        repo.insert(order.clone());

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get(&order.order_id), Some(order));
        assert_eq!(repo.get(&Uuid::now_v7()), None);
    }
}
