use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CartId, OrderId};
use tokio::sync::RwLock;

use super::Order;
use crate::Result;

/// Access to host orders.
///
/// The host storefront owns orders; implementations bridge to wherever it
/// keeps them.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Loads an order.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Finds the order placed from a cart.
    async fn find_by_cart(&self, cart_id: CartId) -> Result<Option<Order>>;

    /// Writes back an order's state and paid totals.
    async fn save(&self, order: &Order) -> Result<()>;
}

/// In-memory order repository for tests and standalone runs.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_cart(&self, cart_id: CartId) -> Result<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.cart_id == cart_id)
            .cloned())
    }

    async fn save(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }
}
