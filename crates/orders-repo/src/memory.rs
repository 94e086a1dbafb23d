use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use orders_types::domain::order::Order;
use orders_types::ports::order_repository::{is_same_version, OrderRepository, RepoError};
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub map: Arc<DashMap<String, Order>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            map: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        match self.map.entry(order.id.clone()) {
            Entry::Occupied(_) => Err(RepoError::DbError(format!(
                "order {} already exists",
                order.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(order)
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError> {
        Ok(self.map.get(id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let mut orders: Vec<Order> = self.map.iter().map(|kv| kv.value().clone()).collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn update(&self, order: Order, loaded: &Order) -> Result<Option<Order>, RepoError> {
        // the shard lock held by get_mut makes check-and-replace atomic
        if let Some(mut v) = self.map.get_mut(&order.id) {
            if !is_same_version(&v, loaded) {
                return Err(RepoError::Conflict(order.id));
            }
            *v = order.clone();
            return Ok(Some(order));
        }
        Ok(None)
    }
}
