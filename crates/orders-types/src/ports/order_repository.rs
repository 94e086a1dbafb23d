use async_trait::async_trait;

use crate::domain::order::Order;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),

    /// A stored record could not be decoded back into an [`Order`].
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The stored record changed after it was loaded.
    #[error("order {0} was modified concurrently")]
    Conflict(String),
}

/// Storage for orders. Records are created once and replaced wholesale on
/// update; there is no delete.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create(&self, order: Order) -> Result<Order, RepoError>;
    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError>;
    async fn list(&self) -> Result<Vec<Order>, RepoError>;
    /// Replaces the record `loaded` was read from, provided its `status` and
    /// `updated_at` are still what `loaded` holds. `None` when no order has
    /// this id, [`RepoError::Conflict`] when the stored record has moved on.
    async fn update(&self, order: Order, loaded: &Order) -> Result<Option<Order>, RepoError>;
}

/// `true` when `stored` is still the version `loaded` was read from.
pub fn is_same_version(stored: &Order, loaded: &Order) -> bool {
    stored.status == loaded.status && stored.updated_at == loaded.updated_at
}
