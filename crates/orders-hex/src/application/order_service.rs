use crate::errors::AppError;
use orders_types::domain::order::{Item, Order, OrderError, OrderStatus};
use orders_types::ports::order_repository::{OrderRepository, RepoError};

/// Drives the order lifecycle against a repository.
///
/// Each mutation is load, change, store. The store only succeeds if the record
/// is still the version that was loaded, so of two overlapping writers to the
/// same order one gets [`AppError::Conflict`] instead of overwriting the other.
pub struct OrderService<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn create_order(&self, user_id: String, items: Vec<Item>) -> Result<Order, AppError> {
        let order = Order::new(user_id, items)
            .and_then(|order| order.validate_create().map(|()| order))
            .map_err(|e| rejected("create", None, e))?;
        let order = self.repo.create(order).await?;
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = order.total,
            "order created"
        );
        Ok(order)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, AppError> {
        match self.repo.get(id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list().await?)
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, AppError> {
        let loaded = self.get_order(id).await?;
        let mut order = loaded.clone();
        order
            .change_status(status)
            .map_err(|e| rejected("status change", Some(id), e))?;
        let order = self.store(order, &loaded).await?;
        tracing::info!(order_id = %id, from = %loaded.status, to = %order.status, "order status changed");
        Ok(order)
    }

    pub async fn update_items(&self, id: &str, items: Vec<Item>) -> Result<Order, AppError> {
        let loaded = self.get_order(id).await?;
        let mut order = loaded.clone();
        order.replace_items(items);
        order
            .validate_update()
            .map_err(|e| rejected("items update", Some(id), e))?;
        let order = self.store(order, &loaded).await?;
        tracing::info!(order_id = %id, total = order.total, "order items replaced");
        Ok(order)
    }

    async fn store(&self, order: Order, loaded: &Order) -> Result<Order, AppError> {
        let id = order.id.clone();
        match self.repo.update(order, loaded).await {
            Ok(Some(order)) => Ok(order),
            Ok(None) => Err(AppError::NotFound(format!("order {}", id))),
            Err(e @ RepoError::Conflict(_)) => {
                tracing::warn!(order_id = %id, "order changed since it was loaded");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn rejected(action: &str, order_id: Option<&str>, err: OrderError) -> AppError {
    tracing::warn!(action, order_id = order_id.unwrap_or("-"), error = %err, "order rejected");
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(quantity: i32, price: f64) -> Item {
        Item {
            product_id: "widget".into(),
            quantity,
            price,
        }
    }

    #[tokio::test]
    async fn create_and_get_order_in_memory() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let res = svc.create_order("alice".into(), vec![widget(2, 5.0)]).await;
        assert!(res.is_ok());
        let order = res.unwrap();
        assert_eq!(order.status, OrderStatus::Created);
        let got = svc.get_order(&order.id).await.unwrap();
        assert_eq!(got.user_id, "alice");
        assert_eq!(got.total, 10.0);
    }

    #[tokio::test]
    async fn status_walks_the_lifecycle() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let order = svc
            .create_order("bob".into(), vec![widget(1, 2.5)])
            .await
            .unwrap();

        for next in [OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Completed] {
            let updated = svc.update_status(&order.id, next).await.unwrap();
            assert_eq!(updated.status, next);
        }
        let stored = svc.get_order(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn rejected_transition_is_a_conflict_and_changes_nothing() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let order = svc
            .create_order("carol".into(), vec![widget(1, 2.5)])
            .await
            .unwrap();

        let res = svc.update_status(&order.id, OrderStatus::Shipped).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
        let res = svc.update_status(&order.id, OrderStatus::Created).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));

        let stored = svc.get_order(&order.id).await.unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn update_items_recomputes_total() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let order = svc
            .create_order("dave".into(), vec![widget(1, 2.5)])
            .await
            .unwrap();

        let updated = svc
            .update_items(&order.id, vec![widget(2, 10.0), widget(1, 5.0)])
            .await
            .unwrap();
        assert_eq!(updated.total, 25.0);
        assert!(updated.updated_at > order.updated_at);

        let res = svc.update_items(&order.id, vec![]).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        let stored = svc.get_order(&order.id).await.unwrap();
        assert_eq!(stored.total, 25.0);
    }

    #[tokio::test]
    async fn terminal_orders_cannot_be_updated() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let order = svc
            .create_order("erin".into(), vec![widget(1, 2.5)])
            .await
            .unwrap();
        svc.update_status(&order.id, OrderStatus::Failed)
            .await
            .unwrap();

        let res = svc.update_items(&order.id, vec![widget(3, 1.0)]).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
        let res = svc.update_status(&order.id, OrderStatus::Paid).await;
        assert!(matches!(res, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn validation_errors_propagate() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let res = svc.create_order("".into(), vec![widget(1, 1.0)]).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        let res = svc.create_order("frank".into(), vec![]).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        let res = svc.create_order("frank".into(), vec![widget(0, 1.0)]).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        let res = svc.create_order("frank".into(), vec![widget(2, 1e308)]).await;
        assert!(
            matches!(res, Err(AppError::BadRequest(ref m)) if m == "order total is too large to represent")
        );
        assert!(svc.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_found_paths() {
        let repo = orders_repo::memory::InMemoryRepo::new();
        let svc = OrderService::new(repo.clone());
        let missing = svc.get_order("missing").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let updated = svc.update_status("missing", OrderStatus::Paid).await;
        assert!(matches!(updated, Err(AppError::NotFound(_))));

        let updated = svc.update_items("missing", vec![widget(1, 1.0)]).await;
        assert!(matches!(updated, Err(AppError::NotFound(_))));
    }
}
