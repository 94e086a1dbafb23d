#![cfg(feature = "memory")]

use orders_repo::memory::InMemoryRepo;
use orders_types::domain::order::{Item, Order, OrderStatus};
use orders_types::ports::order_repository::{OrderRepository, RepoError};

fn sample_order() -> Order {
    Order::new(
        "user-1".into(),
        vec![Item {
            product_id: "widget".into(),
            quantity: 2,
            price: 5.0,
        }],
    )
    .unwrap()
}

#[tokio::test]
async fn memory_repo_create_get_update_flow() {
    let repo = InMemoryRepo::new();
    let order = sample_order();

    let created = repo.create(order.clone()).await.unwrap();
    assert_eq!(created.id, order.id);

    let fetched = repo.get(&order.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, "user-1");
    assert_eq!(fetched.total, 10.0);

    let listed = repo.list().await.unwrap();
    assert_eq!(listed.len(), 1);

    let mut paid = fetched.clone();
    paid.change_status(OrderStatus::Paid).unwrap();
    let updated = repo.update(paid, &fetched).await.unwrap().unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);

    let stored = repo.get(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);
}

#[tokio::test]
async fn memory_repo_rejects_duplicate_ids() {
    let repo = InMemoryRepo::new();
    let order = sample_order();
    repo.create(order.clone()).await.unwrap();
    assert!(repo.create(order).await.is_err());
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    let missing = repo.get("no-such-order").await.unwrap();
    assert!(missing.is_none());

    let order = sample_order();
    let updated = repo.update(order.clone(), &order).await.unwrap();
    assert!(updated.is_none());
    assert!(repo.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_repo_refuses_stale_writes() {
    let repo = InMemoryRepo::new();
    let loaded = repo.create(sample_order()).await.unwrap();

    let mut failed = loaded.clone();
    failed.change_status(OrderStatus::Failed).unwrap();
    repo.update(failed, &loaded).await.unwrap().unwrap();

    // second writer still holds the CREATED version
    let mut paid = loaded.clone();
    paid.change_status(OrderStatus::Paid).unwrap();
    let res = repo.update(paid, &loaded).await;
    assert!(matches!(res, Err(RepoError::Conflict(_))));

    let stored = repo.get(&loaded.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Failed);
}
