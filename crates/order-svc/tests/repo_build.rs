use orders_repo::{build_repo, Repo};
use orders_types::domain::order::{Item, Order, OrderStatus};
use orders_types::ports::order_repository::OrderRepository;

fn sample_order() -> Order {
    Order::new(
        "user-1".into(),
        vec![Item {
            product_id: "widget".into(),
            quantity: 1,
            price: 9.99,
        }],
    )
    .unwrap()
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn builds_sqlite_repo_from_url() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("orders-test.db");
    let url = format!("sqlite://{}", db_path.display());

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    assert!(matches!(repo, Repo::Sqlite(_)));
    let list = repo.list().await.expect("list");
    assert!(list.is_empty());

    let order = repo.create(sample_order()).await.unwrap();
    drop(repo);

    // a second handle on the same file sees the stored order
    let reopened = build_repo(Some(&url)).await.expect("reopen repo");
    let stored = reopened.get(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Created);
    assert_eq!(stored.total, 9.99);
}

#[cfg(feature = "memory")]
#[tokio::test]
async fn builds_memory_repo_without_url() {
    let repo: Repo = build_repo(None).await.expect("build repo");
    assert!(matches!(repo, Repo::Memory(_)));
    assert!(repo.list().await.unwrap().is_empty());
}
