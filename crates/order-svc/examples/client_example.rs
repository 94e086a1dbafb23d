///  To run :
///  cargo r -p order-svc --example client_example
use orders_client::{ApiError, CreateOrderRequest, OrdersClient};
use orders_hex::application::order_service::OrderService;
use orders_hex::inbound::http::{HttpServer, HttpServerConfig};
use orders_repo::build_repo;
use orders_types::domain::order::{Item, OrderStatus};
use tempfile::tempdir;

fn find_free_port() -> anyhow::Result<u16> {
    Ok(std::net::TcpListener::bind("127.0.0.1:0")?
        .local_addr()?
        .port())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port()?;
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("orders.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let server = HttpServer::new(
        OrderService::new(repo),
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async move {
        let _ = stop_rx.await;
    }));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = OrdersClient::new(&addr)?;
    let created = client
        .create_order(CreateOrderRequest {
            user_id: "example-user".into(),
            items: vec![
                Item {
                    product_id: "widget".into(),
                    quantity: 2,
                    price: 10.0,
                },
                Item {
                    product_id: "gadget".into(),
                    quantity: 1,
                    price: 5.0,
                },
            ],
        })
        .await?;
    println!("Created order id={} total={}", created.id, created.total);

    for next in [OrderStatus::Paid, OrderStatus::Shipped] {
        let order = client.update_status(&created.id, next).await?;
        println!("Order {} is now {}", order.id, order.status);
    }

    // Jumping back is refused by the server.
    match client.update_status(&created.id, OrderStatus::Created).await {
        Ok(order) => anyhow::bail!("unexpected transition to {}", order.status),
        Err(err) => match err.downcast_ref::<ApiError>() {
            Some(api) => println!("Rejected as expected: {api}"),
            None => return Err(err),
        },
    }

    let done = client
        .update_status(&created.id, OrderStatus::Completed)
        .await?;
    println!("Final status={}", done.status);

    let _ = stop_tx.send(());
    handle.await??;
    Ok(())
}
