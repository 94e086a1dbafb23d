use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orders_types::domain::order::{Item, Order, OrderStatus};
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;

const SELECT_ORDERS: &str =
    "SELECT id, user_id, total, status, created_at, updated_at, items_json FROM orders";

pub struct SqliteRepo {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    user_id: String,
    total: f64,
    status: String,
    created_at: String,
    updated_at: String,
    items_json: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(|e| corrupt(&self.id, e))?;
        let items: Vec<Item> =
            serde_json::from_str(&self.items_json).map_err(|e| corrupt(&self.id, e))?;
        let created_at = parse_timestamp(&self.id, &self.created_at)?;
        let updated_at = parse_timestamp(&self.id, &self.updated_at)?;
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            total: self.total,
            status,
            created_at,
            updated_at,
        })
    }
}

fn parse_timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(id, e))
}

fn corrupt(id: &str, err: impl std::fmt::Display) -> RepoError {
    tracing::error!(order_id = %id, error = %err, "stored order failed to decode");
    RepoError::Corrupt(format!("order {id}: {err}"))
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn db_err(err: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(err.to_string())
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if !is_in_memory(database_url) {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory URL opens its own empty database,
        // so the pool is pinned to one connection that is never recycled.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        let ddl = include_str!("../migrations/0001_create_orders.sql");
        sqlx::query(ddl).execute(&pool).await?;
        tracing::debug!(url = %database_url, "sqlite order store ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, total, status, created_at, updated_at, items_json)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .bind(items_json)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(order)
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDERS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDERS} ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter()
            .map(DbOrder::into_order)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update(&self, order: Order, loaded: &Order) -> Result<Option<Order>, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        let updated = sqlx::query(
            "UPDATE orders SET user_id = ?, total = ?, status = ?, updated_at = ?, items_json = ?
             WHERE id = ? AND status = ? AND updated_at = ?",
        )
        .bind(&order.user_id)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.updated_at.to_rfc3339())
        .bind(items_json)
        .bind(&order.id)
        .bind(loaded.status.as_str())
        .bind(loaded.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 1 {
            return Ok(Some(order));
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM orders WHERE id = ?")
            .bind(&order.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        match exists {
            Some(_) => Err(RepoError::Conflict(order.id)),
            None => Ok(None),
        }
    }
}
