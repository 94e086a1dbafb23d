#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use orders_types::domain::order::Order;
use orders_types::ports::order_repository::{OrderRepository, RepoError};

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub const DEFAULT_SQLITE_URL: &str = "sqlite://orders.db";

/// Whichever store the enabled features and the database URL select.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

/// A database URL selects SQLite. Without one the in-memory store is used
/// when it is compiled in, otherwise SQLite at [`DEFAULT_SQLITE_URL`].
pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        if let Some(url) = url {
            tracing::warn!(%url, "sqlite support not compiled in, ignoring database url");
        }
        tracing::info!("using in-memory order store");
        Ok(Repo::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        let url = url.unwrap_or(DEFAULT_SQLITE_URL);
        tracing::info!(%url, "using sqlite order store");
        Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        match url {
            Some(url) => {
                tracing::info!(%url, "using sqlite order store");
                Ok(Repo::Sqlite(sqlite::SqliteRepo::new(url).await?))
            }
            None => {
                tracing::info!("using in-memory order store");
                Ok(Repo::Memory(memory::InMemoryRepo::new()))
            }
        }
    }

    fn store(&self) -> &dyn OrderRepository {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(repo) => repo,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(repo) => repo,
        }
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.store().create(order).await
    }

    async fn get(&self, id: &str) -> Result<Option<Order>, RepoError> {
        self.store().get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.store().list().await
    }

    async fn update(&self, order: Order, loaded: &Order) -> Result<Option<Order>, RepoError> {
        self.store().update(order, loaded).await
    }
}
