use std::sync::Arc;

use catalog_infra::{DatabaseConfig, InMemoryProductStore, PostgresProductStore, db};
use catalog_products::{ProductService, ProductStore, StoreResult};

pub type DynProductStore = Arc<dyn ProductStore>;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub products: ProductService<DynProductStore>,
}

impl AppServices {
    pub fn new(store: DynProductStore) -> Self {
        Self {
            products: ProductService::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryProductStore::new()))
    }

    /// Postgres when a URL is configured, otherwise the in-memory store.
    pub async fn from_config(config: &DatabaseConfig) -> StoreResult<Self> {
        if config.url.is_none() {
            tracing::warn!("no database url configured; using in-memory product store");
            return Ok(Self::in_memory());
        }

        let pool = db::connect(config).await?;
        db::ensure_schema(&pool).await?;
        Ok(Self::new(Arc::new(PostgresProductStore::new(pool))))
    }
}
