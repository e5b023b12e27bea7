//! Persistence port for products.
//!
//! Adapters live in `catalog-infra`; the service only sees this trait.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::ProductId;

use crate::page::{Page, PageRequest, Slice, Sort};
use crate::product::{NewProduct, Product};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure.
///
/// Absence is never an error at this level: lookups return `Option`, deletes
/// return whether a row was removed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be turned back into a product.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// What `save` should write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveProduct {
    /// Insert; the store assigns the id.
    New(NewProduct),
    /// Update the row with this id, or insert under a fresh id if the store
    /// does not know it.
    Existing(Product),
}

impl From<NewProduct> for SaveProduct {
    fn from(value: NewProduct) -> Self {
        Self::New(value)
    }
}

impl From<Product> for SaveProduct {
    fn from(value: Product) -> Self {
        Self::Existing(value)
    }
}

/// Single-table product persistence.
///
/// Every method is one atomic unit against the backing store.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Upsert; the returned product carries the id the row is stored under.
    async fn save(&self, product: SaveProduct) -> StoreResult<Product>;

    /// Returns `true` if a row was removed.
    async fn delete_by_id(&self, id: ProductId) -> StoreResult<bool>;

    /// Offset page of products whose category equals `category` exactly.
    ///
    /// With `sort == None` no ordering is imposed.
    async fn find_by_category(
        &self,
        category: &str,
        request: PageRequest,
        sort: Option<Sort>,
    ) -> StoreResult<Page<Product>>;

    /// Seek window ordered by id ascending, starting after `after` (exclusive).
    async fn find_by_category_after(
        &self,
        category: &str,
        after: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Slice<Product>>;

    /// Every category currently in use, deduplicated and ascending.
    async fn list_distinct_categories(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).find_by_id(id).await
    }

    async fn save(&self, product: SaveProduct) -> StoreResult<Product> {
        (**self).save(product).await
    }

    async fn delete_by_id(&self, id: ProductId) -> StoreResult<bool> {
        (**self).delete_by_id(id).await
    }

    async fn find_by_category(
        &self,
        category: &str,
        request: PageRequest,
        sort: Option<Sort>,
    ) -> StoreResult<Page<Product>> {
        (**self).find_by_category(category, request, sort).await
    }

    async fn find_by_category_after(
        &self,
        category: &str,
        after: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Slice<Product>> {
        (**self).find_by_category_after(category, after, limit).await
    }

    async fn list_distinct_categories(&self) -> StoreResult<Vec<String>> {
        (**self).list_distinct_categories().await
    }
}
