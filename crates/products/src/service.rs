//! Product business operations.
//!
//! The service owns the rules around the store: input validation happens
//! before any store call, absence becomes `NotFound` in exactly one place
//! (`get_by_id`), and every storage failure is logged and classified as
//! `Unexpected`.

use tracing::instrument;

use catalog_core::{CatalogError, CatalogResult, DomainError, Entity, ProductId};

use crate::page::{Page, PageRequest, Slice, Sort, SortField, validate_limit};
use crate::product::{NewProduct, Product, normalize_category};
use crate::store::{ProductStore, StoreError};

const RESOURCE: &str = "product";

#[derive(Debug, Clone)]
pub struct ProductService<S> {
    store: S,
}

impl<S> ProductService<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    fn store(&self) -> &S {
        &self.store
    }

    /// Create and persist a product. Duplicates (same category + name) are allowed.
    #[instrument(skip(self))]
    pub async fn create(&self, category: &str, name: &str) -> CatalogResult<Product> {
        let draft = NewProduct::new(category, name).map_err(|e| rejected("create", e))?;

        let product = self
            .store
            .save(draft.into())
            .await
            .map_err(|e| unexpected("create", e))?;

        tracing::info!(product_id = %product.id(), "product created");
        Ok(product)
    }

    /// Load a product or fail with `NotFound`.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> CatalogResult<Product> {
        match self.store.find_by_id(id).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => {
                tracing::debug!("product not found");
                Err(CatalogError::not_found(RESOURCE, id))
            }
            Err(e) => Err(unexpected("get_by_id", e)),
        }
    }

    /// Full replace of both mutable fields.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, category: &str, name: &str) -> CatalogResult<Product> {
        let draft = NewProduct::new(category, name).map_err(|e| rejected("update", e))?;

        let mut product = self.get_by_id(id).await?;
        product.change_category(draft.category())?;
        product.rename(draft.name())?;

        let saved = self
            .store
            .save(product.into())
            .await
            .map_err(|e| unexpected("update", e))?;

        if saved.id() != id {
            // Deleted between load and save, so the upsert inserted a fresh row.
            tracing::debug!(stray_id = %saved.id(), "product vanished before update");
            self.store
                .delete_by_id(saved.id())
                .await
                .map_err(|e| unexpected("update", e))?;
            return Err(CatalogError::not_found(RESOURCE, id));
        }

        tracing::info!("product updated");
        Ok(saved)
    }

    /// Delete an existing product; a missing id is reported as `NotFound`.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn delete_by_id(&self, id: ProductId) -> CatalogResult<()> {
        let product = self.get_by_id(id).await?;

        let removed = self
            .store
            .delete_by_id(product.id())
            .await
            .map_err(|e| unexpected("delete_by_id", e))?;

        if !removed {
            // Lost a race with a concurrent delete.
            tracing::debug!("product vanished before delete");
            return Err(CatalogError::not_found(RESOURCE, id));
        }

        tracing::info!("product deleted");
        Ok(())
    }

    /// Offset page of one category, in whatever order the store yields.
    pub async fn list_by_category(
        &self,
        category: &str,
        page: i64,
        size: i64,
    ) -> CatalogResult<Page<Product>> {
        self.list_page(category, page, size, None).await
    }

    /// Offset page of one category with an explicit ordering.
    ///
    /// Ordering by category under a category filter is a no-op and is not
    /// passed to the store.
    pub async fn list_by_category_sorted(
        &self,
        category: &str,
        page: i64,
        size: i64,
        sort: Sort,
    ) -> CatalogResult<Page<Product>> {
        let sort = (sort.field != SortField::Category).then_some(sort);
        self.list_page(category, page, size, sort).await
    }

    /// Seek-mode listing: products after `after` (exclusive), ordered by id.
    #[instrument(skip(self))]
    pub async fn scroll_by_category(
        &self,
        category: &str,
        after: Option<ProductId>,
        limit: i64,
    ) -> CatalogResult<Slice<Product>> {
        let category = normalize_category(category).map_err(|e| rejected("scroll_by_category", e))?;
        let limit = validate_limit(limit).map_err(|e| rejected("scroll_by_category", e))?;

        self.store
            .find_by_category_after(&category, after, limit)
            .await
            .map_err(|e| unexpected("scroll_by_category", e))
    }

    /// Every category in use, ascending, no duplicates.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> CatalogResult<Vec<String>> {
        self.store
            .list_distinct_categories()
            .await
            .map_err(|e| unexpected("list_categories", e))
    }

    #[instrument(skip(self))]
    async fn list_page(
        &self,
        category: &str,
        page: i64,
        size: i64,
        sort: Option<Sort>,
    ) -> CatalogResult<Page<Product>> {
        let category = normalize_category(category).map_err(|e| rejected("list_by_category", e))?;
        let request = PageRequest::new(page, size).map_err(|e| rejected("list_by_category", e))?;

        self.store
            .find_by_category(&category, request, sort)
            .await
            .map_err(|e| unexpected("list_by_category", e))
    }
}

fn rejected(operation: &'static str, err: DomainError) -> CatalogError {
    tracing::debug!(operation, error = %err, "request rejected");
    err.into()
}

fn unexpected(operation: &'static str, err: StoreError) -> CatalogError {
    tracing::error!(operation, error = %err, "store operation failed");
    CatalogError::unexpected(operation, err)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use catalog_core::ErrorKind;

    use super::*;
    use crate::store::{SaveProduct, StoreResult};

    /// Store double that counts calls, remembers the last sort it was given
    /// and can be switched into failure mode.
    #[derive(Default)]
    struct RecordingStore {
        rows: Mutex<BTreeMap<ProductId, Product>>,
        next_id: Mutex<i64>,
        calls: AtomicUsize,
        failing: AtomicBool,
        /// Drop a row right after handing it out, like a concurrent delete.
        vanish_after_read: AtomicBool,
        last_sort: Mutex<Option<Option<Sort>>>,
    }

    impl RecordingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn enter(&self) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ProductStore for RecordingStore {
        async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
            self.enter()?;
            let mut rows = self.rows.lock().unwrap();
            let found = rows.get(&id).cloned();
            if self.vanish_after_read.load(Ordering::SeqCst) {
                rows.remove(&id);
            }
            Ok(found)
        }

        async fn save(&self, product: SaveProduct) -> StoreResult<Product> {
            self.enter()?;
            let mut rows = self.rows.lock().unwrap();
            let product = match product {
                SaveProduct::Existing(p) if rows.contains_key(&p.id()) => p,
                SaveProduct::Existing(p) => {
                    let mut next = self.next_id.lock().unwrap();
                    *next += 1;
                    Product::from_parts(ProductId::new(*next), p.category(), p.name())
                }
                SaveProduct::New(draft) => {
                    let mut next = self.next_id.lock().unwrap();
                    *next += 1;
                    Product::from_new(ProductId::new(*next), draft)
                }
            };
            rows.insert(product.id(), product.clone());
            Ok(product)
        }

        async fn delete_by_id(&self, id: ProductId) -> StoreResult<bool> {
            self.enter()?;
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }

        async fn find_by_category(
            &self,
            category: &str,
            request: PageRequest,
            sort: Option<Sort>,
        ) -> StoreResult<Page<Product>> {
            self.enter()?;
            *self.last_sort.lock().unwrap() = Some(sort);
            let matching: Vec<Product> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.category() == category)
                .cloned()
                .collect();
            let total = matching.len() as u64;
            let items = matching
                .into_iter()
                .skip(request.offset() as usize)
                .take(request.size() as usize)
                .collect();
            Ok(Page::new(items, total, request))
        }

        async fn find_by_category_after(
            &self,
            category: &str,
            after: Option<ProductId>,
            limit: u32,
        ) -> StoreResult<Slice<Product>> {
            self.enter()?;
            let mut items: Vec<Product> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.category() == category && after.is_none_or(|a| p.id() > a))
                .take(limit as usize + 1)
                .cloned()
                .collect();
            let more = items.len() > limit as usize;
            items.truncate(limit as usize);
            let next_cursor = if more { items.last().map(|p| p.id()) } else { None };
            Ok(Slice { items, next_cursor })
        }

        async fn list_distinct_categories(&self) -> StoreResult<Vec<String>> {
            self.enter()?;
            let mut categories: Vec<String> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .map(|p| p.category().to_string())
                .collect();
            categories.sort();
            categories.dedup();
            Ok(categories)
        }
    }

    fn service() -> ProductService<RecordingStore> {
        ProductService::new(RecordingStore::default())
    }

    #[tokio::test]
    async fn create_then_get_returns_submitted_fields() {
        let svc = service();
        let created = svc.create("toys", "robot").await.unwrap();

        let fetched = svc.get_by_id(created.id()).await.unwrap();
        assert_eq!(fetched.category(), "toys");
        assert_eq!(fetched.name(), "robot");
    }

    #[tokio::test]
    async fn lifecycle_scenario() {
        let svc = service();

        let created = svc.create("toys", "robot").await.unwrap();
        assert_eq!(created.id(), ProductId::new(1));

        let updated = svc.update(ProductId::new(1), "toys", "robot-v2").await.unwrap();
        assert_eq!(updated.id(), ProductId::new(1));
        assert_eq!(updated.category(), "toys");
        assert_eq!(updated.name(), "robot-v2");

        svc.delete_by_id(ProductId::new(1)).await.unwrap();

        let err = svc.get_by_id(ProductId::new(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn update_is_a_full_replace() {
        let svc = service();
        let created = svc.create("toys", "robot").await.unwrap();

        svc.update(created.id(), "games", "chess").await.unwrap();

        let fetched = svc.get_by_id(created.id()).await.unwrap();
        assert_eq!(fetched.category(), "games");
        assert_eq!(fetched.name(), "chess");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let svc = service();
        let missing = ProductId::new(404);

        assert_eq!(svc.get_by_id(missing).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(svc.delete_by_id(missing).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            svc.update(missing, "toys", "robot").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn update_of_concurrently_deleted_product_is_not_found() {
        let svc = service();
        let created = svc.create("toys", "robot").await.unwrap();
        svc.store().vanish_after_read.store(true, Ordering::SeqCst);

        let err = svc
            .update(created.id(), "toys", "robot-v2")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // No row survives under the original or a fresh id.
        assert!(svc.store().rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let svc = service();
        let created = svc.create("toys", "robot").await.unwrap();

        svc.delete_by_id(created.id()).await.unwrap();
        let err = svc.delete_by_id(created.id()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_without_store_calls() {
        let svc = service();

        let err = svc.create("toys", "  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = svc.update(ProductId::new(1), "", "robot").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        assert_eq!(svc.store().calls(), 0);
    }

    #[tokio::test]
    async fn bad_pagination_is_rejected_without_store_calls() {
        let svc = service();

        for (page, size) in [(-1, 10), (0, 0), (0, -3), (-2, -2), (0, 1001)] {
            let err = svc.list_by_category("toys", page, size).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRequest, "page={page} size={size}");
        }
        let err = svc.list_by_category("  ", 0, 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        assert_eq!(svc.store().calls(), 0);
    }

    #[tokio::test]
    async fn listing_filters_by_exact_category() {
        let svc = service();
        for i in 0..12 {
            svc.create("electronics", &format!("tv-{i}")).await.unwrap();
        }
        svc.create("Electronics", "radio").await.unwrap();
        svc.create("toys", "robot").await.unwrap();

        let page = svc.list_by_category("electronics", 0, 10).await.unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_elements, 12);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page_index, 0);
        assert!(page.items.iter().all(|p| p.category() == "electronics"));

        let last = svc.list_by_category("electronics", 1, 10).await.unwrap();
        assert_eq!(last.items.len(), 2);
        assert_eq!(last.page_index, 1);
    }

    #[tokio::test]
    async fn category_sort_is_dropped_other_sorts_pass_through() {
        let svc = service();

        svc.list_by_category_sorted("toys", 0, 10, Sort::asc(SortField::Category))
            .await
            .unwrap();
        assert_eq!(*svc.store().last_sort.lock().unwrap(), Some(None));

        let by_name = Sort::desc(SortField::Name);
        svc.list_by_category_sorted("toys", 0, 10, by_name).await.unwrap();
        assert_eq!(*svc.store().last_sort.lock().unwrap(), Some(Some(by_name)));

        svc.list_by_category("toys", 0, 10).await.unwrap();
        assert_eq!(*svc.store().last_sort.lock().unwrap(), Some(None));
    }

    #[tokio::test]
    async fn categories_are_distinct() {
        let svc = service();
        svc.create("toys", "robot").await.unwrap();
        svc.create("toys", "kite").await.unwrap();
        svc.create("books", "novel").await.unwrap();

        let categories = svc.list_categories().await.unwrap();
        assert_eq!(categories, vec!["books".to_string(), "toys".to_string()]);
    }

    #[tokio::test]
    async fn scroll_walks_a_category_to_the_end() {
        let svc = service();
        for i in 0..5 {
            svc.create("toys", &format!("toy-{i}")).await.unwrap();
        }
        svc.create("books", "novel").await.unwrap();

        let first = svc.scroll_by_category("toys", None, 2).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let cursor = first.next_cursor.expect("more toys follow");

        let second = svc.scroll_by_category("toys", Some(cursor), 2).await.unwrap();
        assert_eq!(second.items.len(), 2);

        let third = svc
            .scroll_by_category("toys", second.next_cursor, 2)
            .await
            .unwrap();
        assert_eq!(third.items.len(), 1);
        assert_eq!(third.next_cursor, None);

        let err = svc.scroll_by_category("toys", None, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn store_failures_are_unexpected() {
        let svc = service();
        svc.store().failing.store(true, Ordering::SeqCst);

        assert_eq!(
            svc.create("toys", "robot").await.unwrap_err().kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(
            svc.get_by_id(ProductId::new(1)).await.unwrap_err().kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(
            svc.list_by_category("toys", 0, 10).await.unwrap_err().kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(
            svc.list_categories().await.unwrap_err().kind(),
            ErrorKind::Unexpected
        );

        let err = svc.delete_by_id(ProductId::new(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(!err.public_message().contains("connection refused"));
    }
}
