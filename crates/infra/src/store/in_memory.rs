use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;

use catalog_core::{Entity, ProductId};
use catalog_products::{
    Page, PageRequest, Product, ProductStore, SaveProduct, Slice, Sort, SortDirection, SortField,
    StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

impl Table {
    fn assign_id(&mut self) -> ProductId {
        self.last_id += 1;
        ProductId::new(self.last_id)
    }
}

/// In-memory product table for tests/dev.
///
/// Ids start at 1 and are never reused, mirroring a database sequence.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<Table>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Table>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory table lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Table>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory table lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    async fn save(&self, product: SaveProduct) -> StoreResult<Product> {
        let mut table = self.write()?;

        let stored = match product {
            SaveProduct::Existing(product) if table.rows.contains_key(&product.id()) => product,
            SaveProduct::Existing(product) => {
                let id = table.assign_id();
                Product::from_parts(id, product.category(), product.name())
            }
            SaveProduct::New(draft) => {
                let id = table.assign_id();
                Product::from_new(id, draft)
            }
        };

        table.rows.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn delete_by_id(&self, id: ProductId) -> StoreResult<bool> {
        Ok(self.write()?.rows.remove(&id).is_some())
    }

    async fn find_by_category(
        &self,
        category: &str,
        request: PageRequest,
        sort: Option<Sort>,
    ) -> StoreResult<Page<Product>> {
        let table = self.read()?;

        // BTreeMap iteration is id-ascending; that is the natural row order here.
        let mut matching: Vec<&Product> = table
            .rows
            .values()
            .filter(|p| p.category() == category)
            .collect();

        if let Some(sort) = sort {
            matching.sort_by(|a, b| {
                let ord = match sort.field {
                    SortField::Id => a.id().cmp(&b.id()),
                    SortField::Name => a.name().cmp(b.name()).then(a.id().cmp(&b.id())),
                    SortField::Category => a.category().cmp(b.category()).then(a.id().cmp(&b.id())),
                };
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let total = matching.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(request.size() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, total, request))
    }

    async fn find_by_category_after(
        &self,
        category: &str,
        after: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Slice<Product>> {
        let table = self.read()?;
        let limit = limit as usize;

        let lower = match after {
            Some(id) => std::ops::Bound::Excluded(id),
            None => std::ops::Bound::Unbounded,
        };

        // Fetch one extra row to learn whether another window follows.
        let mut items: Vec<Product> = table
            .rows
            .range((lower, std::ops::Bound::Unbounded))
            .map(|(_, p)| p)
            .filter(|p| p.category() == category)
            .take(limit + 1)
            .cloned()
            .collect();

        let has_more = items.len() > limit;
        items.truncate(limit);
        let next_cursor = if has_more {
            items.last().map(Entity::id)
        } else {
            None
        };

        Ok(Slice { items, next_cursor })
    }

    async fn list_distinct_categories(&self) -> StoreResult<Vec<String>> {
        let table = self.read()?;
        let categories: BTreeSet<&str> = table.rows.values().map(Product::category).collect();
        Ok(categories.into_iter().map(str::to_string).collect())
    }
}
