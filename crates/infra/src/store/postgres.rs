//! Postgres-backed product store.
//!
//! One table, `products (id BIGSERIAL, category TEXT, name TEXT)`; see
//! [`crate::db::ensure_schema`].
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|------------|----------|
//! | Database | `Database` | Constraint or SQL failure reported by the server |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` | Connection could not be used |
//! | ColumnDecode / ColumnNotFound / Decode | `Corrupt` | Row shape does not match `Product` |
//! | Other | `Database` | Anything else |
//!
//! `RowNotFound` never happens: lookups use `fetch_optional`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{Span, instrument};

use catalog_core::{Entity, ProductId};
use catalog_products::{
    Page, PageRequest, Product, ProductStore, SaveProduct, Slice, Sort, SortDirection, SortField,
    StoreError, StoreResult,
};

/// Postgres-backed product table.
///
/// ## Thread Safety
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
///
/// ## Atomicity
///
/// `save` and `find_by_category` run inside a transaction so the
/// update-or-insert decision and the count/window pair each see one
/// consistent state.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    /// Create a new store with the given connection pool.
    ///
    /// The schema is expected to exist already.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT id, category, name FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(decode_product).transpose()
    }

    #[instrument(skip(self, product), fields(product_id), err)]
    async fn save(&self, product: SaveProduct) -> StoreResult<Product> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = match product {
            SaveProduct::Existing(product) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE products
                    SET category = $2, name = $3
                    WHERE id = $1
                    RETURNING id, category, name
                    "#,
                )
                .bind(product.id().as_i64())
                .bind(product.category())
                .bind(product.name())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("update_product", e))?;

                match updated {
                    Some(row) => row,
                    None => {
                        tracing::debug!(
                            stale_id = %product.id(),
                            "id unknown to the store; inserting as a new row"
                        );
                        insert_row(&mut tx, product.category(), product.name()).await?
                    }
                }
            }
            SaveProduct::New(draft) => insert_row(&mut tx, draft.category(), draft.name()).await?,
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let saved = decode_product(&row)?;
        Span::current().record("product_id", saved.id().as_i64());
        Ok(saved)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_by_id(&self, id: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_by_id", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(item_count), err)]
    async fn find_by_category(
        &self,
        category: &str,
        request: PageRequest,
        sort: Option<Sort>,
    ) -> StoreResult<Page<Product>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Count and window must agree with each other.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM products WHERE category = $1")
            .bind(category)
            .fetch_one(&mut *tx)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("count_by_category", e))?;

        let mut query =
            QueryBuilder::<Postgres>::new("SELECT id, category, name FROM products WHERE category = ");
        query.push_bind(category);
        if let Some(sort) = sort {
            query.push(order_by_clause(sort));
        }
        query
            .push(" LIMIT ")
            .push_bind(i64::from(request.size()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(request.offset()).unwrap_or(i64::MAX));

        let rows = query
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("find_by_category", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let items = rows.iter().map(decode_product).collect::<StoreResult<Vec<_>>>()?;
        Span::current().record("item_count", items.len());

        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), request))
    }

    #[instrument(skip(self), err)]
    async fn find_by_category_after(
        &self,
        category: &str,
        after: Option<ProductId>,
        limit: u32,
    ) -> StoreResult<Slice<Product>> {
        // One extra row tells us whether another window follows.
        let rows = sqlx::query(
            r#"
            SELECT id, category, name
            FROM products
            WHERE category = $1 AND ($2::BIGINT IS NULL OR id > $2)
            ORDER BY id ASC
            LIMIT $3
            "#,
        )
        .bind(category)
        .bind(after.map(|id| id.as_i64()))
        .bind(i64::from(limit) + 1)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_category_after", e))?;

        let mut items = rows.iter().map(decode_product).collect::<StoreResult<Vec<_>>>()?;
        let has_more = items.len() > limit as usize;
        items.truncate(limit as usize);
        let next_cursor = if has_more {
            items.last().map(Entity::id)
        } else {
            None
        };

        Ok(Slice { items, next_cursor })
    }

    #[instrument(skip(self), err)]
    async fn list_distinct_categories(&self) -> StoreResult<Vec<String>> {
        // Byte-order collation keeps "Toys" and "toys" distinct and
        // matches the in-memory store's ordering.
        let rows = sqlx::query(r#"SELECT DISTINCT category FROM products ORDER BY category COLLATE "C""#)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_distinct_categories", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("category")
                    .map_err(|e| map_sqlx_error("decode_category", e))
            })
            .collect()
    }
}

async fn insert_row(
    tx: &mut Transaction<'_, Postgres>,
    category: &str,
    name: &str,
) -> StoreResult<PgRow> {
    sqlx::query(
        r#"
        INSERT INTO products (category, name)
        VALUES ($1, $2)
        RETURNING id, category, name
        "#,
    )
    .bind(category)
    .bind(name)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_product", e))
}

/// ORDER BY fragment built from whitelisted column names only.
fn order_by_clause(sort: Sort) -> &'static str {
    match (sort.field, sort.direction) {
        (SortField::Id, SortDirection::Asc) => " ORDER BY id ASC",
        (SortField::Id, SortDirection::Desc) => " ORDER BY id DESC",
        (SortField::Name, SortDirection::Asc) => r#" ORDER BY name COLLATE "C" ASC, id ASC"#,
        (SortField::Name, SortDirection::Desc) => r#" ORDER BY name COLLATE "C" DESC, id DESC"#,
        (SortField::Category, SortDirection::Asc) => r#" ORDER BY category COLLATE "C" ASC, id ASC"#,
        (SortField::Category, SortDirection::Desc) => {
            r#" ORDER BY category COLLATE "C" DESC, id DESC"#
        }
    }
}

struct ProductRow {
    id: i64,
    category: String,
    name: String,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            category: row.try_get("category")?,
            name: row.try_get("name")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product::from_parts(ProductId::new(row.id), row.category, row.name)
    }
}

fn decode_product(row: &PgRow) -> StoreResult<Product> {
    ProductRow::from_row(row)
        .map(Product::from)
        .map_err(|e| map_sqlx_error("decode_product", e))
}

/// Map SQLx errors to `StoreError`.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Database {
            operation,
            message: match db_err.code() {
                Some(code) => format!("[{code}] {}", db_err.message()),
                None => db_err.message().to_string(),
            },
        },
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        err @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)) => StoreError::Corrupt(format!("{operation}: {err}")),
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}
