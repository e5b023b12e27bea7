use serde::{Deserialize, Serialize};

use catalog_core::Entity;
use catalog_products::Product;

const DEFAULT_PAGE_SIZE: i64 = 20;

// -------------------------
// Request DTOs
// -------------------------

/// Body of both create and update (update is a full replace).
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub category: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    /// `field` or `field,asc|desc`.
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScrollParams {
    pub category: String,
    pub after: Option<i64>,
    #[serde(default = "default_size")]
    pub limit: i64,
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub category: String,
    pub name: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id().as_i64(),
            category: product.category().to_string(),
            name: product.name().to_string(),
        }
    }
}
