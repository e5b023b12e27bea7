//! Products domain module.
//!
//! This crate contains the catalog's business rules: the `Product` entity, the
//! pagination vocabulary, the `ProductStore` persistence port, and the
//! `ProductService` that ties them together. Storage adapters live in
//! `catalog-infra`; HTTP lives in `catalog-api`.

pub mod page;
pub mod product;
pub mod service;
pub mod store;

pub use page::{MAX_PAGE_SIZE, Page, PageRequest, Slice, Sort, SortDirection, SortField};
pub use product::{NewProduct, Product};
pub use service::ProductService;
pub use store::{ProductStore, SaveProduct, StoreError, StoreResult};
