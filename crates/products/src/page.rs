//! Pagination primitives for catalog listings.
//!
//! Two listing modes exist side by side:
//! - **offset pages** ([`PageRequest`] / [`Page`]): random page access with
//!   total counts, at the cost of a count query per call;
//! - **seek slices** ([`Slice`]): filter + id ordering + limit, no count query,
//!   for walking large categories front to back.

use core::str::FromStr;

use serde::Serialize;

use catalog_core::{DomainError, DomainResult, ProductId};

/// Largest page (or slice) a caller may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Validated offset-pagination window (zero-based page index).
///
/// Only [`PageRequest::new`] builds one, so `size` is never zero.
///
/// ```compile_fail
/// let _: catalog_products::PageRequest =
///     serde_json::from_str(r#"{"page":0,"size":0}"#).unwrap();
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Validate raw boundary values: `page >= 0`, `1 <= size <= MAX_PAGE_SIZE`.
    pub fn new(page: i64, size: i64) -> DomainResult<Self> {
        if page < 0 {
            return Err(DomainError::validation(format!(
                "page must be zero or greater (got {page})"
            )));
        }
        let size = validate_size("size", size)?;
        let page = u32::try_from(page)
            .map_err(|_| DomainError::validation(format!("page is too large (got {page})")))?;
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// Validate a seek-mode limit (same bounds as a page size).
pub fn validate_limit(limit: i64) -> DomainResult<u32> {
    validate_size("limit", limit)
}

fn validate_size(field: &str, size: i64) -> DomainResult<u32> {
    if size < 1 {
        return Err(DomainError::validation(format!(
            "{field} must be at least 1 (got {size})"
        )));
    }
    if size > i64::from(MAX_PAGE_SIZE) {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {MAX_PAGE_SIZE} (got {size})"
        )));
    }
    // Bounded by MAX_PAGE_SIZE above.
    Ok(size as u32)
}

/// Column a listing may be ordered by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    Name,
    Category,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Explicit ordering requested by a caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for Sort {
    type Err = DomainError;

    /// Parses `field` or `field,direction`, e.g. `name`, `id,desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("id") => SortField::Id,
            Some("name") => SortField::Name,
            Some("category") => SortField::Category,
            _ => {
                return Err(DomainError::validation(format!(
                    "sort field must be one of: id, name, category (got {s:?})"
                )));
            }
        };
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(DomainError::validation(format!(
                    "sort direction must be asc or desc (got {other:?})"
                )));
            }
        };
        if parts.next().is_some() {
            return Err(DomainError::validation(format!("malformed sort {s:?}")));
        }
        Ok(Self { field, direction })
    }
}

/// One offset page of results plus totals across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
    pub total_elements: u64,
    pub page_index: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_elements: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_pages: total_elements.div_ceil(u64::from(request.size())),
            total_elements,
            page_index: request.page(),
            size: request.size(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            total_elements: self.total_elements,
            page_index: self.page_index,
            size: self.size,
        }
    }
}

/// One seek-mode window; `next_cursor` is set only when more rows follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<ProductId>,
}

impl<T> Slice<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}
