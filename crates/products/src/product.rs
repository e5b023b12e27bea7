use catalog_core::{DomainError, DomainResult, Entity, ProductId};

/// Longest accepted category, in characters.
pub const MAX_CATEGORY_LEN: usize = 100;

/// Longest accepted product name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// A product that has not been persisted yet (no identity).
///
/// The only way to get one is [`NewProduct::new`], so every draft has passed
/// the same field validation as [`Product::rename`] and [`Product::change_category`].
///
/// ```compile_fail
/// let _: catalog_products::NewProduct =
///     serde_json::from_str(r#"{"category":"","name":"   "}"#).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    category: String,
    name: String,
}

impl NewProduct {
    pub fn new(category: impl AsRef<str>, name: impl AsRef<str>) -> DomainResult<Self> {
        Ok(Self {
            category: normalize_category(category.as_ref())?,
            name: normalize_name(name.as_ref())?,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Catalog product (persisted; always carries a store-assigned id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    category: String,
    name: String,
}

impl Product {
    /// Rebuild a product from stored fields.
    ///
    /// Meant for store adapters materializing rows; the values are trusted
    /// as already validated on the way in.
    pub fn from_parts(id: ProductId, category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            category: category.into(),
            name: name.into(),
        }
    }

    /// Attach the identity assigned by the store to a draft.
    pub fn from_new(id: ProductId, draft: NewProduct) -> Self {
        Self {
            id,
            category: draft.category,
            name: draft.name,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Move the product to another category.
    pub fn change_category(&mut self, category: impl AsRef<str>) -> DomainResult<()> {
        self.category = normalize_category(category.as_ref())?;
        Ok(())
    }

    /// Change the display name.
    pub fn rename(&mut self, name: impl AsRef<str>) -> DomainResult<()> {
        self.name = normalize_name(name.as_ref())?;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Trim a category and check it is usable.
///
/// Case and inner whitespace are preserved: "Electronics" and "electronics"
/// stay distinct categories.
pub fn normalize_category(raw: &str) -> DomainResult<String> {
    normalize_text("category", raw, MAX_CATEGORY_LEN)
}

fn normalize_name(raw: &str) -> DomainResult<String> {
    normalize_text("name", raw, MAX_NAME_LEN)
}

fn normalize_text(field: &str, raw: &str, max_len: usize) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} cannot be longer than {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}
