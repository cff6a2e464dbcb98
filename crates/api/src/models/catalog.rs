//! Catalog domain types: categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use luxuffy_core::{CategoryId, ProductId};

/// Largest page size a listing will return.
pub const MAX_PER_PAGE: u32 = 100;
/// Page size used when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Current catalog price.
    pub price: Decimal,
    pub stock_quantity: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can be sold right now.
    #[must_use]
    pub const fn can_supply(&self, quantity: u32) -> bool {
        self.is_active && self.stock_quantity >= quantity
    }

    /// Stock view returned by the availability endpoint.
    #[must_use]
    pub fn availability(&self) -> ProductAvailability {
        ProductAvailability {
            slug: self.slug.clone(),
            stock_quantity: self.stock_quantity,
            in_stock: self.can_supply(1),
        }
    }
}

/// Stock view of a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductAvailability {
    pub slug: String,
    pub stock_quantity: u32,
    pub in_stock: bool,
}

/// A product to insert. The slug is derived from the name by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// A category to insert.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Product listing filter. Build with [`ProductFilter::new`] to get clamped paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_slug: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl ProductFilter {
    /// Normalize a raw filter: blank strings are dropped, `page >= 1`,
    /// `per_page` in `1..=100`.
    #[must_use]
    pub fn new(
        category_slug: Option<String>,
        search: Option<String>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Self {
        let non_blank = |s: Option<String>| {
            s.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
        };
        Self {
            category_slug: non_blank(category_slug),
            search: non_blank(search),
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.per_page as u64
    }

    /// Case-insensitive match against name and description.
    #[must_use]
    pub fn matches_search(&self, product: &Product) -> bool {
        self.search.as_ref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            product.name.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle)
        })
    }
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_clamps_paging() {
        let filter = ProductFilter::new(None, None, Some(0), Some(500));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.per_page, MAX_PER_PAGE);

        let filter = ProductFilter::new(None, None, Some(3), Some(0));
        assert_eq!(filter.per_page, 1);
        assert_eq!(filter.offset(), 2);
    }

    #[test]
    fn test_filter_drops_blank_strings() {
        let filter = ProductFilter::new(Some("  ".into()), Some(" tote ".into()), None, None);
        assert_eq!(filter.category_slug, None);
        assert_eq!(filter.search.as_deref(), Some("tote"));
        assert_eq!(filter.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_can_supply_requires_active_and_stock() {
        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(1),
            category_id: None,
            name: "Aso-oke wrap".into(),
            slug: "aso-oke-wrap".into(),
            description: String::new(),
            price: Decimal::new(1500, 2),
            stock_quantity: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(product.can_supply(2));
        assert!(!product.can_supply(3));
        product.is_active = false;
        assert!(!product.can_supply(1));
        assert!(!product.availability().in_stock);
    }
}
