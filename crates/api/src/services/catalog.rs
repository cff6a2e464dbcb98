//! Catalog views. Inactive products are invisible to customers.

use rust_decimal::Decimal;
use tracing::instrument;

use super::{ServiceError, Violations};
use crate::models::{
    Category, NewCategory, NewProduct, Page, Product, ProductAvailability, ProductFilter,
};
use crate::store::CommerceStore;

pub struct CatalogService<'a> {
    store: &'a dyn CommerceStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CommerceStore) -> Self {
        Self { store }
    }

    /// Active products, newest first.
    ///
    /// # Errors
    ///
    /// `Store` on storage failure.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, ServiceError> {
        Ok(self.store.list_products(filter).await?)
    }

    /// # Errors
    ///
    /// `NotFound` if the product is missing or inactive.
    #[instrument(skip(self))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, ServiceError> {
        self.store
            .product_by_slug(slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| ServiceError::not_found("Product"))
    }

    /// # Errors
    ///
    /// `NotFound` if the product is missing or inactive.
    pub async fn availability(&self, slug: &str) -> Result<ProductAvailability, ServiceError> {
        Ok(self.get_product(slug).await?.availability())
    }

    /// # Errors
    ///
    /// `Store` on storage failure.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories().await?)
    }

    /// # Errors
    ///
    /// `NotFound` if no category has this slug.
    pub async fn get_category(&self, slug: &str) -> Result<Category, ServiceError> {
        self.store
            .category_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category"))
    }

    /// Add a category, deriving a unique slug from its name.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_category(&self, new: &NewCategory) -> Result<Category, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::invalid_field(
                "name",
                "This field may not be blank",
            ));
        }
        Ok(self.store.create_category(new).await?)
    }

    /// Add a product, deriving a unique slug from its name.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank name or a negative price.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, ServiceError> {
        let mut violations = Violations::default();
        if new.name.trim().is_empty() {
            violations.add("name", "This field may not be blank");
        }
        if new.price < Decimal::ZERO {
            violations.add("price", "Ensure this value is greater than or equal to 0");
        }
        violations.check("Invalid product data")?;

        Ok(self.store.create_product(new).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn product(name: &str, stock: u32, is_active: bool) -> NewProduct {
        NewProduct {
            category_id: None,
            name: name.into(),
            description: format!("{name} from Lagos"),
            price: Decimal::new(1500, 2),
            stock_quantity: stock,
            is_active,
        }
    }

    #[tokio::test]
    async fn test_inactive_products_are_hidden() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let retired = catalog
            .create_product(&product("Retired Tote", 3, false))
            .await
            .unwrap();
        catalog
            .create_product(&product("Beaded Bag", 0, true))
            .await
            .unwrap();

        let page = catalog
            .list_products(&ProductFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "beaded-bag");

        let err = catalog.get_product(&retired.slug).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "Product not found"));
    }

    #[tokio::test]
    async fn test_availability_reports_stock() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        catalog
            .create_product(&product("Beaded Bag", 0, true))
            .await
            .unwrap();
        let view = catalog.availability("beaded-bag").await.unwrap();
        assert_eq!(view.stock_quantity, 0);
        assert!(!view.in_stock);
    }

    #[tokio::test]
    async fn test_create_product_validates() {
        let store = MemoryStore::new();
        let mut bad = product(" ", 1, true);
        bad.price = Decimal::new(-1, 0);
        let err = CatalogService::new(&store)
            .create_product(&bad)
            .await
            .unwrap_err();
        let ServiceError::Validation { errors, .. } = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("price"));
    }

    #[tokio::test]
    async fn test_category_lookup() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let created = catalog
            .create_category(&NewCategory {
                name: "Bags & Totes".into(),
                description: None,
                parent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(created.slug, "bags-totes");
        assert_eq!(catalog.get_category("bags-totes").await.unwrap().id, created.id);
        assert!(matches!(
            catalog.get_category("shoes").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
