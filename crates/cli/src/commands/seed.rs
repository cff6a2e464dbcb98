//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Handbags
//!     description: Leather and canvas bags
//!     products:
//!       - name: Tote Bag
//!         price: "45000.00"
//!         stock_quantity: 12
//! products:
//!   - name: Gift Card
//!     price: "10000.00"
//!     stock_quantity: 1000
//! ```
//!
//! Slugs are derived from names. Seeding the same file twice creates
//! suffixed duplicates rather than updating existing rows.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use luxuffy_api::models::{NewCategory, NewProduct};
use luxuffy_api::services::CatalogService;
use luxuffy_api::store::PgStore;

use super::{CommandError, connect};

/// Top-level seed document.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    /// Products without a category.
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    #[serde(flatten)]
    pub category: NewCategory,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Parse a seed document.
///
/// # Errors
///
/// Returns `CommandError::Yaml` for malformed documents.
pub fn parse(content: &str) -> Result<SeedFile, CommandError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load a seed file into the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the catalog
/// rejects an entry. Entries created before the failure are kept.
pub async fn catalog(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog seed");

    // Parse before connecting so a bad file never touches the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandError::Io(file_path.to_owned(), e))?;
    let seed = parse(&content)?;
    info!(categories = seed.categories.len(), "Parsed seed file");

    let store = PgStore::new(connect().await?);
    let summary = apply(&CatalogService::new(&store), seed).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories);
    info!("  Products created: {}", summary.products);
    Ok(())
}

/// Create every category, then its products, then the uncategorized products.
///
/// # Errors
///
/// Returns `CommandError::Service` for the first entry the catalog rejects.
pub async fn apply(
    catalog: &CatalogService<'_>,
    seed: SeedFile,
) -> Result<SeedSummary, CommandError> {
    let mut summary = SeedSummary::default();

    for entry in seed.categories {
        let category = catalog.create_category(&entry.category).await?;
        summary.categories += 1;
        info!(slug = %category.slug, "Created category");

        for product in entry.products {
            let product = NewProduct {
                category_id: Some(category.id),
                ..product
            };
            catalog.create_product(&product).await?;
            summary.products += 1;
        }
    }

    for product in seed.products {
        catalog.create_product(&product).await?;
        summary.products += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use luxuffy_api::models::ProductFilter;
    use luxuffy_api::store::MemoryStore;

    use super::*;

    const SEED: &str = r#"
categories:
  - name: Handbags
    description: Leather and canvas bags
    products:
      - name: Tote Bag
        price: "45000.00"
        stock_quantity: 12
      - name: Clutch
        price: "18000.50"
products:
  - name: Gift Card
    price: "10000.00"
    stock_quantity: 1000
"#;

    #[test]
    fn test_parse_nested_products() {
        let seed = parse(SEED).unwrap();
        assert_eq!(seed.categories.len(), 1);
        assert_eq!(seed.categories[0].category.name, "Handbags");
        assert_eq!(seed.categories[0].products.len(), 2);
        assert_eq!(seed.categories[0].products[1].stock_quantity, 0);
        assert!(seed.categories[0].products[1].is_active);
        assert_eq!(seed.products[0].name, "Gift Card");
    }

    #[test]
    fn test_parse_rejects_missing_price() {
        assert!(parse("products:\n  - name: Broken\n").is_err());
    }

    #[tokio::test]
    async fn test_apply_links_products_to_category() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let summary = apply(&catalog, parse(SEED).unwrap()).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                categories: 1,
                products: 3
            }
        );

        let filter = ProductFilter::new(Some("handbags".into()), None, None, None);
        let page = catalog.list_products(&filter).await.unwrap();
        assert_eq!(page.total, 2);
    }
}
