//! Category and product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use luxuffy_core::slug::{slugify, unique_slug};
use luxuffy_core::{CategoryId, ProductId};

use super::{RepositoryError, to_i32, to_u32};
use crate::models::{Category, NewCategory, NewProduct, Page, Product, ProductFilter};

const PRODUCT_COLUMNS: &str = "p.id, p.category_id, p.name, p.slug, p.description, p.price, \
                               p.stock_quantity, p.is_active, p.created_at, p.updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            parent_id: row.parent_id.map(CategoryId::new),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    category_id: Option<i64>,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    stock_quantity: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            category_id: row.category_id.map(CategoryId::new),
            name: row.name,
            slug: row.slug,
            description: row.description,
            price: row.price,
            stock_quantity: to_u32(row.stock_quantity, "stock_quantity")?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SlugRow {
    slug: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the catalog.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Page<Product>, RepositoryError> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let limit = i64::from(filter.per_page);
        let offset = i64::try_from(filter.offset())
            .map_err(|_| RepositoryError::Conflict("page out of range".to_string()))?;

        let where_clause = r"
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_active
              AND ($1::TEXT IS NULL OR c.slug = $1)
              AND ($2::TEXT IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2)
        ";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {where_clause}"))
            .bind(filter.category_slug.as_deref())
            .bind(pattern.as_deref())
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} {where_clause} ORDER BY p.created_at DESC, p.id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.category_slug.as_deref())
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(Page {
            items: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            page: filter.page,
            per_page: filter.per_page,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    /// Get a product by slug, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get every product whose ID is in `ids`. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List all categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, description, parent_id, created_at
            FROM categories
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, slug, description, parent_id, created_at
            FROM categories
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a category with a slug derived from its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let slug = self.free_slug("categories", &new.name).await?;
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, slug, description, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, parent_id, created_at
            ",
        )
        .bind(&new.name)
        .bind(&slug)
        .bind(new.description.as_deref())
        .bind(new.parent_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "category slug"))?;

        Ok(row.into())
    }

    /// Insert a product with a slug derived from its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let slug = self.free_slug("products", &new.name).await?;
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (category_id, name, slug, description, price, stock_quantity, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, category_id, name, slug, description, price,
                      stock_quantity, is_active, created_at, updated_at
            ",
        )
        .bind(new.category_id)
        .bind(&new.name)
        .bind(&slug)
        .bind(&new.description)
        .bind(new.price)
        .bind(to_i32(new.stock_quantity, "stock_quantity")?)
        .bind(new.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product slug"))?;

        row.try_into()
    }

    /// First free slug for `name` in `table`.
    async fn free_slug(&self, table: &str, name: &str) -> Result<String, RepositoryError> {
        let base = slugify(name);
        let taken: Vec<String> = sqlx::query_as::<_, SlugRow>(&format!(
            "SELECT slug FROM {table} WHERE slug = $1 OR slug LIKE $1 || '-%'"
        ))
        .bind(&base)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|row| row.slug)
        .collect();

        Ok(unique_slug(&base, |candidate| {
            taken.iter().any(|s| s == candidate)
        }))
    }
}
