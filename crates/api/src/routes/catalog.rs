//! Catalog route handlers.

use axum::extract::State;
use serde::Deserialize;

use super::extract::{Path, Query};
use super::response::Envelope;
use crate::error::Result;
use crate::models::{Category, Page, Product, ProductAvailability, ProductFilter};
use crate::state::AppState;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self::new(query.category, query.search, query.page, query.per_page)
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Envelope<Page<Product>>> {
    let page = state.catalog().list_products(&query.into()).await?;
    Ok(Envelope::ok("Products retrieved successfully", page))
}

pub async fn product_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Envelope<Product>> {
    let product = state.catalog().get_product(&slug).await?;
    Ok(Envelope::ok("Product retrieved successfully", product))
}

pub async fn product_availability(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Envelope<ProductAvailability>> {
    let availability = state.catalog().availability(&slug).await?;
    Ok(Envelope::ok(
        "Product availability retrieved successfully",
        availability,
    ))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Envelope<Vec<Category>>> {
    let categories = state.catalog().list_categories().await?;
    Ok(Envelope::ok("Categories retrieved successfully", categories))
}

pub async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Envelope<Category>> {
    let category = state.catalog().get_category(&slug).await?;
    Ok(Envelope::ok("Category retrieved successfully", category))
}
