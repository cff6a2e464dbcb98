//! Cart route handlers.

use axum::extract::State;
use axum::response::Response;
use luxuffy_core::{CartItemId, ProductId};
use serde::Deserialize;

use super::extract::{Json, Path};
use super::response::{Envelope, no_content};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::CartSnapshot;
use crate::state::AppState;

/// Body of `POST /api/cart/add/`.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub is_wishlist_item: Option<bool>,
}

/// Body of `PUT /api/cart/items/{id}/`.
#[derive(Debug, Deserialize)]
pub struct UpdateItem {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub is_wishlist_item: Option<bool>,
}

pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Envelope<CartSnapshot>> {
    let cart = state.carts().get_cart(user.id).await?;
    Ok(Envelope::ok("Cart retrieved successfully", cart))
}

pub async fn add_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItem>,
) -> Result<Envelope<CartSnapshot>> {
    let cart = state
        .carts()
        .add_item(
            user.id,
            body.product_id,
            body.quantity,
            body.is_wishlist_item.unwrap_or(false),
        )
        .await?;
    Ok(Envelope::created("Item added to cart successfully", cart))
}

pub async fn update_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateItem>,
) -> Result<Envelope<CartSnapshot>> {
    let cart = state
        .carts()
        .update_item(user.id, item_id, body.quantity, body.is_wishlist_item)
        .await?;
    Ok(Envelope::ok("Cart item updated successfully", cart))
}

pub async fn remove_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Response> {
    state.carts().remove_item(user.id, item_id).await?;
    Ok(no_content())
}

pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response> {
    state.carts().clear(user.id).await?;
    Ok(no_content())
}

pub async fn move_to_wishlist(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Envelope<CartSnapshot>> {
    let cart = state.carts().move_all_to_wishlist(user.id).await?;
    Ok(Envelope::ok("All items moved to wishlist successfully", cart))
}
