//! Order route handlers.

use axum::extract::State;
use luxuffy_core::OrderId;

use super::extract::{Json, Path};
use super::response::Envelope;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Order;
use crate::services::CreateOrder;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Envelope<Vec<Order>>> {
    let orders = state.orders().list_orders(user.id).await?;
    Ok(Envelope::ok("Orders retrieved successfully", orders))
}

pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CreateOrder>,
) -> Result<Envelope<Order>> {
    let order = state.orders().create_order(user.id, &body).await?;
    Ok(Envelope::created("Order created successfully", order))
}

pub async fn detail(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Envelope<Order>> {
    let order = state.orders().get_order(user.id, order_id).await?;
    Ok(Envelope::ok("Order details retrieved successfully", order))
}

pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<OrderId>,
) -> Result<Envelope<Order>> {
    let order = state.orders().cancel_order(user.id, order_id).await?;
    Ok(Envelope::ok("Order cancelled successfully", order))
}
