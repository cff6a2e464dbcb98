//! Payment route handlers.

use axum::extract::State;
use luxuffy_core::{OrderId, PaymentId};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::extract::{Json, Query};
use super::response::Envelope;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{Payment, PaymentInitialization, RefundReceipt};
use crate::state::AppState;

/// Body of `POST /api/payments/initialize/`.
#[derive(Debug, Deserialize)]
pub struct InitializePayment {
    pub order_id: OrderId,
}

/// Query of `GET /api/payments/verify/`. A missing reference is reported
/// as a field error rather than a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    pub reference: Option<String>,
}

/// Body of `POST /api/payments/refund/`.
#[derive(Debug, Deserialize)]
pub struct RefundRequestBody {
    pub payment_id: PaymentId,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

pub async fn initialize(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<InitializePayment>,
) -> Result<Envelope<PaymentInitialization>> {
    let init = state.payments().initialize(&user, body.order_id).await?;
    Ok(Envelope::ok("Payment initialized successfully", init))
}

pub async fn verify(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<VerifyQuery>,
) -> Result<Envelope<Payment>> {
    let reference = query.reference.unwrap_or_default();
    let payment = state.payments().verify(user.id, &reference).await?;
    Ok(Envelope::ok("Payment verified successfully", payment))
}

pub async fn refund(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<RefundRequestBody>,
) -> Result<Envelope<RefundReceipt>> {
    let receipt = state
        .payments()
        .refund(user.id, body.payment_id, &body.reason, body.amount)
        .await?;
    Ok(Envelope::ok("Refund initiated successfully", receipt))
}
