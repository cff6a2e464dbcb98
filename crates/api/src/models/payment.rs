//! Payment and refund records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};

use luxuffy_core::{
    Currency, OrderId, PaymentId, PaymentMethod, RefundId, TransactionStatus, UserId,
};

/// A gateway transaction paying for one order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
    /// Our reference, sent to the gateway.
    pub reference: String,
    /// Reference reported back by the gateway on verification.
    pub gateway_reference: Option<String>,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub currency: String,
    pub gateway_response: Option<Value>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Metadata attached to the payment and forwarded to the gateway.
    #[must_use]
    pub fn metadata_for(order_id: OrderId, payment_id: PaymentId) -> Value {
        json!({ "order_id": order_id, "payment_id": payment_id })
    }

    /// Reference to quote when refunding this payment.
    #[must_use]
    pub fn refund_transaction(&self) -> &str {
        self.gateway_reference.as_deref().unwrap_or(&self.reference)
    }
}

/// A payment to insert in `pending` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub reference: String,
    pub payment_method: PaymentMethod,
    pub currency: Currency,
}

/// What a successful verification records on the payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettlement {
    pub gateway_reference: Option<String>,
    pub gateway_response: Value,
    pub paid_at: DateTime<Utc>,
}

/// A refund against a successful payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRefund {
    pub id: RefundId,
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub reference: String,
    pub gateway_reference: Option<String>,
    pub status: TransactionStatus,
    pub reason: String,
    pub gateway_response: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A refund to insert in `pending` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRefund {
    pub payment_id: PaymentId,
    pub amount: Decimal,
    pub reference: String,
    pub reason: String,
}

/// What a successful gateway refund records on the refund.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundSettlement {
    pub gateway_reference: Option<String>,
    pub gateway_response: Value,
    pub processed_at: DateTime<Utc>,
}

/// Returned to the client after initializing a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInitialization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Returned to the client after a refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundReceipt {
    pub reference: String,
    pub status: TransactionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_carries_ids() {
        let metadata = Payment::metadata_for(OrderId::new(4), PaymentId::new(9));
        assert_eq!(metadata, json!({ "order_id": 4, "payment_id": 9 }));
    }
}
