//! Payment and refund repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use luxuffy_core::{
    OrderId, PaymentId, PaymentMethod, PaymentStatus, RefundId, TransactionStatus, UserId,
};

use super::RepositoryError;
use crate::models::{
    NewPayment, NewRefund, Payment, PaymentRefund, PaymentSettlement, RefundSettlement,
};

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, amount, reference, gateway_reference, \
                               status, payment_method, currency, gateway_response, metadata, \
                               created_at, updated_at, paid_at";

const REFUND_COLUMNS: &str = "id, payment_id, amount, reference, gateway_reference, status, \
                              reason, gateway_response, created_at, processed_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    order_id: i64,
    user_id: i64,
    amount: Decimal,
    reference: String,
    gateway_reference: Option<String>,
    status: TransactionStatus,
    payment_method: PaymentMethod,
    currency: String,
    gateway_response: Option<Json<Value>>,
    metadata: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: PaymentId::new(row.id),
            order_id: OrderId::new(row.order_id),
            user_id: UserId::new(row.user_id),
            amount: row.amount,
            reference: row.reference,
            gateway_reference: row.gateway_reference,
            status: row.status,
            payment_method: row.payment_method,
            currency: row.currency,
            gateway_response: row.gateway_response.map(|j| j.0),
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            paid_at: row.paid_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: i64,
    payment_id: i64,
    amount: Decimal,
    reference: String,
    gateway_reference: Option<String>,
    status: TransactionStatus,
    reason: String,
    gateway_response: Option<Json<Value>>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<RefundRow> for PaymentRefund {
    fn from(row: RefundRow) -> Self {
        Self {
            id: RefundId::new(row.id),
            payment_id: PaymentId::new(row.payment_id),
            amount: row.amount,
            reference: row.reference,
            gateway_reference: row.gateway_reference,
            status: row.status,
            reason: row.reason,
            gateway_response: row.gateway_response.map(|j| j.0),
            created_at: row.created_at,
            processed_at: row.processed_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for payments and refunds.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The payment of an order, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn for_order(&self, order_id: OrderId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// A user's payment by our reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn by_reference(
        &self,
        user_id: UserId,
        reference: &str,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE reference = $1 AND user_id = $2"
        ))
        .bind(reference)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// A user's payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn for_user(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND user_id = $2"
        ))
        .bind(payment_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a pending payment and stamp its metadata.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order already has a payment
    /// or the reference is taken.
    #[instrument(skip(self, new), fields(order_id = %new.order_id))]
    pub async fn create(&self, new: &NewPayment) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO payments (order_id, user_id, amount, reference, payment_method, currency)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(new.order_id)
        .bind(new.user_id)
        .bind(new.amount)
        .bind(&new.reference)
        .bind(new.payment_method)
        .bind(new.currency.code())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "payment for this order"))?;

        let payment_id = PaymentId::new(id);
        let metadata = Payment::metadata_for(new.order_id, payment_id);
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "UPDATE payments SET metadata = $2 WHERE id = $1 RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(Json(&metadata))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Remove a payment whose gateway initialization failed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, payment_id: PaymentId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(payment_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Mark a payment successful and its order paid, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment does not exist.
    #[instrument(skip(self, settlement))]
    pub async fn settle(
        &self,
        payment_id: PaymentId,
        settlement: &PaymentSettlement,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r"
            UPDATE payments
            SET status = $2,
                gateway_reference = $3,
                gateway_response = $4,
                paid_at = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "
        ))
        .bind(payment_id)
        .bind(TransactionStatus::Success)
        .bind(settlement.gateway_reference.as_deref())
        .bind(Json(&settlement.gateway_response))
        .bind(settlement.paid_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query("UPDATE orders SET payment_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(row.order_id)
            .bind(PaymentStatus::Paid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Sum of pending and successful refunds against a payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn refunded_total(&self, payment_id: PaymentId) -> Result<Decimal, RepositoryError> {
        let total: Decimal = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(amount), 0)
            FROM payment_refunds
            WHERE payment_id = $1 AND status IN ('pending', 'success')
            ",
        )
        .bind(payment_id)
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }

    /// Insert a pending refund.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference is taken.
    #[instrument(skip(self, new), fields(payment_id = %new.payment_id))]
    pub async fn create_refund(&self, new: &NewRefund) -> Result<PaymentRefund, RepositoryError> {
        let row = sqlx::query_as::<_, RefundRow>(&format!(
            r"
            INSERT INTO payment_refunds (payment_id, amount, reference, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING {REFUND_COLUMNS}
            "
        ))
        .bind(new.payment_id)
        .bind(new.amount)
        .bind(&new.reference)
        .bind(&new.reason)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "refund reference"))?;

        Ok(row.into())
    }

    /// Remove a refund the gateway rejected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_refund(&self, refund_id: RefundId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM payment_refunds WHERE id = $1")
            .bind(refund_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Mark a refund processed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the refund does not exist.
    #[instrument(skip(self, settlement))]
    pub async fn settle_refund(
        &self,
        refund_id: RefundId,
        settlement: &RefundSettlement,
    ) -> Result<PaymentRefund, RepositoryError> {
        let row = sqlx::query_as::<_, RefundRow>(&format!(
            r"
            UPDATE payment_refunds
            SET status = $2,
                gateway_reference = $3,
                gateway_response = $4,
                processed_at = $5
            WHERE id = $1
            RETURNING {REFUND_COLUMNS}
            "
        ))
        .bind(refund_id)
        .bind(TransactionStatus::Success)
        .bind(settlement.gateway_reference.as_deref())
        .bind(Json(&settlement.gateway_response))
        .bind(settlement.processed_at)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
