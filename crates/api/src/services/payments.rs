//! Payments through the gateway.
//!
//! A local row is written before every gateway call. When the call fails the
//! row is deleted again, so a failed initialize or refund leaves nothing
//! behind.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use luxuffy_core::{Currency, OrderId, PaymentId, TransactionStatus, UserId, to_minor_units};

use super::ServiceError;
use crate::db::RepositoryError;
use crate::models::{
    NewPayment, NewRefund, Payment, PaymentInitialization, PaymentSettlement, RefundReceipt,
    RefundSettlement, User,
};
use crate::paystack::{InitializeRequest, PaymentGateway, RefundRequest};
use crate::store::CommerceStore;

const PAYMENT_EXISTS: &str = "Payment already exists for this order";

fn minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    to_minor_units(amount).map_err(|e| ServiceError::invalid_field("amount", e.to_string()))
}

pub struct PaymentService<'a> {
    store: &'a dyn CommerceStore,
    gateway: &'a dyn PaymentGateway,
    currency: Currency,
    callback_url: Option<&'a str>,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn CommerceStore,
        gateway: &'a dyn PaymentGateway,
        currency: Currency,
    ) -> Self {
        Self {
            store,
            gateway,
            currency,
            callback_url: None,
        }
    }

    /// Where the gateway sends the customer after checkout.
    #[must_use]
    pub const fn with_callback_url(mut self, callback_url: Option<&'a str>) -> Self {
        self.callback_url = callback_url;
        self
    }

    /// Start paying for an order.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order is not the user's, `Validation` if the order
    /// already has a payment, `Gateway` if the gateway refused.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn initialize(
        &self,
        user: &User,
        order_id: OrderId,
    ) -> Result<PaymentInitialization, ServiceError> {
        let order = self
            .store
            .order_for_user(user.id, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order"))?;
        if self.store.payment_for_order(order.id).await?.is_some() {
            return Err(ServiceError::validation(PAYMENT_EXISTS));
        }
        let amount = minor_units(order.total_amount)?;

        let payment = self
            .store
            .create_payment(&NewPayment {
                order_id: order.id,
                user_id: user.id,
                amount: order.total_amount,
                reference: Uuid::new_v4().to_string(),
                payment_method: order.payment_method,
                currency: self.currency,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ServiceError::validation(PAYMENT_EXISTS),
                other => other.into(),
            })?;

        let request = InitializeRequest {
            email: user.email.as_str().to_owned(),
            amount,
            currency: self.currency.code().to_owned(),
            reference: payment.reference.clone(),
            callback_url: self.callback_url.map(String::from),
            metadata: payment.metadata.clone(),
        };

        match self.gateway.initialize_transaction(&request).await {
            Ok(initialized) => {
                tracing::info!(
                    payment_id = %payment.id,
                    reference = %payment.reference,
                    "Payment initialized"
                );
                Ok(PaymentInitialization {
                    authorization_url: initialized.authorization_url,
                    access_code: initialized.access_code,
                    reference: payment.reference,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, payment_id = %payment.id, "Gateway initialize failed");
                if let Err(cleanup) = self.store.delete_payment(payment.id).await {
                    tracing::error!(error = %cleanup, payment_id = %payment.id, "Failed to remove payment");
                }
                Err(ServiceError::Gateway("Failed to initialize payment".into()))
            }
        }
    }

    /// Check a payment with the gateway and record it as paid on success.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank reference, `NotFound` if no payment of the
    /// user has it, `Gateway` unless the gateway reports `success`.
    #[instrument(skip(self))]
    pub async fn verify(&self, user_id: UserId, reference: &str) -> Result<Payment, ServiceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ServiceError::invalid_field(
                "reference",
                "Payment reference is required",
            ));
        }
        let payment = self
            .store
            .payment_by_reference(user_id, reference)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment"))?;

        let verified = match self.gateway.verify_transaction(reference).await {
            Ok(verified) if verified.is_success() => verified,
            Ok(verified) => {
                tracing::warn!(status = %verified.status, "Payment not settled");
                return Err(ServiceError::Gateway("Payment verification failed".into()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gateway verify failed");
                return Err(ServiceError::Gateway("Payment verification failed".into()));
            }
        };

        let settled = self
            .store
            .settle_payment(
                payment.id,
                &PaymentSettlement {
                    gateway_reference: verified.reference,
                    gateway_response: verified.raw,
                    paid_at: Utc::now(),
                },
            )
            .await?;
        tracing::info!(payment_id = %settled.id, order_id = %settled.order_id, "Payment settled");
        Ok(settled)
    }

    /// Refund a successful payment, fully or in part.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank reason, a payment that has not succeeded or
    /// an amount outside `(0, remaining]`, where `remaining` is the payment
    /// amount less earlier refunds; `NotFound` if the payment is not the
    /// user's; `Gateway` if the gateway refused.
    #[instrument(skip(self, reason))]
    pub async fn refund(
        &self,
        user_id: UserId,
        payment_id: PaymentId,
        reason: &str,
        amount: Option<Decimal>,
    ) -> Result<RefundReceipt, ServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::invalid_field(
                "reason",
                "This field may not be blank.",
            ));
        }
        let payment = self
            .store
            .payment_for_user(user_id, payment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment"))?;
        if payment.status != TransactionStatus::Success {
            return Err(ServiceError::validation(
                "Only successful payments can be refunded",
            ));
        }
        let remaining = payment.amount - self.store.refunded_total(payment.id).await?;
        if remaining <= Decimal::ZERO {
            return Err(ServiceError::validation("Payment has already been fully refunded"));
        }
        if let Some(requested) = amount
            && (requested <= Decimal::ZERO || requested > remaining)
        {
            return Err(ServiceError::invalid_field(
                "amount",
                format!("Refund amount must be greater than 0 and at most {remaining}"),
            ));
        }
        // A full refund after a partial one asks the gateway for the remainder only.
        let amount = amount.or((remaining < payment.amount).then_some(remaining));
        let minor = amount.map(minor_units).transpose()?;

        let refund = self
            .store
            .create_refund(&NewRefund {
                payment_id: payment.id,
                amount: amount.unwrap_or(payment.amount),
                reference: Uuid::new_v4().to_string(),
                reason: reason.to_owned(),
            })
            .await?;

        let request = RefundRequest {
            transaction: payment.refund_transaction().to_owned(),
            amount: minor,
        };
        let outcome = match self.gateway.create_refund(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, refund_id = %refund.id, "Gateway refund failed");
                if let Err(cleanup) = self.store.delete_refund(refund.id).await {
                    tracing::error!(error = %cleanup, refund_id = %refund.id, "Failed to remove refund");
                }
                return Err(ServiceError::Gateway("Failed to initiate refund".into()));
            }
        };

        let settled = self
            .store
            .settle_refund(
                refund.id,
                &RefundSettlement {
                    gateway_reference: outcome.gateway_reference,
                    gateway_response: outcome.raw,
                    processed_at: Utc::now(),
                },
            )
            .await?;
        tracing::info!(refund_id = %settled.id, amount = %settled.amount, "Refund initiated");
        Ok(RefundReceipt {
            reference: settled.reference,
            status: settled.status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use luxuffy_core::{Email, PaymentStatus};

    use super::*;
    use crate::models::{NewProduct, Order};
    use crate::paystack::testing::ScriptedGateway;
    use crate::services::{CreateOrder, OrderLineRequest, OrderService};
    use crate::store::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        gateway: ScriptedGateway,
        user: User,
        order: Order,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let user = store
                .upsert_user(&Email::parse("ada@example.ng").unwrap())
                .await
                .unwrap();
            let tote = store
                .create_product(&NewProduct {
                    category_id: None,
                    name: "Ankara Tote".into(),
                    description: String::new(),
                    price: Decimal::new(1000, 2),
                    stock_quantity: 10,
                    is_active: true,
                })
                .await
                .unwrap();
            let order = OrderService::new(&store)
                .create_order(
                    user.id,
                    &CreateOrder {
                        items: vec![OrderLineRequest {
                            product_id: tote.id,
                            quantity: 3,
                        }],
                        shipping_address: "12 Allen Avenue, Ikeja".into(),
                        payment_method: "card".into(),
                        ..CreateOrder::default()
                    },
                )
                .await
                .unwrap();
            Self {
                store,
                gateway: ScriptedGateway::new(),
                user,
                order,
            }
        }

        fn payments(&self) -> PaymentService<'_> {
            PaymentService::new(&self.store, &self.gateway, Currency::NGN)
        }

        async fn paid(&self) -> Payment {
            let init = self
                .payments()
                .initialize(&self.user, self.order.id)
                .await
                .unwrap();
            self.payments()
                .verify(self.user.id, &init.reference)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_initialize_sends_kobo_and_metadata() {
        let fx = Fixture::new().await;
        let init = fx
            .payments()
            .with_callback_url(Some("https://luxuffy.ng/checkout/done"))
            .initialize(&fx.user, fx.order.id)
            .await
            .unwrap();

        let sent = fx.gateway.initialize_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, 3000);
        assert_eq!(sent[0].currency, "NGN");
        assert_eq!(sent[0].email, "ada@example.ng");
        assert_eq!(sent[0].reference, init.reference);
        assert_eq!(
            sent[0].callback_url.as_deref(),
            Some("https://luxuffy.ng/checkout/done")
        );
        assert_eq!(sent[0].metadata["order_id"], fx.order.id.as_i64());
        assert!(Uuid::parse_str(&init.reference).is_ok());

        let payment = fx.store.payment_for_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(payment.status, TransactionStatus::Pending);
        assert_eq!(payment.amount, Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn test_second_initialize_is_rejected() {
        let fx = Fixture::new().await;
        let first = fx.payments().initialize(&fx.user, fx.order.id).await.unwrap();
        let err = fx
            .payments()
            .initialize(&fx.user, fx.order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { message, .. } if message == PAYMENT_EXISTS));

        let payment = fx.store.payment_for_order(fx.order.id).await.unwrap().unwrap();
        assert_eq!(payment.reference, first.reference);
        assert_eq!(fx.gateway.initialize_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_initialize_leaves_no_payment() {
        let fx = Fixture::new().await;
        fx.gateway.fail_initialize();
        let err = fx
            .payments()
            .initialize(&fx.user, fx.order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Gateway(m) if m == "Failed to initialize payment"));
        assert!(fx.store.payment_for_order(fx.order.id).await.unwrap().is_none());

        // A later attempt can succeed.
        fx.payments().initialize(&fx.user, fx.order.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_foreign_order_is_not_found() {
        let fx = Fixture::new().await;
        let stranger = fx
            .store
            .upsert_user(&Email::parse("bayo@example.ng").unwrap())
            .await
            .unwrap();
        let err = fx
            .payments()
            .initialize(&stranger, fx.order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "Order not found"));
    }

    #[tokio::test]
    async fn test_verify_marks_order_paid_only_on_success() {
        let fx = Fixture::new().await;
        let init = fx.payments().initialize(&fx.user, fx.order.id).await.unwrap();

        fx.gateway.verify_with_status("abandoned");
        let err = fx
            .payments()
            .verify(fx.user.id, &init.reference)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Gateway(m) if m == "Payment verification failed"));
        let order = fx.store.order_for_user(fx.user.id, fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);

        let payment = fx.payments().verify(fx.user.id, &init.reference).await.unwrap();
        assert_eq!(payment.status, TransactionStatus::Success);
        assert!(payment.paid_at.is_some());
        assert_eq!(
            payment.gateway_reference.as_deref(),
            Some(format!("PSK-{}", init.reference).as_str())
        );
        let order = fx.store.order_for_user(fx.user.id, fx.order.id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_verify_input_errors() {
        let fx = Fixture::new().await;
        let err = fx.payments().verify(fx.user.id, "  ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { message, .. } if message == "Payment reference is required"));
        let err = fx.payments().verify(fx.user.id, "missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "Payment not found"));
        assert!(fx.gateway.verify_requests().is_empty());
    }

    #[tokio::test]
    async fn test_refund_requires_successful_payment() {
        let fx = Fixture::new().await;
        fx.payments().initialize(&fx.user, fx.order.id).await.unwrap();
        let pending = fx.store.payment_for_order(fx.order.id).await.unwrap().unwrap();

        let err = fx
            .payments()
            .refund(fx.user.id, pending.id, "Changed my mind", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { message, .. } if message == "Only successful payments can be refunded"));
        assert_eq!(fx.store.refund_count().await, 0);
    }

    #[tokio::test]
    async fn test_full_refund_quotes_gateway_reference() {
        let fx = Fixture::new().await;
        let payment = fx.paid().await;

        let receipt = fx
            .payments()
            .refund(fx.user.id, payment.id, "Damaged on delivery", None)
            .await
            .unwrap();
        assert_eq!(receipt.status, TransactionStatus::Success);
        assert!(Uuid::parse_str(&receipt.reference).is_ok());

        let sent = fx.gateway.refund_requests();
        assert_eq!(sent[0].transaction, payment.refund_transaction());
        assert_eq!(sent[0].amount, None);
        assert_eq!(fx.store.refund_count().await, 1);
    }

    #[tokio::test]
    async fn test_partial_refund_amount_rules() {
        let fx = Fixture::new().await;
        let payment = fx.paid().await;
        let refunds = fx.payments();

        for bad in [Decimal::ZERO, Decimal::new(3001, 2)] {
            let err = refunds
                .refund(fx.user.id, payment.id, "Partial", Some(bad))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation { .. }));
        }
        let err = refunds
            .refund(fx.user.id, payment.id, " ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        refunds
            .refund(fx.user.id, payment.id, "Partial", Some(Decimal::new(1050, 2)))
            .await
            .unwrap();
        assert_eq!(fx.gateway.refund_requests()[0].amount, Some(1050));
    }

    #[tokio::test]
    async fn test_refunds_cannot_exceed_the_payment() {
        let fx = Fixture::new().await;
        let payment = fx.paid().await;
        let refunds = fx.payments();

        refunds
            .refund(fx.user.id, payment.id, "One missing", Some(Decimal::new(1000, 2)))
            .await
            .unwrap();
        let err = refunds
            .refund(fx.user.id, payment.id, "Too much", Some(Decimal::new(2001, 2)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref errors, .. } if errors.contains_key("amount")));

        // An amount-less refund asks for the 20.00 that is left.
        refunds
            .refund(fx.user.id, payment.id, "Rest of the order", None)
            .await
            .unwrap();
        assert_eq!(fx.gateway.refund_requests()[1].amount, Some(2000));

        let err = refunds
            .refund(fx.user.id, payment.id, "Again", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { message, .. } if message == "Payment has already been fully refunded"));
        assert_eq!(fx.store.refund_count().await, 2);
        assert_eq!(fx.gateway.refund_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refund_leaves_no_row() {
        let fx = Fixture::new().await;
        let payment = fx.paid().await;
        fx.gateway.fail_refund();

        let err = fx
            .payments()
            .refund(fx.user.id, payment.id, "Damaged", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Gateway(m) if m == "Failed to initiate refund"));
        assert_eq!(fx.store.refund_count().await, 0);
    }

    #[tokio::test]
    async fn test_refund_foreign_payment_is_not_found() {
        let fx = Fixture::new().await;
        let payment = fx.paid().await;
        let err = fx
            .payments()
            .refund(UserId::new(999), payment.id, "Not mine", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(m) if m == "Payment not found"));
    }
}
