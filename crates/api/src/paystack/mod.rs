//! Paystack payment gateway.
//!
//! # Endpoints
//!
//! - `POST /transaction/initialize` - Start a checkout, returns an authorization URL
//! - `GET /transaction/verify/{reference}` - Look up the outcome of a checkout
//! - `POST /refund` - Refund a settled transaction
//!
//! Amounts cross this boundary as integer minor units (kobo).

mod client;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::PaystackClient;
pub use types::{
    InitializeRequest, InitializedTransaction, RefundOutcome, RefundRequest,
    VerifiedTransaction,
};

/// Errors that can occur when talking to Paystack.
#[derive(Debug, Error)]
pub enum PaystackError {
    /// HTTP transport failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Paystack answered with a non-success HTTP status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response envelope, if any.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// The envelope came back with `"status": false`.
    #[error("request unsuccessful: {0}")]
    Unsuccessful(String),
}

impl PaystackError {
    /// Transport errors and 5xx responses are worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::Unsuccessful(_) => false,
        }
    }
}

/// The gateway operations the payment service depends on.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a transaction.
    async fn initialize_transaction(
        &self,
        request: &InitializeRequest,
    ) -> Result<InitializedTransaction, PaystackError>;

    /// Fetch the current state of a transaction.
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, PaystackError>;

    /// Refund a transaction, fully or partially.
    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, PaystackError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paystack_error_display() {
        let err = PaystackError::Api {
            status: 401,
            message: "Invalid key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): Invalid key");

        let err = PaystackError::Unsuccessful("Transaction reference not found".to_string());
        assert_eq!(
            err.to_string(),
            "request unsuccessful: Transaction reference not found"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            PaystackError::Api {
                status: 502,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !PaystackError::Api {
                status: 400,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!PaystackError::Unsuccessful("declined".into()).is_retryable());
        assert!(!PaystackError::Parse("bad json".into()).is_retryable());
    }
}
