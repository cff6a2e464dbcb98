//! Paystack request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every Paystack response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Body of `POST /transaction/initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: Value,
}

/// `data` of a successful initialize response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    gateway_response: Option<String>,
}

/// Outcome of `GET /transaction/verify/{reference}`.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    /// Transaction status, `"success"` once money has moved.
    pub status: String,
    pub reference: Option<String>,
    /// Amount in minor units.
    pub amount: Option<i64>,
    pub gateway_response: Option<String>,
    /// The whole `data` object, kept on the payment record.
    pub raw: Value,
}

impl VerifiedTransaction {
    /// Whether the gateway settled the transaction.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Parse the `data` object of a verify response.
    ///
    /// # Errors
    ///
    /// Returns the serde error if `status` is missing.
    pub fn from_data(raw: Value) -> Result<Self, serde_json::Error> {
        let data: VerifyData = serde_json::from_value(raw.clone())?;
        Ok(Self {
            status: data.status,
            reference: data.reference,
            amount: data.amount,
            gateway_response: data.gateway_response,
            raw,
        })
    }
}

/// Body of `POST /refund`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundRequest {
    /// Reference or ID of the transaction to refund.
    pub transaction: String,
    /// Minor units. Omitted for a full refund.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

/// Outcome of a refund request.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    pub gateway_reference: Option<String>,
    pub status: Option<String>,
    pub raw: Value,
}

impl RefundOutcome {
    /// Pull the interesting fields out of a refund `data` object.
    #[must_use]
    pub fn from_data(raw: Value) -> Self {
        let gateway_reference = raw
            .pointer("/transaction/reference")
            .or_else(|| raw.get("reference"))
            .and_then(Value::as_str)
            .map(String::from);
        let status = raw.get("status").and_then(Value::as_str).map(String::from);
        Self {
            gateway_reference,
            status,
            raw,
        }
    }
}
