//! A scripted [`PaymentGateway`] for tests.
//!
//! Each operation pops the next queued outcome; once its queue is empty it
//! falls back to a plausible success. Every request is recorded.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use super::types::{
    InitializeRequest, InitializedTransaction, RefundOutcome, RefundRequest, VerifiedTransaction,
};
use super::{PaymentGateway, PaystackError};

type Outcome<T> = Result<T, PaystackError>;

#[derive(Debug, Default)]
struct Script {
    initialize: VecDeque<Outcome<InitializedTransaction>>,
    verify: VecDeque<Outcome<VerifiedTransaction>>,
    refund: VecDeque<Outcome<RefundOutcome>>,
    initialize_requests: Vec<InitializeRequest>,
    verify_requests: Vec<String>,
    refund_requests: Vec<RefundRequest>,
}

/// Fake gateway with queued responses per operation.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

fn declined(message: &str) -> PaystackError {
    PaystackError::Api {
        status: 400,
        message: message.to_owned(),
    }
}

impl ScriptedGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // Poisoned locks still hold a usable script.
        self.script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// The next initialize call fails.
    pub fn fail_initialize(&self) {
        self.script()
            .initialize
            .push_back(Err(declined("Invalid key")));
    }

    /// The next verify call reports the given transaction status.
    pub fn verify_with_status(&self, status: &str) {
        let raw = json!({ "status": status, "gateway_response": "Scripted" });
        let outcome = VerifiedTransaction::from_data(raw)
            .map_err(|e| PaystackError::Parse(e.to_string()));
        self.script().verify.push_back(outcome);
    }

    /// The next verify call fails at the transport or envelope level.
    pub fn fail_verify(&self) {
        self.script()
            .verify
            .push_back(Err(PaystackError::Unsuccessful(
                "Transaction reference not found".into(),
            )));
    }

    /// The next refund call fails.
    pub fn fail_refund(&self) {
        self.script()
            .refund
            .push_back(Err(declined("Transaction has been fully reversed")));
    }

    #[must_use]
    pub fn initialize_requests(&self) -> Vec<InitializeRequest> {
        self.script().initialize_requests.clone()
    }

    #[must_use]
    pub fn verify_requests(&self) -> Vec<String> {
        self.script().verify_requests.clone()
    }

    #[must_use]
    pub fn refund_requests(&self) -> Vec<RefundRequest> {
        self.script().refund_requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initialize_transaction(
        &self,
        request: &InitializeRequest,
    ) -> Result<InitializedTransaction, PaystackError> {
        let mut script = self.script();
        script.initialize_requests.push(request.clone());
        script.initialize.pop_front().unwrap_or_else(|| {
            let access_code = request.reference.chars().take(10).collect::<String>();
            Ok(InitializedTransaction {
                authorization_url: format!("https://checkout.paystack.com/{access_code}"),
                access_code,
                reference: request.reference.clone(),
            })
        })
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, PaystackError> {
        let mut script = self.script();
        script.verify_requests.push(reference.to_owned());
        let outcome = script.verify.pop_front().unwrap_or_else(|| {
            VerifiedTransaction::from_data(json!({ "status": "success" }))
                .map_err(|e| PaystackError::Parse(e.to_string()))
        });
        drop(script);

        outcome.map(|mut verified| {
            let gateway_reference = format!("PSK-{reference}");
            verified.reference = Some(gateway_reference.clone());
            if let Some(raw) = verified.raw.as_object_mut() {
                raw.insert("reference".into(), json!(gateway_reference));
            }
            verified
        })
    }

    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, PaystackError> {
        let mut script = self.script();
        script.refund_requests.push(request.clone());
        script.refund.pop_front().unwrap_or_else(|| {
            Ok(RefundOutcome::from_data(json!({
                "transaction": { "reference": request.transaction },
                "amount": request.amount,
                "status": "pending"
            })))
        })
    }
}
