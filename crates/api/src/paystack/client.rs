//! HTTP client for the Paystack API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::PaystackConfig;

use super::types::{
    Envelope, InitializeRequest, InitializedTransaction, RefundOutcome, RefundRequest,
    VerifiedTransaction,
};
use super::{PaymentGateway, PaystackError};

const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);
const MAX_ERROR_BODY: usize = 200;

/// Paystack API client.
///
/// Every request carries the configured timeout. Transport errors and 5xx
/// responses are retried up to `max_retries` times with linear backoff; a
/// retried call sends the same body, so the transaction reference is reused.
#[derive(Clone)]
pub struct PaystackClient {
    inner: Arc<PaystackClientInner>,
}

struct PaystackClientInner {
    client: reqwest::Client,
    base_url: Url,
    max_retries: u32,
    backoff: Duration,
}

impl std::fmt::Debug for PaystackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("max_retries", &self.inner.max_retries)
            .finish_non_exhaustive()
    }
}

impl PaystackClient {
    /// Create a new Paystack client.
    ///
    /// # Errors
    ///
    /// Returns `PaystackError::Parse` if the base URL or secret key cannot be
    /// used, or `PaystackError::Http` if the HTTP client cannot be built.
    pub fn new(config: &PaystackConfig) -> Result<Self, PaystackError> {
        Self::with_backoff(config, DEFAULT_BACKOFF)
    }

    /// Create a client with a custom retry backoff step.
    ///
    /// # Errors
    ///
    /// Same as [`PaystackClient::new`].
    pub fn with_backoff(config: &PaystackConfig, backoff: Duration) -> Result<Self, PaystackError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| PaystackError::Parse(format!("invalid base URL: {e}")))?;

        let mut auth =
            HeaderValue::from_str(&format!("Bearer {}", config.secret_key.expose_secret()))
                .map_err(|_| PaystackError::Parse("secret key is not a valid header".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(PaystackClientInner {
                client,
                base_url,
                max_retries: config.max_retries,
                backoff,
            }),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PaystackError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PaystackError::Parse("base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, retrying transient failures, and return the envelope `data`.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<Value, PaystackError> {
        let mut attempt: u32 = 0;
        loop {
            match self.send_once(method.clone(), url.clone(), body.as_ref()).await {
                Err(e) if e.is_retryable() && attempt < self.inner.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_retries = self.inner.max_retries,
                        "Paystack request failed, retrying"
                    );
                    tokio::time::sleep(self.inner.backoff * attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<Value, PaystackError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let envelope = serde_json::from_str::<Envelope>(&text).ok();

        if !status.is_success() {
            let message = envelope.map_or_else(
                || text.chars().take(MAX_ERROR_BODY).collect(),
                |e| e.message,
            );
            return Err(PaystackError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope
            .ok_or_else(|| PaystackError::Parse("response is not a Paystack envelope".into()))?;
        if !envelope.status {
            return Err(PaystackError::Unsuccessful(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| PaystackError::Parse("response has no data".into()))
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, PaystackError> {
    serde_json::to_value(value).map_err(|e| PaystackError::Parse(e.to_string()))
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[instrument(skip(self, request), fields(reference = %request.reference, amount = request.amount))]
    async fn initialize_transaction(
        &self,
        request: &InitializeRequest,
    ) -> Result<InitializedTransaction, PaystackError> {
        let url = self.endpoint(&["transaction", "initialize"])?;
        let data = self.send(Method::POST, url, Some(to_body(request)?)).await?;
        serde_json::from_value(data).map_err(|e| PaystackError::Parse(e.to_string()))
    }

    #[instrument(skip(self))]
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, PaystackError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;
        let data = self.send(Method::GET, url, None).await?;
        VerifiedTransaction::from_data(data).map_err(|e| PaystackError::Parse(e.to_string()))
    }

    #[instrument(skip(self, request), fields(transaction = %request.transaction))]
    async fn create_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, PaystackError> {
        let url = self.endpoint(&["refund"])?;
        let data = self.send(Method::POST, url, Some(to_body(request)?)).await?;
        Ok(RefundOutcome::from_data(data))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;

    const KEY: &str = "sk_test_4f9c2a7be13d08e6a5b9c1f2d7e4038a6b5c9d1e";

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String, max_retries: u32) -> PaystackClient {
        let config = PaystackConfig {
            secret_key: SecretString::from(KEY),
            base_url,
            callback_url: None,
            timeout: Duration::from_secs(5),
            max_retries,
        };
        PaystackClient::with_backoff(&config, Duration::from_millis(1)).unwrap()
    }

    fn init_request() -> InitializeRequest {
        InitializeRequest {
            email: "ada@example.ng".into(),
            amount: 3000,
            currency: "NGN".into(),
            reference: "7c1f4a52-reference".into(),
            callback_url: None,
            metadata: json!({ "order_id": 1, "payment_id": 2 }),
        }
    }

    #[tokio::test]
    async fn test_initialize_sends_bearer_and_parses_data() {
        async fn initialize(headers: AxumHeaders, Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(
                headers.get("authorization").unwrap().to_str().unwrap(),
                format!("Bearer {KEY}")
            );
            assert_eq!(body["amount"], 3000);
            Json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/0peioxfhpn",
                    "access_code": "0peioxfhpn",
                    "reference": body["reference"]
                }
            }))
        }

        let base = serve(Router::new().route("/transaction/initialize", post(initialize))).await;
        let initialized = client(base, 0)
            .initialize_transaction(&init_request())
            .await
            .unwrap();
        assert_eq!(initialized.access_code, "0peioxfhpn");
        assert_eq!(initialized.reference, "7c1f4a52-reference");
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope_is_an_error() {
        async fn initialize() -> Json<Value> {
            Json(json!({ "status": false, "message": "Duplicate Transaction Reference" }))
        }

        let base = serve(Router::new().route("/transaction/initialize", post(initialize))).await;
        let err = client(base, 2)
            .initialize_transaction(&init_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PaystackError::Unsuccessful(m) if m.contains("Duplicate")));
    }

    #[tokio::test]
    async fn test_verify_retries_server_errors_then_succeeds() {
        async fn verify(
            State(calls): State<Arc<AtomicU32>>,
            Path(reference): Path<String>,
        ) -> (StatusCode, Json<Value>) {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                return (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "status": false, "message": "upstream" })),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "status": true,
                    "message": "Verification successful",
                    "data": { "status": "success", "reference": reference, "gateway_response": "Approved" }
                })),
            )
        }

        let calls = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route("/transaction/verify/{reference}", get(verify))
            .with_state(calls.clone());
        let base = serve(router).await;

        let verified = client(base, 2).verify_transaction("ref-123").await.unwrap();
        assert!(verified.is_success());
        assert_eq!(verified.reference.as_deref(), Some("ref-123"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        async fn verify(State(calls): State<Arc<AtomicU32>>) -> StatusCode {
            calls.fetch_add(1, Ordering::SeqCst);
            StatusCode::SERVICE_UNAVAILABLE
        }

        let calls = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route("/transaction/verify/{reference}", get(verify))
            .with_state(calls.clone());
        let base = serve(router).await;

        let err = client(base, 1).verify_transaction("ref-123").await.unwrap_err();
        assert!(matches!(err, PaystackError::Api { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        async fn refund(State(calls): State<Arc<AtomicU32>>) -> (StatusCode, Json<Value>) {
            calls.fetch_add(1, Ordering::SeqCst);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": false, "message": "Transaction has been fully reversed" })),
            )
        }

        let calls = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route("/refund", post(refund))
            .with_state(calls.clone());
        let base = serve(router).await;

        let err = client(base, 3)
            .create_refund(&RefundRequest {
                transaction: "T1".into(),
                amount: None,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, PaystackError::Api { status: 400, message } if message.contains("reversed"))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
