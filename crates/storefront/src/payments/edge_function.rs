//! Payment gateway backed by a hosted function (`/functions/v1/{name}`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use manipedi_core::CheckoutSessionRequest;

use super::{PaymentError, PaymentGateway, PaymentSession};
use crate::config::SupabaseConfig;

/// Calls the session-creation function with the store's API key.
#[derive(Clone)]
pub struct EdgeFunctionGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

/// Function response: `{ url }` on success, `{ error }` otherwise.
#[derive(Debug, Default, Deserialize)]
struct FunctionResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl EdgeFunctionGateway {
    /// Create a gateway with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/functions/v1/{}", config.url, config.checkout_function),
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Interpret a function reply.
fn interpret(status: reqwest::StatusCode, body: &str) -> Result<PaymentSession, PaymentError> {
    let parsed: FunctionResponse = serde_json::from_str(body).unwrap_or_default();

    if let Some(error) = parsed.error.filter(|e| !e.trim().is_empty()) {
        return Err(PaymentError::Rejected(error));
    }

    if !status.is_success() {
        return Err(PaymentError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    let url = parsed
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(PaymentError::MissingUrl)?;

    match Url::parse(&url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(PaymentSession { url }),
        _ => Err(PaymentError::InvalidUrl(url)),
    }
}

#[async_trait]
impl PaymentGateway for EdgeFunctionGateway {
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<PaymentSession, PaymentError> {
        let key = self.api_key.expose_secret();
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let result = interpret(status, &body);
        if let Err(e) = &result {
            tracing::warn!(status = %status, error = %e, "Payment session creation failed");
        }
        result
    }
}
