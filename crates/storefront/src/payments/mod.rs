//! Payment session creation.
//!
//! The storefront never talks to the payment provider directly. A hosted
//! function receives the mapped cart lines and customer identity, creates
//! the provider session and answers with the hosted payment page URL.

mod edge_function;

use async_trait::async_trait;
use thiserror::Error;

use manipedi_core::CheckoutSessionRequest;

pub use edge_function::EdgeFunctionGateway;

/// Errors that can occur when creating a payment session.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Function returned a non-success status without an error message.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Function answered with an `{ error }` body.
    #[error("Payment session rejected: {0}")]
    Rejected(String),

    /// Function answered without a redirect URL.
    #[error("Payment session response has no URL")]
    MissingUrl,

    /// Function answered with something that is not an absolute http(s) URL.
    #[error("Payment session URL is invalid: {0}")]
    InvalidUrl(String),
}

/// A created payment session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    /// Hosted payment page to redirect the visitor to.
    pub url: String,
}

/// Creates hosted payment sessions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a session for `request`. Called at most once per submission;
    /// there are no retries.
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<PaymentSession, PaymentError>;
}
