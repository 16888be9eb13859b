//! Error types for the exchange client library.

use thiserror::Error;

/// The main error type for all exchange client operations.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Missing required credentials
    #[error("Missing credentials: API key and secret required for authenticated endpoints")]
    MissingCredentials,

    /// Credentials present but malformed for the venue's auth scheme
    #[error("Authentication configuration error: {0}")]
    AuthConfig(String),

    /// Signing preimage construction failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// HTTP transport failed (connection, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Venue rejected the request signature or nonce
    #[error("Authentication rejected by venue: {0}")]
    AuthRejected(ApiError),

    /// Venue returned a non-authentication error
    #[error("Venue API error: {0}")]
    Api(ApiError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Unknown venue or endpoint name
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// The dispatch bridge's own bookkeeping failed (dispatched work
    /// panicked or the worker was torn down). Programming-error class.
    #[error("Dispatch internal error: {0}")]
    DispatchInternal(String),
}

impl ExchangeError {
    /// True for errors raised before any network traffic, which must never
    /// be retried (fixing the client configuration is required instead).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExchangeError::MissingCredentials
                | ExchangeError::AuthConfig(_)
                | ExchangeError::Signing(_)
        )
    }

    /// True when the venue rejected the signature or nonce. Retrying
    /// requires a freshly generated nonce; the old one is burned.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ExchangeError::AuthRejected(_))
    }
}

/// An error reported by a venue in an HTTP response.
///
/// Venue error bodies are venue-specific; this carries the HTTP status and
/// whatever code/message the generic client could extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code of the response
    pub status: u16,
    /// Venue error code, when the body carried one
    pub code: Option<String>,
    /// Human-readable error message or raw body excerpt
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "HTTP {} [{}]: {}", self.status, code, self.message),
            None => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

impl ApiError {
    /// Create a new API error from an HTTP status and message.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a venue error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Check if the venue refused the request for authentication reasons.
    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    /// Check if the venue throttled the request.
    pub fn is_rate_limit(&self) -> bool {
        self.status == 429
    }
}
