//! HTTP transport boundary.
//!
//! The core consumes a synchronous `execute` primitive and stays agnostic
//! about connection handling, TLS and timeouts. Transport failures map
//! into [`ExchangeError::Transport`]; a timeout arrives through the same
//! rejection path as any other transport error.

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::ExchangeError;
use crate::request::{HttpMethod, SignedRequest};

/// A synchronous HTTP response, as seen by the client pipeline.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

/// Synchronous HTTP execution primitive.
///
/// Implementations are invoked from the dispatch bridge's blocking pool
/// and may block freely. They must transmit the request's body verbatim;
/// rewriting it would break the sign/transmit equivalence the signer
/// guarantees.
pub trait HttpTransport: Send + Sync {
    /// Execute a signed request and return the raw response.
    fn execute(&self, request: &SignedRequest) -> Result<HttpResponse, ExchangeError>;
}

/// Default transport over `reqwest`'s blocking client.
///
/// The inner client is created lazily on first use so construction can
/// happen anywhere, while the client itself only ever lives on blocking
/// threads (`reqwest::blocking` must not run inside an async context).
pub struct ReqwestTransport {
    client: OnceLock<reqwest::blocking::Client>,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: OnceLock::new(),
            timeout,
        }
    }

    fn client(&self) -> &reqwest::blocking::Client {
        self.client.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .user_agent(concat!("exchange-api-client/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new())
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &SignedRequest) -> Result<HttpResponse, ExchangeError> {
        // Reject malformed URLs (typically a bad base_url override) before
        // touching the network.
        let url = url::Url::parse(&request.url)?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_str(name)
                .map_err(|e| ExchangeError::Signing(format!("Invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ExchangeError::Signing(format!("Invalid header value: {e}")))?;
            headers.append(name, value);
        }

        let client = self.client();
        let mut builder = match request.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
            HttpMethod::Put => client.put(url),
            HttpMethod::Delete => client.delete(url),
        }
        .headers(headers);

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(status, url = %request.url, "transport round trip complete");

        Ok(HttpResponse { status, body })
    }
}
