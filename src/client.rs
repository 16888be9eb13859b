//! Generic venue REST client.
//!
//! One client type serves every configured venue: the venue's endpoint
//! table says where an operation goes, the venue's
//! [`AuthScheme`](crate::auth::AuthScheme) says how to sign it, and the
//! dispatch bridge turns the blocking round trip into a future. Per-venue adapter code reduces to building parameter lists
//! and decoding normalized records.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{CredentialsProvider, IncreasingNonce, NonceProvider, SigningStrategy};
use crate::dispatch::{DispatchFuture, Dispatcher};
use crate::error::{ApiError, ExchangeError};
use crate::request::{HttpMethod, SignedRequest, SigningContext, encode_pairs};
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};
use crate::venue::{BodyStyle, VenueConfig};

/// Request parameters as ordered name/value pairs.
pub type Params = Vec<(String, String)>;

/// A REST client for one venue.
///
/// Cheap to clone; all clones share the same credentials, nonce generator
/// and transport. Concurrent in-flight operations are safe: the nonce
/// generator is the only shared mutable state and it is atomic.
///
/// # Example
///
/// ```rust,no_run
/// use exchange_api_client::client::VenueClient;
/// use exchange_api_client::registry::VenueRegistry;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = VenueRegistry::builtin();
///     let venue = registry.get("binance").unwrap().clone();
///     let client = VenueClient::builder(venue).build();
///
///     let depth = client
///         .call("fetch_order_book", vec![("symbol".into(), "BTCUSDT".into())])
///         .await?;
///     println!("{depth}");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct VenueClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    venue: VenueConfig,
    transport: Arc<dyn HttpTransport>,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Arc<dyn NonceProvider>,
    dispatcher: Dispatcher,
}

impl VenueClient {
    /// Create a builder for the given venue config.
    pub fn builder(venue: VenueConfig) -> VenueClientBuilder {
        VenueClientBuilder::new(venue)
    }

    /// The venue this client talks to.
    pub fn venue(&self) -> &VenueConfig {
        &self.inner.venue
    }

    /// Dispatch an arbitrary blocking operation through the bridge.
    ///
    /// This is one of the two public entry points of the core; adapters
    /// use it to wrap composite synchronous flows (e.g. fetch-then-parse
    /// against several endpoints) into a single future.
    pub fn dispatch<T, F>(&self, work: F) -> DispatchFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ExchangeError> + Send + 'static,
    {
        self.inner.dispatcher.dispatch(work)
    }

    /// Invoke a named operation asynchronously and return the raw JSON.
    ///
    /// No ordering is guaranteed between concurrent calls; a caller that
    /// must pace requests awaits each future before issuing the next.
    pub fn call(&self, operation: &str, params: Params) -> DispatchFuture<Value> {
        let client = self.clone();
        let operation = operation.to_string();
        self.inner
            .dispatcher
            .dispatch(move || client.execute(&operation, params))
    }

    /// Invoke a named operation asynchronously and decode the JSON into a
    /// typed record.
    pub fn call_as<T>(&self, operation: &str, params: Params) -> DispatchFuture<T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let operation = operation.to_string();
        self.inner.dispatcher.dispatch(move || {
            let value = client.execute(&operation, params)?;
            Ok(serde_json::from_value(value)?)
        })
    }

    /// Invoke a named operation synchronously.
    ///
    /// Blocks on network I/O; the async surface ([`VenueClient::call`])
    /// runs this through the dispatch bridge.
    pub fn execute(&self, operation: &str, params: Params) -> Result<Value, ExchangeError> {
        let endpoint = self
            .inner
            .venue
            .get_endpoint(operation)
            .ok_or_else(|| {
                ExchangeError::UnknownEndpoint(format!(
                    "{} has no operation '{}'",
                    self.inner.venue.id, operation
                ))
            })?
            .clone();

        debug!(
            venue = %self.inner.venue.id,
            operation,
            path = %endpoint.path,
            "executing operation"
        );

        let request = if endpoint.authenticated {
            self.sign_request(endpoint.method, &endpoint.path, params)?
        } else {
            self.build_public_request(endpoint.method, &endpoint.path, params)
        };

        let response = self.inner.transport.execute(&request)?;
        self.interpret_response(response)
    }

    /// Build and sign a request against this venue's auth scheme.
    ///
    /// This is the other public entry point of the core: given the raw
    /// `(method, path, params)` triple from an adapter, it generates the
    /// nonce, routes parameters, constructs the signing context and hands
    /// back the `(url, headers, body)` the adapter passes to a transport.
    pub fn sign_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
    ) -> Result<SignedRequest, ExchangeError> {
        let credentials = self
            .inner
            .credentials
            .as_ref()
            .ok_or(ExchangeError::MissingCredentials)?
            .get_credentials();

        let auth = &self.inner.venue.auth;
        let nonce = self.inner.nonce_provider.next_nonce();
        let timestamp_ms = current_time_millis();

        // Route parameters to query vs body. The query-string pattern
        // signs the query only, so everything goes there regardless of
        // method; otherwise non-GET parameters travel in the body.
        let signs_query = matches!(auth.strategy, SigningStrategy::QueryString { .. });
        let (mut query, mut body_pairs) = if signs_query || !method.sends_body() {
            (params, Vec::new())
        } else {
            (Vec::new(), params)
        };

        if let Some(name) = &auth.nonce_param {
            let pair = (name.clone(), nonce.to_string());
            if signs_query || !method.sends_body() {
                query.push(pair);
            } else {
                body_pairs.push(pair);
            }
        }

        // Query-string venues carry no body; GET requests carry none
        // either. Other methods sign an empty body when params are empty.
        let body = if signs_query || !method.sends_body() {
            None
        } else {
            Some(self.encode_body(&body_pairs)?)
        };

        let ctx = SigningContext {
            method,
            path: path.to_string(),
            query,
            body,
            nonce,
            timestamp_ms,
        };

        let mut signed = auth.sign(credentials, &self.inner.venue.base_url, &ctx)?;
        if signed.body.is_some() {
            signed.headers.push((
                "Content-Type".to_string(),
                self.inner.venue.body_style.content_type().to_string(),
            ));
        }
        Ok(signed)
    }

    /// Build an unsigned request for a public endpoint.
    fn build_public_request(&self, method: HttpMethod, path: &str, params: Params) -> SignedRequest {
        let (query, body_pairs) = if method.sends_body() {
            (Vec::new(), params)
        } else {
            (params, Vec::new())
        };

        let query_string = encode_pairs(&query);
        let url = if query_string.is_empty() {
            format!("{}{}", self.inner.venue.base_url, path)
        } else {
            format!("{}{}?{}", self.inner.venue.base_url, path, query_string)
        };

        let mut headers = Vec::new();
        let body = if body_pairs.is_empty() && !method.sends_body() {
            None
        } else {
            headers.push((
                "Content-Type".to_string(),
                self.inner.venue.body_style.content_type().to_string(),
            ));
            // Public POST bodies use the same encoding as private ones;
            // encoding failures cannot occur for plain string pairs.
            Some(self.encode_body(&body_pairs).unwrap_or_default())
        };

        SignedRequest::new(method, url, headers, body)
    }

    fn encode_body(&self, pairs: &[(String, String)]) -> Result<String, ExchangeError> {
        match self.inner.venue.body_style {
            BodyStyle::FormUrlEncoded => Ok(encode_pairs(pairs)),
            BodyStyle::Json => {
                let map: serde_json::Map<String, Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                Ok(serde_json::to_string(&Value::Object(map))?)
            }
        }
    }

    /// Map an HTTP response into JSON or a typed error.
    fn interpret_response(&self, response: HttpResponse) -> Result<Value, ExchangeError> {
        if (200..300).contains(&response.status) {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&response.body).map_err(|e| {
                ExchangeError::InvalidResponse(format!(
                    "Failed to parse response: {e}. Body: {}",
                    truncate(&response.body)
                ))
            });
        }

        let api_error = extract_api_error(&response);
        if api_error.is_auth_failure() {
            warn!(
                venue = %self.inner.venue.id,
                status = response.status,
                "venue rejected authentication; retries must use a fresh nonce"
            );
            return Err(ExchangeError::AuthRejected(api_error));
        }
        Err(ExchangeError::Api(api_error))
    }
}

impl std::fmt::Debug for VenueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenueClient")
            .field("venue", &self.inner.venue.id)
            .field("base_url", &self.inner.venue.base_url)
            .field("has_credentials", &self.inner.credentials.is_some())
            .finish()
    }
}

/// Pull a venue error code/message out of a failed response body.
///
/// Bodies are venue-specific; this looks for the common `code` and
/// `msg`/`message`/`error` keys and otherwise carries a body excerpt.
fn extract_api_error(response: &HttpResponse) -> ApiError {
    let mut error = ApiError::new(response.status, truncate(&response.body));

    if let Ok(value) = serde_json::from_str::<Value>(&response.body) {
        let message = value
            .get("msg")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(message) = message {
            error.message = message;
        }
        let code = match value.get("code") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        if let Some(code) = code {
            error = error.with_code(code);
        }
    }
    error
}

fn truncate(body: &str) -> String {
    const MAX: usize = 256;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Builder for [`VenueClient`].
pub struct VenueClientBuilder {
    venue: VenueConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Option<Arc<dyn NonceProvider>>,
    dispatcher: Option<Dispatcher>,
}

impl VenueClientBuilder {
    /// Create a builder with default settings.
    pub fn new(venue: VenueConfig) -> Self {
        Self {
            venue,
            transport: None,
            credentials: None,
            nonce_provider: None,
            dispatcher: None,
        }
    }

    /// Override the venue base URL (useful for tests against a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.venue.base_url = url.into();
        self
    }

    /// Set the credentials provider for authenticated operations.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom nonce provider.
    pub fn nonce_provider(mut self, provider: Arc<dyn NonceProvider>) -> Self {
        self.nonce_provider = Some(provider);
        self
    }

    /// Set a custom transport (stub transports in tests, shared pools).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set a custom dispatcher, e.g. bound to a specific runtime handle.
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Build the client.
    ///
    /// # Panics
    ///
    /// Panics when no dispatcher was supplied and there is no current
    /// tokio runtime.
    pub fn build(self) -> VenueClient {
        VenueClient {
            inner: Arc::new(ClientInner {
                venue: self.venue,
                transport: self
                    .transport
                    .unwrap_or_else(|| Arc::new(ReqwestTransport::default())),
                credentials: self.credentials,
                nonce_provider: self
                    .nonce_provider
                    .unwrap_or_else(|| Arc::new(IncreasingNonce::new())),
                dispatcher: self.dispatcher.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        AuthScheme, CounterNonce, HashAlgorithm, PreimageField, SignatureEncoding,
        SignaturePlacement, StaticCredentials, hmac_sign,
    };
    use crate::venue::Endpoint;
    use std::sync::Mutex;

    /// Transport stub that records every request and replays a canned
    /// response.
    struct RecordingTransport {
        requests: Mutex<Vec<SignedRequest>>,
        response: HttpResponse,
    }

    impl RecordingTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                response: HttpResponse {
                    status,
                    body: body.to_string(),
                },
            })
        }

        fn last_request(&self) -> SignedRequest {
            self.requests.lock().unwrap().last().unwrap().clone()
        }
    }

    impl HttpTransport for RecordingTransport {
        fn execute(&self, request: &SignedRequest) -> Result<HttpResponse, ExchangeError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn concat_venue() -> VenueConfig {
        let auth = AuthScheme::new(
            SigningStrategy::Concatenation {
                algorithm: HashAlgorithm::Sha256,
                encoding: SignatureEncoding::Hex,
                digest: None,
                fields: vec![
                    PreimageField::Nonce,
                    PreimageField::Method,
                    PreimageField::Path,
                    PreimageField::Body,
                ],
            },
            SignaturePlacement::Header("X-Auth-Signature".to_string()),
        )
        .api_key_header("X-Auth-Key")
        .nonce_header("X-Auth-Nonce");

        VenueConfig::new("testvenue", "https://api.test", auth)
            .endpoint("fetch_ticker", Endpoint::public("/ticker", HttpMethod::Get))
            .endpoint("create_order", Endpoint::private("/orders", HttpMethod::Post))
            .endpoint("fetch_balance", Endpoint::private("/balance", HttpMethod::Get))
    }

    fn build_client(transport: Arc<RecordingTransport>) -> VenueClient {
        VenueClient::builder(concat_venue())
            .transport(transport)
            .credentials(Arc::new(StaticCredentials::new("test_key", "abc")))
            .nonce_provider(Arc::new(CounterNonce::starting_at(999)))
            .dispatcher(Dispatcher::from_handle(test_runtime().handle().clone()))
            .build()
    }

    fn test_runtime() -> &'static tokio::runtime::Runtime {
        use std::sync::OnceLock;
        static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
        RUNTIME.get_or_init(|| tokio::runtime::Runtime::new().unwrap())
    }

    #[test]
    fn test_public_get_routes_params_to_query() {
        let transport = RecordingTransport::new(200, r#"{"last":"50000"}"#);
        let client = build_client(transport.clone());

        let value = client
            .execute("fetch_ticker", vec![("pair".into(), "BTC/USD".into())])
            .unwrap();

        assert_eq!(value["last"], "50000");
        let request = transport.last_request();
        assert_eq!(request.url, "https://api.test/ticker?pair=BTC%2FUSD");
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_private_post_signs_transmitted_body() {
        let transport = RecordingTransport::new(200, r#"{"id":"1"}"#);
        let client = build_client(transport.clone());

        client
            .execute(
                "create_order",
                vec![
                    ("side".into(), "buy".into()),
                    ("volume".into(), "0.5".into()),
                ],
            )
            .unwrap();

        let request = transport.last_request();
        let body = request.body.as_deref().unwrap();
        assert_eq!(body, "side=buy&volume=0.5");

        // Recompute the signature over what was actually transmitted; it
        // must match the header the signer emitted (sign/transmit
        // equivalence, observed from the transport side).
        let nonce = request.header("X-Auth-Nonce").unwrap();
        let preimage = format!("{nonce}POST/orders{body}");
        let expected = hmac_sign(
            HashAlgorithm::Sha256,
            SignatureEncoding::Hex,
            b"abc",
            preimage.as_bytes(),
        )
        .unwrap();
        assert_eq!(request.header("X-Auth-Signature").unwrap(), expected);
        assert_eq!(request.header("X-Auth-Key").unwrap(), "test_key");
        assert_eq!(
            request.header("Content-Type").unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_nonces_increase_across_requests() {
        let transport = RecordingTransport::new(200, "{}");
        let client = build_client(transport.clone());

        client.execute("fetch_balance", vec![]).unwrap();
        let first: u64 = transport.last_request().header("X-Auth-Nonce").unwrap().parse().unwrap();
        client.execute("fetch_balance", vec![]).unwrap();
        let second: u64 = transport.last_request().header("X-Auth-Nonce").unwrap().parse().unwrap();

        assert!(second > first);
    }

    #[test]
    fn test_unknown_operation() {
        let transport = RecordingTransport::new(200, "{}");
        let client = build_client(transport);

        let result = client.execute("fetch_funding_rate", vec![]);
        assert!(matches!(result, Err(ExchangeError::UnknownEndpoint(_))));
    }

    #[test]
    fn test_private_without_credentials() {
        let transport = RecordingTransport::new(200, "{}");
        let client = VenueClient::builder(concat_venue())
            .transport(transport)
            .dispatcher(Dispatcher::from_handle(test_runtime().handle().clone()))
            .build();

        let result = client.execute("fetch_balance", vec![]);
        assert!(matches!(result, Err(ExchangeError::MissingCredentials)));
    }

    #[test]
    fn test_auth_rejection_mapping() {
        let transport =
            RecordingTransport::new(401, r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#);
        let client = build_client(transport);

        let result = client.execute("fetch_balance", vec![]);
        match result {
            Err(ExchangeError::AuthRejected(api)) => {
                assert_eq!(api.status, 401);
                assert_eq!(api.code.as_deref(), Some("-1022"));
                assert!(api.message.contains("not valid"));
            }
            other => panic!("expected AuthRejected, got {other:?}"),
        }
    }

    #[test]
    fn test_non_auth_error_mapping() {
        let transport = RecordingTransport::new(400, r#"{"message":"Invalid order size"}"#);
        let client = build_client(transport);

        let result = client.execute("fetch_balance", vec![]);
        match result {
            Err(ExchangeError::Api(api)) => {
                assert_eq!(api.status, 400);
                assert_eq!(api.message, "Invalid order size");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_query_string_venue_routes_everything_to_query() {
        let auth = AuthScheme::new(
            SigningStrategy::QueryString {
                algorithm: HashAlgorithm::Sha256,
                encoding: SignatureEncoding::Hex,
                sort_parameters: true,
            },
            SignaturePlacement::QueryParam("signature".to_string()),
        )
        .api_key_header("X-MBX-APIKEY")
        .nonce_param("timestamp");

        let venue = VenueConfig::new("qsvenue", "https://api.test", auth)
            .endpoint("create_order", Endpoint::private("/api/v3/order", HttpMethod::Post));

        let transport = RecordingTransport::new(200, "{}");
        let client = VenueClient::builder(venue)
            .transport(transport.clone())
            .credentials(Arc::new(StaticCredentials::new("k", "test_secret")))
            .nonce_provider(Arc::new(CounterNonce::starting_at(1699999999999)))
            .dispatcher(Dispatcher::from_handle(test_runtime().handle().clone()))
            .build();

        client
            .execute("create_order", vec![("symbol".into(), "BTCUSDT".into())])
            .unwrap();

        let request = transport.last_request();
        assert!(request.body.is_none());
        assert_eq!(
            request.url,
            "https://api.test/api/v3/order?symbol=BTCUSDT&timestamp=1700000000000\
             &signature=343e1db965b0f65fd501d970a8af06c8351ec494fd09157959b8733639533d65"
        );
    }
}
