//! Venue configuration: base URL, auth scheme and endpoint table.
//!
//! A venue is described by data, not by a subclass: the endpoint table
//! maps stable operation names (`fetch_ticker`, `create_order`, ...) to
//! paths and methods, and the [`AuthScheme`] captures the signing
//! contract. One generic client consumes any such config.

use std::collections::HashMap;

use crate::auth::AuthScheme;
use crate::request::HttpMethod;

/// Body encoding used for non-GET requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStyle {
    /// `application/x-www-form-urlencoded`
    FormUrlEncoded,
    /// `application/json`
    Json,
}

impl BodyStyle {
    /// The Content-Type header value for this style.
    pub fn content_type(&self) -> &'static str {
        match self {
            BodyStyle::FormUrlEncoded => "application/x-www-form-urlencoded",
            BodyStyle::Json => "application/json",
        }
    }
}

/// One entry in a venue's endpoint table.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// URL path relative to the venue base URL
    pub path: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Whether the request must be signed
    pub authenticated: bool,
}

impl Endpoint {
    /// A public (unsigned) endpoint.
    pub fn public(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            authenticated: false,
        }
    }

    /// An authenticated (signed) endpoint.
    pub fn private(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            authenticated: true,
        }
    }
}

/// Static description of one venue.
#[derive(Debug, Clone)]
pub struct VenueConfig {
    /// Stable identifier, e.g. `binance`
    pub id: String,
    /// REST base URL without trailing slash
    pub base_url: String,
    /// The venue's signing contract
    pub auth: AuthScheme,
    /// Body encoding for non-GET requests
    pub body_style: BodyStyle,
    /// Operation name -> endpoint
    pub endpoints: HashMap<String, Endpoint>,
}

impl VenueConfig {
    /// Create a config with an empty endpoint table.
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, auth: AuthScheme) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            auth,
            body_style: BodyStyle::FormUrlEncoded,
            endpoints: HashMap::new(),
        }
    }

    /// Set the body encoding for non-GET requests.
    pub fn body_style(mut self, style: BodyStyle) -> Self {
        self.body_style = style;
        self
    }

    /// Add an endpoint under an operation name.
    pub fn endpoint(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        self.endpoints.insert(name.into(), endpoint);
        self
    }

    /// Look up an endpoint by operation name.
    pub fn get_endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SignaturePlacement, SigningStrategy};

    #[test]
    fn test_endpoint_table_lookup() {
        let auth = AuthScheme::new(
            SigningStrategy::BearerStatic { basic: true },
            SignaturePlacement::Header("Authorization".to_string()),
        );
        let venue = VenueConfig::new("testvenue", "https://api.test", auth)
            .endpoint("fetch_ticker", Endpoint::public("/ticker", HttpMethod::Get))
            .endpoint("create_order", Endpoint::private("/orders", HttpMethod::Post));

        let ticker = venue.get_endpoint("fetch_ticker").unwrap();
        assert!(!ticker.authenticated);
        assert_eq!(ticker.path, "/ticker");

        let order = venue.get_endpoint("create_order").unwrap();
        assert!(order.authenticated);
        assert_eq!(order.method, HttpMethod::Post);

        assert!(venue.get_endpoint("fetch_funding_rate").is_none());
    }
}
