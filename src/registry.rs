//! Explicit venue registry.
//!
//! Built at startup and passed by value or reference into whatever
//! composes clients; there is no global mutable registry. The built-in
//! table covers one venue per signing pattern family so adapters for
//! similar venues can start from a close config.

use std::collections::HashMap;

use crate::auth::{
    AuthScheme, HashAlgorithm, PreimageField, SignatureEncoding, SignaturePlacement,
    SigningStrategy,
};
use crate::request::HttpMethod;
use crate::venue::{BodyStyle, Endpoint, VenueConfig};

/// A map of venue id to configuration.
#[derive(Debug, Clone, Default)]
pub struct VenueRegistry {
    venues: HashMap<String, VenueConfig>,
}

impl VenueRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in venue configs.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(binance());
        registry.register(bitstamp());
        registry.register(kraken_futures_style());
        registry.register(basic_auth_demo());
        registry
    }

    /// Add or replace a venue config, keyed by its id.
    pub fn register(&mut self, venue: VenueConfig) {
        self.venues.insert(venue.id.clone(), venue);
    }

    /// Look up a venue by id.
    pub fn get(&self, id: &str) -> Option<&VenueConfig> {
        self.venues.get(id)
    }

    /// Remove a venue by id, returning its config.
    pub fn remove(&mut self, id: &str) -> Option<VenueConfig> {
        self.venues.remove(id)
    }

    /// Registered venue ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.venues.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Binance-style scheme: HMAC-SHA256 over the sorted query string, hex
/// encoded, appended as a `signature` query parameter, with the key in a
/// header and a `timestamp` parameter injected before signing.
fn binance() -> VenueConfig {
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

    VenueConfig::new("binance", "https://api.binance.com", auth)
        .endpoint("fetch_markets", Endpoint::public("/api/v3/exchangeInfo", HttpMethod::Get))
        .endpoint("fetch_ticker", Endpoint::public("/api/v3/ticker/24hr", HttpMethod::Get))
        .endpoint("fetch_order_book", Endpoint::public("/api/v3/depth", HttpMethod::Get))
        .endpoint("fetch_trades", Endpoint::public("/api/v3/trades", HttpMethod::Get))
        .endpoint("fetch_balance", Endpoint::private("/api/v3/account", HttpMethod::Get))
        .endpoint("create_order", Endpoint::private("/api/v3/order", HttpMethod::Post))
        .endpoint("cancel_order", Endpoint::private("/api/v3/order", HttpMethod::Delete))
        .endpoint("fetch_open_orders", Endpoint::private("/api/v3/openOrders", HttpMethod::Get))
        .endpoint("fetch_my_trades", Endpoint::private("/api/v3/myTrades", HttpMethod::Get))
        .endpoint("fetch_deposits", Endpoint::private("/sapi/v1/capital/deposit/hisrec", HttpMethod::Get))
        .endpoint("fetch_withdrawals", Endpoint::private("/sapi/v1/capital/withdraw/history", HttpMethod::Get))
}

/// Bitstamp-style scheme: HMAC-SHA256 over the transmitted form body, hex
/// encoded, carried in `X-Auth-Signature` alongside key and nonce headers.
fn bitstamp() -> VenueConfig {
    let auth = AuthScheme::new(
        SigningStrategy::Concatenation {
            algorithm: HashAlgorithm::Sha256,
            encoding: SignatureEncoding::Hex,
            digest: None,
            fields: vec![PreimageField::Body],
        },
        SignaturePlacement::Header("X-Auth-Signature".to_string()),
    )
    .api_key_header("X-Auth")
    .nonce_header("X-Auth-Nonce")
    .timestamp_header("X-Auth-Timestamp");

    VenueConfig::new("bitstamp", "https://www.bitstamp.net", auth)
        .endpoint("fetch_ticker", Endpoint::public("/api/v2/ticker/btcusd/", HttpMethod::Get))
        .endpoint("fetch_order_book", Endpoint::public("/api/v2/order_book/btcusd/", HttpMethod::Get))
        .endpoint("fetch_balance", Endpoint::private("/api/v2/balance/", HttpMethod::Post))
        .endpoint("create_order", Endpoint::private("/api/v2/buy/btcusd/", HttpMethod::Post))
        .endpoint("cancel_order", Endpoint::private("/api/v2/cancel_order/", HttpMethod::Post))
        .endpoint("fetch_transactions", Endpoint::private("/api/v2/user_transactions/", HttpMethod::Post))
}

/// Kraken-futures-style scheme: HMAC-SHA512 over the SHA-256 digest of
/// `body + nonce + path`, base64 encoded, with a base64 API secret and
/// `APIKey`/`Authent`/`Nonce` headers.
fn kraken_futures_style() -> VenueConfig {
    let auth = AuthScheme::new(
        SigningStrategy::Concatenation {
            algorithm: HashAlgorithm::Sha512,
            encoding: SignatureEncoding::Base64,
            digest: Some(HashAlgorithm::Sha256),
            fields: vec![PreimageField::Body, PreimageField::Nonce, PreimageField::Path],
        },
        SignaturePlacement::Header("Authent".to_string()),
    )
    .api_key_header("APIKey")
    .nonce_header("Nonce")
    .decode_secret_base64();

    VenueConfig::new("krakenfutures", "https://futures.kraken.com/derivatives", auth)
        .endpoint("fetch_markets", Endpoint::public("/api/v3/instruments", HttpMethod::Get))
        .endpoint("fetch_ticker", Endpoint::public("/api/v3/tickers", HttpMethod::Get))
        .endpoint("fetch_balance", Endpoint::private("/api/v3/accounts", HttpMethod::Get))
        .endpoint("create_order", Endpoint::private("/api/v3/sendorder", HttpMethod::Post))
        .endpoint("cancel_order", Endpoint::private("/api/v3/cancelorder", HttpMethod::Post))
        .endpoint("fetch_open_orders", Endpoint::private("/api/v3/openorders", HttpMethod::Get))
}

/// Static basic-auth scheme with no per-request nonce, JSON bodies.
fn basic_auth_demo() -> VenueConfig {
    let auth = AuthScheme::new(
        SigningStrategy::BearerStatic { basic: true },
        SignaturePlacement::Header("Authorization".to_string()),
    );

    VenueConfig::new("basicdemo", "https://api.basicdemo.test", auth)
        .body_style(BodyStyle::Json)
        .endpoint("fetch_balance", Endpoint::private("/v1/balance", HttpMethod::Get))
        .endpoint("create_order", Endpoint::private("/v1/orders", HttpMethod::Post))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = VenueRegistry::builtin();
        assert_eq!(
            registry.ids(),
            vec!["basicdemo", "binance", "bitstamp", "krakenfutures"]
        );

        let binance = registry.get("binance").unwrap();
        assert!(binance.get_endpoint("create_order").unwrap().authenticated);
        assert!(!binance.get_endpoint("fetch_ticker").unwrap().authenticated);
    }

    #[test]
    fn test_register_and_remove() {
        let mut registry = VenueRegistry::new();
        assert!(registry.get("binance").is_none());

        registry.register(binance());
        assert!(registry.get("binance").is_some());

        let removed = registry.remove("binance").unwrap();
        assert_eq!(removed.id, "binance");
        assert!(registry.get("binance").is_none());
    }
}
