//! # Exchange API Client
//!
//! A multi-venue cryptocurrency exchange REST client core. Instead of one
//! hand-written client per venue, a venue is described by data: an
//! endpoint table plus an authentication scheme built from a small set of
//! signing strategies (concatenation, query-string, static bearer). One
//! generic [`client::VenueClient`] serves any configured venue.
//!
//! ## Features
//!
//! - Configurable request signing (HMAC-SHA256/384/512, hex or base64)
//! - Strictly increasing nonce generation, safe under concurrency
//! - Async dispatch bridge: blocking round trips become futures without
//!   blocking the caller
//! - Typed error taxonomy separating configuration, signing, transport
//!   and venue-rejection failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exchange_api_client::client::VenueClient;
//! use exchange_api_client::registry::VenueRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = VenueRegistry::builtin();
//!     let venue = registry.get("binance").unwrap().clone();
//!     let client = VenueClient::builder(venue).build();
//!
//!     let ticker = client
//!         .call("fetch_ticker", vec![("symbol".into(), "BTCUSDT".into())])
//!         .await?;
//!     println!("{ticker}");
//!     Ok(())
//! }
//! ```
//!
//! For authenticated operations, provide credentials:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use exchange_api_client::auth::StaticCredentials;
//! use exchange_api_client::client::VenueClient;
//! use exchange_api_client::registry::VenueRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = VenueRegistry::builtin();
//!     let venue = registry.get("binance").unwrap().clone();
//!     let client = VenueClient::builder(venue)
//!         .credentials(Arc::new(StaticCredentials::new("api_key", "api_secret")))
//!         .build();
//!
//!     let balance = client.call("fetch_balance", vec![]).await?;
//!     println!("{balance}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod request;
pub mod transport;
pub mod types;
pub mod venue;

// Re-export commonly used types at crate root
pub use client::VenueClient;
pub use dispatch::{DispatchFuture, Dispatcher};
pub use error::ExchangeError;
pub use registry::VenueRegistry;
pub use request::{HttpMethod, SignedRequest};
pub use types::{OrderSide, OrderStatus, OrderType};

/// Result type alias using ExchangeError
pub type Result<T> = std::result::Result<T, ExchangeError>;
