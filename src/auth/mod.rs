//! Authentication module for venue APIs.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - Nonce generation for replay attack prevention
//! - Configurable signing strategies (concatenation, query-string, bearer)

mod credentials;
mod nonce;
mod signature;

pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
pub use nonce::{CounterNonce, IncreasingNonce, NonceProvider};
pub use signature::{
    AuthScheme, HashAlgorithm, PreimageField, SignatureEncoding, SignaturePlacement,
    SigningStrategy, hmac_sign,
};
