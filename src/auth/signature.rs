//! Request signing strategies.
//!
//! Venue authentication schemes fall into a small number of patterns, so
//! instead of one signing function per venue, a venue is configured with a
//! [`SigningStrategy`] value plus header/parameter names in an
//! [`AuthScheme`]. The signer's core invariant: the byte sequence it signs
//! is exactly the byte sequence the client transmits. The signature itself
//! (and the key/nonce headers) are the only additions it makes on top of
//! the payload handed to it.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::auth::Credentials;
use crate::error::ExchangeError;
use crate::request::{SignedRequest, SigningContext};

/// Hash function used for HMAC computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// HMAC-SHA256
    Sha256,
    /// HMAC-SHA384
    Sha384,
    /// HMAC-SHA512
    Sha512,
}

/// Encoding applied to the raw MAC bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// Lowercase hexadecimal
    Hex,
    /// Standard base64 with padding
    Base64,
}

/// One component of a concatenation-pattern signing preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreimageField {
    /// The request nonce, in decimal
    Nonce,
    /// The request timestamp in milliseconds, in decimal
    Timestamp,
    /// The uppercase HTTP method
    Method,
    /// The URL path
    Path,
    /// The transmitted body, verbatim (empty string when there is none)
    Body,
}

/// The venue's signing pattern, as data.
#[derive(Debug, Clone)]
pub enum SigningStrategy {
    /// HMAC over the in-order concatenation of the named fields,
    /// e.g. `nonce + method + path + body`.
    Concatenation {
        /// HMAC hash function
        algorithm: HashAlgorithm,
        /// Output encoding
        encoding: SignatureEncoding,
        /// Hash the concatenation with this function before the HMAC;
        /// some venues key the HMAC over a digest of the preimage rather
        /// than the preimage itself
        digest: Option<HashAlgorithm>,
        /// Preimage components, in signing order
        fields: Vec<PreimageField>,
    },
    /// HMAC over the urlencoded query string.
    QueryString {
        /// HMAC hash function
        algorithm: HashAlgorithm,
        /// Output encoding
        encoding: SignatureEncoding,
        /// Sort parameters by key before encoding; otherwise insertion
        /// order is preserved (some venues require it)
        sort_parameters: bool,
    },
    /// Static credential encoding with no per-request signature.
    BearerStatic {
        /// `true` for HTTP basic (`base64(key:secret)`), `false` for a
        /// plain bearer token built from the API key
        basic: bool,
    },
}

/// Where the computed signature is placed on the outgoing request.
#[derive(Debug, Clone)]
pub enum SignaturePlacement {
    /// Added as a header with the given name
    Header(String),
    /// Appended as a query parameter with the given name (excluded from
    /// the signed bytes, as venues using this pattern require)
    QueryParam(String),
}

/// A venue's complete authentication scheme: the signing strategy plus the
/// header and parameter names it mandates.
#[derive(Debug, Clone)]
pub struct AuthScheme {
    /// How the signature is computed
    pub strategy: SigningStrategy,
    /// Where the signature goes
    pub placement: SignaturePlacement,
    /// Header carrying the API key, if the venue wants one
    pub api_key_header: Option<String>,
    /// Header carrying the nonce, if the venue wants one
    pub nonce_header: Option<String>,
    /// Header carrying the millisecond timestamp, if the venue wants one
    pub timestamp_header: Option<String>,
    /// Header carrying the passphrase; when set, a passphrase is required
    pub passphrase_header: Option<String>,
    /// Parameter name the client must inject the nonce under before
    /// signing (query for the query-string pattern, body otherwise)
    pub nonce_param: Option<String>,
    /// Decode the API secret from base64 before keying the HMAC
    pub decode_secret_base64: bool,
}

impl AuthScheme {
    /// Create a scheme with the given strategy and signature placement,
    /// with no extra headers configured.
    pub fn new(strategy: SigningStrategy, placement: SignaturePlacement) -> Self {
        Self {
            strategy,
            placement,
            api_key_header: None,
            nonce_header: None,
            timestamp_header: None,
            passphrase_header: None,
            nonce_param: None,
            decode_secret_base64: false,
        }
    }

    /// Set the header carrying the API key.
    pub fn api_key_header(mut self, name: impl Into<String>) -> Self {
        self.api_key_header = Some(name.into());
        self
    }

    /// Set the header carrying the nonce.
    pub fn nonce_header(mut self, name: impl Into<String>) -> Self {
        self.nonce_header = Some(name.into());
        self
    }

    /// Set the header carrying the timestamp.
    pub fn timestamp_header(mut self, name: impl Into<String>) -> Self {
        self.timestamp_header = Some(name.into());
        self
    }

    /// Set the header carrying the passphrase and make it required.
    pub fn passphrase_header(mut self, name: impl Into<String>) -> Self {
        self.passphrase_header = Some(name.into());
        self
    }

    /// Set the parameter name the nonce is injected under.
    pub fn nonce_param(mut self, name: impl Into<String>) -> Self {
        self.nonce_param = Some(name.into());
        self
    }

    /// Treat the API secret as base64 and decode it before signing.
    pub fn decode_secret_base64(mut self) -> Self {
        self.decode_secret_base64 = true;
        self
    }

    /// Sign a request.
    ///
    /// The context carries the final query parameters and body exactly as
    /// they will be transmitted; this method never alters them. It returns
    /// the full [`SignedRequest`] with the venue's auth headers attached
    /// and the signature placed per [`SignaturePlacement`].
    pub fn sign(
        &self,
        credentials: &Credentials,
        base_url: &str,
        ctx: &SigningContext,
    ) -> Result<SignedRequest, ExchangeError> {
        if !credentials.is_complete() {
            return Err(ExchangeError::MissingCredentials);
        }
        let passphrase = match &self.passphrase_header {
            Some(_) => Some(credentials.expose_passphrase().ok_or_else(|| {
                ExchangeError::AuthConfig("venue requires a passphrase".to_string())
            })?),
            None => None,
        };

        let secret = self.secret_bytes(credentials)?;
        let mut query = ctx.query_string(self.sorts_parameters());
        let mut headers: Vec<(String, String)> = Vec::new();

        if let Some(name) = &self.api_key_header {
            headers.push((name.clone(), credentials.api_key.clone()));
        }
        if let Some(name) = &self.nonce_header {
            headers.push((name.clone(), ctx.nonce.to_string()));
        }
        if let Some(name) = &self.timestamp_header {
            headers.push((name.clone(), ctx.timestamp_ms.to_string()));
        }
        if let (Some(name), Some(value)) = (&self.passphrase_header, passphrase) {
            headers.push((name.clone(), value.to_string()));
        }

        let signature = match &self.strategy {
            SigningStrategy::Concatenation {
                algorithm,
                encoding,
                digest,
                fields,
            } => {
                let preimage = build_preimage(fields, ctx);
                let message = match digest {
                    Some(digest) => digest_bytes(*digest, preimage.as_bytes()),
                    None => preimage.into_bytes(),
                };
                hmac_sign(*algorithm, *encoding, &secret, &message)?
            }
            SigningStrategy::QueryString {
                algorithm,
                encoding,
                ..
            } => hmac_sign(*algorithm, *encoding, &secret, query.as_bytes())?,
            SigningStrategy::BearerStatic { basic } => {
                let value = if *basic {
                    let pair = format!("{}:{}", credentials.api_key, credentials.expose_secret());
                    format!("Basic {}", BASE64.encode(pair))
                } else {
                    format!("Bearer {}", credentials.api_key)
                };
                headers.push(("Authorization".to_string(), value));
                // No per-request signature; the URL and body pass through.
                return Ok(SignedRequest::new(
                    ctx.method,
                    assemble_url(base_url, &ctx.path, &query),
                    headers,
                    ctx.body.clone(),
                ));
            }
        };

        match &self.placement {
            SignaturePlacement::Header(name) => headers.push((name.clone(), signature)),
            SignaturePlacement::QueryParam(name) => {
                let pair = format!("{}={}", name, crate::request::percent_encode(&signature));
                if query.is_empty() {
                    query = pair;
                } else {
                    query = format!("{query}&{pair}");
                }
            }
        }

        Ok(SignedRequest::new(
            ctx.method,
            assemble_url(base_url, &ctx.path, &query),
            headers,
            ctx.body.clone(),
        ))
    }

    /// Whether the scheme signs a sorted query string.
    fn sorts_parameters(&self) -> bool {
        matches!(
            self.strategy,
            SigningStrategy::QueryString {
                sort_parameters: true,
                ..
            }
        )
    }

    fn secret_bytes(&self, credentials: &Credentials) -> Result<Vec<u8>, ExchangeError> {
        if self.decode_secret_base64 {
            BASE64.decode(credentials.expose_secret()).map_err(|_| {
                ExchangeError::AuthConfig("API secret must be valid base64".to_string())
            })
        } else {
            Ok(credentials.expose_secret().as_bytes().to_vec())
        }
    }
}

/// Concatenate the named preimage fields in order.
fn build_preimage(fields: &[PreimageField], ctx: &SigningContext) -> String {
    let mut preimage = String::new();
    for field in fields {
        match field {
            PreimageField::Nonce => preimage.push_str(&ctx.nonce.to_string()),
            PreimageField::Timestamp => preimage.push_str(&ctx.timestamp_ms.to_string()),
            PreimageField::Method => preimage.push_str(ctx.method.as_str()),
            PreimageField::Path => preimage.push_str(&ctx.path),
            PreimageField::Body => preimage.push_str(ctx.body.as_deref().unwrap_or("")),
        }
    }
    preimage
}

/// Plain hash of `data` with the given function.
fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    use sha2::Digest;
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

fn assemble_url(base_url: &str, path: &str, query: &str) -> String {
    if query.is_empty() {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}{path}?{query}")
    }
}

/// Compute an HMAC over `message` and encode it.
pub fn hmac_sign(
    algorithm: HashAlgorithm,
    encoding: SignatureEncoding,
    key: &[u8],
    message: &[u8],
) -> Result<String, ExchangeError> {
    let mac = match algorithm {
        HashAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| ExchangeError::AuthConfig(format!("Invalid HMAC key: {e}")))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key)
                .map_err(|e| ExchangeError::AuthConfig(format!("Invalid HMAC key: {e}")))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key)
                .map_err(|e| ExchangeError::AuthConfig(format!("Invalid HMAC key: {e}")))?;
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(match encoding {
        SignatureEncoding::Hex => hex::encode(mac),
        SignatureEncoding::Base64 => BASE64.encode(mac),
    })
}
