//! Credential management for venue API authentication.

use secrecy::{ExposeSecret, SecretString};

/// API credentials containing the key, secret and optional passphrase.
///
/// Credentials are immutable for the lifetime of the owning client and are
/// never logged or serialized into responses.
#[derive(Clone)]
pub struct Credentials {
    /// The API key (public identifier)
    pub api_key: String,
    /// The API secret (private, used for signing)
    api_secret: SecretString,
    /// Optional passphrase or UID some venues require alongside the key
    passphrase: Option<SecretString>,
}

impl Credentials {
    /// Create new credentials from an API key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            passphrase: None,
        }
    }

    /// Attach the passphrase/UID required by some venues.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(SecretString::from(passphrase.into()));
        self
    }

    /// Get the API secret for signing.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    /// Get the passphrase, if one was configured.
    pub fn expose_passphrase(&self) -> Option<&str> {
        self.passphrase.as_ref().map(|p| p.expose_secret())
    }

    /// Whether both key and secret are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Trait for providing API credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager or environment variables.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret),
        }
    }

    /// Create a static provider from pre-built credentials.
    pub fn from_credentials(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// Variable names are derived from the venue id, e.g. venue `kraken` reads
/// `KRAKEN_API_KEY`, `KRAKEN_API_SECRET` and optionally `KRAKEN_PASSPHRASE`.
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Create credentials from the environment for a given venue id.
    ///
    /// # Panics
    ///
    /// Panics if the key or secret variable is not set.
    pub fn for_venue(venue_id: &str) -> Self {
        let prefix = venue_id.to_uppercase().replace('-', "_");
        Self::from_env_vars(
            &format!("{prefix}_API_KEY"),
            &format!("{prefix}_API_SECRET"),
            &format!("{prefix}_PASSPHRASE"),
        )
    }

    /// Create credentials from explicit environment variable names.
    ///
    /// The passphrase variable is optional and ignored when unset.
    ///
    /// # Panics
    ///
    /// Panics if the key or secret variable is not set.
    pub fn from_env_vars(key_var: &str, secret_var: &str, passphrase_var: &str) -> Self {
        Self::try_from_env_vars(key_var, secret_var, passphrase_var)
            .unwrap_or_else(|| panic!("Environment variables {key_var}/{secret_var} not set"))
    }

    /// Try to create credentials from the environment for a given venue id.
    ///
    /// Returns `None` if the key or secret variable is not set.
    pub fn try_for_venue(venue_id: &str) -> Option<Self> {
        let prefix = venue_id.to_uppercase().replace('-', "_");
        Self::try_from_env_vars(
            &format!("{prefix}_API_KEY"),
            &format!("{prefix}_API_SECRET"),
            &format!("{prefix}_PASSPHRASE"),
        )
    }

    /// Try to create credentials from explicit environment variable names.
    ///
    /// Returns `None` if the key or secret variable is not set.
    pub fn try_from_env_vars(
        key_var: &str,
        secret_var: &str,
        passphrase_var: &str,
    ) -> Option<Self> {
        let api_key = std::env::var(key_var).ok()?;
        let api_secret = std::env::var(secret_var).ok()?;

        let mut credentials = Credentials::new(api_key, api_secret);
        if let Ok(passphrase) = std::env::var(passphrase_var) {
            credentials = credentials.with_passphrase(passphrase);
        }

        Some(Self { credentials })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
