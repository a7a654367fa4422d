//! Fetching the provider public key over HTTP.
//!
//! The provider configuration document is a large JSON object. Only one
//! string inside it matters here:
//!
//! ```json
//! {
//!   "config": {
//!     "notifications": {
//!       "webhook": {
//!         "public_key": "-----BEGIN PUBLIC KEY-----\n...\n-----END PUBLIC KEY-----\n"
//!       }
//!     }
//!   }
//! }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use reqwest::Client;
use rsa::{RsaPublicKey, pkcs8::DecodePublicKey};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    config::VerifierConfig,
    error::{Result, WebhookError},
    key::KeySource,
};

/// PEM label required on the published key.
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Subset of the provider configuration document.
#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    config: ProviderConfig,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderConfig {
    #[serde(default)]
    notifications: Notifications,
}

#[derive(Debug, Default, Deserialize)]
struct Notifications {
    #[serde(default)]
    webhook: WebhookSettings,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookSettings {
    #[serde(default)]
    public_key: String,
}

/// Fetches the webhook public key from the provider configuration endpoint.
///
/// Each call to [`fetch`](Self::fetch) makes exactly one GET request. Wrap the
/// source in a [`KeyCache`](crate::key::KeyCache) to avoid fetching per
/// request.
#[derive(Debug, Clone)]
pub struct HttpKeySource {
    client: Client,
    config_url: String,
}

impl HttpKeySource {
    /// Creates a source for the default travis-ci.org endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::from_config(&VerifierConfig::default())
    }

    /// Creates a source from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidConfig`] if the configuration is invalid
    /// and [`WebhookError::FetchKey`] if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use travis_webhook::{config::VerifierConfig, key::HttpKeySource};
    ///
    /// let config = VerifierConfig {
    ///     timeout_secs: Some(10),
    ///     ..VerifierConfig::new("https://api.travis-ci.com/config")
    /// };
    ///
    /// let source = HttpKeySource::from_config(&config).unwrap();
    /// assert_eq!(source.config_url(), "https://api.travis-ci.com/config");
    /// ```
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build().map_err(WebhookError::FetchKey)?;

        Ok(Self { client, config_url: config.config_url.clone() })
    }

    /// Creates a source that reuses an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, config_url: impl Into<String>) -> Self {
        Self { client, config_url: config_url.into() }
    }

    /// Returns the configuration endpoint this source reads.
    #[must_use]
    pub fn config_url(&self) -> &str {
        &self.config_url
    }

    /// Fetches the configuration document and parses the public key in it.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::FetchKey`] on transport failure or non-success status
    /// - [`WebhookError::DecodeConfiguration`] if the body is not the expected JSON
    /// - [`WebhookError::InvalidPublicKey`] if the key field is not an RSA
    ///   `PUBLIC KEY` PEM block
    #[instrument(skip(self), fields(config_url = %self.config_url))]
    pub async fn fetch(&self) -> Result<RsaPublicKey> {
        let response = self
            .client
            .get(&self.config_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(WebhookError::FetchKey)?;

        let body = response.bytes().await.map_err(WebhookError::FetchKey)?;

        let document: ConfigDocument = serde_json::from_slice(&body)
            .map_err(|e| WebhookError::DecodeConfiguration(e.to_string()))?;

        let key = parse_public_key(&document.config.notifications.webhook.public_key)?;
        debug!("fetched provider public key");
        Ok(key)
    }
}

impl KeySource for HttpKeySource {
    fn fetch_key(&self) -> impl Future<Output = Result<RsaPublicKey>> + Send {
        self.fetch()
    }
}

/// Parses a PEM-armored PKIX RSA public key.
///
/// The first PEM block in `pem` must carry the `PUBLIC KEY` label and its
/// contents must be a `SubjectPublicKeyInfo` with the RSA algorithm
/// identifier.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidPublicKey`] for missing framing, a different
/// label, malformed DER, or a non-RSA key. The cases are not distinguished.
///
/// # Examples
///
/// ```
/// use travis_webhook::{WebhookError, key::parse_public_key};
///
/// let result = parse_public_key("not a key");
/// assert!(matches!(result, Err(WebhookError::InvalidPublicKey)));
/// ```
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    let block = pem::parse(pem).map_err(|e| {
        debug!(error = %e, "public key is not PEM encoded");
        WebhookError::InvalidPublicKey
    })?;

    if block.tag() != PUBLIC_KEY_LABEL {
        debug!(label = block.tag(), "unexpected PEM label on public key");
        return Err(WebhookError::InvalidPublicKey);
    }

    RsaPublicKey::from_public_key_der(block.contents()).map_err(|e| {
        debug!(error = %e, "public key is not a PKIX RSA key");
        WebhookError::InvalidPublicKey
    })
}
