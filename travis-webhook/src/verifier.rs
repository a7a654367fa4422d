//! Webhook request authentication.
//!
//! A notification is trusted only after every check below passes, in order:
//!
//! 1. the request method is `POST`
//! 2. `Content-Type` is exactly `application/x-www-form-urlencoded`
//! 3. the provider public key is available (cached or freshly fetched)
//! 4. the `Signature` header holds base64 text
//! 5. the RSA PKCS#1 v1.5 signature verifies against the SHA-1 digest of the
//!    verbatim `payload` form field
//!
//! Any failure is terminal for the request. Nothing is retried.

use http::{Method, Request, header::CONTENT_TYPE};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use tracing::{debug, instrument};
use url::form_urlencoded;

use crate::{
    config::VerifierConfig,
    error::{Result, WebhookError},
    key::{HttpKeySource, KeyCache, KeySource},
    payload::Payload,
    signature::{extract_signature, payload_digest},
};

/// Content type the provider posts notifications with.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field holding the JSON notification.
pub const PAYLOAD_FIELD: &str = "payload";

/// Authenticates and decodes provider webhooks.
///
/// The verifier owns the [`KeyCache`]; create one per process (or per
/// provider endpoint) and share it across requests behind an `Arc`.
///
/// # Cancellation
///
/// Authentication is a plain future. Dropping it, for instance through
/// `tokio::time::timeout`, aborts an in-flight key fetch and leaves the cache
/// empty for the next request.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use travis_webhook::{WebhookError, WebhookVerifier};
///
/// # async fn handle(request: http::Request<Vec<u8>>) -> Result<(), WebhookError> {
/// let verifier = Arc::new(WebhookVerifier::new()?);
///
/// match verifier.authenticate_and_decode(&request).await {
///     Ok(payload) if payload.passed() => println!("build passed"),
///     Ok(_) => println!("build did not pass"),
///     Err(WebhookError::Unauthorized) => println!("forged notification"),
///     Err(e) => return Err(e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WebhookVerifier<S = HttpKeySource> {
    keys: KeyCache<S>,
}

impl WebhookVerifier<HttpKeySource> {
    /// Creates a verifier that fetches the key from the travis-ci.org endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self::with_source(HttpKeySource::new()?))
    }

    /// Creates a verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidConfig`] if the configuration is invalid
    /// and [`WebhookError::FetchKey`] if the HTTP client cannot be built.
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        Ok(Self::with_source(HttpKeySource::from_config(config)?))
    }
}

impl<S: KeySource> WebhookVerifier<S> {
    /// Creates a verifier with an empty cache over `source`.
    #[must_use]
    pub fn with_source(source: S) -> Self {
        Self { keys: KeyCache::new(source) }
    }

    /// Creates a verifier around an existing cache.
    #[must_use]
    pub const fn with_key_cache(keys: KeyCache<S>) -> Self {
        Self { keys }
    }

    /// Returns the key cache.
    #[must_use]
    pub const fn key_cache(&self) -> &KeyCache<S> {
        &self.keys
    }

    /// Verifies `request` and returns the verbatim payload text.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::WrongMethod`] if the method is not POST
    /// - [`WebhookError::WrongContentType`] if the content type is not form data
    /// - any key source error, unchanged
    /// - [`WebhookError::MissingHeader`] or [`WebhookError::DecodeSignature`]
    ///   for a missing or malformed `Signature` header
    /// - [`WebhookError::Unauthorized`] if the signature does not verify
    #[instrument(skip_all, fields(method = %request.method()))]
    pub async fn authenticate<B: AsRef<[u8]>>(&self, request: &Request<B>) -> Result<String> {
        if *request.method() != Method::POST {
            debug!("rejecting webhook with wrong method");
            return Err(WebhookError::WrongMethod(request.method().clone()));
        }

        let content_type = request
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();
        if content_type != FORM_CONTENT_TYPE {
            debug!(content_type = %content_type, "rejecting webhook with wrong content type");
            return Err(WebhookError::WrongContentType(content_type));
        }

        let key = self.keys.get_or_fetch().await?;
        let signature = extract_signature(request.headers())?;
        let payload = form_value(request, PAYLOAD_FIELD).unwrap_or_default();

        verify_payload_signature(key, &payload, &signature)?;

        debug!(payload_len = payload.len(), "webhook signature verified");
        Ok(payload)
    }

    /// Verifies `request` and decodes its payload.
    ///
    /// # Errors
    ///
    /// Any error of [`authenticate`](Self::authenticate), or
    /// [`WebhookError::DecodePayload`] if the verified text is not a payload.
    pub async fn authenticate_and_decode<B: AsRef<[u8]>>(
        &self,
        request: &Request<B>,
    ) -> Result<Payload> {
        let payload = self.authenticate(request).await?;
        Payload::from_json(&payload)
    }
}

/// Checks a detached PKCS#1 v1.5 signature over the SHA-1 digest of `payload`.
///
/// # Errors
///
/// Returns [`WebhookError::Unauthorized`] on any mismatch, including a
/// signature of the wrong length.
pub fn verify_payload_signature(
    key: &RsaPublicKey,
    payload: &str,
    signature: &[u8],
) -> Result<()> {
    let digest = payload_digest(payload);
    key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature).map_err(|_| {
        debug!("webhook signature rejected");
        WebhookError::Unauthorized
    })
}

/// Looks up a form field in the URL-encoded body, then in the query string.
fn form_value<B: AsRef<[u8]>>(request: &Request<B>, name: &str) -> Option<String> {
    let find = |input: &[u8]| {
        form_urlencoded::parse(input)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    find(request.body().as_ref())
        .or_else(|| request.uri().query().and_then(|query| find(query.as_bytes())))
}
