//! Provider public key retrieval and caching.
//!
//! The provider signs every notification with one RSA key and publishes the
//! public half in its configuration document. [`HttpKeySource`] fetches and
//! parses that key; [`KeyCache`] keeps the first successfully fetched key for
//! the lifetime of the cache.
//!
//! # Examples
//!
//! ```rust,no_run
//! use travis_webhook::key::{HttpKeySource, KeyCache};
//!
//! # async fn example() -> travis_webhook::error::Result<()> {
//! let cache = KeyCache::new(HttpKeySource::new()?);
//!
//! // First call performs the fetch, later calls return the cached key.
//! let key = cache.get_or_fetch().await?;
//! # let _ = key;
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;

use rsa::RsaPublicKey;

use crate::error::Result;

pub mod cache;
pub mod fetch;

pub use cache::KeyCache;
pub use fetch::{HttpKeySource, parse_public_key};

/// Source of the provider's webhook public key.
///
/// Implementations are called only on a cold [`KeyCache`]; they should make a
/// single attempt and report failure rather than retry.
pub trait KeySource: Send + Sync {
    /// Retrieves and parses the current public key.
    ///
    /// # Errors
    ///
    /// Returns error if the key cannot be retrieved or is not an RSA key.
    fn fetch_key(&self) -> impl Future<Output = Result<RsaPublicKey>> + Send;
}

/// Key source that always yields the same pinned key.
///
/// Useful for hosts that ship the provider key with their deployment instead
/// of fetching it at runtime.
///
/// # Examples
///
/// ```no_run
/// use travis_webhook::key::{KeyCache, StaticKeySource};
///
/// let pem = std::fs::read_to_string("travis_webhook_key.pem")?;
/// let cache = KeyCache::new(StaticKeySource::from_pem(&pem)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    key: RsaPublicKey,
}

impl StaticKeySource {
    /// Wraps an already parsed key.
    #[must_use]
    pub const fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Parses a PEM `PUBLIC KEY` block into a pinned key source.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::InvalidPublicKey`](crate::WebhookError::InvalidPublicKey)
    /// under the same rules as [`parse_public_key`].
    pub fn from_pem(pem: &str) -> Result<Self> {
        parse_public_key(pem).map(Self::new)
    }
}

impl KeySource for StaticKeySource {
    fn fetch_key(&self) -> impl Future<Output = Result<RsaPublicKey>> + Send {
        std::future::ready(Ok(self.key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_static_source_returns_pinned_key() {
        let source = StaticKeySource::from_pem(test_support::PROVIDER_PUBLIC_PEM).unwrap();
        let key = source.fetch_key().await.unwrap();
        assert_eq!(key, test_support::provider_public_key());
    }

    #[test]
    fn test_static_source_rejects_non_rsa() {
        let result = StaticKeySource::from_pem(test_support::EC_PUBLIC_PEM);
        assert!(matches!(result, Err(crate::WebhookError::InvalidPublicKey)));
    }
}
