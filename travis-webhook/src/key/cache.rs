//! Single-assignment cache for the provider public key.

use rsa::RsaPublicKey;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::{error::Result, key::KeySource};

/// Process-lifetime holder of the provider public key.
///
/// The slot starts empty and is assigned at most once. Concurrent callers on a
/// cold cache wait for the single in-flight fetch instead of racing their own;
/// a failed or cancelled fetch leaves the slot empty so the next caller tries
/// again. A populated slot is never refreshed.
///
/// Share one cache across requests, typically inside an `Arc`'d
/// [`WebhookVerifier`](crate::WebhookVerifier).
#[derive(Debug)]
pub struct KeyCache<S> {
    source: S,
    slot: OnceCell<RsaPublicKey>,
}

impl<S: KeySource> KeyCache<S> {
    /// Creates an empty cache backed by `source`.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source, slot: OnceCell::new() }
    }

    /// Creates a cache that already holds `key`; `source` is never called.
    #[must_use]
    pub fn with_key(source: S, key: RsaPublicKey) -> Self {
        Self { source, slot: OnceCell::new_with(Some(key)) }
    }

    /// Returns the cached key without fetching.
    #[must_use]
    pub fn cached(&self) -> Option<&RsaPublicKey> {
        self.slot.get()
    }

    /// Returns the underlying key source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the cached key, fetching it first if the cache is empty.
    ///
    /// # Errors
    ///
    /// Propagates the key source error unchanged. The cache stays empty.
    pub async fn get_or_fetch(&self) -> Result<&RsaPublicKey> {
        if let Some(key) = self.slot.get() {
            trace!("public key cache hit");
            return Ok(key);
        }

        self.slot
            .get_or_try_init(|| async {
                debug!("public key cache miss, fetching");
                self.source.fetch_key().await
            })
            .await
    }
}
