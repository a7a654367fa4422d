//! Error types for webhook verification and decoding.
//!
//! Every failure in this crate is reported through [`WebhookError`]. Nothing is
//! retried and nothing is swallowed: the caller sees the rejection and decides
//! the HTTP response.
//!
//! # Error Categories
//!
//! - **Transport errors** ([`WebhookError::FetchKey`],
//!   [`WebhookError::DecodeConfiguration`]): the provider configuration
//!   endpoint could not be reached or returned an unreadable document
//! - **Key errors** ([`WebhookError::InvalidPublicKey`]): bad PEM framing,
//!   wrong block label or a key that is not RSA
//! - **Request shape errors** ([`WebhookError::WrongMethod`],
//!   [`WebhookError::WrongContentType`], [`WebhookError::MissingHeader`],
//!   [`WebhookError::DecodeSignature`])
//! - **Authentication error** ([`WebhookError::Unauthorized`]): the signature
//!   did not verify
//! - **Decode errors** ([`WebhookError::DecodePayload`],
//!   [`WebhookError::NilReader`])
//!
//! # Examples
//!
//! ```
//! use travis_webhook::error::{Result, WebhookError};
//!
//! fn require_post(method: &http::Method) -> Result<()> {
//!     if *method != http::Method::POST {
//!         return Err(WebhookError::WrongMethod(method.clone()));
//!     }
//!     Ok(())
//! }
//!
//! let err = require_post(&http::Method::GET).unwrap_err();
//! assert_eq!(err.to_string(), "wrong request method \"GET\" instead of POST");
//! ```

use http::Method;
use thiserror::Error;

/// Result type alias for webhook operations.
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Errors that can occur while verifying or decoding a webhook.
///
/// Cryptographic verification failures are deliberately collapsed into
/// [`Unauthorized`](Self::Unauthorized) regardless of the underlying cause.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The provider configuration endpoint could not be reached, or it
    /// answered with a non-success status.
    ///
    /// # Recovery
    ///
    /// Transient. The key cache stays empty, so re-invoking authentication
    /// attempts the fetch again.
    #[error("cannot fetch public key: {0}")]
    FetchKey(#[source] reqwest::Error),

    /// The provider configuration document was not valid JSON of the expected
    /// shape.
    #[error("cannot decode configuration: {0}")]
    DecodeConfiguration(String),

    /// The published key is not a PEM `PUBLIC KEY` block holding an RSA key.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The request did not use POST.
    #[error("wrong request method {:?} instead of POST", .0.as_str())]
    WrongMethod(Method),

    /// The request `Content-Type` was not `application/x-www-form-urlencoded`.
    ///
    /// Holds the received header value, empty when the header was absent.
    #[error("wrong Content-Type header, got {0} != want application/x-www-form-urlencoded")]
    WrongContentType(String),

    /// A required header was absent or empty.
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    /// The `Signature` header was not valid standard base64.
    #[error("cannot decode signature")]
    DecodeSignature(#[source] base64::DecodeError),

    /// The signature did not verify against the payload.
    ///
    /// No further detail is given on purpose.
    #[error("unauthorized payload")]
    Unauthorized,

    /// The payload was not valid JSON for [`Payload`](crate::Payload).
    #[error("cannot decode payload")]
    DecodePayload(#[source] serde_json::Error),

    /// [`decode`](crate::payload::decode) was called without a reader.
    #[error("cannot parse from nil reader")]
    NilReader,

    /// Verifier configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WebhookError {
    /// Returns `true` when re-invoking authentication may succeed without any
    /// change on the caller's side.
    ///
    /// Only key-fetch transport failures qualify.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::FetchKey(_))
    }
}
