//! Signature extraction and payload digest.
//!
//! The provider signs the SHA-1 digest of the `payload` form field exactly as
//! sent and transmits the signature, base64 encoded, in the `Signature`
//! header.

use base64::{Engine, engine::general_purpose::STANDARD};
use http::HeaderMap;
use sha1::{Digest, Sha1};

use crate::error::{Result, WebhookError};

/// Header carrying the detached signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Length in bytes of a SHA-1 digest.
pub const DIGEST_LEN: usize = 20;

/// Reads and base64-decodes the `Signature` header.
///
/// The decoded bytes are not checked any further; a signature of the wrong
/// length simply fails verification later.
///
/// # Errors
///
/// - [`WebhookError::MissingHeader`] if the header is absent, empty or not
///   visible ASCII
/// - [`WebhookError::DecodeSignature`] if the value is not standard base64
///
/// # Examples
///
/// ```
/// use http::{HeaderMap, HeaderValue};
/// use travis_webhook::signature::extract_signature;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("Signature", HeaderValue::from_static("c2lnbmVk"));
///
/// assert_eq!(extract_signature(&headers).unwrap(), b"signed");
/// ```
pub fn extract_signature(headers: &HeaderMap) -> Result<Vec<u8>> {
    let value = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(WebhookError::MissingHeader(SIGNATURE_HEADER))?;

    STANDARD.decode(value).map_err(WebhookError::DecodeSignature)
}

/// Computes the SHA-1 digest of the verbatim payload text.
///
/// `payload` must be the form field exactly as received. Hashing a
/// re-serialized JSON value would change whitespace and key order.
///
/// # Examples
///
/// ```
/// use travis_webhook::signature::payload_digest;
///
/// let digest = payload_digest("abc");
/// assert_eq!(digest[..4], [0xa9, 0x99, 0x3e, 0x36]);
/// ```
#[must_use]
pub fn payload_digest(payload: &str) -> [u8; DIGEST_LEN] {
    Sha1::digest(payload.as_bytes()).into()
}
