//! Travis CI webhook verification.
//!
//! Travis CI signs every webhook notification with an RSA key and publishes
//! the public half in its configuration document. This crate checks that
//! signature before handing out a typed [`Payload`].
//!
//! # Overview
//!
//! ```text
//! POST /webhook                      GET /config (first request only)
//! Content-Type: form-urlencoded          │
//! Signature: base64(sig)                 ▼
//! payload=<json>              ┌────────────────────┐
//!        │                    │ KeyCache           │
//!        ▼                    │  └─ HttpKeySource  │
//! ┌──────────────────┐  key   └─────────┬──────────┘
//! │ WebhookVerifier  │◄─────────────────┘
//! │  method, type    │
//! │  Signature hdr   │
//! │  SHA-1(payload)  │
//! │  RSA PKCS#1 v1.5 │
//! └────────┬─────────┘
//!          ▼
//!       Payload
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use travis_webhook::{Color, WebhookVerifier};
//!
//! # async fn example(request: http::Request<Vec<u8>>) -> travis_webhook::Result<()> {
//! let verifier = WebhookVerifier::new()?;
//! let payload = verifier.authenticate_and_decode(&request).await?;
//!
//! let color = if payload.passed() || payload.fixed() {
//!     Color::Passed
//! } else if payload.pending() {
//!     Color::InProgress
//! } else if payload.canceled() {
//!     Color::Cancel
//! } else {
//!     Color::Fail
//! };
//! println!("{:?} build on {:?}: {color:?}", payload.event_type, payload.branch);
//! # Ok(())
//! # }
//! ```
//!
//! Payloads from an already trusted source can be decoded directly with
//! [`payload::decode`].
//!
//! # Module Organization
//!
//! - [`verifier`]: request checks and signature verification
//! - [`key`]: public key fetching and caching
//! - [`signature`]: `Signature` header extraction and payload digest
//! - [`payload`]: decoded notification model and predicates
//! - [`config`]: key endpoint and HTTP timeout settings
//! - [`error`]: error types

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from rsa and reqwest"
)]

pub mod config;
pub mod error;
pub mod key;
pub mod payload;
pub mod signature;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use config::VerifierConfig;
pub use error::{Result, WebhookError};
pub use payload::{Color, Payload};
pub use verifier::WebhookVerifier;
