//! Fixture keys and signing helpers for unit tests.

use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1v15::SigningKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    signature::{SignatureEncoding, Signer},
};
use sha1::Sha1;

pub(crate) const PROVIDER_PUBLIC_PEM: &str = include_str!("../tests/fixtures/provider_public.pem");
pub(crate) const PROVIDER_PRIVATE_PEM: &str =
    include_str!("../tests/fixtures/provider_private.pem");
pub(crate) const OTHER_PRIVATE_PEM: &str = include_str!("../tests/fixtures/other_private.pem");
pub(crate) const EC_PUBLIC_PEM: &str = include_str!("../tests/fixtures/ec_public.pem");

pub(crate) fn provider_public_key() -> RsaPublicKey {
    RsaPublicKey::from_public_key_pem(PROVIDER_PUBLIC_PEM).unwrap()
}

/// Signs `payload` the way the provider does and returns the header value.
pub(crate) fn sign_with(private_pem: &str, payload: &str) -> String {
    let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem).unwrap();
    let signing_key = SigningKey::<Sha1>::new(private_key);
    STANDARD.encode(signing_key.sign(payload.as_bytes()).to_bytes())
}

pub(crate) fn sign(payload: &str) -> String {
    sign_with(PROVIDER_PRIVATE_PEM, payload)
}
