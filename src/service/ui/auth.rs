use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// The admin account, checked against HTTP basic auth
pub struct AdminCredentials {
    username_hash: [u8; 32],
    password_hash: [u8; 32],
}

fn hash(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// `Basic <base64(username:password)>`
fn parse_basic(value: &HeaderValue) -> Option<(String, String)> {
    let encoded = value.to_str().ok()?.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_owned(), password.to_owned()))
}

impl AdminCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username_hash: hash(username),
            password_hash: hash(password),
        }
    }

    pub fn verify(&self, authorization: Option<&HeaderValue>) -> bool {
        let Some((username, password)) = authorization.and_then(parse_basic) else {
            return false;
        };

        // Digests have a fixed length, so the comparison time says nothing
        // about the length of the expected values.
        let username_match = hash(&username)[..].ct_eq(&self.username_hash[..]);
        let password_match = hash(&password)[..].ct_eq(&self.password_hash[..]);
        (username_match & password_match).into()
    }
}
