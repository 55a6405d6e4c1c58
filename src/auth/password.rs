//! Salted SHA-256 digests for the phone-as-password login.
//!
//! Stored as `"{salt}${hex digest}"` where the digest covers `password + salt`.

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SEPARATOR: char = '$';

/// Generate a random salt for password hashing
pub fn generate_salt() -> String {
    let mut salt = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    general_purpose::STANDARD.encode(salt)
}

fn digest(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash with a fresh salt.
pub fn hash_password(password: &str) -> String {
    hash_with_salt(password, &generate_salt())
}

pub fn hash_with_salt(password: &str, salt: &str) -> String {
    format!("{}{}{}", salt, SEPARATOR, digest(password, salt))
}

/// Check `password` against a stored `salt$digest` value.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    let actual = digest(password, salt);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}
