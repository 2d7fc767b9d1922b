//! Password hashing, temporary passwords and cookie key derivation

use rand::Rng;
use sha2::{Digest, Sha512};
use tower_cookies::Key;

/// Default bcrypt cost factor
pub const BCRYPT_COST: u32 = 12;

/// Length of a server-generated temporary password
pub const TEMPORARY_PASSWORD_LEN: usize = 10;

/// Letters and digits minus the easily confused ones (0/O, 1/l/I).
const TEMPORARY_PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

/// Hash a password with bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Generate a temporary password for an account created without one
pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();
    (0..TEMPORARY_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..TEMPORARY_PASSWORD_ALPHABET.len());
            TEMPORARY_PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Derive the 64-byte cookie signing key from the session secret
pub fn derive_cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
