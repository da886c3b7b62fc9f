//! Security Utilities
//!
//! Password hashing and single-use token generation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bcrypt::{hash, verify, DEFAULT_COST};
use rand::RngCore;

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Number of random bytes behind every verification or reset token
pub const SINGLE_USE_TOKEN_BYTES: usize = 32;

/// Generate a URL-safe token from a cryptographically secure RNG
pub fn generate_url_safe_token() -> String {
    let mut bytes = [0u8; SINGLE_USE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a password with custom bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its hash
///
/// A malformed digest never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            log::warn!("Rejecting password check against malformed hash: {}", e);
            false
        }
    }
}

/// Timing-safe string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}
