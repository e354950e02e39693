use crate::config;

/// Hash a plaintext password with bcrypt.
///
/// The output is the self-describing `$2b$<cost>$<salt+digest>` format with a
/// fresh random salt, so hashing the same password twice yields different
/// strings. Cost comes from config (SECURITY_BCRYPT_COST).
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash_password_with_cost(password, config::config().security.bcrypt_cost)
}

pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Malformed or foreign-format hashes verify as false rather than erroring,
/// so a corrupted credential row behaves like a wrong password instead of a
/// 500. The digest comparison inside the bcrypt crate is constant-time.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}
