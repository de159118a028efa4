/// Password Hashing and Verification
///
/// bcrypt at `DEFAULT_COST`. Both operations are CPU-bound and slow on
/// purpose; async callers should run them on a blocking thread.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;

lazy_static! {
    // Verified against when the email is unknown, so a failed login costs
    // the same whether or not the account exists.
    static ref DUMMY_HASH: String =
        hash("dummy-password-for-timing", DEFAULT_COST).unwrap_or_default();
}

/// Hash a password using bcrypt with a random salt
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Verify a password against its hash
///
/// # Errors
/// Returns error if the stored hash is not a valid bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Burn the same amount of CPU as a real verification. Always "fails".
pub fn verify_dummy(password: &str) {
    let _ = verify(password, &DUMMY_HASH);
}
