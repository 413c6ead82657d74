//! Password hashing and verification utilities using Argon2id.
//!
//! Hashes are stored in PHC string format. Each call generates a fresh
//! random salt, so hashing the same password twice yields different
//! strings. Verification is constant-time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Hashing failed: {0}")]
    HashingFailed(String),

    #[error("Verification failed: password does not match")]
    VerificationFailed,
}

/// Hashes a password using Argon2id with a fresh random salt.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &SecretString) -> Result<SecretString, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(SecretString::from(hash.to_string()))
}

/// Verifies a password against a stored PHC hash string.
///
/// A stored value that is not a parseable hash (e.g. the placeholder
/// written for passwordless or external accounts) counts as a mismatch,
/// never an internal error.
///
/// # Errors
///
/// Returns [`PasswordError::VerificationFailed`] if the password does not
/// match or the stored hash is unusable.
pub fn verify_password(password: &SecretString, expected_hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(expected_hash).map_err(|_| PasswordError::VerificationFailed)?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .map_err(|_| PasswordError::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = SecretString::from("TestPassword123!".to_string());
        let hash = hash_password(&password).unwrap();
        let result = verify_password(&password, hash.expose_secret());
        assert!(result.is_ok(), "Verification failed: {:?}", result);
    }

    #[test]
    fn test_wrong_password_fails() {
        let password = SecretString::from("CorrectPassword".to_string());
        let wrong_password = SecretString::from("WrongPassword".to_string());
        let hash = hash_password(&password).unwrap();
        assert!(verify_password(&wrong_password, hash.expose_secret()).is_err());
    }

    #[test]
    fn test_same_password_hashes_differ() {
        let password = SecretString::from("TestPassword123!".to_string());
        let hash1 = hash_password(&password).unwrap();
        let hash2 = hash_password(&password).unwrap();
        assert_ne!(hash1.expose_secret(), hash2.expose_secret());
    }

    #[test]
    fn test_placeholder_hash_is_mismatch() {
        // Passwordless accounts store the raw email as a placeholder.
        let password = SecretString::from("user@example.com".to_string());
        assert!(matches!(
            verify_password(&password, "user@example.com"),
            Err(PasswordError::VerificationFailed)
        ));
    }
}
