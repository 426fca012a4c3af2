//! Adaptive password hashing glue.
//!
//! One hasher covers every secret that must survive a database compromise in
//! unusable form: user passwords, OTP codes, and exchange tokens. Argon2id
//! with default params; verification is constant time inside the verifier.

use anyhow::Result;
use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use rand::rngs::OsRng;

/// Hash a plaintext secret with a fresh random salt.
pub(crate) fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("failed to hash secret: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a plaintext secret against a stored hash.
///
/// An unparseable stored hash verifies as false rather than erroring; the
/// caller treats it as a credential mismatch.
pub(crate) fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Validate a new password and its confirmation field before hashing.
/// The confirmation value is dropped here and never persisted.
pub(crate) fn check_password_pair(
    password: &str,
    confirm: &str,
    min_length: usize,
) -> Result<(), String> {
    if password.len() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    if password != confirm {
        return Err("Passwords are not the same".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let hash = hash_password("pw123456")?;
        assert_ne!(hash, "pw123456");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pw123456", &hash));
        assert!(!verify_password("wrong", &hash));
        Ok(())
    }

    #[test]
    fn same_password_hashes_differently() -> Result<()> {
        let first = hash_password("pw123456")?;
        let second = hash_password("pw123456")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn garbage_stored_hash_verifies_false() {
        assert!(!verify_password("pw123456", "not-a-phc-string"));
    }

    #[test]
    fn check_password_pair_rules() {
        assert!(check_password_pair("pw123456", "pw123456", 8).is_ok());
        assert!(check_password_pair("short", "short", 8).is_err());
        assert!(check_password_pair("pw123456", "different", 8).is_err());
    }
}
