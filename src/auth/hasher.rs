use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::Argon2;
use subtle::ConstantTimeEq;

use crate::types::{AppError, Result};

/// Salt length in bytes. Salts are per-account, random, and not secret.
const SALT_LEN: usize = 16;
/// Raw digest length in bytes.
const DIGEST_LEN: usize = 32;

/// Credential hasher built on Argon2id with an explicit per-account salt.
///
/// Salts and digests are hex-encoded for storage. Verification recomputes the
/// digest and compares in constant time; malformed stored material verifies
/// as `false` rather than erroring.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh random salt, hex-encoded.
    pub fn generate_salt(&self) -> String {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        hex::encode(salt)
    }

    /// Derive the hex-encoded digest for `password` under `salt_hex`.
    ///
    /// Errors here are programmer errors (malformed salt), fatal to the
    /// operation rather than silently swallowed.
    pub fn hash(&self, password: &str, salt_hex: &str) -> Result<String> {
        let salt = hex::decode(salt_hex)
            .map_err(|e| AppError::Internal(format!("malformed credential salt: {e}")))?;

        let mut digest = [0u8; DIGEST_LEN];
        self.argon2
            .hash_password_into(password.as_bytes(), &salt, &mut digest)
            .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?;

        Ok(hex::encode(digest))
    }

    /// Verify `password` against a stored `(salt, digest)` pair.
    ///
    /// The digest comparison is constant-time with respect to where the
    /// mismatch occurs. Any decode or derivation failure is a plain `false`.
    pub fn verify(&self, password: &str, salt_hex: &str, expected_hex: &str) -> bool {
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let Ok(expected) = hex::decode(expected_hex) else {
            return false;
        };

        let mut digest = [0u8; DIGEST_LEN];
        if self
            .argon2
            .hash_password_into(password.as_bytes(), &salt, &mut digest)
            .is_err()
        {
            return false;
        }

        digest.as_slice().ct_eq(expected.as_slice()).into()
    }
}

/// Generate an opaque random bearer token of `len` bytes, hex-encoded.
///
/// Used for email-verification and password-reset tokens, which are
/// independent of the signed-session mechanism.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        let digest = hasher.hash("Secr3t!", &salt).expect("should hash");

        assert!(hasher.verify("Secr3t!", &salt, &digest));
    }

    #[test]
    fn test_wrong_password_fails() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        let digest = hasher.hash("correct_password", &salt).expect("should hash");

        assert!(!hasher.verify("wrong_password", &salt, &digest));
    }

    #[test]
    fn test_same_password_different_salts_differ() {
        let hasher = CredentialHasher::new();
        let salt_a = hasher.generate_salt();
        let salt_b = hasher.generate_salt();
        assert_ne!(salt_a, salt_b, "salts must never be reused");

        let digest_a = hasher.hash("password", &salt_a).expect("should hash");
        let digest_b = hasher.hash("password", &salt_b).expect("should hash");
        assert_ne!(digest_a, digest_b);
    }

    #[test]
    fn test_malformed_stored_material_verifies_false() {
        let hasher = CredentialHasher::new();
        let salt = hasher.generate_salt();
        let digest = hasher.hash("password", &salt).expect("should hash");

        // Not hex at all
        assert!(!hasher.verify("password", "zz-not-hex", &digest));
        assert!(!hasher.verify("password", &salt, "zz-not-hex"));
        // Truncated digest
        assert!(!hasher.verify("password", &salt, &digest[..16]));
        // Salt too short for the KDF
        assert!(!hasher.verify("password", "aa", &digest));
    }

    #[test]
    fn test_random_token_length_and_uniqueness() {
        let a = random_token(16);
        let b = random_token(16);
        assert_eq!(a.len(), 32, "16 bytes hex-encode to 32 chars");
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
