use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Hash a password with bcrypt at the default cost.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Verify a password against a stored hash.
///
/// bcrypt hashes are checked first. When the stored value is not a bcrypt
/// hash at all, fall back to comparing against `hex(SHA-256(password))` to
/// accept hashes from the pre-bcrypt era. Any other bcrypt failure surfaces.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    match bcrypt::verify(password, hash) {
        Ok(matches) => Ok(matches),
        Err(bcrypt::BcryptError::InvalidHash(_)) | Err(bcrypt::BcryptError::InvalidPrefix(_)) => {
            let digest = hex::encode(Sha256::digest(password.as_bytes()));
            Ok(digest == hash)
        }
        Err(e) => Err(ApiError::Internal(anyhow::anyhow!(
            "password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_bcrypt_string() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$2"));
        assert_ne!(hash, "secret123");
    }

    #[test]
    fn test_verify_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same").unwrap();
        let second = hash_password("same").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same", &first).unwrap());
        assert!(verify_password("same", &second).unwrap());
    }

    #[test]
    fn test_legacy_sha256_fallback() {
        let password = "legacy-password";
        let legacy_hash = hex::encode(Sha256::digest(password.as_bytes()));

        assert!(verify_password(password, &legacy_hash).unwrap());
        assert!(!verify_password("not-it", &legacy_hash).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_not_accepted() {
        assert!(!verify_password("anything", "not-a-hash-at-all").unwrap());
    }
}
