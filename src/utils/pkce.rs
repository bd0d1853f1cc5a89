//! PKCE (Proof Key for Code Exchange) verification per RFC 7636.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};

use super::constant_time_compare;

pub const PKCE_METHOD_S256: &str = "S256";
pub const PKCE_METHOD_PLAIN: &str = "plain";

/// Verify a code_verifier against the stored code_challenge.
///
/// `method` is the stored code_challenge_method; a missing method means
/// `plain`. Comparisons are constant-time. An unsupported method fails.
pub fn verify_pkce(code_verifier: &str, code_challenge: &str, method: Option<&str>) -> bool {
    match method.unwrap_or(PKCE_METHOD_PLAIN) {
        PKCE_METHOD_S256 => {
            let computed = compute_s256_challenge(code_verifier);
            constant_time_compare(&computed, code_challenge)
        }
        PKCE_METHOD_PLAIN => constant_time_compare(code_verifier, code_challenge),
        _ => false,
    }
}

/// S256: code_challenge = BASE64URL-NOPAD(SHA-256(code_verifier))
pub fn compute_s256_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test vector from RFC 7636 Appendix B.
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_compute_s256_challenge() {
        assert_eq!(compute_s256_challenge(RFC_VERIFIER), RFC_CHALLENGE);
    }

    #[test]
    fn test_verify_s256_valid() {
        assert!(verify_pkce(RFC_VERIFIER, RFC_CHALLENGE, Some("S256")));
    }

    #[test]
    fn test_verify_s256_invalid_verifier() {
        assert!(!verify_pkce("wrong", RFC_CHALLENGE, Some("S256")));
    }

    #[test]
    fn test_verify_plain() {
        assert!(verify_pkce("abc123", "abc123", Some("plain")));
        assert!(!verify_pkce("abc123", "other", Some("plain")));
    }

    #[test]
    fn test_missing_method_defaults_to_plain() {
        assert!(verify_pkce("abc123", "abc123", None));
        assert!(!verify_pkce(RFC_VERIFIER, RFC_CHALLENGE, None));
    }

    #[test]
    fn test_unsupported_method_fails() {
        assert!(!verify_pkce(RFC_VERIFIER, RFC_CHALLENGE, Some("S512")));
    }
}
