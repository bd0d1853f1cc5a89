//! Compact JWE for refresh tokens: RSA-OAEP key wrap, A256GCM content
//! encryption.
//!
//! Serialized refresh tokens carry a `<kid>:` prefix (64 hex chars) so the
//! decrypting side can pick the right private key without trial decryption.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::Deserialize;

const CEK_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum JweError {
    #[error("malformed JWE")]
    InvalidFormat,

    #[error("unsupported JWE algorithm")]
    UnsupportedAlgorithm,

    #[error("JWE encryption failed")]
    Encrypt,

    #[error("JWE decryption failed")]
    Decrypt,
}

#[derive(Deserialize)]
struct JweHeader {
    alg: String,
    enc: String,
}

/// A serialized refresh token, split into its optional kid prefix and the
/// compact JWE. A prefix only counts when it is exactly 64 hex characters;
/// anything else is treated as part of a legacy unprefixed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTokenFrame<'a> {
    pub kid: Option<&'a str>,
    pub jwe: &'a str,
}

impl<'a> RefreshTokenFrame<'a> {
    pub fn parse(token: &'a str) -> Self {
        if let Some((prefix, rest)) = token.split_once(':') {
            if prefix.len() == 64 && prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Self {
                    kid: Some(prefix),
                    jwe: rest,
                };
            }
        }
        Self { kid: None, jwe: token }
    }

    pub fn serialize(kid: &str, jwe: &str) -> String {
        format!("{}:{}", kid, jwe)
    }
}

/// Encrypt `plaintext` into a compact JWE under the given RSA public key.
pub fn encrypt_compact(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<String, JweError> {
    let header = r#"{"alg":"RSA-OAEP","enc":"A256GCM"}"#;
    let protected = URL_SAFE_NO_PAD.encode(header.as_bytes());

    let mut rng = rand::thread_rng();
    let mut cek = [0u8; CEK_LEN];
    rng.fill_bytes(&mut cek);
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut iv);

    let encrypted_key = public_key
        .encrypt(&mut rng, Oaep::new::<sha1::Sha1>(), &cek)
        .map_err(|_| JweError::Encrypt)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&cek));
    let sealed = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: plaintext,
                aad: protected.as_bytes(),
            },
        )
        .map_err(|_| JweError::Encrypt)?;

    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    Ok(format!(
        "{}.{}.{}.{}.{}",
        protected,
        URL_SAFE_NO_PAD.encode(encrypted_key),
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(ciphertext),
        URL_SAFE_NO_PAD.encode(tag),
    ))
}

/// Decrypt a compact JWE with the given RSA private key.
pub fn decrypt_compact(private_key: &RsaPrivateKey, compact: &str) -> Result<Vec<u8>, JweError> {
    let parts: Vec<&str> = compact.split('.').collect();
    if parts.len() != 5 {
        return Err(JweError::InvalidFormat);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|_| JweError::InvalidFormat)?;
    let header: JweHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| JweError::InvalidFormat)?;
    if header.alg != "RSA-OAEP" || header.enc != "A256GCM" {
        return Err(JweError::UnsupportedAlgorithm);
    }

    let encrypted_key = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| JweError::InvalidFormat)?;
    let iv = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| JweError::InvalidFormat)?;
    let ciphertext = URL_SAFE_NO_PAD
        .decode(parts[3])
        .map_err(|_| JweError::InvalidFormat)?;
    let tag = URL_SAFE_NO_PAD
        .decode(parts[4])
        .map_err(|_| JweError::InvalidFormat)?;
    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(JweError::InvalidFormat);
    }

    let cek = private_key
        .decrypt(Oaep::new::<sha1::Sha1>(), &encrypted_key)
        .map_err(|_| JweError::Decrypt)?;
    if cek.len() != CEK_LEN {
        return Err(JweError::Decrypt);
    }

    let mut sealed = ciphertext;
    sealed.extend_from_slice(&tag);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&cek));
    cipher
        .decrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: &sealed,
                aad: parts[0].as_bytes(),
            },
        )
        .map_err(|_| JweError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_keypair() -> (RsaPublicKey, RsaPrivateKey) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        (RsaPublicKey::from(&private_key), private_key)
    }

    #[test]
    fn test_round_trip() {
        let (public_key, private_key) = generate_keypair();
        let plaintext = br#"{"sub":"user1","scope":"openid profile"}"#;

        let compact = encrypt_compact(&public_key, plaintext).unwrap();
        assert_eq!(compact.split('.').count(), 5);

        let decrypted = decrypt_compact(&private_key, &compact).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let (public_key, _) = generate_keypair();
        let (_, other_private) = generate_keypair();

        let compact = encrypt_compact(&public_key, b"payload").unwrap();
        assert!(matches!(
            decrypt_compact(&other_private, &compact),
            Err(JweError::Decrypt)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let (public_key, private_key) = generate_keypair();
        let compact = encrypt_compact(&public_key, b"payload").unwrap();

        let mut parts: Vec<String> = compact.split('.').map(str::to_string).collect();
        parts[3] = URL_SAFE_NO_PAD.encode(b"tampered");
        let tampered = parts.join(".");

        assert!(matches!(
            decrypt_compact(&private_key, &tampered),
            Err(JweError::Decrypt)
        ));
    }

    #[test]
    fn test_malformed_compact_rejected() {
        let (_, private_key) = generate_keypair();
        assert!(matches!(
            decrypt_compact(&private_key, "only.three.parts"),
            Err(JweError::InvalidFormat)
        ));
        assert!(matches!(
            decrypt_compact(&private_key, "a.b.c.d.e"),
            Err(JweError::InvalidFormat)
        ));
    }

    #[test]
    fn test_frame_parse_with_kid_prefix() {
        let kid = "ab".repeat(32);
        let token = RefreshTokenFrame::serialize(&kid, "h.e.i.c.t");
        let frame = RefreshTokenFrame::parse(&token);
        assert_eq!(frame.kid, Some(kid.as_str()));
        assert_eq!(frame.jwe, "h.e.i.c.t");
    }

    #[test]
    fn test_frame_parse_without_prefix() {
        let frame = RefreshTokenFrame::parse("h.e.i.c.t");
        assert_eq!(frame.kid, None);
        assert_eq!(frame.jwe, "h.e.i.c.t");
    }

    #[test]
    fn test_frame_short_or_non_hex_prefix_is_not_a_kid() {
        let frame = RefreshTokenFrame::parse("abc:h.e.i.c.t");
        assert_eq!(frame.kid, None);

        let not_hex = format!("{}:rest", "zz".repeat(32));
        let frame = RefreshTokenFrame::parse(&not_hex);
        assert_eq!(frame.kid, None);
    }
}
