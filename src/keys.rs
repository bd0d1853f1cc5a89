//! RSA key store.
//!
//! Keys are loaded from a public and a private directory, paired by
//! normalized file stem, and identified by `kid` = hex(SHA-256(PKIX DER of
//! the public key)). The first pair signs and encrypts; every loaded pair is
//! a verify/decrypt candidate.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_parser::prelude::parse_x509_certificate;

use crate::utils::constant_time_compare;

const KEY_FILE_EXTENSIONS: [&str; 5] = ["pem", "pub", "crt", "key", "der"];

const STEM_SUFFIXES: [&str; 8] = [
    "_public", "-public", "_pub", "-pub", "_private", "-private", "_priv", "-priv",
];

/// One RSA keypair with its precomputed identifier and JWT key material.
#[derive(Clone)]
pub struct KeyPair {
    pub name: String,
    pub kid: String,
    pub public_key: RsaPublicKey,
    pub private_key: RsaPrivateKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("name", &self.name)
            .field("kid", &self.kid)
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    fn new(name: String, public_key: RsaPublicKey, private_key: RsaPrivateKey) -> anyhow::Result<Self> {
        let kid = compute_kid(&public_key)?;
        let private_der = private_key
            .to_pkcs1_der()
            .context("failed to encode private key")?;
        let public_der = public_key
            .to_pkcs1_der()
            .context("failed to encode public key")?;
        Ok(Self {
            name,
            kid,
            encoding_key: EncodingKey::from_rsa_der(private_der.as_bytes()),
            decoding_key: DecodingKey::from_rsa_der(public_der.as_bytes()),
            public_key,
            private_key,
        })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// JWK entry published at /.well-known/jwks.json
#[derive(Debug, Clone, Serialize)]
pub struct Jwk {
    pub kty: &'static str,
    #[serde(rename = "use")]
    pub key_use: &'static str,
    pub alg: &'static str,
    pub kid: String,
    pub n: String,
    pub e: String,
}

/// Immutable set of keypairs loaded at startup.
#[derive(Debug)]
pub struct KeyStore {
    pairs: Vec<KeyPair>,
}

impl KeyStore {
    /// Load keypairs from the configured directories.
    ///
    /// Only RSA is supported. Files that fail to parse are skipped; a pair is
    /// kept only when both halves normalized to the same stem.
    pub fn load(key_type: &str, public_dir: &str, private_dir: &str) -> anyhow::Result<Self> {
        if key_type != "RSA" {
            anyhow::bail!("unsupported key type: {}", key_type);
        }

        let mut public_keys: BTreeMap<String, RsaPublicKey> = BTreeMap::new();
        walk_key_files(Path::new(public_dir), &mut |stem, data| {
            if let Some(key) = parse_public_blocks(data) {
                public_keys.insert(stem.to_string(), key);
            }
        });

        let mut private_keys: BTreeMap<String, RsaPrivateKey> = BTreeMap::new();
        walk_key_files(Path::new(private_dir), &mut |stem, data| {
            if let Some(key) = parse_private_blocks(data) {
                private_keys.insert(stem.to_string(), key);
            }
        });

        let mut pairs = Vec::new();
        for (name, public_key) in public_keys {
            if let Some(private_key) = private_keys.remove(&name) {
                pairs.push(KeyPair::new(name, public_key, private_key)?);
            }
        }

        if pairs.is_empty() {
            anyhow::bail!(
                "no usable RSA key pairs found under {} / {}",
                public_dir,
                private_dir
            );
        }

        Ok(Self { pairs })
    }

    /// Build a store from in-memory pairs. Order defines the active key.
    pub fn from_pairs(pairs: Vec<(String, RsaPublicKey, RsaPrivateKey)>) -> anyhow::Result<Self> {
        let pairs = pairs
            .into_iter()
            .map(|(name, public_key, private_key)| KeyPair::new(name, public_key, private_key))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if pairs.is_empty() {
            anyhow::bail!("no key pairs provided");
        }
        Ok(Self { pairs })
    }

    /// The signing/encrypting key.
    pub fn active(&self) -> &KeyPair {
        &self.pairs[0]
    }

    pub fn pairs(&self) -> &[KeyPair] {
        &self.pairs
    }

    /// Select a keypair by kid. Comparison is constant-time.
    pub fn find_by_kid(&self, kid: &str) -> Option<&KeyPair> {
        self.pairs
            .iter()
            .find(|pair| constant_time_compare(&pair.kid, kid))
    }

    pub fn jwks(&self) -> Vec<Jwk> {
        self.pairs
            .iter()
            .map(|pair| Jwk {
                kty: "RSA",
                key_use: "sig",
                alg: "RS256",
                kid: pair.kid.clone(),
                n: URL_SAFE_NO_PAD.encode(pair.public_key.n().to_bytes_be()),
                e: URL_SAFE_NO_PAD.encode(pair.public_key.e().to_bytes_be()),
            })
            .collect()
    }
}

/// kid = hex(SHA-256(PKIX DER marshal of the public key)).
pub fn compute_kid(public_key: &RsaPublicKey) -> anyhow::Result<String> {
    let der = public_key
        .to_public_key_der()
        .context("failed to encode public key as PKIX DER")?;
    Ok(hex::encode(Sha256::digest(der.as_bytes())))
}

fn is_key_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            KEY_FILE_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

/// Lowercased file stem with one pairing suffix stripped, e.g.
/// "rsa_public.pem" and "RSA-priv.key" both normalize to "rsa".
fn normalize_stem(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => file_name,
    };
    let stem = stem.to_ascii_lowercase();
    for suffix in STEM_SUFFIXES {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    stem
}

/// Recursively visit key files under `dir`; unreadable entries are skipped.
fn walk_key_files(dir: &Path, visit: &mut dyn FnMut(&str, &[u8])) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_key_files(&path, visit);
            continue;
        }
        if !is_key_file(&path) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Ok(data) = std::fs::read(&path) {
            visit(&normalize_stem(file_name), &data);
        }
    }
}

/// First RSA public key found across the PEM blocks of a file.
/// Tries CERTIFICATE, then PKIX, then PKCS#1 per block.
fn parse_public_blocks(data: &[u8]) -> Option<RsaPublicKey> {
    for block in pem::parse_many(data).ok()? {
        if block.tag() == "CERTIFICATE" {
            if let Ok((_, cert)) = parse_x509_certificate(block.contents()) {
                if let Ok(key) = RsaPublicKey::from_public_key_der(cert.tbs_certificate.subject_pki.raw)
                {
                    return Some(key);
                }
            }
            continue;
        }
        if let Ok(key) = RsaPublicKey::from_public_key_der(block.contents()) {
            return Some(key);
        }
        if let Ok(key) = RsaPublicKey::from_pkcs1_der(block.contents()) {
            return Some(key);
        }
    }
    None
}

/// First RSA private key found across the PEM blocks of a file.
/// Tries PKCS#8, then PKCS#1 per block.
fn parse_private_blocks(data: &[u8]) -> Option<RsaPrivateKey> {
    for block in pem::parse_many(data).ok()? {
        if block.tag() == "PRIVATE KEY" || block.tag() == "ENCRYPTED PRIVATE KEY" {
            if let Ok(key) = RsaPrivateKey::from_pkcs8_der(block.contents()) {
                return Some(key);
            }
        }
        if let Ok(key) = RsaPrivateKey::from_pkcs1_der(block.contents()) {
            return Some(key);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    fn generate_keypair() -> (RsaPublicKey, RsaPrivateKey) {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        (RsaPublicKey::from(&private_key), private_key)
    }

    #[test]
    fn test_kid_is_sha256_of_pkix_der() {
        let (public_key, _) = generate_keypair();
        let kid = compute_kid(&public_key).unwrap();

        let der = public_key.to_public_key_der().unwrap();
        let expected = hex::encode(Sha256::digest(der.as_bytes()));

        assert_eq!(kid, expected);
        assert_eq!(kid.len(), 64);
        assert!(kid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_normalize_stem_strips_pairing_suffixes() {
        assert_eq!(normalize_stem("rsa_public.pem"), "rsa");
        assert_eq!(normalize_stem("rsa-public.pem"), "rsa");
        assert_eq!(normalize_stem("rsa_pub.pub"), "rsa");
        assert_eq!(normalize_stem("RSA_PRIVATE.key"), "rsa");
        assert_eq!(normalize_stem("signing-priv.pem"), "signing");
        assert_eq!(normalize_stem("plain.pem"), "plain");
        assert_eq!(normalize_stem("noext"), "noext");
    }

    #[test]
    fn test_key_file_extensions() {
        assert!(is_key_file(Path::new("a/rsa.pem")));
        assert!(is_key_file(Path::new("a/rsa.PUB")));
        assert!(is_key_file(Path::new("a/rsa.crt")));
        assert!(!is_key_file(Path::new("a/readme.md")));
        assert!(!is_key_file(Path::new("a/rsa")));
    }

    #[test]
    fn test_load_pairs_by_normalized_stem() {
        let dir = std::env::temp_dir().join(format!("keystore-test-{}", std::process::id()));
        let public_dir = dir.join("public");
        let private_dir = dir.join("private");
        std::fs::create_dir_all(&public_dir).unwrap();
        std::fs::create_dir_all(&private_dir).unwrap();

        let (public_key, private_key) = generate_keypair();
        let public_pem = public_key.to_public_key_pem(LineEnding::LF).unwrap();
        let private_pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        std::fs::write(public_dir.join("signing_public.pem"), public_pem).unwrap();
        std::fs::write(private_dir.join("signing_private.pem"), private_pem.as_bytes()).unwrap();

        // An unpaired public key must not produce a pair.
        let (orphan, _) = generate_keypair();
        let orphan_pem = orphan.to_public_key_pem(LineEnding::LF).unwrap();
        std::fs::write(public_dir.join("orphan_public.pem"), orphan_pem).unwrap();

        let store = KeyStore::load(
            "RSA",
            public_dir.to_str().unwrap(),
            private_dir.to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(store.pairs().len(), 1);
        assert_eq!(store.active().name, "signing");
        assert_eq!(store.active().kid, compute_kid(&public_key).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_non_rsa_key_type() {
        let err = KeyStore::load("EC", "keys/public", "keys/private").unwrap_err();
        assert!(err.to_string().contains("unsupported key type"));
    }

    #[test]
    fn test_find_by_kid() {
        let (public_key, private_key) = generate_keypair();
        let store =
            KeyStore::from_pairs(vec![("main".to_string(), public_key, private_key)]).unwrap();

        let kid = store.active().kid.clone();
        assert!(store.find_by_kid(&kid).is_some());
        assert!(store.find_by_kid(&"0".repeat(64)).is_none());
    }

    #[test]
    fn test_jwks_entries() {
        let (public_key, private_key) = generate_keypair();
        let store =
            KeyStore::from_pairs(vec![("main".to_string(), public_key.clone(), private_key)])
                .unwrap();

        let jwks = store.jwks();
        assert_eq!(jwks.len(), 1);
        let jwk = &jwks[0];
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.alg, "RS256");
        assert_eq!(jwk.kid, store.active().kid);
        assert_eq!(
            jwk.n,
            URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be())
        );
        // 65537 == 0x010001
        assert_eq!(jwk.e, URL_SAFE_NO_PAD.encode([0x01, 0x00, 0x01]));
    }
}
