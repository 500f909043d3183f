// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Multihash hashing and the commitment scheme built on it.
//!
//! On-wire hashes are base64url-encoded multihashes: `<code><length><digest>`.
//! Only SHA2-256 (0x12) is produced today; SHA3-256 (0x16) is recognised so
//! that a future protocol version can migrate without stranding existing
//! operations. Verification helpers never fail on malformed input; they
//! return `false`, because the input is always attacker-controlled.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::canonicalizer;
use crate::encoder;
use crate::error::{SidetreeError, SidetreeResult};

/// Multihash code for SHA2-256.
pub const SHA2_256_CODE: u64 = 0x12;

/// Multihash code for SHA3-256.
pub const SHA3_256_CODE: u64 = 0x16;

const DIGEST_LENGTH: usize = 32;

/// Hash algorithms this implementation can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    Sha3_256,
}

impl HashAlgorithm {
    /// The multihash code for this algorithm.
    pub fn code(&self) -> u64 {
        match self {
            HashAlgorithm::Sha256 => SHA2_256_CODE,
            HashAlgorithm::Sha3_256 => SHA3_256_CODE,
        }
    }

    /// Look up an algorithm from its multihash code.
    pub fn from_code(code: u64) -> SidetreeResult<Self> {
        match code {
            SHA2_256_CODE => Ok(HashAlgorithm::Sha256),
            SHA3_256_CODE => Ok(HashAlgorithm::Sha3_256),
            other => Err(SidetreeError::MultihashUnsupportedHashAlgorithm(other)),
        }
    }
}

/// Hash `data`, returning the raw digest without any multihash framing.
pub fn hash_as_non_multihash_buffer(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha3_256 => Sha3_256::digest(data).to_vec(),
    }
}

/// Hash `data` and wrap the digest in multihash framing.
pub fn hash(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    let digest = hash_as_non_multihash_buffer(data, algorithm);
    let mut multihash = Vec::with_capacity(2 + digest.len());
    multihash.push(algorithm.code() as u8);
    multihash.push(digest.len() as u8);
    multihash.extend_from_slice(&digest);
    multihash
}

/// Hash `data` and return the base64url-encoded multihash.
pub fn hash_then_encode(data: &[u8], algorithm: HashAlgorithm) -> String {
    encoder::encode(hash(data, algorithm))
}

/// Canonicalize a JSON-serializable value, then hash-then-encode it.
///
/// This is how DID unique suffixes and reveal values are derived.
pub fn canonicalize_then_hash_then_encode<T: Serialize + ?Sized>(
    value: &T,
    algorithm: HashAlgorithm,
) -> SidetreeResult<String> {
    let canonical = canonicalizer::canonicalize(value)?;
    Ok(hash_then_encode(&canonical, algorithm))
}

/// Canonicalize a JSON-serializable value, then double-hash-then-encode it.
///
/// This is how commitments are derived from reveal keys: the inner hash is
/// an unframed digest, the outer hash carries the multihash prefix, so a
/// revealed key never directly exposes the commitment pre-image.
pub fn canonicalize_then_double_hash_then_encode<T: Serialize + ?Sized>(
    value: &T,
    algorithm: HashAlgorithm,
) -> SidetreeResult<String> {
    let canonical = canonicalizer::canonicalize(value)?;
    let intermediate = hash_as_non_multihash_buffer(&canonical, algorithm);
    Ok(hash_then_encode(&intermediate, algorithm))
}

/// Split multihash bytes into `(code, digest)`.
fn parse(multihash: &[u8]) -> SidetreeResult<(u64, &[u8])> {
    if multihash.len() < 2 {
        return Err(SidetreeError::MultihashNotAMultihash);
    }
    let code = multihash[0] as u64;
    let length = multihash[1] as usize;
    let digest = &multihash[2..];
    if digest.len() != length || length != DIGEST_LENGTH {
        return Err(SidetreeError::MultihashNotAMultihash);
    }
    Ok((code, digest))
}

/// Decode an encoded multihash into `(algorithm, digest)`.
pub fn decode(encoded_multihash: &str) -> SidetreeResult<(HashAlgorithm, Vec<u8>)> {
    let bytes = encoder::decode(encoded_multihash)?;
    let (code, digest) = parse(&bytes)?;
    Ok((HashAlgorithm::from_code(code)?, digest.to_vec()))
}

/// Whether `encoded_multihash` is a well-formed multihash under a supported
/// algorithm. Never fails.
pub fn is_valid_encoded_multihash(encoded_multihash: &str) -> bool {
    decode(encoded_multihash).is_ok()
}

/// Whether `encoded_multihash` was computed with the given algorithm code.
/// Never fails; malformed input is simply not a match.
pub fn is_computed_using_hash_algorithm(encoded_multihash: &str, code: u64) -> bool {
    match decode(encoded_multihash) {
        Ok((algorithm, _)) => algorithm.code() == code,
        Err(_) => false,
    }
}

/// Verify that hashing `content` yields `encoded_multihash`.
///
/// The algorithm is taken from the multihash's own prefix, so callers do
/// not need to know which algorithm produced it. Never fails.
pub fn verify(content: &[u8], encoded_multihash: &str) -> bool {
    match decode(encoded_multihash) {
        Ok((algorithm, digest)) => hash_as_non_multihash_buffer(content, algorithm) == digest,
        Err(_) => false,
    }
}

/// Verify that double-hashing `content` yields `encoded_multihash`.
///
/// Used for commitment checks: `content` is the canonicalized reveal key,
/// `encoded_multihash` the previously anchored commitment. Never fails.
pub fn verify_double_hash(content: &[u8], encoded_multihash: &str) -> bool {
    match decode(encoded_multihash) {
        Ok((algorithm, digest)) => {
            let intermediate = hash_as_non_multihash_buffer(content, algorithm);
            hash_as_non_multihash_buffer(&intermediate, algorithm) == digest
        }
        Err(_) => false,
    }
}

/// Canonicalize a value and verify its double-hash against a commitment.
pub fn canonicalize_and_verify_double_hash<T: Serialize + ?Sized>(
    value: &T,
    encoded_multihash: &str,
) -> bool {
    match canonicalizer::canonicalize(value) {
        Ok(canonical) => verify_double_hash(&canonical, encoded_multihash),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha256_multihash_has_expected_framing() {
        let multihash = hash(b"abc", HashAlgorithm::Sha256);
        assert_eq!(multihash[0], 0x12);
        assert_eq!(multihash[1], 0x20);
        assert_eq!(multihash.len(), 34);
        // SHA-256("abc") starts with ba7816bf.
        assert_eq!(&multihash[2..6], &[0xba, 0x78, 0x16, 0xbf]);
    }

    #[test]
    fn sha3_multihash_uses_its_own_code() {
        let multihash = hash(b"abc", HashAlgorithm::Sha3_256);
        assert_eq!(multihash[0], 0x16);
        assert_ne!(
            multihash[2..],
            hash(b"abc", HashAlgorithm::Sha256)[2..],
            "sha3 digest must differ from sha2"
        );
    }

    #[test]
    fn unknown_algorithm_code_is_rejected() {
        let err = HashAlgorithm::from_code(0x11).unwrap_err();
        assert_eq!(err.code(), "multihash_unsupported_hash_algorithm");
    }

    #[test]
    fn verify_accepts_matching_content() {
        let encoded = hash_then_encode(b"payload", HashAlgorithm::Sha256);
        assert!(verify(b"payload", &encoded));
        assert!(!verify(b"other payload", &encoded));
    }

    #[test]
    fn verify_never_panics_on_garbage() {
        assert!(!verify(b"payload", "not-base64url!!"));
        assert!(!verify(b"payload", ""));
        assert!(!verify(b"payload", &encoder::encode([0x12u8])));
        // Wrong declared digest length.
        assert!(!verify(b"payload", &encoder::encode([0x12u8, 0x05, 1, 2, 3, 4, 5])));
        // Unsupported algorithm code with plausible framing.
        let mut bogus = vec![0x99u8, 0x20];
        bogus.extend_from_slice(&[0u8; 32]);
        assert!(!verify(b"payload", &encoder::encode(bogus)));
    }

    #[test]
    fn is_computed_using_hash_algorithm_matches_prefix() {
        let encoded = hash_then_encode(b"x", HashAlgorithm::Sha256);
        assert!(is_computed_using_hash_algorithm(&encoded, SHA2_256_CODE));
        assert!(!is_computed_using_hash_algorithm(&encoded, SHA3_256_CODE));
        assert!(!is_computed_using_hash_algorithm("garbage", SHA2_256_CODE));
    }

    #[test]
    fn double_hash_commitment_round_trip() {
        let key = json!({"crv": "Ed25519", "kty": "OKP", "x": "abc"});
        let commitment =
            canonicalize_then_double_hash_then_encode(&key, HashAlgorithm::Sha256).unwrap();
        assert!(canonicalize_and_verify_double_hash(&key, &commitment));

        let other_key = json!({"crv": "Ed25519", "kty": "OKP", "x": "abd"});
        assert!(!canonicalize_and_verify_double_hash(&other_key, &commitment));
    }

    #[test]
    fn commitment_equals_hash_of_reveal_digest() {
        // The resolver depends on this identity to bucket operations by
        // commitment without seeing any key.
        let key = json!({"crv": "Ed25519", "kty": "OKP", "x": "abc"});
        let reveal_value =
            canonicalize_then_hash_then_encode(&key, HashAlgorithm::Sha256).unwrap();
        let commitment =
            canonicalize_then_double_hash_then_encode(&key, HashAlgorithm::Sha256).unwrap();

        let (_, reveal_digest) = decode(&reveal_value).unwrap();
        assert_eq!(hash_then_encode(&reveal_digest, HashAlgorithm::Sha256), commitment);
    }
}
