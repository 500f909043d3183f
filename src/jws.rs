// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Compact JWS (RFC 7515) signing and verification.
//!
//! Operation envelopes sign canonicalized JSON payloads with either EdDSA
//! (Ed25519) or ES256K (secp256k1). The verification side is a pure
//! function of the JWS string and a public key: whether that key is the one
//! the DID state demands is the processor's business, not this module's.

use ed25519_dalek::Verifier as _;
use k256::ecdsa::signature::hazmat::PrehashVerifier as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoder;
use crate::error::{SidetreeError, SidetreeResult};
use crate::jwk::{KeyCurve, PublicKeyJwk};

/// JWS algorithms accepted for operation signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwsAlgorithm {
    EdDsa,
    Es256k,
}

impl JwsAlgorithm {
    fn as_str(&self) -> &'static str {
        match self {
            JwsAlgorithm::EdDsa => "EdDSA",
            JwsAlgorithm::Es256k => "ES256K",
        }
    }

    fn from_str(value: &str) -> SidetreeResult<Self> {
        match value {
            "EdDSA" => Ok(JwsAlgorithm::EdDsa),
            "ES256K" => Ok(JwsAlgorithm::Es256k),
            other => Err(SidetreeError::JwsAlgorithmUnsupported(other.to_string())),
        }
    }

    /// The algorithm a key of the given curve must be used with.
    pub fn for_curve(curve: KeyCurve) -> Self {
        match curve {
            KeyCurve::Ed25519 => JwsAlgorithm::EdDsa,
            KeyCurve::Secp256k1 => JwsAlgorithm::Es256k,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
}

/// A parsed compact JWS.
///
/// `signing_input` is retained so verification does not have to re-encode
/// anything; re-encoding is where implementations historically diverge.
#[derive(Debug, Clone)]
pub struct Jws {
    pub algorithm: JwsAlgorithm,
    pub payload: Vec<u8>,
    signing_input: String,
    signature: Vec<u8>,
}

impl Jws {
    /// Parse a compact JWS string without verifying the signature.
    pub fn parse(compact_jws: &str) -> SidetreeResult<Self> {
        let mut segments = compact_jws.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(SidetreeError::JwsCompactFormatInvalid),
            };

        let header_bytes =
            encoder::decode(header_b64).map_err(|_| SidetreeError::JwsProtectedHeaderInvalid)?;
        let header: ProtectedHeader = serde_json::from_slice(&header_bytes)
            .map_err(|_| SidetreeError::JwsProtectedHeaderInvalid)?;
        let algorithm = JwsAlgorithm::from_str(&header.alg)?;

        let payload =
            encoder::decode(payload_b64).map_err(|_| SidetreeError::JwsCompactFormatInvalid)?;
        let signature =
            encoder::decode(signature_b64).map_err(|_| SidetreeError::JwsCompactFormatInvalid)?;

        Ok(Self {
            algorithm,
            payload,
            signing_input: format!("{header_b64}.{payload_b64}"),
            signature,
        })
    }

    /// Deserialize the payload as typed claims.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> SidetreeResult<T> {
        serde_json::from_slice(&self.payload)
            .map_err(|_| SidetreeError::OperationSignedDataMissingOrMalformed)
    }

    /// Verify the signature against a public key.
    ///
    /// Fails if the key's curve does not match the declared algorithm, so a
    /// signature can never be "verified" under the wrong primitive.
    pub fn verify(&self, public_key: &PublicKeyJwk) -> SidetreeResult<()> {
        let curve = public_key.curve()?;
        if JwsAlgorithm::for_curve(curve) != self.algorithm {
            return Err(SidetreeError::JwsAlgorithmUnsupported(format!(
                "{} signature with {:?} key",
                self.algorithm.as_str(),
                curve
            )));
        }
        match curve {
            KeyCurve::Ed25519 => self.verify_ed25519(public_key),
            KeyCurve::Secp256k1 => self.verify_secp256k1(public_key),
        }
    }

    fn verify_ed25519(&self, public_key: &PublicKeyJwk) -> SidetreeResult<()> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&public_key.x_bytes()?)
            .map_err(|_| SidetreeError::JwkInvalidCoordinate)?;
        let signature = ed25519_dalek::Signature::from_slice(&self.signature)
            .map_err(|_| SidetreeError::JwsSignatureInvalid)?;
        key.verify(self.signing_input.as_bytes(), &signature)
            .map_err(|_| SidetreeError::JwsSignatureInvalid)
    }

    fn verify_secp256k1(&self, public_key: &PublicKeyJwk) -> SidetreeResult<()> {
        let point = k256::EncodedPoint::from_affine_coordinates(
            &public_key.x_bytes()?.into(),
            &public_key.y_bytes()?.into(),
            false,
        );
        let key = k256::ecdsa::VerifyingKey::from_encoded_point(&point)
            .map_err(|_| SidetreeError::JwkInvalidCoordinate)?;
        let signature = k256::ecdsa::Signature::from_slice(&self.signature)
            .map_err(|_| SidetreeError::JwsSignatureInvalid)?;
        let digest = Sha256::digest(self.signing_input.as_bytes());
        key.verify_prehash(&digest, &signature)
            .map_err(|_| SidetreeError::JwsSignatureInvalid)
    }
}

/// Private signing keys accepted by [`sign`].
///
/// Key generation and custody are out of scope; callers bring their own
/// key material.
pub enum SigningKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl SigningKey {
    /// The public JWK corresponding to this signing key.
    pub fn public_key_jwk(&self) -> PublicKeyJwk {
        match self {
            SigningKey::Ed25519(key) => PublicKeyJwk {
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                x: encoder::encode(key.verifying_key().to_bytes()),
                y: None,
            },
            SigningKey::Secp256k1(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                PublicKeyJwk {
                    kty: "EC".to_string(),
                    crv: "secp256k1".to_string(),
                    x: encoder::encode(point.x().expect("uncompressed point has x")),
                    y: Some(encoder::encode(point.y().expect("uncompressed point has y"))),
                }
            }
        }
    }
}

/// Sign a serializable payload, producing a compact JWS string.
pub fn sign<T: Serialize>(payload: &T, key: &SigningKey) -> SidetreeResult<String> {
    let algorithm = match key {
        SigningKey::Ed25519(_) => JwsAlgorithm::EdDsa,
        SigningKey::Secp256k1(_) => JwsAlgorithm::Es256k,
    };
    let header = ProtectedHeader {
        alg: algorithm.as_str().to_string(),
    };
    let header_b64 = encoder::encode(
        serde_json::to_vec(&header)
            .map_err(|e| SidetreeError::JsonCanonicalizationFailure(e.to_string()))?,
    );
    let payload_b64 = encoder::encode(
        serde_json::to_vec(payload)
            .map_err(|e| SidetreeError::JsonCanonicalizationFailure(e.to_string()))?,
    );
    let signing_input = format!("{header_b64}.{payload_b64}");

    let signature = match key {
        SigningKey::Ed25519(key) => {
            use ed25519_dalek::Signer as _;
            key.sign(signing_input.as_bytes()).to_bytes().to_vec()
        }
        SigningKey::Secp256k1(key) => {
            use k256::ecdsa::signature::hazmat::PrehashSigner as _;
            let digest = Sha256::digest(signing_input.as_bytes());
            let signature: k256::ecdsa::Signature = key
                .sign_prehash(&digest)
                .map_err(|_| SidetreeError::JwsSignatureInvalid)?;
            signature.to_vec()
        }
    };

    Ok(format!("{signing_input}.{}", encoder::encode(signature)))
}
