// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Public key JWK model.
//!
//! Operations reveal public keys as JSON Web Keys. Two curves are accepted:
//! Ed25519 (OKP) and secp256k1 (EC). Private key parameters are rejected at
//! the type level: the wire form has no field to carry them.

use serde::{Deserialize, Serialize};

use crate::encoder;
use crate::error::{SidetreeError, SidetreeResult};

/// Curves accepted for operation signing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCurve {
    Ed25519,
    Secp256k1,
}

/// A public key in JWK form as it appears inside signed operation payloads.
///
/// Field order is irrelevant on the wire; canonicalization sorts keys
/// before hashing, so the same key always produces the same commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl PublicKeyJwk {
    /// The curve this key claims, if it is one this implementation accepts.
    pub fn curve(&self) -> SidetreeResult<KeyCurve> {
        match (self.kty.as_str(), self.crv.as_str()) {
            ("OKP", "Ed25519") => Ok(KeyCurve::Ed25519),
            ("EC", "secp256k1") => Ok(KeyCurve::Secp256k1),
            _ => Err(SidetreeError::JwkUnsupportedKeyType(format!(
                "kty={} crv={}",
                self.kty, self.crv
            ))),
        }
    }

    /// Decode the `x` coordinate, enforcing the 32-byte length every
    /// supported curve uses.
    pub fn x_bytes(&self) -> SidetreeResult<[u8; 32]> {
        decode_coordinate(&self.x)
    }

    /// Decode the `y` coordinate. Only meaningful for EC keys.
    pub fn y_bytes(&self) -> SidetreeResult<[u8; 32]> {
        let y = self.y.as_ref().ok_or(SidetreeError::JwkInvalidCoordinate)?;
        decode_coordinate(y)
    }

    /// Structural validation: supported curve and well-formed coordinates.
    pub fn validate(&self) -> SidetreeResult<()> {
        match self.curve()? {
            KeyCurve::Ed25519 => {
                self.x_bytes()?;
                if self.y.is_some() {
                    return Err(SidetreeError::JwkInvalidCoordinate);
                }
            }
            KeyCurve::Secp256k1 => {
                self.x_bytes()?;
                self.y_bytes()?;
            }
        }
        Ok(())
    }
}

fn decode_coordinate(encoded: &str) -> SidetreeResult<[u8; 32]> {
    let bytes = encoder::decode(encoded).map_err(|_| SidetreeError::JwkInvalidCoordinate)?;
    bytes
        .try_into()
        .map_err(|_| SidetreeError::JwkInvalidCoordinate)
}
