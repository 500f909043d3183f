// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Delta;
use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};
use crate::jwk::PublicKeyJwk;
use crate::jws::Jws;
use crate::multihash;

/// Claims signed inside an update operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSignedData {
    pub update_key: PublicKeyJwk,
    pub delta_hash: String,
}

/// A structurally validated update operation.
///
/// The signature has been verified against the update key the payload
/// itself reveals; whether that key satisfies the DID's current update
/// commitment is checked by the processor against live state.
#[derive(Debug, Clone)]
pub struct UpdateOperation {
    pub did_suffix: String,
    pub reveal_value: String,
    pub delta: Option<Delta>,
    pub signed_data: UpdateSignedData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOperationWire {
    did_suffix: Option<String>,
    reveal_value: Option<String>,
    delta: Option<Value>,
    signed_data: Option<String>,
}

impl UpdateOperation {
    pub fn parse_object(object: Value, params: &ProtocolParameters) -> SidetreeResult<Self> {
        let wire: UpdateOperationWire =
            serde_json::from_value(object).map_err(|_| SidetreeError::OperationNotJson)?;

        let did_suffix = super::parser::require_multihash_string(
            wire.did_suffix,
            SidetreeError::OperationDidSuffixMissingOrInvalid,
        )?;
        let reveal_value = super::parser::require_multihash_string(
            wire.reveal_value,
            SidetreeError::OperationRevealValueMissingOrInvalid,
        )?;

        let compact_jws = wire
            .signed_data
            .ok_or(SidetreeError::OperationSignedDataMissingOrMalformed)?;
        let jws = Jws::parse(&compact_jws)?;
        let signed_data: UpdateSignedData = jws.payload_as()?;
        signed_data.update_key.validate()?;
        if !multihash::is_valid_encoded_multihash(&signed_data.delta_hash) {
            return Err(SidetreeError::OperationSignedDataMissingOrMalformed);
        }
        jws.verify(&signed_data.update_key)?;
        super::parser::verify_reveal_matches_key(&reveal_value, &signed_data.update_key)?;

        let delta = match wire.delta {
            Some(value) => {
                let delta: Delta =
                    serde_json::from_value(value).map_err(|_| SidetreeError::DeltaNotJsonObject)?;
                delta.validate(params.max_delta_size_bytes)?;
                Some(delta)
            }
            None => None,
        };

        Ok(Self { did_suffix, reveal_value, delta, signed_data })
    }

    pub fn parse(buffer: &[u8], params: &ProtocolParameters) -> SidetreeResult<Self> {
        let object: Value =
            serde_json::from_slice(buffer).map_err(|_| SidetreeError::OperationNotJson)?;
        Self::parse_object(object, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::{self, SigningKey};
    use crate::multihash::HashAlgorithm;
    use serde_json::json;

    fn signing_key() -> SigningKey {
        SigningKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[11u8; 32]))
    }

    fn update_wire(key: &SigningKey, sign_with: &SigningKey) -> Value {
        let delta = json!({
            "patches": [],
            "updateCommitment": multihash::hash_then_encode(b"next", HashAlgorithm::Sha256),
        });
        let delta_hash = multihash::canonicalize_then_hash_then_encode(
            &delta,
            HashAlgorithm::Sha256,
        )
        .unwrap();
        let public = key.public_key_jwk();
        let signed = jws::sign(
            &json!({"updateKey": public, "deltaHash": delta_hash}),
            sign_with,
        )
        .unwrap();
        json!({
            "type": "update",
            "didSuffix": multihash::hash_then_encode(b"did", HashAlgorithm::Sha256),
            "revealValue": multihash::canonicalize_then_hash_then_encode(
                &public, HashAlgorithm::Sha256
            ).unwrap(),
            "delta": delta,
            "signedData": signed,
        })
    }

    #[test]
    fn parses_well_formed_update() {
        let key = signing_key();
        let params = ProtocolParameters::default();
        let op = UpdateOperation::parse_object(update_wire(&key, &key), &params).unwrap();
        assert!(op.delta.is_some());
        assert_eq!(op.signed_data.update_key, key.public_key_jwk());
    }

    #[test]
    fn signature_by_other_key_is_rejected_at_parse() {
        // The payload embeds `key` but the JWS is signed by a different key:
        // this is detectable without any DID state.
        let key = signing_key();
        let other = SigningKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[12u8; 32]));
        let params = ProtocolParameters::default();
        let err = UpdateOperation::parse_object(update_wire(&key, &other), &params).unwrap_err();
        assert_eq!(err.code(), "jws_signature_invalid");
    }

    #[test]
    fn reveal_value_must_match_embedded_key() {
        let key = signing_key();
        let params = ProtocolParameters::default();
        let mut wire = update_wire(&key, &key);
        wire["revealValue"] =
            json!(multihash::hash_then_encode(b"some other key", HashAlgorithm::Sha256));
        let err = UpdateOperation::parse_object(wire, &params).unwrap_err();
        assert_eq!(err.code(), "operation_reveal_value_does_not_match_key");
    }

    #[test]
    fn missing_signed_data_is_typed_error() {
        let key = signing_key();
        let params = ProtocolParameters::default();
        let mut wire = update_wire(&key, &key);
        wire.as_object_mut().unwrap().remove("signedData");
        let err = UpdateOperation::parse_object(wire, &params).unwrap_err();
        assert_eq!(err.code(), "operation_signed_data_missing_or_malformed");
    }

    #[test]
    fn delta_is_optional() {
        let key = signing_key();
        let params = ProtocolParameters::default();
        let mut wire = update_wire(&key, &key);
        wire.as_object_mut().unwrap().remove("delta");
        let op = UpdateOperation::parse_object(wire, &params).unwrap();
        assert!(op.delta.is_none());
    }
}
