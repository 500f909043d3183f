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

/// Claims signed inside a recover operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverSignedData {
    pub recovery_key: PublicKeyJwk,
    pub recovery_commitment: String,
    pub delta_hash: String,
}

/// A structurally validated recover operation.
#[derive(Debug, Clone)]
pub struct RecoverOperation {
    pub did_suffix: String,
    pub reveal_value: String,
    pub delta: Option<Delta>,
    pub signed_data: RecoverSignedData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecoverOperationWire {
    did_suffix: Option<String>,
    reveal_value: Option<String>,
    delta: Option<Value>,
    signed_data: Option<String>,
}

impl RecoverOperation {
    pub fn parse_object(object: Value, params: &ProtocolParameters) -> SidetreeResult<Self> {
        let wire: RecoverOperationWire =
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
        let signed_data: RecoverSignedData = jws.payload_as()?;
        signed_data.recovery_key.validate()?;
        if !multihash::is_valid_encoded_multihash(&signed_data.recovery_commitment)
            || !multihash::is_valid_encoded_multihash(&signed_data.delta_hash)
        {
            return Err(SidetreeError::OperationSignedDataMissingOrMalformed);
        }
        jws.verify(&signed_data.recovery_key)?;
        super::parser::verify_reveal_matches_key(&reveal_value, &signed_data.recovery_key)?;

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

    fn recovery_key() -> SigningKey {
        SigningKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[21u8; 32]))
    }

    fn recover_wire(key: &SigningKey) -> Value {
        let delta = json!({
            "patches": [],
            "updateCommitment": multihash::hash_then_encode(b"upd", HashAlgorithm::Sha256),
        });
        let delta_hash =
            multihash::canonicalize_then_hash_then_encode(&delta, HashAlgorithm::Sha256).unwrap();
        let public = key.public_key_jwk();
        let signed = jws::sign(
            &json!({
                "recoveryKey": public,
                "recoveryCommitment": multihash::hash_then_encode(b"rc", HashAlgorithm::Sha256),
                "deltaHash": delta_hash,
            }),
            key,
        )
        .unwrap();
        json!({
            "type": "recover",
            "didSuffix": multihash::hash_then_encode(b"did", HashAlgorithm::Sha256),
            "revealValue": multihash::canonicalize_then_hash_then_encode(
                &public, HashAlgorithm::Sha256
            ).unwrap(),
            "delta": delta,
            "signedData": signed,
        })
    }

    #[test]
    fn parses_well_formed_recover() {
        let params = ProtocolParameters::default();
        let op = RecoverOperation::parse_object(recover_wire(&recovery_key()), &params).unwrap();
        assert!(op.delta.is_some());
        assert!(multihash::is_valid_encoded_multihash(&op.signed_data.recovery_commitment));
    }

    #[test]
    fn malformed_recovery_commitment_in_claims_is_rejected() {
        let key = recovery_key();
        let params = ProtocolParameters::default();
        let public = key.public_key_jwk();
        let signed = jws::sign(
            &json!({
                "recoveryKey": public,
                "recoveryCommitment": "bogus",
                "deltaHash": multihash::hash_then_encode(b"d", HashAlgorithm::Sha256),
            }),
            &key,
        )
        .unwrap();
        let wire = json!({
            "didSuffix": multihash::hash_then_encode(b"did", HashAlgorithm::Sha256),
            "revealValue": multihash::canonicalize_then_hash_then_encode(
                &public, HashAlgorithm::Sha256
            ).unwrap(),
            "signedData": signed,
        });
        let err = RecoverOperation::parse_object(wire, &params).unwrap_err();
        assert_eq!(err.code(), "operation_signed_data_missing_or_malformed");
    }

    #[test]
    fn invalid_did_suffix_is_rejected() {
        let params = ProtocolParameters::default();
        let mut wire = recover_wire(&recovery_key());
        wire["didSuffix"] = json!("....");
        let err = RecoverOperation::parse_object(wire, &params).unwrap_err();
        assert_eq!(err.code(), "operation_did_suffix_missing_or_invalid");
    }
}
