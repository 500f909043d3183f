// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SidetreeError, SidetreeResult};
use crate::jwk::PublicKeyJwk;
use crate::jws::Jws;

/// Claims signed inside a deactivate operation. Unlike update and recover,
/// the DID suffix itself is signed over: deactivation is irreversible, so
/// a signature must not be replayable against a different DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateSignedData {
    pub did_suffix: String,
    pub recovery_key: PublicKeyJwk,
}

/// A structurally validated deactivate operation. Carries no delta.
#[derive(Debug, Clone)]
pub struct DeactivateOperation {
    pub did_suffix: String,
    pub reveal_value: String,
    pub signed_data: DeactivateSignedData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeactivateOperationWire {
    did_suffix: Option<String>,
    reveal_value: Option<String>,
    signed_data: Option<String>,
}

impl DeactivateOperation {
    pub fn parse_object(object: Value) -> SidetreeResult<Self> {
        let wire: DeactivateOperationWire =
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
        let signed_data: DeactivateSignedData = jws.payload_as()?;
        signed_data.recovery_key.validate()?;
        jws.verify(&signed_data.recovery_key)?;
        super::parser::verify_reveal_matches_key(&reveal_value, &signed_data.recovery_key)?;

        if signed_data.did_suffix != did_suffix {
            return Err(SidetreeError::DeactivateOperationDidSuffixMismatch);
        }

        Ok(Self { did_suffix, reveal_value, signed_data })
    }

    pub fn parse(buffer: &[u8]) -> SidetreeResult<Self> {
        let object: Value =
            serde_json::from_slice(buffer).map_err(|_| SidetreeError::OperationNotJson)?;
        Self::parse_object(object)
    }
}
