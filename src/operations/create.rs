// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::Deserialize;
use serde_json::Value;

use super::{Delta, SuffixData};
use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash::{self, HashAlgorithm};

/// A structurally validated create operation.
///
/// The DID unique suffix is always derived from the embedded suffix data,
/// never taken from the wire, so an operation claiming a suffix that does
/// not match its own suffix data is unrepresentable.
#[derive(Debug, Clone)]
pub struct CreateOperation {
    pub did_unique_suffix: String,
    pub suffix_data: SuffixData,
    pub delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOperationWire {
    #[allow(dead_code)]
    r#type: Option<String>,
    suffix_data: Option<Value>,
    delta: Option<Value>,
}

impl CreateOperation {
    /// Parse a create operation object that has already been read as JSON.
    pub fn parse_object(object: Value, params: &ProtocolParameters) -> SidetreeResult<Self> {
        let wire: CreateOperationWire =
            serde_json::from_value(object).map_err(|_| SidetreeError::OperationNotJson)?;

        let suffix_data_value = wire
            .suffix_data
            .ok_or(SidetreeError::CreateOperationMissingSuffixData)?;
        let suffix_data: SuffixData = serde_json::from_value(suffix_data_value)
            .map_err(|_| SidetreeError::CreateOperationMissingSuffixData)?;

        if !multihash::is_valid_encoded_multihash(&suffix_data.recovery_commitment) {
            return Err(SidetreeError::CreateOperationRecoveryCommitmentInvalid);
        }
        if !multihash::is_valid_encoded_multihash(&suffix_data.delta_hash) {
            return Err(SidetreeError::CreateOperationDeltaHashInvalid);
        }

        // The delta is optional: a create anchored without a reachable chunk
        // file is still a create. Whether the delta matches the committed
        // hash is the processor's decision, with its own fallback.
        let delta = match wire.delta {
            Some(value) => {
                let delta: Delta =
                    serde_json::from_value(value).map_err(|_| SidetreeError::DeltaNotJsonObject)?;
                delta.validate(params.max_delta_size_bytes)?;
                Some(delta)
            }
            None => None,
        };

        let did_unique_suffix =
            multihash::canonicalize_then_hash_then_encode(&suffix_data, HashAlgorithm::Sha256)?;

        Ok(Self { did_unique_suffix, suffix_data, delta })
    }

    /// Parse a create operation from its canonical byte form.
    pub fn parse(buffer: &[u8], params: &ProtocolParameters) -> SidetreeResult<Self> {
        let object: Value =
            serde_json::from_slice(buffer).map_err(|_| SidetreeError::OperationNotJson)?;
        Self::parse_object(object, params)
    }
}
