// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Parsing facade over the four operation kinds.
//!
//! The parser owns structural validation only: field presence and shape,
//! base64url decoding, multihash well-formedness, and signature validity as
//! a pure function of each operation's own payload. Commitment/reveal
//! checks against live DID state belong to the processor.

use serde_json::Value;

use super::{
    AnchoredOperation, CreateOperation, DeactivateOperation, Operation, RecoverOperation,
    UpdateOperation,
};
use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};
use crate::jwk::PublicKeyJwk;
use crate::multihash;

/// Parses untrusted operation buffers into validated [`Operation`]s.
#[derive(Debug, Clone)]
pub struct OperationParser {
    params: ProtocolParameters,
}

impl OperationParser {
    pub fn new(params: ProtocolParameters) -> Self {
        Self { params }
    }

    /// Parse an operation from its canonical byte form, dispatching on the
    /// `type` property.
    pub fn parse(&self, buffer: &[u8]) -> SidetreeResult<Operation> {
        let object: Value =
            serde_json::from_slice(buffer).map_err(|_| SidetreeError::OperationNotJson)?;
        let operation_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(SidetreeError::OperationMissingOrUnknownType)?;

        match operation_type {
            "create" => {
                CreateOperation::parse_object(object, &self.params).map(Operation::Create)
            }
            "update" => {
                UpdateOperation::parse_object(object, &self.params).map(Operation::Update)
            }
            "recover" => {
                RecoverOperation::parse_object(object, &self.params).map(Operation::Recover)
            }
            "deactivate" => DeactivateOperation::parse_object(object).map(Operation::Deactivate),
            _ => Err(SidetreeError::OperationMissingOrUnknownType),
        }
    }

    /// Parse an anchored operation's buffer.
    pub fn parse_anchored(&self, anchored: &AnchoredOperation) -> SidetreeResult<Operation> {
        self.parse(&anchored.operation_buffer)
    }
}

/// Require a present, well-formed encoded multihash string.
pub(super) fn require_multihash_string(
    value: Option<String>,
    error: SidetreeError,
) -> SidetreeResult<String> {
    match value {
        Some(s) if multihash::is_valid_encoded_multihash(&s) => Ok(s),
        _ => Err(error),
    }
}

/// Check that a wire reveal value is the hash of the key the signed payload
/// embeds. The hash algorithm is taken from the reveal value's own prefix.
pub(super) fn verify_reveal_matches_key(
    reveal_value: &str,
    key: &PublicKeyJwk,
) -> SidetreeResult<()> {
    let (algorithm, _) = multihash::decode(reveal_value)
        .map_err(|_| SidetreeError::OperationRevealValueMissingOrInvalid)?;
    let computed = multihash::canonicalize_then_hash_then_encode(key, algorithm)?;
    if computed != reveal_value {
        return Err(SidetreeError::OperationRevealValueDoesNotMatchKey);
    }
    Ok(())
}
