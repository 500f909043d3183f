// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Operation model: the four operation kinds, their shared payload pieces,
//! and the anchored form the stores deal in.

mod create;
mod deactivate;
mod parser;
mod recover;
mod update;

pub use create::CreateOperation;
pub use deactivate::{DeactivateOperation, DeactivateSignedData};
pub use parser::OperationParser;
pub use recover::{RecoverOperation, RecoverSignedData};
pub use update::{UpdateOperation, UpdateSignedData};

use serde::{Deserialize, Serialize};

use crate::document::DidStatePatch;
use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash;

/// The four operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    Create,
    Update,
    Recover,
    Deactivate,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "create",
            OperationType::Update => "update",
            OperationType::Recover => "recover",
            OperationType::Deactivate => "deactivate",
        }
    }
}

/// Create/update/recover delta: document patches plus the next update
/// commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub patches: Vec<DidStatePatch>,
    pub update_commitment: String,
}

impl Delta {
    /// Structural checks shared by every kind that carries a delta.
    pub fn validate(&self, max_size_bytes: usize) -> SidetreeResult<()> {
        if !multihash::is_valid_encoded_multihash(&self.update_commitment) {
            return Err(SidetreeError::DeltaUpdateCommitmentInvalid);
        }
        let size = crate::canonicalizer::canonicalize(self)?.len();
        if size > max_size_bytes {
            return Err(SidetreeError::DeltaExceedsMaximumSize { size, max_size: max_size_bytes });
        }
        Ok(())
    }
}

/// Create operation suffix data. Hashing its canonical form yields the DID
/// unique suffix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixData {
    pub delta_hash: String,
    pub recovery_commitment: String,
}

/// A parsed, structurally validated operation.
#[derive(Debug, Clone)]
pub enum Operation {
    Create(CreateOperation),
    Update(UpdateOperation),
    Recover(RecoverOperation),
    Deactivate(DeactivateOperation),
}

impl Operation {
    pub fn operation_type(&self) -> OperationType {
        match self {
            Operation::Create(_) => OperationType::Create,
            Operation::Update(_) => OperationType::Update,
            Operation::Recover(_) => OperationType::Recover,
            Operation::Deactivate(_) => OperationType::Deactivate,
        }
    }

    /// The DID unique suffix this operation addresses. Derived for creates,
    /// carried on the wire for every other kind.
    pub fn did_unique_suffix(&self) -> &str {
        match self {
            Operation::Create(op) => &op.did_unique_suffix,
            Operation::Update(op) => &op.did_suffix,
            Operation::Recover(op) => &op.did_suffix,
            Operation::Deactivate(op) => &op.did_suffix,
        }
    }

    /// The wire reveal value, absent only for creates.
    pub fn reveal_value(&self) -> Option<&str> {
        match self {
            Operation::Create(_) => None,
            Operation::Update(op) => Some(&op.reveal_value),
            Operation::Recover(op) => Some(&op.reveal_value),
            Operation::Deactivate(op) => Some(&op.reveal_value),
        }
    }
}

/// An operation plus its anchoring coordinates, as persisted in the
/// operation store. `operation_buffer` is the canonical JSON byte form the
/// parser accepts; everything else is derived metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredOperation {
    pub operation_type: OperationType,
    pub did_unique_suffix: String,
    pub operation_buffer: Vec<u8>,
    pub transaction_time: u64,
    pub transaction_number: u64,
    pub operation_index: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multihash::HashAlgorithm;
    use serde_json::json;

    #[test]
    fn operation_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(OperationType::Create).unwrap(), json!("create"));
        assert_eq!(
            serde_json::from_value::<OperationType>(json!("deactivate")).unwrap(),
            OperationType::Deactivate
        );
    }

    #[test]
    fn delta_validate_rejects_bad_commitment() {
        let delta = Delta { patches: vec![], update_commitment: "not-a-multihash".into() };
        assert_eq!(
            delta.validate(1_000).unwrap_err().code(),
            "delta_update_commitment_invalid"
        );
    }

    #[test]
    fn delta_validate_enforces_size_cap() {
        let commitment = multihash::hash_then_encode(b"k", HashAlgorithm::Sha256);
        let delta = Delta { patches: vec![], update_commitment: commitment };
        assert!(delta.validate(1_000).is_ok());
        let err = delta.validate(10).unwrap_err();
        assert_eq!(err.code(), "delta_exceeds_maximum_size");
    }
}
