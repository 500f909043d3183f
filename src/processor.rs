// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Applies a single anchored operation on top of a DID state.
//!
//! Everything here is a pure function of the operation bytes and the input
//! state: no I/O, no clock. An operation that fails any check yields the
//! input state unchanged; the resolver decides what that means for the
//! overall resolution, and callers detect progress by comparing
//! `last_operation_transaction_number`.

use tracing::debug;

use crate::config::ProtocolParameters;
use crate::document::{self, DocumentState};
use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash;
use crate::operations::{
    AnchoredOperation, CreateOperation, DeactivateOperation, Operation, OperationParser,
    RecoverOperation, UpdateOperation,
};

/// The reconstructed state of one DID.
///
/// A deactivated DID has both commitment fields empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DidState {
    pub document: DocumentState,
    pub next_update_commitment: Option<String>,
    pub next_recovery_commitment: Option<String>,
    pub last_operation_transaction_number: u64,
}

/// Applies operations of one protocol version.
#[derive(Debug, Clone)]
pub struct OperationProcessor {
    parser: OperationParser,
}

impl OperationProcessor {
    pub fn new(params: ProtocolParameters) -> Self {
        Self { parser: OperationParser::new(params) }
    }

    /// Apply one anchored operation, returning the resulting state.
    ///
    /// Returns the input state (cloned) whenever the operation is
    /// malformed, mis-signed, or fails its commitment checks; returns
    /// `None` only when no state exists and the operation cannot create
    /// one. This function never fails: every rejected operation is logged
    /// with its error code and skipped.
    pub fn apply(
        &self,
        anchored: &AnchoredOperation,
        state: Option<&DidState>,
    ) -> Option<DidState> {
        let operation = match self.parser.parse_anchored(anchored) {
            Ok(op) => op,
            Err(error) => {
                debug!(
                    code = error.code(),
                    transaction_number = anchored.transaction_number,
                    "skipping unparseable operation"
                );
                return state.cloned();
            }
        };

        // A non-create operation addressing a different suffix than the one
        // it was stored under can only come from a corrupted store.
        if !matches!(operation, Operation::Create(_))
            && operation.did_unique_suffix() != anchored.did_unique_suffix
        {
            debug!(
                stored = %anchored.did_unique_suffix,
                "operation suffix does not match store key, skipping"
            );
            return state.cloned();
        }

        let result = match (&operation, state) {
            (Operation::Create(op), _) => return self.apply_create(anchored, op, state),
            (_, None) => return None,
            (Operation::Update(op), Some(current)) => self.apply_update(anchored, op, current),
            (Operation::Recover(op), Some(current)) => self.apply_recover(anchored, op, current),
            (Operation::Deactivate(op), Some(current)) => {
                self.apply_deactivate(anchored, op, current)
            }
        };

        match result {
            Ok(new_state) => Some(new_state),
            Err(error) => {
                debug!(
                    code = error.code(),
                    operation_type = operation.operation_type().as_str(),
                    transaction_number = anchored.transaction_number,
                    "operation rejected, state unchanged"
                );
                state.cloned()
            }
        }
    }

    /// The reveal digest of a non-create operation: the digest carried in
    /// its encoded reveal value. Hashing this digest under a supported
    /// algorithm reproduces the commitment the operation is trying to
    /// satisfy.
    pub fn get_reveal_value(&self, anchored: &AnchoredOperation) -> SidetreeResult<Vec<u8>> {
        let operation = self.parser.parse_anchored(anchored)?;
        let reveal_value = operation
            .reveal_value()
            .ok_or(SidetreeError::OperationProcessorCreateOperationHasNoRevealValue)?;
        let (_, digest) = multihash::decode(reveal_value)?;
        Ok(digest)
    }

    fn apply_create(
        &self,
        anchored: &AnchoredOperation,
        op: &CreateOperation,
        state: Option<&DidState>,
    ) -> Option<DidState> {
        // The first applicable create wins; later creates for the same
        // suffix are duplicates and must not alter state.
        if state.is_some() {
            return state.cloned();
        }

        let mut document = DocumentState::default();
        let mut next_update_commitment = None;

        match &op.delta {
            Some(delta) => {
                let delta_matches =
                    canonical_hash_matches(delta, &op.suffix_data.delta_hash);
                if delta_matches {
                    next_update_commitment = Some(delta.update_commitment.clone());
                    match document::apply_patches(&document, &delta.patches) {
                        Ok(patched) => document = patched,
                        Err(error) => {
                            debug!(code = error.code(), "create delta patches failed to apply");
                        }
                    }
                } else {
                    debug!(
                        code = SidetreeError::CreateOperationDeltaHashMismatch.code(),
                        "create delta does not match committed hash, DID created empty"
                    );
                }
            }
            None => {
                debug!("create anchored without delta, DID created empty");
            }
        }

        Some(DidState {
            document,
            next_update_commitment,
            next_recovery_commitment: Some(op.suffix_data.recovery_commitment.clone()),
            last_operation_transaction_number: anchored.transaction_number,
        })
    }

    fn apply_update(
        &self,
        anchored: &AnchoredOperation,
        op: &UpdateOperation,
        state: &DidState,
    ) -> SidetreeResult<DidState> {
        let commitment = state
            .next_update_commitment
            .as_deref()
            .ok_or(SidetreeError::OperationCommitmentMismatch)?;
        if !multihash::canonicalize_and_verify_double_hash(&op.signed_data.update_key, commitment)
        {
            return Err(SidetreeError::OperationCommitmentMismatch);
        }

        let delta = op
            .delta
            .as_ref()
            .ok_or(SidetreeError::UpdateOperationDeltaHashMismatch)?;
        if !canonical_hash_matches(delta, &op.signed_data.delta_hash) {
            return Err(SidetreeError::UpdateOperationDeltaHashMismatch);
        }

        let document = document::apply_patches(&state.document, &delta.patches)?;

        Ok(DidState {
            document,
            next_update_commitment: Some(delta.update_commitment.clone()),
            next_recovery_commitment: state.next_recovery_commitment.clone(),
            last_operation_transaction_number: anchored.transaction_number,
        })
    }

    fn apply_recover(
        &self,
        anchored: &AnchoredOperation,
        op: &RecoverOperation,
        state: &DidState,
    ) -> SidetreeResult<DidState> {
        let commitment = state
            .next_recovery_commitment
            .as_deref()
            .ok_or(SidetreeError::OperationCommitmentMismatch)?;
        if !multihash::canonicalize_and_verify_double_hash(
            &op.signed_data.recovery_key,
            commitment,
        ) {
            return Err(SidetreeError::OperationCommitmentMismatch);
        }

        // Recovery resets the document: patches apply on top of empty state.
        let mut document = DocumentState::default();
        let mut next_update_commitment = None;

        match &op.delta {
            Some(delta) if canonical_hash_matches(delta, &op.signed_data.delta_hash) => {
                next_update_commitment = Some(delta.update_commitment.clone());
                match document::apply_patches(&document, &delta.patches) {
                    Ok(patched) => document = patched,
                    Err(error) => {
                        debug!(code = error.code(), "recover delta patches failed to apply");
                    }
                }
            }
            _ => {
                // Deliberate: a recover whose delta is missing or fails its
                // hash check still rotates both commitments over an empty
                // document, so a malformed delta cannot sever the recovery
                // chain.
                debug!(
                    code = SidetreeError::RecoverOperationDeltaHashMismatch.code(),
                    "recover delta invalid, commitments rotated over empty document"
                );
            }
        }

        Ok(DidState {
            document,
            next_update_commitment,
            next_recovery_commitment: Some(op.signed_data.recovery_commitment.clone()),
            last_operation_transaction_number: anchored.transaction_number,
        })
    }

    fn apply_deactivate(
        &self,
        anchored: &AnchoredOperation,
        op: &DeactivateOperation,
        state: &DidState,
    ) -> SidetreeResult<DidState> {
        let commitment = state
            .next_recovery_commitment
            .as_deref()
            .ok_or(SidetreeError::OperationCommitmentMismatch)?;
        if !multihash::canonicalize_and_verify_double_hash(
            &op.signed_data.recovery_key,
            commitment,
        ) {
            return Err(SidetreeError::OperationCommitmentMismatch);
        }
        if op.signed_data.did_suffix != anchored.did_unique_suffix {
            return Err(SidetreeError::DeactivateOperationDidSuffixMismatch);
        }

        Ok(DidState {
            document: state.document.clone(),
            next_update_commitment: None,
            next_recovery_commitment: None,
            last_operation_transaction_number: anchored.transaction_number,
        })
    }
}

/// Whether the canonical form of `value` hashes to `encoded_multihash`.
fn canonical_hash_matches<T: serde::Serialize>(value: &T, encoded_multihash: &str) -> bool {
    match crate::canonicalizer::canonicalize(value) {
        Ok(canonical) => multihash::verify(&canonical, encoded_multihash),
        Err(_) => false,
    }
}
