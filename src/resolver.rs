// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Reconstructs a DID's current state from its stored operation multiset.
//!
//! The store gives back operations in no particular order, possibly with
//! duplicates and adversarial junk mixed in. Resolution converges anyway
//! because each state pins exactly one valid next reveal value per
//! commitment chain: at every link the resolver considers only operations
//! whose reveal value hashes to the current commitment, tie-breaks by
//! transaction number, and accepts the first one whose application
//! actually advances the state.
//!
//! The one hard rule here: `resolve` never fails, for any input. Malformed
//! or malicious operations are logged and skipped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::ProtocolParameters;
use crate::multihash;
use crate::operations::{AnchoredOperation, OperationType};
use crate::processor::{DidState, OperationProcessor};
use crate::store::OperationStore;

/// Looks up the operation processor responsible for a given ledger time.
///
/// Indirection between the resolver and the processor: protocol upgrades
/// register a new processor for a new time range, and historical operations
/// keep being interpreted by the rules in force when they were anchored.
pub trait OperationProcessorProvider: Send + Sync {
    fn processor_for(&self, transaction_time: u64) -> Option<Arc<OperationProcessor>>;
}

/// Registry mapping half-open `[start_time, next_start)` ranges to
/// processors.
#[derive(Default)]
pub struct VersionedProcessorRegistry {
    /// Sorted ascending by start time.
    entries: Vec<(u64, Arc<OperationProcessor>)>,
}

impl VersionedProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with a single version effective from time zero.
    pub fn single_version(processor: Arc<OperationProcessor>) -> Self {
        let mut registry = Self::new();
        registry.register(0, processor);
        registry
    }

    /// Register a processor effective from `start_time` onwards, until a
    /// later registration supersedes it.
    pub fn register(&mut self, start_time: u64, processor: Arc<OperationProcessor>) {
        match self.entries.binary_search_by_key(&start_time, |(t, _)| *t) {
            Ok(position) => self.entries[position] = (start_time, processor),
            Err(position) => self.entries.insert(position, (start_time, processor)),
        }
    }
}

impl OperationProcessorProvider for VersionedProcessorRegistry {
    fn processor_for(&self, transaction_time: u64) -> Option<Arc<OperationProcessor>> {
        self.entries
            .iter()
            .rev()
            .find(|(start, _)| *start <= transaction_time)
            .map(|(_, processor)| processor.clone())
    }
}

/// Resolves DID unique suffixes to their current state.
pub struct Resolver {
    provider: Arc<dyn OperationProcessorProvider>,
    store: Arc<dyn OperationStore>,
    params: ProtocolParameters,
}

impl Resolver {
    pub fn new(
        provider: Arc<dyn OperationProcessorProvider>,
        store: Arc<dyn OperationStore>,
        params: ProtocolParameters,
    ) -> Self {
        Self { provider, store, params }
    }

    /// Resolve a DID to its current state, or `None` if no valid create
    /// operation exists for it.
    pub async fn resolve(&self, did_unique_suffix: &str) -> Option<DidState> {
        let operations = match self.store.get(did_unique_suffix).await {
            Ok(operations) => operations,
            Err(store_error) => {
                warn!(%did_unique_suffix, error = %store_error, "operation store read failed");
                return None;
            }
        };

        let mut creates = Vec::new();
        let mut recovery_kind = Vec::new();
        let mut update_kind = Vec::new();
        for operation in &operations {
            match operation.operation_type {
                OperationType::Create => creates.push(operation),
                OperationType::Recover | OperationType::Deactivate => {
                    recovery_kind.push(operation)
                }
                OperationType::Update => update_kind.push(operation),
            }
        }

        // Hard cap on work per DID: honest histories are bounded by the
        // one-operation-per-transaction rule, but the store contents are
        // not trusted.
        let mut budget = self.params.max_operations_per_did;

        let mut state = self.apply_first_valid_create(&creates, &mut budget)?;

        let recovery_map = self.build_commitment_map(&recovery_kind);
        self.apply_commitment_chain(&mut state, &recovery_map, &mut budget, CommitmentKind::Recovery);

        // A deactivate clears both commitments, which also ends the update
        // phase before it starts.
        let update_map = self.build_commitment_map(&update_kind);
        self.apply_commitment_chain(&mut state, &update_map, &mut budget, CommitmentKind::Update);

        Some(state)
    }

    fn apply_first_valid_create(
        &self,
        creates: &[&AnchoredOperation],
        budget: &mut usize,
    ) -> Option<DidState> {
        for operation in creates {
            if *budget == 0 {
                warn!("operation budget exhausted during create phase");
                return None;
            }
            *budget -= 1;
            let Some(processor) = self.processor_for(operation) else {
                continue;
            };
            if let Some(state) = processor.apply(operation, None) {
                return Some(state);
            }
        }
        None
    }

    /// Walk one commitment chain (recovery or update) to its end.
    fn apply_commitment_chain(
        &self,
        state: &mut DidState,
        commitment_map: &HashMap<String, Vec<&AnchoredOperation>>,
        budget: &mut usize,
        kind: CommitmentKind,
    ) {
        loop {
            let commitment = match kind.current_commitment(state) {
                Some(commitment) => commitment.to_string(),
                None => return,
            };
            let Some(bucket) = commitment_map.get(&commitment) else {
                return;
            };

            let mut candidates: Vec<&AnchoredOperation> = bucket.clone();
            candidates.sort_by_key(|op| op.transaction_number);

            let mut advanced = false;
            for operation in candidates {
                if *budget == 0 {
                    warn!("operation budget exhausted during commitment chain");
                    return;
                }
                *budget -= 1;
                let Some(processor) = self.processor_for(operation) else {
                    continue;
                };
                if let Some(new_state) = processor.apply(operation, Some(state)) {
                    if new_state.last_operation_transaction_number
                        != state.last_operation_transaction_number
                    {
                        *state = new_state;
                        advanced = true;
                        break;
                    }
                }
            }
            if !advanced {
                return;
            }
        }
    }

    /// Map every prospective commitment to the operations that could
    /// satisfy it. Each reveal digest is hashed under every supported
    /// algorithm so that operations anchored before a hash migration stay
    /// matchable.
    fn build_commitment_map<'a>(
        &self,
        operations: &[&'a AnchoredOperation],
    ) -> HashMap<String, Vec<&'a AnchoredOperation>> {
        let mut map: HashMap<String, Vec<&'a AnchoredOperation>> = HashMap::new();
        for operation in operations {
            let Some(processor) = self.processor_for(operation) else {
                continue;
            };
            let digest = match processor.get_reveal_value(operation) {
                Ok(digest) => digest,
                Err(parse_error) => {
                    debug!(
                        code = parse_error.code(),
                        transaction_number = operation.transaction_number,
                        "operation without usable reveal value, skipping"
                    );
                    continue;
                }
            };
            for algorithm in &self.params.hash_algorithms {
                let commitment = multihash::hash_then_encode(&digest, *algorithm);
                map.entry(commitment).or_default().push(operation);
            }
        }
        map
    }

    fn processor_for(&self, operation: &AnchoredOperation) -> Option<Arc<OperationProcessor>> {
        let processor = self.provider.processor_for(operation.transaction_time);
        if processor.is_none() {
            // Registrations are wired at startup; a gap is a deployment bug,
            // not something an anchored operation should be able to cause.
            error!(
                transaction_time = operation.transaction_time,
                "no operation processor registered for transaction time"
            );
        }
        processor
    }
}

#[derive(Clone, Copy)]
enum CommitmentKind {
    Recovery,
    Update,
}

impl CommitmentKind {
    fn current_commitment<'a>(&self, state: &'a DidState) -> Option<&'a str> {
        match self {
            CommitmentKind::Recovery => state.next_recovery_commitment.as_deref(),
            CommitmentKind::Update => state.next_update_commitment.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::OperationProcessor;

    #[test]
    fn registry_selects_latest_applicable_version() {
        let params = ProtocolParameters::default();
        let v1 = Arc::new(OperationProcessor::new(params.clone()));
        let v2 = Arc::new(OperationProcessor::new(params));
        let mut registry = VersionedProcessorRegistry::new();
        registry.register(0, v1.clone());
        registry.register(500, v2.clone());

        assert!(Arc::ptr_eq(&registry.processor_for(0).unwrap(), &v1));
        assert!(Arc::ptr_eq(&registry.processor_for(499).unwrap(), &v1));
        assert!(Arc::ptr_eq(&registry.processor_for(500).unwrap(), &v2));
        assert!(Arc::ptr_eq(&registry.processor_for(9_999).unwrap(), &v2));
    }

    #[test]
    fn registry_with_no_entry_before_time_returns_none() {
        let params = ProtocolParameters::default();
        let mut registry = VersionedProcessorRegistry::new();
        registry.register(100, Arc::new(OperationProcessor::new(params)));
        assert!(registry.processor_for(99).is_none());
        assert!(registry.processor_for(100).is_some());
    }
}
