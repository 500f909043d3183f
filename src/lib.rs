// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

//! Core of a Sidetree-style DID method: deterministic resolution of DID
//! state from anchored operation multisets, and the transaction-processing
//! pipeline that turns on-ledger anchor strings into stored operations.
//!
//! The crate is a library. Ledger access, content-addressed storage and
//! persistence are consumed through traits ([`blockchain::Blockchain`],
//! [`cas::CasClient`], [`store::OperationStore`],
//! [`store::TransactionStore`]); in-memory implementations are included for
//! tests and single-node tooling.

pub mod anchored_data;
pub mod blockchain;
pub mod canonicalizer;
pub mod cas;
pub mod config;
pub mod document;
pub mod download_manager;
pub mod encoder;
pub mod error;
pub mod files;
pub mod jwk;
pub mod jws;
pub mod multihash;
pub mod operations;
pub mod processor;
pub mod resolver;
pub mod store;
pub mod transaction_processor;

#[cfg(test)]
mod tests;

// Re-export the types most integrations touch.
pub use anchored_data::AnchoredData;
pub use blockchain::{
    AcceptAllValueTimeLockVerifier, AmountBasedValueTimeLockVerifier, Blockchain,
    BlockchainReadResult, BlockchainTimeModel, FeeManager, MockBlockchain,
    PerOperationFeeManager, TransactionModel, ValueTimeLock, ValueTimeLockVerifier,
};
pub use cas::{CasClient, FetchResult, FetchResultCode, HttpCasClient, MockCas};
pub use config::ProtocolParameters;
pub use document::{DidStatePatch, DocumentState, PublicKeyEntry, ServiceEndpointEntry};
pub use download_manager::DownloadManager;
pub use error::{SidetreeError, SidetreeResult};
pub use files::{AnchorFile, ChunkFile, MapFile, SignedOperationReference};
pub use jwk::PublicKeyJwk;
pub use jws::{Jws, JwsAlgorithm, SigningKey};
pub use multihash::HashAlgorithm;
pub use operations::{
    AnchoredOperation, CreateOperation, DeactivateOperation, Delta, Operation, OperationParser,
    OperationType, RecoverOperation, SuffixData, UpdateOperation,
};
pub use processor::{DidState, OperationProcessor};
pub use resolver::{OperationProcessorProvider, Resolver, VersionedProcessorRegistry};
pub use store::{
    InMemoryOperationStore, InMemoryTransactionStore, OperationStore, TransactionStore,
};
pub use transaction_processor::TransactionProcessor;

use std::sync::Arc;

/// Create a resolver running a single protocol version.
pub fn create_resolver(
    operation_store: Arc<dyn OperationStore>,
    params: ProtocolParameters,
) -> Resolver {
    let processor = Arc::new(OperationProcessor::new(params.clone()));
    let registry = Arc::new(VersionedProcessorRegistry::single_version(processor));
    Resolver::new(registry, operation_store, params)
}

/// Create a transaction processor over the given collaborators.
pub fn create_transaction_processor(
    cas: Arc<dyn CasClient>,
    operation_store: Arc<dyn OperationStore>,
    fee_manager: Arc<dyn FeeManager>,
    value_time_lock_verifier: Arc<dyn ValueTimeLockVerifier>,
    params: ProtocolParameters,
) -> TransactionProcessor {
    let download_manager = Arc::new(DownloadManager::new(cas, params.max_concurrent_downloads));
    TransactionProcessor::new(
        download_manager,
        operation_store,
        fee_manager,
        value_time_lock_verifier,
        params,
    )
}
