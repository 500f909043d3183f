// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Pulls one ledger transaction end-to-end: from anchor string through the
//! file bundle to a persisted operation stream.
//!
//! The pipeline is opportunistic. A transaction with a valid anchor file
//! but a missing or invalid map/chunk file still contributes its creates,
//! recovers and deactivates; updates are lost with the map file, and deltas
//! are lost with the chunk file (the affected DIDs resolve with empty
//! documents where the delta-hash checks later fail). Only genuine
//! transience (the CAS being unreachable, the anchor file not yet
//! propagated, a store fault) makes the transaction eligible for retry.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::anchored_data::AnchoredData;
use crate::blockchain::{FeeManager, TransactionModel, ValueTimeLockVerifier};
use crate::cas::{FetchResult, FetchResultCode};
use crate::config::ProtocolParameters;
use crate::download_manager::DownloadManager;
use crate::error::{SidetreeError, SidetreeResult};
use crate::files::{AnchorFile, ChunkFile, MapFile};
use crate::multihash::{self, HashAlgorithm};
use crate::operations::{AnchoredOperation, OperationType};
use crate::store::OperationStore;

/// Processes individual ledger transactions into stored operations.
pub struct TransactionProcessor {
    download_manager: Arc<DownloadManager>,
    operation_store: Arc<dyn OperationStore>,
    fee_manager: Arc<dyn FeeManager>,
    value_time_lock_verifier: Arc<dyn ValueTimeLockVerifier>,
    params: ProtocolParameters,
}

impl TransactionProcessor {
    pub fn new(
        download_manager: Arc<DownloadManager>,
        operation_store: Arc<dyn OperationStore>,
        fee_manager: Arc<dyn FeeManager>,
        value_time_lock_verifier: Arc<dyn ValueTimeLockVerifier>,
        params: ProtocolParameters,
    ) -> Self {
        Self {
            download_manager,
            operation_store,
            fee_manager,
            value_time_lock_verifier,
            params,
        }
    }

    /// Process one transaction. Returns `true` when the transaction is
    /// fully handled (successfully, or permanently non-applicable) and
    /// `false` when a transient failure makes a retry worthwhile.
    pub async fn process_transaction(&self, transaction: &TransactionModel) -> bool {
        match self.process(transaction).await {
            Ok(operation_count) => {
                info!(
                    transaction_number = transaction.transaction_number,
                    operation_count, "transaction processed"
                );
                true
            }
            Err(error) if error.is_permanent() => {
                info!(
                    transaction_number = transaction.transaction_number,
                    code = error.code(),
                    "transaction permanently non-applicable"
                );
                true
            }
            Err(error) => {
                warn!(
                    transaction_number = transaction.transaction_number,
                    code = error.code(),
                    "transient failure, transaction will be retried"
                );
                false
            }
        }
    }

    async fn process(&self, transaction: &TransactionModel) -> SidetreeResult<usize> {
        // 1. Decode the anchor string. Any structural problem means no
        //    amount of retrying will ever make this transaction applicable.
        let anchored_data = AnchoredData::deserialize(&transaction.anchor_string, &self.params)?;
        let paid_operation_count = anchored_data.number_of_operations;

        // 2. Fee floor for the declared operation count.
        let required_fee = self
            .fee_manager
            .required_fee(paid_operation_count, transaction.transaction_time)
            .await?;
        if transaction.transaction_fee_paid < required_fee {
            return Err(SidetreeError::TransactionFeePaidBelowRequired {
                paid: transaction.transaction_fee_paid,
                required: required_fee,
            });
        }

        // 3–5. The file bundle.
        let anchor_file = self
            .download_and_verify_anchor_file(
                transaction,
                &anchored_data.anchor_file_uri,
                paid_operation_count,
            )
            .await?;
        let map_file = self.download_and_verify_map_file(&anchor_file).await?;
        let chunk_file = match &map_file {
            Some(map_file) => {
                self.download_and_verify_chunk_file(&anchor_file, map_file).await?
            }
            None => None,
        };

        // 6–7. Compose and persist.
        let operations = compose_anchored_operation_models(
            transaction,
            &anchor_file,
            map_file.as_ref(),
            chunk_file.as_ref(),
        )?;
        let operation_count = operations.len();
        self.operation_store.put(operations).await?;
        Ok(operation_count)
    }

    /// Download, decompress, parse and verify the anchor file. Every
    /// failure is surfaced: an invalid anchor file poisons the whole
    /// transaction.
    async fn download_and_verify_anchor_file(
        &self,
        transaction: &TransactionModel,
        anchor_file_uri: &str,
        paid_operation_count: u64,
    ) -> SidetreeResult<AnchorFile> {
        let fetch = self
            .download_manager
            .download(anchor_file_uri, self.params.max_anchor_file_size_bytes)
            .await;
        let content = content_or_error(fetch, anchor_file_uri, &self.params)?;
        let anchor_file = AnchorFile::parse(&content, &self.params, paid_operation_count)?;

        // External policy check; its failures bubble up unchanged.
        self.value_time_lock_verifier
            .verify_lock(transaction, anchor_file.did_unique_suffixes.len() as u64)
            .await?;

        Ok(anchor_file)
    }

    /// Download and parse the map file. Expected failures (absent,
    /// oversize, malformed, duplicate DIDs) degrade to `None` so the
    /// transaction still contributes its anchor-file operations; only CAS
    /// unreachability propagates.
    async fn download_and_verify_map_file(
        &self,
        anchor_file: &AnchorFile,
    ) -> SidetreeResult<Option<MapFile>> {
        let uri = &anchor_file.model.map_file_uri;
        let fetch = self
            .download_manager
            .download(uri, self.params.max_map_file_size_bytes)
            .await;
        let content = match secondary_content(fetch, uri)? {
            Some(content) => content,
            None => return Ok(None),
        };

        match MapFile::parse(
            &content,
            &self.params,
            &anchor_file.did_unique_suffixes,
            anchor_file.did_unique_suffixes.len() as u64,
        ) {
            Ok(map_file) => Ok(Some(map_file)),
            Err(parse_error) => {
                debug!(code = parse_error.code(), "map file rejected, updates dropped");
                Ok(None)
            }
        }
    }

    /// Download and parse the chunk file referenced by the map file. Same
    /// degradation rules as the map file: operations without deltas are
    /// still recorded.
    async fn download_and_verify_chunk_file(
        &self,
        anchor_file: &AnchorFile,
        map_file: &MapFile,
    ) -> SidetreeResult<Option<ChunkFile>> {
        let uri = &map_file.model.chunks[0].chunk_file_uri;
        let fetch = self
            .download_manager
            .download(uri, self.params.max_chunk_file_size_bytes)
            .await;
        let content = match secondary_content(fetch, uri)? {
            Some(content) => content,
            None => return Ok(None),
        };

        let expected_delta_count = anchor_file.model.operations.create.len()
            + anchor_file.model.operations.recover.len()
            + map_file.updates().len();
        match ChunkFile::parse(&content, &self.params, expected_delta_count) {
            Ok(chunk_file) => Ok(Some(chunk_file)),
            Err(parse_error) => {
                debug!(code = parse_error.code(), "chunk file rejected, deltas dropped");
                Ok(None)
            }
        }
    }
}

/// Zip anchor/map entries with their chunk-file deltas into anchored
/// operations, in canonical order: creates, recovers, updates, deactivates.
/// `operation_index` is the position in that order.
fn compose_anchored_operation_models(
    transaction: &TransactionModel,
    anchor_file: &AnchorFile,
    map_file: Option<&MapFile>,
    chunk_file: Option<&ChunkFile>,
) -> SidetreeResult<Vec<AnchoredOperation>> {
    let creates = &anchor_file.model.operations.create;
    let recovers = &anchor_file.model.operations.recover;
    let deactivates = &anchor_file.model.operations.deactivate;
    let updates = map_file.map(|m| m.updates()).unwrap_or_default();

    let delta_at = |index: usize| -> Option<Value> {
        chunk_file.and_then(|chunk| chunk.model.deltas.get(index).cloned())
    };

    let mut operations = Vec::with_capacity(
        creates.len() + recovers.len() + updates.len() + deactivates.len(),
    );
    let mut operation_index: u64 = 0;
    let mut delta_index: usize = 0;

    for create in creates {
        let mut object = Map::new();
        object.insert("type".into(), json!("create"));
        object.insert("suffixData".into(), serde_json::to_value(&create.suffix_data)?);
        if let Some(delta) = delta_at(delta_index) {
            object.insert("delta".into(), delta);
        }
        delta_index += 1;

        let did_unique_suffix = multihash::canonicalize_then_hash_then_encode(
            &create.suffix_data,
            HashAlgorithm::Sha256,
        )?;
        operations.push(anchored(
            transaction,
            OperationType::Create,
            did_unique_suffix,
            Value::Object(object),
            operation_index,
        )?);
        operation_index += 1;
    }

    for recover in recovers {
        let mut object = Map::new();
        object.insert("type".into(), json!("recover"));
        object.insert("didSuffix".into(), json!(recover.did_suffix));
        object.insert("revealValue".into(), json!(recover.reveal_value));
        object.insert("signedData".into(), json!(recover.signed_data));
        if let Some(delta) = delta_at(delta_index) {
            object.insert("delta".into(), delta);
        }
        delta_index += 1;

        operations.push(anchored(
            transaction,
            OperationType::Recover,
            recover.did_suffix.clone(),
            Value::Object(object),
            operation_index,
        )?);
        operation_index += 1;
    }

    for update in updates {
        let mut object = Map::new();
        object.insert("type".into(), json!("update"));
        object.insert("didSuffix".into(), json!(update.did_suffix));
        object.insert("revealValue".into(), json!(update.reveal_value));
        object.insert("signedData".into(), json!(update.signed_data));
        if let Some(delta) = delta_at(delta_index) {
            object.insert("delta".into(), delta);
        }
        delta_index += 1;

        operations.push(anchored(
            transaction,
            OperationType::Update,
            update.did_suffix.clone(),
            Value::Object(object),
            operation_index,
        )?);
        operation_index += 1;
    }

    for deactivate in deactivates {
        let object = json!({
            "type": "deactivate",
            "didSuffix": deactivate.did_suffix,
            "revealValue": deactivate.reveal_value,
            "signedData": deactivate.signed_data,
        });
        operations.push(anchored(
            transaction,
            OperationType::Deactivate,
            deactivate.did_suffix.clone(),
            object,
            operation_index,
        )?);
        operation_index += 1;
    }

    Ok(operations)
}

fn anchored(
    transaction: &TransactionModel,
    operation_type: OperationType,
    did_unique_suffix: String,
    object: Value,
    operation_index: u64,
) -> SidetreeResult<AnchoredOperation> {
    let operation_buffer = crate::canonicalizer::canonicalize(&object)?;
    Ok(AnchoredOperation {
        operation_type,
        did_unique_suffix,
        operation_buffer,
        transaction_time: transaction.transaction_time,
        transaction_number: transaction.transaction_number,
        operation_index,
    })
}

/// Classify a primary (anchor file) fetch: every non-success code is an
/// error, and the caller's retry policy hinges on which one.
fn content_or_error(
    fetch: FetchResult,
    uri: &str,
    params: &ProtocolParameters,
) -> SidetreeResult<Vec<u8>> {
    match fetch.code {
        FetchResultCode::Success => Ok(fetch.content.unwrap_or_default()),
        FetchResultCode::InvalidHash => Err(SidetreeError::CasFileHashInvalid(uri.to_string())),
        FetchResultCode::MaxSizeExceeded => Err(SidetreeError::FileExceedsMaximumSize {
            size: params.max_anchor_file_size_bytes + 1,
            max_size: params.max_anchor_file_size_bytes,
        }),
        FetchResultCode::NotAFile => Err(SidetreeError::CasFileNotAFile(uri.to_string())),
        FetchResultCode::NotFound => Err(SidetreeError::CasFileNotFound(uri.to_string())),
        FetchResultCode::CasNotReachable => {
            Err(SidetreeError::CasNotReachable(uri.to_string()))
        }
    }
}

/// Classify a secondary (map/chunk) fetch: absent or invalid content is an
/// expected condition and yields `None`; only unreachability propagates.
fn secondary_content(fetch: FetchResult, uri: &str) -> SidetreeResult<Option<Vec<u8>>> {
    match fetch.code {
        FetchResultCode::Success => Ok(fetch.content),
        FetchResultCode::CasNotReachable => {
            Err(SidetreeError::CasNotReachable(uri.to_string()))
        }
        code => {
            debug!(%uri, ?code, "secondary file unavailable, continuing without it");
            Ok(None)
        }
    }
}
