// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type SidetreeResult<T> = Result<T, SidetreeError>;

/// Errors raised by the Sidetree core.
///
/// This is a closed enumeration: every variant maps to a stable string code
/// via [`SidetreeError::code`], which is what external callers and logs key
/// on. Variants carrying context render it through their `Display` form
/// only; the code never changes once shipped.
#[derive(Debug, Error)]
pub enum SidetreeError {
    // --- Encoding / canonicalisation ---
    #[error("Value is not a base64url-without-padding string")]
    EncoderNotBase64UrlString,

    #[error("Unable to canonicalize value as JSON: {0}")]
    JsonCanonicalizationFailure(String),

    // --- Multihash ---
    #[error("Unsupported multihash algorithm code: {0}")]
    MultihashUnsupportedHashAlgorithm(u64),

    #[error("Value is not a valid multihash")]
    MultihashNotAMultihash,

    // --- Operation parsing ---
    #[error("Operation buffer is not valid JSON")]
    OperationNotJson,

    #[error("Operation type is missing or unknown")]
    OperationMissingOrUnknownType,

    #[error("Create operation is missing suffix data")]
    CreateOperationMissingSuffixData,

    #[error("Create operation suffix data is missing or has a malformed recovery commitment")]
    CreateOperationRecoveryCommitmentInvalid,

    #[error("Create operation suffix data is missing or has a malformed delta hash")]
    CreateOperationDeltaHashInvalid,

    #[error("Operation DID suffix is missing or not a multihash string")]
    OperationDidSuffixMissingOrInvalid,

    #[error("Operation reveal value is missing or not a multihash string")]
    OperationRevealValueMissingOrInvalid,

    #[error("Operation reveal value does not match the key it reveals")]
    OperationRevealValueDoesNotMatchKey,

    #[error("Operation signed data is missing or malformed")]
    OperationSignedDataMissingOrMalformed,

    #[error("Delta exceeds maximum size: {size} bytes, limit {max_size}")]
    DeltaExceedsMaximumSize { size: usize, max_size: usize },

    #[error("Delta is present but is not a JSON object")]
    DeltaNotJsonObject,

    #[error("Delta update commitment is missing or malformed")]
    DeltaUpdateCommitmentInvalid,

    // --- JWS / JWK ---
    #[error("Compact JWS must have three dot-separated segments")]
    JwsCompactFormatInvalid,

    #[error("JWS protected header is malformed")]
    JwsProtectedHeaderInvalid,

    #[error("JWS algorithm is not supported: {0}")]
    JwsAlgorithmUnsupported(String),

    #[error("JWS signature verification failed")]
    JwsSignatureInvalid,

    #[error("JWK key type or curve is not supported: {0}")]
    JwkUnsupportedKeyType(String),

    #[error("JWK is missing a required coordinate or the coordinate has the wrong length")]
    JwkInvalidCoordinate,

    // --- Processor checks (logged and skipped at resolution time) ---
    #[error("Create operation delta hash does not match the hash committed in suffix data")]
    CreateOperationDeltaHashMismatch,

    #[error("Update operation delta hash does not match the hash in signed data")]
    UpdateOperationDeltaHashMismatch,

    #[error("Recover operation delta hash does not match the hash in signed data")]
    RecoverOperationDeltaHashMismatch,

    #[error("Deactivate operation signed DID suffix does not match the operation's suffix")]
    DeactivateOperationDidSuffixMismatch,

    #[error("Revealed key does not hash to the DID state's next commitment")]
    OperationCommitmentMismatch,

    // --- Anchor string ---
    #[error("Anchor string must be <numberOfOperations>.<anchorFileUri>: {0}")]
    AnchoredDataIncorrectFormat(String),

    #[error("Anchor string operation count is missing or not a positive integer")]
    AnchoredDataNumberOfOperationsInvalid,

    #[error("Anchor string declares {got} operations, protocol maximum is {max}")]
    AnchoredDataNumberOfOperationsGreaterThanMax { got: u64, max: u64 },

    // --- Anchor / map / chunk files ---
    #[error("File exceeds maximum allowed size: {size} bytes, limit {max_size}")]
    FileExceedsMaximumSize { size: usize, max_size: usize },

    #[error("Anchor file could not be decompressed")]
    AnchorFileDecompressionFailure,

    #[error("Anchor file is not valid JSON: {0}")]
    AnchorFileNotJson(String),

    #[error("Anchor file map file URI is missing or not a multihash string")]
    AnchorFileMapFileUriInvalid,

    #[error("Anchor file contains {got} operations, protocol maximum is {max}")]
    AnchorFileExceededMaxOperationCount { got: u64, max: u64 },

    #[error("Anchor file contains {got} operations but the transaction paid for {paid}")]
    AnchorFileOperationCountExceededPaidLimit { got: u64, paid: u64 },

    #[error("Map file could not be decompressed")]
    MapFileDecompressionFailure,

    #[error("Map file is not valid JSON: {0}")]
    MapFileNotJson(String),

    #[error("Map file must reference exactly one chunk file, found {0}")]
    MapFileChunkCountIncorrect(usize),

    #[error("Map file chunk file URI is missing or not a multihash string")]
    MapFileChunkFileUriInvalid,

    #[error("Anchor and map files together contain {got} operations, protocol maximum is {max}")]
    MapFileExceededMaxOperationCount { got: u64, max: u64 },

    #[error("Chunk file could not be decompressed")]
    ChunkFileDecompressionFailure,

    #[error("Chunk file is not valid JSON: {0}")]
    ChunkFileNotJson(String),

    #[error("Chunk file contains {got} deltas, expected {expected}")]
    ChunkFileDeltaCountIncorrect { got: usize, expected: usize },

    #[error("DID suffix {0} appears more than once in the transaction's files")]
    DuplicateOperationForDid(String),

    // --- CAS ---
    #[error("CAS file not found: {0}")]
    CasFileNotFound(String),

    #[error("CAS URI did not resolve to a file: {0}")]
    CasFileNotAFile(String),

    #[error("CAS URI is not a valid content hash: {0}")]
    CasFileHashInvalid(String),

    #[error("CAS is not reachable: {0}")]
    CasNotReachable(String),

    // --- Fees and value locks ---
    #[error("Transaction fee {paid} is below the required fee {required}")]
    TransactionFeePaidBelowRequired { paid: u64, required: u64 },

    #[error("Value time lock verification failed: {0}")]
    ValueTimeLockVerificationFailed(String),

    // --- Stores ---
    #[error("Operation store failure: {0}")]
    OperationStoreFailure(String),

    #[error("Transaction store failure: {0}")]
    TransactionStoreFailure(String),

    // --- Programmer errors ---
    #[error("Unknown operation type")]
    UnknownOperationType,

    #[error("Create operations do not carry a reveal value")]
    OperationProcessorCreateOperationHasNoRevealValue,

    #[error("No operation processor is registered for transaction time {0}")]
    NoProcessorForTransactionTime(u64),
}

impl From<serde_json::Error> for SidetreeError {
    fn from(error: serde_json::Error) -> Self {
        SidetreeError::JsonCanonicalizationFailure(error.to_string())
    }
}

impl SidetreeError {
    /// Stable string code for this error.
    ///
    /// Codes are part of the public contract and must never change for an
    /// existing variant.
    pub fn code(&self) -> &'static str {
        use SidetreeError::*;
        match self {
            EncoderNotBase64UrlString => "encoder_not_base64url_string",
            JsonCanonicalizationFailure(_) => "json_canonicalization_failure",
            MultihashUnsupportedHashAlgorithm(_) => "multihash_unsupported_hash_algorithm",
            MultihashNotAMultihash => "multihash_not_a_multihash",
            OperationNotJson => "operation_not_json",
            OperationMissingOrUnknownType => "operation_missing_or_unknown_type",
            CreateOperationMissingSuffixData => "create_operation_missing_suffix_data",
            CreateOperationRecoveryCommitmentInvalid => {
                "create_operation_recovery_commitment_invalid"
            }
            CreateOperationDeltaHashInvalid => "create_operation_delta_hash_invalid",
            OperationDidSuffixMissingOrInvalid => "operation_did_suffix_missing_or_invalid",
            OperationRevealValueMissingOrInvalid => "operation_reveal_value_missing_or_invalid",
            OperationRevealValueDoesNotMatchKey => "operation_reveal_value_does_not_match_key",
            OperationSignedDataMissingOrMalformed => "operation_signed_data_missing_or_malformed",
            DeltaExceedsMaximumSize { .. } => "delta_exceeds_maximum_size",
            DeltaNotJsonObject => "delta_not_json_object",
            DeltaUpdateCommitmentInvalid => "delta_update_commitment_invalid",
            JwsCompactFormatInvalid => "jws_compact_format_invalid",
            JwsProtectedHeaderInvalid => "jws_protected_header_invalid",
            JwsAlgorithmUnsupported(_) => "jws_algorithm_unsupported",
            JwsSignatureInvalid => "jws_signature_invalid",
            JwkUnsupportedKeyType(_) => "jwk_unsupported_key_type",
            JwkInvalidCoordinate => "jwk_invalid_coordinate",
            CreateOperationDeltaHashMismatch => "create_operation_delta_hash_mismatch",
            UpdateOperationDeltaHashMismatch => "update_operation_delta_hash_mismatch",
            RecoverOperationDeltaHashMismatch => "recover_operation_delta_hash_mismatch",
            DeactivateOperationDidSuffixMismatch => "deactivate_operation_did_suffix_mismatch",
            OperationCommitmentMismatch => "operation_commitment_mismatch",
            AnchoredDataIncorrectFormat(_) => "anchored_data_incorrect_format",
            AnchoredDataNumberOfOperationsInvalid => "anchored_data_number_of_operations_invalid",
            AnchoredDataNumberOfOperationsGreaterThanMax { .. } => {
                "anchored_data_number_of_operations_greater_than_max"
            }
            FileExceedsMaximumSize { .. } => "file_exceeds_maximum_size",
            AnchorFileDecompressionFailure => "anchor_file_decompression_failure",
            AnchorFileNotJson(_) => "anchor_file_not_json",
            AnchorFileMapFileUriInvalid => "anchor_file_map_file_uri_invalid",
            AnchorFileExceededMaxOperationCount { .. } => {
                "anchor_file_exceeded_max_operation_count"
            }
            AnchorFileOperationCountExceededPaidLimit { .. } => {
                "anchor_file_operation_count_exceeded_paid_limit"
            }
            MapFileDecompressionFailure => "map_file_decompression_failure",
            MapFileNotJson(_) => "map_file_not_json",
            MapFileChunkCountIncorrect(_) => "map_file_chunk_count_incorrect",
            MapFileChunkFileUriInvalid => "map_file_chunk_file_uri_invalid",
            MapFileExceededMaxOperationCount { .. } => "map_file_exceeded_max_operation_count",
            ChunkFileDecompressionFailure => "chunk_file_decompression_failure",
            ChunkFileNotJson(_) => "chunk_file_not_json",
            ChunkFileDeltaCountIncorrect { .. } => "chunk_file_delta_count_incorrect",
            DuplicateOperationForDid(_) => "duplicate_operation_for_did",
            CasFileNotFound(_) => "cas_file_not_found",
            CasFileNotAFile(_) => "cas_file_not_a_file",
            CasFileHashInvalid(_) => "cas_file_hash_invalid",
            CasNotReachable(_) => "cas_not_reachable",
            TransactionFeePaidBelowRequired { .. } => "transaction_fee_paid_below_required",
            ValueTimeLockVerificationFailed(_) => "value_time_lock_verification_failed",
            OperationStoreFailure(_) => "operation_store_failure",
            TransactionStoreFailure(_) => "transaction_store_failure",
            UnknownOperationType => "unknown_operation_type",
            OperationProcessorCreateOperationHasNoRevealValue => {
                "operation_processor_create_operation_has_no_reveal_value"
            }
            NoProcessorForTransactionTime(_) => "no_processor_for_transaction_time",
        }
    }

    /// Whether this error marks a transaction as permanently non-applicable.
    ///
    /// Permanent (protocol) violations make `process_transaction` return
    /// `true` so the transaction is never retried; everything else is
    /// treated as transient.
    pub fn is_permanent(&self) -> bool {
        use SidetreeError::*;
        !matches!(
            self,
            CasNotReachable(_)
                | CasFileNotFound(_)
                | OperationStoreFailure(_)
                | TransactionStoreFailure(_)
        )
    }
}
