// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};

use super::compression::{self, DecompressionError};
use super::SignedOperationReference;
use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash::{self, HashAlgorithm};
use crate::operations::SuffixData;

/// Reference to a create operation: the suffix data is the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct CreateReference {
    pub suffix_data: SuffixData,
}

/// Operation references grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnchorFileOperations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create: Vec<CreateReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recover: Vec<SignedOperationReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deactivate: Vec<SignedOperationReference>,
}

/// On-wire anchor file document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct AnchorFileModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_lock_id: Option<String>,
    pub map_file_uri: String,
    pub operations: AnchorFileOperations,
}

/// A parsed and validated anchor file.
#[derive(Debug, Clone)]
pub struct AnchorFile {
    pub model: AnchorFileModel,
    /// DID suffixes of every operation in the file, creates first (derived
    /// from their suffix data), then recovers, then deactivates.
    pub did_unique_suffixes: Vec<String>,
}

impl AnchorFile {
    /// Parse a compressed anchor file and enforce its own invariants:
    /// operation count limits (protocol maximum and the transaction's paid
    /// count) and at most one operation per DID within the file.
    pub fn parse(
        compressed: &[u8],
        params: &ProtocolParameters,
        paid_operation_count: u64,
    ) -> SidetreeResult<Self> {
        if compressed.len() > params.max_anchor_file_size_bytes {
            return Err(SidetreeError::FileExceedsMaximumSize {
                size: compressed.len(),
                max_size: params.max_anchor_file_size_bytes,
            });
        }
        let max_decompressed =
            params.max_anchor_file_size_bytes * params.max_decompression_multiplier;
        let bytes = compression::decompress(compressed, max_decompressed).map_err(|e| match e {
            DecompressionError::Malformed => SidetreeError::AnchorFileDecompressionFailure,
            DecompressionError::TooLarge { max_size } => {
                SidetreeError::FileExceedsMaximumSize { size: max_decompressed + 1, max_size }
            }
        })?;

        let model: AnchorFileModel = serde_json::from_slice(&bytes)
            .map_err(|e| SidetreeError::AnchorFileNotJson(e.to_string()))?;

        if !multihash::is_valid_encoded_multihash(&model.map_file_uri) {
            return Err(SidetreeError::AnchorFileMapFileUriInvalid);
        }

        let operation_count = (model.operations.create.len()
            + model.operations.recover.len()
            + model.operations.deactivate.len()) as u64;
        if operation_count > params.max_operations_per_batch {
            return Err(SidetreeError::AnchorFileExceededMaxOperationCount {
                got: operation_count,
                max: params.max_operations_per_batch,
            });
        }
        if operation_count > paid_operation_count {
            return Err(SidetreeError::AnchorFileOperationCountExceededPaidLimit {
                got: operation_count,
                paid: paid_operation_count,
            });
        }

        let mut did_unique_suffixes =
            Vec::with_capacity(operation_count as usize);
        for create in &model.operations.create {
            if !multihash::is_valid_encoded_multihash(&create.suffix_data.recovery_commitment) {
                return Err(SidetreeError::CreateOperationRecoveryCommitmentInvalid);
            }
            if !multihash::is_valid_encoded_multihash(&create.suffix_data.delta_hash) {
                return Err(SidetreeError::CreateOperationDeltaHashInvalid);
            }
            did_unique_suffixes.push(multihash::canonicalize_then_hash_then_encode(
                &create.suffix_data,
                HashAlgorithm::Sha256,
            )?);
        }
        for reference in model
            .operations
            .recover
            .iter()
            .chain(model.operations.deactivate.iter())
        {
            validate_signed_reference(reference)?;
            did_unique_suffixes.push(reference.did_suffix.clone());
        }

        // At most one operation per DID within a single transaction.
        let mut seen = std::collections::HashSet::new();
        for suffix in &did_unique_suffixes {
            if !seen.insert(suffix.as_str()) {
                return Err(SidetreeError::DuplicateOperationForDid(suffix.clone()));
            }
        }

        Ok(Self { model, did_unique_suffixes })
    }

    /// Serialize and compress an anchor file for writing to the CAS.
    pub fn create_buffer(
        writer_lock_id: Option<String>,
        map_file_uri: String,
        create: Vec<CreateReference>,
        recover: Vec<SignedOperationReference>,
        deactivate: Vec<SignedOperationReference>,
    ) -> SidetreeResult<Vec<u8>> {
        let model = AnchorFileModel {
            writer_lock_id,
            map_file_uri,
            operations: AnchorFileOperations { create, recover, deactivate },
        };
        let canonical = crate::canonicalizer::canonicalize(&model)?;
        Ok(compression::compress(&canonical))
    }
}

fn validate_signed_reference(reference: &SignedOperationReference) -> SidetreeResult<()> {
    if !multihash::is_valid_encoded_multihash(&reference.did_suffix) {
        return Err(SidetreeError::OperationDidSuffixMissingOrInvalid);
    }
    if !multihash::is_valid_encoded_multihash(&reference.reveal_value) {
        return Err(SidetreeError::OperationRevealValueMissingOrInvalid);
    }
    if reference.signed_data.is_empty() {
        return Err(SidetreeError::OperationSignedDataMissingOrMalformed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix_data(seed: &[u8]) -> SuffixData {
        SuffixData {
            delta_hash: multihash::hash_then_encode(seed, HashAlgorithm::Sha256),
            recovery_commitment: multihash::hash_then_encode(
                &[seed, b"-rc"].concat(),
                HashAlgorithm::Sha256,
            ),
        }
    }

    fn signed_reference(seed: &[u8]) -> SignedOperationReference {
        SignedOperationReference {
            did_suffix: multihash::hash_then_encode(seed, HashAlgorithm::Sha256),
            reveal_value: multihash::hash_then_encode(&[seed, b"-rv"].concat(), HashAlgorithm::Sha256),
            signed_data: "header.payload.signature".to_string(),
        }
    }

    fn map_uri() -> String {
        multihash::hash_then_encode(b"map", HashAlgorithm::Sha256)
    }

    #[test]
    fn round_trip_preserves_operations() {
        let params = ProtocolParameters::default();
        let buffer = AnchorFile::create_buffer(
            Some("lock-1".into()),
            map_uri(),
            vec![CreateReference { suffix_data: suffix_data(b"c1") }],
            vec![signed_reference(b"r1")],
            vec![signed_reference(b"d1")],
        )
        .unwrap();
        let parsed = AnchorFile::parse(&buffer, &params, 10).unwrap();
        assert_eq!(parsed.model.writer_lock_id.as_deref(), Some("lock-1"));
        assert_eq!(parsed.model.operations.create.len(), 1);
        assert_eq!(parsed.did_unique_suffixes.len(), 3);
    }

    #[test]
    fn uncompressed_input_is_rejected() {
        let params = ProtocolParameters::default();
        let err = AnchorFile::parse(br#"{"mapFileUri":"x","operations":{}}"#, &params, 10)
            .unwrap_err();
        assert_eq!(err.code(), "anchor_file_decompression_failure");
    }

    #[test]
    fn operation_count_above_paid_limit_is_rejected() {
        let params = ProtocolParameters::default();
        let buffer = AnchorFile::create_buffer(
            None,
            map_uri(),
            vec![
                CreateReference { suffix_data: suffix_data(b"c1") },
                CreateReference { suffix_data: suffix_data(b"c2") },
                CreateReference { suffix_data: suffix_data(b"c3") },
            ],
            vec![],
            vec![],
        )
        .unwrap();
        let err = AnchorFile::parse(&buffer, &params, 2).unwrap_err();
        assert_eq!(err.code(), "anchor_file_operation_count_exceeded_paid_limit");
    }

    #[test]
    fn duplicate_suffix_within_file_is_rejected() {
        let params = ProtocolParameters::default();
        let reference = signed_reference(b"same");
        let buffer = AnchorFile::create_buffer(
            None,
            map_uri(),
            vec![],
            vec![reference.clone()],
            vec![reference],
        )
        .unwrap();
        let err = AnchorFile::parse(&buffer, &params, 10).unwrap_err();
        assert_eq!(err.code(), "duplicate_operation_for_did");
    }

    #[test]
    fn invalid_map_uri_is_rejected() {
        let params = ProtocolParameters::default();
        let model = AnchorFileModel {
            writer_lock_id: None,
            map_file_uri: "definitely not a multihash".into(),
            operations: AnchorFileOperations::default(),
        };
        let compressed =
            compression::compress(&serde_json::to_vec(&model).unwrap());
        let err = AnchorFile::parse(&compressed, &params, 10).unwrap_err();
        assert_eq!(err.code(), "anchor_file_map_file_uri_invalid");
    }

    #[test]
    fn unknown_properties_are_rejected() {
        let params = ProtocolParameters::default();
        let json = format!(
            r#"{{"mapFileUri":"{}","operations":{{}},"extra":true}}"#,
            map_uri()
        );
        let compressed = compression::compress(json.as_bytes());
        let err = AnchorFile::parse(&compressed, &params, 10).unwrap_err();
        assert_eq!(err.code(), "anchor_file_not_json");
    }
}
