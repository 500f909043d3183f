// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};

use super::compression::{self, DecompressionError};
use super::SignedOperationReference;
use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash;

/// Reference to the chunk file holding this batch's deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct MapFileChunkReference {
    pub chunk_file_uri: String,
}

/// Update operation references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapFileOperations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<SignedOperationReference>,
}

/// On-wire map file document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapFileModel {
    pub chunks: Vec<MapFileChunkReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<MapFileOperations>,
}

/// A parsed and validated map file.
#[derive(Debug, Clone)]
pub struct MapFile {
    pub model: MapFileModel,
}

impl MapFile {
    /// Parse a compressed map file and enforce the cross-file invariants:
    /// the combined anchor+map operation count stays within the protocol
    /// maximum, and no DID in the anchor file appears again here.
    pub fn parse(
        compressed: &[u8],
        params: &ProtocolParameters,
        anchor_file_did_suffixes: &[String],
        anchor_file_operation_count: u64,
    ) -> SidetreeResult<Self> {
        if compressed.len() > params.max_map_file_size_bytes {
            return Err(SidetreeError::FileExceedsMaximumSize {
                size: compressed.len(),
                max_size: params.max_map_file_size_bytes,
            });
        }
        let max_decompressed =
            params.max_map_file_size_bytes * params.max_decompression_multiplier;
        let bytes = compression::decompress(compressed, max_decompressed).map_err(|e| match e {
            DecompressionError::Malformed => SidetreeError::MapFileDecompressionFailure,
            DecompressionError::TooLarge { max_size } => {
                SidetreeError::FileExceedsMaximumSize { size: max_decompressed + 1, max_size }
            }
        })?;

        let model: MapFileModel = serde_json::from_slice(&bytes)
            .map_err(|e| SidetreeError::MapFileNotJson(e.to_string()))?;

        if model.chunks.len() != 1 {
            return Err(SidetreeError::MapFileChunkCountIncorrect(model.chunks.len()));
        }
        if !multihash::is_valid_encoded_multihash(&model.chunks[0].chunk_file_uri) {
            return Err(SidetreeError::MapFileChunkFileUriInvalid);
        }

        let updates = model
            .operations
            .as_ref()
            .map(|ops| ops.update.as_slice())
            .unwrap_or_default();

        let total = anchor_file_operation_count + updates.len() as u64;
        if total > params.max_operations_per_batch {
            return Err(SidetreeError::MapFileExceededMaxOperationCount {
                got: total,
                max: params.max_operations_per_batch,
            });
        }

        let mut seen: std::collections::HashSet<&str> =
            anchor_file_did_suffixes.iter().map(String::as_str).collect();
        for update in updates {
            if !multihash::is_valid_encoded_multihash(&update.did_suffix) {
                return Err(SidetreeError::OperationDidSuffixMissingOrInvalid);
            }
            if !multihash::is_valid_encoded_multihash(&update.reveal_value) {
                return Err(SidetreeError::OperationRevealValueMissingOrInvalid);
            }
            if !seen.insert(update.did_suffix.as_str()) {
                return Err(SidetreeError::DuplicateOperationForDid(
                    update.did_suffix.clone(),
                ));
            }
        }

        Ok(Self { model })
    }

    /// Serialize and compress a map file for writing to the CAS.
    pub fn create_buffer(
        chunk_file_uri: String,
        updates: Vec<SignedOperationReference>,
    ) -> SidetreeResult<Vec<u8>> {
        let model = MapFileModel {
            chunks: vec![MapFileChunkReference { chunk_file_uri }],
            operations: if updates.is_empty() {
                None
            } else {
                Some(MapFileOperations { update: updates })
            },
        };
        let canonical = crate::canonicalizer::canonicalize(&model)?;
        Ok(compression::compress(&canonical))
    }

    /// Update references carried by this file.
    pub fn updates(&self) -> &[SignedOperationReference] {
        self.model
            .operations
            .as_ref()
            .map(|ops| ops.update.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multihash::HashAlgorithm;

    fn chunk_uri() -> String {
        multihash::hash_then_encode(b"chunk", HashAlgorithm::Sha256)
    }

    fn update_reference(seed: &[u8]) -> SignedOperationReference {
        SignedOperationReference {
            did_suffix: multihash::hash_then_encode(seed, HashAlgorithm::Sha256),
            reveal_value: multihash::hash_then_encode(&[seed, b"-rv"].concat(), HashAlgorithm::Sha256),
            signed_data: "h.p.s".to_string(),
        }
    }

    #[test]
    fn round_trip_with_updates() {
        let params = ProtocolParameters::default();
        let buffer =
            MapFile::create_buffer(chunk_uri(), vec![update_reference(b"u1")]).unwrap();
        let parsed = MapFile::parse(&buffer, &params, &[], 0).unwrap();
        assert_eq!(parsed.updates().len(), 1);
        assert_eq!(parsed.model.chunks[0].chunk_file_uri, chunk_uri());
    }

    #[test]
    fn empty_update_set_omits_operations_property() {
        let params = ProtocolParameters::default();
        let buffer = MapFile::create_buffer(chunk_uri(), vec![]).unwrap();
        let parsed = MapFile::parse(&buffer, &params, &[], 0).unwrap();
        assert!(parsed.model.operations.is_none());
        assert!(parsed.updates().is_empty());
    }

    #[test]
    fn did_present_in_anchor_file_is_rejected() {
        let params = ProtocolParameters::default();
        let update = update_reference(b"dup");
        let anchor_suffixes = vec![update.did_suffix.clone()];
        let buffer = MapFile::create_buffer(chunk_uri(), vec![update]).unwrap();
        let err = MapFile::parse(&buffer, &params, &anchor_suffixes, 1).unwrap_err();
        assert_eq!(err.code(), "duplicate_operation_for_did");
    }

    #[test]
    fn combined_count_above_protocol_maximum_is_rejected() {
        let mut params = ProtocolParameters::default();
        params.max_operations_per_batch = 3;
        let buffer = MapFile::create_buffer(
            chunk_uri(),
            vec![update_reference(b"u1"), update_reference(b"u2")],
        )
        .unwrap();
        let err = MapFile::parse(&buffer, &params, &[], 2).unwrap_err();
        assert_eq!(err.code(), "map_file_exceeded_max_operation_count");
    }

    #[test]
    fn uncompressed_input_is_rejected() {
        let params = ProtocolParameters::default();
        let err = MapFile::parse(br#"{"chunks":[]}"#, &params, &[], 0).unwrap_err();
        assert_eq!(err.code(), "map_file_decompression_failure");
    }

    #[test]
    fn exactly_one_chunk_reference_is_required() {
        let params = ProtocolParameters::default();
        let model = MapFileModel { chunks: vec![], operations: None };
        let compressed = compression::compress(&serde_json::to_vec(&model).unwrap());
        let err = MapFile::parse(&compressed, &params, &[], 0).unwrap_err();
        assert_eq!(err.code(), "map_file_chunk_count_incorrect");
    }
}
