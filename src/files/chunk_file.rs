// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::compression::{self, DecompressionError};
use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};

/// On-wire chunk file document: one delta per create, recover and update in
/// the batch, concatenated in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkFileModel {
    pub deltas: Vec<Value>,
}

/// A parsed and validated chunk file.
#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub model: ChunkFileModel,
}

impl ChunkFile {
    /// Parse a compressed chunk file. `expected_delta_count` is the number
    /// of delta-bearing operations in the anchor and map files combined.
    pub fn parse(
        compressed: &[u8],
        params: &ProtocolParameters,
        expected_delta_count: usize,
    ) -> SidetreeResult<Self> {
        if compressed.len() > params.max_chunk_file_size_bytes {
            return Err(SidetreeError::FileExceedsMaximumSize {
                size: compressed.len(),
                max_size: params.max_chunk_file_size_bytes,
            });
        }
        let max_decompressed =
            params.max_chunk_file_size_bytes * params.max_decompression_multiplier;
        let bytes = compression::decompress(compressed, max_decompressed).map_err(|e| match e {
            DecompressionError::Malformed => SidetreeError::ChunkFileDecompressionFailure,
            DecompressionError::TooLarge { max_size } => {
                SidetreeError::FileExceedsMaximumSize { size: max_decompressed + 1, max_size }
            }
        })?;

        let model: ChunkFileModel = serde_json::from_slice(&bytes)
            .map_err(|e| SidetreeError::ChunkFileNotJson(e.to_string()))?;

        if model.deltas.len() != expected_delta_count {
            return Err(SidetreeError::ChunkFileDeltaCountIncorrect {
                got: model.deltas.len(),
                expected: expected_delta_count,
            });
        }
        for delta in &model.deltas {
            if !delta.is_object() {
                return Err(SidetreeError::DeltaNotJsonObject);
            }
            let size = crate::canonicalizer::canonicalize(delta)?.len();
            if size > params.max_delta_size_bytes {
                return Err(SidetreeError::DeltaExceedsMaximumSize {
                    size,
                    max_size: params.max_delta_size_bytes,
                });
            }
        }

        Ok(Self { model })
    }

    /// Serialize and compress a chunk file for writing to the CAS.
    pub fn create_buffer(deltas: Vec<Value>) -> SidetreeResult<Vec<u8>> {
        let model = ChunkFileModel { deltas };
        let canonical = crate::canonicalizer::canonicalize(&model)?;
        Ok(compression::compress(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delta(seed: u32) -> Value {
        json!({
            "patches": [],
            "updateCommitment": crate::multihash::hash_then_encode(
                &seed.to_be_bytes(),
                crate::multihash::HashAlgorithm::Sha256,
            ),
        })
    }

    #[test]
    fn round_trip() {
        let params = ProtocolParameters::default();
        let buffer = ChunkFile::create_buffer(vec![delta(1), delta(2)]).unwrap();
        let parsed = ChunkFile::parse(&buffer, &params, 2).unwrap();
        assert_eq!(parsed.model.deltas.len(), 2);
    }

    #[test]
    fn delta_count_mismatch_is_rejected() {
        let params = ProtocolParameters::default();
        let buffer = ChunkFile::create_buffer(vec![delta(1)]).unwrap();
        let err = ChunkFile::parse(&buffer, &params, 3).unwrap_err();
        assert_eq!(err.code(), "chunk_file_delta_count_incorrect");
    }

    #[test]
    fn non_object_delta_is_rejected() {
        let params = ProtocolParameters::default();
        let buffer = ChunkFile::create_buffer(vec![json!("just a string")]).unwrap();
        let err = ChunkFile::parse(&buffer, &params, 1).unwrap_err();
        assert_eq!(err.code(), "delta_not_json_object");
    }

    #[test]
    fn oversize_delta_is_rejected() {
        let mut params = ProtocolParameters::default();
        params.max_delta_size_bytes = 32;
        let buffer = ChunkFile::create_buffer(vec![delta(1)]).unwrap();
        let err = ChunkFile::parse(&buffer, &params, 1).unwrap_err();
        assert_eq!(err.code(), "delta_exceeds_maximum_size");
    }

    #[test]
    fn uncompressed_input_is_rejected() {
        let params = ProtocolParameters::default();
        let err = ChunkFile::parse(br#"{"deltas":[]}"#, &params, 0).unwrap_err();
        assert_eq!(err.code(), "chunk_file_decompression_failure");
    }
}
