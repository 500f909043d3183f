// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};

use crate::multihash::HashAlgorithm;

/// Protocol parameters governing one version of the protocol.
///
/// The defaults mirror the reference deployment; operators embed a modified
/// set when running a network with different limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolParameters {
    /// Hash algorithms accepted when matching reveal values to commitments.
    /// New algorithms are appended here on protocol upgrades; legacy
    /// operations stay resolvable because the resolver tries every entry.
    pub hash_algorithms: Vec<HashAlgorithm>,

    /// Maximum number of operations a single batch may anchor.
    pub max_operations_per_batch: u64,

    /// Maximum number of operations considered for a single DID during
    /// resolution. Hard cap against adversarial store contents.
    pub max_operations_per_did: usize,

    /// Maximum compressed size of an anchor file in bytes.
    pub max_anchor_file_size_bytes: usize,

    /// Maximum compressed size of a map file in bytes.
    pub max_map_file_size_bytes: usize,

    /// Maximum compressed size of a chunk file in bytes.
    pub max_chunk_file_size_bytes: usize,

    /// Maximum size of a single operation delta in canonical JSON bytes.
    pub max_delta_size_bytes: usize,

    /// Decompressed output is capped at this multiple of the compressed
    /// input to bound decompression-bomb exposure.
    pub max_decompression_multiplier: usize,

    /// Maximum number of concurrent CAS downloads.
    pub max_concurrent_downloads: usize,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            hash_algorithms: vec![HashAlgorithm::Sha256],
            max_operations_per_batch: 10_000,
            max_operations_per_did: 10_000,
            max_anchor_file_size_bytes: 1_000_000,
            max_map_file_size_bytes: 1_000_000,
            max_chunk_file_size_bytes: 10_000_000,
            max_delta_size_bytes: 1_000,
            max_decompression_multiplier: 10,
            max_concurrent_downloads: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_are_sane() {
        let params = ProtocolParameters::default();
        assert_eq!(params.hash_algorithms, vec![HashAlgorithm::Sha256]);
        assert!(params.max_operations_per_batch > 0);
        assert!(params.max_chunk_file_size_bytes >= params.max_anchor_file_size_bytes);
        assert!(params.max_concurrent_downloads > 0);
    }
}
