// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! The three-tier CAS file bundle behind every ledger anchor.
//!
//! One ledger write points at an anchor file; the anchor file points at a
//! map file; the map file points at a chunk file. Creates, recovers and
//! deactivates (with their signatures) live in the anchor file, updates in
//! the map file, and every operation's delta in the chunk file, in
//! creates-recovers-updates order.

mod anchor_file;
mod chunk_file;
pub(crate) mod compression;
mod map_file;

pub use anchor_file::{AnchorFile, AnchorFileModel, AnchorFileOperations, CreateReference};
pub use chunk_file::{ChunkFile, ChunkFileModel};
pub use map_file::{MapFile, MapFileChunkReference, MapFileModel, MapFileOperations};

use serde::{Deserialize, Serialize};

/// Reference to a signed non-create operation, as embedded in the anchor
/// file (recover, deactivate) or map file (update). The delta, when the
/// kind has one, travels separately in the chunk file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct SignedOperationReference {
    pub did_suffix: String,
    pub reveal_value: String,
    pub signed_data: String,
}
