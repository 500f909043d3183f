// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! DID document state and the patch actions that mutate it.

mod patch;

pub use patch::{apply_patches, DidStatePatch};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jwk::PublicKeyJwk;

/// A verification method entry in the DID document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub public_key_jwk: PublicKeyJwk,
    /// Verification relationships, e.g. `authentication`, `assertionMethod`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purposes: Vec<String>,
}

/// A service entry in the DID document. The endpoint may be a URL string or
/// a richer object; the protocol does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpointEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: Value,
}

/// The replaceable PKI state of a DID document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<PublicKeyEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceEndpointEntry>,
}

impl DocumentState {
    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty() && self.services.is_empty()
    }
}
