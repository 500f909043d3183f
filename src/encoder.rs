// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Data encoding scheme: base64url without padding.
//!
//! Every hash, URI, and encoded JSON body that crosses the wire uses this
//! encoding. Decoding treats all input as untrusted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::{SidetreeError, SidetreeResult};

/// Encode bytes as a base64url string without padding.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url-without-padding string.
pub fn decode(encoded: &str) -> SidetreeResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| SidetreeError::EncoderNotBase64UrlString)
}

/// Decode a string that is expected to be an encoded JSON document.
pub fn decode_as_json(encoded: &str) -> SidetreeResult<serde_json::Value> {
    let bytes = decode(encoded)?;
    serde_json::from_slice(&bytes).map_err(|_| SidetreeError::EncoderNotBase64UrlString)
}
