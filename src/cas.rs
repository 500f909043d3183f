// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Content-addressed storage client seam.
//!
//! Reads return a [`FetchResult`] rather than failing: most non-success
//! outcomes are ordinary protocol situations the transaction processor has
//! to classify, and only genuine unreachability is allowed to trigger a
//! retry. An IPFS-gateway-backed implementation and an in-memory mock are
//! provided.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash;

/// Outcome classification for a CAS read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResultCode {
    Success,
    InvalidHash,
    MaxSizeExceeded,
    NotAFile,
    NotFound,
    CasNotReachable,
}

/// Result of a CAS read: a code, plus content when successful.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub code: FetchResultCode,
    pub content: Option<Vec<u8>>,
}

impl FetchResult {
    pub fn success(content: Vec<u8>) -> Self {
        Self { code: FetchResultCode::Success, content: Some(content) }
    }

    pub fn failure(code: FetchResultCode) -> Self {
        Self { code, content: None }
    }
}

/// A content-addressed store.
#[async_trait]
pub trait CasClient: Send + Sync {
    /// Write content, returning its address.
    async fn write(&self, content: &[u8]) -> SidetreeResult<String>;

    /// Read the content at `uri`, rejecting anything larger than
    /// `max_size_bytes` before it is buffered whole.
    async fn read(&self, uri: &str, max_size_bytes: usize) -> FetchResult;
}

/// CAS client backed by an IPFS HTTP API.
pub struct HttpCasClient {
    api_endpoint: String,
    client: reqwest::Client,
}

impl HttpCasClient {
    pub fn new(api_endpoint: String) -> Self {
        Self { api_endpoint, client: reqwest::Client::new() }
    }

    /// Whether the node answers its version endpoint.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/v0/version", self.api_endpoint);
        match self.client.post(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl CasClient for HttpCasClient {
    async fn write(&self, content: &[u8]) -> SidetreeResult<String> {
        let url = format!("{}/api/v0/add", self.api_endpoint);
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(content.to_vec()));

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SidetreeError::CasNotReachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SidetreeError::CasNotReachable(format!(
                "CAS API returned status {}",
                response.status()
            )));
        }

        #[derive(serde::Deserialize)]
        struct AddResponse {
            #[serde(rename = "Hash")]
            hash: String,
        }

        let add_response: AddResponse = response
            .json()
            .await
            .map_err(|e| SidetreeError::CasNotReachable(e.to_string()))?;
        Ok(add_response.hash)
    }

    async fn read(&self, uri: &str, max_size_bytes: usize) -> FetchResult {
        if !multihash::is_valid_encoded_multihash(uri) {
            return FetchResult::failure(FetchResultCode::InvalidHash);
        }

        let url = format!("{}/api/v0/cat?arg={uri}", self.api_endpoint);
        let response = match self.client.post(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(%uri, %error, "CAS read failed to connect");
                return FetchResult::failure(FetchResultCode::CasNotReachable);
            }
        };

        match response.status().as_u16() {
            200 => {}
            404 => return FetchResult::failure(FetchResultCode::NotFound),
            // The IPFS API answers 500 with a typed body when the path is a
            // directory; anything else is treated as unreachable.
            500 => return FetchResult::failure(FetchResultCode::NotAFile),
            status => {
                warn!(%uri, status, "unexpected CAS response status");
                return FetchResult::failure(FetchResultCode::CasNotReachable);
            }
        }

        if let Some(length) = response.content_length() {
            if length as usize > max_size_bytes {
                return FetchResult::failure(FetchResultCode::MaxSizeExceeded);
            }
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(%uri, %error, "CAS read failed mid-body");
                return FetchResult::failure(FetchResultCode::CasNotReachable);
            }
        };
        if bytes.len() > max_size_bytes {
            return FetchResult::failure(FetchResultCode::MaxSizeExceeded);
        }

        debug!(%uri, size = bytes.len(), "CAS read complete");
        FetchResult::success(bytes.to_vec())
    }
}

/// In-memory CAS for tests and local tooling. Content is addressed by its
/// multihash, so hash validation behaves exactly like a real store.
#[derive(Default)]
pub struct MockCas {
    content: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// When set, every read returns this code instead of looking content up.
    forced_failure: Arc<RwLock<Option<FetchResultCode>>>,
}

impl MockCas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every subsequent read to return `code`.
    pub async fn fail_reads_with(&self, code: FetchResultCode) {
        *self.forced_failure.write().await = Some(code);
    }

    /// Restore normal behaviour after [`MockCas::fail_reads_with`].
    pub async fn clear_forced_failure(&self) {
        *self.forced_failure.write().await = None;
    }
}

#[async_trait]
impl CasClient for MockCas {
    async fn write(&self, content: &[u8]) -> SidetreeResult<String> {
        let uri = multihash::hash_then_encode(content, crate::multihash::HashAlgorithm::Sha256);
        self.content.write().await.insert(uri.clone(), content.to_vec());
        Ok(uri)
    }

    async fn read(&self, uri: &str, max_size_bytes: usize) -> FetchResult {
        if let Some(code) = *self.forced_failure.read().await {
            return FetchResult::failure(code);
        }
        if !multihash::is_valid_encoded_multihash(uri) {
            return FetchResult::failure(FetchResultCode::InvalidHash);
        }
        match self.content.read().await.get(uri) {
            Some(content) if content.len() > max_size_bytes => {
                FetchResult::failure(FetchResultCode::MaxSizeExceeded)
            }
            Some(content) => FetchResult::success(content.clone()),
            None => FetchResult::failure(FetchResultCode::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_cas_round_trip() {
        let cas = MockCas::new();
        let uri = cas.write(b"content").await.unwrap();
        let result = cas.read(&uri, 1024).await;
        assert_eq!(result.code, FetchResultCode::Success);
        assert_eq!(result.content.unwrap(), b"content");
    }

    #[tokio::test]
    async fn mock_cas_enforces_size_cap() {
        let cas = MockCas::new();
        let uri = cas.write(&[0u8; 100]).await.unwrap();
        assert_eq!(cas.read(&uri, 99).await.code, FetchResultCode::MaxSizeExceeded);
    }

    #[tokio::test]
    async fn mock_cas_classifies_misses() {
        let cas = MockCas::new();
        assert_eq!(cas.read("not a multihash", 10).await.code, FetchResultCode::InvalidHash);
        let absent = multihash::hash_then_encode(b"absent", crate::multihash::HashAlgorithm::Sha256);
        assert_eq!(cas.read(&absent, 10).await.code, FetchResultCode::NotFound);
    }

    #[tokio::test]
    async fn forced_failure_overrides_reads() {
        let cas = MockCas::new();
        let uri = cas.write(b"x").await.unwrap();
        cas.fail_reads_with(FetchResultCode::CasNotReachable).await;
        assert_eq!(cas.read(&uri, 10).await.code, FetchResultCode::CasNotReachable);
        cas.clear_forced_failure().await;
        assert_eq!(cas.read(&uri, 10).await.code, FetchResultCode::Success);
    }
}
