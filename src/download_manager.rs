// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Bounded concurrent CAS download pool.
//!
//! Transaction processing may fan out across many transactions at once;
//! this wrapper caps how many CAS reads are in flight so a burst of
//! anchored batches cannot overwhelm the store.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::cas::{CasClient, FetchResult};

/// Serialises access to a [`CasClient`] through a fixed-size permit pool.
pub struct DownloadManager {
    cas: Arc<dyn CasClient>,
    permits: Arc<Semaphore>,
}

impl DownloadManager {
    pub fn new(cas: Arc<dyn CasClient>, max_concurrent_downloads: usize) -> Self {
        Self {
            cas,
            permits: Arc::new(Semaphore::new(max_concurrent_downloads.max(1))),
        }
    }

    /// Download `uri`, waiting for a permit if the pool is saturated.
    pub async fn download(&self, uri: &str, max_size_bytes: usize) -> FetchResult {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("download semaphore is never closed");
        debug!(%uri, "download permit acquired");
        self.cas.read(uri, max_size_bytes).await
    }
}
