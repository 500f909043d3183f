// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Operation and transaction store seams, with in-memory implementations.
//!
//! Production deployments back these traits with a database; the in-memory
//! versions serve tests, tooling, and small single-node setups. The
//! operation store is idempotent on `(did, transaction_number,
//! operation_index)` so that a cancelled-and-retried transaction can be
//! re-persisted without duplicating operations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::blockchain::TransactionModel;
use crate::error::SidetreeResult;
use crate::operations::AnchoredOperation;

/// Append-only store of anchored operations, keyed by DID unique suffix.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Insert a batch of operations. Idempotent on
    /// `(did_unique_suffix, transaction_number, operation_index)`.
    async fn put(&self, operations: Vec<AnchoredOperation>) -> SidetreeResult<()>;

    /// All operations stored for a DID, in no particular order.
    async fn get(&self, did_unique_suffix: &str) -> SidetreeResult<Vec<AnchoredOperation>>;

    /// Remove every stored operation. Used on ledger reorganisation.
    async fn delete(&self) -> SidetreeResult<()>;

    /// Release any underlying connections. The in-memory store has nothing
    /// to release; database-backed implementations override this.
    async fn close(&self) -> SidetreeResult<()> {
        Ok(())
    }
}

/// Store of observed ledger transactions.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn add_transaction(&self, transaction: TransactionModel) -> SidetreeResult<()>;

    async fn get_transaction(
        &self,
        transaction_number: u64,
    ) -> SidetreeResult<Option<TransactionModel>>;

    /// Transactions strictly after the given number, oldest first, at most
    /// `limit` of them.
    async fn get_transactions_later_than(
        &self,
        since_transaction_number: Option<u64>,
        limit: Option<usize>,
    ) -> SidetreeResult<Vec<TransactionModel>>;

    /// Transactions with `transaction_time` in `[begin, end)`.
    async fn get_transactions_starting_from(
        &self,
        inclusive_begin_transaction_time: u64,
        exclusive_end_transaction_time: u64,
    ) -> SidetreeResult<Vec<TransactionModel>>;

    /// Transactions at exponentially growing distances from the most recent
    /// one (last, last-1, last-2, last-4, and so on), newest first. The observer
    /// walks this sequence to find the fork point after a reorganisation
    /// without scanning the whole history.
    async fn get_exponentially_spaced_transactions(
        &self,
    ) -> SidetreeResult<Vec<TransactionModel>>;
}

/// In-memory [`OperationStore`].
#[derive(Default)]
pub struct InMemoryOperationStore {
    operations: Arc<RwLock<HashMap<String, Vec<AnchoredOperation>>>>,
}

impl InMemoryOperationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OperationStore for InMemoryOperationStore {
    async fn put(&self, operations: Vec<AnchoredOperation>) -> SidetreeResult<()> {
        let mut map = self.operations.write().await;
        for operation in operations {
            let entry = map.entry(operation.did_unique_suffix.clone()).or_default();
            let duplicate = entry.iter().any(|existing| {
                existing.transaction_number == operation.transaction_number
                    && existing.operation_index == operation.operation_index
            });
            if !duplicate {
                entry.push(operation);
            }
        }
        Ok(())
    }

    async fn get(&self, did_unique_suffix: &str) -> SidetreeResult<Vec<AnchoredOperation>> {
        let map = self.operations.read().await;
        Ok(map.get(did_unique_suffix).cloned().unwrap_or_default())
    }

    async fn delete(&self) -> SidetreeResult<()> {
        self.operations.write().await.clear();
        Ok(())
    }
}

/// In-memory [`TransactionStore`], kept sorted by transaction number.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<Vec<TransactionModel>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn add_transaction(&self, transaction: TransactionModel) -> SidetreeResult<()> {
        let mut transactions = self.transactions.write().await;
        match transactions
            .binary_search_by_key(&transaction.transaction_number, |t| t.transaction_number)
        {
            Ok(_) => {} // already recorded
            Err(position) => transactions.insert(position, transaction),
        }
        Ok(())
    }

    async fn get_transaction(
        &self,
        transaction_number: u64,
    ) -> SidetreeResult<Option<TransactionModel>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .find(|t| t.transaction_number == transaction_number)
            .cloned())
    }

    async fn get_transactions_later_than(
        &self,
        since_transaction_number: Option<u64>,
        limit: Option<usize>,
    ) -> SidetreeResult<Vec<TransactionModel>> {
        let transactions = self.transactions.read().await;
        let result: Vec<TransactionModel> = transactions
            .iter()
            .filter(|t| match since_transaction_number {
                Some(since) => t.transaction_number > since,
                None => true,
            })
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(result)
    }

    async fn get_transactions_starting_from(
        &self,
        inclusive_begin_transaction_time: u64,
        exclusive_end_transaction_time: u64,
    ) -> SidetreeResult<Vec<TransactionModel>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|t| {
                t.transaction_time >= inclusive_begin_transaction_time
                    && t.transaction_time < exclusive_end_transaction_time
            })
            .cloned()
            .collect())
    }

    async fn get_exponentially_spaced_transactions(
        &self,
    ) -> SidetreeResult<Vec<TransactionModel>> {
        let transactions = self.transactions.read().await;
        let mut result = Vec::new();
        if transactions.is_empty() {
            return Ok(result);
        }
        let last = transactions.len() - 1;
        let mut distance = 0usize;
        loop {
            let index = last.saturating_sub(distance);
            result.push(transactions[index].clone());
            if index == 0 {
                break;
            }
            distance = if distance == 0 { 1 } else { distance * 2 };
        }
        Ok(result)
    }
}
