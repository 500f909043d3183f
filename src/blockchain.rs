// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Ledger-facing models and trait seams.
//!
//! The core never talks to a concrete chain: it consumes these traits. Fee
//! schedules and value-time-lock rules are deployment policy, so they are
//! interfaces here with only trivial implementations provided.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SidetreeError, SidetreeResult};

/// One anchoring transaction as observed on the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionModel {
    /// Ledger-wide monotonically increasing transaction ordinal.
    pub transaction_number: u64,
    /// Logical ledger time (e.g. block height) the transaction landed at.
    pub transaction_time: u64,
    /// Hash of the ledger block at `transaction_time`.
    pub transaction_time_hash: String,
    /// The anchor string the writer published.
    pub anchor_string: String,
    /// Fee the writer paid, in the ledger's smallest unit.
    pub transaction_fee_paid: u64,
    /// Fee normalized by the ledger client, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_transaction_fee: Option<u64>,
    /// Identifier of the writer that anchored the transaction.
    pub writer: String,
}

/// A point-in-time reading of the ledger clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockchainTimeModel {
    pub time: u64,
    pub hash: String,
}

/// A value lock a writer holds to gain batch capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueTimeLock {
    pub identifier: String,
    pub amount_locked: u64,
    pub lock_transaction_time: u64,
    pub unlock_transaction_time: u64,
    pub owner: String,
}

/// Result of one paged ledger read.
#[derive(Debug, Clone)]
pub struct BlockchainReadResult {
    pub more_transactions: bool,
    pub transactions: Vec<TransactionModel>,
}

/// Read/write access to the anchoring ledger.
#[async_trait]
pub trait Blockchain: Send + Sync {
    /// Read transactions after the given cursor. Both cursor parts must be
    /// provided together; `None` reads from the beginning.
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        transaction_time_hash: Option<&str>,
    ) -> SidetreeResult<BlockchainReadResult>;

    /// Publish an anchor string, paying the given fee.
    async fn write(&self, anchor_string: &str, fee: u64) -> SidetreeResult<()>;

    /// The ledger's current approximate time.
    async fn approximate_time(&self) -> SidetreeResult<BlockchainTimeModel>;

    /// Look up a value time lock by identifier.
    async fn get_value_time_lock(
        &self,
        identifier: &str,
    ) -> SidetreeResult<Option<ValueTimeLock>>;
}

/// Fee schedule: what a batch of N operations must have paid.
#[async_trait]
pub trait FeeManager: Send + Sync {
    async fn required_fee(
        &self,
        number_of_operations: u64,
        transaction_time: u64,
    ) -> SidetreeResult<u64>;
}

/// Flat per-operation fee schedule.
#[derive(Debug, Clone)]
pub struct PerOperationFeeManager {
    pub fee_per_operation: u64,
}

#[async_trait]
impl FeeManager for PerOperationFeeManager {
    async fn required_fee(
        &self,
        number_of_operations: u64,
        _transaction_time: u64,
    ) -> SidetreeResult<u64> {
        Ok(self.fee_per_operation.saturating_mul(number_of_operations))
    }
}

/// Verifies that a writer's value lock covers the batch it anchored.
#[async_trait]
pub trait ValueTimeLockVerifier: Send + Sync {
    /// Fails with [`SidetreeError::ValueTimeLockVerificationFailed`] when
    /// the lock does not entitle the writer to the batch size.
    async fn verify_lock(
        &self,
        transaction: &TransactionModel,
        number_of_operations: u64,
    ) -> SidetreeResult<()>;
}

/// Verifier that accepts every batch. Suitable for networks that do not
/// use value locks, and for tests.
#[derive(Debug, Clone, Default)]
pub struct AcceptAllValueTimeLockVerifier;

#[async_trait]
impl ValueTimeLockVerifier for AcceptAllValueTimeLockVerifier {
    async fn verify_lock(
        &self,
        _transaction: &TransactionModel,
        _number_of_operations: u64,
    ) -> SidetreeResult<()> {
        Ok(())
    }
}

/// Verifier that enforces a fixed number of operations per locked unit.
#[derive(Debug, Clone)]
pub struct AmountBasedValueTimeLockVerifier {
    pub operations_per_locked_unit: u64,
}

#[async_trait]
impl ValueTimeLockVerifier for AmountBasedValueTimeLockVerifier {
    async fn verify_lock(
        &self,
        transaction: &TransactionModel,
        number_of_operations: u64,
    ) -> SidetreeResult<()> {
        // Without a lock a writer is entitled to a single free operation.
        let entitled = self.operations_per_locked_unit.max(1);
        if number_of_operations > entitled {
            return Err(SidetreeError::ValueTimeLockVerificationFailed(format!(
                "writer {} anchored {number_of_operations} operations, entitled to {entitled}",
                transaction.writer
            )));
        }
        Ok(())
    }
}

/// In-memory ledger for tests and local tooling. Transactions are assigned
/// consecutive numbers; time advances by one block per write.
#[derive(Default)]
pub struct MockBlockchain {
    transactions: tokio::sync::RwLock<Vec<TransactionModel>>,
    locks: tokio::sync::RwLock<std::collections::HashMap<String, ValueTimeLock>>,
}

impl MockBlockchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_value_time_lock(&self, lock: ValueTimeLock) {
        self.locks.write().await.insert(lock.identifier.clone(), lock);
    }
}

#[async_trait]
impl Blockchain for MockBlockchain {
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        _transaction_time_hash: Option<&str>,
    ) -> SidetreeResult<BlockchainReadResult> {
        let transactions = self.transactions.read().await;
        let matching: Vec<TransactionModel> = transactions
            .iter()
            .filter(|t| match since_transaction_number {
                Some(since) => t.transaction_number > since,
                None => true,
            })
            .cloned()
            .collect();
        Ok(BlockchainReadResult { more_transactions: false, transactions: matching })
    }

    async fn write(&self, anchor_string: &str, fee: u64) -> SidetreeResult<()> {
        let mut transactions = self.transactions.write().await;
        let number = transactions.len() as u64;
        transactions.push(TransactionModel {
            transaction_number: number,
            transaction_time: number,
            transaction_time_hash: format!("mock-block-{number}"),
            anchor_string: anchor_string.to_string(),
            transaction_fee_paid: fee,
            normalized_transaction_fee: None,
            writer: "mock-writer".to_string(),
        });
        Ok(())
    }

    async fn approximate_time(&self) -> SidetreeResult<BlockchainTimeModel> {
        let transactions = self.transactions.read().await;
        let time = transactions.len() as u64;
        Ok(BlockchainTimeModel { time, hash: format!("mock-block-{time}") })
    }

    async fn get_value_time_lock(
        &self,
        identifier: &str,
    ) -> SidetreeResult<Option<ValueTimeLock>> {
        Ok(self.locks.read().await.get(identifier).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction() -> TransactionModel {
        TransactionModel {
            transaction_number: 1,
            transaction_time: 10,
            transaction_time_hash: "beef".to_string(),
            anchor_string: "1.uri".to_string(),
            transaction_fee_paid: 100,
            normalized_transaction_fee: None,
            writer: "writer-1".to_string(),
        }
    }

    #[tokio::test]
    async fn per_operation_fee_scales_linearly() {
        let fees = PerOperationFeeManager { fee_per_operation: 7 };
        assert_eq!(fees.required_fee(10, 0).await.unwrap(), 70);
        assert_eq!(fees.required_fee(0, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn amount_based_verifier_enforces_entitlement() {
        let verifier = AmountBasedValueTimeLockVerifier { operations_per_locked_unit: 5 };
        assert!(verifier.verify_lock(&transaction(), 5).await.is_ok());
        let err = verifier.verify_lock(&transaction(), 6).await.unwrap_err();
        assert_eq!(err.code(), "value_time_lock_verification_failed");
    }

    #[tokio::test]
    async fn accept_all_verifier_accepts_everything() {
        let verifier = AcceptAllValueTimeLockVerifier;
        assert!(verifier.verify_lock(&transaction(), u64::MAX).await.is_ok());
    }

    #[tokio::test]
    async fn mock_blockchain_write_then_read() {
        let ledger = MockBlockchain::new();
        ledger.write("1.uriA", 10).await.unwrap();
        ledger.write("2.uriB", 20).await.unwrap();

        let all = ledger.read(None, None).await.unwrap();
        assert_eq!(all.transactions.len(), 2);
        assert!(!all.more_transactions);

        let after_first = ledger.read(Some(0), None).await.unwrap();
        assert_eq!(after_first.transactions.len(), 1);
        assert_eq!(after_first.transactions[0].anchor_string, "2.uriB");

        let time = ledger.approximate_time().await.unwrap();
        assert_eq!(time.time, 2);
    }

    #[tokio::test]
    async fn mock_blockchain_value_time_locks() {
        let ledger = MockBlockchain::new();
        assert!(ledger.get_value_time_lock("missing").await.unwrap().is_none());

        ledger
            .add_value_time_lock(ValueTimeLock {
                identifier: "lock-1".to_string(),
                amount_locked: 1_000,
                lock_transaction_time: 5,
                unlock_transaction_time: 50,
                owner: "writer-1".to_string(),
            })
            .await;
        let lock = ledger.get_value_time_lock("lock-1").await.unwrap().unwrap();
        assert_eq!(lock.amount_locked, 1_000);
    }
}
