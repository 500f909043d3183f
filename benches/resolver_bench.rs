// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use tokio::runtime::Runtime;

use sidetree_core::document::{DidStatePatch, DocumentState, ServiceEndpointEntry};
use sidetree_core::jws::{self, SigningKey};
use sidetree_core::multihash::{self, HashAlgorithm};
use sidetree_core::operations::{
    AnchoredOperation, Delta, OperationType, SuffixData, UpdateSignedData,
};
use sidetree_core::store::{InMemoryOperationStore, OperationStore};
use sidetree_core::{create_resolver, ProtocolParameters};

fn key(seed: u8) -> SigningKey {
    SigningKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
}

fn commitment(key: &SigningKey) -> String {
    multihash::canonicalize_then_double_hash_then_encode(
        &key.public_key_jwk(),
        HashAlgorithm::Sha256,
    )
    .unwrap()
}

fn service(id: usize) -> ServiceEndpointEntry {
    ServiceEndpointEntry {
        id: format!("svc-{id}"),
        service_type: "LinkedDomains".to_string(),
        service_endpoint: json!(format!("https://svc-{id}.example.com")),
    }
}

/// A create followed by `n_updates` key-rotating updates.
fn build_history(n_updates: usize) -> (Vec<AnchoredOperation>, String) {
    let recovery = key(1);
    let update_keys: Vec<SigningKey> = (0..=n_updates).map(|i| key(50 + i as u8)).collect();

    let delta = Delta {
        patches: vec![DidStatePatch::Replace { document: DocumentState::default() }],
        update_commitment: commitment(&update_keys[0]),
    };
    let suffix_data = SuffixData {
        delta_hash: multihash::canonicalize_then_hash_then_encode(&delta, HashAlgorithm::Sha256)
            .unwrap(),
        recovery_commitment: commitment(&recovery),
    };
    let did_suffix =
        multihash::canonicalize_then_hash_then_encode(&suffix_data, HashAlgorithm::Sha256)
            .unwrap();

    let create = json!({
        "type": "create",
        "suffixData": serde_json::to_value(&suffix_data).unwrap(),
        "delta": serde_json::to_value(&delta).unwrap(),
    });
    let mut operations = vec![AnchoredOperation {
        operation_type: OperationType::Create,
        did_unique_suffix: did_suffix.clone(),
        operation_buffer: serde_json::to_vec(&create).unwrap(),
        transaction_time: 0,
        transaction_number: 0,
        operation_index: 0,
    }];

    for i in 1..=n_updates {
        let delta = Delta {
            patches: vec![DidStatePatch::AddServices { services: vec![service(i)] }],
            update_commitment: commitment(&update_keys[i]),
        };
        let signed_data = UpdateSignedData {
            update_key: update_keys[i - 1].public_key_jwk(),
            delta_hash: multihash::canonicalize_then_hash_then_encode(
                &delta,
                HashAlgorithm::Sha256,
            )
            .unwrap(),
        };
        let value = json!({
            "type": "update",
            "didSuffix": did_suffix,
            "revealValue": multihash::canonicalize_then_hash_then_encode(
                &update_keys[i - 1].public_key_jwk(),
                HashAlgorithm::Sha256,
            )
            .unwrap(),
            "delta": serde_json::to_value(&delta).unwrap(),
            "signedData": jws::sign(&signed_data, &update_keys[i - 1]).unwrap(),
        });
        operations.push(AnchoredOperation {
            operation_type: OperationType::Update,
            did_unique_suffix: did_suffix.clone(),
            operation_buffer: serde_json::to_vec(&value).unwrap(),
            transaction_time: i as u64,
            transaction_number: i as u64,
            operation_index: 0,
        });
    }

    (operations, did_suffix)
}

fn bench_resolve(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("Resolver");

    for n_updates in [10usize, 50] {
        let (operations, did_suffix) = build_history(n_updates);
        let store = Arc::new(InMemoryOperationStore::new());
        rt.block_on(async {
            store.put(operations.clone()).await.unwrap();
        });
        let resolver = create_resolver(store, ProtocolParameters::default());

        group.bench_function(BenchmarkId::new("resolve", n_updates), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let state = resolver.resolve(black_box(&did_suffix)).await;
                    assert!(state.is_some());
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
