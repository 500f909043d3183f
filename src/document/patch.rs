// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

use serde::{Deserialize, Serialize};

use super::{DocumentState, PublicKeyEntry, ServiceEndpointEntry};
use crate::error::SidetreeResult;

/// A standard patch action carried inside an operation delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
#[serde(rename_all = "kebab-case")]
pub enum DidStatePatch {
    AddPublicKeys {
        #[serde(rename = "publicKeys")]
        public_keys: Vec<PublicKeyEntry>,
    },
    RemovePublicKeys {
        ids: Vec<String>,
    },
    AddServices {
        services: Vec<ServiceEndpointEntry>,
    },
    RemoveServices {
        ids: Vec<String>,
    },
    Replace {
        document: DocumentState,
    },
}

/// Apply patches to a document, returning the new document.
///
/// Adds are upserts keyed on `id`: re-adding an existing id replaces the
/// entry in place, which is how key rotation inside the document works.
/// Removing an unknown id is a no-op.
pub fn apply_patches(
    document: &DocumentState,
    patches: &[DidStatePatch],
) -> SidetreeResult<DocumentState> {
    let mut result = document.clone();
    for patch in patches {
        match patch {
            DidStatePatch::AddPublicKeys { public_keys } => {
                for entry in public_keys {
                    entry.public_key_jwk.validate()?;
                    upsert_public_key(&mut result, entry.clone());
                }
            }
            DidStatePatch::RemovePublicKeys { ids } => {
                result.public_keys.retain(|k| !ids.contains(&k.id));
            }
            DidStatePatch::AddServices { services } => {
                for entry in services {
                    upsert_service(&mut result, entry.clone());
                }
            }
            DidStatePatch::RemoveServices { ids } => {
                result.services.retain(|s| !ids.contains(&s.id));
            }
            DidStatePatch::Replace { document } => {
                for entry in &document.public_keys {
                    entry.public_key_jwk.validate()?;
                }
                result = document.clone();
            }
        }
    }
    Ok(result)
}

fn upsert_public_key(document: &mut DocumentState, entry: PublicKeyEntry) {
    match document.public_keys.iter_mut().find(|k| k.id == entry.id) {
        Some(existing) => *existing = entry,
        None => document.public_keys.push(entry),
    }
}

fn upsert_service(document: &mut DocumentState, entry: ServiceEndpointEntry) {
    match document.services.iter_mut().find(|s| s.id == entry.id) {
        Some(existing) => *existing = entry,
        None => document.services.push(entry),
    }
}
