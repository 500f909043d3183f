// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! JSON Canonicalization Scheme (RFC 8785).
//!
//! All hashed or signed JSON in the protocol is canonicalized first: keys
//! sorted lexicographically at every depth, UTF-8, no insignificant
//! whitespace, ECMAScript number formatting. `serde_jcs` implements the
//! scheme; this module pins the crate behind the one entry point the rest
//! of the codebase uses.

use serde::Serialize;

use crate::error::{SidetreeError, SidetreeResult};

/// Canonicalize any serializable value to its RFC 8785 byte form.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> SidetreeResult<Vec<u8>> {
    canonicalize_to_string(value).map(String::into_bytes)
}

/// Canonicalize any serializable value to its RFC 8785 string form.
pub fn canonicalize_to_string<T: Serialize + ?Sized>(value: &T) -> SidetreeResult<String> {
    serde_jcs::to_string(value)
        .map_err(|e| SidetreeError::JsonCanonicalizationFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn sorts_keys_at_every_depth() {
        let value = json!({"b": {"z": 1, "a": 2}, "a": 3});
        let canonical = canonicalize_to_string(&value).unwrap();
        assert_eq!(canonical, r#"{"a":3,"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn no_insignificant_whitespace() {
        let value = json!({"key": [1, 2, 3], "other": "x"});
        let canonical = canonicalize_to_string(&value).unwrap();
        assert!(!canonical.contains(' '));
    }

    #[test]
    fn canonicalization_round_trip_is_stable() {
        // canonicalize(parse(canonicalize(x))) == canonicalize(x)
        let samples = vec![
            json!({"zebra": 1, "alpha": {"nested": [true, false, null]}}),
            json!(["mixed", 42, {"k": "v"}]),
            json!({"unicode": "héllo", "empty": {}, "list": []}),
        ];
        for value in samples {
            let first = canonicalize(&value).unwrap();
            let reparsed: Value = serde_json::from_slice(&first).unwrap();
            let second = canonicalize(&reparsed).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn utf8_strings_survive() {
        let value = json!({"name": "ダミー"});
        let canonical = canonicalize(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(&canonical).unwrap();
        assert_eq!(reparsed["name"], "ダミー");
    }
}
