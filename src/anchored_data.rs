// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! The anchor string a writer publishes on the ledger:
//! `<numberOfOperations>.<anchorFileUri>`.

use crate::config::ProtocolParameters;
use crate::error::{SidetreeError, SidetreeResult};
use crate::multihash;

/// Decoded anchor string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredData {
    pub number_of_operations: u64,
    pub anchor_file_uri: String,
}

impl AnchoredData {
    /// Serialize to the on-ledger string form.
    pub fn serialize(&self) -> String {
        format!("{}.{}", self.number_of_operations, self.anchor_file_uri)
    }

    /// Parse and validate an anchor string read off the ledger.
    pub fn deserialize(anchor_string: &str, params: &ProtocolParameters) -> SidetreeResult<Self> {
        let mut parts = anchor_string.split('.');
        let (count_part, uri_part) = match (parts.next(), parts.next(), parts.next()) {
            (Some(count), Some(uri), None) => (count, uri),
            _ => {
                return Err(SidetreeError::AnchoredDataIncorrectFormat(
                    anchor_string.to_string(),
                ))
            }
        };

        // A positive decimal integer with no leading zeros and no sign.
        let valid_count = !count_part.is_empty()
            && count_part.bytes().all(|b| b.is_ascii_digit())
            && !count_part.starts_with('0');
        if !valid_count {
            return Err(SidetreeError::AnchoredDataNumberOfOperationsInvalid);
        }
        let number_of_operations: u64 = count_part
            .parse()
            .map_err(|_| SidetreeError::AnchoredDataNumberOfOperationsInvalid)?;
        if number_of_operations > params.max_operations_per_batch {
            return Err(SidetreeError::AnchoredDataNumberOfOperationsGreaterThanMax {
                got: number_of_operations,
                max: params.max_operations_per_batch,
            });
        }

        if !multihash::is_valid_encoded_multihash(uri_part) {
            return Err(SidetreeError::AnchoredDataIncorrectFormat(
                anchor_string.to_string(),
            ));
        }

        Ok(Self {
            number_of_operations,
            anchor_file_uri: uri_part.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multihash::HashAlgorithm;

    fn uri() -> String {
        multihash::hash_then_encode(b"anchor file", HashAlgorithm::Sha256)
    }

    #[test]
    fn round_trip() {
        let params = ProtocolParameters::default();
        let data = AnchoredData { number_of_operations: 42, anchor_file_uri: uri() };
        let parsed = AnchoredData::deserialize(&data.serialize(), &params).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn rejects_missing_separator() {
        let params = ProtocolParameters::default();
        let err = AnchoredData::deserialize("42", &params).unwrap_err();
        assert_eq!(err.code(), "anchored_data_incorrect_format");
    }

    #[test]
    fn rejects_extra_segments() {
        let params = ProtocolParameters::default();
        let err = AnchoredData::deserialize(&format!("42.{}.extra", uri()), &params).unwrap_err();
        assert_eq!(err.code(), "anchored_data_incorrect_format");
    }

    #[test]
    fn rejects_zero_and_leading_zero_counts() {
        let params = ProtocolParameters::default();
        for bad in ["0", "042", "-1", "1e3", ""] {
            let err =
                AnchoredData::deserialize(&format!("{bad}.{}", uri()), &params).unwrap_err();
            assert_eq!(err.code(), "anchored_data_number_of_operations_invalid", "input {bad:?}");
        }
    }

    #[test]
    fn rejects_count_above_protocol_maximum() {
        let mut params = ProtocolParameters::default();
        params.max_operations_per_batch = 100;
        let err = AnchoredData::deserialize(&format!("101.{}", uri()), &params).unwrap_err();
        assert_eq!(err.code(), "anchored_data_number_of_operations_greater_than_max");
    }

    #[test]
    fn rejects_non_multihash_uri() {
        let params = ProtocolParameters::default();
        let err = AnchoredData::deserialize("5.QmNotAMultihash", &params).unwrap_err();
        assert_eq!(err.code(), "anchored_data_incorrect_format");
    }
}
