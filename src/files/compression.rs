// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Gzip framing for the three on-CAS file tiers.
//!
//! Files are compressed at rest without exception; parsers reject anything
//! that does not carry gzip framing. Decompression output is capped so a
//! small compressed payload cannot expand into an unbounded buffer.

use std::io::Read;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Why a decompression attempt was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum DecompressionError {
    /// Input is not a well-formed gzip stream (including uncompressed input).
    Malformed,
    /// Output would exceed the caller's cap.
    TooLarge { max_size: usize },
}

/// Gzip-compress a buffer.
pub fn compress(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .expect("writing gzip into a Vec cannot fail")
}

/// Gzip-decompress a buffer, refusing output larger than `max_size` bytes.
pub fn decompress(data: &[u8], max_size: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut decoder = GzDecoder::new(data).take(max_size as u64 + 1);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|_| DecompressionError::Malformed)?;
    if output.len() > max_size {
        return Err(DecompressionError::TooLarge { max_size });
    }
    Ok(output)
}
