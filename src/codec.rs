//! Bit/byte/text conversion for plaintexts
//!
//! Bits are packed MSB-first, eight per byte, and the tail is padded with zero
//! bits. Text is Latin-1: each byte is one `char`, no multi-byte decoding.

use crate::error::{Result, WhiteboxError};

/// Pack bits into bytes, zero-padding the last byte on the right
///
/// Any non-zero entry counts as a set bit.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &b)| byte | (u8::from(b != 0) << (7 - i)))
        })
        .collect()
}

/// Unpack bytes into bits, MSB first
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1))
        .collect()
}

/// Render bytes as Latin-1 text, keeping NUL padding
pub fn bytes_to_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Strip trailing NUL bytes left by zero padding
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

/// Parse a string of `0`/`1` characters
pub fn parse_bit_string(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .enumerate()
        .map(|(index, c)| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            other => Err(WhiteboxError::InvalidBit {
                index,
                value: other.to_string(),
            }),
        })
        .collect()
}

/// Render bits as a `0`/`1` string; rejects values other than 0 and 1
pub fn bits_to_string(bits: &[u8]) -> Result<String> {
    bits.iter()
        .enumerate()
        .map(|(index, &b)| match b {
            0 => Ok('0'),
            1 => Ok('1'),
            other => Err(WhiteboxError::InvalidBit {
                index,
                value: other.to_string(),
            }),
        })
        .collect()
}
