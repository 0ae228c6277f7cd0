//! Variable-length unsigned integer encoding (VarUInt)
//!
//! Seven bits per byte, least significant group first, with the high bit set
//! on every byte except the last. The encoding is capped at nine bytes: after
//! eight 7-bit groups the ninth byte carries the remaining eight bits whole
//! and has no continuation flag, so every `u64` fits.

use crate::error::{CbError, Result};
use smallvec::SmallVec;

/// Longest possible VarUInt encoding.
pub const MAX_VAR_UINT_LEN: usize = 9;

/// Number of bytes needed to encode `value`.
pub const fn measure_var_uint(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits > 56 {
        MAX_VAR_UINT_LEN
    } else if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}

/// Number of bytes occupied by the VarUInt at the start of `bytes`.
///
/// Determined from the continuation bits alone, without decoding the value.
pub fn measure_encoded_var_uint(bytes: &[u8]) -> Result<usize> {
    for (i, &byte) in bytes.iter().take(MAX_VAR_UINT_LEN).enumerate() {
        if i + 1 == MAX_VAR_UINT_LEN || byte & 0x80 == 0 {
            return Ok(i + 1);
        }
    }
    Err(CbError::UnexpectedEof)
}

/// Encode `value` into `out`, returning the number of bytes written.
///
/// `out` must hold at least [`measure_var_uint`] bytes.
pub fn write_var_uint(value: u64, out: &mut [u8]) -> usize {
    debug_assert!(out.len() >= measure_var_uint(value));
    let mut x = value;
    for (i, slot) in out.iter_mut().enumerate().take(MAX_VAR_UINT_LEN) {
        if i + 1 == MAX_VAR_UINT_LEN {
            *slot = x as u8;
            return MAX_VAR_UINT_LEN;
        }
        if x < 0x80 {
            *slot = x as u8;
            return i + 1;
        }
        *slot = (x & 0x7f) as u8 | 0x80;
        x >>= 7;
    }
    out.len().min(MAX_VAR_UINT_LEN)
}

/// Encode `value` into an inline buffer.
pub fn encode_var_uint(value: u64) -> SmallVec<[u8; MAX_VAR_UINT_LEN]> {
    let mut buf = [0u8; MAX_VAR_UINT_LEN];
    let len = write_var_uint(value, &mut buf);
    SmallVec::from_slice(&buf[..len])
}

/// Append the encoding of `value` to `out`.
pub fn append_var_uint(value: u64, out: &mut Vec<u8>) {
    let mut buf = [0u8; MAX_VAR_UINT_LEN];
    let len = write_var_uint(value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

/// Decode the VarUInt at the start of `bytes`, returning the value and its length.
pub fn read_var_uint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    for (i, &byte) in bytes.iter().take(MAX_VAR_UINT_LEN).enumerate() {
        if i + 1 == MAX_VAR_UINT_LEN {
            result |= (byte as u64) << 56;
            return Ok((result, MAX_VAR_UINT_LEN));
        }
        result |= ((byte & 0x7f) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(CbError::UnexpectedEof)
}
