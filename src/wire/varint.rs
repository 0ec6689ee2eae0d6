//! Varint and zigzag primitives.

use bytes::BufMut;

use super::constants::MAX_VARINT_LEN;
use crate::error::{CodecError, Result};

/// Map a signed value onto an unsigned one so small magnitudes stay small.
#[inline]
pub fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub fn zigzag_decode(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Encoded length of a plain varint.
#[inline]
pub fn size_of_var_unsigned(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        (bits + 6) / 7
    }
}

/// Encoded length of a zigzag varint.
#[inline]
pub fn size_of_var_signed(value: i64) -> usize {
    size_of_var_unsigned(zigzag_encode(value))
}

/// Append a plain varint.
#[inline]
pub(crate) fn put_var_unsigned<B: BufMut>(buf: &mut B, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Try to decode a plain varint from the front of `buf`.
///
/// Returns:
/// - `Ok(Some((value, consumed)))` if a complete varint was found
/// - `Ok(None)` if `buf` ends mid-varint
/// - `Err(MalformedVarint)` if the encoding runs past 10 bytes or overflows 64 bits
pub fn try_decode_var_unsigned(buf: &[u8]) -> Result<Option<(u64, usize)>> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().enumerate() {
        // The tenth byte may only carry the top bit of a u64 and must terminate.
        if i == MAX_VARINT_LEN - 1 && byte > 1 {
            return Err(CodecError::MalformedVarint(MAX_VARINT_LEN));
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    Ok(None)
}
