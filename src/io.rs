//! Byte-level primitives shared by the encode and decode halves.
//!
//! Multi-byte scalars are big-endian on the wire; the width-adaptive integer
//! payloads (`INT_F1`..`LONG_F7` and their `MF` twins) are little-endian.
//! Lengths and small counters use the packed encoding: 7-bit groups, most
//! significant group first, with the continuation bit set in every byte
//! except the last.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Maximum bytes a packed 32-bit integer may occupy.
const PACKED_U32_MAX_BYTES: usize = 5;
/// Maximum bytes a packed 64-bit integer may occupy.
const PACKED_U64_MAX_BYTES: usize = 10;

#[inline]
pub(crate) fn need(input: &Bytes, n: usize) -> Result<()> {
    if input.remaining() < n {
        return Err(Error::UnexpectedEnd);
    }
    Ok(())
}

#[inline]
pub(crate) fn read_u8(input: &mut Bytes) -> Result<u8> {
    need(input, 1)?;
    Ok(input.get_u8())
}

#[inline]
pub(crate) fn read_i8(input: &mut Bytes) -> Result<i8> {
    need(input, 1)?;
    Ok(input.get_i8())
}

#[inline]
pub(crate) fn read_u16(input: &mut Bytes) -> Result<u16> {
    need(input, 2)?;
    Ok(input.get_u16())
}

#[inline]
pub(crate) fn read_i16(input: &mut Bytes) -> Result<i16> {
    need(input, 2)?;
    Ok(input.get_i16())
}

#[inline]
pub(crate) fn read_i32(input: &mut Bytes) -> Result<i32> {
    need(input, 4)?;
    Ok(input.get_i32())
}

#[inline]
pub(crate) fn read_i64(input: &mut Bytes) -> Result<i64> {
    need(input, 8)?;
    Ok(input.get_i64())
}

#[inline]
pub(crate) fn read_u64(input: &mut Bytes) -> Result<u64> {
    need(input, 8)?;
    Ok(input.get_u64())
}

#[inline]
pub(crate) fn read_f32(input: &mut Bytes) -> Result<f32> {
    need(input, 4)?;
    Ok(input.get_f32())
}

#[inline]
pub(crate) fn read_f64(input: &mut Bytes) -> Result<f64> {
    need(input, 8)?;
    Ok(input.get_f64())
}

/// Reads exactly `n` raw bytes.
pub(crate) fn read_exact(input: &mut Bytes, n: usize) -> Result<Vec<u8>> {
    need(input, n)?;
    let mut buf = vec![0u8; n];
    input.copy_to_slice(&mut buf);
    Ok(buf)
}

/// Writes the low `width` bytes of `value`, least significant first.
pub(crate) fn put_le(out: &mut BytesMut, value: u64, width: usize) {
    let bytes = value.to_le_bytes();
    out.put_slice(&bytes[..width]);
}

/// Reads `width` little-endian bytes into an unsigned 64-bit value.
pub(crate) fn read_le(input: &mut Bytes, width: usize) -> Result<u64> {
    need(input, width)?;
    let mut value = 0u64;
    for shift in 0..width {
        value |= u64::from(input.get_u8()) << (8 * shift as u32);
    }
    Ok(value)
}

/// Writes a packed unsigned 32-bit integer.
pub fn pack_u32(out: &mut BytesMut, value: u32) {
    let mut shift = 31i32 - value.leading_zeros() as i32;
    shift -= shift % 7;
    while shift != 0 {
        out.put_u8(((value >> shift as u32) & 0x7F) as u8 | 0x80);
        shift -= 7;
    }
    out.put_u8((value & 0x7F) as u8);
}

/// Reads a packed unsigned 32-bit integer; fails `Corrupt` past five bytes.
pub fn unpack_u32(input: &mut Bytes) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..PACKED_U32_MAX_BYTES {
        let b = read_u8(input)?;
        value = (value << 7) | u32::from(b & 0x7F);
        if b & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Corrupt(
        "packed integer does not terminate within 5 bytes".into(),
    ))
}

/// Writes a packed unsigned 64-bit integer.
pub fn pack_u64(out: &mut BytesMut, value: u64) {
    let mut shift = 63i32 - value.leading_zeros() as i32;
    shift -= shift % 7;
    while shift != 0 {
        out.put_u8(((value >> shift as u32) & 0x7F) as u8 | 0x80);
        shift -= 7;
    }
    out.put_u8((value & 0x7F) as u8);
}

/// Reads a packed unsigned 64-bit integer; fails `Corrupt` past ten bytes.
pub fn unpack_u64(input: &mut Bytes) -> Result<u64> {
    let mut value = 0u64;
    for _ in 0..PACKED_U64_MAX_BYTES {
        let b = read_u8(input)?;
        value = (value << 7) | u64::from(b & 0x7F);
        if b & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Corrupt(
        "packed integer does not terminate within 10 bytes".into(),
    ))
}

/// Packed container length as `usize`.
pub(crate) fn unpack_len(input: &mut Bytes) -> Result<usize> {
    Ok(unpack_u32(input)? as usize)
}

/// Writes a class token: 16-bit big-endian byte length, then UTF-8 bytes.
pub(crate) fn write_class_token(out: &mut BytesMut, name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(Error::Unserializable(format!(
            "class token of {} bytes exceeds the 16-bit length prefix",
            bytes.len()
        )));
    }
    out.put_u16(bytes.len() as u16);
    out.put_slice(bytes);
    Ok(())
}

/// Reads a class token written by [`write_class_token`].
pub(crate) fn read_class_token(input: &mut Bytes) -> Result<String> {
    let len = read_u16(input)? as usize;
    let bytes = read_exact(input, len)?;
    String::from_utf8(bytes)
        .map_err(|_| Error::Corrupt("class token is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed_u32(value: u32) -> Vec<u8> {
        let mut out = BytesMut::new();
        pack_u32(&mut out, value);
        out.to_vec()
    }

    #[test]
    fn pack_u32_group_boundaries() {
        assert_eq!(packed_u32(0), [0x00]);
        assert_eq!(packed_u32(0x7F), [0x7F]);
        assert_eq!(packed_u32(0x80), [0x81, 0x00]);
        assert_eq!(packed_u32(u32::MAX), [0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn unpack_u32_rejects_endless_continuation() {
        let mut input = Bytes::from_static(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(unpack_u32(&mut input), Err(Error::Corrupt(_))));
    }

    #[test]
    fn le_payload_round_trip() {
        let mut out = BytesMut::new();
        put_le(&mut out, 0x0F4240, 3);
        assert_eq!(out.as_ref(), [0x40, 0x42, 0x0F]);
        let mut input = out.freeze();
        assert_eq!(read_le(&mut input, 3).unwrap(), 0x0F4240);
    }
}
