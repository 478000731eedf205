//! Packed integer encoding: 7-bit groups, most significant first, with the
//! continuation bit set on every byte except the last.

use bytes::{Bytes, BytesMut};
use tagpack::io::{pack_u32, pack_u64, unpack_u32, unpack_u64};
use tagpack::Error;

fn packed32(value: u32) -> Vec<u8> {
    let mut out = BytesMut::new();
    pack_u32(&mut out, value);
    out.to_vec()
}

fn packed64(value: u64) -> Vec<u8> {
    let mut out = BytesMut::new();
    pack_u64(&mut out, value);
    out.to_vec()
}

#[test]
fn test_pack_u32_known_bytes() {
    assert_eq!(packed32(0), [0x00]);
    assert_eq!(packed32(1), [0x01]);
    assert_eq!(packed32(127), [0x7F]);
    assert_eq!(packed32(128), [0x81, 0x00]);
    assert_eq!(packed32(300), [0x82, 0x2C]);
    assert_eq!(packed32(16383), [0xFF, 0x7F]);
    assert_eq!(packed32(16384), [0x81, 0x80, 0x00]);
    assert_eq!(packed32(u32::MAX), [0x8F, 0xFF, 0xFF, 0xFF, 0x7F]);
}

#[test]
fn test_pack_u64_known_bytes() {
    assert_eq!(packed64(0), [0x00]);
    assert_eq!(packed64(127), [0x7F]);
    assert_eq!(packed64(128), [0x81, 0x00]);
    assert_eq!(
        packed64(u64::MAX),
        [0x81, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]
    );
}

#[test]
fn test_round_trip_u32_boundaries() {
    let mut cases = vec![0u32, 1, 127, 128, 255, 16383, 16384, u32::MAX];
    for shift in 0..32 {
        cases.push(1 << shift);
        cases.push((1 << shift) - 1);
    }
    for v in cases {
        let mut input = Bytes::from(packed32(v));
        assert_eq!(unpack_u32(&mut input).unwrap(), v, "value {v}");
        assert!(input.is_empty());
    }
}

#[test]
fn test_round_trip_u64_boundaries() {
    let mut cases = vec![0u64, 1, 127, 128, u64::MAX];
    for shift in 0..64 {
        cases.push(1 << shift);
        cases.push((1 << shift) - 1);
    }
    for v in cases {
        let mut input = Bytes::from(packed64(v));
        assert_eq!(unpack_u64(&mut input).unwrap(), v, "value {v}");
        assert!(input.is_empty());
    }
}

#[test]
fn test_unpack_is_minimal_length() {
    // re-encoding any decoded value yields the original byte count
    for v in [0u32, 5, 127, 128, 300, 70000, 1 << 24, u32::MAX] {
        let bytes = packed32(v);
        let mut input = Bytes::from(bytes.clone());
        let decoded = unpack_u32(&mut input).unwrap();
        assert_eq!(packed32(decoded), bytes);
    }
}

#[test]
fn test_unpack_u32_cap_is_five_bytes() {
    let mut input = Bytes::from_static(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]);
    assert!(matches!(unpack_u32(&mut input), Err(Error::Corrupt(_))));
}

#[test]
fn test_unpack_u64_cap_is_ten_bytes() {
    let mut input =
        Bytes::from_static(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00]);
    assert!(matches!(unpack_u64(&mut input), Err(Error::Corrupt(_))));
}

#[test]
fn test_unpack_truncated_input() {
    let mut input = Bytes::from_static(&[0x81]);
    assert!(matches!(unpack_u32(&mut input), Err(Error::UnexpectedEnd)));
    let mut input = Bytes::from_static(&[]);
    assert!(matches!(unpack_u64(&mut input), Err(Error::UnexpectedEnd)));
}
