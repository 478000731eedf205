//! One-byte header tags.
//!
//! Every serialized value starts with exactly one of these bytes; the byte
//! selects the decode branch and, for the literal forms, carries the value
//! itself. The numbering is part of the wire format and must never change;
//! new tags may only be added in the unassigned gaps.

/// Never written. Reading it means the storage handed us uninitialized bytes.
pub const ZERO_POISON: u8 = 0;

pub const NULL: u8 = 1;
pub const BOOLEAN_TRUE: u8 = 2;
pub const BOOLEAN_FALSE: u8 = 3;

// 26 contiguous int literals covering -9..=16; the value is `tag - INT_M9 - 9`.
pub const INT_M9: u8 = 4;
pub const INT_16: u8 = 29;
pub const INT_MIN_VALUE: u8 = 30;
pub const INT_MAX_VALUE: u8 = 31;
// Width-adaptive forms. Fx stores the value in x little-endian bytes; MFx
// stores the absolute value of a negative number the same way.
pub const INT_MF1: u8 = 32;
pub const INT_F1: u8 = 33;
pub const INT_MF2: u8 = 34;
pub const INT_F2: u8 = 35;
pub const INT_MF3: u8 = 36;
pub const INT_F3: u8 = 37;
pub const INT: u8 = 38;

// Long group mirrors the int group with tiers up to seven payload bytes.
pub const LONG_M9: u8 = 39;
pub const LONG_16: u8 = 64;
pub const LONG_MIN_VALUE: u8 = 65;
pub const LONG_MAX_VALUE: u8 = 66;
pub const LONG_MF1: u8 = 67;
pub const LONG_F1: u8 = 68;
pub const LONG_MF2: u8 = 69;
pub const LONG_F2: u8 = 70;
pub const LONG_MF3: u8 = 71;
pub const LONG_F3: u8 = 72;
pub const LONG_MF4: u8 = 73;
pub const LONG_F4: u8 = 74;
pub const LONG_MF5: u8 = 75;
pub const LONG_F5: u8 = 76;
pub const LONG_MF6: u8 = 77;
pub const LONG_F6: u8 = 78;
pub const LONG_MF7: u8 = 79;
pub const LONG_F7: u8 = 80;
pub const LONG: u8 = 81;

pub const BYTE_M1: u8 = 82;
pub const BYTE_0: u8 = 83;
pub const BYTE_1: u8 = 84;
pub const BYTE: u8 = 85;

pub const CHAR_0: u8 = 86;
pub const CHAR_1: u8 = 87;
/// Code unit <= 255, one payload byte.
pub const CHAR_255: u8 = 88;
pub const CHAR: u8 = 89;

pub const SHORT_M1: u8 = 90;
pub const SHORT_0: u8 = 91;
pub const SHORT_1: u8 = 92;
/// Value 1..=254, one unsigned payload byte.
pub const SHORT_255: u8 = 93;
/// Value -254..=-1, one unsigned payload byte, negated on read.
pub const SHORT_M255: u8 = 94;
pub const SHORT: u8 = 95;

pub const FLOAT_M1: u8 = 96;
pub const FLOAT_0: u8 = 97;
pub const FLOAT_1: u8 = 98;
/// Exactly a non-negative integer in 0..=255, one payload byte.
pub const FLOAT_255: u8 = 99;
/// Exactly a signed 16-bit integer, two payload bytes.
pub const FLOAT_SHORT: u8 = 100;
pub const FLOAT: u8 = 101;

pub const DOUBLE_M1: u8 = 102;
pub const DOUBLE_0: u8 = 103;
pub const DOUBLE_1: u8 = 104;
pub const DOUBLE_255: u8 = 105;
pub const DOUBLE_SHORT: u8 = 106;
/// Exactly a signed 32-bit integer, four payload bytes.
pub const DOUBLE_INT: u8 = 107;
pub const DOUBLE: u8 = 108;

pub const ARRAY_BYTE: u8 = 109;
/// Non-empty byte array whose elements are all equal: packed length + one byte.
pub const ARRAY_BYTE_ALL_EQUAL: u8 = 110;

pub const ARRAY_BOOLEAN: u8 = 111;
pub const ARRAY_SHORT: u8 = 112;
pub const ARRAY_CHAR: u8 = 113;
pub const ARRAY_FLOAT: u8 = 114;
pub const ARRAY_DOUBLE: u8 = 115;

pub const ARRAY_INT_BYTE: u8 = 116;
pub const ARRAY_INT_SHORT: u8 = 117;
pub const ARRAY_INT_PACKED: u8 = 118;
pub const ARRAY_INT: u8 = 119;

pub const ARRAY_LONG_BYTE: u8 = 120;
pub const ARRAY_LONG_SHORT: u8 = 121;
pub const ARRAY_LONG_PACKED: u8 = 122;
pub const ARRAY_LONG_INT: u8 = 123;
pub const ARRAY_LONG: u8 = 124;

/// Empty string. STRING_0 + n (n in 1..=10) is a string of n code units with
/// the length implicit in the tag.
pub const STRING_0: u8 = 125;
pub const STRING_1: u8 = 126;
pub const STRING_10: u8 = 135;
/// Packed length follows the tag.
pub const STRING: u8 = 136;

pub const BIGDECIMAL: u8 = 137;
pub const BIGINTEGER: u8 = 138;

pub const CLASS: u8 = 139;
pub const DATE: u8 = 140;
/// Upper-bound sentinel; sorts above every other value in range scans.
pub const HI: u8 = 141;
pub const UUID: u8 = 142;

// 143..=149 reserved for future non-recursive shapes.

/// Well-known library object; a packed registry sub-id follows.
pub const KNOWN: u8 = 150;
pub const TUPLE2: u8 = 151;
pub const TUPLE3: u8 = 152;
pub const TUPLE4: u8 = 153;
// 154..=157 reserved for tuples of arity 5..=8.

pub const ARRAY_OBJECT: u8 = 158;
// Fast paths for arrays that hold on-disk record references.
pub const ARRAY_OBJECT_PACKED_LONG: u8 = 159;
pub const ARRAY_LIST_PACKED_LONG: u8 = 160;
pub const ARRAY_OBJECT_ALL_NULL: u8 = 161;
pub const ARRAY_OBJECT_NO_REFS: u8 = 162;

pub const ARRAY_LIST: u8 = 163;
pub const TREE_MAP: u8 = 164;
pub const HASH_MAP: u8 = 165;
pub const LINKED_HASH_MAP: u8 = 166;
pub const TREE_SET: u8 = 167;
pub const HASH_SET: u8 = 168;
pub const LINKED_HASH_SET: u8 = 169;
pub const LINKED_LIST: u8 = 170;
pub const PROPERTIES: u8 = 171;

/// First byte written by a foreign object-serialization framework. Data that
/// starts with it was not produced by this codec; decoding fails hard.
pub const FOREIGN_SERIALIZATION: u8 = 172;

/// Field-reflective user record. Never emitted by the core encoder; decoding
/// requires an installed [`Extension`](crate::Extension).
pub const RECORD: u8 = 173;

/// Back-reference to an already materialized value; a packed index into the
/// per-call reference tracker follows.
pub const OBJECT_STACK: u8 = 174;

// 175..=255 unassigned.
