//! Registry of well-known library objects.
//!
//! The host database wires a handful of helper objects (B-tree key codecs,
//! element codecs, comparators) into stored catalogs. Instead of serializing
//! them by value they travel as the [`KNOWN`](crate::tags::KNOWN) header
//! followed by a packed sub-id, and decoding yields the process-stable entry
//! for that id. Sub-ids are part of the wire format; the table only ever
//! grows.

use crate::value::Value;

pub const BTREE_KEYS_POS_LONG: u32 = 1;
pub const BTREE_KEYS_STRING: u32 = 2;
pub const BTREE_KEYS_POS_INT: u32 = 3;
pub const LONG_CODEC: u32 = 4;
pub const INT_CODEC: u32 = 5;
pub const EMPTY_CODEC: u32 = 6;
pub const TUPLE2_KEYS: u32 = 7;
pub const TUPLE3_KEYS: u32 = 8;
pub const TUPLE4_KEYS: u32 = 9;
pub const COMPARATOR_WITH_NULLS: u32 = 10;
pub const COMPARATOR: u32 = 11;
pub const THIS_CODEC: u32 = 12;
pub const BASIC_CODEC: u32 = 13;
pub const STRING_NOSIZE_CODEC: u32 = 14;
pub const BTREE_KEYS_BASIC: u32 = 15;
pub const BOOLEAN_CODEC: u32 = 16;
pub const BYTE_ARRAY_NOSIZE_CODEC: u32 = 17;

/// A well-known library object.
///
/// The field-less variants are the identity singletons; comparing them by
/// value *is* comparing them by handle. The tuple-key variants are
/// constructed objects that carry their component comparators and element
/// codecs and serialize them recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum Known {
    /// B-tree key codec for zero-or-positive longs.
    PosLongKeys,
    /// B-tree key codec for strings.
    StringKeys,
    /// B-tree key codec for zero-or-positive ints.
    PosIntKeys,
    /// Long element codec.
    LongCodec,
    /// Int element codec.
    IntCodec,
    /// Codec that writes nothing.
    EmptyCodec,
    Tuple2Keys(Box<Tuple2Keys>),
    Tuple3Keys(Box<Tuple3Keys>),
    Tuple4Keys(Box<Tuple4Keys>),
    /// Natural-order comparator that sorts nulls first.
    ComparatorWithNulls,
    /// Natural-order comparator; nulls are an error.
    Comparator,
    /// The codec instance performing the current call.
    ThisCodec,
    /// The general value codec.
    BasicCodec,
    /// String codec without a length prefix.
    StringNoSize,
    /// B-tree key codec that delegates to the current codec instance.
    BasicKeys,
    BooleanCodec,
    /// Byte-array codec without a length prefix.
    ByteArrayNoSize,
}

/// B-tree key codec for two-field tuple keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple2Keys {
    pub a_comparator: Value,
    pub a_codec: Value,
    pub b_codec: Value,
}

/// B-tree key codec for three-field tuple keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple3Keys {
    pub a_comparator: Value,
    pub b_comparator: Value,
    pub a_codec: Value,
    pub b_codec: Value,
    pub c_codec: Value,
}

/// B-tree key codec for four-field tuple keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple4Keys {
    pub a_comparator: Value,
    pub b_comparator: Value,
    pub c_comparator: Value,
    pub a_codec: Value,
    pub b_codec: Value,
    pub c_codec: Value,
    pub d_codec: Value,
}

/// Every singleton sub-id and its registry entry. The tuple-key ids (7..=9)
/// are absent: those decode into freshly constructed objects.
pub const SINGLETONS: &[(u32, Known)] = &[
    (BTREE_KEYS_POS_LONG, Known::PosLongKeys),
    (BTREE_KEYS_STRING, Known::StringKeys),
    (BTREE_KEYS_POS_INT, Known::PosIntKeys),
    (LONG_CODEC, Known::LongCodec),
    (INT_CODEC, Known::IntCodec),
    (EMPTY_CODEC, Known::EmptyCodec),
    (COMPARATOR_WITH_NULLS, Known::ComparatorWithNulls),
    (COMPARATOR, Known::Comparator),
    (THIS_CODEC, Known::ThisCodec),
    (BASIC_CODEC, Known::BasicCodec),
    (STRING_NOSIZE_CODEC, Known::StringNoSize),
    (BTREE_KEYS_BASIC, Known::BasicKeys),
    (BOOLEAN_CODEC, Known::BooleanCodec),
    (BYTE_ARRAY_NOSIZE_CODEC, Known::ByteArrayNoSize),
];

impl Known {
    /// The registry sub-id written after the `KNOWN` header.
    pub fn sub_id(&self) -> u32 {
        match self {
            Known::PosLongKeys => BTREE_KEYS_POS_LONG,
            Known::StringKeys => BTREE_KEYS_STRING,
            Known::PosIntKeys => BTREE_KEYS_POS_INT,
            Known::LongCodec => LONG_CODEC,
            Known::IntCodec => INT_CODEC,
            Known::EmptyCodec => EMPTY_CODEC,
            Known::Tuple2Keys(_) => TUPLE2_KEYS,
            Known::Tuple3Keys(_) => TUPLE3_KEYS,
            Known::Tuple4Keys(_) => TUPLE4_KEYS,
            Known::ComparatorWithNulls => COMPARATOR_WITH_NULLS,
            Known::Comparator => COMPARATOR,
            Known::ThisCodec => THIS_CODEC,
            Known::BasicCodec => BASIC_CODEC,
            Known::StringNoSize => STRING_NOSIZE_CODEC,
            Known::BasicKeys => BTREE_KEYS_BASIC,
            Known::BooleanCodec => BOOLEAN_CODEC,
            Known::ByteArrayNoSize => BYTE_ARRAY_NOSIZE_CODEC,
        }
    }

    /// Looks up a singleton sub-id. Returns `None` for the constructed
    /// tuple-key ids and for unassigned ids.
    pub fn singleton(id: u32) -> Option<Known> {
        SINGLETONS
            .iter()
            .find(|(sub_id, _)| *sub_id == id)
            .map(|(_, entry)| entry.clone())
    }
}
