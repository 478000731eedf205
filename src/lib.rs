//! # tagpack
//!
//! A compact, self-describing binary value codec for an embedded
//! key–value/collection database.
//!
//! Every value starts with a one-byte header that selects the decode branch;
//! small integers, short strings and common literals collapse into the
//! header itself. The codec covers a closed universe of scalars, big
//! numbers, primitive arrays, strings, nested containers, small tuples and a
//! registry of well-known library objects, and it preserves shared and
//! cyclic references inside a single top-level call.
//!
//! - Compact integer/long forms: literals for −9..=16, MIN/MAX markers, and
//!   width-adaptive one-to-seven-byte payloads with sign-flipped twins
//! - Homogeneous arrays packed by a single min/max pass; booleans bit-packed
//!   eight to a byte
//! - Object graphs: an identity stack turns repeated and self-referential
//!   objects into back-references, so decoding reproduces the sharing
//!   structure the encoder saw
//! - Well-known helper objects (B-tree key codecs, comparators) travel as a
//!   registry sub-id instead of by value
//!
//! ## Example
//! ```rust
//! use tagpack::{decode, encode, Value};
//!
//! let value = Value::array_list(vec![Value::Int(42), "hello".into(), Value::Null]);
//! let mut bytes = encode(&value).unwrap();
//! let back = decode(&mut bytes).unwrap();
//! assert_eq!(value, back);
//! ```
//!
//! ## Wire stability
//!
//! Header numbering, the packed integer shape and the registry sub-ids are
//! storage formats: they never change, and new assignments only take the
//! unused gaps. A reader accepts any legal writer emission, including
//! non-minimal integer forms; [`Serializer::strict`] turns that tolerance
//! off for conformance checking.

use bytes::{Bytes, BytesMut};
use thiserror::Error;

pub mod io;
pub mod known;
pub mod refs;
pub mod tags;
pub mod value;

mod de;
mod ser;

pub use known::Known;
pub use refs::RefTracker;
pub use value::{
    ListKind, ListValue, MapKind, MapValue, ObjectArray, RecordRef, SetKind, SetValue, Shared,
    TupleValue, Value,
};

/// Error type for all encoding and decoding operations in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream is not something this codec wrote: poison header, foreign
    /// framework header, malformed packed integer, dangling back-reference,
    /// or (in strict mode) a non-minimal scalar form.
    #[error("corrupted stream: {0}")]
    Corrupt(String),
    /// The input ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// The value is outside the encodable universe.
    #[error("value cannot be serialized: {0}")]
    Unserializable(String),
    /// A header byte the codec does not recognize and no extension claims.
    #[error("unknown header tag {0}")]
    UnknownTag(u8),
    /// The user-record header was read but no extension codec is installed.
    #[error("user-record header requires an installed extension codec")]
    Unsupported,
    /// Wrapped from the underlying byte I/O.
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension seam for user-defined records and future headers.
///
/// The core encoder calls [`write_unknown`](Extension::write_unknown) for
/// [`Value::Record`]; the decoder calls
/// [`read_unknown`](Extension::read_unknown) for every header it does not
/// recognize, the [`RECORD`](tags::RECORD) header included. The defaults
/// refuse both, which is also the core's behavior when no extension is
/// installed.
pub trait Extension {
    /// Serialize a value the core cannot. The implementation writes its own
    /// header and may recurse through the tracker.
    fn write_unknown(
        &self,
        _out: &mut BytesMut,
        value: &Value,
        _refs: &mut Option<RefTracker>,
    ) -> Result<()> {
        Err(Error::Unserializable(format!(
            "no extension handler for a {}",
            value.type_name()
        )))
    }

    /// Decode a header the core does not recognize. `tag` has already been
    /// consumed from `input`.
    fn read_unknown(
        &self,
        _input: &mut Bytes,
        tag: u8,
        _refs: &mut Option<RefTracker>,
    ) -> Result<Value> {
        if tag == tags::RECORD {
            return Err(Error::Unsupported);
        }
        Err(Error::UnknownTag(tag))
    }
}

/// The codec itself: a reusable encode/decode dispatcher.
///
/// A `Serializer` holds no per-call state; the reference tracker lives and
/// dies inside each `write`/`read`. Options are builder-style:
///
/// ```rust
/// use tagpack::Serializer;
///
/// let codec = Serializer::new().strict();
/// ```
#[derive(Default)]
pub struct Serializer {
    pub(crate) extension: Option<Box<dyn Extension>>,
    pub(crate) strict: bool,
    pub(crate) leaf_arrays: bool,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an extension codec for user records and unassigned headers.
    pub fn with_extension(mut self, extension: Box<dyn Extension>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Makes the reader reject non-minimal scalar headers as `Corrupt`.
    /// The default reader accepts any legal writer emission so that writers
    /// may evolve.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Emits object arrays whose elements are all leaf scalars under the
    /// [`ARRAY_OBJECT_NO_REFS`](tags::ARRAY_OBJECT_NO_REFS) header, skipping
    /// reference tracking for their children. Off by default; the reader
    /// always accepts the form.
    pub fn leaf_arrays(mut self) -> Self {
        self.leaf_arrays = true;
        self
    }

    /// Encodes one value onto `out`.
    pub fn write(&self, out: &mut BytesMut, value: &Value) -> Result<()> {
        let mut refs = None;
        ser::write_value(self, out, value, &mut refs)
    }

    /// Decodes one value from `input`.
    pub fn read(&self, input: &mut Bytes) -> Result<Value> {
        let mut refs = None;
        de::read_value(self, input, &mut refs)
    }

    /// Decodes one value from a record of known size. A zero capacity means
    /// an empty record slot: the null value, with nothing read.
    pub fn read_sized(&self, input: &mut Bytes, capacity: usize) -> Result<Value> {
        if capacity == 0 {
            return Ok(Value::Null);
        }
        self.read(input)
    }

    /// Classify-only admission check: succeeds iff `write` would not fail on
    /// the value's own shape. Does not recurse into children.
    pub fn assert_encodable(&self, value: &Value) -> Result<()> {
        match value {
            Value::Record(_) if self.extension.is_none() => Err(Error::Unserializable(
                "user record without an installed extension codec".into(),
            )),
            Value::Tuple(handle) => {
                let arity = handle.borrow().items.len();
                if (2..=4).contains(&arity) {
                    Ok(())
                } else {
                    Err(Error::Unserializable(format!(
                        "tuple arity {arity} is not encodable"
                    )))
                }
            }
            Value::Decimal(d) => {
                let (_, scale) = d.as_bigint_and_exponent();
                if i32::try_from(scale).is_ok() {
                    Ok(())
                } else {
                    Err(Error::Unserializable(format!(
                        "decimal scale {scale} exceeds 32 bits"
                    )))
                }
            }
            Value::Class(name) if name.len() > u16::MAX as usize => Err(Error::Unserializable(
                "class token exceeds the 16-bit length prefix".into(),
            )),
            Value::Array(handle) if handle.borrow().component.len() > u16::MAX as usize => {
                Err(Error::Unserializable(
                    "class token exceeds the 16-bit length prefix".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Convenience function to encode a value with a fresh default [`Serializer`].
///
/// # Example
/// ```rust
/// use tagpack::{encode, Value};
///
/// let bytes = encode(&Value::Null).unwrap();
/// assert_eq!(bytes.as_ref(), [tagpack::tags::NULL]);
/// ```
pub fn encode(value: &Value) -> Result<Bytes> {
    let mut out = BytesMut::new();
    Serializer::new().write(&mut out, value)?;
    Ok(out.freeze())
}

/// Convenience function to decode a value with a fresh default [`Serializer`].
pub fn decode(input: &mut Bytes) -> Result<Value> {
    Serializer::new().read(input)
}
