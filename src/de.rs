//! Decode half of the codec.
//!
//! `read_value` mirrors the encoder's dispatch: the immediate shapes
//! (scalars, primitive arrays, strings, registry objects, the packed fast
//! paths) are materialized first and registered after the read; the
//! recursive shapes create the tracker lazily and register themselves
//! before their children, so back-reference indices line up with the
//! encoder's.

use std::cell::RefCell;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::DateTime;
use num_bigint::BigInt;
use uuid::Uuid;

use crate::io;
use crate::known::{self, Known, Tuple2Keys, Tuple3Keys, Tuple4Keys};
use crate::refs::RefTracker;
use crate::ser;
use crate::tags;
use crate::value::{
    ListKind, ListValue, MapKind, MapValue, ObjectArray, SetKind, SetValue, TupleValue, Value,
    CLASS_LONG,
};
use crate::{Error, Result, Serializer};

pub(crate) fn read_value(
    ser: &Serializer,
    input: &mut Bytes,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let tag = io::read_u8(input)?;
    if let Some(value) = read_immediate(ser, input, tag)? {
        if ser.strict {
            strict_check(tag, &value)?;
        }
        if let Some(tracker) = refs.as_mut() {
            tracker.push(&value);
        }
        return Ok(value);
    }

    // Everything below walks children and needs the tracker.
    if refs.is_none() {
        *refs = Some(RefTracker::new());
    }
    let before = refs.as_ref().map_or(0, RefTracker::len);

    let value = match tag {
        tags::OBJECT_STACK => {
            let index = io::unpack_u32(input)?;
            match refs.as_ref() {
                Some(tracker) => tracker.get(index)?,
                None => {
                    return Err(Error::Corrupt(
                        "back-reference outside a tracked call".into(),
                    ))
                }
            }
        }
        tags::ARRAY_LIST => read_list(ser, input, ListKind::Array, refs)?,
        tags::LINKED_LIST => read_list(ser, input, ListKind::Linked, refs)?,
        tags::HASH_SET => read_set(ser, input, SetKind::Hash, refs)?,
        tags::LINKED_HASH_SET => read_set(ser, input, SetKind::LinkedHash, refs)?,
        tags::TREE_SET => read_tree_set(ser, input, refs)?,
        tags::HASH_MAP => read_map(ser, input, MapKind::Hash, refs)?,
        tags::LINKED_HASH_MAP => read_map(ser, input, MapKind::LinkedHash, refs)?,
        tags::PROPERTIES => read_map(ser, input, MapKind::Properties, refs)?,
        tags::TREE_MAP => read_tree_map(ser, input, refs)?,
        tags::TUPLE2 => read_tuple(ser, input, 2, refs)?,
        tags::TUPLE3 => read_tuple(ser, input, 3, refs)?,
        tags::TUPLE4 => read_tuple(ser, input, 4, refs)?,
        tags::ARRAY_OBJECT => read_object_array(ser, input, refs)?,
        other => read_unrecognized(ser, input, other, refs)?,
    };

    if tag != tags::OBJECT_STACK {
        if let Some(tracker) = refs.as_mut() {
            // A container registered itself before its children; anything
            // else (an extension's product) is registered here.
            if tracker.len() == before {
                tracker.push(&value);
            }
        }
    }
    Ok(value)
}

/// Decodes the shapes that need no reference tracker. Returns `None` for a
/// tag that belongs to the recursive group.
fn read_immediate(ser: &Serializer, input: &mut Bytes, tag: u8) -> Result<Option<Value>> {
    let value = match tag {
        tags::ZERO_POISON => {
            return Err(Error::Corrupt(
                "zero header: storage handed back uninitialized bytes".into(),
            ))
        }
        tags::NULL => Value::Null,
        tags::BOOLEAN_TRUE => Value::Bool(true),
        tags::BOOLEAN_FALSE => Value::Bool(false),

        tags::INT_M9..=tags::INT_16 => {
            Value::Int(i32::from(tag) - i32::from(tags::INT_M9) - 9)
        }
        tags::INT_MIN_VALUE => Value::Int(i32::MIN),
        tags::INT_MAX_VALUE => Value::Int(i32::MAX),
        tags::INT_F1 => Value::Int(i32::from(io::read_u8(input)?)),
        tags::INT_MF1 => Value::Int(-i32::from(io::read_u8(input)?)),
        tags::INT_F2 => Value::Int(io::read_le(input, 2)? as i32),
        tags::INT_MF2 => Value::Int(-(io::read_le(input, 2)? as i32)),
        tags::INT_F3 => Value::Int(io::read_le(input, 3)? as i32),
        tags::INT_MF3 => Value::Int(-(io::read_le(input, 3)? as i32)),
        tags::INT => Value::Int(io::read_i32(input)?),

        tags::LONG_M9..=tags::LONG_16 => {
            Value::Long(i64::from(tag) - i64::from(tags::LONG_M9) - 9)
        }
        tags::LONG_MIN_VALUE => Value::Long(i64::MIN),
        tags::LONG_MAX_VALUE => Value::Long(i64::MAX),
        tags::LONG_F1 => Value::Long(io::read_le(input, 1)? as i64),
        tags::LONG_MF1 => Value::Long(-(io::read_le(input, 1)? as i64)),
        tags::LONG_F2 => Value::Long(io::read_le(input, 2)? as i64),
        tags::LONG_MF2 => Value::Long(-(io::read_le(input, 2)? as i64)),
        tags::LONG_F3 => Value::Long(io::read_le(input, 3)? as i64),
        tags::LONG_MF3 => Value::Long(-(io::read_le(input, 3)? as i64)),
        tags::LONG_F4 => Value::Long(io::read_le(input, 4)? as i64),
        tags::LONG_MF4 => Value::Long(-(io::read_le(input, 4)? as i64)),
        tags::LONG_F5 => Value::Long(io::read_le(input, 5)? as i64),
        tags::LONG_MF5 => Value::Long(-(io::read_le(input, 5)? as i64)),
        tags::LONG_F6 => Value::Long(io::read_le(input, 6)? as i64),
        tags::LONG_MF6 => Value::Long(-(io::read_le(input, 6)? as i64)),
        tags::LONG_F7 => Value::Long(io::read_le(input, 7)? as i64),
        tags::LONG_MF7 => Value::Long(-(io::read_le(input, 7)? as i64)),
        tags::LONG => Value::Long(io::read_i64(input)?),

        tags::BYTE_M1 => Value::Byte(-1),
        tags::BYTE_0 => Value::Byte(0),
        tags::BYTE_1 => Value::Byte(1),
        tags::BYTE => Value::Byte(io::read_i8(input)?),

        tags::CHAR_0 => Value::Char(0),
        tags::CHAR_1 => Value::Char(1),
        tags::CHAR_255 => Value::Char(u16::from(io::read_u8(input)?)),
        tags::CHAR => Value::Char(io::read_u16(input)?),

        tags::SHORT_M1 => Value::Short(-1),
        tags::SHORT_0 => Value::Short(0),
        tags::SHORT_1 => Value::Short(1),
        tags::SHORT_255 => Value::Short(i16::from(io::read_u8(input)?)),
        tags::SHORT_M255 => Value::Short(-i16::from(io::read_u8(input)?)),
        tags::SHORT => Value::Short(io::read_i16(input)?),

        tags::FLOAT_M1 => Value::Float(-1.0),
        tags::FLOAT_0 => Value::Float(0.0),
        tags::FLOAT_1 => Value::Float(1.0),
        tags::FLOAT_255 => Value::Float(f32::from(io::read_u8(input)?)),
        tags::FLOAT_SHORT => Value::Float(f32::from(io::read_i16(input)?)),
        tags::FLOAT => Value::Float(io::read_f32(input)?),

        tags::DOUBLE_M1 => Value::Double(-1.0),
        tags::DOUBLE_0 => Value::Double(0.0),
        tags::DOUBLE_1 => Value::Double(1.0),
        tags::DOUBLE_255 => Value::Double(f64::from(io::read_u8(input)?)),
        tags::DOUBLE_SHORT => Value::Double(f64::from(io::read_i16(input)?)),
        tags::DOUBLE_INT => Value::Double(f64::from(io::read_i32(input)?)),
        tags::DOUBLE => Value::Double(io::read_f64(input)?),

        tags::ARRAY_BYTE_ALL_EQUAL => {
            let len = io::unpack_len(input)?;
            let fill = io::read_u8(input)?;
            Value::Bytes(vec![fill; len])
        }
        tags::ARRAY_BYTE => {
            let len = io::unpack_len(input)?;
            Value::Bytes(io::read_exact(input, len)?)
        }
        tags::ARRAY_BOOLEAN => read_bool_array(input)?,
        tags::ARRAY_SHORT => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::read_i16(input)?);
            }
            Value::Shorts(vals)
        }
        tags::ARRAY_CHAR => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::read_u16(input)?);
            }
            Value::Chars(vals)
        }
        tags::ARRAY_FLOAT => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::read_f32(input)?);
            }
            Value::Floats(vals)
        }
        tags::ARRAY_DOUBLE => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::read_f64(input)?);
            }
            Value::Doubles(vals)
        }

        tags::ARRAY_INT_BYTE => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(i32::from(io::read_i8(input)?));
            }
            Value::Ints(vals)
        }
        tags::ARRAY_INT_SHORT => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(i32::from(io::read_i16(input)?));
            }
            Value::Ints(vals)
        }
        tags::ARRAY_INT_PACKED => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::unpack_u32(input)? as i32);
            }
            Value::Ints(vals)
        }
        tags::ARRAY_INT => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::read_i32(input)?);
            }
            Value::Ints(vals)
        }

        tags::ARRAY_LONG_BYTE => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(i64::from(io::read_i8(input)?));
            }
            Value::Longs(vals)
        }
        tags::ARRAY_LONG_SHORT => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(i64::from(io::read_i16(input)?));
            }
            Value::Longs(vals)
        }
        tags::ARRAY_LONG_PACKED => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::unpack_u64(input)? as i64);
            }
            Value::Longs(vals)
        }
        tags::ARRAY_LONG_INT => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(i64::from(io::read_i32(input)?));
            }
            Value::Longs(vals)
        }
        tags::ARRAY_LONG => {
            let len = io::unpack_len(input)?;
            let mut vals = Vec::with_capacity(len);
            for _ in 0..len {
                vals.push(io::read_i64(input)?);
            }
            Value::Longs(vals)
        }

        tags::STRING_0 => Value::String(String::new()),
        tags::STRING_1..=tags::STRING_10 => {
            read_string(input, usize::from(tag - tags::STRING_0))?
        }
        tags::STRING => {
            let len = io::unpack_len(input)?;
            read_string(input, len)?
        }

        tags::BIGINTEGER => Value::BigInt(read_bigint_body(input)?),
        tags::BIGDECIMAL => {
            let unscaled = read_bigint_body(input)?;
            let scale = io::unpack_u32(input)? as i32;
            Value::Decimal(BigDecimal::new(unscaled, i64::from(scale)))
        }

        tags::CLASS => Value::Class(io::read_class_token(input)?),
        tags::DATE => {
            let millis = io::read_i64(input)?;
            let instant = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                Error::Corrupt(format!("instant {millis} ms is out of range"))
            })?;
            Value::Date(instant)
        }
        tags::UUID => {
            let hi = io::read_u64(input)?;
            let lo = io::read_u64(input)?;
            Value::Uuid(Uuid::from_u64_pair(hi, lo))
        }
        tags::HI => Value::Hi,

        tags::KNOWN => read_known(ser, input)?,

        tags::ARRAY_LIST_PACKED_LONG => {
            let len = usize::from(io::read_u8(input)?);
            Value::array_list(read_packed_long_slots(input, len)?)
        }
        tags::ARRAY_OBJECT_PACKED_LONG => {
            let len = usize::from(io::read_u8(input)?);
            Value::object_array(CLASS_LONG, read_packed_long_slots(input, len)?)
        }
        tags::ARRAY_OBJECT_ALL_NULL => {
            let len = io::unpack_len(input)?;
            let component = io::read_class_token(input)?;
            Value::object_array(component, vec![Value::Null; len])
        }
        tags::ARRAY_OBJECT_NO_REFS => {
            let len = io::unpack_len(input)?;
            let component = io::read_class_token(input)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(read_value(ser, input, &mut None)?);
            }
            Value::object_array(component, items)
        }

        tags::FOREIGN_SERIALIZATION => {
            return Err(Error::Corrupt(
                "header written by a foreign serialization framework".into(),
            ))
        }

        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn strict_check(tag: u8, value: &Value) -> Result<()> {
    if let Some(minimal) = ser::minimal_scalar_tag(value) {
        if minimal != tag {
            return Err(Error::Corrupt(format!(
                "non-minimal header {tag} for a {} (minimal form is {minimal})",
                value.type_name()
            )));
        }
    }
    Ok(())
}

fn read_bool_array(input: &mut Bytes) -> Result<Value> {
    let count = io::unpack_len(input)?;
    let packed = io::read_exact(input, count.div_ceil(8))?;
    let mut bits = Vec::with_capacity(count);
    for i in 0..count {
        bits.push(packed[i / 8] & (1 << (i % 8)) != 0);
    }
    Ok(Value::Bools(bits))
}

fn read_string(input: &mut Bytes, len: usize) -> Result<Value> {
    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        let unit = io::unpack_u32(input)?;
        let unit = u16::try_from(unit)
            .map_err(|_| Error::Corrupt(format!("string code unit {unit} exceeds 16 bits")))?;
        units.push(unit);
    }
    String::from_utf16(&units)
        .map(Value::String)
        .map_err(|_| Error::Corrupt("string contains an unpaired surrogate".into()))
}

fn read_bigint_body(input: &mut Bytes) -> Result<BigInt> {
    let len = io::unpack_len(input)?;
    let bytes = io::read_exact(input, len)?;
    Ok(BigInt::from_signed_bytes_be(&bytes))
}

fn read_packed_long_slots(input: &mut Bytes, len: usize) -> Result<Vec<Value>> {
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        let slot = io::unpack_u64(input)?;
        if slot == 0 {
            items.push(Value::Null);
        } else {
            items.push(Value::Long(slot.wrapping_sub(1) as i64));
        }
    }
    Ok(items)
}

fn read_known(ser: &Serializer, input: &mut Bytes) -> Result<Value> {
    let sub_id = io::unpack_u32(input)?;
    let entry = match sub_id {
        known::TUPLE2_KEYS => Known::Tuple2Keys(Box::new(Tuple2Keys {
            a_comparator: read_value(ser, input, &mut None)?,
            a_codec: read_value(ser, input, &mut None)?,
            b_codec: read_value(ser, input, &mut None)?,
        })),
        known::TUPLE3_KEYS => Known::Tuple3Keys(Box::new(Tuple3Keys {
            a_comparator: read_value(ser, input, &mut None)?,
            b_comparator: read_value(ser, input, &mut None)?,
            a_codec: read_value(ser, input, &mut None)?,
            b_codec: read_value(ser, input, &mut None)?,
            c_codec: read_value(ser, input, &mut None)?,
        })),
        known::TUPLE4_KEYS => Known::Tuple4Keys(Box::new(Tuple4Keys {
            a_comparator: read_value(ser, input, &mut None)?,
            b_comparator: read_value(ser, input, &mut None)?,
            c_comparator: read_value(ser, input, &mut None)?,
            a_codec: read_value(ser, input, &mut None)?,
            b_codec: read_value(ser, input, &mut None)?,
            c_codec: read_value(ser, input, &mut None)?,
            d_codec: read_value(ser, input, &mut None)?,
        })),
        id => Known::singleton(id)
            .ok_or_else(|| Error::Corrupt(format!("unknown registry sub-id {id}")))?,
    };
    Ok(Value::Known(entry))
}

fn register(refs: &mut Option<RefTracker>, value: &Value) {
    if let Some(tracker) = refs.as_mut() {
        tracker.push(value);
    }
}

fn read_list(
    ser: &Serializer,
    input: &mut Bytes,
    kind: ListKind,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let len = io::unpack_len(input)?;
    let handle = Rc::new(RefCell::new(ListValue {
        kind,
        items: Vec::with_capacity(len),
    }));
    let value = Value::List(handle.clone());
    register(refs, &value);
    for _ in 0..len {
        let item = read_value(ser, input, refs)?;
        handle.borrow_mut().items.push(item);
    }
    Ok(value)
}

fn read_set(
    ser: &Serializer,
    input: &mut Bytes,
    kind: SetKind,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let len = io::unpack_len(input)?;
    let handle = Rc::new(RefCell::new(SetValue {
        kind,
        items: Vec::with_capacity(len),
    }));
    let value = Value::Set(handle.clone());
    register(refs, &value);
    for _ in 0..len {
        let item = read_value(ser, input, refs)?;
        handle.borrow_mut().items.push(item);
    }
    Ok(value)
}

fn read_tree_set(
    ser: &Serializer,
    input: &mut Bytes,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let len = io::unpack_len(input)?;
    let handle = Rc::new(RefCell::new(SetValue {
        kind: SetKind::Tree { comparator: Value::Null },
        items: Vec::with_capacity(len),
    }));
    let value = Value::Set(handle.clone());
    register(refs, &value);
    let comparator = read_value(ser, input, refs)?;
    handle.borrow_mut().kind = SetKind::Tree { comparator };
    for _ in 0..len {
        let item = read_value(ser, input, refs)?;
        handle.borrow_mut().items.push(item);
    }
    Ok(value)
}

fn read_map(
    ser: &Serializer,
    input: &mut Bytes,
    kind: MapKind,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let len = io::unpack_len(input)?;
    let handle = Rc::new(RefCell::new(MapValue {
        kind,
        entries: Vec::with_capacity(len),
    }));
    let value = Value::Map(handle.clone());
    register(refs, &value);
    for _ in 0..len {
        let key = read_value(ser, input, refs)?;
        let val = read_value(ser, input, refs)?;
        handle.borrow_mut().entries.push((key, val));
    }
    Ok(value)
}

fn read_tree_map(
    ser: &Serializer,
    input: &mut Bytes,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let len = io::unpack_len(input)?;
    let handle = Rc::new(RefCell::new(MapValue {
        kind: MapKind::Tree { comparator: Value::Null },
        entries: Vec::with_capacity(len),
    }));
    let value = Value::Map(handle.clone());
    register(refs, &value);
    let comparator = read_value(ser, input, refs)?;
    handle.borrow_mut().kind = MapKind::Tree { comparator };
    for _ in 0..len {
        let key = read_value(ser, input, refs)?;
        let val = read_value(ser, input, refs)?;
        handle.borrow_mut().entries.push((key, val));
    }
    Ok(value)
}

fn read_tuple(
    ser: &Serializer,
    input: &mut Bytes,
    arity: usize,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let handle = Rc::new(RefCell::new(TupleValue {
        items: Vec::with_capacity(arity),
    }));
    let value = Value::Tuple(handle.clone());
    register(refs, &value);
    for _ in 0..arity {
        let item = read_value(ser, input, refs)?;
        handle.borrow_mut().items.push(item);
    }
    Ok(value)
}

fn read_object_array(
    ser: &Serializer,
    input: &mut Bytes,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    let len = io::unpack_len(input)?;
    let component = io::read_class_token(input)?;
    let handle = Rc::new(RefCell::new(ObjectArray {
        component,
        items: Vec::with_capacity(len),
    }));
    let value = Value::Array(handle.clone());
    register(refs, &value);
    for _ in 0..len {
        let item = read_value(ser, input, refs)?;
        handle.borrow_mut().items.push(item);
    }
    Ok(value)
}

fn read_unrecognized(
    ser: &Serializer,
    input: &mut Bytes,
    tag: u8,
    refs: &mut Option<RefTracker>,
) -> Result<Value> {
    if let Some(ext) = ser.extension.as_ref() {
        return ext.read_unknown(input, tag, refs);
    }
    if tag == tags::RECORD {
        return Err(Error::Unsupported);
    }
    Err(Error::UnknownTag(tag))
}
