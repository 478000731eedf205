//! Encode half of the codec.
//!
//! `write_value` is the single dispatch point: it consults the reference
//! tracker, registers the value, classifies it by shape, and emits the
//! header plus payload. Scalar families pick the smallest header whose value
//! class contains the scalar — literals first, then MIN/MAX, then the
//! absolute-value `MF` forms, then the unsigned width-adaptive `F` forms,
//! then the full width.

use bigdecimal::BigDecimal;
use bytes::{BufMut, BytesMut};
use num_bigint::BigInt;

use crate::io;
use crate::known::Known;
use crate::refs::RefTracker;
use crate::tags;
use crate::value::{ListKind, ListValue, MapKind, MapValue, ObjectArray, SetKind, SetValue, TupleValue, Value};
use crate::{Error, Result, Serializer};

pub(crate) fn write_value(
    ser: &Serializer,
    out: &mut BytesMut,
    value: &Value,
    refs: &mut Option<RefTracker>,
) -> Result<()> {
    if let Some(tracker) = refs.as_mut() {
        if let Some(index) = tracker.index_of(value) {
            out.put_u8(tags::OBJECT_STACK);
            io::pack_u32(out, index);
            return Ok(());
        }
        tracker.push(value);
    }
    match value {
        Value::Null => out.put_u8(tags::NULL),
        Value::Bool(true) => out.put_u8(tags::BOOLEAN_TRUE),
        Value::Bool(false) => out.put_u8(tags::BOOLEAN_FALSE),
        Value::Int(v) => write_int(out, *v),
        Value::Long(v) => write_long(out, *v),
        Value::Byte(v) => write_byte(out, *v),
        Value::Char(v) => write_char(out, *v),
        Value::Short(v) => write_short(out, *v),
        Value::Float(v) => write_float(out, *v),
        Value::Double(v) => write_double(out, *v),
        Value::String(s) => write_string(out, s)?,
        Value::BigInt(v) => {
            out.put_u8(tags::BIGINTEGER);
            write_bigint_body(out, v)?;
        }
        Value::Decimal(v) => write_decimal(out, v)?,
        Value::Class(name) => {
            out.put_u8(tags::CLASS);
            io::write_class_token(out, name)?;
        }
        Value::Date(d) => {
            out.put_u8(tags::DATE);
            out.put_i64(d.timestamp_millis());
        }
        Value::Uuid(u) => {
            out.put_u8(tags::UUID);
            let (hi, lo) = u.as_u64_pair();
            out.put_u64(hi);
            out.put_u64(lo);
        }
        Value::Hi => out.put_u8(tags::HI),
        Value::Bytes(b) => write_bytes(out, b)?,
        Value::Bools(b) => write_bools(out, b)?,
        Value::Shorts(v) => write_shorts(out, v)?,
        Value::Chars(v) => write_chars(out, v)?,
        Value::Floats(v) => write_floats(out, v)?,
        Value::Doubles(v) => write_doubles(out, v)?,
        Value::Ints(v) => write_ints(out, v)?,
        Value::Longs(v) => write_longs(out, v)?,
        Value::Known(k) => write_known(ser, out, k)?,
        Value::List(handle) => {
            ensure_tracker(value, refs);
            write_list(ser, out, &handle.borrow(), refs)?;
        }
        Value::Set(handle) => {
            ensure_tracker(value, refs);
            write_set(ser, out, &handle.borrow(), refs)?;
        }
        Value::Map(handle) => {
            ensure_tracker(value, refs);
            write_map(ser, out, &handle.borrow(), refs)?;
        }
        Value::Tuple(handle) => {
            ensure_tracker(value, refs);
            write_tuple(ser, out, &handle.borrow(), refs)?;
        }
        Value::Array(handle) => {
            ensure_tracker(value, refs);
            write_object_array(ser, out, &handle.borrow(), refs)?;
        }
        Value::Record(_) => {
            ensure_tracker(value, refs);
            match ser.extension.as_ref() {
                Some(ext) => ext.write_unknown(out, value, refs)?,
                None => {
                    return Err(Error::Unserializable(
                        "user record without an installed extension codec".into(),
                    ))
                }
            }
        }
    }
    Ok(())
}

/// Composite values need the tracker; create it lazily and register the
/// value before any child is walked.
fn ensure_tracker(value: &Value, refs: &mut Option<RefTracker>) {
    if refs.is_none() {
        let mut tracker = RefTracker::new();
        tracker.push(value);
        *refs = Some(tracker);
    }
}

fn write_int(out: &mut BytesMut, val: i32) {
    if (-9..=16).contains(&val) {
        out.put_u8((i32::from(tags::INT_M9) + (val + 9)) as u8);
    } else if val == i32::MIN {
        out.put_u8(tags::INT_MIN_VALUE);
    } else if val == i32::MAX {
        out.put_u8(tags::INT_MAX_VALUE);
    } else if (0..=0xFF).contains(&val) {
        out.put_u8(tags::INT_F1);
        out.put_u8(val as u8);
    } else if (-0xFF..0).contains(&val) {
        out.put_u8(tags::INT_MF1);
        out.put_u8(val.unsigned_abs() as u8);
    } else if (0..=0xFFFF).contains(&val) {
        out.put_u8(tags::INT_F2);
        io::put_le(out, val as u64, 2);
    } else if (-0xFFFF..0).contains(&val) {
        out.put_u8(tags::INT_MF2);
        io::put_le(out, u64::from(val.unsigned_abs()), 2);
    } else if (0..=0xFF_FFFF).contains(&val) {
        out.put_u8(tags::INT_F3);
        io::put_le(out, val as u64, 3);
    } else if (-0xFF_FFFF..0).contains(&val) {
        out.put_u8(tags::INT_MF3);
        io::put_le(out, u64::from(val.unsigned_abs()), 3);
    } else {
        out.put_u8(tags::INT);
        out.put_i32(val);
    }
}

fn write_long(out: &mut BytesMut, val: i64) {
    if (-9..=16).contains(&val) {
        out.put_u8((i64::from(tags::LONG_M9) + (val + 9)) as u8);
        return;
    }
    if val == i64::MIN {
        out.put_u8(tags::LONG_MIN_VALUE);
        return;
    }
    if val == i64::MAX {
        out.put_u8(tags::LONG_MAX_VALUE);
        return;
    }
    let magnitude = val.unsigned_abs();
    let width = ((71 - magnitude.leading_zeros()) / 8) as usize;
    if width <= 7 {
        // F(x) = LONG_MF1 + 2x - 1, MF(x) = LONG_MF1 + 2x - 2
        let tag = if val >= 0 {
            tags::LONG_MF1 + 2 * width as u8 - 1
        } else {
            tags::LONG_MF1 + 2 * width as u8 - 2
        };
        out.put_u8(tag);
        io::put_le(out, magnitude, width);
    } else {
        out.put_u8(tags::LONG);
        out.put_i64(val);
    }
}

fn write_byte(out: &mut BytesMut, val: i8) {
    match val {
        -1 => out.put_u8(tags::BYTE_M1),
        0 => out.put_u8(tags::BYTE_0),
        1 => out.put_u8(tags::BYTE_1),
        _ => {
            out.put_u8(tags::BYTE);
            out.put_i8(val);
        }
    }
}

fn write_char(out: &mut BytesMut, val: u16) {
    if val == 0 {
        out.put_u8(tags::CHAR_0);
    } else if val == 1 {
        out.put_u8(tags::CHAR_1);
    } else if val <= 255 {
        out.put_u8(tags::CHAR_255);
        out.put_u8(val as u8);
    } else {
        out.put_u8(tags::CHAR);
        out.put_u16(val);
    }
}

fn write_short(out: &mut BytesMut, val: i16) {
    if val == -1 {
        out.put_u8(tags::SHORT_M1);
    } else if val == 0 {
        out.put_u8(tags::SHORT_0);
    } else if val == 1 {
        out.put_u8(tags::SHORT_1);
    } else if val > 0 && val < 255 {
        out.put_u8(tags::SHORT_255);
        out.put_u8(val as u8);
    } else if val < 0 && val > -255 {
        out.put_u8(tags::SHORT_M255);
        out.put_u8(val.unsigned_abs() as u8);
    } else {
        out.put_u8(tags::SHORT);
        out.put_i16(val);
    }
}

fn write_float(out: &mut BytesMut, val: f32) {
    if val == -1.0 {
        out.put_u8(tags::FLOAT_M1);
    } else if val == 0.0 {
        out.put_u8(tags::FLOAT_0);
    } else if val == 1.0 {
        out.put_u8(tags::FLOAT_1);
    } else if val >= 0.0 && val <= 255.0 && (val as i32) as f32 == val {
        out.put_u8(tags::FLOAT_255);
        out.put_u8(val as u8);
    } else if val >= f32::from(i16::MIN) && val <= f32::from(i16::MAX) && (val as i16) as f32 == val {
        out.put_u8(tags::FLOAT_SHORT);
        out.put_i16(val as i16);
    } else {
        out.put_u8(tags::FLOAT);
        out.put_f32(val);
    }
}

fn write_double(out: &mut BytesMut, val: f64) {
    if val == -1.0 {
        out.put_u8(tags::DOUBLE_M1);
    } else if val == 0.0 {
        out.put_u8(tags::DOUBLE_0);
    } else if val == 1.0 {
        out.put_u8(tags::DOUBLE_1);
    } else if val >= 0.0 && val <= 255.0 && (val as i32) as f64 == val {
        out.put_u8(tags::DOUBLE_255);
        out.put_u8(val as u8);
    } else if val >= f64::from(i16::MIN) && val <= f64::from(i16::MAX) && (val as i16) as f64 == val {
        out.put_u8(tags::DOUBLE_SHORT);
        out.put_i16(val as i16);
    } else if val >= f64::from(i32::MIN) && val <= f64::from(i32::MAX) && (val as i32) as f64 == val {
        out.put_u8(tags::DOUBLE_INT);
        out.put_i32(val as i32);
    } else {
        out.put_u8(tags::DOUBLE);
        out.put_f64(val);
    }
}

/// The payload is one packed integer per UTF-16 code unit, not UTF-8 bytes;
/// the length counts code units.
fn write_string(out: &mut BytesMut, s: &str) -> Result<()> {
    let len = s.encode_utf16().count();
    if len == 0 {
        out.put_u8(tags::STRING_0);
        return Ok(());
    }
    if len <= 10 {
        out.put_u8(tags::STRING_0 + len as u8);
    } else {
        out.put_u8(tags::STRING);
        pack_len(out, len)?;
    }
    for unit in s.encode_utf16() {
        io::pack_u32(out, u32::from(unit));
    }
    Ok(())
}

/// Header byte the encoder would choose for a plain scalar; `None` for
/// shapes whose header does not depend on the value. Used by the strict
/// reader and by conformance tests.
pub(crate) fn minimal_scalar_tag(value: &Value) -> Option<u8> {
    let mut scratch = BytesMut::with_capacity(12);
    match value {
        Value::Byte(v) => write_byte(&mut scratch, *v),
        Value::Short(v) => write_short(&mut scratch, *v),
        Value::Char(v) => write_char(&mut scratch, *v),
        Value::Int(v) => write_int(&mut scratch, *v),
        Value::Long(v) => write_long(&mut scratch, *v),
        Value::Float(v) => write_float(&mut scratch, *v),
        Value::Double(v) => write_double(&mut scratch, *v),
        Value::String(s) => return Some(string_tag(s.encode_utf16().count())),
        _ => return None,
    }
    Some(scratch[0])
}

fn string_tag(len: usize) -> u8 {
    if len == 0 {
        tags::STRING_0
    } else if len <= 10 {
        tags::STRING_0 + len as u8
    } else {
        tags::STRING
    }
}

fn write_bigint_body(out: &mut BytesMut, v: &BigInt) -> Result<()> {
    let bytes = v.to_signed_bytes_be();
    pack_len(out, bytes.len())?;
    out.put_slice(&bytes);
    Ok(())
}

fn write_decimal(out: &mut BytesMut, v: &BigDecimal) -> Result<()> {
    let (unscaled, scale) = v.as_bigint_and_exponent();
    let scale = i32::try_from(scale).map_err(|_| {
        Error::Unserializable(format!("decimal scale {scale} exceeds 32 bits"))
    })?;
    out.put_u8(tags::BIGDECIMAL);
    write_bigint_body(out, &unscaled)?;
    io::pack_u32(out, scale as u32);
    Ok(())
}

fn write_bytes(out: &mut BytesMut, b: &[u8]) -> Result<()> {
    let all_equal = !b.is_empty() && b.iter().all(|x| *x == b[0]);
    if all_equal {
        out.put_u8(tags::ARRAY_BYTE_ALL_EQUAL);
        pack_len(out, b.len())?;
        out.put_u8(b[0]);
    } else {
        out.put_u8(tags::ARRAY_BYTE);
        pack_len(out, b.len())?;
        out.put_slice(b);
    }
    Ok(())
}

/// Bit 0 of byte 0 is element 0; the count is the number of booleans, not
/// of payload bytes.
fn write_bools(out: &mut BytesMut, bits: &[bool]) -> Result<()> {
    out.put_u8(tags::ARRAY_BOOLEAN);
    pack_len(out, bits.len())?;
    let mut packed = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    out.put_slice(&packed);
    Ok(())
}

fn write_shorts(out: &mut BytesMut, vals: &[i16]) -> Result<()> {
    out.put_u8(tags::ARRAY_SHORT);
    pack_len(out, vals.len())?;
    for &v in vals {
        out.put_i16(v);
    }
    Ok(())
}

fn write_chars(out: &mut BytesMut, vals: &[u16]) -> Result<()> {
    out.put_u8(tags::ARRAY_CHAR);
    pack_len(out, vals.len())?;
    for &v in vals {
        out.put_u16(v);
    }
    Ok(())
}

fn write_floats(out: &mut BytesMut, vals: &[f32]) -> Result<()> {
    out.put_u8(tags::ARRAY_FLOAT);
    pack_len(out, vals.len())?;
    for &v in vals {
        out.put_f32(v);
    }
    Ok(())
}

fn write_doubles(out: &mut BytesMut, vals: &[f64]) -> Result<()> {
    out.put_u8(tags::ARRAY_DOUBLE);
    pack_len(out, vals.len())?;
    for &v in vals {
        out.put_f64(v);
    }
    Ok(())
}

fn write_ints(out: &mut BytesMut, vals: &[i32]) -> Result<()> {
    let mut min = i32::MAX;
    let mut max = i32::MIN;
    for &v in vals {
        min = min.min(v);
        max = max.max(v);
    }
    if i32::from(i8::MIN) <= min && max <= i32::from(i8::MAX) {
        out.put_u8(tags::ARRAY_INT_BYTE);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i8(v as i8);
        }
    } else if i32::from(i16::MIN) <= min && max <= i32::from(i16::MAX) {
        out.put_u8(tags::ARRAY_INT_SHORT);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i16(v as i16);
        }
    } else if 0 <= min {
        out.put_u8(tags::ARRAY_INT_PACKED);
        pack_len(out, vals.len())?;
        for &v in vals {
            io::pack_u32(out, v as u32);
        }
    } else {
        out.put_u8(tags::ARRAY_INT);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i32(v);
        }
    }
    Ok(())
}

fn write_longs(out: &mut BytesMut, vals: &[i64]) -> Result<()> {
    let mut min = i64::MAX;
    let mut max = i64::MIN;
    for &v in vals {
        min = min.min(v);
        max = max.max(v);
    }
    if i64::from(i8::MIN) <= min && max <= i64::from(i8::MAX) {
        out.put_u8(tags::ARRAY_LONG_BYTE);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i8(v as i8);
        }
    } else if i64::from(i16::MIN) <= min && max <= i64::from(i16::MAX) {
        out.put_u8(tags::ARRAY_LONG_SHORT);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i16(v as i16);
        }
    } else if 0 <= min {
        out.put_u8(tags::ARRAY_LONG_PACKED);
        pack_len(out, vals.len())?;
        for &v in vals {
            io::pack_u64(out, v as u64);
        }
    } else if i64::from(i32::MIN) <= min && max <= i64::from(i32::MAX) {
        out.put_u8(tags::ARRAY_LONG_INT);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i32(v as i32);
        }
    } else {
        out.put_u8(tags::ARRAY_LONG);
        pack_len(out, vals.len())?;
        for &v in vals {
            out.put_i64(v);
        }
    }
    Ok(())
}

fn write_known(ser: &Serializer, out: &mut BytesMut, known: &Known) -> Result<()> {
    out.put_u8(tags::KNOWN);
    io::pack_u32(out, known.sub_id());
    // Tuple-key components travel with a detached tracker on both sides.
    match known {
        Known::Tuple2Keys(k) => {
            write_value(ser, out, &k.a_comparator, &mut None)?;
            write_value(ser, out, &k.a_codec, &mut None)?;
            write_value(ser, out, &k.b_codec, &mut None)?;
        }
        Known::Tuple3Keys(k) => {
            write_value(ser, out, &k.a_comparator, &mut None)?;
            write_value(ser, out, &k.b_comparator, &mut None)?;
            write_value(ser, out, &k.a_codec, &mut None)?;
            write_value(ser, out, &k.b_codec, &mut None)?;
            write_value(ser, out, &k.c_codec, &mut None)?;
        }
        Known::Tuple4Keys(k) => {
            write_value(ser, out, &k.a_comparator, &mut None)?;
            write_value(ser, out, &k.b_comparator, &mut None)?;
            write_value(ser, out, &k.c_comparator, &mut None)?;
            write_value(ser, out, &k.a_codec, &mut None)?;
            write_value(ser, out, &k.b_codec, &mut None)?;
            write_value(ser, out, &k.c_codec, &mut None)?;
            write_value(ser, out, &k.d_codec, &mut None)?;
        }
        _ => {}
    }
    Ok(())
}

/// Eligible slot for the packed-long fast paths: null, or a non-negative
/// long (the upper-bound sentinel `i64::MAX` included).
fn packable_long(item: &Value) -> bool {
    match item {
        Value::Null => true,
        Value::Long(v) => *v >= 0,
        _ => false,
    }
}

/// Null is 0; a long travels as value + 1, wrapping so the `i64::MAX`
/// sentinel survives.
fn pack_long_slot(out: &mut BytesMut, item: &Value) {
    match item {
        Value::Long(v) => io::pack_u64(out, (*v as u64).wrapping_add(1)),
        _ => io::pack_u64(out, 0),
    }
}

fn write_list(
    ser: &Serializer,
    out: &mut BytesMut,
    list: &ListValue,
    refs: &mut Option<RefTracker>,
) -> Result<()> {
    match list.kind {
        ListKind::Array => {
            // Lists of on-disk record references are the dominant stored
            // shape; keep them one byte of length plus packed slots.
            if list.items.len() < 255 && list.items.iter().all(packable_long) {
                out.put_u8(tags::ARRAY_LIST_PACKED_LONG);
                out.put_u8(list.items.len() as u8);
                for item in &list.items {
                    pack_long_slot(out, item);
                }
            } else {
                out.put_u8(tags::ARRAY_LIST);
                pack_len(out, list.items.len())?;
                for item in &list.items {
                    write_value(ser, out, item, refs)?;
                }
            }
        }
        ListKind::Linked => {
            out.put_u8(tags::LINKED_LIST);
            pack_len(out, list.items.len())?;
            for item in &list.items {
                write_value(ser, out, item, refs)?;
            }
        }
    }
    Ok(())
}

fn write_set(
    ser: &Serializer,
    out: &mut BytesMut,
    set: &SetValue,
    refs: &mut Option<RefTracker>,
) -> Result<()> {
    match &set.kind {
        SetKind::Hash => out.put_u8(tags::HASH_SET),
        SetKind::LinkedHash => out.put_u8(tags::LINKED_HASH_SET),
        SetKind::Tree { .. } => out.put_u8(tags::TREE_SET),
    }
    pack_len(out, set.items.len())?;
    if let SetKind::Tree { comparator } = &set.kind {
        write_value(ser, out, comparator, refs)?;
    }
    for item in &set.items {
        write_value(ser, out, item, refs)?;
    }
    Ok(())
}

fn write_map(
    ser: &Serializer,
    out: &mut BytesMut,
    map: &MapValue,
    refs: &mut Option<RefTracker>,
) -> Result<()> {
    match &map.kind {
        MapKind::Hash => out.put_u8(tags::HASH_MAP),
        MapKind::LinkedHash => out.put_u8(tags::LINKED_HASH_MAP),
        MapKind::Tree { .. } => out.put_u8(tags::TREE_MAP),
        MapKind::Properties => out.put_u8(tags::PROPERTIES),
    }
    pack_len(out, map.entries.len())?;
    if let MapKind::Tree { comparator } = &map.kind {
        write_value(ser, out, comparator, refs)?;
    }
    for (key, val) in &map.entries {
        write_value(ser, out, key, refs)?;
        write_value(ser, out, val, refs)?;
    }
    Ok(())
}

fn write_tuple(
    ser: &Serializer,
    out: &mut BytesMut,
    tuple: &TupleValue,
    refs: &mut Option<RefTracker>,
) -> Result<()> {
    match tuple.items.len() {
        2 => out.put_u8(tags::TUPLE2),
        3 => out.put_u8(tags::TUPLE3),
        4 => out.put_u8(tags::TUPLE4),
        arity => {
            return Err(Error::Unserializable(format!(
                "tuple arity {arity} is not encodable"
            )))
        }
    }
    for item in &tuple.items {
        write_value(ser, out, item, refs)?;
    }
    Ok(())
}

fn write_object_array(
    ser: &Serializer,
    out: &mut BytesMut,
    array: &ObjectArray,
    refs: &mut Option<RefTracker>,
) -> Result<()> {
    let items = &array.items;
    if items.iter().all(|v| matches!(v, Value::Null)) {
        out.put_u8(tags::ARRAY_OBJECT_ALL_NULL);
        pack_len(out, items.len())?;
        io::write_class_token(out, &array.component)?;
    } else if items.len() <= 255 && items.iter().all(packable_long) {
        out.put_u8(tags::ARRAY_OBJECT_PACKED_LONG);
        out.put_u8(items.len() as u8);
        for item in items {
            pack_long_slot(out, item);
        }
    } else if ser.leaf_arrays && items.iter().all(|v| !v.is_composite()) {
        out.put_u8(tags::ARRAY_OBJECT_NO_REFS);
        pack_len(out, items.len())?;
        io::write_class_token(out, &array.component)?;
        for item in items {
            write_value(ser, out, item, &mut None)?;
        }
    } else {
        out.put_u8(tags::ARRAY_OBJECT);
        pack_len(out, items.len())?;
        io::write_class_token(out, &array.component)?;
        for item in items {
            write_value(ser, out, item, refs)?;
        }
    }
    Ok(())
}

fn pack_len(out: &mut BytesMut, len: usize) -> Result<()> {
    let len = u32::try_from(len).map_err(|_| {
        Error::Unserializable(format!("length {len} exceeds the packed 32-bit range"))
    })?;
    io::pack_u32(out, len);
    Ok(())
}
