//! The user-record seam: the core refuses records on its own and hands the
//! `RECORD` header to an installed extension codec.

use std::rc::Rc;

use bytes::{BufMut, Bytes, BytesMut};
use tagpack::io::{pack_u64, unpack_u64};
use tagpack::{tags, Error, Extension, RefTracker, Result, Serializer, Value};

#[derive(Debug, PartialEq)]
struct Counter {
    hits: u64,
}

/// Toy field codec for `Counter`.
struct CounterCodec;

impl Extension for CounterCodec {
    fn write_unknown(
        &self,
        out: &mut BytesMut,
        value: &Value,
        _refs: &mut Option<RefTracker>,
    ) -> Result<()> {
        if let Value::Record(record) = value {
            if let Some(counter) = record.0.downcast_ref::<Counter>() {
                out.put_u8(tags::RECORD);
                pack_u64(out, counter.hits);
                return Ok(());
            }
        }
        Err(Error::Unserializable(format!(
            "no handler for a {}",
            value.type_name()
        )))
    }

    fn read_unknown(
        &self,
        input: &mut Bytes,
        tag: u8,
        _refs: &mut Option<RefTracker>,
    ) -> Result<Value> {
        if tag == tags::RECORD {
            let hits = unpack_u64(input)?;
            return Ok(Value::record(Rc::new(Counter { hits })));
        }
        Err(Error::UnknownTag(tag))
    }
}

fn expect_counter(value: &Value, hits: u64) {
    match value {
        Value::Record(record) => {
            let counter = record.0.downcast_ref::<Counter>().expect("wrong record type");
            assert_eq!(counter.hits, hits);
        }
        other => panic!("expected a record, got {}", other.type_name()),
    }
}

#[test]
fn test_record_requires_extension() {
    let record = Value::record(Rc::new(Counter { hits: 3 }));
    assert!(matches!(
        tagpack::encode(&record),
        Err(Error::Unserializable(_))
    ));
}

#[test]
fn test_record_round_trip_through_extension() {
    let codec = Serializer::new().with_extension(Box::new(CounterCodec));
    let record = Value::record(Rc::new(Counter { hits: 42 }));

    let mut out = BytesMut::new();
    codec.write(&mut out, &record).unwrap();
    assert_eq!(out[0], tags::RECORD);

    let mut input = out.freeze();
    let back = codec.read(&mut input).unwrap();
    expect_counter(&back, 42);
}

#[test]
fn test_record_inside_container() {
    let codec = Serializer::new().with_extension(Box::new(CounterCodec));
    let value = Value::array_list(vec![
        Value::Int(1),
        Value::record(Rc::new(Counter { hits: 7 })),
    ]);

    let mut out = BytesMut::new();
    codec.write(&mut out, &value).unwrap();
    let mut input = out.freeze();
    let back = codec.read(&mut input).unwrap();
    match back {
        Value::List(handle) => {
            let list = handle.borrow();
            assert_eq!(list.items[0], Value::Int(1));
            expect_counter(&list.items[1], 7);
        }
        other => panic!("expected a list, got {}", other.type_name()),
    }
}

#[test]
fn test_shared_record_becomes_back_reference() {
    let codec = Serializer::new().with_extension(Box::new(CounterCodec));
    let record = Value::record(Rc::new(Counter { hits: 9 }));
    let value = Value::array_list(vec![record.clone(), record.clone()]);

    let mut out = BytesMut::new();
    codec.write(&mut out, &value).unwrap();
    assert!(out.contains(&tags::OBJECT_STACK));

    let mut input = out.freeze();
    let back = codec.read(&mut input).unwrap();
    match back {
        Value::List(handle) => {
            let list = handle.borrow();
            assert_eq!(list.items[0].identity(), list.items[1].identity());
            expect_counter(&list.items[0], 9);
        }
        other => panic!("expected a list, got {}", other.type_name()),
    }
}

#[test]
fn test_extension_claims_reserved_tag() {
    struct ReservedCodec;
    impl Extension for ReservedCodec {
        fn read_unknown(
            &self,
            _input: &mut Bytes,
            tag: u8,
            _refs: &mut Option<RefTracker>,
        ) -> Result<Value> {
            if tag == 200 {
                return Ok(Value::Int(200));
            }
            Err(Error::UnknownTag(tag))
        }
    }

    let codec = Serializer::new().with_extension(Box::new(ReservedCodec));
    let mut input = Bytes::from_static(&[200]);
    assert_eq!(codec.read(&mut input).unwrap(), Value::Int(200));

    let mut input = Bytes::from_static(&[201]);
    assert!(matches!(codec.read(&mut input), Err(Error::UnknownTag(201))));
}
