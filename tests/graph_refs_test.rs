//! Identity preservation: shared sub-objects and cycles survive the round
//! trip as back-references. Structural equality cannot terminate on cyclic
//! graphs, so these tests compare handle identity instead.

use tagpack::{decode, encode, tags, RefTracker, Value};

fn round_trip(value: &Value) -> Value {
    let mut bytes = encode(value).unwrap();
    decode(&mut bytes).unwrap()
}

fn list_items(value: &Value) -> Vec<Value> {
    match value {
        Value::List(handle) => handle.borrow().items.clone(),
        other => panic!("expected a list, got {}", other.type_name()),
    }
}

fn same_object(a: &Value, b: &Value) -> bool {
    a.identity().is_some() && a.identity() == b.identity()
}

#[test]
fn test_shared_list_decodes_to_one_object() {
    let inner = Value::array_list(vec![Value::Int(1), "x".into()]);
    let outer = Value::array_list(vec![inner.clone(), inner.clone()]);

    let back = round_trip(&outer);
    let items = list_items(&back);
    assert_eq!(items.len(), 2);
    assert!(same_object(&items[0], &items[1]), "sharing was lost");
    assert_eq!(items[0], Value::array_list(vec![Value::Int(1), "x".into()]));
}

#[test]
fn test_self_referential_list() {
    let list = Value::array_list(vec![]);
    if let Value::List(handle) = &list {
        handle.borrow_mut().items.push(list.clone());
    }

    let back = round_trip(&list);
    let items = list_items(&back);
    assert_eq!(items.len(), 1);
    assert!(same_object(&back, &items[0]), "cycle was not reconstructed");
}

#[test]
fn test_mutual_cycle_between_containers() {
    let a = Value::array_list(vec![]);
    let b = Value::array_list(vec![a.clone()]);
    if let Value::List(handle) = &a {
        handle.borrow_mut().items.push(b.clone());
    }

    let back = round_trip(&a);
    let a_items = list_items(&back);
    let b_items = list_items(&a_items[0]);
    assert!(same_object(&back, &b_items[0]), "mutual cycle broken");
}

#[test]
fn test_map_containing_itself_as_value() {
    let map = Value::hash_map(vec![]);
    if let Value::Map(handle) = &map {
        handle.borrow_mut().entries.push(("self".into(), map.clone()));
    }

    let back = round_trip(&map);
    match &back {
        Value::Map(handle) => {
            let entries = handle.borrow();
            assert_eq!(entries.entries.len(), 1);
            assert_eq!(entries.entries[0].0, Value::from("self"));
            assert!(same_object(&back, &entries.entries[0].1));
        }
        other => panic!("expected a map, got {}", other.type_name()),
    }
}

#[test]
fn test_shared_tuple_inside_list() {
    let pair = Value::tuple2(Value::Int(1), Value::Int(2));
    let outer = Value::array_list(vec![pair.clone(), Value::Null, pair.clone()]);

    let back = round_trip(&outer);
    let items = list_items(&back);
    assert!(same_object(&items[0], &items[2]));
    assert_eq!(items[1], Value::Null);
}

#[test]
fn test_tuple_sharing_across_fields() {
    // both tuple fields point at one shared set
    let set = Value::hash_set(vec![Value::Int(5)]);
    let tuple = Value::tuple2(set.clone(), set.clone());

    let back = round_trip(&tuple);
    match back {
        Value::Tuple(handle) => {
            let tuple = handle.borrow();
            assert!(same_object(&tuple.items[0], &tuple.items[1]));
        }
        other => panic!("expected a tuple, got {}", other.type_name()),
    }
}

#[test]
fn test_shared_packed_long_list_keeps_index_alignment() {
    // the inner list takes the packed fast path on its first occurrence and
    // a back-reference on its second; both must resolve to one object
    let inner = Value::array_list(vec![Value::Long(1), Value::Long(2)]);
    let outer = Value::array_list(vec![inner.clone(), inner.clone()]);

    let raw = encode(&outer).unwrap();
    assert!(
        raw.contains(&tags::OBJECT_STACK),
        "second occurrence should be a back-reference"
    );

    let back = round_trip(&outer);
    let items = list_items(&back);
    assert!(same_object(&items[0], &items[1]));
}

#[test]
fn test_scalars_are_not_back_referenced() {
    // equal strings have no identity; they are written out twice
    let s = Value::from("repeated");
    let outer = Value::array_list(vec![s.clone(), s.clone()]);
    let raw = encode(&outer).unwrap();
    assert!(!raw.contains(&tags::OBJECT_STACK));
    let back = round_trip(&outer);
    assert_eq!(back, outer);
}

#[test]
fn test_sharing_below_an_object_array() {
    let shared = Value::linked_list(vec![Value::Int(1)]);
    let array = Value::object_array("db.Node", vec![shared.clone(), shared.clone()]);

    let back = round_trip(&array);
    match back {
        Value::Array(handle) => {
            let array = handle.borrow();
            assert!(same_object(&array.items[0], &array.items[1]));
        }
        other => panic!("expected an object array, got {}", other.type_name()),
    }
}

#[test]
fn test_deep_sharing_through_mixed_containers() {
    let shared_map = Value::tree_map(Value::Null, vec![(Value::Int(1), "v".into())]);
    let value = Value::array_list(vec![
        Value::hash_set(vec![shared_map.clone()]),
        Value::tuple3(Value::Null, shared_map.clone(), Value::Int(9)),
    ]);

    let back = round_trip(&value);
    let items = list_items(&back);
    let from_set = match &items[0] {
        Value::Set(handle) => handle.borrow().items[0].clone(),
        other => panic!("expected a set, got {}", other.type_name()),
    };
    let from_tuple = match &items[1] {
        Value::Tuple(handle) => handle.borrow().items[1].clone(),
        other => panic!("expected a tuple, got {}", other.type_name()),
    };
    assert!(same_object(&from_set, &from_tuple));
}

#[test]
fn test_tracker_reports_back_refs() {
    let mut tracker = RefTracker::new();
    let list = Value::array_list(vec![]);
    tracker.push(&list);
    assert!(!tracker.saw_back_refs());
    assert_eq!(tracker.index_of(&list), Some(0));
    assert!(tracker.saw_back_refs());

    let other = Value::array_list(vec![]);
    assert_eq!(tracker.index_of(&other), None);
    assert!(tracker.get(0).is_ok());
    assert!(tracker.get(7).is_err());
}

#[test]
fn test_tracker_leaf_slots_are_not_referenceable() {
    let mut tracker = RefTracker::new();
    tracker.push(&Value::Int(5));
    assert_eq!(tracker.index_of(&Value::Int(5)), None);
    assert!(tracker.get(0).is_err());
}
