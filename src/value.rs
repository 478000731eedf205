//! The closed universe of values the codec understands.
//!
//! Scalars and primitive arrays are held inline. Every shape that can take
//! part in a shared or cyclic object graph (lists, sets, maps, tuples,
//! object arrays, user records) lives behind a [`Shared`] handle: cloning
//! such a `Value` clones the handle, not the contents, and two clones of the
//! same handle are *the same object* as far as reference tracking is
//! concerned.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::known::Known;

/// Shared, mutable container cell with observable identity.
pub type Shared<T> = Rc<RefCell<T>>;

/// Component token the packed-long object-array header implies: a boxed
/// 64-bit integer.
pub const CLASS_LONG: &str = "long";

/// One value of the codec's universe.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    /// A 16-bit code unit; distinct from the integer shapes.
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(BigInt),
    Decimal(BigDecimal),
    String(String),
    /// Instant with millisecond precision.
    Date(DateTime<Utc>),
    Uuid(Uuid),
    /// Opaque class token; the host's resolver gives it meaning.
    Class(String),
    /// Upper-bound sentinel that sorts above every other value.
    Hi,
    Bytes(Vec<u8>),
    Bools(Vec<bool>),
    Shorts(Vec<i16>),
    Chars(Vec<u16>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    /// Well-known library object from the registry.
    Known(Known),
    List(Shared<ListValue>),
    Set(Shared<SetValue>),
    Map(Shared<MapValue>),
    Tuple(Shared<TupleValue>),
    Array(Shared<ObjectArray>),
    /// User record; only an installed [`Extension`](crate::Extension) can
    /// encode or decode it.
    Record(RecordRef),
}

/// Ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    pub kind: ListKind,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Random-access list.
    Array,
    /// Node-linked list.
    Linked,
}

/// Set of values; element order is the iteration order that was serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct SetValue {
    pub kind: SetKind,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetKind {
    Hash,
    /// Hash set that preserves insertion order across a round trip.
    LinkedHash,
    /// Ordered set; `comparator` is `Value::Null` for natural ordering.
    Tree { comparator: Value },
}

/// Key→value mapping; entries are kept in iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    pub kind: MapKind,
    pub entries: Vec<(Value, Value)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapKind {
    Hash,
    LinkedHash,
    /// Ordered map; `comparator` is `Value::Null` for natural ordering.
    Tree { comparator: Value },
    /// String→string property table.
    Properties,
}

/// Fixed-arity record; only arities 2..=4 are encodable.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleValue {
    pub items: Vec<Value>,
}

/// Heterogeneous array carrying a component-type class token.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectArray {
    pub component: String,
    pub items: Vec<Value>,
}

/// Identity-compared handle to a user record. The core never looks inside;
/// an extension downcasts it.
#[derive(Clone)]
pub struct RecordRef(pub Rc<dyn Any>);

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordRef({:p})", Rc::as_ptr(&self.0))
    }
}

fn shared<T>(inner: T) -> Shared<T> {
    Rc::new(RefCell::new(inner))
}

impl Value {
    pub fn array_list(items: Vec<Value>) -> Value {
        Value::List(shared(ListValue { kind: ListKind::Array, items }))
    }

    pub fn linked_list(items: Vec<Value>) -> Value {
        Value::List(shared(ListValue { kind: ListKind::Linked, items }))
    }

    pub fn hash_set(items: Vec<Value>) -> Value {
        Value::Set(shared(SetValue { kind: SetKind::Hash, items }))
    }

    pub fn linked_hash_set(items: Vec<Value>) -> Value {
        Value::Set(shared(SetValue { kind: SetKind::LinkedHash, items }))
    }

    pub fn tree_set(comparator: Value, items: Vec<Value>) -> Value {
        Value::Set(shared(SetValue { kind: SetKind::Tree { comparator }, items }))
    }

    pub fn hash_map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(shared(MapValue { kind: MapKind::Hash, entries }))
    }

    pub fn linked_hash_map(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(shared(MapValue { kind: MapKind::LinkedHash, entries }))
    }

    pub fn tree_map(comparator: Value, entries: Vec<(Value, Value)>) -> Value {
        Value::Map(shared(MapValue { kind: MapKind::Tree { comparator }, entries }))
    }

    pub fn properties(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(shared(MapValue { kind: MapKind::Properties, entries }))
    }

    pub fn tuple2(a: Value, b: Value) -> Value {
        Value::Tuple(shared(TupleValue { items: vec![a, b] }))
    }

    pub fn tuple3(a: Value, b: Value, c: Value) -> Value {
        Value::Tuple(shared(TupleValue { items: vec![a, b, c] }))
    }

    pub fn tuple4(a: Value, b: Value, c: Value, d: Value) -> Value {
        Value::Tuple(shared(TupleValue { items: vec![a, b, c, d] }))
    }

    pub fn object_array(component: impl Into<String>, items: Vec<Value>) -> Value {
        Value::Array(shared(ObjectArray { component: component.into(), items }))
    }

    pub fn record(inner: Rc<dyn Any>) -> Value {
        Value::Record(RecordRef(inner))
    }

    /// Address of the shared handle for composite values; `None` for values
    /// without observable identity.
    pub fn identity(&self) -> Option<*const ()> {
        match self {
            Value::List(h) => Some(Rc::as_ptr(h).cast()),
            Value::Set(h) => Some(Rc::as_ptr(h).cast()),
            Value::Map(h) => Some(Rc::as_ptr(h).cast()),
            Value::Tuple(h) => Some(Rc::as_ptr(h).cast()),
            Value::Array(h) => Some(Rc::as_ptr(h).cast()),
            Value::Record(r) => Some(Rc::as_ptr(&r.0).cast::<()>()),
            _ => None,
        }
    }

    /// True for shapes that recurse into child values and therefore need the
    /// reference tracker.
    pub fn is_composite(&self) -> bool {
        self.identity().is_some()
    }

    /// Short name of the value's shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::BigInt(_) => "bigint",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Uuid(_) => "uuid",
            Value::Class(_) => "class",
            Value::Hi => "hi",
            Value::Bytes(_) => "byte[]",
            Value::Bools(_) => "boolean[]",
            Value::Shorts(_) => "short[]",
            Value::Chars(_) => "char[]",
            Value::Floats(_) => "float[]",
            Value::Doubles(_) => "double[]",
            Value::Ints(_) => "int[]",
            Value::Longs(_) => "long[]",
            Value::Known(_) => "known",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "object[]",
            Value::Record(_) => "record",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_owned())
    }
}
