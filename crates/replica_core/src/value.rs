//! Value representation.
//!
//! Scalars are stored inline; everything with an identity of its own lives on
//! the [`Heap`](crate::heap::Heap) and is referenced through `Value::Obj`.

use crate::gc::ObjectId;
use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;
pub type FastHashSet<K> = HashSet<K, RandomState>;
pub type FastIndexMap<K, V> = IndexMap<K, V, RandomState>;
pub type FastIndexSet<K> = IndexSet<K, RandomState>;

/// Fixed seeds keep hashing, and therefore any hash-ordered iteration, stable
/// across runs.
pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_new<K: Eq + Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(fast_hasher())
}

pub fn fast_set_new<K: Eq + Hash>() -> FastHashSet<K> {
    HashSet::with_hasher(fast_hasher())
}

pub fn index_map_with_capacity<K: Eq + Hash, V>(cap: usize) -> FastIndexMap<K, V> {
    IndexMap::with_capacity_and_hasher(cap, fast_hasher())
}

pub fn index_set_with_capacity<K: Eq + Hash>(cap: usize) -> FastIndexSet<K> {
    IndexSet::with_capacity_and_hasher(cap, fast_hasher())
}

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// An opaque identifier-like scalar.
///
/// Every call to [`Symbol::new`] produces a symbol distinct from all others,
/// even when the descriptions match. Symbols are never duplicated by cloning.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    pub fn new(description: &str) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: Arc::from(description),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})#{}", self.description, self.id)
    }
}

/// Key of a record entry: plain text or a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Text(Arc<str>),
    Symbol(Symbol),
}

impl RecordKey {
    pub fn text(s: &str) -> Self {
        RecordKey::Text(Arc::from(s))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordKey::Text(s) => Some(s),
            RecordKey::Symbol(_) => None,
        }
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        RecordKey::text(s)
    }
}

impl From<Symbol> for RecordKey {
    fn from(s: Symbol) -> Self {
        RecordKey::Symbol(s)
    }
}

/// A value in the clonable universe.
///
/// Equality is same-value-zero: floats compare numerically except that all
/// NaNs are equal, text compares by content, symbols and objects by identity.
#[derive(Clone, Default)]
pub enum Value {
    /// No value at all, distinct from `Null`.
    #[default]
    Void,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Symbol(Symbol),
    Obj(ObjectId),
}

const CANONICAL_NAN: u64 = 0x7ff8000000000000;

#[inline]
fn float_key(f: f64) -> u64 {
    if f.is_nan() {
        CANONICAL_NAN
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    #[inline]
    pub fn is_obj(&self) -> bool {
        matches!(self, Value::Obj(_))
    }

    #[inline]
    pub fn as_obj_id(&self) -> Option<ObjectId> {
        match self {
            Value::Obj(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the inline variant. Objects report `"object"`; ask the heap
    /// for their precise kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Obj(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Void => state.write_u8(0),
            Value::Null => state.write_u8(1),
            Value::Bool(b) => {
                state.write_u8(2);
                b.hash(state);
            }
            Value::Int(i) => {
                state.write_u8(3);
                i.hash(state);
            }
            Value::Float(f) => {
                state.write_u8(4);
                float_key(*f).hash(state);
            }
            Value::Str(s) => {
                state.write_u8(5);
                s.as_bytes().hash(state);
            }
            Value::Symbol(s) => {
                state.write_u8(6);
                s.hash(state);
            }
            Value::Obj(id) => {
                state.write_u8(7);
                id.hash(state);
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(s) => write!(f, "{s:?}"),
            Value::Obj(id) => write!(f, "Obj({id})"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Obj(id)
    }
}
