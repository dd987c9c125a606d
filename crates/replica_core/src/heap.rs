//! Managed objects and the heap that owns them.

use crate::gc::ObjectId;
use crate::pattern::{Pattern, PatternError};
use crate::value::{
    FastIndexMap, FastIndexSet, RecordKey, Value, index_map_with_capacity, index_set_with_capacity,
};
use std::fmt;
use std::sync::Arc;

/// A point in time, as milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Temporal {
    pub epoch_millis: i64,
}

/// String- or symbol-keyed mapping in insertion order.
///
/// `proto` links the record to another object it inherits behaviour from.
/// The link is not part of the record's own data.
#[derive(Clone, Debug)]
pub struct Record {
    pub entries: FastIndexMap<RecordKey, Value>,
    pub proto: Option<ObjectId>,
}

impl Record {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: index_map_with_capacity(cap),
            proto: None,
        }
    }

    pub fn insert(&mut self, key: impl Into<RecordKey>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Lookup by text key.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.entries.get(&RecordKey::text(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// Value-keyed mapping in insertion order. Object keys match by identity.
#[derive(Clone, Debug)]
pub struct Dictionary {
    pub entries: FastIndexMap<Value, Value>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: index_map_with_capacity(cap),
        }
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct members in insertion order. Object members match by identity.
#[derive(Clone, Debug)]
pub struct UniqueSet {
    pub members: FastIndexSet<Value>,
}

impl UniqueSet {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            members: index_set_with_capacity(cap),
        }
    }

    pub fn insert(&mut self, value: Value) -> bool {
        self.members.insert(value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.members.contains(value)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for UniqueSet {
    fn default() -> Self {
        Self::new()
    }
}

pub type NativeFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Behaviour value. Compared and shared by identity only.
#[derive(Clone)]
pub struct Function {
    pub name: Arc<str>,
    pub func: Arc<NativeFn>,
}

impl Function {
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    File,
    Socket,
}

impl HandleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleKind::File => "file",
            HandleKind::Socket => "socket",
        }
    }
}

/// An open OS resource. Models identity, not data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle {
    pub kind: HandleKind,
    pub descriptor: i64,
}

#[derive(Clone, Debug)]
pub enum ManagedObject {
    Temporal(Temporal),
    Pattern(Pattern),
    Sequence(Vec<Value>),
    Record(Record),
    Dictionary(Dictionary),
    UniqueSet(UniqueSet),
    Function(Function),
    Handle(Handle),
}

/// Field-less mirror of [`ManagedObject`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Temporal,
    Pattern,
    Sequence,
    Record,
    Dictionary,
    UniqueSet,
    Function,
    Handle,
}

impl ObjectKind {
    /// Composites carry their own identity and contain other values.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            ObjectKind::Sequence | ObjectKind::Record | ObjectKind::Dictionary | ObjectKind::UniqueSet
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Temporal => "temporal",
            ObjectKind::Pattern => "pattern",
            ObjectKind::Sequence => "sequence",
            ObjectKind::Record => "record",
            ObjectKind::Dictionary => "dictionary",
            ObjectKind::UniqueSet => "unique set",
            ObjectKind::Function => "function",
            ObjectKind::Handle => "handle",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ManagedObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ManagedObject::Temporal(_) => ObjectKind::Temporal,
            ManagedObject::Pattern(_) => ObjectKind::Pattern,
            ManagedObject::Sequence(_) => ObjectKind::Sequence,
            ManagedObject::Record(_) => ObjectKind::Record,
            ManagedObject::Dictionary(_) => ObjectKind::Dictionary,
            ManagedObject::UniqueSet(_) => ObjectKind::UniqueSet,
            ManagedObject::Function(_) => ObjectKind::Function,
            ManagedObject::Handle(_) => ObjectKind::Handle,
        }
    }

    /// Visit every value this object holds on to, including the record
    /// prototype link.
    pub fn for_each_child(&self, mut f: impl FnMut(&Value)) {
        match self {
            ManagedObject::Sequence(items) => items.iter().for_each(f),
            ManagedObject::Record(rec) => {
                rec.entries.values().for_each(&mut f);
                if let Some(proto) = rec.proto {
                    f(&Value::Obj(proto));
                }
            }
            ManagedObject::Dictionary(dict) => {
                for (k, v) in &dict.entries {
                    f(k);
                    f(v);
                }
            }
            ManagedObject::UniqueSet(set) => set.members.iter().for_each(f),
            ManagedObject::Temporal(_)
            | ManagedObject::Pattern(_)
            | ManagedObject::Function(_)
            | ManagedObject::Handle(_) => {}
        }
    }
}

/// Owner of every identity-bearing object.
///
/// Slots freed by [`Heap::collect`] are reused by later allocations, so an
/// `ObjectId` held across a collection may come to name a different object.
pub struct Heap {
    objects: Vec<Option<ManagedObject>>,
    free_list: Vec<usize>,
    marks: Vec<u64>,
}

macro_rules! typed_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&self, v: &Value) -> Option<&$ty> {
            match self.get(v.as_obj_id()?)? {
                ManagedObject::$variant(x) => Some(x),
                _ => None,
            }
        }

        pub fn $get_mut(&mut self, v: &Value) -> Option<&mut $ty> {
            match self.get_mut(v.as_obj_id()?)? {
                ManagedObject::$variant(x) => Some(x),
                _ => None,
            }
        }
    };
}

impl Heap {
    pub fn new() -> Self {
        Self {
            objects: Vec::with_capacity(64),
            free_list: Vec::new(),
            marks: Vec::new(),
        }
    }

    /// Allocate a managed object on the heap.
    pub fn alloc(&mut self, obj: ManagedObject) -> ObjectId {
        if let Some(id) = self.free_list.pop() {
            self.objects[id] = Some(obj);
            ObjectId(id)
        } else {
            let id = self.objects.len();
            self.objects.push(Some(obj));
            ObjectId(id)
        }
    }

    /// `None` when the id was never allocated or has been collected.
    pub fn get(&self, id: ObjectId) -> Option<&ManagedObject> {
        self.objects.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ManagedObject> {
        self.objects.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn kind_of(&self, v: &Value) -> Option<ObjectKind> {
        self.get(v.as_obj_id()?).map(ManagedObject::kind)
    }

    pub fn live_objects(&self) -> usize {
        self.objects.iter().filter(|o| o.is_some()).count()
    }

    pub fn sequence(&mut self, items: Vec<Value>) -> Value {
        Value::Obj(self.alloc(ManagedObject::Sequence(items)))
    }

    pub fn record<K: Into<RecordKey>>(&mut self, entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        let mut rec = Record::new();
        for (k, v) in entries {
            rec.insert(k, v);
        }
        Value::Obj(self.alloc(ManagedObject::Record(rec)))
    }

    pub fn dictionary(&mut self, entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        let mut dict = Dictionary::new();
        for (k, v) in entries {
            dict.insert(k, v);
        }
        Value::Obj(self.alloc(ManagedObject::Dictionary(dict)))
    }

    pub fn unique_set(&mut self, members: impl IntoIterator<Item = Value>) -> Value {
        let mut set = UniqueSet::new();
        for m in members {
            set.insert(m);
        }
        Value::Obj(self.alloc(ManagedObject::UniqueSet(set)))
    }

    pub fn temporal(&mut self, epoch_millis: i64) -> Value {
        Value::Obj(self.alloc(ManagedObject::Temporal(Temporal { epoch_millis })))
    }

    pub fn pattern(&mut self, source: &str, flags: &str) -> Result<Value, PatternError> {
        let p = Pattern::new(source, flags)?;
        Ok(Value::Obj(self.alloc(ManagedObject::Pattern(p))))
    }

    pub fn function(
        &mut self,
        name: &str,
        func: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Value {
        Value::Obj(self.alloc(ManagedObject::Function(Function {
            name: Arc::from(name),
            func: Arc::new(func),
        })))
    }

    pub fn handle(&mut self, kind: HandleKind, descriptor: i64) -> Value {
        Value::Obj(self.alloc(ManagedObject::Handle(Handle { kind, descriptor })))
    }

    typed_accessors!(as_sequence, as_sequence_mut, Sequence, Vec<Value>);
    typed_accessors!(as_record, as_record_mut, Record, Record);
    typed_accessors!(as_dictionary, as_dictionary_mut, Dictionary, Dictionary);
    typed_accessors!(as_unique_set, as_unique_set_mut, UniqueSet, UniqueSet);
    typed_accessors!(as_temporal, as_temporal_mut, Temporal, Temporal);
    typed_accessors!(as_pattern, as_pattern_mut, Pattern, Pattern);
    typed_accessors!(as_function, as_function_mut, Function, Function);
    typed_accessors!(as_handle, as_handle_mut, Handle, Handle);

    fn is_marked(&self, id: usize) -> bool {
        self.marks
            .get(id >> 6)
            .is_some_and(|w| (w & (1 << (id & 63))) != 0)
    }

    /// Returns false if the slot was already marked.
    fn set_mark(&mut self, id: usize) -> bool {
        let word = id >> 6;
        if word >= self.marks.len() {
            self.marks.resize(word + 1, 0);
        }
        let mask = 1 << (id & 63);
        let w = &mut self.marks[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        true
    }

    /// Free every object not reachable from `roots`. Returns how many slots
    /// were freed.
    pub fn collect(&mut self, roots: &[Value]) -> usize {
        self.marks.clear();
        let mut pending: Vec<Value> = roots.to_vec();
        while let Some(val) = pending.pop() {
            let Value::Obj(id) = val else { continue };
            if !self.contains(id) || !self.set_mark(id.0) {
                continue;
            }
            if let Some(obj) = &self.objects[id.0] {
                obj.for_each_child(|child| {
                    if child.is_obj() {
                        pending.push(child.clone());
                    }
                });
            }
        }

        let mut freed = 0;
        for i in 0..self.objects.len() {
            if self.objects[i].is_some() && !self.is_marked(i) {
                self.objects[i] = None;
                self.free_list.push(i);
                freed += 1;
            }
        }
        self.marks.clear();
        freed
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
