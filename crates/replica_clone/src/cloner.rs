//! The deep-clone algorithm.
//!
//! Dispatch for one value:
//! 1. Scalars (void, null, bool, numbers, text, symbols) come back unchanged.
//! 2. A temporal becomes a fresh temporal with the same millis.
//! 3. A pattern becomes a fresh pattern with the same source and flags.
//! 4. A composite (sequence, record, dictionary, unique set) already in the
//!    identity table yields its recorded clone. Otherwise an empty composite
//!    of the same kind is allocated and registered under the original's id
//!    *before* any child is visited, then populated in source order.
//!    Dictionary keys are cloned like values.
//! 5. Functions and handles follow [`OpaquePolicy`].
//!
//! Registration before population is what closes cycles onto the clone and
//! keeps shared sub-structure shared. Population is queued on an explicit
//! work stack, so arbitrarily deep graphs never grow the native stack.

use crate::config::{CloneConfig, OpaquePolicy};
use crate::errors::{CloneError, Limit, Result};
use replica_core::value::{FastHashMap, RecordKey, fast_map_new};
use replica_core::{Dictionary, Heap, ManagedObject, ObjectId, Record, UniqueSet, Value};
use tracing::{debug, trace, warn};

/// Counters for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloneStats {
    /// Composites allocated and populated.
    pub composites: usize,
    /// Temporals and patterns copied.
    pub leaves: usize,
    /// Scalars returned unchanged.
    pub scalars: usize,
    /// Functions and handles returned by reference.
    pub opaque_shared: usize,
    /// Lookups answered by the identity table.
    pub table_hits: usize,
}

/// A composite clone that has been registered but not yet populated.
struct Pending {
    src: ObjectId,
    dst: ObjectId,
    depth: usize,
}

/// Snapshot of a composite's contents, taken so the heap can be mutated
/// while the children are cloned.
enum Contents {
    Sequence(Vec<Value>),
    Record(Vec<(RecordKey, Value)>),
    Dictionary(Vec<(Value, Value)>),
    UniqueSet(Vec<Value>),
}

/// Stateless entry point. Every [`Cloner::deep_clone`] call runs in its own
/// [`CloneSession`], so identity tables never outlive one call.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cloner {
    config: CloneConfig,
}

impl Cloner {
    pub fn new(config: CloneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CloneConfig {
        &self.config
    }

    /// Open a session whose identity table spans several clone calls.
    pub fn session<'h>(&self, heap: &'h mut Heap) -> CloneSession<'h> {
        CloneSession {
            heap,
            config: self.config,
            table: fast_map_new(),
            stats: CloneStats::default(),
            allocated: 0,
            failed: None,
        }
    }

    /// Produce an independent deep copy of `value` inside `heap`.
    ///
    /// On error the source graph is untouched; objects allocated before the
    /// failure stay in the heap until the next [`Heap::collect`].
    pub fn deep_clone(&self, heap: &mut Heap, value: &Value) -> Result<Value> {
        let mut session = self.session(heap);
        let out = session.clone_value(value);
        let stats = session.finish();
        match &out {
            Ok(_) => debug!(?stats, "deep clone finished"),
            Err(err) => warn!(%err, ?stats, "deep clone failed"),
        }
        out
    }
}

/// Clone [`Value`]s with the default configuration.
pub fn deep_clone(heap: &mut Heap, value: &Value) -> Result<Value> {
    Cloner::default().deep_clone(heap, value)
}

/// One identity table and the heap it clones into.
///
/// Roots cloned through the same session share clones of common
/// sub-structure. After an error the table may hold half-populated clones,
/// so the session refuses further work and repeats the error.
pub struct CloneSession<'h> {
    heap: &'h mut Heap,
    config: CloneConfig,
    table: FastHashMap<ObjectId, ObjectId>,
    stats: CloneStats,
    /// Objects allocated by the current call, checked against `max_objects`.
    allocated: usize,
    failed: Option<CloneError>,
}

impl<'h> CloneSession<'h> {
    pub fn clone_value(&mut self, value: &Value) -> Result<Value> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let out = self.run(value);
        if let Err(err) = &out {
            self.failed = Some(err.clone());
        }
        out
    }

    /// The clone produced for `original` so far, if any.
    pub fn clone_of(&self, original: ObjectId) -> Option<ObjectId> {
        self.table.get(&original).copied()
    }

    pub fn stats(&self) -> &CloneStats {
        &self.stats
    }

    pub fn finish(self) -> CloneStats {
        self.stats
    }

    fn run(&mut self, value: &Value) -> Result<Value> {
        self.allocated = 0;
        let mut work: Vec<Pending> = Vec::new();
        let root = self.clone_child(value, 0, &mut work)?;
        while let Some(job) = work.pop() {
            self.populate(job, &mut work)?;
        }
        Ok(root)
    }

    /// Map one value to its clone. Composites come back registered but empty,
    /// with their population pushed onto `work`.
    fn clone_child(&mut self, value: &Value, depth: usize, work: &mut Vec<Pending>) -> Result<Value> {
        let id = match value {
            Value::Obj(id) => *id,
            Value::Void
            | Value::Null
            | Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Str(_)
            | Value::Symbol(_) => {
                self.stats.scalars += 1;
                return Ok(value.clone());
            }
        };
        if let Some(dst) = self.table.get(&id) {
            self.stats.table_hits += 1;
            return Ok(Value::Obj(*dst));
        }

        let Some(obj) = self.heap.get(id) else {
            warn!(%id, "dangling reference in clone source");
            return Err(CloneError::DanglingReference(id));
        };
        let fresh = match obj {
            ManagedObject::Temporal(t) => ManagedObject::Temporal(*t),
            ManagedObject::Pattern(p) => ManagedObject::Pattern(p.fresh_copy()),
            ManagedObject::Sequence(items) => ManagedObject::Sequence(Vec::with_capacity(items.len())),
            ManagedObject::Record(rec) => ManagedObject::Record(Record::with_capacity(rec.len())),
            ManagedObject::Dictionary(dict) => {
                ManagedObject::Dictionary(Dictionary::with_capacity(dict.len()))
            }
            ManagedObject::UniqueSet(set) => {
                ManagedObject::UniqueSet(UniqueSet::with_capacity(set.len()))
            }
            ManagedObject::Function(_) | ManagedObject::Handle(_) => {
                let kind = obj.kind();
                return match self.config.opaque {
                    OpaquePolicy::Share => {
                        self.stats.opaque_shared += 1;
                        Ok(value.clone())
                    }
                    OpaquePolicy::Reject => Err(CloneError::UnsupportedValueKind { kind, id }),
                };
            }
        };
        let kind = fresh.kind();

        if kind.is_composite() {
            if let Some(bound) = self.config.max_depth {
                if depth > bound {
                    warn!(%id, depth, bound, "clone depth budget exhausted");
                    return Err(CloneError::ResourceExhausted { limit: Limit::Depth, bound });
                }
            }
        }
        if let Some(bound) = self.config.max_objects {
            if self.allocated >= bound {
                warn!(bound, "clone object budget exhausted");
                return Err(CloneError::ResourceExhausted { limit: Limit::Objects, bound });
            }
        }

        let dst = self.heap.alloc(fresh);
        self.allocated += 1;
        if kind.is_composite() {
            self.table.insert(id, dst);
            self.stats.composites += 1;
            trace!(src = %id, %dst, %kind, "registered clone");
            work.push(Pending { src: id, dst, depth });
        } else {
            self.stats.leaves += 1;
        }
        Ok(Value::Obj(dst))
    }

    fn populate(&mut self, job: Pending, work: &mut Vec<Pending>) -> Result<()> {
        let contents = match self.heap.get(job.src) {
            Some(ManagedObject::Sequence(items)) => Contents::Sequence(items.clone()),
            Some(ManagedObject::Record(rec)) => Contents::Record(
                rec.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            Some(ManagedObject::Dictionary(dict)) => Contents::Dictionary(
                dict.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            Some(ManagedObject::UniqueSet(set)) => {
                Contents::UniqueSet(set.members.iter().cloned().collect())
            }
            // only composites are queued, and the source is never mutated
            _ => return Err(CloneError::DanglingReference(job.src)),
        };

        let depth = job.depth + 1;
        let filled = match contents {
            Contents::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    out.push(self.clone_child(item, depth, work)?);
                }
                ManagedObject::Sequence(out)
            }
            Contents::Record(entries) => {
                // prototype links are not copied
                let mut out = Record::with_capacity(entries.len());
                for (key, v) in entries {
                    let v = self.clone_child(&v, depth, work)?;
                    out.entries.insert(key, v);
                }
                ManagedObject::Record(out)
            }
            Contents::Dictionary(entries) => {
                let mut out = Dictionary::with_capacity(entries.len());
                for (k, v) in &entries {
                    let k = self.clone_child(k, depth, work)?;
                    let v = self.clone_child(v, depth, work)?;
                    out.insert(k, v);
                }
                ManagedObject::Dictionary(out)
            }
            Contents::UniqueSet(members) => {
                let mut out = UniqueSet::with_capacity(members.len());
                for m in &members {
                    let m = self.clone_child(m, depth, work)?;
                    out.insert(m);
                }
                ManagedObject::UniqueSet(out)
            }
        };

        match self.heap.get_mut(job.dst) {
            Some(slot) => {
                *slot = filled;
                Ok(())
            }
            None => Err(CloneError::DanglingReference(job.dst)),
        }
    }
}
