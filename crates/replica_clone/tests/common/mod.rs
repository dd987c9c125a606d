#![allow(dead_code)]

use replica_core::{Heap, ObjectId, Value};
use std::collections::HashSet;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Honours `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn id(v: &Value) -> ObjectId {
    v.as_obj_id().expect("expected an object value")
}

pub fn field(heap: &Heap, rec: &Value, name: &str) -> Value {
    heap.as_record(rec)
        .and_then(|r| r.field(name))
        .cloned()
        .unwrap_or_else(|| panic!("record has no field '{name}'"))
}

pub fn item(heap: &Heap, seq: &Value, index: usize) -> Value {
    heap.as_sequence(seq)
        .and_then(|s| s.get(index))
        .cloned()
        .unwrap_or_else(|| panic!("sequence has no item {index}"))
}

/// Every object reachable from `root`, in discovery order.
pub fn reachable(heap: &Heap, root: &Value) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    let mut pending = vec![root.clone()];
    while let Some(v) = pending.pop() {
        let Value::Obj(oid) = v else { continue };
        if !seen.insert(oid) {
            continue;
        }
        order.push(oid);
        if let Some(obj) = heap.get(oid) {
            obj.for_each_child(|c| pending.push(c.clone()));
        }
    }
    order
}

pub fn children(heap: &Heap, oid: ObjectId) -> Vec<Value> {
    let mut out = Vec::new();
    if let Some(obj) = heap.get(oid) {
        obj.for_each_child(|c| out.push(c.clone()));
    }
    out
}
