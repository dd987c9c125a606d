//! Deep structural equality of value graphs.

use crate::gc::ObjectId;
use crate::heap::{Heap, ManagedObject};
use crate::value::{FastHashSet, Value, fast_set_new};

/// True when `a` and `b` are structurally equal.
///
/// Object pairs already under comparison are assumed equal, so cyclic graphs
/// compare equal when their unfoldings agree. Opaque objects (functions and
/// handles) are only equal to themselves. Dictionaries and sets are compared
/// in insertion order.
pub fn deep_equal(heap: &Heap, a: &Value, b: &Value) -> bool {
    let mut assumed: FastHashSet<(ObjectId, ObjectId)> = fast_set_new();
    let mut pending: Vec<(Value, Value)> = vec![(a.clone(), b.clone())];

    while let Some((x, y)) = pending.pop() {
        let (ia, ib) = match (&x, &y) {
            (Value::Obj(ia), Value::Obj(ib)) => (*ia, *ib),
            _ => {
                if x != y {
                    return false;
                }
                continue;
            }
        };
        if ia == ib || !assumed.insert((ia, ib)) {
            continue;
        }
        let (Some(oa), Some(ob)) = (heap.get(ia), heap.get(ib)) else {
            return false;
        };
        match (oa, ob) {
            (ManagedObject::Temporal(ta), ManagedObject::Temporal(tb)) => {
                if ta != tb {
                    return false;
                }
            }
            (ManagedObject::Pattern(pa), ManagedObject::Pattern(pb)) => {
                if pa.source() != pb.source() || pa.flags() != pb.flags() {
                    return false;
                }
            }
            (ManagedObject::Sequence(sa), ManagedObject::Sequence(sb)) => {
                if sa.len() != sb.len() {
                    return false;
                }
                pending.extend(sa.iter().cloned().zip(sb.iter().cloned()));
            }
            (ManagedObject::Record(ra), ManagedObject::Record(rb)) => {
                if ra.len() != rb.len() {
                    return false;
                }
                for ((ka, va), (kb, vb)) in ra.entries.iter().zip(rb.entries.iter()) {
                    if ka != kb {
                        return false;
                    }
                    pending.push((va.clone(), vb.clone()));
                }
            }
            (ManagedObject::Dictionary(da), ManagedObject::Dictionary(db)) => {
                if da.len() != db.len() {
                    return false;
                }
                for ((ka, va), (kb, vb)) in da.entries.iter().zip(db.entries.iter()) {
                    pending.push((ka.clone(), kb.clone()));
                    pending.push((va.clone(), vb.clone()));
                }
            }
            (ManagedObject::UniqueSet(sa), ManagedObject::UniqueSet(sb)) => {
                if sa.len() != sb.len() {
                    return false;
                }
                pending.extend(sa.members.iter().cloned().zip(sb.members.iter().cloned()));
            }
            // opaque objects are only equal to themselves, handled above
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::HandleKind;

    #[test]
    fn scalars_and_identical_objects() {
        let mut heap = Heap::new();
        assert!(deep_equal(&heap, &Value::Int(1), &Value::Int(1)));
        assert!(!deep_equal(&heap, &Value::Int(1), &Value::Float(1.0)));
        let h = heap.handle(HandleKind::File, 3);
        let h2 = heap.handle(HandleKind::File, 3);
        assert!(deep_equal(&heap, &h, &h));
        assert!(!deep_equal(&heap, &h, &h2));
    }

    #[test]
    fn nested_structures_compare_by_content() {
        let mut heap = Heap::new();
        let build = |heap: &mut Heap| {
            let d = heap.record([("e", Value::Int(3))]);
            let b = heap.record([("c", Value::Int(2)), ("d", d)]);
            heap.record([("a", Value::Int(1)), ("b", b)])
        };
        let x = build(&mut heap);
        let y = build(&mut heap);
        assert!(deep_equal(&heap, &x, &y));

        let b = heap.as_record(&y).unwrap().field("b").cloned().unwrap();
        heap.as_record_mut(&b).unwrap().insert("c", Value::Int(9));
        assert!(!deep_equal(&heap, &x, &y));
    }

    #[test]
    fn cycles_terminate() {
        let mut heap = Heap::new();
        let a = heap.sequence(vec![Value::Int(1)]);
        heap.as_sequence_mut(&a).unwrap().push(a.clone());
        let b = heap.sequence(vec![Value::Int(1)]);
        heap.as_sequence_mut(&b).unwrap().push(b.clone());
        assert!(deep_equal(&heap, &a, &b));

        let c = heap.sequence(vec![Value::Int(2)]);
        heap.as_sequence_mut(&c).unwrap().push(c.clone());
        assert!(!deep_equal(&heap, &a, &c));
    }

    #[test]
    fn record_key_order_matters() {
        let mut heap = Heap::new();
        let x = heap.record([("a", Value::Int(1)), ("b", Value::Int(2))]);
        let y = heap.record([("b", Value::Int(2)), ("a", Value::Int(1))]);
        assert!(!deep_equal(&heap, &x, &y));
    }

    #[test]
    fn kinds_must_match() {
        let mut heap = Heap::new();
        let s = heap.sequence(vec![]);
        let u = heap.unique_set([]);
        assert!(!deep_equal(&heap, &s, &u));
        let t = heap.temporal(7);
        let t2 = heap.temporal(7);
        assert!(deep_equal(&heap, &t, &t2));
        let p = heap.pattern("a+", "g").unwrap();
        let p2 = heap.pattern("a+", "g").unwrap();
        assert!(deep_equal(&heap, &p, &p2));
    }
}
