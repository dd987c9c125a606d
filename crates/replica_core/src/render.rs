//! Compact debug rendering of value graphs.

use crate::gc::ObjectId;
use crate::heap::{Heap, ManagedObject};
use crate::value::{FastHashSet, RecordKey, Value, fast_set_new};

/// Render `value` in a JSON-like notation.
///
/// An object met again while it is still being rendered prints as
/// `[Circular]`. Shared objects outside a cycle are rendered at each use.
/// Nesting depth is bounded only by memory.
pub fn render(heap: &Heap, value: &Value) -> String {
    let mut out = String::new();
    let mut path: FastHashSet<ObjectId> = fast_set_new();
    let mut pending = vec![Step::Visit(value)];
    while let Some(step) = pending.pop() {
        match step {
            Step::Text(text) => out.push_str(text),
            Step::Key(key) => render_key(key, &mut out),
            Step::Leave(id) => {
                path.remove(&id);
            }
            Step::Visit(v) => visit(heap, v, &mut path, &mut pending, &mut out),
        }
    }
    out
}

/// Deferred rendering work, popped in reverse push order.
enum Step<'a> {
    Visit(&'a Value),
    Key(&'a RecordKey),
    Text(&'static str),
    Leave(ObjectId),
}

fn render_scalar(value: &Value, out: &mut String) {
    match value {
        Value::Void => out.push_str("void"),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => {
            let mut buf = itoa::Buffer::new();
            out.push_str(buf.format(*i));
        }
        Value::Float(f) => {
            let mut buf = ryu::Buffer::new();
            out.push_str(buf.format(*f));
        }
        Value::Str(s) => out.push_str(&format!("{:?}", &**s)),
        Value::Symbol(s) => {
            out.push_str("Symbol(");
            out.push_str(s.description());
            out.push(')');
        }
        Value::Obj(_) => {}
    }
}

fn render_key(key: &RecordKey, out: &mut String) {
    match key {
        RecordKey::Text(s) => out.push_str(s),
        RecordKey::Symbol(s) => {
            out.push_str("[Symbol(");
            out.push_str(s.description());
            out.push_str(")]");
        }
    }
}

fn visit<'a>(
    heap: &'a Heap,
    value: &'a Value,
    path: &mut FastHashSet<ObjectId>,
    pending: &mut Vec<Step<'a>>,
    out: &mut String,
) {
    let Value::Obj(id) = value else {
        render_scalar(value, out);
        return;
    };
    let Some(obj) = heap.get(*id) else {
        out.push_str(&format!("<dangling {id}>"));
        return;
    };
    if path.contains(id) {
        out.push_str("[Circular]");
        return;
    }
    let mut steps: Vec<Step<'a>> = Vec::new();
    match obj {
        ManagedObject::Temporal(t) => {
            let mut buf = itoa::Buffer::new();
            out.push_str("Date(");
            out.push_str(buf.format(t.epoch_millis));
            out.push(')');
            return;
        }
        ManagedObject::Pattern(p) => {
            out.push('/');
            out.push_str(p.source());
            out.push('/');
            out.push_str(p.flags());
            return;
        }
        ManagedObject::Function(f) => {
            out.push_str("[Function ");
            out.push_str(&f.name);
            out.push(']');
            return;
        }
        ManagedObject::Handle(h) => {
            out.push_str(&format!("[Handle {}#{}]", h.kind.as_str(), h.descriptor));
            return;
        }
        ManagedObject::Sequence(items) => {
            steps.push(Step::Text("["));
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    steps.push(Step::Text(", "));
                }
                steps.push(Step::Visit(item));
            }
            steps.push(Step::Text("]"));
        }
        ManagedObject::Record(rec) => {
            steps.push(Step::Text("{"));
            for (i, (k, v)) in rec.entries.iter().enumerate() {
                if i > 0 {
                    steps.push(Step::Text(", "));
                }
                steps.push(Step::Key(k));
                steps.push(Step::Text(": "));
                steps.push(Step::Visit(v));
            }
            steps.push(Step::Text("}"));
        }
        ManagedObject::Dictionary(dict) => {
            steps.push(Step::Text("Map{"));
            for (i, (k, v)) in dict.entries.iter().enumerate() {
                if i > 0 {
                    steps.push(Step::Text(", "));
                }
                steps.push(Step::Visit(k));
                steps.push(Step::Text(" => "));
                steps.push(Step::Visit(v));
            }
            steps.push(Step::Text("}"));
        }
        ManagedObject::UniqueSet(set) => {
            steps.push(Step::Text("Set{"));
            for (i, m) in set.members.iter().enumerate() {
                if i > 0 {
                    steps.push(Step::Text(", "));
                }
                steps.push(Step::Visit(m));
            }
            steps.push(Step::Text("}"));
        }
    }
    path.insert(*id);
    steps.push(Step::Leave(*id));
    pending.extend(steps.into_iter().rev());
}
