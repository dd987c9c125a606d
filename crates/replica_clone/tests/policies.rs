mod common;

use common::{field, id, init_tracing, item};
use replica_clone::{CloneConfig, CloneError, CloneStats, Cloner, Limit, OpaquePolicy, deep_clone};
use replica_core::{HandleKind, Heap, ObjectId, ObjectKind, Value, deep_equal, render};

#[test]
fn opaque_values_are_shared_by_default() {
    init_tracing();
    let mut heap = Heap::new();
    let f = heap.function("double", |args| match args.first() {
        Some(Value::Int(i)) => Value::Int(i * 2),
        _ => Value::Null,
    });
    let file = heap.handle(HandleKind::File, 3);
    let root = heap.record([("f", f.clone()), ("file", file.clone())]);
    let copy = deep_clone(&mut heap, &root).unwrap();

    assert_ne!(copy, root);
    assert_eq!(field(&heap, &copy, "f"), f);
    assert_eq!(field(&heap, &copy, "file"), file);
    let shared = field(&heap, &copy, "f");
    assert_eq!(heap.as_function(&shared).unwrap().call(&[Value::Int(21)]), Value::Int(42));

    // writes through the copy land on the original objects
    let copied_file = field(&heap, &copy, "file");
    heap.as_handle_mut(&copied_file).unwrap().descriptor = 7;
    assert_eq!(heap.as_handle(&file).unwrap().descriptor, 7);
    assert_eq!(heap.as_handle(&file).unwrap().kind, HandleKind::File);
    heap.as_function_mut(&shared).unwrap().name = "twice".into();
    assert_eq!(&*heap.as_function(&f).unwrap().name, "twice");
}

#[test]
fn opaque_values_can_be_rejected() {
    let mut heap = Heap::new();
    let socket = heap.handle(HandleKind::Socket, 9);
    let root = heap.sequence(vec![Value::Int(1), socket.clone()]);
    let before = render(&heap, &root);

    let strict = Cloner::new(CloneConfig::default().with_opaque(OpaquePolicy::Reject));
    let err = strict.deep_clone(&mut heap, &root).unwrap_err();
    assert_eq!(
        err,
        CloneError::UnsupportedValueKind { kind: ObjectKind::Handle, id: id(&socket) }
    );
    assert_eq!(err.to_string(), format!("cannot clone handle object {}", id(&socket)));
    assert_eq!(render(&heap, &root), before);

    let f = heap.function("noop", |_| Value::Void);
    assert!(matches!(
        strict.deep_clone(&mut heap, &f),
        Err(CloneError::UnsupportedValueKind { kind: ObjectKind::Function, .. })
    ));
}

#[test]
fn dangling_references_are_reported() {
    let mut heap = Heap::new();
    let stale = heap.sequence(vec![]);
    heap.collect(&[]);
    assert_eq!(
        deep_clone(&mut heap, &stale),
        Err(CloneError::DanglingReference(id(&stale)))
    );

    let root = heap.sequence(vec![Value::Obj(ObjectId(999))]);
    assert_eq!(
        deep_clone(&mut heap, &root),
        Err(CloneError::DanglingReference(ObjectId(999)))
    );
}

fn nested_chain(heap: &mut Heap, levels: usize) -> Value {
    let mut v = heap.sequence(vec![]);
    for _ in 0..levels {
        v = heap.sequence(vec![v]);
    }
    v
}

#[test]
fn depth_budget() {
    let mut heap = Heap::new();
    let cloner = Cloner::new(CloneConfig::default().with_max_depth(2));

    let ok = nested_chain(&mut heap, 2);
    let copy = cloner.deep_clone(&mut heap, &ok).unwrap();
    assert!(deep_equal(&heap, &copy, &ok));

    let too_deep = nested_chain(&mut heap, 3);
    let before = render(&heap, &too_deep);
    assert_eq!(
        cloner.deep_clone(&mut heap, &too_deep),
        Err(CloneError::ResourceExhausted { limit: Limit::Depth, bound: 2 })
    );
    assert_eq!(render(&heap, &too_deep), before);
}

#[test]
fn object_budget() {
    let mut heap = Heap::new();
    let t1 = heap.temporal(1);
    let t2 = heap.temporal(2);
    let root = heap.sequence(vec![t1, t2, Value::Int(3)]);

    let tight = Cloner::new(CloneConfig::default().with_max_objects(2));
    let err = tight.deep_clone(&mut heap, &root).unwrap_err();
    assert_eq!(err, CloneError::ResourceExhausted { limit: Limit::Objects, bound: 2 });
    assert_eq!(err.to_string(), "clone exceeded the object budget of 2");

    let roomy = Cloner::new(CloneConfig::default().with_max_objects(3));
    assert!(roomy.deep_clone(&mut heap, &root).is_ok());
}

#[test]
fn object_budget_applies_to_each_session_call() {
    let mut heap = Heap::new();
    let roots: Vec<Value> = (0..3).map(|_| heap.sequence(vec![])).collect();

    let cloner = Cloner::new(CloneConfig::default().with_max_objects(1));
    let mut session = cloner.session(&mut heap);
    for root in &roots {
        assert!(session.clone_value(root).is_ok());
    }
    assert_eq!(session.finish().composites, 3);

    let pair = heap.sequence(vec![roots[0].clone()]);
    let mut session = cloner.session(&mut heap);
    assert_eq!(
        session.clone_value(&pair),
        Err(CloneError::ResourceExhausted { limit: Limit::Objects, bound: 1 })
    );
}

#[test]
fn failed_clone_leaves_collectable_garbage() {
    let mut heap = Heap::new();
    let handle = heap.handle(HandleKind::File, 1);
    let inner = heap.sequence(vec![Value::Int(1)]);
    let root = heap.sequence(vec![inner, handle]);
    let live = heap.live_objects();

    let strict = Cloner::new(CloneConfig::default().with_opaque(OpaquePolicy::Reject));
    assert!(strict.deep_clone(&mut heap, &root).is_err());
    assert!(heap.live_objects() > live);
    heap.collect(&[root]);
    assert_eq!(heap.live_objects(), live);
}

#[test]
fn very_deep_chains_do_not_overflow() {
    let mut heap = Heap::new();
    let root = nested_chain(&mut heap, 200_000);
    let copy = deep_clone(&mut heap, &root).unwrap();
    assert_ne!(copy, root);
    assert!(deep_equal(&heap, &copy, &root));
}

#[test]
fn prototype_links_are_not_reproduced() {
    let mut heap = Heap::new();
    let proto = heap.record([("kind", Value::str("base"))]);
    let obj = heap.record([("own", Value::Int(1))]);
    heap.as_record_mut(&obj).unwrap().proto = proto.as_obj_id();

    let copy = deep_clone(&mut heap, &obj).unwrap();
    let rec = heap.as_record(&copy).unwrap();
    assert_eq!(rec.proto, None);
    assert_eq!(rec.field("own"), Some(&Value::Int(1)));
    assert_eq!(heap.as_record(&obj).unwrap().proto, proto.as_obj_id());
}

#[test]
fn session_shares_clones_across_roots() {
    let mut heap = Heap::new();
    let shared = heap.sequence(vec![Value::Int(1)]);
    let a = heap.record([("s", shared.clone())]);
    let b = heap.record([("s", shared.clone())]);

    let cloner = Cloner::default();
    let mut session = cloner.session(&mut heap);
    let ca = session.clone_value(&a).unwrap();
    let cb = session.clone_value(&b).unwrap();
    let shared_clone = session.clone_of(id(&shared)).unwrap();
    assert_eq!(session.clone_of(id(&a)), Some(id(&ca)));
    session.finish();

    assert_eq!(field(&heap, &ca, "s"), Value::Obj(shared_clone));
    assert_eq!(field(&heap, &cb, "s"), Value::Obj(shared_clone));

    // separate top-level calls never share
    let ca2 = deep_clone(&mut heap, &a).unwrap();
    let cb2 = deep_clone(&mut heap, &b).unwrap();
    assert_ne!(field(&heap, &ca2, "s"), field(&heap, &cb2, "s"));
}

#[test]
fn session_refuses_work_after_a_failure() {
    let mut heap = Heap::new();
    let handle = heap.handle(HandleKind::Socket, 4);
    let bad = heap.sequence(vec![handle]);
    let good = heap.sequence(vec![]);

    let strict = Cloner::new(CloneConfig::default().with_opaque(OpaquePolicy::Reject));
    let mut session = strict.session(&mut heap);
    let first = session.clone_value(&bad).unwrap_err();
    assert_eq!(session.clone_value(&good), Err(first));
}

#[test]
fn stats_count_each_dispatch_path() {
    let mut heap = Heap::new();
    let shared = heap.sequence(vec![]);
    let date = heap.temporal(5);
    let f = heap.function("f", |_| Value::Void);
    let root = heap.record([
        ("a", Value::Int(1)),
        ("s", shared.clone()),
        ("t", shared),
        ("d", date),
        ("f", f),
    ]);

    let cloner = Cloner::default();
    let mut session = cloner.session(&mut heap);
    let copy = session.clone_value(&root).unwrap();
    let stats = session.finish();
    assert_eq!(
        stats,
        CloneStats { composites: 2, leaves: 1, scalars: 1, opaque_shared: 1, table_hits: 1 }
    );
    assert_eq!(field(&heap, &copy, "s"), field(&heap, &copy, "t"));
}

#[test]
fn void_input_is_returned_as_is() {
    let mut heap = Heap::new();
    assert_eq!(deep_clone(&mut heap, &Value::Void), Ok(Value::Void));
    let root = heap.sequence(vec![Value::Void, Value::Null]);
    let copy = deep_clone(&mut heap, &root).unwrap();
    assert_eq!(item(&heap, &copy, 0), Value::Void);
    assert_eq!(item(&heap, &copy, 1), Value::Null);
}
