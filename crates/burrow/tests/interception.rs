use std::cell::RefCell;
use std::rc::Rc;

use burrow::{
    wrap, wrappers, Container, ContainerType, Decorator, Error, Key, Operation, Owner, Shape, Value,
    WrapOptions,
};

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, name: &'static str) -> Decorator {
    let log = log.clone();
    Decorator::new(name, move |next, args| {
        log.borrow_mut().push(name.to_string());
        next.call(args)
    })
}

#[test]
fn chain_runs_instance_then_type_then_ancestors() {
    let log: Log = Rc::default();
    let base = ContainerType::new("Base", Shape::Mapping);
    let sub = base.derive("Sub");
    let opts = WrapOptions::default();
    wrap(Owner::Type(&base), Operation::Get, recorder(&log, "base"), opts).unwrap();
    wrap(Owner::Type(&sub), Operation::Get, recorder(&log, "sub.1"), opts).unwrap();
    wrap(Owner::Type(&sub), Operation::Get, recorder(&log, "sub.2"), opts).unwrap();

    let map = sub.instantiate();
    wrap(Owner::Instance(&map), Operation::Get, recorder(&log, "instance"), opts).unwrap();
    map.get("a").unwrap();
    assert_eq!(*log.borrow(), vec!["instance", "sub.2", "sub.1", "base"]);

    log.borrow_mut().clear();
    base.instantiate().get("a").unwrap();
    assert_eq!(*log.borrow(), vec!["base"]);

    let names: Vec<String> = wrappers(Owner::Type(&sub), Operation::Get)
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    assert_eq!(names, vec!["sub.2", "sub.1", "base"]);
}

#[test]
fn instance_wrappers_stay_on_their_instance() {
    let log: Log = Rc::default();
    let decorated = Container::mapping();
    let plain = Container::mapping();
    wrap(Owner::Instance(&decorated), Operation::Store, recorder(&log, "store"), WrapOptions::default()).unwrap();

    plain.store("a", 1).unwrap();
    assert!(log.borrow().is_empty());
    decorated.store("a", 1).unwrap();
    assert_eq!(*log.borrow(), vec!["store"]);
}

#[test]
fn missing_operations() {
    let ty = ContainerType::new("Map", Shape::Mapping);
    let noop = Decorator::new("noop", |next, args| next.call(args));

    let err = wrap(Owner::Type(&ty), Operation::Push, noop.clone(), WrapOptions::default());
    assert!(matches!(
        err,
        Err(Error::OperationNotFound {
            operation: Operation::Push,
            ..
        })
    ));

    wrap(Owner::Type(&ty), Operation::Push, noop, WrapOptions::lenient()).unwrap();
    assert!(wrappers(Owner::Type(&ty), Operation::Push).is_empty());
}

#[test]
fn builtin_types_are_sealed() {
    let noop = Decorator::new("noop", |next, args| next.call(args));
    assert_eq!(
        wrap(Owner::Type(&ContainerType::mapping()), Operation::Get, noop.clone(), WrapOptions::default()),
        Err(Error::SealedType("Mapping".to_string()))
    );
    assert_eq!(
        wrap(Owner::Type(&ContainerType::sequence()), Operation::At, noop, WrapOptions::default()),
        Err(Error::SealedType("Sequence".to_string()))
    );
}

#[test]
fn duplicate_registrations() {
    let ty = ContainerType::new("Map", Shape::Mapping);
    let noop = Decorator::new("noop", |next, args| next.call(args));
    let strict = WrapOptions {
        prevent_duplicates: true,
        ..WrapOptions::default()
    };

    wrap(Owner::Type(&ty), Operation::Get, noop.clone(), WrapOptions::default()).unwrap();
    wrap(Owner::Type(&ty), Operation::Get, noop.clone(), WrapOptions::default()).unwrap();
    assert_eq!(wrappers(Owner::Type(&ty), Operation::Get).len(), 1);

    assert!(matches!(
        wrap(Owner::Type(&ty), Operation::Get, noop.clone(), strict),
        Err(Error::DuplicateRegistration { .. })
    ));

    // The instance chain already contains the type-level registration.
    let map = ty.instantiate();
    assert!(matches!(
        wrap(Owner::Instance(&map), Operation::Get, noop.clone(), strict),
        Err(Error::DuplicateRegistration { .. })
    ));

    // Same decorator on another operation is fine.
    wrap(Owner::Type(&ty), Operation::Fetch, noop, strict).unwrap();
}

#[test]
fn reentrant_reads_terminate() {
    let ty = ContainerType::new("Fallback", Shape::Mapping);
    let fallback = Decorator::new("fallback", |next, args| {
        let value = next.call(args)?;
        if value.is_null() {
            return next.receiver().get("fallback");
        }
        Ok(value)
    });
    wrap(Owner::Type(&ty), Operation::Get, fallback, WrapOptions::default()).unwrap();

    let map = ty.instantiate();
    map.store("fallback", 7).unwrap();
    assert_eq!(map.get("missing").unwrap(), Value::Int(7));

    map.delete("fallback").unwrap();
    assert_eq!(map.get("missing").unwrap(), Value::Null);
    assert_eq!(map.frame_depth(), 0);
}

#[test]
fn mutually_reentrant_decorators_terminate() {
    let ty = ContainerType::new("PingPong", Shape::Mapping);
    let ping = Decorator::new("ping", |next, args| {
        let key = args.key().cloned().unwrap_or(Key::from("k"));
        next.receiver().fetch(key, Value::Null)
    });
    let pong = Decorator::new("pong", |next, args| {
        let key = args.key().cloned().unwrap_or(Key::from("k"));
        next.receiver().get(key)
    });
    wrap(Owner::Type(&ty), Operation::Get, ping, WrapOptions::default()).unwrap();
    wrap(Owner::Type(&ty), Operation::Fetch, pong, WrapOptions::default()).unwrap();

    let map = ty.instantiate();
    map.store("k", "v").unwrap();
    assert_eq!(map.get("k").unwrap(), Value::from("v"));
    assert_eq!(map.fetch("k", Value::Null).unwrap(), Value::from("v"));
    assert_eq!(map.frame_depth(), 0);
}

#[test]
fn frames_are_per_container() {
    let ty = ContainerType::new("Delegating", Shape::Mapping);
    let delegate = Decorator::new("delegate", |next, args| match next.receiver().get_stored(&Key::from("next")) {
        Some(Value::Container(inner)) => inner.invoke(next.operation(), args),
        _ => next.call(args),
    });
    wrap(Owner::Type(&ty), Operation::Get, delegate, WrapOptions::default()).unwrap();

    let leaf = ty.instantiate();
    leaf.store("x", 3).unwrap();
    let middle = ty.instantiate();
    middle.store("next", leaf).unwrap();
    let top = ty.instantiate();
    top.store("next", middle).unwrap();

    assert_eq!(top.get("x").unwrap(), Value::Int(3));
}

#[test]
fn dispatch_enters_another_chain() {
    let ty = ContainerType::new("Upper", Shape::Mapping);
    let upper = Decorator::new("upper", |next, args| {
        Ok(match next.call(args)? {
            Value::Str(s) => Value::Str(s.to_uppercase()),
            other => other,
        })
    });
    let via_get = Decorator::new("via_get", |next, args| next.dispatch(Operation::Get, args));
    wrap(Owner::Type(&ty), Operation::Get, upper, WrapOptions::default()).unwrap();
    wrap(Owner::Type(&ty), Operation::Fetch, via_get, WrapOptions::default()).unwrap();

    let map = ty.instantiate();
    map.store("a", "x").unwrap();
    assert_eq!(map.fetch("a", Value::Null).unwrap(), Value::from("X"));
}

#[test]
fn dispatch_on_same_operation_skips_outer_decorators() {
    let log: Log = Rc::default();
    let ty = ContainerType::new("Aliased", Shape::Mapping);
    wrap(Owner::Type(&ty), Operation::Get, recorder(&log, "inner"), WrapOptions::default()).unwrap();
    let alias = Decorator::new("alias", |next, args| {
        next.dispatch(Operation::Get, args.with_key("target"))
    });
    wrap(Owner::Type(&ty), Operation::Get, alias, WrapOptions::default()).unwrap();
    wrap(Owner::Type(&ty), Operation::Get, recorder(&log, "outer"), WrapOptions::default()).unwrap();

    let map = ty.instantiate();
    map.store("target", 1).unwrap();
    assert_eq!(map.get("anything").unwrap(), Value::Int(1));
    assert_eq!(*log.borrow(), vec!["outer", "inner"]);
}

#[test]
fn sequence_operations_are_interceptable() {
    let ty = ContainerType::new("Counted", Shape::Sequence);
    let log: Log = Rc::default();
    wrap(Owner::Type(&ty), Operation::Push, recorder(&log, "push"), WrapOptions::default()).unwrap();
    wrap(Owner::Type(&ty), Operation::Pop, recorder(&log, "pop"), WrapOptions::default()).unwrap();
    assert!(wrap(Owner::Type(&ty), Operation::Merge, recorder(&log, "merge"), WrapOptions::default()).is_err());

    let seq = ty.instantiate();
    seq.push(1).unwrap();
    seq.push(2).unwrap();
    assert_eq!(seq.pop().unwrap(), Value::Int(2));
    assert_eq!(*log.borrow(), vec!["push", "push", "pop"]);
}
