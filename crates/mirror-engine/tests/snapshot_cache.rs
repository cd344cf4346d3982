//! Integration tests for snapshot caching and member hiding

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use mirror_engine::{build_type_snapshot, get_type_snapshot, MemberCollection, TypeCache};
use mirror_types::{FieldDefinition, MemberFilter, PropertyDefinition, TypeBuilder, TypeHandle, Value};

#[test]
fn test_concurrent_callers_share_one_snapshot() {
    let ty = common::counter();
    let threads = 8;
    let barrier = Barrier::new(threads);

    let snapshots: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    get_type_snapshot(&ty, MemberFilter::DEFAULT)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = &snapshots[0];
    assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, first)));
    assert!(Arc::ptr_eq(first, &get_type_snapshot(&ty, MemberFilter::DEFAULT)));
}

#[test]
fn test_uncached_build_is_fresh() {
    let ty = common::counter();
    let cached = get_type_snapshot(&ty, MemberFilter::DEFAULT);
    let fresh = build_type_snapshot(&ty, MemberFilter::DEFAULT);
    assert_eq!(cached.fields(), fresh.fields());
    assert_eq!(fresh.field("count").map(|a| a.name()), Some("count"));
}

#[test]
fn test_filters_are_separate_keys() {
    let cache = TypeCache::new();
    let ty = TypeBuilder::class("Keyed")
        .field(FieldDefinition::new("secret", TypeHandle::i32()).private())
        .finish()
        .unwrap();

    let public = cache.get_or_build(&ty, MemberFilter::DEFAULT);
    let everything = cache.get_or_build(&ty, MemberFilter::ALL);
    assert!(public.field("secret").is_none());
    assert!(everything.field("secret").is_some());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_hidden_field_resolves_to_derived_declaration() {
    let base = TypeBuilder::class("Shape")
        .field(FieldDefinition::new("name", TypeHandle::string()))
        .field(FieldDefinition::new("sides", TypeHandle::i32()))
        .finish()
        .unwrap();
    let derived = TypeBuilder::class("Square")
        .extends(&base)
        .field(FieldDefinition::new("name", TypeHandle::string()))
        .finish()
        .unwrap();

    let snapshot = get_type_snapshot(&derived, MemberFilter::DEFAULT);
    let names: Vec<_> = snapshot.fields().names().collect();
    assert_eq!(names.iter().filter(|n| **n == "name").count(), 1);
    assert_eq!(snapshot.field("name").unwrap().declaring(), &derived);
    assert_eq!(snapshot.field("sides").unwrap().declaring(), &base);

    // Both slots exist; writing through the collection reaches the derived one
    let mut square = derived.instantiate();
    snapshot
        .field("name")
        .unwrap()
        .set(&mut square, Value::from("square"))
        .unwrap();
    let base_view = get_type_snapshot(&base, MemberFilter::DEFAULT);
    assert_eq!(
        base_view.field("name").unwrap().get(&square).unwrap(),
        Value::Null
    );
}

#[test]
fn test_hidden_property_resolves_to_derived_declaration() {
    let base = TypeBuilder::class("Widget")
        .property(PropertyDefinition::new("Kind", TypeHandle::string()).getter(|_| Ok(Value::from("widget"))))
        .finish()
        .unwrap();
    let derived = TypeBuilder::class("Button")
        .extends(&base)
        .property(PropertyDefinition::new("Kind", TypeHandle::string()).getter(|_| Ok(Value::from("button"))))
        .finish()
        .unwrap();

    let snapshot = get_type_snapshot(&derived, MemberFilter::DEFAULT);
    assert_eq!(snapshot.properties().len(), 1);
    let kind = snapshot.property("Kind").unwrap();
    assert_eq!(kind.get(&derived.instantiate()).unwrap(), Value::from("button"));
}

#[test]
fn test_collection_equality_ignores_order() {
    let ty = common::counter();
    let snapshot = build_type_snapshot(&ty, MemberFilter::DEFAULT);
    let mut accessors: Vec<_> = snapshot.fields().iter().cloned().collect();
    accessors.reverse();
    let reversed = MemberCollection::build(accessors);
    assert_eq!(&reversed, snapshot.fields());
}
