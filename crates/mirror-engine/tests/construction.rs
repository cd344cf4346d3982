//! Integration tests for constructor resolution and copying

mod common;

use mirror_engine::{
    construct, construct_with, copy, has_copy_constructor, has_default_constructor,
    try_construct, try_construct_with, try_copy, MirrorError,
};
use mirror_types::{
    ConstructorDefinition, FieldDefinition, ParameterDefinition, TypeBuilder, TypeHandle, Value,
};

#[test]
fn test_default_construction_matches_plain_instantiation() {
    let ty = TypeBuilder::class("EmptyClass")
        .field(FieldDefinition::new("n", TypeHandle::i32()))
        .field(FieldDefinition::new("flag", TypeHandle::bool()))
        .finish()
        .unwrap();

    assert!(has_default_constructor(&ty));
    let made = construct(&ty).unwrap();
    let plain = ty.instantiate();

    assert_eq!(made.runtime_type(), plain.runtime_type());
    let (made, plain) = (made.as_object().unwrap(), plain.as_object().unwrap());
    assert_eq!(made.field_count(), plain.field_count());
    for i in 0..made.field_count() {
        assert_eq!(made.get_field(i), plain.get_field(i));
    }
}

#[test]
fn test_parameter_count_mismatch_has_no_matching_constructor() {
    let ty = TypeBuilder::class("ClassWithOnly")
        .constructor(
            ConstructorDefinition::empty()
                .param(ParameterDefinition::new("a", TypeHandle::i32()))
                .param(ParameterDefinition::new("b", TypeHandle::f64())),
        )
        .finish()
        .unwrap();

    assert!(matches!(
        construct_with(&ty, Some(&[Value::I32(12)])),
        Err(MirrorError::NoMatchingConstructor { .. })
    ));
    assert!(construct_with(&ty, Some(&[Value::I32(12), Value::F64(1.5)])).is_ok());
    assert!(!has_default_constructor(&ty));
}

#[test]
fn test_variadic_tails_with_no_trailing_args_are_ambiguous() {
    let ty = TypeBuilder::class("Joiner")
        .constructor(
            ConstructorDefinition::empty().param(
                ParameterDefinition::new("numbers", TypeHandle::array_of(&TypeHandle::i32())).as_variadic(),
            ),
        )
        .constructor(
            ConstructorDefinition::empty().param(
                ParameterDefinition::new("words", TypeHandle::array_of(&TypeHandle::string())).as_variadic(),
            ),
        )
        .finish()
        .unwrap();

    assert!(matches!(
        construct_with(&ty, Some(&[])),
        Err(MirrorError::AmbiguousMatch { candidates: 2, .. })
    ));
    assert!(matches!(construct(&ty), Err(MirrorError::AmbiguousMatch { .. })));

    // One element type disambiguates
    assert!(construct_with(&ty, Some(&[Value::I32(1), Value::I32(2)])).is_ok());
    assert!(construct_with(&ty, Some(&[Value::from("a")])).is_ok());
}

#[test]
fn test_throwing_constructor_is_wrapped() {
    let ty = TypeBuilder::class("ThrowingCtor")
        .constructor(ConstructorDefinition::new(common::failing))
        .finish()
        .unwrap();

    match construct(&ty) {
        Err(MirrorError::ConstructionRaised { ty: name, source }) => {
            assert_eq!(name, "ThrowingCtor");
            assert_eq!(source.to_string(), "constructor exploded");
        }
        other => panic!("expected ConstructionRaised, got {:?}", other),
    }

    let attempt = try_construct(&ty);
    assert!(!attempt.is_ok());
    assert!(attempt.value.is_none());
    assert!(matches!(attempt.error, Some(MirrorError::ConstructionRaised { .. })));

    let attempt = try_construct_with(&ty, None);
    assert!(matches!(attempt.error, Some(MirrorError::NullArgument("args"))));
}

#[test]
fn test_copy_constructor_must_match_exactly() {
    let (money, coin) = common::copyable_hierarchy();

    assert!(has_copy_constructor(&money));
    assert!(!has_copy_constructor(&coin));

    let mut original = construct(&money).unwrap();
    common::set_slot(&mut original, 0, Value::I64(250));
    let copied = copy(&money, &original).unwrap();
    assert_eq!(common::slot(&copied, 0), Some(Value::I64(250)));
    assert_ne!(copied, original);

    let a_coin = construct(&coin).unwrap();
    assert!(matches!(
        copy(&coin, &a_coin),
        Err(MirrorError::NoCopyConstructor { .. })
    ));
    assert!(matches!(
        try_copy(&coin, &a_coin).error,
        Some(MirrorError::NoCopyConstructor { .. })
    ));
}

#[test]
fn test_copy_fiction_for_value_like_types() -> anyhow::Result<()> {
    assert!(has_copy_constructor(&TypeHandle::string()));
    assert_eq!(copy(&TypeHandle::string(), &Value::from("abc"))?, Value::from("abc"));
    assert_eq!(copy(&TypeHandle::i32(), &Value::I32(9))?, Value::I32(9));
    assert_eq!(copy(&TypeHandle::string(), &Value::Null)?, Value::Null);

    assert!(!has_copy_constructor(&TypeHandle::object()));
    assert!(matches!(
        copy(&TypeHandle::i32(), &Value::from("nine")),
        Err(MirrorError::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_struct_with_no_args_default_initializes() -> anyhow::Result<()> {
    let point = TypeBuilder::structure("Pair")
        .field(FieldDefinition::new("left", TypeHandle::i32()))
        .field(FieldDefinition::new("right", TypeHandle::i32()))
        .finish()?;

    let made = construct_with(&point, Some(&[]))?;
    let fields = made.as_struct().map(|s| s.fields().to_vec());
    assert_eq!(fields, Some(vec![Value::I32(0), Value::I32(0)]));
    assert!(has_copy_constructor(&point));
    Ok(())
}
