//! Shared type fixtures for integration tests

#![allow(dead_code)]

use mirror_types::{
    ConstructorDefinition, FieldDefinition, HostError, MethodDefinition, ParameterDefinition,
    PropertyDefinition, TypeBuilder, TypeHandle, Value,
};

/// Write an object slot, ignoring non-objects
pub fn set_slot(target: &mut Value, slot: usize, value: Value) {
    if let Some(obj) = target.as_object() {
        obj.set_field(slot, value);
    }
}

/// Read an object slot
pub fn slot(target: &Value, slot: usize) -> Option<Value> {
    target.as_object().and_then(|obj| obj.get_field(slot))
}

/// `Counter { count: i32, label: string }` with a `Count` property over
/// `count`, a read-only `Doubled` property, and a `double(i32, out i32)` method
pub fn counter() -> TypeHandle {
    TypeBuilder::class("Counter")
        .field(FieldDefinition::new("count", TypeHandle::i32()))
        .field(FieldDefinition::new("label", TypeHandle::string()))
        .property(
            PropertyDefinition::new("Count", TypeHandle::i32())
                .getter(|target| Ok(slot(target, 0).unwrap_or(Value::Null)))
                .setter(|target, value| {
                    set_slot(target, 0, value);
                    Ok(())
                }),
        )
        .property(PropertyDefinition::new("Doubled", TypeHandle::i32()).getter(|target| {
            let count = slot(target, 0).and_then(|v| v.as_i32()).unwrap_or(0);
            Ok(Value::I32(count * 2))
        }))
        .method(
            MethodDefinition::new("double", |_, args| {
                let input = args[0].as_i32().ok_or("expected i32")?;
                args[1] = Value::I32(input * 2);
                Ok(Value::Bool(true))
            })
            .param(ParameterDefinition::new("value", TypeHandle::i32()))
            .param(ParameterDefinition::new("result", TypeHandle::i32()).as_write_back())
            .returns(TypeHandle::bool()),
        )
        .finish()
        .expect("counter fixture")
}

/// `Money(Money)` and a derived `Coin : Money` that declares no copy constructor
pub fn copyable_hierarchy() -> (TypeHandle, TypeHandle) {
    let money = TypeBuilder::class("Money").field(FieldDefinition::new("cents", TypeHandle::i64()));
    let money_ty = money.handle();
    let money = money
        .constructor(ConstructorDefinition::empty())
        .constructor(
            ConstructorDefinition::new(|target, args| {
                set_slot(target, 0, slot(&args[0], 0).unwrap_or(Value::I64(0)));
                Ok(())
            })
            .param(ParameterDefinition::new("other", money_ty)),
        )
        .finish()
        .expect("money fixture");
    let coin = TypeBuilder::class("Coin")
        .extends(&money)
        .finish()
        .expect("coin fixture");
    (money, coin)
}

/// Constructor body that always fails
pub fn failing(_: &mut Value, _: &mut [Value]) -> Result<(), HostError> {
    Err("constructor exploded".into())
}
