//! Compiled field and property accessors
//!
//! All resolution (slot lookup, constant capture, accessor method selection)
//! happens once in [`Accessor::for_field`] / [`Accessor::for_property`]; the
//! resulting closures only check the target and touch storage.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use mirror_types::{AttributeTarget, FieldDef, PropertyDef, TypeHandle, Value, Visibility};

use crate::error::{AccessorKind, MirrorError, MirrorResult, ReadOnly};
use crate::invoker::Invoker;

/// Compiled read closure
pub type Getter = Arc<dyn Fn(&Value) -> MirrorResult<Value> + Send + Sync>;

/// Compiled write closure; value-type targets are mutated in the caller's slot
pub type Setter = Arc<dyn Fn(&mut Value, Value) -> MirrorResult<()> + Send + Sync>;

/// The member an accessor was compiled from
#[derive(Debug, Clone)]
pub enum MemberRef {
    /// A field
    Field(Arc<FieldDef>),
    /// A property
    Property(Arc<PropertyDef>),
}

impl MemberRef {
    /// Member name
    pub fn name(&self) -> &str {
        match self {
            MemberRef::Field(f) => &f.name,
            MemberRef::Property(p) => &p.name,
        }
    }

    /// Declaring type
    pub fn declaring(&self) -> &TypeHandle {
        match self {
            MemberRef::Field(f) => &f.declaring,
            MemberRef::Property(p) => &p.declaring,
        }
    }

    /// Declared type
    pub fn declared_type(&self) -> &TypeHandle {
        match self {
            MemberRef::Field(f) => &f.declared_type,
            MemberRef::Property(p) => &p.declared_type,
        }
    }

    /// Static member
    pub fn is_static(&self) -> bool {
        match self {
            MemberRef::Field(f) => f.is_static,
            MemberRef::Property(p) => p.is_static,
        }
    }

    /// Accessibility
    pub fn visibility(&self) -> Visibility {
        match self {
            MemberRef::Field(f) => f.visibility,
            MemberRef::Property(p) => p.visibility,
        }
    }

    /// The member as an attribute target
    pub fn attribute_target(&self) -> AttributeTarget {
        match self {
            MemberRef::Field(f) => AttributeTarget::Field(Arc::clone(f)),
            MemberRef::Property(p) => AttributeTarget::Property(Arc::clone(p)),
        }
    }

    fn addr(&self) -> usize {
        match self {
            MemberRef::Field(f) => Arc::as_ptr(f) as *const () as usize,
            MemberRef::Property(p) => Arc::as_ptr(p) as *const () as usize,
        }
    }
}

impl PartialEq for MemberRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MemberRef::Field(a), MemberRef::Field(b)) => Arc::ptr_eq(a, b),
            (MemberRef::Property(a), MemberRef::Property(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for MemberRef {}

/// Getter/setter pair for one field or property
#[derive(Clone)]
pub struct Accessor {
    member: MemberRef,
    getter: Getter,
    setter: Setter,
}

impl Accessor {
    /// Compile a field accessor
    pub fn for_field(field: &Arc<FieldDef>) -> Self {
        let member = MemberRef::Field(Arc::clone(field));
        let name = field.name.clone();

        if field.is_literal {
            let constant = field.constant.clone().unwrap_or(Value::Null);
            let reason = if field.declaring.is_enum() {
                ReadOnly::EnumValue
            } else {
                ReadOnly::Literal
            };
            return Self {
                member,
                getter: Arc::new(move |_: &Value| -> MirrorResult<Value> {
                    Ok(constant.clone())
                }),
                setter: Arc::new(move |_: &mut Value, _: Value| -> MirrorResult<()> {
                    Err(MirrorError::NotWritable {
                        member: name.clone(),
                        reason,
                    })
                }),
            };
        }

        let declaring = field.declaring.clone();
        let declared_type = field.declared_type.clone();
        let slot = field.slot;

        if field.is_static {
            let read_from = declaring.clone();
            return Self {
                member,
                getter: Arc::new(move |_: &Value| -> MirrorResult<Value> {
                    Ok(read_from.read_static(slot).unwrap_or(Value::Null))
                }),
                setter: Arc::new(move |_: &mut Value, value: Value| -> MirrorResult<()> {
                    check_value(&declared_type, &value)?;
                    declaring.write_static(slot, value);
                    Ok(())
                }),
            };
        }

        let get_name = name.clone();
        let get_declaring = declaring.clone();
        Self {
            member,
            getter: Arc::new(move |target: &Value| -> MirrorResult<Value> {
                match target {
                    Value::Null => Err(MirrorError::TargetRequired {
                        member: get_name.clone(),
                    }),
                    Value::Object(obj) if obj.ty().is_subtype_of(&get_declaring) => {
                        Ok(obj.get_field(slot).unwrap_or(Value::Null))
                    }
                    Value::Struct(s) if s.ty() == &get_declaring => {
                        Ok(s.get_field(slot).cloned().unwrap_or(Value::Null))
                    }
                    other => Err(wrong_target(&get_name, &get_declaring, other)),
                }
            }),
            setter: Arc::new(move |target: &mut Value, value: Value| -> MirrorResult<()> {
                let owned = match &*target {
                    Value::Null => {
                        return Err(MirrorError::TargetRequired {
                            member: name.clone(),
                        })
                    }
                    Value::Object(obj) => obj.ty().is_subtype_of(&declaring),
                    Value::Struct(s) => s.ty() == &declaring,
                    _ => false,
                };
                if !owned {
                    return Err(wrong_target(&name, &declaring, target));
                }
                check_value(&declared_type, &value)?;
                match target {
                    Value::Object(obj) => {
                        obj.set_field(slot, value);
                    }
                    Value::Struct(s) => {
                        s.set_field(slot, value);
                    }
                    _ => {}
                }
                Ok(())
            }),
        }
    }

    /// Compile a property accessor
    pub fn for_property(property: &Arc<PropertyDef>) -> Self {
        let member = MemberRef::Property(Arc::clone(property));
        let is_static = property.is_static;

        let getter: Getter = {
            let name = property.name.clone();
            let invoker = property.getter.as_ref().map(Invoker::new);
            Arc::new(move |target: &Value| -> MirrorResult<Value> {
                if !is_static && target.is_null() {
                    return Err(MirrorError::TargetRequired {
                        member: name.clone(),
                    });
                }
                let invoker = invoker.as_ref().ok_or_else(|| MirrorError::NoAccessor {
                    member: name.clone(),
                    kind: AccessorKind::Getter,
                })?;
                let mut receiver = target.clone();
                invoker.invoke(&mut receiver, &mut [])
            })
        };

        let setter: Setter = {
            let name = property.name.clone();
            let invoker = property.setter.as_ref().map(Invoker::new);
            Arc::new(move |target: &mut Value, value: Value| -> MirrorResult<()> {
                if !is_static && target.is_null() {
                    return Err(MirrorError::TargetRequired {
                        member: name.clone(),
                    });
                }
                let invoker = invoker.as_ref().ok_or_else(|| MirrorError::NoAccessor {
                    member: name.clone(),
                    kind: AccessorKind::Setter,
                })?;
                invoker.invoke(target, &mut [value]).map(|_| ())
            })
        };

        Self {
            member,
            getter,
            setter,
        }
    }

    /// Read the member; `target` is ignored for static members
    pub fn get(&self, target: &Value) -> MirrorResult<Value> {
        (self.getter)(target)
    }

    /// Write the member; `target` is ignored for static members
    pub fn set(&self, target: &mut Value, value: Value) -> MirrorResult<()> {
        (self.setter)(target, value)
    }

    /// The compiled member
    pub fn member(&self) -> &MemberRef {
        &self.member
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.member.name()
    }

    /// Declaring type
    pub fn declaring(&self) -> &TypeHandle {
        self.member.declaring()
    }

    /// Declared type
    pub fn declared_type(&self) -> &TypeHandle {
        self.member.declared_type()
    }

    /// Static member
    pub fn is_static(&self) -> bool {
        self.member.is_static()
    }

    /// Whether `get` can succeed
    pub fn can_read(&self) -> bool {
        match &self.member {
            MemberRef::Field(_) => true,
            MemberRef::Property(p) => p.can_read(),
        }
    }

    /// Whether `set` can succeed
    pub fn can_write(&self) -> bool {
        match &self.member {
            MemberRef::Field(f) => !f.is_read_only(),
            MemberRef::Property(p) => p.can_write(),
        }
    }
}

fn check_value(expected: &TypeHandle, value: &Value) -> MirrorResult<()> {
    if expected.accepts(value) {
        Ok(())
    } else {
        Err(MirrorError::TypeMismatch {
            expected: expected.name().to_string(),
            found: value.type_name(),
        })
    }
}

fn wrong_target(member: &str, declaring: &TypeHandle, target: &Value) -> MirrorError {
    MirrorError::WrongTarget {
        member: member.to_string(),
        expected: declaring.name().to_string(),
        found: target.type_name(),
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        self.member == other.member
    }
}

impl Eq for Accessor {}

impl Hash for Accessor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.addr().hash(state);
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.member {
            MemberRef::Field(_) => "field",
            MemberRef::Property(_) => "property",
        };
        f.debug_struct("Accessor")
            .field("kind", &kind)
            .field("name", &self.name())
            .field("declaring", self.declaring())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::{FieldDefinition, PropertyDefinition, TypeBuilder};

    #[test]
    fn test_instance_field_round_trip() {
        let ty = TypeBuilder::class("Box")
            .field(FieldDefinition::new("value", TypeHandle::i32()))
            .finish()
            .unwrap();
        let accessor = Accessor::for_field(&ty.declared_fields()[0]);
        let mut target = ty.instantiate();

        assert_eq!(accessor.get(&target).unwrap(), Value::I32(0));
        accessor.set(&mut target, Value::I32(3)).unwrap();
        let read = accessor.get(&target).unwrap();
        accessor.set(&mut target, read.clone()).unwrap();
        assert_eq!(accessor.get(&target).unwrap(), read);
    }

    #[test]
    fn test_field_errors() {
        let ty = TypeBuilder::class("Box2")
            .field(FieldDefinition::new("value", TypeHandle::i32()))
            .finish()
            .unwrap();
        let accessor = Accessor::for_field(&ty.declared_fields()[0]);

        assert!(matches!(accessor.get(&Value::Null), Err(MirrorError::TargetRequired { .. })));
        assert!(matches!(
            accessor.set(&mut Value::Null, Value::I32(1)),
            Err(MirrorError::TargetRequired { .. })
        ));
        assert!(matches!(
            accessor.get(&Value::from("nope")),
            Err(MirrorError::WrongTarget { .. })
        ));
        assert!(matches!(
            accessor.set(&mut ty.instantiate(), Value::from("nope")),
            Err(MirrorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_static_field_ignores_target() {
        let ty = TypeBuilder::class("Globals")
            .field(FieldDefinition::new("hits", TypeHandle::i64()).as_static().initial_value(10i64))
            .finish()
            .unwrap();
        let accessor = Accessor::for_field(&ty.declared_fields()[0]);
        assert_eq!(accessor.get(&Value::Null).unwrap(), Value::I64(10));
        accessor.set(&mut Value::from("ignored"), Value::I64(11)).unwrap();
        assert_eq!(accessor.get(&Value::Null).unwrap(), Value::I64(11));
    }

    #[test]
    fn test_literal_and_enum_fields() {
        let ty = TypeBuilder::class("Limits")
            .field(FieldDefinition::new("MAX", TypeHandle::i32()).as_literal().initial_value(99))
            .finish()
            .unwrap();
        let max = Accessor::for_field(&ty.declared_fields()[0]);
        assert_eq!(max.get(&Value::from("whatever")).unwrap(), Value::I32(99));
        assert!(!max.can_write());
        assert!(matches!(
            max.set(&mut Value::Null, Value::I32(1)),
            Err(MirrorError::NotWritable { reason: ReadOnly::Literal, .. })
        ));

        let color = TypeBuilder::enumeration("Shade").value("Dark", 1).finish().unwrap();
        let dark = Accessor::for_field(&color.declared_fields()[0]);
        assert_eq!(dark.get(&Value::Null).unwrap().as_enum().map(|e| e.raw()), Some(1));
        assert!(matches!(
            dark.set(&mut Value::Null, Value::Null),
            Err(MirrorError::NotWritable { reason: ReadOnly::EnumValue, .. })
        ));
    }

    #[test]
    fn test_struct_copies_are_independent() {
        let point = TypeBuilder::structure("Pt")
            .field(FieldDefinition::new("x", TypeHandle::i32()))
            .finish()
            .unwrap();
        let x = Accessor::for_field(&point.declared_fields()[0]);

        let mut original = point.instantiate();
        let copy = original.clone();
        x.set(&mut original, Value::I32(5)).unwrap();
        assert_eq!(x.get(&original).unwrap(), Value::I32(5));
        assert_eq!(x.get(&copy).unwrap(), Value::I32(0));
    }

    #[test]
    fn test_property_without_accessors() {
        let ty = TypeBuilder::class("Bare")
            .property(PropertyDefinition::new("ghost", TypeHandle::i32()))
            .finish()
            .unwrap();
        let ghost = Accessor::for_property(&ty.declared_properties()[0]);
        let mut target = ty.instantiate();
        assert!(matches!(
            ghost.get(&target),
            Err(MirrorError::NoAccessor { kind: AccessorKind::Getter, .. })
        ));
        assert!(matches!(
            ghost.set(&mut target, Value::I32(1)),
            Err(MirrorError::NoAccessor { kind: AccessorKind::Setter, .. })
        ));
        assert!(matches!(ghost.get(&Value::Null), Err(MirrorError::TargetRequired { .. })));
    }

    #[test]
    fn test_property_set_checks_value_type() {
        let ty = TypeBuilder::class("Named")
            .property(
                PropertyDefinition::new("name", TypeHandle::string())
                    .getter(|_| Ok(Value::from("fixed")))
                    .setter(|_, _| Ok(())),
            )
            .finish()
            .unwrap();
        let name = Accessor::for_property(&ty.declared_properties()[0]);
        let mut target = ty.instantiate();
        assert_eq!(name.get(&target).unwrap(), Value::from("fixed"));
        assert!(name.set(&mut target, Value::from("other")).is_ok());
        assert!(matches!(
            name.set(&mut target, Value::I32(1)),
            Err(MirrorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_accessor_equality_is_member_identity() {
        let ty = TypeBuilder::class("Eq")
            .field(FieldDefinition::new("a", TypeHandle::i32()))
            .field(FieldDefinition::new("b", TypeHandle::i32()))
            .finish()
            .unwrap();
        let a1 = Accessor::for_field(&ty.declared_fields()[0]);
        let a2 = Accessor::for_field(&ty.declared_fields()[0]);
        let b = Accessor::for_field(&ty.declared_fields()[1]);
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
    }
}
