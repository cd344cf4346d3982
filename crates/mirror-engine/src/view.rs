//! Instance-bound member access

use std::sync::Arc;

use mirror_types::{MemberFilter, Value};

use crate::cache::get_type_snapshot;
use crate::error::{MirrorError, MirrorResult};
use crate::snapshot::TypeSnapshot;

/// A snapshot bound to one instance
///
/// Unknown member names are not errors: getters yield `Ok(None)` and setters
/// `Ok(false)`. Value-type instances are mutated inside the view; take them
/// back with [`ObjectView::into_inner`].
#[derive(Debug)]
pub struct ObjectView {
    snapshot: Arc<TypeSnapshot>,
    instance: Value,
}

impl ObjectView {
    /// View `instance` through the cached snapshot of its runtime type
    pub fn new(instance: Value, filter: MemberFilter) -> MirrorResult<Self> {
        let ty = instance
            .runtime_type()
            .ok_or(MirrorError::NullArgument("instance"))?;
        Ok(Self {
            snapshot: get_type_snapshot(&ty, filter),
            instance,
        })
    }

    /// View `instance` through an existing snapshot
    pub fn bind(snapshot: Arc<TypeSnapshot>, instance: Value) -> MirrorResult<Self> {
        if instance.is_null() {
            return Err(MirrorError::NullArgument("instance"));
        }
        if !snapshot.ty().accepts(&instance) {
            return Err(MirrorError::TypeMismatch {
                expected: snapshot.ty().name().to_string(),
                found: instance.type_name(),
            });
        }
        Ok(Self { snapshot, instance })
    }

    /// Snapshot in use
    pub fn snapshot(&self) -> &Arc<TypeSnapshot> {
        &self.snapshot
    }

    /// Bound instance
    pub fn instance(&self) -> &Value {
        &self.instance
    }

    /// Give back the (possibly mutated) instance
    pub fn into_inner(self) -> Value {
        self.instance
    }

    /// Read field `name`
    pub fn get_field_value(&self, name: &str) -> MirrorResult<Option<Value>> {
        self.snapshot
            .field(name)
            .map(|a| a.get(&self.instance))
            .transpose()
    }

    /// Write field `name`; false if there is no such field
    pub fn set_field_value(&mut self, name: &str, value: Value) -> MirrorResult<bool> {
        match self.snapshot.field(name) {
            Some(accessor) => accessor.set(&mut self.instance, value).map(|()| true),
            None => Ok(false),
        }
    }

    /// Read property `name`
    pub fn get_property_value(&self, name: &str) -> MirrorResult<Option<Value>> {
        self.snapshot
            .property(name)
            .map(|a| a.get(&self.instance))
            .transpose()
    }

    /// Write property `name`; false if there is no such property
    pub fn set_property_value(&mut self, name: &str, value: Value) -> MirrorResult<bool> {
        match self.snapshot.property(name) {
            Some(accessor) => accessor.set(&mut self.instance, value).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::{FieldDefinition, TypeBuilder, TypeHandle};

    #[test]
    fn test_unknown_names_are_not_errors() {
        let ty = TypeBuilder::class("Viewed")
            .field(FieldDefinition::new("x", TypeHandle::i32()))
            .finish()
            .unwrap();
        let mut view = ObjectView::new(ty.instantiate(), MemberFilter::DEFAULT).unwrap();
        assert_eq!(view.get_field_value("nope").unwrap(), None);
        assert!(!view.set_field_value("nope", Value::I32(1)).unwrap());
        assert_eq!(view.get_property_value("nope").unwrap(), None);
        assert!(!view.set_property_value("nope", Value::I32(1)).unwrap());

        assert!(view.set_field_value("x", Value::I32(4)).unwrap());
        assert_eq!(view.get_field_value("x").unwrap(), Some(Value::I32(4)));
    }

    #[test]
    fn test_null_instance_rejected() {
        assert!(matches!(
            ObjectView::new(Value::Null, MemberFilter::DEFAULT),
            Err(MirrorError::NullArgument("instance"))
        ));
    }

    #[test]
    fn test_struct_mutation_written_back_through_into_inner() {
        let point = TypeBuilder::structure("ViewPoint")
            .field(FieldDefinition::new("x", TypeHandle::i32()))
            .finish()
            .unwrap();
        let original = point.instantiate();
        let mut view = ObjectView::new(original.clone(), MemberFilter::DEFAULT).unwrap();
        view.set_field_value("x", Value::I32(8)).unwrap();
        let updated = view.into_inner();

        let x = |v: &Value| v.as_struct().and_then(|s| s.get_field(0)).cloned();
        assert_eq!(x(&updated), Some(Value::I32(8)));
        assert_eq!(x(&original), Some(Value::I32(0)));
    }
}
