//! Metadata provider
//!
//! The engine enumerates members exclusively through [`MetadataProvider`], so
//! hosts with their own metadata sources can plug in. [`Reflector`] is the
//! default provider over [`TypeBuilder`](crate::TypeBuilder) definitions.

use std::sync::Arc;

use crate::filter::MemberFilter;
use crate::member::{
    AttributeInstance, AttributeTarget, ConstructorDef, FieldDef, MethodDef, PropertyDef,
    Visibility,
};
use crate::ty::TypeHandle;

/// Source of member and attribute metadata
pub trait MetadataProvider: Send + Sync {
    /// Fields of `ty` selected by `filter`, most-derived declaring type first
    fn list_fields(&self, ty: &TypeHandle, filter: MemberFilter) -> Vec<Arc<FieldDef>>;

    /// Properties of `ty` selected by `filter`, most-derived declaring type first
    fn list_properties(&self, ty: &TypeHandle, filter: MemberFilter) -> Vec<Arc<PropertyDef>>;

    /// Methods of `ty` selected by `filter`, most-derived declaring type first
    fn list_methods(&self, ty: &TypeHandle, filter: MemberFilter) -> Vec<Arc<MethodDef>>;

    /// Constructors declared directly on `ty`, whatever their visibility
    fn list_constructors(&self, ty: &TypeHandle) -> Vec<Arc<ConstructorDef>>;

    /// Attributes declared directly on `target`
    fn list_attributes(&self, target: &AttributeTarget) -> Vec<AttributeInstance>;
}

trait Member {
    fn visibility(&self) -> Visibility;
    fn is_static(&self) -> bool;
}

impl Member for FieldDef {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn is_static(&self) -> bool {
        self.is_static
    }
}

impl Member for PropertyDef {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn is_static(&self) -> bool {
        self.is_static
    }
}

impl Member for MethodDef {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
    fn is_static(&self) -> bool {
        self.is_static
    }
}

/// Default provider reading type definitions directly
#[derive(Debug, Default, Clone, Copy)]
pub struct Reflector;

impl Reflector {
    /// Create the provider
    pub fn new() -> Self {
        Self
    }

    fn collect<T: Member>(
        ty: &TypeHandle,
        filter: MemberFilter,
        declared: impl Fn(&TypeHandle) -> &[Arc<T>],
    ) -> Vec<Arc<T>> {
        let mut members = Vec::new();
        for (depth, current) in ty.ancestors().enumerate() {
            if depth > 0 && filter.contains(MemberFilter::DECLARED_ONLY) {
                break;
            }
            for member in declared(&current) {
                if depth > 0 {
                    if member.visibility() == Visibility::Private {
                        continue;
                    }
                    if member.is_static() && !filter.contains(MemberFilter::FLATTEN_HIERARCHY) {
                        continue;
                    }
                }
                if filter.matches(member.visibility(), member.is_static()) {
                    members.push(Arc::clone(member));
                }
            }
        }
        members
    }
}

impl MetadataProvider for Reflector {
    fn list_fields(&self, ty: &TypeHandle, filter: MemberFilter) -> Vec<Arc<FieldDef>> {
        Self::collect(ty, filter, TypeHandle::declared_fields)
    }

    fn list_properties(&self, ty: &TypeHandle, filter: MemberFilter) -> Vec<Arc<PropertyDef>> {
        Self::collect(ty, filter, TypeHandle::declared_properties)
    }

    fn list_methods(&self, ty: &TypeHandle, filter: MemberFilter) -> Vec<Arc<MethodDef>> {
        Self::collect(ty, filter, TypeHandle::declared_methods)
    }

    fn list_constructors(&self, ty: &TypeHandle) -> Vec<Arc<ConstructorDef>> {
        ty.declared_constructors().to_vec()
    }

    fn list_attributes(&self, target: &AttributeTarget) -> Vec<AttributeInstance> {
        target.declared_attributes().to_vec()
    }
}
