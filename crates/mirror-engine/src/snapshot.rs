//! Type snapshots
//!
//! A snapshot is the compiled member set of one (type, filter) pair: field
//! and property accessors with hiding resolved, a method table, constructor
//! factories, and attribute queries.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use mirror_types::{
    AttributeInstance, AttributeTarget, MemberFilter, MetadataProvider, MethodDef, TypeHandle,
};

use crate::accessor::Accessor;
use crate::attributes::AttributeQuery;
use crate::collection::MemberCollection;
use crate::construct::Factory;
use crate::error::MirrorResult;
use crate::invoker::Invoker;

/// Compiled members of one type under one filter
pub struct TypeSnapshot {
    ty: TypeHandle,
    filter: MemberFilter,
    provider: Arc<dyn MetadataProvider>,
    fields: MemberCollection,
    properties: MemberCollection,
    methods: IndexMap<String, Vec<Invoker>>,
    constructors: Vec<Factory>,
    attributes: AttributeQuery,
}

impl TypeSnapshot {
    /// Resolve and compile every member of `ty` selected by `filter`
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %ty, filter = %filter))]
    pub fn build(provider: Arc<dyn MetadataProvider>, ty: &TypeHandle, filter: MemberFilter) -> Self {
        let fields = MemberCollection::build(
            provider
                .list_fields(ty, filter)
                .iter()
                .map(Accessor::for_field),
        );
        let properties = MemberCollection::build(
            provider
                .list_properties(ty, filter)
                .iter()
                .map(Accessor::for_property),
        );
        let methods = method_table(provider.list_methods(ty, filter));

        let constructors = provider
            .list_constructors(ty)
            .iter()
            .filter(|c| {
                if c.visibility.is_public() {
                    filter.contains(MemberFilter::PUBLIC)
                } else {
                    filter.contains(MemberFilter::NON_PUBLIC)
                }
            })
            .map(Factory::new)
            .collect::<Vec<_>>();

        let attributes = AttributeQuery::new(provider.as_ref(), AttributeTarget::Type(ty.clone()));

        tracing::debug!(
            fields = fields.len(),
            properties = properties.len(),
            methods = methods.values().map(Vec::len).sum::<usize>(),
            constructors = constructors.len(),
            "built type snapshot"
        );

        Self {
            ty: ty.clone(),
            filter,
            provider,
            fields,
            properties,
            methods,
            constructors,
            attributes,
        }
    }

    /// Snapshot type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Filter the snapshot was built with
    pub fn filter(&self) -> MemberFilter {
        self.filter
    }

    /// Field accessors
    pub fn fields(&self) -> &MemberCollection {
        &self.fields
    }

    /// Property accessors
    pub fn properties(&self) -> &MemberCollection {
        &self.properties
    }

    /// Field accessor by name
    pub fn field(&self, name: &str) -> Option<&Accessor> {
        self.fields.get(name)
    }

    /// Property accessor by name
    pub fn property(&self, name: &str) -> Option<&Accessor> {
        self.properties.get(name)
    }

    /// Overloads of method `name`; empty if unknown
    pub fn methods(&self, name: &str) -> &[Invoker] {
        self.methods.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Overload of method `name` taking `arity` parameters
    pub fn method(&self, name: &str, arity: usize) -> Option<&Invoker> {
        self.methods(name).iter().find(|m| m.arity() == arity)
    }

    /// Method names in order
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Constructor factories declared on the type
    pub fn constructors(&self) -> &[Factory] {
        &self.constructors
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Type-level attribute query
    pub fn attributes(&self) -> &AttributeQuery {
        &self.attributes
    }

    /// Whether a type-level attribute of `kind` applies
    pub fn has_attribute(&self, kind: &TypeHandle, inherit: bool) -> MirrorResult<bool> {
        self.attributes.has(kind, inherit)
    }

    /// First type-level attribute of `kind`
    pub fn get_attribute(
        &self,
        kind: &TypeHandle,
        inherit: bool,
    ) -> MirrorResult<Option<AttributeInstance>> {
        self.attributes.get(kind, inherit)
    }

    /// Every type-level attribute of `kind`
    pub fn get_all_attributes(
        &self,
        kind: &TypeHandle,
        inherit: bool,
    ) -> MirrorResult<Vec<AttributeInstance>> {
        self.attributes.get_all(kind, inherit)
    }

    /// Attribute query for field `name`
    pub fn field_attributes(&self, name: &str) -> Option<AttributeQuery> {
        self.field(name)
            .map(|a| AttributeQuery::new(self.provider.as_ref(), a.member().attribute_target()))
    }

    /// Attribute query for property `name`, following overridden declarations
    pub fn property_attributes(&self, name: &str) -> Option<AttributeQuery> {
        self.property(name)
            .map(|a| AttributeQuery::new(self.provider.as_ref(), a.member().attribute_target()))
    }

    /// Attribute query for the `arity` overload of method `name`
    pub fn method_attributes(&self, name: &str, arity: usize) -> Option<AttributeQuery> {
        self.method(name, arity).map(|m| {
            AttributeQuery::new(
                self.provider.as_ref(),
                AttributeTarget::Method(Arc::clone(m.method())),
            )
        })
    }
}

impl fmt::Debug for TypeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSnapshot")
            .field("ty", &self.ty)
            .field("filter", &self.filter)
            .field("fields", &self.fields.len())
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Name-keyed invoker overloads; listed most-derived first
///
/// A method is dropped when an already-kept one has the same signature
/// (hide-by-signature) or overrides it.
fn method_table(methods: Vec<Arc<MethodDef>>) -> IndexMap<String, Vec<Invoker>> {
    let mut kept: Vec<Arc<MethodDef>> = Vec::new();
    for method in methods {
        let hidden = kept
            .iter()
            .any(|k| k.same_signature(&method) || k.overrides_method(&method));
        if hidden {
            tracing::trace!(member = %method.name, declaring = %method.declaring, "dropping hidden method");
            continue;
        }
        kept.push(method);
    }

    let mut table: IndexMap<String, Vec<Invoker>> = IndexMap::new();
    for method in &kept {
        table
            .entry(method.name.clone())
            .or_default()
            .push(Invoker::new(method));
    }
    table
}
