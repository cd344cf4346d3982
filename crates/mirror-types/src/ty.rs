//! Type handles and type definitions
//!
//! A type is declared first (so members may refer to it, including its own
//! copy constructor) and defined exactly once afterwards. Definitions are
//! never unloaded: a type lives for the rest of the process, which is also
//! why a member referring back to its own declaring type is harmless.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use crate::error::TypeError;
use crate::member::{
    AttributeInstance, ConstructorDef, FieldDef, MethodDef, PropertyDef, Visibility,
};
use crate::value::{EnumValue, Object, StructValue, Value};

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

fn next_type_id() -> u64 {
    NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Primitive types built into the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// IEEE 754 double
    F64,
    /// Immutable string (reference-like)
    String,
    /// Root of every type
    Object,
}

impl PrimitiveKind {
    /// Name of the primitive as it appears in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::String => "string",
            PrimitiveKind::Object => "object",
        }
    }

    /// Whether values of this primitive are copied rather than shared
    pub fn is_value_type(&self) -> bool {
        !matches!(self, PrimitiveKind::String | PrimitiveKind::Object)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Kind of a host type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Built-in primitive
    Primitive(PrimitiveKind),
    /// Reference type with single inheritance
    Class,
    /// Mutable value type
    Struct,
    /// Enumeration over a 64-bit raw value
    Enum,
    /// Interface (never constructible)
    Interface,
    /// Array of the element type
    Array(TypeHandle),
    /// Nullable wrapper around a value type
    Nullable(TypeHandle),
    /// The type-of-a-type metadata object
    Metadata,
}

bitflags! {
    /// Modifiers of a type definition
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// Cannot be instantiated directly
        const ABSTRACT = 0x01;
        /// Holds only static members
        const STATIC = 0x02;
        /// Cannot be derived from
        const SEALED = 0x04;
        /// Open generic definition with unbound type parameters
        const GENERIC_DEFINITION = 0x08;
    }
}

/// Usage declaration of an attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeUsage {
    /// Several instances may decorate the same target
    pub allow_multiple: bool,
    /// Instances on a base declaration apply to derived declarations
    pub inherited: bool,
}

impl Default for AttributeUsage {
    fn default() -> Self {
        Self {
            allow_multiple: false,
            inherited: true,
        }
    }
}

/// Structural part of a type, fixed once the type is defined
#[derive(Debug, Default)]
pub(crate) struct TypeShape {
    pub(crate) flags: TypeFlags,
    pub(crate) base: Option<TypeHandle>,
    pub(crate) interfaces: Vec<TypeHandle>,
    pub(crate) attribute_usage: Option<AttributeUsage>,
    pub(crate) fields: Vec<Arc<FieldDef>>,
    pub(crate) properties: Vec<Arc<PropertyDef>>,
    pub(crate) methods: Vec<Arc<MethodDef>>,
    pub(crate) constructors: Vec<Arc<ConstructorDef>>,
    pub(crate) attributes: Vec<AttributeInstance>,
    /// Declared types of every instance slot, inherited slots first
    pub(crate) layout: Vec<TypeHandle>,
}

struct TypeDef {
    id: u64,
    name: String,
    kind: TypeKind,
    shape: OnceCell<TypeShape>,
    statics: RwLock<Vec<Value>>,
}

/// Identity-compared handle to a host type
///
/// Two handles are equal when they refer to the same definition. Array and
/// nullable handles additionally compare by their element/inner type.
#[derive(Clone)]
pub struct TypeHandle(Arc<TypeDef>);

impl TypeHandle {
    pub(crate) fn declare(name: impl Into<String>, kind: TypeKind) -> Self {
        Self(Arc::new(TypeDef {
            id: next_type_id(),
            name: name.into(),
            kind,
            shape: OnceCell::new(),
            statics: RwLock::new(Vec::new()),
        }))
    }

    fn predefined(name: impl Into<String>, kind: TypeKind, shape: TypeShape) -> Self {
        Self(Arc::new(TypeDef {
            id: next_type_id(),
            name: name.into(),
            kind,
            shape: OnceCell::with_value(shape),
            statics: RwLock::new(Vec::new()),
        }))
    }

    pub(crate) fn define(&self, shape: TypeShape, statics: Vec<Value>) -> Result<(), TypeError> {
        if self.0.shape.get().is_some() {
            return Err(TypeError::AlreadyDefined(self.0.name.clone()));
        }
        *self.0.statics.write() = statics;
        self.0
            .shape
            .set(shape)
            .map_err(|_| TypeError::AlreadyDefined(self.0.name.clone()))
    }

    fn shape(&self) -> Option<&TypeShape> {
        self.0.shape.get()
    }

    // ========================================================================
    // Built-in types
    // ========================================================================

    /// The `object` root type
    pub fn object() -> TypeHandle {
        BUILTINS.object.clone()
    }

    /// The `bool` type
    pub fn bool() -> TypeHandle {
        BUILTINS.bool.clone()
    }

    /// The `i32` type
    pub fn i32() -> TypeHandle {
        BUILTINS.i32.clone()
    }

    /// The `i64` type
    pub fn i64() -> TypeHandle {
        BUILTINS.i64.clone()
    }

    /// The `f64` type
    pub fn f64() -> TypeHandle {
        BUILTINS.f64.clone()
    }

    /// The `string` type
    pub fn string() -> TypeHandle {
        BUILTINS.string.clone()
    }

    /// Abstract base of every attribute type
    pub fn attribute_root() -> TypeHandle {
        BUILTINS.attribute.clone()
    }

    /// The type-of-a-type metadata type
    pub fn metadata() -> TypeHandle {
        BUILTINS.metadata.clone()
    }

    /// Handle of a primitive kind
    pub fn primitive(kind: PrimitiveKind) -> TypeHandle {
        match kind {
            PrimitiveKind::Bool => Self::bool(),
            PrimitiveKind::I32 => Self::i32(),
            PrimitiveKind::I64 => Self::i64(),
            PrimitiveKind::F64 => Self::f64(),
            PrimitiveKind::String => Self::string(),
            PrimitiveKind::Object => Self::object(),
        }
    }

    /// Array type over `element` (interned)
    pub fn array_of(element: &TypeHandle) -> TypeHandle {
        ARRAY_TYPES
            .entry(element.clone())
            .or_insert_with(|| {
                Self::predefined(
                    format!("{}[]", element.name()),
                    TypeKind::Array(element.clone()),
                    TypeShape {
                        flags: TypeFlags::SEALED,
                        base: Some(Self::object()),
                        ..Default::default()
                    },
                )
            })
            .clone()
    }

    /// Nullable wrapper over `inner` (interned)
    pub fn nullable_of(inner: &TypeHandle) -> TypeHandle {
        NULLABLE_TYPES
            .entry(inner.clone())
            .or_insert_with(|| {
                Self::predefined(
                    format!("{}?", inner.name()),
                    TypeKind::Nullable(inner.clone()),
                    TypeShape {
                        flags: TypeFlags::SEALED,
                        ..Default::default()
                    },
                )
            })
            .clone()
    }

    // ========================================================================
    // Identity and structure
    // ========================================================================

    /// Process-unique identifier of the definition
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type kind
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Whether the type has received its definition
    pub fn is_defined(&self) -> bool {
        self.0.shape.get().is_some()
    }

    /// Modifier flags
    pub fn flags(&self) -> TypeFlags {
        self.shape().map(|s| s.flags).unwrap_or_default()
    }

    /// Direct base type
    pub fn base(&self) -> Option<&TypeHandle> {
        self.shape().and_then(|s| s.base.as_ref())
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> &[TypeHandle] {
        self.shape().map(|s| s.interfaces.as_slice()).unwrap_or(&[])
    }

    /// Usage declared directly on this attribute type
    pub fn attribute_usage(&self) -> Option<AttributeUsage> {
        self.shape().and_then(|s| s.attribute_usage)
    }

    /// Usage of this attribute type, inherited from the nearest declaring ancestor
    pub fn effective_attribute_usage(&self) -> AttributeUsage {
        self.ancestors()
            .find_map(|t| t.attribute_usage())
            .unwrap_or_default()
    }

    /// Fields declared directly on this type
    pub fn declared_fields(&self) -> &[Arc<FieldDef>] {
        self.shape().map(|s| s.fields.as_slice()).unwrap_or(&[])
    }

    /// Properties declared directly on this type
    pub fn declared_properties(&self) -> &[Arc<PropertyDef>] {
        self.shape().map(|s| s.properties.as_slice()).unwrap_or(&[])
    }

    /// Methods declared directly on this type
    pub fn declared_methods(&self) -> &[Arc<MethodDef>] {
        self.shape().map(|s| s.methods.as_slice()).unwrap_or(&[])
    }

    /// Constructors declared directly on this type
    pub fn declared_constructors(&self) -> &[Arc<ConstructorDef>] {
        self.shape().map(|s| s.constructors.as_slice()).unwrap_or(&[])
    }

    /// Attributes declared directly on this type
    pub fn declared_attributes(&self) -> &[AttributeInstance] {
        self.shape().map(|s| s.attributes.as_slice()).unwrap_or(&[])
    }

    /// Declared types of every instance slot, inherited slots first
    pub fn instance_layout(&self) -> &[TypeHandle] {
        self.shape().map(|s| s.layout.as_slice()).unwrap_or(&[])
    }

    /// This type followed by each base type up to the root
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Abstract types cannot be instantiated
    pub fn is_abstract(&self) -> bool {
        self.flags().contains(TypeFlags::ABSTRACT)
    }

    /// Static types hold only static members
    pub fn is_static(&self) -> bool {
        self.flags().contains(TypeFlags::STATIC)
    }

    /// Sealed types cannot be derived from
    pub fn is_sealed(&self) -> bool {
        self.flags().contains(TypeFlags::SEALED)
    }

    /// Open generic definition with unbound parameters
    pub fn is_generic_definition(&self) -> bool {
        self.flags().contains(TypeFlags::GENERIC_DEFINITION)
    }

    /// The `object` root
    pub fn is_object_root(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(PrimitiveKind::Object))
    }

    /// Class kind (the `object` root included)
    pub fn is_class(&self) -> bool {
        matches!(self.kind(), TypeKind::Class) || self.is_object_root()
    }

    /// Struct kind
    pub fn is_struct(&self) -> bool {
        matches!(self.kind(), TypeKind::Struct)
    }

    /// Enum kind
    pub fn is_enum(&self) -> bool {
        matches!(self.kind(), TypeKind::Enum)
    }

    /// Interface kind
    pub fn is_interface(&self) -> bool {
        matches!(self.kind(), TypeKind::Interface)
    }

    /// Array kind
    pub fn is_array(&self) -> bool {
        matches!(self.kind(), TypeKind::Array(_))
    }

    /// Nullable wrapper
    pub fn is_nullable(&self) -> bool {
        matches!(self.kind(), TypeKind::Nullable(_))
    }

    /// Type-of-a-type metadata kind
    pub fn is_metadata(&self) -> bool {
        matches!(self.kind(), TypeKind::Metadata)
    }

    /// Built-in primitive (string and object included)
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive(_))
    }

    /// Values of this type are copied on assignment
    pub fn is_value_type(&self) -> bool {
        match self.kind() {
            TypeKind::Primitive(kind) => kind.is_value_type(),
            TypeKind::Struct | TypeKind::Enum | TypeKind::Nullable(_) => true,
            _ => false,
        }
    }

    /// Values of this type are shared references
    pub fn is_reference_type(&self) -> bool {
        !self.is_value_type()
    }

    /// Whether `Value::Null` may be stored in a slot of this type
    pub fn accepts_null(&self) -> bool {
        self.is_reference_type() || self.is_nullable()
    }

    /// Derives from the attribute root
    pub fn is_attribute(&self) -> bool {
        self.is_class() && self.is_subtype_of(&Self::attribute_root())
    }

    /// Element type of an array type
    pub fn element_type(&self) -> Option<&TypeHandle> {
        match self.kind() {
            TypeKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Wrapped type of a nullable type
    pub fn nullable_inner(&self) -> Option<&TypeHandle> {
        match self.kind() {
            TypeKind::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    // ========================================================================
    // Assignability
    // ========================================================================

    /// Whether this type is `other`, derives from it, or implements it
    pub fn is_subtype_of(&self, other: &TypeHandle) -> bool {
        if self == other || other.is_object_root() {
            return true;
        }
        if let (TypeKind::Array(mine), TypeKind::Array(theirs)) = (self.kind(), other.kind()) {
            return mine.is_reference_type() && mine.is_subtype_of(theirs);
        }
        if other.is_interface() {
            return self.ancestors().any(|t| t.implements(other));
        }
        self.ancestors().skip(1).any(|t| &t == other)
    }

    fn implements(&self, interface: &TypeHandle) -> bool {
        self.interfaces()
            .iter()
            .any(|i| i == interface || i.implements(interface))
    }

    /// Whether `value` may be stored in a slot of this type
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.accepts_null();
        }
        if let Some(inner) = self.nullable_inner() {
            return inner.accepts(value);
        }
        value
            .runtime_type()
            .is_some_and(|runtime| runtime.is_subtype_of(self))
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Default value of a slot of this type (zero, false, default struct, or null)
    pub fn default_value(&self) -> Value {
        match self.kind() {
            TypeKind::Primitive(PrimitiveKind::Bool) => Value::Bool(false),
            TypeKind::Primitive(PrimitiveKind::I32) => Value::I32(0),
            TypeKind::Primitive(PrimitiveKind::I64) => Value::I64(0),
            TypeKind::Primitive(PrimitiveKind::F64) => Value::F64(0.0),
            TypeKind::Struct => Value::Struct(StructValue::new(self.clone(), self.layout_defaults())),
            TypeKind::Enum => Value::Enum(EnumValue::new(self.clone(), 0)),
            _ => Value::Null,
        }
    }

    fn layout_defaults(&self) -> Vec<Value> {
        self.instance_layout()
            .iter()
            .map(TypeHandle::default_value)
            .collect()
    }

    /// Fresh default-initialized instance
    ///
    /// Classes get a new object with every slot at its default; every other
    /// kind yields its default value. No constructor runs.
    pub fn instantiate(&self) -> Value {
        if self.is_class() {
            Value::Object(Arc::new(Object::new(self.clone(), self.layout_defaults())))
        } else {
            self.default_value()
        }
    }

    /// Read a static field slot
    pub fn read_static(&self, slot: usize) -> Option<Value> {
        self.0.statics.read().get(slot).cloned()
    }

    /// Write a static field slot; false if the slot does not exist
    pub fn write_static(&self, slot: usize, value: Value) -> bool {
        let mut statics = self.0.statics.write();
        match statics.get_mut(slot) {
            Some(stored) => {
                *stored = value;
                true
            }
            None => false,
        }
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.kind(), other.kind()) {
            (TypeKind::Array(a), TypeKind::Array(b)) => a == b,
            (TypeKind::Nullable(a), TypeKind::Nullable(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.kind() {
            TypeKind::Array(element) => {
                1u8.hash(state);
                element.hash(state);
            }
            TypeKind::Nullable(inner) => {
                2u8.hash(state);
                inner.hash(state);
            }
            _ => {
                0u8.hash(state);
                self.0.id.hash(state);
            }
        }
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.name()).finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iterator over a type and its base types, most derived first
pub struct Ancestors {
    next: Option<TypeHandle>,
}

impl Iterator for Ancestors {
    type Item = TypeHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.base().cloned();
        Some(current)
    }
}

// ============================================================================
// Built-in types
// ============================================================================

struct Builtins {
    object: TypeHandle,
    bool: TypeHandle,
    i32: TypeHandle,
    i64: TypeHandle,
    f64: TypeHandle,
    string: TypeHandle,
    attribute: TypeHandle,
    metadata: TypeHandle,
}

impl Builtins {
    fn create() -> Self {
        let object = TypeHandle::declare("object", TypeKind::Primitive(PrimitiveKind::Object));
        let object_ctor = Arc::new(ConstructorDef::synthesized(&object, Visibility::Public));
        // Fresh handles; a second definition cannot have happened.
        let _ = object.define(
            TypeShape {
                constructors: vec![object_ctor],
                ..Default::default()
            },
            Vec::new(),
        );

        let primitive = |kind: PrimitiveKind| {
            TypeHandle::predefined(
                kind.type_name(),
                TypeKind::Primitive(kind),
                TypeShape {
                    flags: TypeFlags::SEALED,
                    base: (!kind.is_value_type()).then(|| object.clone()),
                    ..Default::default()
                },
            )
        };

        let attribute = TypeHandle::declare("Attribute", TypeKind::Class);
        let attribute_ctor = Arc::new(ConstructorDef::synthesized(&attribute, Visibility::Protected));
        let _ = attribute.define(
            TypeShape {
                flags: TypeFlags::ABSTRACT,
                base: Some(object.clone()),
                attribute_usage: Some(AttributeUsage::default()),
                constructors: vec![attribute_ctor],
                ..Default::default()
            },
            Vec::new(),
        );

        let metadata = TypeHandle::predefined(
            "Type",
            TypeKind::Metadata,
            TypeShape {
                flags: TypeFlags::ABSTRACT,
                base: Some(object.clone()),
                ..Default::default()
            },
        );

        Self {
            bool: primitive(PrimitiveKind::Bool),
            i32: primitive(PrimitiveKind::I32),
            i64: primitive(PrimitiveKind::I64),
            f64: primitive(PrimitiveKind::F64),
            string: primitive(PrimitiveKind::String),
            object,
            attribute,
            metadata,
        }
    }
}

static BUILTINS: Lazy<Builtins> = Lazy::new(Builtins::create);
static ARRAY_TYPES: Lazy<DashMap<TypeHandle, TypeHandle>> = Lazy::new(DashMap::new);
static NULLABLE_TYPES: Lazy<DashMap<TypeHandle, TypeHandle>> = Lazy::new(DashMap::new);
