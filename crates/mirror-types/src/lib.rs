//! Mirror Host Object Model
//!
//! Type handles, dynamic values, member descriptors, and the metadata provider
//! consumed by `mirror-engine`.
//!
//! Types are defined with [`TypeBuilder`] and live for the rest of the process;
//! a [`TypeHandle`] is a cheap, identity-compared reference to one of them.
//! The engine never inspects type definitions directly: it asks a
//! [`MetadataProvider`] to enumerate members, and [`Reflector`] is the default
//! provider over the definitions built here.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod error;
pub mod filter;
pub mod member;
pub mod provider;
pub mod ty;
pub mod value;

pub use builder::{
    ConstructorDefinition, FieldDefinition, MethodDefinition, ParameterDefinition,
    PropertyDefinition, TypeBuilder,
};
pub use error::TypeError;
pub use filter::MemberFilter;
pub use member::{
    AttributeInstance, AttributeTarget, ConstructorBody, ConstructorDef, FieldDef, HostError,
    MethodBody, MethodDef, ParamKind, ParameterDef, PropertyDef, Visibility,
};
pub use provider::{MetadataProvider, Reflector};
pub use ty::{AttributeUsage, PrimitiveKind, TypeFlags, TypeHandle, TypeKind};
pub use value::{Array, ArrayRef, EnumValue, Object, ObjectRef, StructValue, Value};
