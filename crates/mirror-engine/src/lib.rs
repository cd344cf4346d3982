//! Mirror Reflection Engine
//!
//! Compiles the members of host types into callable objects and caches them:
//! - **Accessors**: uniform get/set over fields and properties (`accessor`)
//! - **Invokers**: method calls with binding, write-back, and virtual dispatch (`invoker`)
//! - **Constructors**: overload resolution, default and copy construction (`construct`)
//! - **Snapshots**: the compiled member set of a (type, filter) pair (`snapshot`, `cache`)
//! - **Attributes**: lookup with inheritance folding (`attributes`)
//!
//! # Example
//!
//! ```rust,ignore
//! use mirror_engine::{get_type_snapshot, construct, ObjectView};
//! use mirror_types::{FieldDefinition, MemberFilter, TypeBuilder, TypeHandle, Value};
//!
//! let point = TypeBuilder::class("Point")
//!     .field(FieldDefinition::new("x", TypeHandle::i32()))
//!     .finish()?;
//!
//! let snapshot = get_type_snapshot(&point, MemberFilter::DEFAULT);
//! let mut instance = construct(&point)?;
//! snapshot.field("x").unwrap().set(&mut instance, Value::I32(3))?;
//!
//! let view = ObjectView::new(instance, MemberFilter::DEFAULT)?;
//! assert_eq!(view.get_field_value("x")?, Some(Value::I32(3)));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod accessor;
pub mod attributes;
mod binder;
pub mod cache;
pub mod collection;
pub mod config;
pub mod construct;
pub mod error;
pub mod invoker;
pub mod snapshot;
pub mod view;

pub use accessor::{Accessor, Getter, MemberRef, Setter};
pub use attributes::AttributeQuery;
pub use cache::{build_type_snapshot, get_type_snapshot, TypeCache};
pub use collection::MemberCollection;
pub use config::{CacheConfig, ConfigError, ConstructorConfig, MembersConfig, MirrorConfig};
pub use construct::{
    construct, construct_with, copy, has_copy_constructor, has_default_constructor,
    try_construct, try_construct_with, try_copy, ConstructorResolver, Factory, ResolverOptions,
};
pub use error::{AccessorKind, Attempt, MirrorError, MirrorResult, ReadOnly};
pub use invoker::Invoker;
pub use snapshot::TypeSnapshot;
pub use view::ObjectView;
