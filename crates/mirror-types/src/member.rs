//! Member descriptors
//!
//! Descriptors are immutable once their type is defined and are shared as
//! `Arc`s; the engine compares members by descriptor identity.

use std::fmt;
use std::sync::Arc;

use crate::ty::TypeHandle;
use crate::value::Value;

/// Failure raised by a host callable
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

/// Method implementation: `(target, args) -> result`
///
/// `target` is `Value::Null` for static methods. Write-back parameters are
/// assigned by writing into `args`.
pub type MethodBody =
    Arc<dyn Fn(&mut Value, &mut [Value]) -> Result<Value, HostError> + Send + Sync>;

/// Constructor implementation, run against a default-initialized instance
pub type ConstructorBody =
    Arc<dyn Fn(&mut Value, &mut [Value]) -> Result<(), HostError> + Send + Sync>;

/// Accessibility bucket of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    /// Declaring type only
    Private,
    /// Declaring type and derived types
    Protected,
    /// Same assembly
    Internal,
    /// Everyone
    Public,
}

impl Visibility {
    /// Whether the member is public
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// Passing convention of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// By value
    Normal,
    /// The callee writes a result back into the caller's argument slot
    WriteBack,
    /// Trailing array accepting zero or more values
    Variadic,
}

/// A formal parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDef {
    /// Parameter name
    pub name: String,
    /// Declared type (an array type for variadic parameters)
    pub ty: TypeHandle,
    /// Passing convention
    pub kind: ParamKind,
}

impl ParameterDef {
    /// Write-back parameter
    pub fn is_write_back(&self) -> bool {
        self.kind == ParamKind::WriteBack
    }

    /// Variadic tail
    pub fn is_variadic(&self) -> bool {
        self.kind == ParamKind::Variadic
    }
}

/// Declared attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInstance {
    /// Attribute type
    pub ty: TypeHandle,
    /// Constructor arguments captured at declaration
    pub args: Vec<Value>,
}

impl AttributeInstance {
    /// Attribute without arguments
    pub fn new(ty: TypeHandle) -> Self {
        Self { ty, args: Vec::new() }
    }

    /// Attribute with arguments
    pub fn with_args(ty: TypeHandle, args: Vec<Value>) -> Self {
        Self { ty, args }
    }
}

/// A field declaration
#[derive(Debug)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Type that declares the field
    pub declaring: TypeHandle,
    /// Declared type
    pub declared_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Static field
    pub is_static: bool,
    /// Compile-time constant
    pub is_literal: bool,
    /// Constant value of a literal field
    pub constant: Option<Value>,
    /// Storage slot: instance layout index, or static slot on the declaring type
    pub slot: usize,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
}

impl FieldDef {
    /// Read-only (literal) field
    pub fn is_read_only(&self) -> bool {
        self.is_literal
    }
}

/// A method declaration
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Type that declares the method
    pub declaring: TypeHandle,
    /// Formal parameters
    pub params: Vec<ParameterDef>,
    /// Return type, `None` for no result
    pub return_type: Option<TypeHandle>,
    /// Accessibility
    pub visibility: Visibility,
    /// Static method
    pub is_static: bool,
    /// Virtual (overridable) method
    pub is_virtual: bool,
    /// Base declaration this method overrides
    pub overrides: Option<Arc<MethodDef>>,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
    /// Implementation
    pub body: MethodBody,
}

impl MethodDef {
    /// Number of formal parameters (a variadic tail counts as one)
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Ends in a variadic tail
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(ParameterDef::is_variadic)
    }

    /// Same name, parameter types and parameter kinds
    pub fn same_signature(&self, other: &MethodDef) -> bool {
        self.name == other.name && same_params(&self.params, &other.params)
    }

    /// Whether this method overrides `base`, directly or transitively
    pub fn overrides_method(&self, base: &MethodDef) -> bool {
        let mut current = self.overrides.as_deref();
        while let Some(method) = current {
            if std::ptr::eq(method, base) {
                return true;
            }
            current = method.overrides.as_deref();
        }
        false
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("declaring", &self.declaring)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

pub(crate) fn same_params(a: &[ParameterDef], b: &[ParameterDef]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.ty == y.ty && x.kind == y.kind)
}

/// A property declaration
#[derive(Debug)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Type that declares the property
    pub declaring: TypeHandle,
    /// Declared type
    pub declared_type: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Static property
    pub is_static: bool,
    /// Accessors may be overridden by derived types
    pub is_virtual: bool,
    /// Get accessor
    pub getter: Option<Arc<MethodDef>>,
    /// Set accessor
    pub setter: Option<Arc<MethodDef>>,
    /// Base declaration this property overrides
    pub overrides: Option<Arc<PropertyDef>>,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
}

impl PropertyDef {
    /// Has a get accessor
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    /// Has a set accessor
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }
}

/// A constructor declaration
pub struct ConstructorDef {
    /// Type that declares the constructor
    pub declaring: TypeHandle,
    /// Formal parameters
    pub params: Vec<ParameterDef>,
    /// Accessibility
    pub visibility: Visibility,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
    /// Implementation
    pub body: ConstructorBody,
    /// Generated for a type that declared none
    pub synthesized: bool,
}

impl ConstructorDef {
    /// Parameterless constructor with an empty body
    pub fn synthesized(declaring: &TypeHandle, visibility: Visibility) -> Self {
        Self {
            declaring: declaring.clone(),
            params: Vec::new(),
            visibility,
            attributes: Vec::new(),
            body: Arc::new(|_: &mut Value, _: &mut [Value]| -> Result<(), HostError> { Ok(()) }),
            synthesized: true,
        }
    }

    /// Number of formal parameters (a variadic tail counts as one)
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Ends in a variadic tail
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(ParameterDef::is_variadic)
    }

    /// Number of parameters before the variadic tail
    pub fn fixed_arity(&self) -> usize {
        if self.is_variadic() {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("declaring", &self.declaring)
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("synthesized", &self.synthesized)
            .finish_non_exhaustive()
    }
}

/// Something that can carry attributes
#[derive(Debug, Clone)]
pub enum AttributeTarget {
    /// A type declaration
    Type(TypeHandle),
    /// A field declaration
    Field(Arc<FieldDef>),
    /// A property declaration
    Property(Arc<PropertyDef>),
    /// A method declaration
    Method(Arc<MethodDef>),
    /// A constructor declaration
    Constructor(Arc<ConstructorDef>),
}

impl AttributeTarget {
    /// The declaration this one inherits attributes from
    ///
    /// Types inherit from their base type; methods and properties from the
    /// declaration they override. Fields and constructors inherit nothing.
    pub fn parent(&self) -> Option<AttributeTarget> {
        match self {
            AttributeTarget::Type(ty) => ty.base().cloned().map(AttributeTarget::Type),
            AttributeTarget::Property(p) => p.overrides.clone().map(AttributeTarget::Property),
            AttributeTarget::Method(m) => m.overrides.clone().map(AttributeTarget::Method),
            AttributeTarget::Field(_) | AttributeTarget::Constructor(_) => None,
        }
    }

    /// Attributes declared on this target itself
    pub fn declared_attributes(&self) -> &[AttributeInstance] {
        match self {
            AttributeTarget::Type(ty) => ty.declared_attributes(),
            AttributeTarget::Field(f) => &f.attributes,
            AttributeTarget::Property(p) => &p.attributes,
            AttributeTarget::Method(m) => &m.attributes,
            AttributeTarget::Constructor(c) => &c.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(ty: TypeHandle, kind: ParamKind) -> ParameterDef {
        ParameterDef {
            name: "p".to_string(),
            ty,
            kind,
        }
    }

    #[test]
    fn test_synthesized_constructor() {
        let ctor = ConstructorDef::synthesized(&TypeHandle::object(), Visibility::Public);
        assert!(ctor.synthesized);
        assert_eq!(ctor.arity(), 0);
        assert!(!ctor.is_variadic());
        let mut target = Value::Null;
        assert!((ctor.body)(&mut target, &mut []).is_ok());
    }

    #[test]
    fn test_same_params_respects_kind() {
        let a = vec![param(TypeHandle::i32(), ParamKind::Normal)];
        let b = vec![param(TypeHandle::i32(), ParamKind::WriteBack)];
        assert!(same_params(&a, &a.clone()));
        assert!(!same_params(&a, &b));
    }

    #[test]
    fn test_visibility_order() {
        assert!(Visibility::Public > Visibility::Private);
        assert!(Visibility::Public.is_public());
        assert!(!Visibility::Internal.is_public());
    }
}
