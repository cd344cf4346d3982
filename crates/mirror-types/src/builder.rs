//! Type definition builders
//!
//! ```ignore
//! let point = TypeBuilder::structure("Point")
//!     .field(FieldDefinition::new("x", TypeHandle::i32()))
//!     .field(FieldDefinition::new("y", TypeHandle::i32()))
//!     .finish()?;
//! ```
//!
//! [`TypeBuilder::handle`] is available before `finish`, so members may refer
//! to the type being built (a copy constructor taking its own type, say).

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::TypeError;
use crate::member::{
    same_params, AttributeInstance, ConstructorBody, ConstructorDef, FieldDef, HostError,
    MethodBody, MethodDef, ParamKind, ParameterDef, PropertyDef, Visibility,
};
use crate::ty::{AttributeUsage, TypeFlags, TypeHandle, TypeKind, TypeShape};
use crate::value::{EnumValue, Value};

/// Definition for a parameter of a method or constructor
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: TypeHandle,
    /// Written back to the caller's argument slot
    pub write_back: bool,
    /// Trailing variable-arity array
    pub variadic: bool,
}

impl ParameterDefinition {
    /// Plain by-value parameter
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            write_back: false,
            variadic: false,
        }
    }

    /// Mark as write-back (`ref`/`out` style)
    pub fn as_write_back(mut self) -> Self {
        self.write_back = true;
        self
    }

    /// Mark as the variadic tail; the declared type must be an array type
    pub fn as_variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    fn build(&self, member: &str) -> Result<ParameterDef, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidParameter {
            member: member.to_string(),
            param: self.name.clone(),
            reason: reason.to_string(),
        };
        let kind = match (self.write_back, self.variadic) {
            (true, true) => return Err(invalid("a variadic parameter cannot be write-back")),
            (false, true) if !self.ty.is_array() => {
                return Err(invalid("a variadic parameter must have an array type"))
            }
            (false, true) => ParamKind::Variadic,
            (true, false) => ParamKind::WriteBack,
            (false, false) => ParamKind::Normal,
        };
        Ok(ParameterDef {
            name: self.name.clone(),
            ty: self.ty.clone(),
            kind,
        })
    }
}

fn build_params(member: &str, params: &[ParameterDefinition]) -> Result<Vec<ParameterDef>, TypeError> {
    let built = params
        .iter()
        .map(|p| p.build(member))
        .collect::<Result<Vec<_>, _>>()?;
    let last = built.len().saturating_sub(1);
    if let Some((_, p)) = built
        .iter()
        .enumerate()
        .find(|(i, p)| p.is_variadic() && *i != last)
    {
        return Err(TypeError::InvalidParameter {
            member: member.to_string(),
            param: p.name.clone(),
            reason: "the variadic parameter must be last".to_string(),
        });
    }
    Ok(built)
}

/// Definition for a field
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeHandle,
    /// Accessibility
    pub visibility: Visibility,
    /// Static field
    pub is_static: bool,
    /// Compile-time constant
    pub is_literal: bool,
    /// Initial value of a static field, or the constant of a literal
    pub initial_value: Option<Value>,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
}

impl FieldDefinition {
    /// Public instance field
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            is_literal: false,
            initial_value: None,
            attributes: Vec::new(),
        }
    }

    /// Set the accessibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as static field
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as compile-time constant (implies static)
    pub fn as_literal(mut self) -> Self {
        self.is_literal = true;
        self.is_static = true;
        self
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: AttributeInstance) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Definition for a property backed by accessor closures
#[derive(Clone)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Declared type
    pub ty: TypeHandle,
    /// Accessibility of the property and both accessors
    pub visibility: Visibility,
    /// Static property
    pub is_static: bool,
    /// Accessors may be overridden by derived types
    pub is_virtual: bool,
    /// Overrides a virtual base property of the same name
    pub is_override: bool,
    getter: Option<MethodBody>,
    setter: Option<MethodBody>,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
}

impl PropertyDefinition {
    /// Public instance property without accessors
    pub fn new(name: impl Into<String>, ty: TypeHandle) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            is_virtual: false,
            is_override: false,
            getter: None,
            setter: None,
            attributes: Vec::new(),
        }
    }

    /// Set the get accessor; it receives the target (`Null` when static)
    pub fn getter<F>(mut self, get: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(move |target: &mut Value, _: &mut [Value]| get(target)));
        self
    }

    /// Set the set accessor; it receives the target and the new value
    pub fn setter<F>(mut self, set: F) -> Self
    where
        F: Fn(&mut Value, Value) -> Result<(), HostError> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(move |target: &mut Value, args: &mut [Value]| -> Result<Value, HostError> {
            let value = args.first().cloned().unwrap_or(Value::Null);
            set(target, value)?;
            Ok(Value::Null)
        }));
        self
    }

    /// Set the accessibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as static property
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Mark as override of the virtual base property with the same name
    ///
    /// An accessor the override leaves out is inherited from the base.
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self.is_virtual = true;
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: AttributeInstance) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Definition for a method
#[derive(Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Formal parameters
    pub parameters: Vec<ParameterDefinition>,
    /// Return type
    pub return_type: Option<TypeHandle>,
    /// Accessibility
    pub visibility: Visibility,
    /// Static method
    pub is_static: bool,
    /// Virtual method
    pub is_virtual: bool,
    /// Overrides a base method with the same signature
    pub is_override: bool,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
    body: MethodBody,
}

impl MethodDefinition {
    /// Public instance method with the given implementation
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Value, &mut [Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            visibility: Visibility::Public,
            is_static: false,
            is_virtual: false,
            is_override: false,
            attributes: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Add a parameter
    pub fn param(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Set return type
    pub fn returns(mut self, ty: TypeHandle) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Set the accessibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Mark as static method
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as virtual
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Mark as override of the base method with the same signature
    pub fn as_override(mut self) -> Self {
        self.is_override = true;
        self.is_virtual = true;
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: AttributeInstance) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Definition for a constructor
#[derive(Clone)]
pub struct ConstructorDefinition {
    /// Formal parameters
    pub parameters: Vec<ParameterDefinition>,
    /// Accessibility
    pub visibility: Visibility,
    /// Declared attributes
    pub attributes: Vec<AttributeInstance>,
    body: ConstructorBody,
}

impl ConstructorDefinition {
    /// Public constructor with the given body
    ///
    /// The body runs against a default-initialized instance of the type.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Value, &mut [Value]) -> Result<(), HostError> + Send + Sync + 'static,
    {
        Self {
            parameters: Vec::new(),
            visibility: Visibility::Public,
            attributes: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Public constructor that does nothing beyond default initialization
    pub fn empty() -> Self {
        Self::new(|_, _| Ok(()))
    }

    /// Add a parameter
    pub fn param(mut self, param: ParameterDefinition) -> Self {
        self.parameters.push(param);
        self
    }

    /// Set the accessibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as private
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: AttributeInstance) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Builder for a host type
pub struct TypeBuilder {
    handle: TypeHandle,
    flags: TypeFlags,
    base: Option<TypeHandle>,
    interfaces: Vec<TypeHandle>,
    attribute_usage: Option<AttributeUsage>,
    fields: Vec<FieldDefinition>,
    properties: Vec<PropertyDefinition>,
    methods: Vec<MethodDefinition>,
    constructors: Vec<ConstructorDefinition>,
    attributes: Vec<AttributeInstance>,
    values: Vec<(String, i64)>,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            handle: TypeHandle::declare(name, kind),
            flags: TypeFlags::empty(),
            base: None,
            interfaces: Vec::new(),
            attribute_usage: None,
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            attributes: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Start a class deriving from `object`
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Start a struct (mutable value type)
    pub fn structure(name: impl Into<String>) -> Self {
        let mut builder = Self::new(name, TypeKind::Struct);
        builder.flags |= TypeFlags::SEALED;
        builder
    }

    /// Start an enumeration
    pub fn enumeration(name: impl Into<String>) -> Self {
        let mut builder = Self::new(name, TypeKind::Enum);
        builder.flags |= TypeFlags::SEALED;
        builder
    }

    /// Start an interface
    pub fn interface(name: impl Into<String>) -> Self {
        let mut builder = Self::new(name, TypeKind::Interface);
        builder.flags |= TypeFlags::ABSTRACT;
        builder
    }

    /// Start an attribute type deriving from the attribute root
    pub fn attribute(name: impl Into<String>, usage: AttributeUsage) -> Self {
        let mut builder = Self::class(name).extends(&TypeHandle::attribute_root());
        builder.attribute_usage = Some(usage);
        builder
    }

    /// Handle of the type being built
    pub fn handle(&self) -> TypeHandle {
        self.handle.clone()
    }

    /// Set the base class
    pub fn extends(mut self, base: &TypeHandle) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add an implemented interface
    pub fn implements(mut self, interface: &TypeHandle) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declare attribute usage (the type must derive from the attribute root)
    pub fn attribute_usage(mut self, usage: AttributeUsage) -> Self {
        self.attribute_usage = Some(usage);
        self
    }

    /// Mark as abstract
    pub fn abstract_type(mut self) -> Self {
        self.flags |= TypeFlags::ABSTRACT;
        self
    }

    /// Mark as static (abstract and sealed, static members only)
    pub fn static_type(mut self) -> Self {
        self.flags |= TypeFlags::STATIC | TypeFlags::ABSTRACT | TypeFlags::SEALED;
        self
    }

    /// Mark as sealed
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeFlags::SEALED;
        self
    }

    /// Mark as an open generic definition
    pub fn generic_definition(mut self) -> Self {
        self.flags |= TypeFlags::GENERIC_DEFINITION;
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, constructor: ConstructorDefinition) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Add a type-level attribute
    pub fn with_attribute(mut self, attribute: AttributeInstance) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a named enumeration value
    pub fn value(mut self, name: impl Into<String>, raw: i64) -> Self {
        self.values.push((name.into(), raw));
        self
    }

    /// Validate and define the type
    pub fn finish(self) -> Result<TypeHandle, TypeError> {
        let ty = self.handle.clone();
        let name = ty.name().to_string();
        let invalid = |reason: &str| TypeError::InvalidDefinition {
            ty: name.clone(),
            reason: reason.to_string(),
        };

        let base = self.resolve_base()?;
        if !self.values.is_empty() && !ty.is_enum() {
            return Err(invalid("only enumerations declare named values"));
        }
        if self.attribute_usage.is_some()
            && !base
                .as_ref()
                .is_some_and(|b| b.is_subtype_of(&TypeHandle::attribute_root()))
        {
            return Err(invalid("attribute usage on a type that is not an attribute"));
        }
        if let Some(iface) = self.interfaces.iter().find(|i| !i.is_interface()) {
            return Err(invalid(&format!("{} is not an interface", iface.name())));
        }

        // Fields: instance slots extend the base layout, statics get their own storage.
        let mut layout: Vec<TypeHandle> = base
            .as_ref()
            .map(|b| b.instance_layout().to_vec())
            .unwrap_or_default();
        let mut statics = Vec::new();
        let mut fields = Vec::new();
        let mut field_names = HashSet::new();

        for (value_name, raw) in &self.values {
            if !field_names.insert(value_name.clone()) {
                return Err(duplicate(&name, value_name));
            }
            let constant = Value::Enum(EnumValue::new(ty.clone(), *raw));
            statics.push(constant.clone());
            fields.push(Arc::new(FieldDef {
                name: value_name.clone(),
                declaring: ty.clone(),
                declared_type: ty.clone(),
                visibility: Visibility::Public,
                is_static: true,
                is_literal: true,
                constant: Some(constant),
                slot: statics.len() - 1,
                attributes: Vec::new(),
            }));
        }

        for field in &self.fields {
            if !field_names.insert(field.name.clone()) {
                return Err(duplicate(&name, &field.name));
            }
            if field.is_literal && field.initial_value.is_none() {
                return Err(TypeError::MissingConstant {
                    ty: name.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(initial) = &field.initial_value {
                if !field.is_static {
                    return Err(invalid(&format!(
                        "instance field `{}` cannot have an initial value",
                        field.name
                    )));
                }
                if !field.ty.accepts(initial) {
                    return Err(invalid(&format!(
                        "initial value of `{}` is not a {}",
                        field.name,
                        field.ty.name()
                    )));
                }
            }
            if !field.is_static && (ty.is_interface() || ty.is_enum() || self.flags.contains(TypeFlags::STATIC)) {
                return Err(invalid(&format!(
                    "instance field `{}` on a type without instances",
                    field.name
                )));
            }

            let slot = if field.is_static {
                statics.push(
                    field
                        .initial_value
                        .clone()
                        .unwrap_or_else(|| field.ty.default_value()),
                );
                statics.len() - 1
            } else {
                layout.push(field.ty.clone());
                layout.len() - 1
            };
            fields.push(Arc::new(FieldDef {
                name: field.name.clone(),
                declaring: ty.clone(),
                declared_type: field.ty.clone(),
                visibility: field.visibility,
                is_static: field.is_static,
                is_literal: field.is_literal,
                constant: field.is_literal.then(|| field.initial_value.clone()).flatten(),
                slot,
                attributes: field.attributes.clone(),
            }));
        }

        let methods = self.build_methods(&name, base.as_ref())?;
        let properties = self.build_properties(&name, base.as_ref())?;
        let constructors = self.build_constructors(&name)?;

        let shape = TypeShape {
            flags: self.flags,
            base,
            interfaces: self.interfaces,
            attribute_usage: self.attribute_usage,
            fields,
            properties,
            methods,
            constructors,
            attributes: self.attributes,
            layout,
        };
        ty.define(shape, statics)?;
        Ok(ty)
    }

    fn resolve_base(&self) -> Result<Option<TypeHandle>, TypeError> {
        let ty = &self.handle;
        let reject = |reason: String| TypeError::InvalidBase {
            ty: ty.name().to_string(),
            reason,
        };
        match &self.base {
            Some(base) if !ty.is_class() => Err(reject(format!(
                "only classes can derive from {}",
                base.name()
            ))),
            Some(base) if base == ty => Err(reject("a type cannot derive from itself".to_string())),
            Some(base) if !base.is_class() => Err(reject(format!("{} is not a class", base.name()))),
            Some(base) if !base.is_defined() => {
                Err(reject(format!("{} is not defined yet", base.name())))
            }
            Some(base) if base.is_sealed() || base.is_static() => {
                Err(reject(format!("{} cannot be derived from", base.name())))
            }
            Some(base) => Ok(Some(base.clone())),
            None if ty.is_class() => Ok(Some(TypeHandle::object())),
            None => Ok(None),
        }
    }

    fn build_methods(
        &self,
        name: &str,
        base: Option<&TypeHandle>,
    ) -> Result<Vec<Arc<MethodDef>>, TypeError> {
        let mut methods: Vec<Arc<MethodDef>> = Vec::new();
        for method in &self.methods {
            let params = build_params(&method.name, &method.parameters)?;
            if methods
                .iter()
                .any(|m| m.name == method.name && same_params(&m.params, &params))
            {
                return Err(duplicate(name, &method.name));
            }
            let overrides = if method.is_override {
                let found = base.and_then(|b| {
                    b.ancestors().find_map(|t| {
                        t.declared_methods()
                            .iter()
                            .find(|m| {
                                m.is_virtual
                                    && !m.is_static
                                    && m.name == method.name
                                    && same_params(&m.params, &params)
                            })
                            .cloned()
                    })
                });
                match found {
                    Some(m) => Some(m),
                    None => {
                        return Err(TypeError::NothingToOverride {
                            ty: name.to_string(),
                            member: method.name.clone(),
                        })
                    }
                }
            } else {
                None
            };
            methods.push(Arc::new(MethodDef {
                name: method.name.clone(),
                declaring: self.handle.clone(),
                params,
                return_type: method.return_type.clone(),
                visibility: method.visibility,
                is_static: method.is_static,
                is_virtual: method.is_virtual,
                overrides,
                attributes: method.attributes.clone(),
                body: method.body.clone(),
            }));
        }
        Ok(methods)
    }

    fn build_properties(
        &self,
        name: &str,
        base: Option<&TypeHandle>,
    ) -> Result<Vec<Arc<PropertyDef>>, TypeError> {
        let mut properties: Vec<Arc<PropertyDef>> = Vec::new();
        for property in &self.properties {
            if properties.iter().any(|p| p.name == property.name) {
                return Err(duplicate(name, &property.name));
            }
            let overrides = if property.is_override {
                let found = base.and_then(|b| {
                    b.ancestors().find_map(|t| {
                        t.declared_properties()
                            .iter()
                            .find(|p| p.is_virtual && !p.is_static && p.name == property.name)
                            .cloned()
                    })
                });
                match found {
                    Some(p) => Some(p),
                    None => {
                        return Err(TypeError::NothingToOverride {
                            ty: name.to_string(),
                            member: property.name.clone(),
                        })
                    }
                }
            } else {
                None
            };

            let accessor = |prefix: &str,
                            body: &MethodBody,
                            params: Vec<ParameterDef>,
                            return_type: Option<TypeHandle>,
                            base_accessor: Option<Arc<MethodDef>>| {
                Arc::new(MethodDef {
                    name: format!("{}_{}", prefix, property.name),
                    declaring: self.handle.clone(),
                    params,
                    return_type,
                    visibility: property.visibility,
                    is_static: property.is_static,
                    is_virtual: property.is_virtual,
                    overrides: base_accessor,
                    attributes: Vec::new(),
                    body: body.clone(),
                })
            };
            let base_getter = overrides.as_ref().and_then(|p| p.getter.clone());
            let base_setter = overrides.as_ref().and_then(|p| p.setter.clone());
            let getter = match property.getter.as_ref() {
                Some(body) => Some(accessor(
                    "get",
                    body,
                    Vec::new(),
                    Some(property.ty.clone()),
                    base_getter,
                )),
                None => base_getter,
            };
            let setter = match property.setter.as_ref() {
                Some(body) => Some(accessor(
                    "set",
                    body,
                    vec![ParameterDef {
                        name: "value".to_string(),
                        ty: property.ty.clone(),
                        kind: ParamKind::Normal,
                    }],
                    None,
                    base_setter,
                )),
                None => base_setter,
            };

            properties.push(Arc::new(PropertyDef {
                name: property.name.clone(),
                declaring: self.handle.clone(),
                declared_type: property.ty.clone(),
                visibility: property.visibility,
                is_static: property.is_static,
                is_virtual: property.is_virtual,
                getter,
                setter,
                overrides,
                attributes: property.attributes.clone(),
            }));
        }
        Ok(properties)
    }

    fn build_constructors(&self, name: &str) -> Result<Vec<Arc<ConstructorDef>>, TypeError> {
        let ty = &self.handle;
        if !self.constructors.is_empty() && !(ty.is_class() || ty.is_struct()) {
            return Err(TypeError::InvalidDefinition {
                ty: name.to_string(),
                reason: "only classes and structs declare constructors".to_string(),
            });
        }
        if !self.constructors.is_empty() && self.flags.contains(TypeFlags::STATIC) {
            return Err(TypeError::InvalidDefinition {
                ty: name.to_string(),
                reason: "static types cannot declare constructors".to_string(),
            });
        }

        let member = format!("{}::new", name);
        let mut constructors: Vec<Arc<ConstructorDef>> = Vec::new();
        for ctor in &self.constructors {
            let params = build_params(&member, &ctor.parameters)?;
            if constructors.iter().any(|c| same_params(&c.params, &params)) {
                return Err(duplicate(name, "new"));
            }
            constructors.push(Arc::new(ConstructorDef {
                declaring: ty.clone(),
                params,
                visibility: ctor.visibility,
                attributes: ctor.attributes.clone(),
                body: ctor.body.clone(),
                synthesized: false,
            }));
        }

        // Classes that declare nothing get the parameterless one the compiler would emit.
        if constructors.is_empty() && ty.is_class() && !self.flags.contains(TypeFlags::STATIC) {
            let visibility = if self.flags.contains(TypeFlags::ABSTRACT) {
                Visibility::Protected
            } else {
                Visibility::Public
            };
            constructors.push(Arc::new(ConstructorDef::synthesized(ty, visibility)));
        }
        Ok(constructors)
    }
}

fn duplicate(ty: &str, member: &str) -> TypeError {
    TypeError::DuplicateMember {
        ty: ty.to_string(),
        member: member.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_constructor() {
        let ty = TypeBuilder::class("Plain").finish().unwrap();
        let ctors = ty.declared_constructors();
        assert_eq!(ctors.len(), 1);
        assert!(ctors[0].synthesized);
        assert_eq!(ctors[0].visibility, Visibility::Public);

        let abstract_ty = TypeBuilder::class("Shape").abstract_type().finish().unwrap();
        assert_eq!(abstract_ty.declared_constructors()[0].visibility, Visibility::Protected);

        let static_ty = TypeBuilder::class("Util").static_type().finish().unwrap();
        assert!(static_ty.declared_constructors().is_empty());

        let point = TypeBuilder::structure("Point").finish().unwrap();
        assert!(point.declared_constructors().is_empty());
    }

    #[test]
    fn test_layout_extends_base() {
        let base = TypeBuilder::class("Base")
            .field(FieldDefinition::new("a", TypeHandle::i32()))
            .finish()
            .unwrap();
        let derived = TypeBuilder::class("Derived")
            .extends(&base)
            .field(FieldDefinition::new("b", TypeHandle::string()))
            .field(FieldDefinition::new("c", TypeHandle::i32()).as_static())
            .finish()
            .unwrap();

        assert_eq!(derived.instance_layout(), &[TypeHandle::i32(), TypeHandle::string()]);
        assert_eq!(derived.declared_fields()[0].slot, 1);
        assert_eq!(derived.declared_fields()[1].slot, 0);
        assert_eq!(derived.read_static(0), Some(Value::I32(0)));
        assert!(derived.is_subtype_of(&base));
        assert!(!base.is_subtype_of(&derived));
    }

    #[test]
    fn test_duplicate_field() {
        let err = TypeBuilder::class("Dup")
            .field(FieldDefinition::new("x", TypeHandle::i32()))
            .field(FieldDefinition::new("x", TypeHandle::i64()))
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::DuplicateMember { .. }));
    }

    #[test]
    fn test_variadic_must_be_last_array() {
        let noop = |_: &mut Value, _: &mut [Value]| -> Result<Value, HostError> { Ok(Value::Null) };
        let err = TypeBuilder::class("V1")
            .method(
                MethodDefinition::new("m", noop)
                    .param(ParameterDefinition::new("rest", TypeHandle::array_of(&TypeHandle::i32())).as_variadic())
                    .param(ParameterDefinition::new("x", TypeHandle::i32())),
            )
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::InvalidParameter { .. }));

        let err = TypeBuilder::class("V2")
            .method(MethodDefinition::new("m", noop).param(ParameterDefinition::new("rest", TypeHandle::i32()).as_variadic()))
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::InvalidParameter { .. }));

        let err = TypeBuilder::class("V3")
            .method(
                MethodDefinition::new("m", noop).param(
                    ParameterDefinition::new("rest", TypeHandle::array_of(&TypeHandle::i32()))
                        .as_variadic()
                        .as_write_back(),
                ),
            )
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_literal_requires_constant() {
        let err = TypeBuilder::class("Consts")
            .field(FieldDefinition::new("PI", TypeHandle::f64()).as_literal())
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::MissingConstant { .. }));

        let ty = TypeBuilder::class("Consts2")
            .field(FieldDefinition::new("PI", TypeHandle::f64()).as_literal().initial_value(2.5))
            .finish()
            .unwrap();
        let field = &ty.declared_fields()[0];
        assert!(field.is_static && field.is_read_only());
        assert_eq!(field.constant, Some(Value::F64(2.5)));
    }

    #[test]
    fn test_struct_cannot_have_base() {
        let base = TypeBuilder::class("B").finish().unwrap();
        let err = TypeBuilder::structure("S").extends(&base).finish().unwrap_err();
        assert!(matches!(err, TypeError::InvalidBase { .. }));
    }

    #[test]
    fn test_enum_values() {
        let color = TypeBuilder::enumeration("Color").value("Red", 0).value("Green", 1).finish().unwrap();
        let green = &color.declared_fields()[1];
        assert!(green.is_literal);
        assert_eq!(green.constant, Some(Value::Enum(EnumValue::new(color.clone(), 1))));
        assert!(color.is_value_type());
    }

    #[test]
    fn test_override_resolution() {
        let noop = |_: &mut Value, _: &mut [Value]| -> Result<Value, HostError> { Ok(Value::Null) };
        let base = TypeBuilder::class("Animal")
            .method(MethodDefinition::new("speak", noop).as_virtual())
            .finish()
            .unwrap();
        let derived = TypeBuilder::class("Dog")
            .extends(&base)
            .method(MethodDefinition::new("speak", noop).as_override())
            .finish()
            .unwrap();
        let speak = &derived.declared_methods()[0];
        assert!(speak.overrides_method(&base.declared_methods()[0]));

        let err = TypeBuilder::class("Cat")
            .extends(&base)
            .method(MethodDefinition::new("purr", noop).as_override())
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::NothingToOverride { .. }));
    }

    #[test]
    fn test_property_override_requires_virtual_base() {
        let plain = TypeBuilder::class("Plain")
            .property(PropertyDefinition::new("Name", TypeHandle::string()).getter(|_| Ok(Value::Null)))
            .finish()
            .unwrap();
        let err = TypeBuilder::class("PlainChild")
            .extends(&plain)
            .property(PropertyDefinition::new("Name", TypeHandle::string()).as_override())
            .finish()
            .unwrap_err();
        assert!(matches!(err, TypeError::NothingToOverride { .. }));

        let base = TypeBuilder::class("Titled")
            .property(
                PropertyDefinition::new("Title", TypeHandle::string())
                    .getter(|_| Ok(Value::from("base")))
                    .setter(|_, _| Ok(()))
                    .as_virtual(),
            )
            .finish()
            .unwrap();
        let derived = TypeBuilder::class("Retitled")
            .extends(&base)
            .property(
                PropertyDefinition::new("Title", TypeHandle::string())
                    .getter(|_| Ok(Value::from("derived")))
                    .as_override(),
            )
            .finish()
            .unwrap();

        let base_title = &base.declared_properties()[0];
        let title = &derived.declared_properties()[0];
        let getter = title.getter.as_ref().unwrap();
        assert!(getter.is_virtual);
        assert!(getter.overrides_method(base_title.getter.as_ref().unwrap()));
        // The setter the override leaves out is the base one
        assert!(Arc::ptr_eq(title.setter.as_ref().unwrap(), base_title.setter.as_ref().unwrap()));
    }

    #[test]
    fn test_self_referencing_copy_constructor() {
        let builder = TypeBuilder::class("Node");
        let this = builder.handle();
        let node = builder
            .constructor(ConstructorDefinition::empty().param(ParameterDefinition::new("other", this)))
            .finish()
            .unwrap();
        assert_eq!(node.declared_constructors()[0].params[0].ty, node);
    }

    #[test]
    fn test_property_accessors() {
        let ty = TypeBuilder::class("Holder")
            .property(PropertyDefinition::new("answer", TypeHandle::i32()).getter(|_| Ok(Value::I32(42))))
            .finish()
            .unwrap();
        let prop = &ty.declared_properties()[0];
        assert!(prop.can_read());
        assert!(!prop.can_write());
        let getter = prop.getter.as_ref().unwrap();
        assert_eq!(getter.name, "get_answer");
        let mut target = Value::Null;
        assert_eq!((getter.body)(&mut target, &mut []).unwrap(), Value::I32(42));
    }
}
