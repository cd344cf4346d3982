//! Dynamic host values
//!
//! Objects and arrays are shared references: cloning a [`Value::Object`]
//! clones the `Arc`, and every clone observes writes to the same field slots.
//! Structs are owned: cloning a [`Value::Struct`] copies its fields, so a
//! write through one copy is invisible to the others.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::ty::TypeHandle;

/// Shared reference to a class instance
pub type ObjectRef = Arc<Object>;

/// Shared reference to an array
pub type ArrayRef = Arc<Array>;

/// Class instance with interior-mutable field slots
#[derive(Debug)]
pub struct Object {
    ty: TypeHandle,
    fields: RwLock<Vec<Value>>,
}

impl Object {
    /// Create an instance with the given slot values
    pub fn new(ty: TypeHandle, fields: Vec<Value>) -> Self {
        Self {
            ty,
            fields: RwLock::new(fields),
        }
    }

    /// Runtime type of the instance
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Read a field slot
    pub fn get_field(&self, slot: usize) -> Option<Value> {
        self.fields.read().get(slot).cloned()
    }

    /// Write a field slot; false if the slot does not exist
    pub fn set_field(&self, slot: usize, value: Value) -> bool {
        let mut fields = self.fields.write();
        match fields.get_mut(slot) {
            Some(stored) => {
                *stored = value;
                true
            }
            None => false,
        }
    }

    /// Number of field slots
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }
}

/// Array of values sharing one element type
#[derive(Debug)]
pub struct Array {
    element: TypeHandle,
    items: RwLock<Vec<Value>>,
}

impl Array {
    /// Create an array over `element` holding `items`
    pub fn new(element: TypeHandle, items: Vec<Value>) -> Self {
        Self {
            element,
            items: RwLock::new(items),
        }
    }

    /// Element type
    pub fn element_type(&self) -> &TypeHandle {
        &self.element
    }

    /// The array type (`element[]`)
    pub fn array_type(&self) -> TypeHandle {
        TypeHandle::array_of(&self.element)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Replace the element at `index`; false if out of bounds
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut items = self.items.write();
        match items.get_mut(index) {
            Some(stored) => {
                *stored = value;
                true
            }
            None => false,
        }
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read().clone()
    }
}

/// Mutable value-type instance
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    ty: TypeHandle,
    fields: Vec<Value>,
}

impl StructValue {
    /// Create a struct value with the given slot values
    pub fn new(ty: TypeHandle, fields: Vec<Value>) -> Self {
        Self { ty, fields }
    }

    /// Struct type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Read a field slot
    pub fn get_field(&self, slot: usize) -> Option<&Value> {
        self.fields.get(slot)
    }

    /// Write a field slot; false if the slot does not exist
    pub fn set_field(&mut self, slot: usize, value: Value) -> bool {
        match self.fields.get_mut(slot) {
            Some(stored) => {
                *stored = value;
                true
            }
            None => false,
        }
    }

    /// All field slots
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }
}

/// Enumeration value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: TypeHandle,
    raw: i64,
}

impl EnumValue {
    /// Create an enum value from its raw representation
    pub fn new(ty: TypeHandle, raw: i64) -> Self {
        Self { ty, raw }
    }

    /// Enum type
    pub fn ty(&self) -> &TypeHandle {
        &self.ty
    }

    /// Raw underlying value
    pub fn raw(&self) -> i64 {
        self.raw
    }
}

/// Dynamic value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent reference
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// Double
    F64(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Enumeration value
    Enum(EnumValue),
    /// Struct instance (copied on clone)
    Struct(StructValue),
    /// Class instance (shared)
    Object(ObjectRef),
    /// Array (shared)
    Array(ArrayRef),
    /// Type metadata object
    Type(TypeHandle),
}

impl Value {
    /// Build a fresh array value
    pub fn array(element: &TypeHandle, items: Vec<Value>) -> Value {
        Value::Array(Arc::new(Array::new(element.clone(), items)))
    }

    /// True for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type of the value; `None` for null
    pub fn runtime_type(&self) -> Option<TypeHandle> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeHandle::bool()),
            Value::I32(_) => Some(TypeHandle::i32()),
            Value::I64(_) => Some(TypeHandle::i64()),
            Value::F64(_) => Some(TypeHandle::f64()),
            Value::Str(_) => Some(TypeHandle::string()),
            Value::Enum(e) => Some(e.ty().clone()),
            Value::Struct(s) => Some(s.ty().clone()),
            Value::Object(o) => Some(o.ty().clone()),
            Value::Array(a) => Some(a.array_type()),
            Value::Type(_) => Some(TypeHandle::metadata()),
        }
    }

    /// Name of the runtime type, `null` for null
    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// 32-bit integer payload
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// 64-bit integer payload
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Double payload
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Enum payload
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Struct payload
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable struct payload
    pub fn as_struct_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Object payload
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Array payload
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Type metadata payload
    pub fn as_type(&self) -> Option<&TypeHandle> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<TypeHandle> for Value {
    fn from(v: TypeHandle) -> Self {
        Value::Type(v)
    }
}
