//! Compiled method invokers

use std::fmt;
use std::sync::Arc;

use mirror_types::{MethodBody, MethodDef, TypeHandle, Value};

use crate::binder::Signature;
use crate::error::{MirrorError, MirrorResult};

/// Reusable invocation handle for one method
#[derive(Clone)]
pub struct Invoker {
    method: Arc<MethodDef>,
    signature: Signature,
}

impl Invoker {
    /// Compile an invoker for `method`
    pub fn new(method: &Arc<MethodDef>) -> Self {
        Self {
            method: Arc::clone(method),
            signature: Signature::new(method.name.clone(), &method.params),
        }
    }

    /// Method descriptor
    pub fn method(&self) -> &Arc<MethodDef> {
        &self.method
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.method.name
    }

    /// Number of formal parameters (a variadic tail counts as one)
    pub fn arity(&self) -> usize {
        self.method.arity()
    }

    /// Call the method
    ///
    /// `target` is ignored for static methods. Write-back parameters are
    /// copied into `args` once the call returns, whether or not it raised.
    pub fn invoke(&self, target: &mut Value, args: &mut [Value]) -> MirrorResult<Value> {
        let method = &self.method;
        if method.declaring.is_generic_definition() {
            return Err(MirrorError::NotInstantiable {
                member: method.name.clone(),
            });
        }

        let body = if method.is_static {
            method.body.clone()
        } else {
            let runtime = match target.runtime_type() {
                Some(runtime) => runtime,
                None => {
                    return Err(MirrorError::TargetRequired {
                        member: method.name.clone(),
                    })
                }
            };
            if !runtime.is_subtype_of(&method.declaring) {
                return Err(MirrorError::WrongTarget {
                    member: method.name.clone(),
                    expected: method.declaring.name().to_string(),
                    found: runtime.name().to_string(),
                });
            }
            self.dispatch(&runtime)
        };

        let mut bound = self.signature.bind(args)?;
        let mut no_target = Value::Null;
        let receiver = if method.is_static { &mut no_target } else { target };
        let result = body(receiver, &mut bound);
        self.signature.write_back(&bound, args);
        result.map_err(|source| MirrorError::InvocationRaised {
            member: method.name.clone(),
            source,
        })
    }

    /// Call the method with no arguments
    pub fn invoke0(&self, target: &mut Value) -> MirrorResult<Value> {
        self.invoke(target, &mut [])
    }

    /// Most-derived override of a virtual method on the target's type
    fn dispatch(&self, runtime: &TypeHandle) -> MethodBody {
        if !self.method.is_virtual {
            return self.method.body.clone();
        }
        for ty in runtime.ancestors() {
            if ty == self.method.declaring {
                break;
            }
            let accessors = ty
                .declared_properties()
                .iter()
                .flat_map(|p| p.getter.iter().chain(p.setter.iter()));
            if let Some(method) = ty
                .declared_methods()
                .iter()
                .chain(accessors)
                .find(|m| m.overrides_method(&self.method))
            {
                return method.body.clone();
            }
        }
        self.method.body.clone()
    }
}

impl PartialEq for Invoker {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.method, &other.method)
    }
}

impl Eq for Invoker {}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("method", &self.method.name)
            .field("declaring", &self.method.declaring)
            .field("arity", &self.signature.params().len())
            .finish()
    }
}
