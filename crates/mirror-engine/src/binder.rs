//! Argument binding
//!
//! Maps a caller's argument slots onto a callable's formal parameters:
//! count and type checks, variadic packing, and write-back of `ref`-style
//! slots after the call.

use mirror_types::{ParameterDef, TypeHandle, Value};

use crate::error::{MirrorError, MirrorResult};

/// Formal parameter list of one callable
#[derive(Debug, Clone)]
pub(crate) struct Signature {
    member: String,
    params: Vec<ParameterDef>,
}

impl Signature {
    pub(crate) fn new(member: impl Into<String>, params: &[ParameterDef]) -> Self {
        Self {
            member: member.into(),
            params: params.to_vec(),
        }
    }

    pub(crate) fn params(&self) -> &[ParameterDef] {
        &self.params
    }

    fn variadic_tail(&self) -> Option<&ParameterDef> {
        self.params.last().filter(|p| p.is_variadic())
    }

    fn fixed_count(&self) -> usize {
        if self.variadic_tail().is_some() {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }

    /// Whether `args` would bind without error
    pub(crate) fn accepts(&self, args: &[Value]) -> bool {
        self.bind(args).is_ok()
    }

    /// Build the callee-visible argument list
    pub(crate) fn bind(&self, args: &[Value]) -> MirrorResult<Vec<Value>> {
        let fixed = self.fixed_count();
        let count_ok = match self.variadic_tail() {
            Some(_) => args.len() >= fixed,
            None => args.len() == fixed,
        };
        if !count_ok {
            return Err(MirrorError::ParameterCountMismatch {
                member: self.member.clone(),
                expected: fixed,
                found: args.len(),
                variadic: self.variadic_tail().is_some(),
            });
        }

        let mut bound = Vec::with_capacity(self.params.len());
        for (param, arg) in self.params[..fixed].iter().zip(args) {
            bound.push(bind_one(param, arg)?);
        }

        if let Some(tail) = self.variadic_tail() {
            bound.push(pack_tail(&tail.ty, &args[fixed..])?);
        }
        Ok(bound)
    }

    /// Copy write-back slots from the callee's list into the caller's
    pub(crate) fn write_back(&self, bound: &[Value], args: &mut [Value]) {
        for (index, param) in self.params.iter().enumerate() {
            if !param.is_write_back() {
                continue;
            }
            if let (Some(value), Some(slot)) = (bound.get(index), args.get_mut(index)) {
                *slot = value.clone();
            }
        }
    }
}

fn bind_one(param: &ParameterDef, arg: &Value) -> MirrorResult<Value> {
    if param.is_write_back() && arg.is_null() {
        return Ok(param.ty.default_value());
    }
    if param.ty.accepts(arg) {
        Ok(arg.clone())
    } else {
        Err(mismatch(&param.ty, arg))
    }
}

fn pack_tail(tail: &TypeHandle, trailing: &[Value]) -> MirrorResult<Value> {
    // A single array (or null) of the tail type is passed through as-is.
    if let [single] = trailing {
        if (single.is_null() || single.as_array().is_some()) && tail.accepts(single) {
            return Ok(single.clone());
        }
    }
    let element = tail.element_type().cloned().unwrap_or_else(TypeHandle::object);
    if let Some(bad) = trailing.iter().find(|v| !element.accepts(v)) {
        return Err(mismatch(&element, bad));
    }
    Ok(Value::array(&element, trailing.to_vec()))
}

fn mismatch(expected: &TypeHandle, found: &Value) -> MirrorError {
    MirrorError::TypeMismatch {
        expected: expected.name().to_string(),
        found: found.type_name(),
    }
}
