//! Engine errors

use std::fmt;

use mirror_types::HostError;
use thiserror::Error;

/// Why a member cannot be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOnly {
    /// Compile-time constant
    Literal,
    /// Named value of an enumeration
    EnumValue,
}

impl fmt::Display for ReadOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadOnly::Literal => f.write_str("member is a constant"),
            ReadOnly::EnumValue => f.write_str("cannot set enumeration value"),
        }
    }
}

/// Which property accessor is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// Get accessor
    Getter,
    /// Set accessor
    Setter,
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::Getter => f.write_str("getter"),
            AccessorKind::Setter => f.write_str("setter"),
        }
    }
}

/// Accessor, invocation, and construction errors
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A required argument was absent
    #[error("Argument `{0}` is required")]
    NullArgument(&'static str),

    /// A value is not assignable to the expected type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Runtime type name of the offending value
        found: String,
    },

    /// A property lacks the requested accessor
    #[error("No {kind} for property `{member}`")]
    NoAccessor {
        /// Property name
        member: String,
        /// Missing accessor
        kind: AccessorKind,
    },

    /// The member cannot be written
    #[error("Member `{member}` is not writable: {reason}")]
    NotWritable {
        /// Member name
        member: String,
        /// Why it is read-only
        reason: ReadOnly,
    },

    /// An instance member was accessed without a target
    #[error("Member `{member}` requires a target instance")]
    TargetRequired {
        /// Member name
        member: String,
    },

    /// The target does not own the member
    #[error("Wrong target for `{member}`: expected {expected}, found {found}")]
    WrongTarget {
        /// Member name
        member: String,
        /// Declaring type name
        expected: String,
        /// Runtime type name of the target
        found: String,
    },

    /// Argument count does not match the formal parameters
    #[error(
        "Parameter count mismatch for `{member}`: expected {}{expected}, found {found}",
        at_least(.variadic)
    )]
    ParameterCountMismatch {
        /// Callable name
        member: String,
        /// Formal count (fixed parameters for a variadic callable)
        expected: usize,
        /// Supplied count
        found: usize,
        /// `expected` is a lower bound
        variadic: bool,
    },

    /// The callable belongs to an open generic definition
    #[error("Callable `{member}` is declared on an open generic type and cannot be invoked")]
    NotInstantiable {
        /// Callable name
        member: String,
    },

    /// No constructor accepts the arguments
    #[error("No matching constructor on {ty}")]
    NoMatchingConstructor {
        /// Type name
        ty: String,
    },

    /// No accessible parameterless constructor
    #[error("No accessible parameterless constructor on {ty}")]
    NoDefaultConstructor {
        /// Type name
        ty: String,
    },

    /// No constructor taking exactly the owning type
    #[error("No copy constructor on {ty}")]
    NoCopyConstructor {
        /// Type name
        ty: String,
    },

    /// Several constructors accept the arguments equally well
    #[error("Ambiguous constructor match on {ty}: {candidates} candidates")]
    AmbiguousMatch {
        /// Type name
        ty: String,
        /// Number of equally applicable candidates
        candidates: usize,
    },

    /// Open generic definitions and metadata objects are never constructed
    #[error("Type {ty} is not constructible")]
    NotConstructible {
        /// Type name
        ty: String,
    },

    /// The invoked callable raised
    #[error("Invocation of `{member}` raised: {source}")]
    InvocationRaised {
        /// Callable name
        member: String,
        /// Original failure
        #[source]
        source: HostError,
    },

    /// A constructor body raised
    #[error("Construction of {ty} raised: {source}")]
    ConstructionRaised {
        /// Type name
        ty: String,
        /// Original failure
        #[source]
        source: HostError,
    },

    /// The requested attribute kind is not an attribute type
    #[error("{ty} is not an attribute type")]
    NotAnAttributeType {
        /// Type name
        ty: String,
    },
}

/// Engine result
pub type MirrorResult<T> = Result<T, MirrorError>;

fn at_least(variadic: &bool) -> &'static str {
    if *variadic {
        "at least "
    } else {
        ""
    }
}

/// Outcome of a `try_*` operation: exactly one side is populated
#[derive(Debug)]
pub struct Attempt<T> {
    /// Produced value on success
    pub value: Option<T>,
    /// Failure, classified exactly as the non-`try` form would report it
    pub error: Option<MirrorError>,
}

impl<T> Attempt<T> {
    /// Whether the operation succeeded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert back into a `Result`
    pub fn into_result(self) -> MirrorResult<T> {
        match (self.value, self.error) {
            (_, Some(error)) => Err(error),
            (Some(value), None) => Ok(value),
            (None, None) => Err(MirrorError::NullArgument("value")),
        }
    }
}

impl<T> From<MirrorResult<T>> for Attempt<T> {
    fn from(result: MirrorResult<T>) -> Self {
        match result {
            Ok(value) => Self {
                value: Some(value),
                error: None,
            },
            Err(error) => Self {
                value: None,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_raised_preserves_source() {
        let err = MirrorError::InvocationRaised {
            member: "run".to_string(),
            source: "boom".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_attempt_from_result() {
        let ok: Attempt<i32> = Ok(5).into();
        assert!(ok.is_ok());
        assert_eq!(ok.value, Some(5));

        let failed: Attempt<i32> = Err(MirrorError::NoCopyConstructor { ty: "T".into() }).into();
        assert!(!failed.is_ok());
        assert!(matches!(failed.into_result(), Err(MirrorError::NoCopyConstructor { .. })));
    }

    #[test]
    fn test_count_mismatch_wording() {
        let fixed = MirrorError::ParameterCountMismatch {
            member: "f".into(),
            expected: 2,
            found: 1,
            variadic: false,
        };
        assert!(fixed.to_string().ends_with("expected 2, found 1"));

        let open = MirrorError::ParameterCountMismatch {
            member: "g".into(),
            expected: 1,
            found: 0,
            variadic: true,
        };
        assert!(open.to_string().ends_with("expected at least 1, found 0"));
    }

    #[test]
    fn test_not_writable_reasons() {
        let err = MirrorError::NotWritable {
            member: "Red".into(),
            reason: ReadOnly::EnumValue,
        };
        assert!(err.to_string().contains("cannot set enumeration value"));
    }
}
