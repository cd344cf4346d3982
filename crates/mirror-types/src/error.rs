//! Type definition errors

use thiserror::Error;

/// Errors raised while defining host types with the builder
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// Two members of the same kind share a name on one type
    #[error("Duplicate member `{member}` on type {ty}")]
    DuplicateMember {
        /// Type being defined
        ty: String,
        /// Member name
        member: String,
    },

    /// A parameter list is malformed
    #[error("Invalid parameter `{param}` on {member}: {reason}")]
    InvalidParameter {
        /// Owning method or constructor
        member: String,
        /// Parameter name
        param: String,
        /// What is wrong with it
        reason: String,
    },

    /// A literal field was declared without a constant value
    #[error("Literal field `{field}` on type {ty} has no constant value")]
    MissingConstant {
        /// Type being defined
        ty: String,
        /// Field name
        field: String,
    },

    /// The base type cannot be derived from
    #[error("Invalid base type for {ty}: {reason}")]
    InvalidBase {
        /// Type being defined
        ty: String,
        /// Reason for rejection
        reason: String,
    },

    /// A member marked as an override has nothing to override
    #[error("Member `{member}` on type {ty} overrides nothing")]
    NothingToOverride {
        /// Type being defined
        ty: String,
        /// Member name
        member: String,
    },

    /// The type handle was already given a definition
    #[error("Type {0} is already defined")]
    AlreadyDefined(String),

    /// Any other structural problem
    #[error("Invalid type definition for {ty}: {reason}")]
    InvalidDefinition {
        /// Type being defined
        ty: String,
        /// Reason for rejection
        reason: String,
    },
}
