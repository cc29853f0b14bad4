//! Metamodel errors.

use crate::ident::ClassName;

/// Errors raised by the specification loader and specifications.
#[derive(Debug, thiserror::Error)]
pub enum MetaModelError {
    /// Members were requested before introspection completed.
    #[error("specification {0} is not yet introspected")]
    NotIntrospected(ClassName),

    /// `complete_introspection` was called on a finished specification.
    #[error("specification {0} is already fully introspected")]
    AlreadyIntrospected(ClassName),

    /// The class model has no such class.
    #[error("class not found: {0}")]
    ClassNotFound(ClassName),

    /// No specification carries this logical type name.
    #[error("no specification for logical type name {0:?}")]
    LogicalTypeNotFound(String),

    /// The specification has no member with this id.
    #[error("{class} has no member {member:?}")]
    MemberNotFound {
        /// The specification's class.
        class: ClassName,
        /// The requested member id.
        member: String,
    },

    /// The configuration could not be parsed.
    #[error("invalid metamodel configuration: {0}")]
    Config(#[from] serde_json::Error),
}
