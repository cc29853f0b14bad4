//! Feature errors.

use crate::id::ApplicationFeatureId;

/// Errors raised when building an [`ApplicationFeatureId`] or parsing it
/// from either of its wire forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureIdParseError {
    /// No `:` between the sort and the name.
    #[error("feature id {0:?} has no sort prefix")]
    MissingSort(String),

    /// The text before `:` is not a known sort.
    #[error("unknown feature sort {0:?}")]
    UnknownSort(String),

    /// A type or member id without a simple type name.
    #[error("feature id {0:?} has no type name")]
    MissingTypeName(String),

    /// A member id without `#member`.
    #[error("feature id {0:?} has no member name")]
    MissingMemberName(String),

    /// A namespace or type name containing `#`.
    #[error("feature id {0:?} has a misplaced '#'")]
    MisplacedMemberSeparator(String),

    /// The encoded form is not base64-url.
    #[error("invalid encoded feature id: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The encoded form does not decode to UTF-8.
    #[error("encoded feature id is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised by the feature repository.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// No feature with this id.
    #[error("no application feature {0}")]
    NotFound(ApplicationFeatureId),

    /// The id could not be parsed.
    #[error(transparent)]
    Parse(#[from] FeatureIdParseError),
}
