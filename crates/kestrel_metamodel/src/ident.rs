//! Class names, logical types and member identifiers.
//!
//! A [`ClassName`] is the physical identity of a class in the class model.
//! A [`LogicalType`] pairs it with the logical name the rest of the
//! framework uses (bookmarks, feature ids, permissions). An [`Identifier`]
//! pins down a type or one of its members.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::Arc;

/// Fully qualified physical class name, e.g. `com.acme.Order`.
///
/// Cheap to clone. Array types carry a `[]` suffix (`com.acme.Order[]`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(Arc<str>);

impl ClassName {
    /// Creates a class name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text before the last `.`, or the empty string for unqualified names.
    #[must_use]
    pub fn namespace(&self) -> &str {
        split_qualified(&self.0).0
    }

    /// Text after the last `.`.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        split_qualified(&self.0).1
    }

    /// Returns true for array class names.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.0.ends_with("[]")
    }

    /// The array class whose component is this class.
    #[must_use]
    pub fn array_of(&self) -> Self {
        Self::new(format!("{}[]", self.0))
    }

    /// The component class of an array class name.
    #[must_use]
    pub fn component(&self) -> Option<Self> {
        self.0.strip_suffix("[]").map(Self::new)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ClassName {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&ClassName> for ClassName {
    fn from(value: &ClassName) -> Self {
        value.clone()
    }
}

impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => ("", name),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LogicalType
// ─────────────────────────────────────────────────────────────────────────────

/// A physical class together with its logical type name.
///
/// Two logical types are equal when their logical names are equal,
/// whatever class backs them.
#[derive(Clone)]
pub struct LogicalType {
    class: ClassName,
    logical_name: Arc<str>,
}

impl LogicalType {
    /// Creates a logical type with an explicit logical name.
    #[must_use]
    pub fn new(class: ClassName, logical_name: impl AsRef<str>) -> Self {
        Self {
            class,
            logical_name: Arc::from(logical_name.as_ref()),
        }
    }

    /// Creates a logical type whose logical name is the class name.
    #[must_use]
    pub fn of(class: ClassName) -> Self {
        let logical_name = Arc::clone(&class.0);
        Self {
            class,
            logical_name,
        }
    }

    /// The backing physical class.
    #[must_use]
    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// The logical name, e.g. `acme.Order`.
    #[must_use]
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Logical namespace: text before the last `.` of the logical name.
    #[must_use]
    pub fn namespace(&self) -> &str {
        split_qualified(&self.logical_name).0
    }

    /// Logical simple name: text after the last `.` of the logical name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        split_qualified(&self.logical_name).1
    }
}

impl PartialEq for LogicalType {
    fn eq(&self, other: &Self) -> bool {
        self.logical_name == other.logical_name
    }
}

impl Eq for LogicalType {}

impl Hash for LogicalType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.logical_name.hash(state);
    }
}

impl PartialOrd for LogicalType {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogicalType {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.logical_name.cmp(&other.logical_name)
    }
}

impl fmt::Debug for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalType")
            .field("class", &self.class)
            .field("logical_name", &&*self.logical_name)
            .finish()
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.logical_name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifier
// ─────────────────────────────────────────────────────────────────────────────

/// What an [`Identifier`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentifierKind {
    /// The type itself.
    Class,
    /// A property or collection.
    PropertyOrCollection,
    /// An action.
    Action,
}

/// Identifies a type or a member of a type.
///
/// ```
/// use kestrel_metamodel::ident::{ClassName, Identifier, LogicalType};
///
/// let order = LogicalType::new(ClassName::new("com.acme.Order"), "acme.Order");
/// let submit = Identifier::action(order, "submit", vec![ClassName::new("kestrel.lang.String")]);
/// assert_eq!(submit.full_identity_string(), "acme.Order#submit(kestrel.lang.String)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    logical_type: LogicalType,
    member_logical_name: String,
    parameter_class_names: Vec<ClassName>,
    kind: IdentifierKind,
}

impl Identifier {
    /// Identifies a type.
    #[must_use]
    pub fn class(logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            member_logical_name: String::new(),
            parameter_class_names: Vec::new(),
            kind: IdentifierKind::Class,
        }
    }

    /// Identifies a property or collection.
    #[must_use]
    pub fn property_or_collection(logical_type: LogicalType, member: impl Into<String>) -> Self {
        Self {
            logical_type,
            member_logical_name: member.into(),
            parameter_class_names: Vec::new(),
            kind: IdentifierKind::PropertyOrCollection,
        }
    }

    /// Identifies an action with its parameter types.
    #[must_use]
    pub fn action(
        logical_type: LogicalType,
        member: impl Into<String>,
        parameter_class_names: Vec<ClassName>,
    ) -> Self {
        Self {
            logical_type,
            member_logical_name: member.into(),
            parameter_class_names,
            kind: IdentifierKind::Action,
        }
    }

    /// Same member, re-homed onto another logical type.
    ///
    /// Used for mixed-in members, which are identified by their host.
    #[must_use]
    pub fn with_logical_type(&self, logical_type: LogicalType) -> Self {
        Self {
            logical_type,
            ..self.clone()
        }
    }

    /// Same kind and parameters, different member name.
    #[must_use]
    pub fn with_member_name(&self, member: impl Into<String>) -> Self {
        Self {
            member_logical_name: member.into(),
            ..self.clone()
        }
    }

    /// The owning logical type.
    #[must_use]
    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// The member name, empty for class identifiers.
    #[must_use]
    pub fn member_logical_name(&self) -> &str {
        &self.member_logical_name
    }

    /// Parameter types, empty unless this is an action.
    #[must_use]
    pub fn parameter_class_names(&self) -> &[ClassName] {
        &self.parameter_class_names
    }

    /// The identifier kind.
    #[must_use]
    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// `acme.Order`, `acme.Order#total` or `acme.Order#submit(kestrel.lang.String)`.
    #[must_use]
    pub fn full_identity_string(&self) -> String {
        let mut out = String::from(self.logical_type.logical_name());
        match self.kind {
            IdentifierKind::Class => {}
            IdentifierKind::PropertyOrCollection => {
                out.push('#');
                out.push_str(&self.member_logical_name);
            }
            IdentifierKind::Action => {
                out.push('#');
                out.push_str(&self.member_logical_name);
                out.push('(');
                for (i, param) in self.parameter_class_names.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(param.as_str());
                }
                out.push(')');
            }
        }
        out
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_identity_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FeatureType
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of metamodel element a facet factory applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    /// A type.
    ObjectType,
    /// A scalar association.
    Property,
    /// A multi-valued association.
    Collection,
    /// An action.
    Action,
    /// A scalar action parameter.
    ActionParameterScalar,
    /// A collection-typed action parameter.
    ActionParameterCollection,
}

impl FeatureType {
    /// Member feature types.
    pub const MEMBERS: &'static [FeatureType] = &[
        FeatureType::Property,
        FeatureType::Collection,
        FeatureType::Action,
    ];

    /// Parameter feature types.
    pub const PARAMETERS: &'static [FeatureType] = &[
        FeatureType::ActionParameterScalar,
        FeatureType::ActionParameterCollection,
    ];

    /// Returns true for properties and collections.
    #[must_use]
    pub fn is_association(self) -> bool {
        matches!(self, Self::Property | Self::Collection)
    }

    /// Returns true for actions.
    #[must_use]
    pub fn is_action(self) -> bool {
        self == Self::Action
    }

    /// Returns true for action parameters.
    #[must_use]
    pub fn is_parameter(self) -> bool {
        matches!(
            self,
            Self::ActionParameterScalar | Self::ActionParameterCollection
        )
    }
}
