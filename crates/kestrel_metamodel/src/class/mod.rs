//! The class model the introspector reads.
//!
//! Domain classes are described, not reflected: a [`ClassRepository`]
//! hands out immutable [`ClassDescriptor`]s with the class's kind,
//! supertypes, annotations and declared methods. Everything the metamodel
//! knows about a class comes from here.
//!
//! ```
//! use kestrel_metamodel::class::{Annotation, ClassDescriptor, MethodDescriptor, TypeRef};
//!
//! let order = ClassDescriptor::class("com.acme.Order")
//!     .annotate(Annotation::entity())
//!     .method(MethodDescriptor::new("getTotal").returns(TypeRef::class("kestrel.lang.BigDecimal")))
//!     .method(
//!         MethodDescriptor::new("submit")
//!             .param("note", TypeRef::class("kestrel.lang.String"))
//!             .annotate(Annotation::Action),
//!     );
//!
//! assert_eq!(order.methods.len(), 2);
//! assert!(order.annotations.domain_object().is_some());
//! ```

mod repository;

use core::fmt;

pub use repository::{ClassRepository, InMemoryClassRepository, builtin};

use crate::ident::ClassName;
use crate::spec::IntrospectionPolicy;

// ─────────────────────────────────────────────────────────────────────────────
// Type references
// ─────────────────────────────────────────────────────────────────────────────

/// Primitive value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `char`
    Char,
}

impl PrimitiveType {
    /// Every primitive type.
    pub const ALL: [PrimitiveType; 8] = [
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Char,
    ];

    /// The primitive's class name, e.g. `int`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
        }
    }

    /// The boxed wrapper class of this primitive.
    #[must_use]
    pub fn wrapper(self) -> &'static str {
        match self {
            Self::Boolean => builtin::BOOLEAN,
            Self::Byte => builtin::BYTE,
            Self::Short => builtin::SHORT,
            Self::Int => builtin::INTEGER,
            Self::Long => builtin::LONG,
            Self::Float => builtin::FLOAT,
            Self::Double => builtin::DOUBLE,
            Self::Char => builtin::CHARACTER,
        }
    }

    /// Looks a primitive up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Kinds of collection a member or parameter may be typed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Ordered, duplicates allowed.
    List,
    /// Unordered, unique.
    Set,
    /// Sorted, unique.
    SortedSet,
}

/// A type as it appears in a method signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value.
    Void,
    /// A primitive.
    Primitive(PrimitiveType),
    /// A class, interface or enum.
    Class(ClassName),
    /// An array of some component type.
    Array(Box<TypeRef>),
    /// A parameterized collection.
    Collection(CollectionKind, Box<TypeRef>),
}

impl TypeRef {
    /// Shorthand for [`TypeRef::Class`].
    #[must_use]
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self::Class(name.into())
    }

    /// A list of `element`.
    #[must_use]
    pub fn list(element: TypeRef) -> Self {
        Self::Collection(CollectionKind::List, Box::new(element))
    }

    /// A set of `element`.
    #[must_use]
    pub fn set(element: TypeRef) -> Self {
        Self::Collection(CollectionKind::Set, Box::new(element))
    }

    /// An array of `element`.
    #[must_use]
    pub fn array(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    /// Returns true for [`TypeRef::Void`].
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Returns true for arrays and collections.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Collection(..))
    }

    /// Returns true for the `boolean` primitive and its wrapper.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        match self {
            Self::Primitive(PrimitiveType::Boolean) => true,
            Self::Class(name) => name.as_str() == builtin::BOOLEAN,
            _ => false,
        }
    }

    /// Returns true for the string class.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Class(name) if name.as_str() == builtin::STRING)
    }

    /// The element type of an array or collection.
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            Self::Array(element) | Self::Collection(_, element) => Some(element),
            _ => None,
        }
    }

    /// The collection kind, arrays counting as lists.
    #[must_use]
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            Self::Array(_) => Some(CollectionKind::List),
            Self::Collection(kind, _) => Some(*kind),
            _ => None,
        }
    }

    /// The class name a specification for this type would carry.
    ///
    /// Collections have no specification of their own and yield their
    /// element's name; `Void` yields `None`.
    #[must_use]
    pub fn class_name(&self) -> Option<ClassName> {
        match self {
            Self::Void => None,
            Self::Primitive(primitive) => Some(ClassName::new(primitive.name())),
            Self::Class(name) => Some(name.clone()),
            Self::Array(component) => component.class_name().map(|name| name.array_of()),
            Self::Collection(_, element) => element.class_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive(primitive) => f.write_str(primitive.name()),
            Self::Class(name) => f.write_str(name.as_str()),
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Collection(kind, element) => write!(f, "{kind:?}<{element}>"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Annotations
// ─────────────────────────────────────────────────────────────────────────────

/// Persistence nature of a domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nature {
    /// Persisted by the object store.
    Entity,
    /// Recreated from its memento, not persisted.
    ViewModel,
    /// Declared a domain object without committing to a nature.
    NotSpecified,
}

/// Where a hidden member is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Where {
    /// In every rendering.
    Everywhere,
    /// In tables only.
    AllTables,
    /// In object forms only.
    ObjectForms,
}

/// Declarative metadata on a class, method or parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Marks a domain object and optionally its logical type name and
    /// introspection policy.
    DomainObject {
        /// Persistence nature.
        nature: Nature,
        /// Overrides the logical type name.
        logical_type_name: Option<String>,
        /// Overrides the configured introspection policy.
        introspection: Option<IntrospectionPolicy>,
    },
    /// Marks a domain service.
    DomainService {
        /// Overrides the logical type name.
        logical_type_name: Option<String>,
    },
    /// Marks a mixin contributing `method` to instances of `mixee`.
    Mixin {
        /// The mixed-in type.
        mixee: ClassName,
        /// Name of the contributing method on the mixin class.
        method: String,
    },
    /// Marks a value type.
    Value,
    /// Excludes the class from the metamodel.
    Vetoed,
    /// Explicit name.
    Named(String),
    /// Explicit plural name.
    Plural(String),
    /// Description.
    Described(String),
    /// Explicit property.
    Property,
    /// Explicit collection.
    Collection,
    /// Explicit action.
    Action,
    /// Position within the member layout, dewey-decimal.
    MemberOrder {
        /// e.g. `1.2`.
        sequence: String,
    },
    /// Hidden member.
    Hidden(Where),
    /// Disabled member with the reason shown to users.
    Disabled(String),
    /// Optional property or parameter.
    Optional,
    /// Never part of the metamodel.
    Programmatic,
    /// Contributes to the object's title.
    Title,
}

impl Annotation {
    /// `DomainObject` with entity nature.
    #[must_use]
    pub fn entity() -> Self {
        Self::DomainObject {
            nature: Nature::Entity,
            logical_type_name: None,
            introspection: None,
        }
    }

    /// `DomainObject` with view-model nature.
    #[must_use]
    pub fn view_model() -> Self {
        Self::DomainObject {
            nature: Nature::ViewModel,
            logical_type_name: None,
            introspection: None,
        }
    }

    /// `DomainService` without a logical name override.
    #[must_use]
    pub fn service() -> Self {
        Self::DomainService {
            logical_type_name: None,
        }
    }

    /// `MemberOrder` with the given sequence.
    #[must_use]
    pub fn member_order(sequence: impl Into<String>) -> Self {
        Self::MemberOrder {
            sequence: sequence.into(),
        }
    }
}

/// The annotations present on one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations(Vec<Annotation>);

/// A `DomainObject` annotation's payload.
#[derive(Debug, Clone, Copy)]
pub struct DomainObjectAnnotation<'a> {
    /// Persistence nature.
    pub nature: Nature,
    /// Logical type name override.
    pub logical_type_name: Option<&'a str>,
    /// Introspection policy override.
    pub introspection: Option<IntrospectionPolicy>,
}

impl Annotations {
    /// Adds an annotation.
    pub fn push(&mut self, annotation: Annotation) {
        self.0.push(annotation);
    }

    /// Iterates over the annotations.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter()
    }

    /// Returns true if there are no annotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `DomainObject` annotation, if present.
    #[must_use]
    pub fn domain_object(&self) -> Option<DomainObjectAnnotation<'_>> {
        self.0.iter().find_map(|a| match a {
            Annotation::DomainObject {
                nature,
                logical_type_name,
                introspection,
            } => Some(DomainObjectAnnotation {
                nature: *nature,
                logical_type_name: logical_type_name.as_deref(),
                introspection: *introspection,
            }),
            _ => None,
        })
    }

    /// `Some(logical name override)` if `DomainService` is present.
    #[must_use]
    pub fn domain_service(&self) -> Option<Option<&str>> {
        self.0.iter().find_map(|a| match a {
            Annotation::DomainService { logical_type_name } => Some(logical_type_name.as_deref()),
            _ => None,
        })
    }

    /// The `Mixin` annotation's mixee and main method.
    #[must_use]
    pub fn mixin(&self) -> Option<(&ClassName, &str)> {
        self.0.iter().find_map(|a| match a {
            Annotation::Mixin { mixee, method } => Some((mixee, method.as_str())),
            _ => None,
        })
    }

    /// The `Named` value.
    #[must_use]
    pub fn named(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::Named(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The `Plural` value.
    #[must_use]
    pub fn plural(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::Plural(plural) => Some(plural.as_str()),
            _ => None,
        })
    }

    /// The `Described` value.
    #[must_use]
    pub fn described(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::Described(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The `MemberOrder` sequence.
    #[must_use]
    pub fn member_order(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::MemberOrder { sequence } => Some(sequence.as_str()),
            _ => None,
        })
    }

    /// The `Hidden` location.
    #[must_use]
    pub fn hidden(&self) -> Option<Where> {
        self.0.iter().find_map(|a| match a {
            Annotation::Hidden(where_) => Some(*where_),
            _ => None,
        })
    }

    /// The `Disabled` reason.
    #[must_use]
    pub fn disabled(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::Disabled(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    /// Returns true if `Value` is present.
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.0.contains(&Annotation::Value)
    }

    /// Returns true if `Vetoed` is present.
    #[must_use]
    pub fn is_vetoed(&self) -> bool {
        self.0.contains(&Annotation::Vetoed)
    }

    /// Returns true if `Property` is present.
    #[must_use]
    pub fn is_property(&self) -> bool {
        self.0.contains(&Annotation::Property)
    }

    /// Returns true if `Collection` is present.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.0.contains(&Annotation::Collection)
    }

    /// Returns true if `Action` is present.
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.0.contains(&Annotation::Action)
    }

    /// Returns true if `Optional` is present.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.0.contains(&Annotation::Optional)
    }

    /// Returns true if `Programmatic` is present.
    #[must_use]
    pub fn is_programmatic(&self) -> bool {
        self.0.contains(&Annotation::Programmatic)
    }

    /// Returns true if `Title` is present.
    #[must_use]
    pub fn is_title(&self) -> bool {
        self.0.contains(&Annotation::Title)
    }
}

impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// What sort of type a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// A concrete or abstract class.
    Class,
    /// An interface.
    Interface,
    /// An enumeration.
    Enum,
    /// A primitive.
    Primitive,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Declared name.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Parameter annotations.
    pub annotations: Annotations,
}

/// A declared method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<ParamDescriptor>,
    /// Return type.
    pub return_type: TypeRef,
    /// Static methods never become members.
    pub is_static: bool,
    /// Visibility, consulted by the introspection policy.
    pub is_public: bool,
    /// Method annotations.
    pub annotations: Annotations,
    /// Constant result of a static method, for legacy order hints.
    pub constant: Option<String>,
}

impl MethodDescriptor {
    /// A public, non-static, void, no-arg method.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: TypeRef::Void,
            is_static: false,
            is_public: true,
            annotations: Annotations::default(),
            constant: None,
        }
    }

    /// A public getter `name()` returning `ty`.
    #[must_use]
    pub fn getter(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name).returns(ty)
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = ty;
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            ty,
            annotations: Annotations::default(),
        });
        self
    }

    /// Appends an annotated parameter.
    #[must_use]
    pub fn param_annotated(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            ty,
            annotations: annotations.into_iter().collect(),
        });
        self
    }

    /// Marks the method static.
    #[must_use]
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the method non-public.
    #[must_use]
    pub fn non_public(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Adds a method annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Static method returning a constant string.
    #[must_use]
    pub fn constant(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut method = Self::new(name)
            .returns(TypeRef::class(builtin::STRING))
            .into_static();
        method.constant = Some(value.into());
        method
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `name(T1,T2)`: what overriding methods share.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// Everything the metamodel knows about one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    /// Physical name.
    pub name: ClassName,
    /// Class, interface, enum or primitive.
    pub kind: ClassKind,
    /// Abstract classes cannot be instantiated.
    pub is_abstract: bool,
    /// Direct superclass; `None` for the root, interfaces and primitives.
    pub superclass: Option<ClassName>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<ClassName>,
    /// Class annotations.
    pub annotations: Annotations,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    fn with_kind(name: impl Into<ClassName>, kind: ClassKind) -> Self {
        let superclass = match kind {
            ClassKind::Class | ClassKind::Enum => Some(ClassName::new(builtin::OBJECT)),
            ClassKind::Interface | ClassKind::Primitive => None,
        };
        Self {
            name: name.into(),
            kind,
            is_abstract: false,
            superclass,
            interfaces: Vec::new(),
            annotations: Annotations::default(),
            methods: Vec::new(),
        }
    }

    /// A class extending the root object.
    #[must_use]
    pub fn class(name: impl Into<ClassName>) -> Self {
        Self::with_kind(name, ClassKind::Class)
    }

    /// An interface.
    #[must_use]
    pub fn interface(name: impl Into<ClassName>) -> Self {
        let mut descriptor = Self::with_kind(name, ClassKind::Interface);
        descriptor.is_abstract = true;
        descriptor
    }

    /// An enumeration.
    #[must_use]
    pub fn enumeration(name: impl Into<ClassName>) -> Self {
        Self::with_kind(name, ClassKind::Enum)
    }

    /// A primitive.
    #[must_use]
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::with_kind(primitive.name(), ClassKind::Primitive)
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<ClassName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Removes the superclass; only the root object has none.
    #[must_use]
    pub fn root(mut self) -> Self {
        self.superclass = None;
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<ClassName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Marks the class abstract.
    #[must_use]
    pub fn into_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Adds a class annotation.
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a declared method.
    #[must_use]
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a getter `getX()`/`isX()` returning `ty`.
    #[must_use]
    pub fn getter(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.method(MethodDescriptor::getter(name, ty))
    }

    /// Looks up a declared method by name and arity.
    #[must_use]
    pub fn find_method(&self, name: &str, arity: usize) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity)
    }

    /// The mixee and main method, for mixins.
    #[must_use]
    pub fn mixin(&self) -> Option<(&ClassName, &str)> {
        self.annotations.mixin()
    }
}
