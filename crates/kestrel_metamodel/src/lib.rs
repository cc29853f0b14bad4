//! Object specification graph for Kestrel.
//!
//! `kestrel_metamodel` turns a class model into an introspected graph of
//! [`ObjectSpecification`](spec::ObjectSpecification)s: one per domain
//! type, each carrying its facets, its members and its place in the type
//! hierarchy.
//!
//! - [`class`] - The class model the introspector reads
//! - [`ident`] - Class names, logical types and member identifiers
//! - [`facet`] - Facets, facet factories and the programming model
//! - [`partition`] - Method claims during introspection
//! - [`spec`] - Object specifications and type-hierarchy queries
//! - [`member`] - Properties, collections, actions and parameters
//! - [`loader`] - The specification loader and cache
//! - [`validate`] - Metamodel validation
//! - [`value`] - Value types and their wire representation
//! - [`plugin`] - Wiring into the application lifecycle
//!
//! # Introspection
//!
//! A specification is built in two phases. The type phase resolves the
//! supertypes and runs the class-level facet factories; the member phase
//! discovers properties, collections and actions, applies mixin
//! contributions and orders the result. Either phase may trigger the
//! loading of other types, which is why a specification is cached as a
//! shell before anything runs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use kestrel_metamodel::prelude::*;
//!
//! let repository = InMemoryClassRepository::with_builtins()
//!     .with(
//!         ClassDescriptor::class("com.acme.Order")
//!             .annotate(Annotation::entity())
//!             .getter("getNumber", TypeRef::class(builtin::STRING))
//!             .method(MethodDescriptor::new("submit").annotate(Annotation::Action)),
//!     );
//!
//! let loader = SpecificationLoader::with_defaults(Arc::new(repository));
//! let order = loader.load_specification(&ClassName::new("com.acme.Order")).unwrap();
//!
//! assert!(order.is_entity());
//! assert_eq!(order.properties().len(), 1);
//! assert_eq!(order.actions().len(), 1);
//! ```

/// The class model.
pub mod class;

/// Metamodel configuration.
pub mod config;

/// Metamodel errors.
pub mod error;

/// Facets and facet factories.
pub mod facet;

/// Identifiers.
pub mod ident;

mod introspector;

/// Specification loader.
pub mod loader;

/// Object members.
pub mod member;

/// Naming conventions.
pub mod naming;

/// Member ordering.
pub mod order;

/// Method claims.
pub mod partition;

/// Metamodel plugin.
pub mod plugin;

/// Object specifications.
pub mod spec;

/// Introspection triggers.
pub mod trigger;

/// Metamodel validation.
pub mod validate;

/// Value types.
pub mod value;

/// Re-export common types for easy access.
pub mod prelude {
    pub use crate::class::{
        Annotation, ClassDescriptor, ClassKind, ClassRepository, InMemoryClassRepository,
        MethodDescriptor, Nature, TypeRef, builtin,
    };
    pub use crate::config::MetaModelConfig;
    pub use crate::error::MetaModelError;
    pub use crate::facet::{Facet, FacetFactory, FacetHolder, FacetKind, Precedence, ProgrammingModel};
    pub use crate::ident::{ClassName, FeatureType, Identifier, LogicalType};
    pub use crate::loader::SpecificationLoader;
    pub use crate::member::{
        Member, ObjectAction, ObjectMember, OneToManyAssociation, OneToOneAssociation,
    };
    pub use crate::plugin::MetaModelPlugin;
    pub use crate::spec::{BeanSort, Depth, IntrospectionPolicy, IntrospectionState, ObjectSpecification};
    pub use crate::trigger::{IntrospectionTrigger, TriggerCause};
    pub use crate::validate::ValidationFailure;
}
