//! Application features for Kestrel.
//!
//! A read-only index over the completed metamodel, arranged as a tree of
//! namespaces, types and members. Permission systems and menus address
//! features through [`ApplicationFeatureId`](id::ApplicationFeatureId)s.
//!
//! - [`id`] - Feature ids and their wire forms
//! - [`feature`] - Nodes of the feature tree
//! - [`repository`] - The lazily built index
//! - [`plugin`] - Publishes the index as a service
//!
//! # Example
//!
//! ```
//! use kestrel_features::prelude::*;
//! use kestrel_metamodel::prelude::*;
//! use kestrel_system::app::App;
//!
//! let repository = InMemoryClassRepository::with_builtins().with(
//!     ClassDescriptor::class("com.acme.Order")
//!         .annotate(Annotation::entity())
//!         .getter("getNumber", TypeRef::class(builtin::STRING)),
//! );
//!
//! let mut app = App::new();
//! app.add_plugins(MetaModelPlugin::new(repository));
//! app.add_plugins(FeaturesPlugin::new());
//! app.finish();
//!
//! let features = app.service::<ApplicationFeatureRepository>().unwrap();
//! let number = features.members_of("com.acme.Order", ApplicationMemberSort::Property);
//! assert_eq!(number[0].id().member_name(), Some("number"));
//! ```

/// Feature errors.
pub mod error;

/// Feature nodes.
pub mod feature;

/// Feature ids.
pub mod id;

/// Features plugin.
pub mod plugin;

/// The feature repository.
pub mod repository;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::{FeatureError, FeatureIdParseError};
    pub use crate::feature::{ApplicationFeature, ApplicationMemberSort};
    pub use crate::id::{ApplicationFeatureId, ApplicationFeatureSort};
    pub use crate::plugin::FeaturesPlugin;
    pub use crate::repository::ApplicationFeatureRepository;
}
