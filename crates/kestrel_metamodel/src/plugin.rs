//! Metamodel plugin.
//!
//! # Lifecycle
//!
//! - `build()` inserts the [`ProgrammingModel`] API, so plugins depending
//!   on this one can add facet factories, and the [`MetaModelConfig`]
//!   service.
//! - `ready()` moves the programming model into a new
//!   [`SpecificationLoader`], introspects every class when
//!   `eager_introspection` is set, validates, and publishes the loader as
//!   a service.
//! - `cleanup()` drops every cached specification.
//!
//! # Example
//!
//! ```
//! use kestrel_metamodel::class::{Annotation, ClassDescriptor, InMemoryClassRepository};
//! use kestrel_metamodel::loader::SpecificationLoader;
//! use kestrel_metamodel::plugin::MetaModelPlugin;
//! use kestrel_system::app::App;
//!
//! let repository = InMemoryClassRepository::with_builtins()
//!     .with(ClassDescriptor::class("com.acme.Customer").annotate(Annotation::entity()));
//!
//! let mut app = App::new();
//! app.add_plugins(MetaModelPlugin::new(repository));
//! app.finish();
//!
//! let loader = app.service::<SpecificationLoader>().unwrap();
//! assert!(loader.specification_for_logical_type_name("com.acme.Customer").is_some());
//! ```

use std::fmt::Write as _;
use std::sync::Arc;

use kestrel_system::app::App;
use kestrel_system::plugin::Plugin;
use tracing::{info, warn};

use crate::class::ClassRepository;
use crate::config::MetaModelConfig;
use crate::facet::ProgrammingModel;
use crate::loader::SpecificationLoader;

/// Builds the metamodel over a class repository.
pub struct MetaModelPlugin {
    repository: Arc<dyn ClassRepository>,
    config: MetaModelConfig,
}

impl MetaModelPlugin {
    /// Creates the plugin with the default configuration.
    #[must_use]
    pub fn new(repository: impl ClassRepository) -> Self {
        Self::from_arc(Arc::new(repository))
    }

    /// Creates the plugin over a shared repository.
    #[must_use]
    pub fn from_arc(repository: Arc<dyn ClassRepository>) -> Self {
        Self {
            repository,
            config: MetaModelConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MetaModelConfig) -> Self {
        self.config = config;
        self
    }
}

impl Plugin for MetaModelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_api(ProgrammingModel::with_standard_factories());
        app.insert_service(self.config.clone());
    }

    fn ready(&self, app: &mut App) {
        let model = app
            .remove_api::<ProgrammingModel>()
            .expect("ProgrammingModel API was removed before MetaModelPlugin became ready");
        info!(factories = model.len(), "building metamodel");

        let loader = SpecificationLoader::new(Arc::clone(&self.repository), model, self.config.clone());
        if self.config.eager_introspection {
            loader.introspect_all();
            if let Err(failures) = loader.validate() {
                let mut report = String::new();
                for failure in &failures {
                    warn!(%failure, "metamodel validation failed");
                    let _ = writeln!(report, "  - {failure}");
                }
                if self.config.validate_on_boot {
                    panic!("metamodel validation failed:\n{report}");
                }
            }
        }
        app.insert_service(loader);
    }

    fn cleanup(&self, app: &mut App) {
        if let Some(loader) = app.service::<SpecificationLoader>() {
            loader.clear();
        }
    }
}
