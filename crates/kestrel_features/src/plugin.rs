//! Features plugin.
//!
//! Publishes an [`ApplicationFeatureRepository`] over the
//! [`SpecificationLoader`] that [`MetaModelPlugin`] made available. The
//! index is built on first query unless [`FeaturesPlugin::eager`] asks for
//! it at boot.

use std::sync::Arc;

use kestrel_metamodel::loader::SpecificationLoader;
use kestrel_metamodel::plugin::MetaModelPlugin;
use kestrel_system::app::App;
use kestrel_system::plugin::{Plugin, PluginId};

use crate::repository::ApplicationFeatureRepository;

/// Publishes the application feature repository.
///
/// # Dependencies
///
/// - [`MetaModelPlugin`]
#[derive(Debug, Default, Clone, Copy)]
pub struct FeaturesPlugin {
    eager: bool,
}

impl FeaturesPlugin {
    /// Creates the plugin; the index is built lazily.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index during `ready()` instead of on first query.
    #[must_use]
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }
}

impl Plugin for FeaturesPlugin {
    fn build(&self, _app: &mut App) {}

    fn ready(&self, app: &mut App) {
        let loader: Arc<SpecificationLoader> = app
            .service::<SpecificationLoader>()
            .expect("FeaturesPlugin requires the SpecificationLoader service from MetaModelPlugin");
        let features = ApplicationFeatureRepository::new(loader);
        if self.eager {
            features.initialize();
        }
        app.insert_service(features);
    }

    fn cleanup(&self, app: &mut App) {
        if let Some(features) = app.service::<ApplicationFeatureRepository>() {
            features.invalidate();
        }
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<MetaModelPlugin>()]
    }
}
