//! Core infrastructure plugins for Kestrel.
//!
//! - [`AppInfoPlugin`] - Application metadata
//! - [`TracingPlugin`] - Logging via the `tracing` crate
//! - [`DefaultPlugins`] - Both of the above
//! - [`MinimalPlugins`] - Metadata only, for tests that want no subscriber
//!
//! # Example
//!
//! ```
//! use kestrel_system::app::App;
//! use kestrel_system::plugin::PluginGroup;
//! use kestrel_core::{DefaultPlugins, TracingPlugin};
//!
//! App::new()
//!     .add_plugins(DefaultPlugins.build().disable::<TracingPlugin>())
//!     .finish();
//! ```

mod app_info;
mod tracing_plugin;

pub use app_info::{AppInfo, AppInfoPlugin};
pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};

use kestrel_system::plugin::{PluginGroup, PluginGroupBuilder};

/// Default plugins for most Kestrel applications.
///
/// Includes [`AppInfoPlugin`] and [`TracingPlugin`]. Swap in a configured
/// tracing plugin with `disable::<TracingPlugin>()` followed by `add`.
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(AppInfoPlugin)
            .add(TracingPlugin::default())
    }
}

/// Minimal plugins for headless or testing scenarios.
pub struct MinimalPlugins;

impl PluginGroup for MinimalPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(AppInfoPlugin)
    }
}
