//! Application lifecycle for Kestrel.
//!
//! `kestrel_system` provides the primitives every Kestrel application is
//! assembled from:
//!
//! - [`api`] - Build-time registries that plugins contribute to
//! - [`plugin`] - Plugin trait and plugin groups
//! - [`service`] - Shared, injectable services (the loader, registries, config)
//! - [`app`] - The orchestrator that runs the plugin lifecycle
//!
//! # Lifecycle
//!
//! An [`App`](app::App) owns a set of plugins. Calling
//! [`App::finish()`](app::App::finish) sorts them by dependency, runs every
//! `build()`, then every `ready()`. [`App::cleanup()`](app::App::cleanup)
//! tears them down in reverse order.
//!
//! # Example
//!
//! ```
//! use kestrel_system::app::App;
//! use kestrel_system::plugin::Plugin;
//! use kestrel_system::service::Service;
//!
//! #[derive(Default)]
//! struct Settings { strict: bool }
//! impl Service for Settings {}
//!
//! struct SettingsPlugin;
//!
//! impl Plugin for SettingsPlugin {
//!     fn build(&self, app: &mut App) {
//!         app.insert_service(Settings { strict: true });
//!     }
//! }
//!
//! let mut app = App::new();
//! app.add_plugins(SettingsPlugin);
//! app.finish();
//! assert!(app.service::<Settings>().unwrap().strict);
//! ```

/// Build-time capability registries.
pub mod api;

/// Application orchestrator.
pub mod app;

/// Plugin trait for extensible functionality.
pub mod plugin;

/// Shared service container.
pub mod service;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::api::*;
    pub use crate::app::*;
    pub use crate::plugin::*;
    pub use crate::service::*;
}
