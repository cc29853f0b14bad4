//! Application metadata plugin.
//!
//! [`AppInfoPlugin`] publishes an [`AppInfo`] service describing the running
//! build. Other plugins read it when they log their boot summaries.
//!
//! # Example
//!
//! ```
//! use kestrel_system::app::App;
//! use kestrel_core::{AppInfo, AppInfoPlugin};
//!
//! let mut app = App::new();
//! app.add_plugins(AppInfoPlugin);
//! app.finish();
//!
//! let info = app.service::<AppInfo>().unwrap();
//! assert!(!info.version.is_empty());
//! ```

use kestrel_system::app::App;
use kestrel_system::plugin::Plugin;
use kestrel_system::service::Service;
use serde::Serialize;

/// Application runtime information.
///
/// - `version` - The framework version from `Cargo.toml`
/// - `debug` - Whether the binary was compiled with debug assertions
#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    /// Framework version string.
    pub version: &'static str,
    /// Whether running in debug mode.
    pub debug: bool,
}

impl Service for AppInfo {}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            debug: cfg!(debug_assertions),
        }
    }
}

/// Plugin that provides application metadata.
///
/// Foundational; has no dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppInfoPlugin;

impl Plugin for AppInfoPlugin {
    fn build(&self, app: &mut App) {
        app.insert_service(AppInfo::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_info_default() {
        let info = AppInfo::default();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.debug, cfg!(debug_assertions));
    }

    #[test]
    fn app_info_plugin_registers_service() {
        let mut app = App::new();
        app.add_plugins(AppInfoPlugin);
        app.finish();
        assert!(app.contains_service::<AppInfo>());
    }

    #[test]
    fn app_info_plugin_name() {
        assert!(AppInfoPlugin.name().contains("AppInfoPlugin"));
    }
}
