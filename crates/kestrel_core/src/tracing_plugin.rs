//! Tracing plugin.
//!
//! [`TracingPlugin`] installs the `tracing` subscriber and publishes the
//! chosen settings as a [`TracingConfig`] service.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts [`TracingConfig`] so other plugins can see the
//!   intended level while they build.
//! - **`ready()`** installs the subscriber. Deferring installation lets
//!   plugin groups override settings before anything is logged.
//!
//! # Example
//!
//! ```
//! use kestrel_system::app::App;
//! use kestrel_core::{AppInfoPlugin, TracingConfig, TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let mut app = App::new();
//! app.add_plugins(AppInfoPlugin);
//! app.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! app.finish();
//!
//! let config = app.service::<TracingConfig>().unwrap();
//! assert_eq!(config.level, Level::DEBUG);
//! ```

use crate::{AppInfo, AppInfoPlugin};
use kestrel_system::app::App;
use kestrel_system::plugin::{Plugin, PluginId};
use kestrel_system::service::Service;
use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration service.
///
/// Read-only view of what [`TracingPlugin`] installed.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

impl Service for TracingConfig {}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// # Services Provided
///
/// | Service | Description |
/// |---------|-------------|
/// | [`TracingConfig`] | Tracing configuration (read-only) |
///
/// # Dependencies
///
/// - [`AppInfoPlugin`]
///
/// # Environment Filter
///
/// ```
/// use kestrel_core::TracingPlugin;
///
/// TracingPlugin::default()
///     .with_env_filter("kestrel_metamodel=debug,kestrel_features=info")
/// # ;
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    /// Directive string, e.g. `"kestrel_metamodel=trace"`.
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string (`target=level,...`).
    ///
    /// An unparsable filter falls back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_service(TracingConfig {
            level: self.level,
            format: self.format,
        });
    }

    fn ready(&self, app: &mut App) {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails when a subscriber is already installed; keep it.
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(self.filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }

        let version = app.service::<AppInfo>().map_or("unknown", |info| info.version);
        tracing::info!(
            level = %self.level,
            format = ?self.format,
            version,
            "TracingPlugin initialized"
        );
    }

    fn cleanup(&self, _app: &mut App) {
        tracing::info!("TracingPlugin shutting down");
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<AppInfoPlugin>()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_format_deserializes_from_snake_case() {
        let format: TracingFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, TracingFormat::Json);
    }

    #[test]
    fn tracing_plugin_builders() {
        let plugin = TracingPlugin::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Compact)
            .with_env_filter("kestrel_metamodel=trace")
            .with_span_events(true);
        assert_eq!(plugin.level, Level::DEBUG);
        assert_eq!(plugin.format, TracingFormat::Compact);
        assert_eq!(plugin.env_filter.as_deref(), Some("kestrel_metamodel=trace"));
        assert!(plugin.span_events);
    }

    #[test]
    fn tracing_plugin_registers_service() {
        let mut app = App::new();
        app.add_plugins(AppInfoPlugin);
        app.add_plugins(TracingPlugin::default().with_format(TracingFormat::Json));
        app.finish();

        let config = app.service::<TracingConfig>().unwrap();
        assert_eq!(config.format, TracingFormat::Json);
        assert_eq!(config.level, Level::INFO);
    }

    #[test]
    #[should_panic(expected = "AppInfoPlugin")]
    fn tracing_plugin_requires_app_info() {
        let mut app = App::new();
        app.add_plugins(TracingPlugin::default());
        app.finish();
    }
}
