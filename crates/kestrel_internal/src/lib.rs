//! # Kestrel Internal Library
//!
//! Re-exports the core Kestrel crates for convenience.

/// Application lifecycle: plugins, services and APIs.
pub use kestrel_system;

/// Tracing and application metadata plugins.
pub use kestrel_core;

/// The object specification graph.
pub use kestrel_metamodel;

/// The application feature index.
pub use kestrel_features;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use kestrel_core::{DefaultPlugins, MinimalPlugins, TracingPlugin};
    pub use kestrel_features::prelude::*;
    pub use kestrel_metamodel::prelude::*;
    pub use kestrel_system::prelude::*;
}
