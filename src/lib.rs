//! A reflection-driven domain metamodel for Rust.
//!
//! Kestrel reads a class model, introspects it into a graph of object
//! specifications with facets and members, and derives an application
//! feature tree from the result.

pub use kestrel_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use kestrel_internal::prelude::*;
}
