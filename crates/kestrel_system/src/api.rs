//! Build-time registries.
//!
//! An API is a registry that plugins fill in during the build phase, before
//! the services derived from it exist. The programming model (the ordered
//! list of facet factories) is the canonical example: every plugin that
//! brings factories adds them to the same API, and the metamodel plugin reads
//! the finished list in `ready()`.
//!
//! | Aspect | API | Service |
//! |--------|-----|---------|
//! | **Purpose** | Plugin orchestration | Runtime collaboration |
//! | **Mutability** | Mutable during build | Shared, read-mostly |
//! | **Access** | `app.api_mut::<A>()` | `app.service::<S>()` |
//! | **Phase** | Build/Ready | Ready onwards |

/// Marker trait for build-time registries.
///
/// ```
/// use kestrel_system::api::Api;
///
/// #[derive(Default)]
/// struct Catalogue { entries: Vec<String> }
///
/// impl Api for Catalogue {}
/// ```
pub trait Api: Send + Sync + 'static {}
