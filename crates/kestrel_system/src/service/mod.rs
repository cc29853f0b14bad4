//! Shared service storage.
//!
//! Services are the injectable collaborators of an application: the
//! specification loader, the feature repository, configuration. They are
//! inserted by plugins and handed out as `Arc<T>`, so a caller can keep a
//! service alive independently of the [`App`](crate::app::App) borrow.
//!
//! - [`Service`] - Marker for types that may be stored
//! - [`Services`] - Type-keyed container
//! - [`ServiceError`] - Lookup failures

mod services;

pub use services::{Service, ServiceError, ServiceId, Services};
