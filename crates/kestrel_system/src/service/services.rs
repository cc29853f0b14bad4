//! The [`Services`] container.

use core::any::{Any, TypeId};
use hashbrown::HashMap;
use std::sync::Arc;

/// A value that can be registered as a shared service.
///
/// Services must be `Send + Sync + 'static`: once published they are read
/// from any thread. Types that need mutation after publication carry their
/// own interior locking (the specification loader does).
///
/// ```
/// use kestrel_system::service::Service;
///
/// struct Clock;
/// impl Service for Clock {}
/// ```
pub trait Service: Send + Sync + 'static {
    /// Returns the type name for debugging purposes.
    fn type_name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Unique identifier for a service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId(TypeId);

impl ServiceId {
    /// Creates a `ServiceId` for the given type.
    #[must_use]
    pub fn of<T: Service>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.0
    }
}

/// Errors that can occur when looking up services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The requested service type was never registered.
    #[error("service not found: {0}")]
    NotFound(&'static str),
}

/// Type-keyed storage for shared services.
///
/// ```
/// use kestrel_system::service::{Service, Services};
///
/// struct Counter { value: i32 }
/// impl Service for Counter {}
///
/// let mut services = Services::new();
/// services.insert(Counter { value: 3 });
///
/// let counter = services.get::<Counter>().unwrap();
/// assert_eq!(counter.value, 3);
/// ```
#[derive(Default)]
pub struct Services {
    storage: HashMap<ServiceId, Arc<dyn Any + Send + Sync>>,
}

impl core::fmt::Debug for Services {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.storage.len())
            .finish()
    }
}

impl Services {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Inserts a service, returning the previously registered instance of
    /// the same type, if any.
    pub fn insert<T: Service>(&mut self, service: T) -> Option<Arc<T>> {
        self.insert_arc(Arc::new(service))
    }

    /// Inserts an already shared service.
    pub fn insert_arc<T: Service>(&mut self, service: Arc<T>) -> Option<Arc<T>> {
        self.storage
            .insert(ServiceId::of::<T>(), service)
            .and_then(|old| old.downcast::<T>().ok())
    }

    /// Returns `true` if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Service>(&self) -> bool {
        self.storage.contains_key(&ServiceId::of::<T>())
    }

    /// Returns a shared handle to the service of type `T`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if no service of that type is registered.
    pub fn get<T: Service>(&self) -> Result<Arc<T>, ServiceError> {
        self.storage
            .get(&ServiceId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
            .ok_or(ServiceError::NotFound(core::any::type_name::<T>()))
    }

    /// Removes a service and returns it.
    pub fn remove<T: Service>(&mut self) -> Option<Arc<T>> {
        self.storage
            .remove(&ServiceId::of::<T>())
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Removes all services.
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter {
        value: i32,
    }
    impl Service for Counter {}

    #[derive(Debug, PartialEq)]
    struct Name(String);
    impl Service for Name {}

    #[test]
    fn insert_and_get() {
        let mut services = Services::new();
        services.insert(Counter { value: 42 });

        assert_eq!(services.get::<Counter>().unwrap().value, 42);
    }

    #[test]
    fn insert_replaces_existing() {
        let mut services = Services::new();
        services.insert(Counter { value: 1 });

        let old = services.insert(Counter { value: 2 });
        assert_eq!(old.as_deref(), Some(&Counter { value: 1 }));
        assert_eq!(services.get::<Counter>().unwrap().value, 2);
    }

    #[test]
    fn get_returns_the_same_instance() {
        let mut services = Services::new();
        services.insert(Counter { value: 7 });

        let first = services.get::<Counter>().unwrap();
        let second = services.get::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_service_is_not_found() {
        let services = Services::new();
        let result = services.get::<Counter>();

        assert!(matches!(result, Err(ServiceError::NotFound(name)) if name.contains("Counter")));
    }

    #[test]
    fn remove_returns_service() {
        let mut services = Services::new();
        services.insert(Name("kestrel".into()));

        let removed = services.remove::<Name>();
        assert_eq!(removed.as_deref(), Some(&Name("kestrel".into())));
        assert!(!services.contains::<Name>());
        assert!(services.remove::<Name>().is_none());
    }

    #[test]
    fn handle_outlives_removal() {
        let mut services = Services::new();
        services.insert(Counter { value: 5 });

        let handle = services.get::<Counter>().unwrap();
        services.clear();

        assert!(services.is_empty());
        assert_eq!(handle.value, 5);
    }

    #[test]
    fn len_and_is_empty() {
        let mut services = Services::new();
        assert!(services.is_empty());

        services.insert(Counter { value: 1 });
        services.insert(Name("a".into()));
        assert_eq!(services.len(), 2);
    }

    #[test]
    fn service_id_distinguishes_types() {
        assert_eq!(ServiceId::of::<Counter>(), ServiceId::of::<Counter>());
        assert_ne!(ServiceId::of::<Counter>(), ServiceId::of::<Name>());
        assert_eq!(
            ServiceId::of::<Counter>().type_id(),
            TypeId::of::<Counter>()
        );
    }
}
