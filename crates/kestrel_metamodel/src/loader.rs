//! The specification loader and its cache.
//!
//! [`SpecificationLoader`] is the entry point to the metamodel. It hands
//! out one [`ObjectSpecification`] per class, creating a shell on first
//! request and advancing it through the introspection phases.
//!
//! # Reentrancy
//!
//! A shell is cached before any of its phases run, so a type that refers
//! back to itself (directly or through members) gets the shell instead of
//! recursing. Each specification has one reentrant lock per phase: other
//! threads wait for a phase in progress, the introspecting thread itself
//! passes straight through.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use kestrel_metamodel::class::{ClassDescriptor, InMemoryClassRepository, TypeRef, builtin};
//! use kestrel_metamodel::ident::ClassName;
//! use kestrel_metamodel::loader::SpecificationLoader;
//!
//! let repository = InMemoryClassRepository::with_builtins().with(
//!     ClassDescriptor::class("com.acme.Customer").getter("getName", TypeRef::class(builtin::STRING)),
//! );
//! let loader = SpecificationLoader::with_defaults(Arc::new(repository));
//!
//! let customer = loader.load_specification(&ClassName::new("com.acme.Customer")).unwrap();
//! assert!(customer.is_fully_introspected());
//! assert!(customer.get_member("name").is_some());
//! ```

use core::fmt;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use kestrel_system::service::Service;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::class::{ClassRepository, TypeRef};
use crate::config::MetaModelConfig;
use crate::error::MetaModelError;
use crate::facet::ProgrammingModel;
use crate::ident::ClassName;
use crate::introspector::Introspector;
use crate::member::ObjectMember;
use crate::partition::MethodKey;
use crate::spec::{Depth, IntrospectionState, ObjectSpecification, logical_name_of};
use crate::trigger::{IntrospectionTrigger, TriggerCause, TriggerLog, TriggerRecord};
use crate::validate::{MetaModelValidator, ValidationFailure};

/// Cross-specification structure, guarded by one coarse lock.
#[derive(Default)]
struct Structure {
    subclasses: HashMap<ClassName, IndexSet<ClassName>>,
    members_by_method: HashMap<(ClassName, MethodKey), String>,
}

/// Shared state behind the loader. Specifications keep a weak handle to
/// it for graph navigation.
pub(crate) struct Registry {
    repository: Arc<dyn ClassRepository>,
    model: ProgrammingModel,
    config: MetaModelConfig,
    cache: RwLock<IndexMap<ClassName, Arc<ObjectSpecification>>>,
    logical_index: RwLock<HashMap<String, ClassName>>,
    structure: RwLock<Structure>,
    mixins: RwLock<Option<Arc<[ClassName]>>>,
    triggers: Mutex<TriggerLog>,
    cycles: Mutex<IndexSet<ClassName>>,
}

impl Registry {
    pub(crate) fn repository(&self) -> &Arc<dyn ClassRepository> {
        &self.repository
    }

    pub(crate) fn model(&self) -> &ProgrammingModel {
        &self.model
    }

    pub(crate) fn cached(&self, class: &ClassName) -> Option<Arc<ObjectSpecification>> {
        self.cache.read().get(class).cloned()
    }

    /// The specification for `class`, advanced to at least `target`
    /// unless the calling thread is already introspecting it.
    pub(crate) fn resolve(
        self: &Arc<Self>,
        class: &ClassName,
        target: IntrospectionState,
        trigger: IntrospectionTrigger,
    ) -> Option<Arc<ObjectSpecification>> {
        let spec = self.shell(class, trigger)?;
        self.advance(&spec, target);
        Some(spec)
    }

    /// Like [`resolve`](Self::resolve) for a signature type. Collections
    /// resolve to their element type; `void` to nothing.
    pub(crate) fn resolve_type(
        self: &Arc<Self>,
        ty: &TypeRef,
        target: IntrospectionState,
        trigger: IntrospectionTrigger,
    ) -> Option<Arc<ObjectSpecification>> {
        match ty {
            TypeRef::Void => None,
            TypeRef::Collection(_, element) => self.resolve_type(element, target, trigger),
            TypeRef::Primitive(_) | TypeRef::Class(_) | TypeRef::Array(_) => {
                let class = ty.class_name()?;
                self.resolve(&class, target, trigger)
            }
        }
    }

    fn shell(
        self: &Arc<Self>,
        class: &ClassName,
        trigger: IntrospectionTrigger,
    ) -> Option<Arc<ObjectSpecification>> {
        if let Some(spec) = self.cached(class) {
            return Some(spec);
        }
        let shell = self.create_shell(class, &trigger)?;

        let spec = {
            let mut cache = self.cache.write();
            if let Some(existing) = cache.get(class) {
                return Some(Arc::clone(existing));
            }
            let spec = Arc::new(shell);
            cache.insert(class.clone(), Arc::clone(&spec));
            spec
        };
        self.logical_index
            .write()
            .entry(spec.logical_type_name().to_owned())
            .or_insert_with(|| class.clone());

        trace!(%class, %trigger, "specification created");
        if self.config.record_triggers {
            self.triggers.lock().push(TriggerRecord {
                class: class.clone(),
                trigger,
            });
        }
        Some(spec)
    }

    fn create_shell(
        self: &Arc<Self>,
        class: &ClassName,
        trigger: &IntrospectionTrigger,
    ) -> Option<ObjectSpecification> {
        let policy = self.config.introspection_policy;
        if let Some(component) = class.component() {
            if component.is_array() {
                return None;
            }
            let element = self.resolve(
                &component,
                IntrospectionState::TypeIntrospected,
                IntrospectionTrigger::from_class(TriggerCause::MemberType, class),
            )?;
            if element.is_vetoed() {
                return None;
            }
            return Some(ObjectSpecification::for_array(
                component,
                policy,
                trigger.clone(),
                Arc::downgrade(self),
            ));
        }
        let descriptor = self.repository.descriptor(class)?;
        Some(ObjectSpecification::for_class(
            descriptor,
            policy,
            trigger.clone(),
            Arc::downgrade(self),
        ))
    }

    /// Runs whichever phases are needed to reach `target`.
    pub(crate) fn advance(self: &Arc<Self>, spec: &Arc<ObjectSpecification>, target: IntrospectionState) {
        if spec.state() >= target {
            return;
        }
        {
            let _type_phase = spec.type_lock.lock();
            if spec.state() == IntrospectionState::NotIntrospected {
                spec.set_state(IntrospectionState::TypeIntrospecting);
                Introspector::new(self).introspect_type(spec);
                spec.set_state(IntrospectionState::TypeIntrospected);
            }
        }
        if target < IntrospectionState::FullyIntrospected {
            return;
        }

        let _member_phase = spec.member_lock.lock();
        if spec.state() == IntrospectionState::TypeIntrospected {
            spec.set_state(IntrospectionState::MembersIntrospecting);
            Introspector::new(self).introspect_members(spec);
            if let Err(err) = spec.complete_introspection() {
                warn!(class = %spec.class(), %err, "introspection did not complete");
            }
        }
    }

    pub(crate) fn register_subclass(&self, parent: &ClassName, child: &ClassName) {
        if parent == child {
            return;
        }
        self.structure
            .write()
            .subclasses
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
    }

    pub(crate) fn subclass_names(&self, class: &ClassName) -> Vec<ClassName> {
        self.structure
            .read()
            .subclasses
            .get(class)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn register_member_methods(&self, host: &ClassName, methods: Vec<(MethodKey, String)>) {
        let mut structure = self.structure.write();
        for (key, id) in methods {
            structure.members_by_method.insert((host.clone(), key), id);
        }
    }

    pub(crate) fn record_cycle(&self, class: &ClassName) {
        self.cycles.lock().insert(class.clone());
    }

    pub(crate) fn cycles(&self) -> Vec<ClassName> {
        self.cycles.lock().iter().cloned().collect()
    }

    /// Every non-vetoed mixin class in the repository, computed once.
    pub(crate) fn mixin_classes(&self) -> Arc<[ClassName]> {
        if let Some(mixins) = self.mixins.read().as_ref() {
            return Arc::clone(mixins);
        }
        let mixins: Arc<[ClassName]> = self
            .repository
            .class_names()
            .into_iter()
            .filter(|name| {
                self.repository.descriptor(name).is_some_and(|descriptor| {
                    descriptor.mixin().is_some() && !descriptor.annotations.is_vetoed()
                })
            })
            .collect();
        *self.mixins.write() = Some(Arc::clone(&mixins));
        mixins
    }

    /// Removes every trace of `class` from the cache and the structural
    /// indexes.
    fn purge(&self, class: &ClassName) -> Option<Arc<ObjectSpecification>> {
        let old = self.cache.write().shift_remove(class);
        if let Some(old) = &old {
            let mut index = self.logical_index.write();
            if index.get(old.logical_type_name()) == Some(class) {
                index.remove(old.logical_type_name());
            }
        }
        {
            let mut structure = self.structure.write();
            for children in structure.subclasses.values_mut() {
                children.shift_remove(class);
            }
            structure
                .members_by_method
                .retain(|(host, key), _| host != class && key.declaring != *class);
        }
        *self.mixins.write() = None;
        self.cycles.lock().shift_remove(class);
        old
    }

    fn clear(&self) {
        self.cache.write().clear();
        self.logical_index.write().clear();
        *self.structure.write() = Structure::default();
        *self.mixins.write() = None;
        self.triggers.lock().clear();
        self.cycles.lock().clear();
    }
}

/// Hands out and caches [`ObjectSpecification`]s.
///
/// Inserted as a service by [`MetaModelPlugin`](crate::plugin::MetaModelPlugin);
/// can also be built directly.
pub struct SpecificationLoader {
    registry: Arc<Registry>,
}

impl Service for SpecificationLoader {}

impl fmt::Debug for SpecificationLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificationLoader")
            .field("specifications", &self.len())
            .field("config", &self.registry.config)
            .finish_non_exhaustive()
    }
}

impl SpecificationLoader {
    /// Creates a loader over `repository`.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ClassRepository>,
        model: ProgrammingModel,
        config: MetaModelConfig,
    ) -> Self {
        let triggers = TriggerLog::new(if config.record_triggers {
            config.trigger_log_capacity
        } else {
            0
        });
        Self {
            registry: Arc::new(Registry {
                repository,
                model,
                config,
                cache: RwLock::new(IndexMap::new()),
                logical_index: RwLock::new(HashMap::new()),
                structure: RwLock::new(Structure::default()),
                mixins: RwLock::new(None),
                triggers: Mutex::new(triggers),
                cycles: Mutex::new(IndexSet::new()),
            }),
        }
    }

    /// A loader with the standard programming model and default
    /// configuration.
    #[must_use]
    pub fn with_defaults(repository: Arc<dyn ClassRepository>) -> Self {
        Self::new(
            repository,
            ProgrammingModel::with_standard_factories(),
            MetaModelConfig::default(),
        )
    }

    /// The configuration the loader was built with.
    #[must_use]
    pub fn config(&self) -> &MetaModelConfig {
        &self.registry.config
    }

    /// The class model.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn ClassRepository> {
        &self.registry.repository
    }

    /// The facet factories in use.
    #[must_use]
    pub fn programming_model(&self) -> &ProgrammingModel {
        &self.registry.model
    }

    /// The fully introspected specification of `class`, or `None` if the
    /// class is unknown or excluded. Repeated calls return the same `Arc`.
    #[must_use]
    pub fn load_specification(&self, class: &ClassName) -> Option<Arc<ObjectSpecification>> {
        self.load_specification_with(class, IntrospectionTrigger::new(TriggerCause::Request))
    }

    /// Like [`load_specification`](Self::load_specification), recording a
    /// specific trigger.
    #[must_use]
    pub fn load_specification_with(
        &self,
        class: &ClassName,
        trigger: IntrospectionTrigger,
    ) -> Option<Arc<ObjectSpecification>> {
        self.registry
            .resolve(class, IntrospectionState::FullyIntrospected, trigger)
    }

    /// The specification of a signature type. Collections yield their
    /// element's specification, `void` yields `None`.
    #[must_use]
    pub fn load_type(&self, ty: &TypeRef) -> Option<Arc<ObjectSpecification>> {
        self.registry.resolve_type(
            ty,
            IntrospectionState::FullyIntrospected,
            IntrospectionTrigger::new(TriggerCause::Request),
        )
    }

    /// The cached specification of `class`, without loading anything.
    #[must_use]
    pub fn lookup(&self, class: &ClassName) -> Option<Arc<ObjectSpecification>> {
        self.registry.cached(class)
    }

    /// The specification carrying logical type name `name`.
    #[must_use]
    pub fn specification_for_logical_type_name(&self, name: &str) -> Option<Arc<ObjectSpecification>> {
        let trigger = IntrospectionTrigger::new(TriggerCause::LogicalTypeLookup);
        let indexed = self.registry.logical_index.read().get(name).cloned();
        if let Some(class) = indexed {
            return self.load_specification_with(&class, trigger);
        }
        let repository = &self.registry.repository;
        let class = repository.class_names().into_iter().find(|class| {
            repository
                .descriptor(class)
                .is_some_and(|descriptor| logical_name_of(&descriptor) == name)
        })?;
        self.load_specification_with(&class, trigger)
    }

    /// The specification carrying logical type name `name`.
    ///
    /// # Errors
    ///
    /// [`MetaModelError::LogicalTypeNotFound`] if no class carries it.
    pub fn specification_for_logical_type_name_else_fail(
        &self,
        name: &str,
    ) -> Result<Arc<ObjectSpecification>, MetaModelError> {
        self.specification_for_logical_type_name(name)
            .ok_or_else(|| MetaModelError::LogicalTypeNotFound(name.to_owned()))
    }

    /// Discards the specification of `class` and introspects it afresh
    /// from the repository's current descriptor. Other specifications are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// [`MetaModelError::ClassNotFound`] if the repository no longer knows
    /// the class. The old specification is kept in that case.
    pub fn reload(&self, class: &ClassName) -> Result<Arc<ObjectSpecification>, MetaModelError> {
        let physical = class.component().unwrap_or_else(|| class.clone());
        if self.registry.repository.descriptor(&physical).is_none() {
            return Err(MetaModelError::ClassNotFound(class.clone()));
        }
        let old = self.registry.purge(class);
        debug!(%class, purged = old.is_some(), "reloading specification");
        self.load_specification_with(class, IntrospectionTrigger::new(TriggerCause::Reload))
            .ok_or_else(|| MetaModelError::ClassNotFound(class.clone()))
    }

    /// Introspects every class in the repository and returns the
    /// snapshot. Uses `boot_concurrency` threads.
    pub fn introspect_all(&self) -> Vec<Arc<ObjectSpecification>> {
        let started = Instant::now();
        let classes = self.registry.repository.class_names();
        let threads = self
            .registry
            .config
            .boot_concurrency
            .clamp(1, classes.len().max(1));
        let boot = IntrospectionTrigger::new(TriggerCause::Boot);

        if threads == 1 {
            for class in &classes {
                self.registry
                    .resolve(class, IntrospectionState::FullyIntrospected, boot.clone());
            }
        } else {
            let chunk_size = classes.len().div_ceil(threads);
            std::thread::scope(|scope| {
                for chunk in classes.chunks(chunk_size) {
                    let registry = &self.registry;
                    let boot = boot.clone();
                    scope.spawn(move || {
                        for class in chunk {
                            registry.resolve(class, IntrospectionState::FullyIntrospected, boot.clone());
                        }
                    });
                }
            });
        }
        self.complete_partial();

        let snapshot = self.snapshot();
        info!(
            specifications = snapshot.len(),
            threads,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "metamodel introspected"
        );
        snapshot
    }

    /// Advances shells created along the way (supertypes, member types)
    /// until nothing is left partially introspected.
    fn complete_partial(&self) {
        loop {
            let partial: Vec<_> = self
                .registry
                .cache
                .read()
                .values()
                .filter(|spec| !spec.is_fully_introspected())
                .cloned()
                .collect();
            if partial.is_empty() {
                return;
            }
            for spec in &partial {
                self.registry
                    .advance(spec, IntrospectionState::FullyIntrospected);
            }
            if partial.iter().all(|spec| !spec.is_fully_introspected()) {
                warn!(remaining = partial.len(), "specifications left partially introspected");
                return;
            }
        }
    }

    /// Every fully introspected specification, sorted by logical type
    /// name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<ObjectSpecification>> {
        let mut specs: Vec<_> = self
            .registry
            .cache
            .read()
            .values()
            .filter(|spec| spec.is_fully_introspected())
            .cloned()
            .collect();
        specs.sort_by(|a, b| {
            a.logical_type_name()
                .cmp(b.logical_type_name())
                .then_with(|| a.class().cmp(b.class()))
        });
        specs
    }

    /// The member whose accessor or action method is `key`, looked up on
    /// the declaring class first and then on any type that inherited it.
    #[must_use]
    pub fn member_for_method(&self, key: &MethodKey) -> Option<ObjectMember> {
        let host = {
            let structure = self.registry.structure.read();
            match structure.members_by_method.get(&(key.declaring.clone(), key.clone())) {
                Some(id) => Some((key.declaring.clone(), id.clone())),
                None => structure
                    .members_by_method
                    .iter()
                    .filter(|((_, candidate), _)| candidate == key)
                    .map(|((host, _), id)| (host.clone(), id.clone()))
                    .min(),
            }
        };
        let (host, id) = host?;
        self.registry.cached(&host)?.try_members().ok()?.get(&id).cloned()
    }

    /// Known subclasses of `class`.
    #[must_use]
    pub fn subclasses(&self, class: &ClassName, depth: Depth) -> Vec<Arc<ObjectSpecification>> {
        self.registry
            .cached(class)
            .map(|spec| spec.subclasses(depth))
            .unwrap_or_default()
    }

    /// Classes found on a cyclic type hierarchy.
    #[must_use]
    pub fn cyclic_classes(&self) -> Vec<ClassName> {
        self.registry.cycles()
    }

    /// The most recent introspection triggers, oldest first. Empty unless
    /// `record_triggers` is set.
    #[must_use]
    pub fn trigger_log(&self) -> Vec<TriggerRecord> {
        self.registry.triggers.lock().records()
    }

    /// Checks the loaded metamodel.
    ///
    /// # Errors
    ///
    /// Every problem found, in a stable order.
    pub fn validate(&self) -> Result<(), Vec<ValidationFailure>> {
        MetaModelValidator::new(&self.snapshot(), &self.registry.cycles()).validate()
    }

    /// Number of cached specifications, partial ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.cache.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.cache.read().is_empty()
    }

    /// Drops every cached specification.
    pub fn clear(&self) {
        self.registry.clear();
        debug!("specification cache cleared");
    }
}
