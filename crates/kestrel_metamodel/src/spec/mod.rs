//! Object specifications.
//!
//! An [`ObjectSpecification`] describes one introspected type. It is
//! created as a shell by the loader, then advanced through the
//! [`IntrospectionState`]s by exactly one thread at a time:
//!
//! ```text
//! NotIntrospected → TypeIntrospecting → TypeIntrospected
//!                 → MembersIntrospecting → FullyIntrospected
//! ```
//!
//! The state is published with release/acquire ordering and the member
//! table through a write-once cell, so readers never observe a half-built
//! specification.

mod hierarchy;

use core::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};

pub use hierarchy::Depth;

use crate::class::{ClassDescriptor, ClassKind, Nature};
use crate::error::MetaModelError;
use crate::facet::{
    DescribedFacet, DomainServiceFacet, EntityFacet, FacetHolder, FacetKind, FacetVariant,
    IntrospectionFacet, NamedFacet, PluralFacet, Precedence, UniqueFacet, ViewModelFacet,
};
use crate::ident::{ClassName, LogicalType};
use crate::loader::Registry;
use crate::member::{
    MemberTable, ObjectAction, ObjectMember, OneToManyAssociation, OneToOneAssociation,
};
use crate::naming;
use crate::partition::MethodPartition;
use crate::trigger::IntrospectionTrigger;

/// Which methods introspection admits as members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrospectionPolicy {
    /// Public methods are members unless excluded.
    #[default]
    AnnotationOptional,
    /// Only public methods carrying a member annotation are members.
    AnnotationRequired,
    /// Only annotated methods are members, public or not.
    EncapsulationEnabled,
}

impl IntrospectionPolicy {
    /// Returns true if a method with this visibility and annotation state
    /// may become a member.
    #[must_use]
    pub fn admits(self, is_public: bool, explicitly_annotated: bool) -> bool {
        match self {
            Self::AnnotationOptional => is_public,
            Self::AnnotationRequired => is_public && explicitly_annotated,
            Self::EncapsulationEnabled => explicitly_annotated,
        }
    }
}

/// Classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeanSort {
    /// Deliberately excluded from the metamodel.
    Vetoed,
    /// Value type: primitives, wrappers, enums, `Value`-annotated classes.
    Value,
    /// Array type.
    Collection,
    /// Domain service.
    Service,
    /// Mixin contributing to another type.
    Mixin,
    /// Persisted entity.
    Entity,
    /// View model.
    ViewModel,
    /// Abstract class or interface.
    Abstract,
    /// None of the above.
    Unknown,
}

impl BeanSort {
    /// Classifies a class from its descriptor. Checks run in declaration
    /// order of the variants; the first match wins.
    #[must_use]
    pub fn classify(descriptor: &ClassDescriptor) -> Self {
        let annotations = &descriptor.annotations;
        if annotations.is_vetoed() {
            return Self::Vetoed;
        }
        if matches!(descriptor.kind, ClassKind::Primitive | ClassKind::Enum) || annotations.is_value()
        {
            return Self::Value;
        }
        if annotations.domain_service().is_some() {
            return Self::Service;
        }
        if annotations.mixin().is_some() {
            return Self::Mixin;
        }
        match annotations.domain_object().map(|object| object.nature) {
            Some(Nature::Entity) => Self::Entity,
            Some(Nature::ViewModel) => Self::ViewModel,
            _ if descriptor.is_abstract => Self::Abstract,
            _ => Self::Unknown,
        }
    }

    /// Returns true for sorts that never get members.
    #[must_use]
    pub fn is_memberless(self) -> bool {
        matches!(self, Self::Vetoed | Self::Value | Self::Collection)
    }
}

/// How far a specification has been introspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum IntrospectionState {
    /// Shell only.
    NotIntrospected = 0,
    /// Type phase running.
    TypeIntrospecting = 1,
    /// Hierarchy and class facets done.
    TypeIntrospected = 2,
    /// Member phase running.
    MembersIntrospecting = 3,
    /// Members published and defaults resolved.
    FullyIntrospected = 4,
}

impl IntrospectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotIntrospected,
            1 => Self::TypeIntrospecting,
            2 => Self::TypeIntrospected,
            3 => Self::MembersIntrospecting,
            _ => Self::FullyIntrospected,
        }
    }
}

/// Logical type name of a class: the `DomainObject` or `DomainService`
/// override, else the class name.
pub(crate) fn logical_name_of(descriptor: &ClassDescriptor) -> String {
    let annotations = &descriptor.annotations;
    annotations
        .domain_object()
        .and_then(|object| object.logical_type_name)
        .or_else(|| annotations.domain_service().flatten())
        .map_or_else(|| descriptor.name.to_string(), str::to_owned)
}

/// The metamodel of one type.
pub struct ObjectSpecification {
    class: ClassName,
    logical_type: LogicalType,
    descriptor: Option<Arc<ClassDescriptor>>,
    bean_sort: BeanSort,
    policy: IntrospectionPolicy,
    superclass: Option<ClassName>,
    interfaces: Vec<ClassName>,
    element_type: Option<ClassName>,
    trigger: IntrospectionTrigger,
    state: AtomicU8,
    facets: RwLock<FacetHolder>,
    members: OnceLock<MemberTable>,
    pending: Mutex<Option<MethodPartition>>,
    registry: Weak<Registry>,
    pub(crate) type_lock: ReentrantMutex<()>,
    pub(crate) member_lock: ReentrantMutex<()>,
}

impl ObjectSpecification {
    /// Shell for a class.
    pub(crate) fn for_class(
        descriptor: Arc<ClassDescriptor>,
        default_policy: IntrospectionPolicy,
        trigger: IntrospectionTrigger,
        registry: Weak<Registry>,
    ) -> Self {
        let class = descriptor.name.clone();
        let logical_type = LogicalType::new(class.clone(), logical_name_of(&descriptor));
        let policy = descriptor
            .annotations
            .domain_object()
            .and_then(|object| object.introspection)
            .unwrap_or(default_policy);
        Self {
            bean_sort: BeanSort::classify(&descriptor),
            superclass: descriptor.superclass.clone(),
            interfaces: descriptor.interfaces.clone(),
            element_type: None,
            descriptor: Some(descriptor),
            class,
            logical_type,
            policy,
            trigger,
            state: AtomicU8::new(IntrospectionState::NotIntrospected as u8),
            facets: RwLock::new(FacetHolder::new()),
            members: OnceLock::new(),
            pending: Mutex::new(None),
            registry,
            type_lock: ReentrantMutex::new(()),
            member_lock: ReentrantMutex::new(()),
        }
    }

    /// Shell for an array of `element`.
    pub(crate) fn for_array(
        element: ClassName,
        default_policy: IntrospectionPolicy,
        trigger: IntrospectionTrigger,
        registry: Weak<Registry>,
    ) -> Self {
        let class = element.array_of();
        Self {
            logical_type: LogicalType::of(class.clone()),
            class,
            descriptor: None,
            bean_sort: BeanSort::Collection,
            policy: default_policy,
            superclass: None,
            interfaces: Vec::new(),
            element_type: Some(element),
            trigger,
            state: AtomicU8::new(IntrospectionState::NotIntrospected as u8),
            facets: RwLock::new(FacetHolder::new()),
            members: OnceLock::new(),
            pending: Mutex::new(None),
            registry,
            type_lock: ReentrantMutex::new(()),
            member_lock: ReentrantMutex::new(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────

    /// Physical class name.
    #[must_use]
    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// Logical type.
    #[must_use]
    pub fn logical_type(&self) -> &LogicalType {
        &self.logical_type
    }

    /// Logical type name.
    #[must_use]
    pub fn logical_type_name(&self) -> &str {
        self.logical_type.logical_name()
    }

    /// The class descriptor. `None` for arrays.
    #[must_use]
    pub fn descriptor(&self) -> Option<&Arc<ClassDescriptor>> {
        self.descriptor.as_ref()
    }

    /// Classification.
    #[must_use]
    pub fn bean_sort(&self) -> BeanSort {
        self.bean_sort
    }

    /// Effective introspection policy.
    #[must_use]
    pub fn introspection_policy(&self) -> IntrospectionPolicy {
        self.policy
    }

    /// What caused this specification to be created.
    #[must_use]
    pub fn trigger(&self) -> &IntrospectionTrigger {
        &self.trigger
    }

    /// Component type of an array.
    #[must_use]
    pub fn element_type(&self) -> Option<&ClassName> {
        self.element_type.as_ref()
    }

    /// Declared superclass name.
    #[must_use]
    pub fn superclass_name(&self) -> Option<&ClassName> {
        self.superclass.as_ref()
    }

    /// Declared interface names.
    #[must_use]
    pub fn interface_names(&self) -> &[ClassName] {
        &self.interfaces
    }

    /// Entities.
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.bean_sort == BeanSort::Entity
    }

    /// View models.
    #[must_use]
    pub fn is_view_model(&self) -> bool {
        self.bean_sort == BeanSort::ViewModel
    }

    /// Value types.
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.bean_sort == BeanSort::Value
    }

    /// Domain services.
    #[must_use]
    pub fn is_service(&self) -> bool {
        self.bean_sort == BeanSort::Service
    }

    /// Mixins.
    #[must_use]
    pub fn is_mixin(&self) -> bool {
        self.bean_sort == BeanSort::Mixin
    }

    /// Vetoed classes, kept without members.
    #[must_use]
    pub fn is_vetoed(&self) -> bool {
        self.bean_sort == BeanSort::Vetoed
    }

    /// Abstract classes and interfaces.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(|descriptor| descriptor.is_abstract)
    }

    /// Interfaces only.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(|descriptor| descriptor.kind == ClassKind::Interface)
    }

    /// Primitive types such as `int`.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(|descriptor| descriptor.kind == ClassKind::Primitive)
    }

    /// Array types.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.element_type.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────

    /// Current introspection state.
    #[must_use]
    pub fn state(&self) -> IntrospectionState {
        IntrospectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: IntrospectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Returns true once members are published and defaults resolved.
    #[must_use]
    pub fn is_fully_introspected(&self) -> bool {
        self.state() == IntrospectionState::FullyIntrospected
    }

    pub(crate) fn registry(&self) -> Option<Arc<Registry>> {
        self.registry.upgrade()
    }

    pub(crate) fn stash_partition(&self, partition: MethodPartition) {
        *self.pending.lock() = Some(partition);
    }

    pub(crate) fn take_partition(&self) -> Option<MethodPartition> {
        self.pending.lock().take()
    }

    pub(crate) fn publish_members(&self, table: MemberTable) {
        if self.members.set(table).is_err() {
            tracing::debug!(class = %self.class, "member table already published");
        }
    }

    /// Resolves defaults that depend on the finished member phase and
    /// marks the specification fully introspected.
    ///
    /// # Errors
    ///
    /// [`MetaModelError::AlreadyIntrospected`] if called twice,
    /// [`MetaModelError::NotIntrospected`] if members are not yet
    /// published.
    pub fn complete_introspection(&self) -> Result<(), MetaModelError> {
        match self.state() {
            IntrospectionState::FullyIntrospected => {
                return Err(MetaModelError::AlreadyIntrospected(self.class.clone()));
            }
            IntrospectionState::MembersIntrospecting if self.members.get().is_some() => {}
            _ => return Err(MetaModelError::NotIntrospected(self.class.clone())),
        }

        const ORIGIN: &str = "complete_introspection";
        {
            let mut facets = self.facets.write();
            let singular = facets.lookup::<NamedFacet>().map_or_else(
                || naming::natural_name(self.class.simple_name()),
                |named| named.name.clone(),
            );
            facets.add(NamedFacet::new(singular.clone()), Precedence::Inferred, ORIGIN);
            facets.add(
                PluralFacet {
                    plural: naming::plural(&singular),
                },
                Precedence::Inferred,
                ORIGIN,
            );
            facets.add(
                IntrospectionFacet {
                    policy: self.policy,
                },
                Precedence::Inferred,
                ORIGIN,
            );
            match self.bean_sort {
                BeanSort::Entity if !facets.contains(FacetKind::Entity) => {
                    facets.add(
                        EntityFacet {
                            persistable: !self.is_abstract(),
                        },
                        Precedence::Inferred,
                        ORIGIN,
                    );
                }
                BeanSort::ViewModel if !facets.contains(FacetKind::ViewModel) => {
                    facets.add(ViewModelFacet, Precedence::Inferred, ORIGIN);
                }
                BeanSort::Service if !facets.contains(FacetKind::DomainService) => {
                    facets.add(DomainServiceFacet, Precedence::Inferred, ORIGIN);
                }
                _ => {}
            }
        }

        self.set_state(IntrospectionState::FullyIntrospected);
        tracing::debug!(class = %self.class, "fully introspected");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Facets
    // ─────────────────────────────────────────────────────────────────────

    /// The facet of type `F`, cloned.
    #[must_use]
    pub fn facet<F: UniqueFacet>(&self) -> Option<F> {
        self.facets.read().lookup::<F>().cloned()
    }

    /// The facet of a parameterized kind, cloned.
    #[must_use]
    pub fn facet_of_kind<F: FacetVariant>(&self, kind: FacetKind) -> Option<F> {
        self.facets.read().lookup_kind::<F>(kind).cloned()
    }

    /// Returns true if a facet of `kind` is present.
    #[must_use]
    pub fn has_facet(&self, kind: FacetKind) -> bool {
        self.facets.read().contains(kind)
    }

    /// Precedence of the facet of `kind`.
    #[must_use]
    pub fn facet_precedence(&self, kind: FacetKind) -> Option<Precedence> {
        self.facets.read().precedence(kind)
    }

    /// Snapshot of all facets.
    #[must_use]
    pub fn facets(&self) -> FacetHolder {
        self.facets.read().clone()
    }

    pub(crate) fn with_facets_mut<R>(&self, f: impl FnOnce(&mut FacetHolder) -> R) -> R {
        f(&mut self.facets.write())
    }

    /// Display name.
    #[must_use]
    pub fn singular_name(&self) -> String {
        self.facet::<NamedFacet>().map_or_else(
            || naming::natural_name(self.class.simple_name()),
            |named| named.name,
        )
    }

    /// Plural display name.
    #[must_use]
    pub fn plural_name(&self) -> String {
        self.facet::<PluralFacet>()
            .map_or_else(|| naming::plural(&self.singular_name()), |plural| plural.plural)
    }

    /// Description, if any.
    #[must_use]
    pub fn description(&self) -> Option<String> {
        self.facet::<DescribedFacet>()
            .map(|described| described.description)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Members
    // ─────────────────────────────────────────────────────────────────────

    /// The member table.
    ///
    /// # Errors
    ///
    /// [`MetaModelError::NotIntrospected`] before introspection completes.
    pub fn try_members(&self) -> Result<&MemberTable, MetaModelError> {
        if !self.is_fully_introspected() {
            return Err(MetaModelError::NotIntrospected(self.class.clone()));
        }
        self.members
            .get()
            .ok_or_else(|| MetaModelError::NotIntrospected(self.class.clone()))
    }

    /// The member table.
    ///
    /// # Panics
    ///
    /// Panics if introspection has not completed. Specifications handed
    /// out by the loader are always complete.
    #[must_use]
    pub fn members(&self) -> &MemberTable {
        match self.try_members() {
            Ok(table) => table,
            Err(_) => panic!("specification {} is not yet introspected", self.class),
        }
    }

    /// Properties, in display order.
    #[must_use]
    pub fn properties(&self) -> &[Arc<OneToOneAssociation>] {
        self.members().properties()
    }

    /// Collections, in display order.
    #[must_use]
    pub fn collections(&self) -> &[Arc<OneToManyAssociation>] {
        self.members().collections()
    }

    /// Properties and collections together, in display order.
    #[must_use]
    pub fn associations(&self) -> &[ObjectMember] {
        self.members().associations()
    }

    /// Actions, in display order.
    #[must_use]
    pub fn actions(&self) -> &[Arc<ObjectAction>] {
        self.members().actions()
    }

    /// The member with local id `id`.
    #[must_use]
    pub fn get_member(&self, id: &str) -> Option<ObjectMember> {
        self.members().get(id).cloned()
    }

    /// The member with local id `id`.
    ///
    /// # Errors
    ///
    /// [`MetaModelError::MemberNotFound`] if there is none, or
    /// [`MetaModelError::NotIntrospected`] before introspection completes.
    pub fn get_member_else_fail(&self, id: &str) -> Result<ObjectMember, MetaModelError> {
        self.try_members()?
            .get(id)
            .cloned()
            .ok_or_else(|| MetaModelError::MemberNotFound {
                class: self.class.clone(),
                member: id.to_owned(),
            })
    }

    /// The action with local id `id`.
    #[must_use]
    pub fn get_action(&self, id: &str) -> Option<Arc<ObjectAction>> {
        self.members().get(id).and_then(ObjectMember::as_action).cloned()
    }

    /// The property with local id `id`.
    #[must_use]
    pub fn get_property(&self, id: &str) -> Option<Arc<OneToOneAssociation>> {
        self.members().get(id).and_then(ObjectMember::as_property).cloned()
    }

    /// The collection with local id `id`.
    #[must_use]
    pub fn get_collection(&self, id: &str) -> Option<Arc<OneToManyAssociation>> {
        self.members().get(id).and_then(ObjectMember::as_collection).cloned()
    }

    /// Every method of the class and how it was claimed.
    #[must_use]
    pub fn method_partition(&self) -> &MethodPartition {
        self.members().partition()
    }
}

impl fmt::Debug for ObjectSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSpecification")
            .field("class", &self.class)
            .field("logical_type", &self.logical_type.logical_name())
            .field("bean_sort", &self.bean_sort)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ObjectSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class.as_str())
    }
}
