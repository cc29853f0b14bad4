//! The application feature repository.
//!
//! A secondary index over the completed specification graph: every
//! namespace, every type with at least one visible member, and those
//! members. The index is built on first access from a snapshot of the
//! loader and cached until [`invalidate`](ApplicationFeatureRepository::invalidate)
//! is called.
//!
//! Building runs behind a lock with a double-checked fast path, so racing
//! first readers build it once and the rest wait for that build.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use kestrel_metamodel::loader::SpecificationLoader;
use kestrel_metamodel::member::Member;
use kestrel_metamodel::spec::{BeanSort, ObjectSpecification};
use kestrel_system::service::Service;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::FeatureError;
use crate::feature::{ApplicationFeature, ApplicationMemberSort};
use crate::id::{ApplicationFeatureId, ApplicationFeatureSort};

/// Bean sorts whose specifications contribute type features.
const CANDIDATE_SORTS: &[BeanSort] = &[
    BeanSort::Entity,
    BeanSort::ViewModel,
    BeanSort::Service,
    BeanSort::Abstract,
];

// ─────────────────────────────────────────────────────────────────────────────
// FeatureIndex
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FeatureIndex {
    namespaces: BTreeMap<ApplicationFeatureId, Arc<ApplicationFeature>>,
    types: BTreeMap<ApplicationFeatureId, Arc<ApplicationFeature>>,
    members: BTreeMap<ApplicationFeatureId, Arc<ApplicationFeature>>,
}

#[derive(Default)]
struct IndexBuilder {
    namespaces: BTreeMap<ApplicationFeatureId, ApplicationFeature>,
    types: BTreeMap<ApplicationFeatureId, ApplicationFeature>,
    members: BTreeMap<ApplicationFeatureId, ApplicationFeature>,
}

impl IndexBuilder {
    fn add_specification(&mut self, spec: &ObjectSpecification) {
        let type_id = match ApplicationFeatureId::new_type(spec.logical_type_name()) {
            Ok(type_id) => type_id,
            Err(error) => {
                warn!(class = %spec.class(), %error, "type cannot be named as a feature");
                return;
            }
        };
        let Some(namespace_id) = type_id.get_parent_namespace_id() else {
            return;
        };
        self.add_namespace(&namespace_id);

        // Added speculatively; removed again below if nothing is visible.
        let mut type_feature = ApplicationFeature::new(type_id.clone());
        let mut members = Vec::new();
        for member in spec.members().iter() {
            if member.is_always_hidden() {
                continue;
            }
            let Some(sort) = ApplicationMemberSort::of(member.feature_type()) else {
                continue;
            };
            let member_id = match ApplicationFeatureId::new_member(spec.logical_type_name(), member.id()) {
                Ok(member_id) => member_id,
                Err(error) => {
                    warn!(type_id = %type_id, %error, "member cannot be named as a feature");
                    continue;
                }
            };
            let (element_type, returns_collection) = match member.as_action() {
                Some(action) => (action.return_type(), action.returns_collection()),
                None => (Some(member.element_type()), false),
            };
            type_feature.add_member(sort, member_id.clone());
            members.push(ApplicationFeature::member(
                member_id,
                sort,
                element_type,
                returns_collection,
                member.is_mixed_in(),
            ));
        }

        if type_feature.has_members() {
            for member in members {
                self.members.insert(member.id().clone(), member);
            }
            self.types.insert(type_id.clone(), type_feature);
            if let Some(namespace) = self.namespaces.get_mut(&namespace_id) {
                namespace.add_content(type_id);
            }
        } else {
            debug!(type_id = %type_id, "type has no visible members");
            self.prune_namespace(&namespace_id);
        }
    }

    /// Adds a namespace and its ancestors, linking each into its parent.
    fn add_namespace(&mut self, id: &ApplicationFeatureId) {
        if self.namespaces.contains_key(id) {
            return;
        }
        self.namespaces
            .insert(id.clone(), ApplicationFeature::new(id.clone()));
        if let Some(parent) = id.get_parent_namespace_id() {
            self.add_namespace(&parent);
            if let Some(parent) = self.namespaces.get_mut(&parent) {
                parent.add_content(id.clone());
            }
        }
    }

    /// Removes a namespace left without contents, then its parent if that
    /// became empty too.
    fn prune_namespace(&mut self, id: &ApplicationFeatureId) {
        let is_empty = self
            .namespaces
            .get(id)
            .is_some_and(|namespace| namespace.contents().is_empty());
        if !is_empty {
            return;
        }
        self.namespaces.remove(id);
        if let Some(parent_id) = id.get_parent_namespace_id() {
            if let Some(parent) = self.namespaces.get_mut(&parent_id) {
                parent.remove_content(id);
            }
            self.prune_namespace(&parent_id);
        }
    }

    fn finish(self) -> FeatureIndex {
        fn share(
            features: BTreeMap<ApplicationFeatureId, ApplicationFeature>,
        ) -> BTreeMap<ApplicationFeatureId, Arc<ApplicationFeature>> {
            features
                .into_iter()
                .map(|(id, feature)| (id, Arc::new(feature)))
                .collect()
        }
        FeatureIndex {
            namespaces: share(self.namespaces),
            types: share(self.types),
            members: share(self.members),
        }
    }
}

impl FeatureIndex {
    fn build(snapshot: &[Arc<ObjectSpecification>]) -> Self {
        let mut builder = IndexBuilder::default();
        for spec in snapshot {
            if CANDIDATE_SORTS.contains(&spec.bean_sort()) {
                builder.add_specification(spec);
            }
        }
        builder.finish()
    }

    fn find(&self, id: &ApplicationFeatureId) -> Option<&Arc<ApplicationFeature>> {
        match id.sort() {
            ApplicationFeatureSort::Namespace => self.namespaces.get(id),
            ApplicationFeatureSort::Type => self.types.get(id),
            ApplicationFeatureSort::Member => self.members.get(id),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ApplicationFeatureRepository
// ─────────────────────────────────────────────────────────────────────────────

/// Lazily built index of application features.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use kestrel_features::id::ApplicationFeatureId;
/// use kestrel_features::repository::ApplicationFeatureRepository;
/// use kestrel_metamodel::prelude::*;
///
/// let repository = InMemoryClassRepository::with_builtins().with(
///     ClassDescriptor::class("com.acme.Order")
///         .annotate(Annotation::entity())
///         .method(MethodDescriptor::new("submit")),
/// );
/// let loader = Arc::new(SpecificationLoader::with_defaults(Arc::new(repository)));
/// let features = ApplicationFeatureRepository::new(loader);
///
/// let submit = ApplicationFeatureId::new_member("com.acme.Order", "submit").unwrap();
/// assert!(features.find_feature(&submit).is_some());
/// ```
pub struct ApplicationFeatureRepository {
    loader: Arc<SpecificationLoader>,
    index: RwLock<Option<Arc<FeatureIndex>>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl Service for ApplicationFeatureRepository {}

impl core::fmt::Debug for ApplicationFeatureRepository {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApplicationFeatureRepository")
            .field("built", &self.index.read().is_some())
            .field("builds", &self.build_count())
            .finish_non_exhaustive()
    }
}

impl ApplicationFeatureRepository {
    /// Creates an unbuilt repository over `loader`.
    #[must_use]
    pub fn new(loader: Arc<SpecificationLoader>) -> Self {
        Self {
            loader,
            index: RwLock::new(None),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
        }
    }

    fn index(&self) -> Arc<FeatureIndex> {
        if let Some(index) = self.index.read().as_ref() {
            return Arc::clone(index);
        }
        let _build = self.build_lock.lock();
        if let Some(index) = self.index.read().as_ref() {
            return Arc::clone(index);
        }

        let started = Instant::now();
        let index = Arc::new(FeatureIndex::build(&self.loader.introspect_all()));
        self.builds.fetch_add(1, Ordering::Relaxed);
        info!(
            namespaces = index.namespaces.len(),
            types = index.types.len(),
            members = index.members.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "application features built"
        );
        *self.index.write() = Some(Arc::clone(&index));
        index
    }

    /// Builds the index now if it is not built yet.
    pub fn initialize(&self) {
        let _ = self.index();
    }

    /// Drops the index; the next query rebuilds it.
    pub fn invalidate(&self) {
        if self.index.write().take().is_some() {
            debug!("application features invalidated");
        }
    }

    /// Returns true once the index is built and until it is invalidated.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.index.read().is_some()
    }

    /// How many times the index has been built.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// The feature with this id, if any.
    #[must_use]
    pub fn find_feature(&self, id: &ApplicationFeatureId) -> Option<Arc<ApplicationFeature>> {
        self.index().find(id).cloned()
    }

    /// The feature with this id, or [`FeatureError::NotFound`].
    pub fn find_feature_else_fail(
        &self,
        id: &ApplicationFeatureId,
    ) -> Result<Arc<ApplicationFeature>, FeatureError> {
        self.find_feature(id)
            .ok_or_else(|| FeatureError::NotFound(id.clone()))
    }

    /// The feature whose id has this encoded wire form.
    pub fn find_feature_by_encoded_id(
        &self,
        encoded: &str,
    ) -> Result<Arc<ApplicationFeature>, FeatureError> {
        let id = ApplicationFeatureId::parse_encoded(encoded)?;
        self.find_feature_else_fail(&id)
    }

    /// Every namespace, sorted by name.
    #[must_use]
    pub fn namespaces(&self) -> Vec<Arc<ApplicationFeature>> {
        self.index().namespaces.values().cloned().collect()
    }

    /// Every type, sorted by namespace then simple name.
    #[must_use]
    pub fn types(&self) -> Vec<Arc<ApplicationFeature>> {
        self.index().types.values().cloned().collect()
    }

    /// Every member, sorted by type then member name.
    #[must_use]
    pub fn members(&self) -> Vec<Arc<ApplicationFeature>> {
        self.index().members.values().cloned().collect()
    }

    /// The types directly inside `namespace`.
    #[must_use]
    pub fn types_in_namespace(&self, namespace: &str) -> Vec<Arc<ApplicationFeature>> {
        let Ok(id) = ApplicationFeatureId::new_namespace(namespace) else {
            return Vec::new();
        };
        let index = self.index();
        index
            .namespaces
            .get(&id)
            .map(|namespace| {
                namespace
                    .contents()
                    .iter()
                    .filter(|id| id.sort() == ApplicationFeatureSort::Type)
                    .filter_map(|id| index.types.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The members of the type with this logical type name that have
    /// `sort`, in declaration order.
    #[must_use]
    pub fn members_of(
        &self,
        logical_type_name: &str,
        sort: ApplicationMemberSort,
    ) -> Vec<Arc<ApplicationFeature>> {
        let Ok(id) = ApplicationFeatureId::new_type(logical_type_name) else {
            return Vec::new();
        };
        let index = self.index();
        index
            .types
            .get(&id)
            .map(|feature| {
                feature
                    .members_of_sort(sort)
                    .iter()
                    .filter_map(|id| index.members.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_metamodel::class::{Annotation, ClassDescriptor, InMemoryClassRepository, MethodDescriptor};

    fn features(repository: InMemoryClassRepository) -> ApplicationFeatureRepository {
        let loader = SpecificationLoader::with_defaults(Arc::new(repository));
        ApplicationFeatureRepository::new(Arc::new(loader))
    }

    #[test]
    fn nothing_is_built_until_queried() {
        let features = features(InMemoryClassRepository::with_builtins());
        assert!(!features.is_initialized());
        assert_eq!(features.build_count(), 0);

        assert!(features.namespaces().is_empty());
        assert!(features.is_initialized());
        assert_eq!(features.build_count(), 1);
    }

    #[test]
    fn memberless_types_leave_no_namespace_behind() {
        let features = features(
            InMemoryClassRepository::with_builtins()
                .with(ClassDescriptor::class("acme.empty.Marker").annotate(Annotation::entity()))
                .with(
                    ClassDescriptor::class("acme.Order")
                        .annotate(Annotation::entity())
                        .method(MethodDescriptor::new("submit")),
                ),
        );

        let namespaces: Vec<String> = features
            .namespaces()
            .iter()
            .map(|feature| feature.id().namespace().to_owned())
            .collect();
        assert_eq!(namespaces, vec!["acme"]);
        assert!(
            features
                .find_feature(&ApplicationFeatureId::new_type("acme.empty.Marker").unwrap())
                .is_none()
        );
        let acme = features
            .find_feature(&ApplicationFeatureId::new_namespace("acme").unwrap())
            .unwrap();
        assert_eq!(
            acme.contents().iter().collect::<Vec<_>>(),
            vec![&ApplicationFeatureId::new_type("acme.Order").unwrap()]
        );
    }

    #[test]
    fn invalidation_forces_a_rebuild() {
        let features = features(InMemoryClassRepository::with_builtins());
        features.initialize();
        features.initialize();
        assert_eq!(features.build_count(), 1);

        features.invalidate();
        assert!(!features.is_initialized());
        features.initialize();
        assert_eq!(features.build_count(), 2);
    }
}
