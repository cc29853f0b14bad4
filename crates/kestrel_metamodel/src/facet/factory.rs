//! Facet factories and the programming model.
//!
//! A [`FacetFactory`] looks at a class, a member's method or an action
//! parameter and installs facets, claiming the supporting methods it
//! consumes. The [`ProgrammingModel`] is the ordered set of factories; it
//! is an [`Api`] so plugins can contribute factories while the app builds.
//!
//! # Usage
//!
//! ```ignore
//! impl Plugin for AuditFactoriesPlugin {
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<MetaModelPlugin>()]
//!     }
//!
//!     fn build(&self, app: &mut App) {
//!         app.api_mut::<ProgrammingModel>()
//!             .expect("MetaModelPlugin must be added first")
//!             .add(AuditedFacetFactory);
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use kestrel_system::api::Api;

use super::{Facet, FacetHolder, Precedence};
use crate::class::{ClassDescriptor, MethodDescriptor, ParamDescriptor};
use crate::ident::FeatureType;
use crate::naming::capitalize;
use crate::partition::{Claim, MethodPartition, ReflectedMethod};

/// When a factory runs relative to the others.
///
/// Factories run sorted by order, then by registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessingOrder {
    /// Framework exclusions and fallback facets.
    Fallback,
    /// Naming conventions.
    Naming,
    /// Accessors and their supporting methods.
    Accessors,
    /// Declarative annotations.
    Annotations,
    /// Cleanup after everything else.
    PostProcessing,
}

/// Installs facets on one kind of feature.
///
/// Every hook has an empty default; a factory overrides the ones matching
/// its [`feature_types`](Self::feature_types).
pub trait FacetFactory: Send + Sync + 'static {
    /// Name recorded as the origin of installed facets and claims.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Feature types this factory processes.
    fn feature_types(&self) -> &'static [FeatureType];

    /// When this factory runs.
    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Annotations
    }

    /// Processes a class (`FeatureType::ObjectType`).
    fn process_class(&self, _ctx: &mut ClassContext<'_>) {}

    /// Processes a property, collection or action.
    fn process_method(&self, _ctx: &mut MethodContext<'_>) {}

    /// Processes an action parameter.
    fn process_param(&self, _ctx: &mut ParamContext<'_>) {}

    /// Returns true if `method` looks like a helper this factory would
    /// claim for some member (`hideX`, `setX`, ...). Such methods are not
    /// offered as actions in the first action pass.
    fn recognizes(&self, _method: &MethodDescriptor) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contexts
// ─────────────────────────────────────────────────────────────────────────────

/// Class-level processing context.
pub struct ClassContext<'a> {
    /// The class.
    pub class: &'a ClassDescriptor,
    /// All methods of the class and their claims.
    pub partition: &'a mut MethodPartition,
    /// The specification's facets.
    pub facets: &'a mut FacetHolder,
    builtin_signatures: &'a HashSet<(String, usize)>,
    origin: &'static str,
}

impl ClassContext<'_> {
    /// Installs a facet on the class.
    pub fn add_facet(&mut self, facet: impl Into<Facet>, precedence: Precedence) -> bool {
        self.facets.add(facet, precedence, self.origin)
    }

    /// Claims a method on behalf of the running factory.
    pub fn claim(&mut self, index: usize) -> bool {
        let factory = self.origin;
        self.partition.claim(index, Claim::ClassFacet { factory })
    }

    /// Claims a method with an explicit claim.
    pub fn claim_as(&mut self, index: usize, claim: Claim) -> bool {
        self.partition.claim(index, claim)
    }

    /// Returns true if a framework interface implemented by the class
    /// declares a method of this name and arity.
    #[must_use]
    pub fn implements_builtin(&self, method: &MethodDescriptor) -> bool {
        self.builtin_signatures
            .contains(&(method.name.clone(), method.arity()))
    }
}

/// Member-level processing context.
pub struct MethodContext<'a> {
    /// The declaring class.
    pub class: &'a ClassDescriptor,
    /// Property, collection or action.
    pub feature_type: FeatureType,
    /// The member's id.
    pub member_id: &'a str,
    /// Stem supporting method names are built from (`Total` in `hideTotal`).
    pub stem: &'a str,
    /// The accessor or action method.
    pub method: &'a ReflectedMethod,
    /// All methods of the class and their claims.
    pub partition: &'a mut MethodPartition,
    /// The member's facets.
    pub facets: &'a mut FacetHolder,
    origin: &'static str,
}

impl MethodContext<'_> {
    /// Installs a facet on the member.
    pub fn add_facet(&mut self, facet: impl Into<Facet>, precedence: Precedence) -> bool {
        self.facets.add(facet, precedence, self.origin)
    }

    /// `prefix` followed by the capitalized stem, e.g. `hideTotal`.
    #[must_use]
    pub fn support_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", capitalize(self.stem))
    }

    /// Finds an unclaimed supporting method `prefix + Stem` accepted by
    /// `accept`, and claims it for this member.
    pub fn take_supporting(
        &mut self,
        prefix: &str,
        accept: impl Fn(&MethodDescriptor) -> bool,
    ) -> Option<String> {
        let name = self.support_name(prefix);
        let index = self.partition.find_unclaimed(&name, accept)?;
        let claimed = self.partition.claim(
            index,
            Claim::Supporting {
                member: self.member_id.to_string(),
                factory: self.origin,
            },
        );
        claimed.then_some(name)
    }
}

/// Parameter-level processing context.
pub struct ParamContext<'a> {
    /// The declaring class.
    pub class: &'a ClassDescriptor,
    /// Scalar or collection parameter.
    pub feature_type: FeatureType,
    /// Id of the owning action.
    pub action_id: &'a str,
    /// Stem supporting method names are built from.
    pub stem: &'a str,
    /// The action method.
    pub action: &'a ReflectedMethod,
    /// Zero-based parameter index.
    pub index: usize,
    /// The parameter.
    pub param: &'a ParamDescriptor,
    /// All methods of the class and their claims.
    pub partition: &'a mut MethodPartition,
    /// The parameter's facets.
    pub facets: &'a mut FacetHolder,
    origin: &'static str,
}

impl ParamContext<'_> {
    /// Installs a facet on the parameter.
    pub fn add_facet(&mut self, facet: impl Into<Facet>, precedence: Precedence) -> bool {
        self.facets.add(facet, precedence, self.origin)
    }

    /// `prefix`, parameter index and capitalized stem, e.g. `default0PlaceOrder`.
    #[must_use]
    pub fn support_name(&self, prefix: &str) -> String {
        format!("{prefix}{}{}", self.index, capitalize(self.stem))
    }

    /// Finds and claims an unclaimed per-parameter supporting method.
    pub fn take_supporting(
        &mut self,
        prefix: &str,
        accept: impl Fn(&MethodDescriptor) -> bool,
    ) -> Option<String> {
        let name = self.support_name(prefix);
        let index = self.partition.find_unclaimed(&name, accept)?;
        let claimed = self.partition.claim(
            index,
            Claim::Supporting {
                member: self.action_id.to_string(),
                factory: self.origin,
            },
        );
        claimed.then_some(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProgrammingModel
// ─────────────────────────────────────────────────────────────────────────────

/// The ordered set of facet factories.
///
/// Lives as an [`Api`] while the app builds; the metamodel plugin moves it
/// into the specification loader in `ready()`.
#[derive(Default, Clone)]
pub struct ProgrammingModel {
    factories: Vec<Arc<dyn FacetFactory>>,
}

impl core::fmt::Debug for ProgrammingModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgrammingModel")
            .field("factories", &self.names())
            .finish()
    }
}

impl Api for ProgrammingModel {}

impl ProgrammingModel {
    /// Creates an empty programming model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a programming model with the standard factories.
    #[must_use]
    pub fn with_standard_factories() -> Self {
        let mut model = Self::new();
        super::standard::register_all(&mut model);
        model
    }

    /// Adds a factory after every factory of the same or an earlier order.
    pub fn add<F: FacetFactory>(&mut self, factory: F) -> &mut Self {
        self.add_arc(Arc::new(factory))
    }

    /// Adds a shared factory.
    pub fn add_arc(&mut self, factory: Arc<dyn FacetFactory>) -> &mut Self {
        let order = factory.order();
        let position = self
            .factories
            .iter()
            .position(|existing| existing.order() > order)
            .unwrap_or(self.factories.len());
        self.factories.insert(position, factory);
        self
    }

    /// Removes every factory with this name. Returns true if any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.factories.len();
        self.factories.retain(|factory| factory.name() != name);
        self.factories.len() != before
    }

    /// Factories in processing order.
    pub fn factories(&self) -> impl Iterator<Item = &Arc<dyn FacetFactory>> {
        self.factories.iter()
    }

    /// Factories processing `feature_type`, in processing order.
    pub fn factories_for(
        &self,
        feature_type: FeatureType,
    ) -> impl Iterator<Item = &Arc<dyn FacetFactory>> {
        self.factories
            .iter()
            .filter(move |factory| factory.feature_types().contains(&feature_type))
    }

    /// Factory names in processing order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|factory| factory.name()).collect()
    }

    /// Number of factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if there are no factories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns true if any factory recognizes `method` as a helper.
    #[must_use]
    pub fn recognizes(&self, method: &MethodDescriptor) -> bool {
        self.factories.iter().any(|factory| factory.recognizes(method))
    }

    /// Runs every class-level factory.
    pub fn process_class(
        &self,
        class: &ClassDescriptor,
        partition: &mut MethodPartition,
        facets: &mut FacetHolder,
        builtin_signatures: &HashSet<(String, usize)>,
    ) {
        let mut ctx = ClassContext {
            class,
            partition,
            facets,
            builtin_signatures,
            origin: "",
        };
        for factory in self.factories_for(FeatureType::ObjectType) {
            ctx.origin = factory.name();
            factory.process_class(&mut ctx);
        }
    }

    /// Runs every factory for a member's feature type.
    #[expect(clippy::too_many_arguments, reason = "Mirrors the context fields one to one")]
    pub fn process_member(
        &self,
        feature_type: FeatureType,
        class: &ClassDescriptor,
        member_id: &str,
        stem: &str,
        method: &ReflectedMethod,
        partition: &mut MethodPartition,
        facets: &mut FacetHolder,
    ) {
        let mut ctx = MethodContext {
            class,
            feature_type,
            member_id,
            stem,
            method,
            partition,
            facets,
            origin: "",
        };
        for factory in self.factories_for(feature_type) {
            ctx.origin = factory.name();
            factory.process_method(&mut ctx);
        }
    }

    /// Runs every factory for one action parameter.
    #[expect(clippy::too_many_arguments, reason = "Mirrors the context fields one to one")]
    pub fn process_param(
        &self,
        feature_type: FeatureType,
        class: &ClassDescriptor,
        action_id: &str,
        stem: &str,
        action: &ReflectedMethod,
        index: usize,
        partition: &mut MethodPartition,
        facets: &mut FacetHolder,
    ) {
        let param = &action.descriptor.params[index];
        let mut ctx = ParamContext {
            class,
            feature_type,
            action_id,
            stem,
            action,
            index,
            param,
            partition,
            facets,
            origin: "",
        };
        for factory in self.factories_for(feature_type) {
            ctx.origin = factory.name();
            factory.process_param(&mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::{DescribedFacet, NamedFacet};

    struct Named(&'static str, ProcessingOrder);
    impl FacetFactory for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn feature_types(&self) -> &'static [FeatureType] {
            &[FeatureType::ObjectType]
        }
        fn order(&self) -> ProcessingOrder {
            self.1
        }
        fn process_class(&self, ctx: &mut ClassContext<'_>) {
            ctx.add_facet(NamedFacet::new(self.0), Precedence::Default);
        }
    }

    struct Describes;
    impl FacetFactory for Describes {
        fn feature_types(&self) -> &'static [FeatureType] {
            &[FeatureType::Property]
        }
        fn process_method(&self, ctx: &mut MethodContext<'_>) {
            let description = ctx.support_name("describe");
            ctx.add_facet(DescribedFacet { description }, Precedence::Inferred);
        }
        fn recognizes(&self, method: &MethodDescriptor) -> bool {
            method.name.starts_with("describe")
        }
    }

    #[test]
    fn factories_sort_by_order_then_registration() {
        let mut model = ProgrammingModel::new();
        model
            .add(Named("late", ProcessingOrder::PostProcessing))
            .add(Named("first", ProcessingOrder::Naming))
            .add(Named("second", ProcessingOrder::Naming))
            .add(Named("fallback", ProcessingOrder::Fallback));

        assert_eq!(model.names(), vec!["fallback", "first", "second", "late"]);
    }

    #[test]
    fn later_factories_win_equal_precedence() {
        let mut model = ProgrammingModel::new();
        model
            .add(Named("a", ProcessingOrder::Annotations))
            .add(Named("b", ProcessingOrder::Annotations));

        let class = ClassDescriptor::class("com.acme.Order");
        let mut partition = MethodPartition::new(Vec::new());
        let mut facets = FacetHolder::new();
        model.process_class(&class, &mut partition, &mut facets, &HashSet::new());

        assert_eq!(facets.lookup::<NamedFacet>().unwrap().name, "b");
        assert_eq!(facets.get(crate::facet::FacetKind::Named).unwrap().origin, "b");
    }

    #[test]
    fn factories_filter_by_feature_type() {
        let mut model = ProgrammingModel::new();
        model.add(Named("class", ProcessingOrder::Naming)).add(Describes);

        assert_eq!(model.factories_for(FeatureType::ObjectType).count(), 1);
        assert_eq!(model.factories_for(FeatureType::Property).count(), 1);
        assert_eq!(model.factories_for(FeatureType::Action).count(), 0);
        assert!(model.recognizes(&MethodDescriptor::new("describeTotal")));
        assert!(!model.recognizes(&MethodDescriptor::new("submit")));
    }

    #[test]
    fn member_context_builds_support_names() {
        let mut model = ProgrammingModel::new();
        model.add(Describes);

        let class = ClassDescriptor::class("com.acme.Order");
        let method = ReflectedMethod {
            index: 0,
            declaring: class.name.clone(),
            descriptor: MethodDescriptor::new("getTotal"),
        };
        let mut partition = MethodPartition::new(vec![method.clone()]);
        let mut facets = FacetHolder::new();
        model.process_member(
            FeatureType::Property,
            &class,
            "total",
            "total",
            &method,
            &mut partition,
            &mut facets,
        );

        assert_eq!(
            facets.lookup::<DescribedFacet>().unwrap().description,
            "describeTotal"
        );
    }

    #[test]
    fn remove_by_name() {
        let mut model = ProgrammingModel::new();
        model.add(Named("x", ProcessingOrder::Naming));
        assert!(model.remove("x"));
        assert!(!model.remove("x"));
        assert!(model.is_empty());
    }
}
