//! The two introspection phases.
//!
//! The type phase resolves supertypes, registers the class in their
//! subclass sets and runs the class-level facet factories. The member phase
//! discovers collections, properties and actions from whatever the class
//! phase left unclaimed, then adds mixin contributions and orders the
//! result. Referenced types are only ever resolved to the type level, so a
//! member phase never waits on another member phase.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::class::{ClassDescriptor, ClassKind, CollectionKind, MethodDescriptor, TypeRef, builtin};
use crate::facet::{FacetHolder, LayoutOrderFacet};
use crate::ident::{ClassName, FeatureType, Identifier};
use crate::loader::Registry;
use crate::member::{
    ActionParameter, Member, MemberCore, MemberTable, ObjectAction, ObjectMember,
    OneToManyAssociation, OneToOneAssociation,
};
use crate::naming;
use crate::order;
use crate::partition::{Claim, ClaimPhase, MethodPartition, ReflectedMethod};
use crate::spec::{IntrospectionPolicy, IntrospectionState, ObjectSpecification};
use crate::trigger::{IntrospectionTrigger, TriggerCause};

const VOID: &str = "void";

/// Mixed-in members are declared after every method of the host.
const MIXIN_DECLARATION_BASE: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionPass {
    SkipRecognizedHelpers,
    DontSkip,
}

/// Runs introspection phases against a registry.
pub(crate) struct Introspector<'a> {
    registry: &'a Arc<Registry>,
}

impl<'a> Introspector<'a> {
    pub(crate) fn new(registry: &'a Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Hierarchy links and class-level facets.
    pub(crate) fn introspect_type(&self, spec: &ObjectSpecification) {
        let class = spec.class();
        let supertypes = spec
            .superclass_name()
            .map(|name| (name, TriggerCause::Superclass))
            .into_iter()
            .chain(
                spec.interface_names()
                    .iter()
                    .map(|name| (name, TriggerCause::Interface)),
            );

        for (name, cause) in supertypes {
            let trigger = IntrospectionTrigger::from_class(cause, class);
            let Some(parent) =
                self.registry
                    .resolve(name, IntrospectionState::TypeIntrospected, trigger)
            else {
                debug!(%class, supertype = %name, "supertype cannot be loaded");
                continue;
            };
            if parent.state() == IntrospectionState::TypeIntrospecting {
                warn!(%class, supertype = %name, "cyclic type hierarchy");
                self.registry.record_cycle(class);
                continue;
            }
            self.registry.register_subclass(parent.class(), class);
        }

        let Some(descriptor) = spec.descriptor() else {
            return;
        };
        let mut partition = MethodPartition::for_class(self.registry.repository().as_ref(), descriptor);
        let builtin_signatures = self.builtin_signatures(descriptor);
        spec.with_facets_mut(|facets| {
            self.registry
                .model()
                .process_class(descriptor, &mut partition, facets, &builtin_signatures);
        });
        spec.stash_partition(partition);
        debug!(%class, sort = ?spec.bean_sort(), "type introspected");
    }

    /// Name and arity of every method declared by a framework interface
    /// the class implements, directly or through a supertype.
    fn builtin_signatures(&self, descriptor: &ClassDescriptor) -> HashSet<(String, usize)> {
        let repository = self.registry.repository();
        let mut signatures = HashSet::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<ClassName> = descriptor
            .superclass
            .iter()
            .chain(&descriptor.interfaces)
            .cloned()
            .collect();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let Some(parent) = repository.descriptor(&name) else {
                continue;
            };
            if parent.kind == ClassKind::Interface && builtin::is_builtin(&parent.name) {
                signatures.extend(
                    parent
                        .methods
                        .iter()
                        .map(|method| (method.name.clone(), method.arity())),
                );
            }
            queue.extend(parent.superclass.iter().chain(&parent.interfaces).cloned());
        }
        signatures
    }

    /// Members, mixin contributions and ordering. Publishes the member
    /// table on `spec`.
    pub(crate) fn introspect_members(&self, spec: &ObjectSpecification) {
        let partition = spec
            .take_partition()
            .unwrap_or_else(|| MethodPartition::new(Vec::new()));
        let descriptor = match spec.descriptor() {
            Some(descriptor) if !spec.bean_sort().is_memberless() => Arc::clone(descriptor),
            _ => {
                spec.publish_members(MemberTable::empty(partition));
                return;
            }
        };

        let mut phase = MemberPhase {
            registry: self.registry,
            spec,
            descriptor: &descriptor,
            partition,
            associations: Vec::new(),
            actions: Vec::new(),
            ids: HashSet::new(),
            ambiguities: Vec::new(),
            orphans: Vec::new(),
            missing_mixin_main: None,
        };
        if spec.is_mixin() {
            phase.mixin_main_method();
        } else {
            phase.collections();
            phase.properties();
            phase.actions();
            phase.mixin_contributions();
        }
        phase.leftovers();
        let table = phase.finish();

        let methods: Vec<_> = table
            .iter()
            .filter_map(|member| {
                member
                    .method_key()
                    .map(|key| (key.clone(), member.id().to_owned()))
            })
            .collect();
        self.registry.register_member_methods(spec.class(), methods);

        debug!(
            class = %spec.class(),
            properties = table.properties().len(),
            collections = table.collections().len(),
            actions = table.actions().len(),
            "members introspected"
        );
        spec.publish_members(table);
    }
}

/// Working state of one member phase.
struct MemberPhase<'a> {
    registry: &'a Arc<Registry>,
    spec: &'a ObjectSpecification,
    descriptor: &'a ClassDescriptor,
    partition: MethodPartition,
    associations: Vec<ObjectMember>,
    actions: Vec<Arc<ObjectAction>>,
    ids: HashSet<String>,
    ambiguities: Vec<String>,
    orphans: Vec<String>,
    missing_mixin_main: Option<String>,
}

impl MemberPhase<'_> {
    fn resolves(&self, ty: &TypeRef) -> bool {
        let trigger = IntrospectionTrigger::from_class(TriggerCause::MemberType, self.spec.class());
        self.registry
            .resolve_type(ty, IntrospectionState::TypeIntrospected, trigger)
            .is_some_and(|spec| !spec.is_vetoed())
    }

    fn admits(&self, method: &MethodDescriptor, explicitly_annotated: bool) -> bool {
        self.spec
            .introspection_policy()
            .admits(method.is_public, explicitly_annotated)
    }

    fn reject(&mut self, method: &ReflectedMethod, reason: String) {
        debug!(class = %self.spec.class(), method = method.name(), %reason, "member dropped");
        self.partition.claim(method.index, Claim::Rejected { reason });
    }

    /// Reserves `id`. A second member with the same id is dropped and
    /// reported as ambiguous.
    fn reserve(&mut self, method: Option<&ReflectedMethod>, id: &str) -> bool {
        if self.ids.insert(id.to_owned()) {
            return true;
        }
        debug!(class = %self.spec.class(), member = id, "ambiguous member id");
        if !self.ambiguities.iter().any(|existing| existing == id) {
            self.ambiguities.push(id.to_owned());
        }
        if let Some(method) = method {
            self.partition.claim(
                method.index,
                Claim::Ignored {
                    reason: "duplicate member id",
                },
            );
        }
        false
    }

    fn unclaimed(&self) -> Vec<ReflectedMethod> {
        self.partition.unclaimed().cloned().collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Discovery
    // ─────────────────────────────────────────────────────────────────────

    fn collections(&mut self) {
        self.partition.set_phase(ClaimPhase::Collections);
        for method in self.unclaimed() {
            let descriptor = &method.descriptor;
            if descriptor.is_static || descriptor.arity() != 0 || !descriptor.return_type.is_collection() {
                continue;
            }
            let annotations = &descriptor.annotations;
            let explicit = annotations.is_collection() || annotations.is_property();
            let Some(id) = naming::accessor_member_id(&descriptor.name, false)
                .or_else(|| explicit.then(|| descriptor.name.clone()))
            else {
                continue;
            };
            if !self.admits(descriptor, explicit) {
                continue;
            }
            if let Some(member) = self.collection(&method, &id, &id) {
                self.associations.push(member);
            }
        }
    }

    fn properties(&mut self) {
        self.partition.set_phase(ClaimPhase::Properties);
        for method in self.unclaimed() {
            let descriptor = &method.descriptor;
            let return_type = &descriptor.return_type;
            if descriptor.is_static
                || descriptor.arity() != 0
                || return_type.is_void()
                || return_type.is_collection()
            {
                continue;
            }
            let explicit = descriptor.annotations.is_property();
            let Some(id) = naming::accessor_member_id(&descriptor.name, return_type.is_boolean())
                .or_else(|| explicit.then(|| descriptor.name.clone()))
            else {
                continue;
            };
            if !self.admits(descriptor, explicit) {
                continue;
            }
            if let Some(member) = self.property(&method, &id, &id) {
                self.associations.push(member);
            }
        }
    }

    fn actions(&mut self) {
        self.partition.set_phase(ClaimPhase::Actions);
        let registry = self.registry;
        let model = registry.model();
        for pass in [ActionPass::SkipRecognizedHelpers, ActionPass::DontSkip] {
            for method in self.unclaimed() {
                let descriptor = &method.descriptor;
                if descriptor.is_static {
                    continue;
                }
                // `setX` is never an action, whatever its arity.
                if naming::strip_prefix(&descriptor.name, "set").is_some() {
                    self.partition.claim(
                        method.index,
                        Claim::Ignored {
                            reason: "setter without property",
                        },
                    );
                    continue;
                }
                let explicit = descriptor.annotations.is_action();
                match pass {
                    ActionPass::SkipRecognizedHelpers => {
                        if model.recognizes(descriptor) {
                            continue;
                        }
                    }
                    ActionPass::DontSkip => {
                        if !explicit {
                            continue;
                        }
                    }
                }
                if !self.admits(descriptor, explicit) {
                    continue;
                }
                if let Some(ObjectMember::Action(action)) =
                    self.action(&method, &descriptor.name, &descriptor.name)
                {
                    self.actions.push(action);
                }
            }
        }
    }

    /// A mixin's single member: its main method, exposed under the mixin
    /// id.
    fn mixin_main_method(&mut self) {
        self.partition.set_phase(ClaimPhase::Mixins);
        let class_descriptor = self.descriptor;
        let Some((_, main)) = class_descriptor.mixin() else {
            return;
        };
        let Some(index) = self.partition.find_unclaimed(main, |method| !method.is_static) else {
            warn!(class = %self.spec.class(), method = main, "mixin main method missing");
            self.missing_mixin_main = Some(main.to_owned());
            return;
        };
        let method = self.partition.method(index).clone();
        let id = mixin_id(class_descriptor);
        let descriptor = &method.descriptor;
        let annotations = &descriptor.annotations;
        let no_arg = descriptor.arity() == 0;

        let member = if no_arg
            && (annotations.is_collection()
                || (annotations.is_property() && descriptor.return_type.is_collection()))
        {
            self.collection(&method, &id, main)
        } else if no_arg && annotations.is_property() && !descriptor.return_type.is_void() {
            self.property(&method, &id, main)
        } else {
            self.action(&method, &id, main)
        };
        match member {
            Some(ObjectMember::Action(action)) => self.actions.push(action),
            Some(association) => self.associations.push(association),
            None => {}
        }
    }

    /// Members contributed by every mixin whose mixee this type is of.
    fn mixin_contributions(&mut self) {
        let registry = self.registry;
        let host = self.spec;
        let mut declaration_index = MIXIN_DECLARATION_BASE;
        for mixin_class in registry.mixin_classes().iter() {
            if mixin_class == host.class() {
                continue;
            }
            let Some(mixin_descriptor) = registry.repository().descriptor(mixin_class) else {
                continue;
            };
            let Some((mixee, main)) = mixin_descriptor.mixin() else {
                continue;
            };
            let trigger = IntrospectionTrigger::from_class(TriggerCause::Mixin, host.class());
            let Some(mixee) =
                registry.resolve(mixee, IntrospectionState::TypeIntrospected, trigger.clone())
            else {
                continue;
            };
            if !host.is_of_type(&mixee) {
                continue;
            }
            let Some(mixin) =
                registry.resolve(mixin_class, IntrospectionState::FullyIntrospected, trigger)
            else {
                continue;
            };
            let Ok(table) = mixin.try_members() else {
                debug!(host = %host.class(), mixin = %mixin_class, "mixin not yet introspected");
                continue;
            };
            for member in table.iter() {
                if !self.reserve(None, member.id()) {
                    continue;
                }
                match member.mixed_into(host.logical_type(), mixin_class, main, declaration_index) {
                    ObjectMember::Action(action) => self.actions.push(action),
                    association => self.associations.push(association),
                }
                declaration_index += 1;
            }
        }
    }

    /// Recognized helpers nobody claimed are orphans; anything else left
    /// over was not admitted.
    fn leftovers(&mut self) {
        let registry = self.registry;
        let model = registry.model();
        let report_orphans = self.spec.introspection_policy() == IntrospectionPolicy::AnnotationOptional;
        for method in self.unclaimed() {
            if report_orphans && !method.descriptor.is_static && model.recognizes(&method.descriptor) {
                self.orphans.push(method.name().to_owned());
                continue;
            }
            self.partition.claim(
                method.index,
                Claim::Ignored {
                    reason: "not admitted",
                },
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Member construction
    // ─────────────────────────────────────────────────────────────────────

    fn collection(&mut self, method: &ReflectedMethod, id: &str, stem: &str) -> Option<ObjectMember> {
        let return_type = &method.descriptor.return_type;
        let element = return_type.element_type()?;
        if !self.resolves(element) {
            self.reject(method, format!("element type {element} cannot be loaded"));
            return None;
        }
        if !self.reserve(Some(method), id) {
            return None;
        }
        self.partition.claim(method.index, Claim::Collection { member: id.to_owned() });

        let mut facets = FacetHolder::new();
        self.registry.model().process_member(
            FeatureType::Collection,
            self.descriptor,
            id,
            stem,
            method,
            &mut self.partition,
            &mut facets,
        );
        let identifier = Identifier::property_or_collection(self.spec.logical_type().clone(), id);
        Some(ObjectMember::Collection(Arc::new(OneToManyAssociation {
            core: MemberCore::new(
                identifier,
                FeatureType::Collection,
                element.class_name().unwrap_or_else(|| ClassName::new(VOID)),
                facets,
                Some(method.key()),
                method.index,
            ),
            collection_kind: return_type.collection_kind().unwrap_or(CollectionKind::List),
        })))
    }

    fn property(&mut self, method: &ReflectedMethod, id: &str, stem: &str) -> Option<ObjectMember> {
        let return_type = &method.descriptor.return_type;
        if !self.resolves(return_type) {
            self.reject(method, format!("type {return_type} cannot be loaded"));
            return None;
        }
        if !self.reserve(Some(method), id) {
            return None;
        }
        self.partition.claim(method.index, Claim::Property { member: id.to_owned() });

        let mut facets = FacetHolder::new();
        self.registry.model().process_member(
            FeatureType::Property,
            self.descriptor,
            id,
            stem,
            method,
            &mut self.partition,
            &mut facets,
        );
        let identifier = Identifier::property_or_collection(self.spec.logical_type().clone(), id);
        Some(ObjectMember::Property(Arc::new(OneToOneAssociation {
            core: MemberCore::new(
                identifier,
                FeatureType::Property,
                return_type.class_name().unwrap_or_else(|| ClassName::new(VOID)),
                facets,
                Some(method.key()),
                method.index,
            ),
        })))
    }

    fn action(&mut self, method: &ReflectedMethod, id: &str, stem: &str) -> Option<ObjectMember> {
        let descriptor = &method.descriptor;
        if let Some(param) = descriptor.params.iter().find(|param| !self.resolves(&param.ty)) {
            let reason = format!("parameter {} of type {} cannot be loaded", param.name, param.ty);
            self.reject(method, reason);
            return None;
        }
        let return_type = &descriptor.return_type;
        if !return_type.is_void() && !self.resolves(return_type) {
            self.reject(method, format!("return type {return_type} cannot be loaded"));
            return None;
        }
        if !self.reserve(Some(method), id) {
            return None;
        }
        self.partition.claim(method.index, Claim::Action { member: id.to_owned() });

        let model = self.registry.model();
        let mut facets = FacetHolder::new();
        model.process_member(
            FeatureType::Action,
            self.descriptor,
            id,
            stem,
            method,
            &mut self.partition,
            &mut facets,
        );

        let mut parameters = Vec::with_capacity(descriptor.arity());
        for (index, param) in descriptor.params.iter().enumerate() {
            let feature_type = if param.ty.is_collection() {
                FeatureType::ActionParameterCollection
            } else {
                FeatureType::ActionParameterScalar
            };
            let mut param_facets = FacetHolder::new();
            model.process_param(
                feature_type,
                self.descriptor,
                id,
                stem,
                method,
                index,
                &mut self.partition,
                &mut param_facets,
            );
            parameters.push(ActionParameter {
                index,
                name: param.name.clone(),
                feature_type,
                element_type: param.ty.class_name().unwrap_or_else(|| ClassName::new(VOID)),
                facets: param_facets,
            });
        }

        let identifier = Identifier::action(
            self.spec.logical_type().clone(),
            id,
            descriptor
                .params
                .iter()
                .map(|param| ClassName::new(param.ty.to_string()))
                .collect(),
        );
        let return_class = return_type.class_name();
        Some(ObjectMember::Action(Arc::new(ObjectAction {
            core: MemberCore::new(
                identifier,
                FeatureType::Action,
                return_class.clone().unwrap_or_else(|| ClassName::new(VOID)),
                facets,
                Some(method.key()),
                method.index,
            ),
            parameters,
            return_type: return_class,
            returns_collection: return_type.is_collection(),
        })))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ordering
    // ─────────────────────────────────────────────────────────────────────

    fn finish(mut self) -> MemberTable {
        let layout = self.spec.facet::<LayoutOrderFacet>().unwrap_or_default();
        order::sort_members(&mut self.associations, &layout.associations);
        order::sort_members(&mut self.actions, &layout.actions);

        let mut unknown = order::unknown_ids(&self.associations, &layout.associations);
        unknown.extend(order::unknown_ids(&self.actions, &layout.actions));

        let mut table = MemberTable::new(self.associations, self.actions, self.partition);
        table.ambiguities = self.ambiguities;
        table.orphans = self.orphans;
        table.unknown_in_order = unknown;
        table.missing_mixin_main = self.missing_mixin_main;
        table
    }
}

/// The member id a mixin contributes under: its `Named` value with spaces
/// removed, else the suffix of its simple name.
fn mixin_id(descriptor: &ClassDescriptor) -> String {
    descriptor.annotations.named().map_or_else(
        || naming::mixin_member_id(descriptor.name.simple_name()),
        |named| naming::decapitalize(&named.split_whitespace().collect::<String>()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Annotation;

    #[test]
    fn mixin_ids() {
        let plain = ClassDescriptor::class("com.acme.Order_addLine");
        assert_eq!(mixin_id(&plain), "addLine");

        let named = ClassDescriptor::class("com.acme.Order_x").annotate(Annotation::Named("Line Count".into()));
        assert_eq!(mixin_id(&named), "lineCount");
    }
}
