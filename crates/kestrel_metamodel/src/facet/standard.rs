//! The standard facet factories.
//!
//! Together they implement the default programming model: lifecycle
//! callbacks, title methods, legacy order hints, getter/setter accessors,
//! `addToX`/`removeFromX`, the `hideX`/`disableX`/`validateX`/`defaultX`/
//! `choicesX`/`autoCompleteX` supporting methods, and the declarative
//! annotations.

use super::{
    ActionInvocationFacet, ClassContext, CollectionAccessorFacet, CollectionModifyFacet,
    CollectionOp, CssClassFacet, DescribedFacet, DisabledFacet, DomainServiceFacet, EntityFacet,
    FacetFactory, HiddenFacet, IconFacet, IntrospectionFacet, LayoutOrderFacet, LifecycleEvent,
    LifecycleFacet, MandatoryFacet, MemberOrderFacet, MethodContext, MixinFacet, NamedFacet,
    ParamContext, PluralFacet, Precedence, ProcessingOrder, ProgrammaticFacet,
    ProgrammingModel, PropertyAccessorFacet, PropertyClearFacet, PropertySetterFacet,
    SupportKind, SupportingMethodFacet, TitleFacet, TitleSource, TypeOfFacet, ValueFacet,
    ViewModelFacet,
};
use crate::class::{Annotations, ClassKind, MethodDescriptor, Nature, TypeRef, builtin};
use crate::ident::FeatureType;
use crate::naming::{accessor_member_id, decapitalize, strip_prefix};
use crate::partition::Claim;
use crate::value::ValueType;

const MEMBERS_AND_PARAMS: &[FeatureType] = &[
    FeatureType::Property,
    FeatureType::Collection,
    FeatureType::Action,
    FeatureType::ActionParameterScalar,
    FeatureType::ActionParameterCollection,
];

const SCALARS: &[FeatureType] = &[
    FeatureType::Property,
    FeatureType::ActionParameterScalar,
];

/// Registers every standard factory.
pub fn register_all(model: &mut ProgrammingModel) {
    model
        .add(IgnoredMethodsFacetFactory)
        .add(MandatoryFallbackFacetFactory)
        .add(LifecycleFacetFactory)
        .add(TitleFacetFactory)
        .add(PropertyAccessorFacetFactory)
        .add(CollectionAccessorFacetFactory)
        .add(ActionInvocationFacetFactory)
        .add(SupportingMethodsFacetFactory)
        .add(DomainObjectFacetFactory)
        .add(LayoutOrderFacetFactory)
        .add(MemberAnnotationFacetFactory)
        .add(StaticMethodsFacetFactory);
}

fn no_arg(method: &MethodDescriptor) -> bool {
    method.arity() == 0 && !method.is_static
}

fn no_arg_returning_string(method: &MethodDescriptor) -> bool {
    no_arg(method) && method.return_type.is_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Class-level factories
// ─────────────────────────────────────────────────────────────────────────────

/// Claims methods that are never part of the metamodel: those declared by
/// framework types, implementations of framework interfaces, and
/// `Programmatic` methods.
pub struct IgnoredMethodsFacetFactory;

impl FacetFactory for IgnoredMethodsFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::ObjectType]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Fallback
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) {
        for index in ctx.partition.unclaimed_indices() {
            let method = ctx.partition.method(index);
            let reason = if builtin::is_builtin(&method.declaring) {
                "declared by a framework type"
            } else if ctx.implements_builtin(&method.descriptor) {
                "implements a framework interface"
            } else if method.descriptor.annotations.is_programmatic() {
                "programmatic"
            } else {
                continue;
            };
            ctx.claim_as(index, Claim::Ignored { reason });
        }
    }
}

/// Lifecycle callbacks: `created()`, `loaded()`, `persisting()`, ...
pub struct LifecycleFacetFactory;

impl FacetFactory for LifecycleFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::ObjectType]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Naming
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) {
        for event in LifecycleEvent::ALL {
            let name = event.method_name();
            if let Some(index) = ctx.partition.find_unclaimed(name, no_arg) {
                ctx.claim(index);
                ctx.add_facet(
                    LifecycleFacet {
                        event,
                        method: name.to_string(),
                    },
                    Precedence::Default,
                );
            }
        }
    }
}

/// `title()`, `iconName()`, `cssClass()` and `Title`-annotated getters.
pub struct TitleFacetFactory;

impl FacetFactory for TitleFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::ObjectType]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Naming
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) {
        let titled: Vec<String> = ctx
            .partition
            .unclaimed()
            .filter(|m| m.descriptor.annotations.is_title() && no_arg(&m.descriptor))
            .filter_map(|m| accessor_member_id(m.name(), m.descriptor.return_type.is_boolean()))
            .collect();
        if !titled.is_empty() {
            ctx.add_facet(
                TitleFacet {
                    source: TitleSource::Properties(titled),
                },
                Precedence::Inferred,
            );
        }

        if let Some(index) = ctx.partition.find_unclaimed("title", no_arg_returning_string) {
            ctx.claim(index);
            ctx.add_facet(
                TitleFacet {
                    source: TitleSource::Method("title".into()),
                },
                Precedence::Default,
            );
        }
        if let Some(index) = ctx.partition.find_unclaimed("iconName", no_arg_returning_string) {
            ctx.claim(index);
            ctx.add_facet(
                IconFacet {
                    method: "iconName".into(),
                },
                Precedence::Default,
            );
        }
        if let Some(index) = ctx.partition.find_unclaimed("cssClass", no_arg_returning_string) {
            ctx.claim(index);
            ctx.add_facet(
                CssClassFacet {
                    method: "cssClass".into(),
                },
                Precedence::Default,
            );
        }
    }
}

/// `DomainObject`, `DomainService`, `Mixin`, `Value` and class-level
/// naming annotations.
pub struct DomainObjectFacetFactory;

impl FacetFactory for DomainObjectFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::ObjectType]
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) {
        let class = ctx.class;
        let annotations = &class.annotations;

        if let Some(domain_object) = annotations.domain_object() {
            match domain_object.nature {
                Nature::Entity => {
                    ctx.add_facet(
                        EntityFacet {
                            persistable: !class.is_abstract,
                        },
                        Precedence::Default,
                    );
                }
                Nature::ViewModel => {
                    ctx.add_facet(ViewModelFacet, Precedence::Default);
                }
                Nature::NotSpecified => {}
            }
            if let Some(policy) = domain_object.introspection {
                ctx.add_facet(IntrospectionFacet { policy }, Precedence::Default);
            }
        }
        if annotations.domain_service().is_some() {
            ctx.add_facet(DomainServiceFacet, Precedence::Default);
        }
        if let Some((mixee, method)) = annotations.mixin() {
            ctx.add_facet(
                MixinFacet {
                    mixee: mixee.clone(),
                    main_method: method.to_string(),
                },
                Precedence::Default,
            );
        }

        let value_type = if class.kind == ClassKind::Enum {
            Some(ValueType::Enum)
        } else if annotations.is_value() || class.kind == ClassKind::Primitive {
            Some(ValueType::for_class_name(&class.name).unwrap_or(ValueType::String))
        } else {
            None
        };
        if let Some(value_type) = value_type {
            ctx.add_facet(ValueFacet { value_type }, Precedence::Default);
        }

        let origin = self.name();
        add_naming_facets(annotations, |facet, precedence| {
            ctx.facets.add(facet, precedence, origin);
        });
    }
}

fn add_naming_facets(annotations: &Annotations, mut add: impl FnMut(super::Facet, Precedence)) {
    if let Some(name) = annotations.named() {
        add(NamedFacet::new(name).into(), Precedence::Default);
    }
    if let Some(plural) = annotations.plural() {
        add(
            PluralFacet {
                plural: plural.to_string(),
            }
            .into(),
            Precedence::Default,
        );
    }
    if let Some(description) = annotations.described() {
        add(
            DescribedFacet {
                description: description.to_string(),
            }
            .into(),
            Precedence::Default,
        );
    }
}

/// Legacy static `fieldOrder()` / `actionOrder()` hints.
pub struct LayoutOrderFacetFactory;

impl LayoutOrderFacetFactory {
    fn parse(list: &str) -> Vec<String> {
        list.split(',')
            .map(|entry| entry.split_whitespace().collect::<String>())
            .filter(|entry| !entry.is_empty())
            .map(|entry| decapitalize(&entry))
            .collect()
    }
}

impl FacetFactory for LayoutOrderFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::ObjectType]
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) {
        let is_hint = |m: &MethodDescriptor| m.is_static && m.arity() == 0 && m.constant.is_some();
        let mut layout = LayoutOrderFacet::default();
        let mut found = false;

        if let Some(index) = ctx.partition.find_unclaimed("fieldOrder", is_hint) {
            let constant = ctx.partition.method(index).descriptor.constant.clone();
            layout.associations = Self::parse(constant.as_deref().unwrap_or_default());
            ctx.claim_as(index, Claim::OrderHint);
            found = true;
        }
        if let Some(index) = ctx.partition.find_unclaimed("actionOrder", is_hint) {
            let constant = ctx.partition.method(index).descriptor.constant.clone();
            layout.actions = Self::parse(constant.as_deref().unwrap_or_default());
            ctx.claim_as(index, Claim::OrderHint);
            found = true;
        }
        if found {
            ctx.add_facet(layout, Precedence::Default);
        }
    }
}

/// Claims every remaining static method.
pub struct StaticMethodsFacetFactory;

impl FacetFactory for StaticMethodsFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::ObjectType]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::PostProcessing
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) {
        let statics: Vec<usize> = ctx
            .partition
            .unclaimed()
            .filter(|m| m.descriptor.is_static)
            .map(|m| m.index)
            .collect();
        for index in statics {
            ctx.claim_as(index, Claim::Ignored { reason: "static" });
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Member factories
// ─────────────────────────────────────────────────────────────────────────────

/// Property getter, `setX` and `clearX`.
pub struct PropertyAccessorFacetFactory;

impl FacetFactory for PropertyAccessorFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Property]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Accessors
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) {
        let getter = ctx.method.name().to_string();
        let value_type = ctx.method.descriptor.return_type.clone();
        ctx.add_facet(PropertyAccessorFacet { getter }, Precedence::Default);

        if let Some(setter) = ctx.take_supporting("set", |m| {
            !m.is_static && m.arity() == 1 && m.params[0].ty == value_type
        }) {
            ctx.add_facet(PropertySetterFacet { setter }, Precedence::Default);
        }
        if let Some(method) = ctx.take_supporting("clear", no_arg) {
            ctx.add_facet(PropertyClearFacet { method }, Precedence::Default);
        }
    }

    fn recognizes(&self, method: &MethodDescriptor) -> bool {
        (strip_prefix(&method.name, "set").is_some() && method.arity() == 1)
            || (strip_prefix(&method.name, "clear").is_some() && method.arity() == 0)
    }
}

/// Collection getter, `addToX` and `removeFromX`.
pub struct CollectionAccessorFacetFactory;

impl FacetFactory for CollectionAccessorFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Collection]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Accessors
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) {
        let getter = ctx.method.name().to_string();
        let return_type = ctx.method.descriptor.return_type.clone();
        ctx.add_facet(CollectionAccessorFacet { getter }, Precedence::Default);

        if let (Some(element), Some(collection)) = (
            return_type.element_type().and_then(TypeRef::class_name),
            return_type.collection_kind(),
        ) {
            ctx.add_facet(
                TypeOfFacet {
                    element_type: element,
                    collection,
                },
                Precedence::Inferred,
            );
        }

        let element = return_type.element_type().cloned();
        let accepts_element =
            |m: &MethodDescriptor| !m.is_static && m.arity() == 1 && Some(&m.params[0].ty) == element.as_ref();
        for (prefix, op) in [("addTo", CollectionOp::Add), ("removeFrom", CollectionOp::Remove)] {
            if let Some(method) = ctx.take_supporting(prefix, accepts_element) {
                ctx.add_facet(CollectionModifyFacet { op, method }, Precedence::Default);
            }
        }
    }

    fn recognizes(&self, method: &MethodDescriptor) -> bool {
        method.arity() == 1
            && (strip_prefix(&method.name, "addTo").is_some()
                || strip_prefix(&method.name, "removeFrom").is_some())
    }
}

/// Action invocation and, for collection-returning actions, element type.
pub struct ActionInvocationFacetFactory;

impl FacetFactory for ActionInvocationFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        &[FeatureType::Action]
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Accessors
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) {
        let return_type = ctx.method.descriptor.return_type.clone();
        ctx.add_facet(
            ActionInvocationFacet {
                method: ctx.method.name().to_string(),
                return_type: return_type.class_name(),
            },
            Precedence::Default,
        );
        if let (Some(element), Some(collection)) = (
            return_type.element_type().and_then(TypeRef::class_name),
            return_type.collection_kind(),
        ) {
            ctx.add_facet(
                TypeOfFacet {
                    element_type: element,
                    collection,
                },
                Precedence::Inferred,
            );
        }
    }
}

/// `hideX`, `disableX`, `validateX`, `defaultX`, `choicesX`,
/// `autoCompleteX` and their per-parameter forms (`default0X`, ...).
pub struct SupportingMethodsFacetFactory;

impl SupportingMethodsFacetFactory {
    fn member_kinds(feature_type: FeatureType) -> &'static [SupportKind] {
        match feature_type {
            FeatureType::Property => &SupportKind::ALL,
            FeatureType::Collection => &[SupportKind::Hide, SupportKind::Disable],
            FeatureType::Action => &[SupportKind::Hide, SupportKind::Disable, SupportKind::Validate],
            _ => &[],
        }
    }

    fn accepts(kind: SupportKind, arity: usize) -> impl Fn(&MethodDescriptor) -> bool {
        move |m: &MethodDescriptor| {
            if m.is_static {
                return false;
            }
            match kind {
                SupportKind::Hide | SupportKind::Disable | SupportKind::Default | SupportKind::Choices => {
                    m.arity() == 0
                }
                SupportKind::Validate => m.arity() == arity,
                SupportKind::AutoComplete => m.arity() == 1 && m.params[0].ty.is_string(),
            }
        }
    }
}

impl FacetFactory for SupportingMethodsFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        MEMBERS_AND_PARAMS
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Accessors
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) {
        let validate_arity = match ctx.feature_type {
            FeatureType::Action => ctx.method.descriptor.arity(),
            _ => 1,
        };
        for &kind in Self::member_kinds(ctx.feature_type) {
            if let Some(method) = ctx.take_supporting(kind.prefix(), Self::accepts(kind, validate_arity)) {
                ctx.add_facet(SupportingMethodFacet { kind, method }, Precedence::Default);
            }
        }
    }

    fn process_param(&self, ctx: &mut ParamContext<'_>) {
        for kind in SupportKind::ALL {
            if let Some(method) = ctx.take_supporting(kind.prefix(), Self::accepts(kind, 1)) {
                ctx.add_facet(SupportingMethodFacet { kind, method }, Precedence::Default);
            }
        }
    }

    fn recognizes(&self, method: &MethodDescriptor) -> bool {
        SupportKind::ALL
            .iter()
            .any(|kind| strip_prefix(&method.name, kind.prefix()).is_some())
    }
}

/// `Named`, `Described`, `MemberOrder`, `Hidden`, `Disabled`, `Optional`
/// and `Programmatic` on members and parameters.
pub struct MemberAnnotationFacetFactory;

impl MemberAnnotationFacetFactory {
    fn apply(annotations: &Annotations, mut add: impl FnMut(super::Facet, Precedence)) {
        add_naming_facets(annotations, &mut add);
        if let Some(sequence) = annotations.member_order() {
            add(
                MemberOrderFacet {
                    sequence: sequence.to_string(),
                }
                .into(),
                Precedence::Default,
            );
        }
        if let Some(location) = annotations.hidden() {
            add(HiddenFacet { location }.into(), Precedence::Default);
        }
        if let Some(reason) = annotations.disabled() {
            add(
                DisabledFacet {
                    reason: reason.to_string(),
                }
                .into(),
                Precedence::Default,
            );
        }
        if annotations.is_optional() {
            add(MandatoryFacet { mandatory: false }.into(), Precedence::Default);
        }
        if annotations.is_programmatic() {
            add(ProgrammaticFacet.into(), Precedence::Default);
        }
    }
}

impl FacetFactory for MemberAnnotationFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        MEMBERS_AND_PARAMS
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) {
        let origin = self.name();
        let annotations = ctx.method.descriptor.annotations.clone();
        Self::apply(&annotations, |facet, precedence| {
            ctx.facets.add(facet, precedence, origin);
        });
    }

    fn process_param(&self, ctx: &mut ParamContext<'_>) {
        let origin = self.name();
        let annotations = ctx.param.annotations.clone();
        Self::apply(&annotations, |facet, precedence| {
            ctx.facets.add(facet, precedence, origin);
        });
    }
}

/// Scalars are mandatory unless declared optional; primitives always are.
pub struct MandatoryFallbackFacetFactory;

impl MandatoryFallbackFacetFactory {
    fn precedence(ty: &TypeRef) -> Precedence {
        match ty {
            TypeRef::Primitive(_) => Precedence::Definitive,
            _ => Precedence::Fallback,
        }
    }
}

impl FacetFactory for MandatoryFallbackFacetFactory {
    fn feature_types(&self) -> &'static [FeatureType] {
        SCALARS
    }

    fn order(&self) -> ProcessingOrder {
        ProcessingOrder::Fallback
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) {
        let precedence = Self::precedence(&ctx.method.descriptor.return_type);
        ctx.add_facet(MandatoryFacet { mandatory: true }, precedence);
    }

    fn process_param(&self, ctx: &mut ParamContext<'_>) {
        let precedence = Self::precedence(&ctx.param.ty);
        ctx.add_facet(MandatoryFacet { mandatory: true }, precedence);
    }
}
