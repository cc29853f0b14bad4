//! Facets: the unit of metadata attached to types, members and parameters.
//!
//! A facet is one fact about a feature ("named *Placed On*", "hidden
//! everywhere", "invoked through `submit`"). Facets are plain values in a
//! tagged [`Facet`] enum. A [`FacetHolder`] keeps at most one facet per
//! [`FacetKind`]; which one survives is decided by [`Precedence`].
//!
//! ```
//! use kestrel_metamodel::facet::{FacetHolder, NamedFacet, Precedence};
//!
//! let mut holder = FacetHolder::new();
//! holder.add(NamedFacet::new("Total"), Precedence::Inferred, "naming");
//! holder.add(NamedFacet::new("Grand total"), Precedence::Default, "annotations");
//! holder.add(NamedFacet::new("ignored"), Precedence::Fallback, "fallback");
//!
//! assert_eq!(holder.lookup::<NamedFacet>().unwrap().name, "Grand total");
//! ```

pub mod factory;
pub mod standard;

use indexmap::IndexMap;

use crate::class::{CollectionKind, Where};
use crate::ident::ClassName;
use crate::spec::IntrospectionPolicy;
use crate::value::ValueType;

pub use factory::{
    ClassContext, FacetFactory, MethodContext, ParamContext, ProcessingOrder, ProgrammingModel,
};

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

/// How strongly a facet holds its place.
///
/// A new facet replaces an existing one of the same kind iff its precedence
/// is greater or equal: later factories win ties, fallbacks never override,
/// definitive facets only yield to other definitive facets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// Used only when nothing else says otherwise.
    Fallback,
    /// Derived from naming conventions or structure.
    Inferred,
    /// Declared by an annotation or supporting method.
    Default,
    /// Must not be overridden.
    Definitive,
}

// ─────────────────────────────────────────────────────────────────────────────
// Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Entity lifecycle callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleEvent {
    /// After instantiation.
    Created,
    /// After loading from the store.
    Loaded,
    /// Before first persist.
    Persisting,
    /// After first persist.
    Persisted,
    /// Before an update is flushed.
    Updating,
    /// After an update is flushed.
    Updated,
    /// Before deletion.
    Removing,
    /// After deletion.
    Removed,
}

impl LifecycleEvent {
    /// Every event.
    pub const ALL: [LifecycleEvent; 8] = [
        Self::Created,
        Self::Loaded,
        Self::Persisting,
        Self::Persisted,
        Self::Updating,
        Self::Updated,
        Self::Removing,
        Self::Removed,
    ];

    /// Name of the callback method.
    #[must_use]
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Loaded => "loaded",
            Self::Persisting => "persisting",
            Self::Persisted => "persisted",
            Self::Updating => "updating",
            Self::Updated => "updated",
            Self::Removing => "removing",
            Self::Removed => "removed",
        }
    }
}

/// Collection modification operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionOp {
    /// `addToX`
    Add,
    /// `removeFromX`
    Remove,
}

/// Supporting methods that refine a member or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SupportKind {
    /// `hideX`
    Hide,
    /// `disableX`
    Disable,
    /// `validateX`
    Validate,
    /// `defaultX`
    Default,
    /// `choicesX`
    Choices,
    /// `autoCompleteX`
    AutoComplete,
}

impl SupportKind {
    /// Every kind.
    pub const ALL: [SupportKind; 6] = [
        Self::Hide,
        Self::Disable,
        Self::Validate,
        Self::Default,
        Self::Choices,
        Self::AutoComplete,
    ];

    /// Method name prefix.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Disable => "disable",
            Self::Validate => "validate",
            Self::Default => "default",
            Self::Choices => "choices",
            Self::AutoComplete => "autoComplete",
        }
    }
}

/// Key of a facet within a [`FacetHolder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[expect(missing_docs, reason = "Each kind mirrors the facet struct of the same name")]
pub enum FacetKind {
    Named,
    Plural,
    Described,
    Title,
    Icon,
    CssClass,
    Hidden,
    Disabled,
    MemberOrder,
    LayoutOrder,
    Value,
    Entity,
    ViewModel,
    DomainService,
    Mixin,
    Introspection,
    Lifecycle(LifecycleEvent),
    PropertyAccessor,
    PropertySetter,
    PropertyClear,
    CollectionAccessor,
    CollectionModify(CollectionOp),
    ActionInvocation,
    TypeOf,
    Supporting(SupportKind),
    Mandatory,
    Programmatic,
}

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFacet {
    /// The name.
    pub name: String,
}

impl NamedFacet {
    /// Creates a named facet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Plural display name of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralFacet {
    /// The plural.
    pub plural: String,
}

/// Free-text description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedFacet {
    /// The description.
    pub description: String,
}

/// How an object's title is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleSource {
    /// A `title()` method.
    Method(String),
    /// The values of `Title`-annotated properties, in order.
    Properties(Vec<String>),
}

/// Title rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFacet {
    /// Where the title comes from.
    pub source: TitleSource,
}

/// Icon name method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFacet {
    /// Method name.
    pub method: String,
}

/// CSS class method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssClassFacet {
    /// Method name.
    pub method: String,
}

/// Declaratively hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenFacet {
    /// Where.
    pub location: Where,
}

/// Declaratively disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisabledFacet {
    /// Reason shown to the user.
    pub reason: String,
}

/// Position in the member layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOrderFacet {
    /// Dewey-decimal sequence.
    pub sequence: String,
}

/// Class-level member order lists from legacy static hints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutOrderFacet {
    /// Property and collection ids in order.
    pub associations: Vec<String>,
    /// Action ids in order.
    pub actions: Vec<String>,
}

/// Value semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueFacet {
    /// How values of the type are marshalled.
    pub value_type: ValueType,
}

/// Persisted domain entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFacet {
    /// False for abstract entities.
    pub persistable: bool,
}

/// View model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModelFacet;

/// Domain service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainServiceFacet;

/// Mixin contributing its main method to a mixee type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinFacet {
    /// The type receiving the contribution.
    pub mixee: ClassName,
    /// The contributing method.
    pub main_method: String,
}

/// Effective introspection policy of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionFacet {
    /// The policy.
    pub policy: IntrospectionPolicy,
}

/// Entity lifecycle callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleFacet {
    /// The event.
    pub event: LifecycleEvent,
    /// Callback method.
    pub method: String,
}

/// Property getter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAccessorFacet {
    /// Getter method.
    pub getter: String,
}

/// Property setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySetterFacet {
    /// Setter method.
    pub setter: String,
}

/// Property clear method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyClearFacet {
    /// Clear method.
    pub method: String,
}

/// Collection getter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionAccessorFacet {
    /// Getter method.
    pub getter: String,
}

/// Collection add or remove method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionModifyFacet {
    /// Which operation.
    pub op: CollectionOp,
    /// Method name.
    pub method: String,
}

/// Action invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInvocationFacet {
    /// Method invoked.
    pub method: String,
    /// Declared return class, `None` for void.
    pub return_type: Option<ClassName>,
}

/// Element type of a collection-valued feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOfFacet {
    /// Element class.
    pub element_type: ClassName,
    /// Collection kind.
    pub collection: CollectionKind,
}

/// A supporting method (`hideX`, `validateX`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportingMethodFacet {
    /// Kind of support.
    pub kind: SupportKind,
    /// Method name.
    pub method: String,
}

/// Whether a value is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatoryFacet {
    /// True if required.
    pub mandatory: bool,
}

/// Excluded from user-facing surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammaticFacet;

// ─────────────────────────────────────────────────────────────────────────────
// Facet enum and typed access
// ─────────────────────────────────────────────────────────────────────────────

/// A facet value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(missing_docs, reason = "Each variant wraps the payload of the same name")]
pub enum Facet {
    Named(NamedFacet),
    Plural(PluralFacet),
    Described(DescribedFacet),
    Title(TitleFacet),
    Icon(IconFacet),
    CssClass(CssClassFacet),
    Hidden(HiddenFacet),
    Disabled(DisabledFacet),
    MemberOrder(MemberOrderFacet),
    LayoutOrder(LayoutOrderFacet),
    Value(ValueFacet),
    Entity(EntityFacet),
    ViewModel(ViewModelFacet),
    DomainService(DomainServiceFacet),
    Mixin(MixinFacet),
    Introspection(IntrospectionFacet),
    Lifecycle(LifecycleFacet),
    PropertyAccessor(PropertyAccessorFacet),
    PropertySetter(PropertySetterFacet),
    PropertyClear(PropertyClearFacet),
    CollectionAccessor(CollectionAccessorFacet),
    CollectionModify(CollectionModifyFacet),
    ActionInvocation(ActionInvocationFacet),
    TypeOf(TypeOfFacet),
    Supporting(SupportingMethodFacet),
    Mandatory(MandatoryFacet),
    Programmatic(ProgrammaticFacet),
}

/// A facet payload type.
pub trait FacetVariant: Clone + Into<Facet> + Sized {
    /// The key this payload is stored under.
    fn kind(&self) -> FacetKind;

    /// Borrows the payload out of a [`Facet`] of the matching variant.
    fn from_facet(facet: &Facet) -> Option<&Self>;
}

/// A payload stored under one fixed kind, usable as a lookup type token.
pub trait UniqueFacet: FacetVariant {
    /// The fixed kind.
    const KIND: FacetKind;
}

macro_rules! facet_variant {
    ($variant:ident, $payload:ident) => {
        impl From<$payload> for Facet {
            fn from(payload: $payload) -> Self {
                Facet::$variant(payload)
            }
        }

        impl FacetVariant for $payload {
            fn kind(&self) -> FacetKind {
                FacetKind::$variant
            }

            fn from_facet(facet: &Facet) -> Option<&Self> {
                match facet {
                    Facet::$variant(payload) => Some(payload),
                    _ => None,
                }
            }
        }

        impl UniqueFacet for $payload {
            const KIND: FacetKind = FacetKind::$variant;
        }
    };
    ($variant:ident, $payload:ident, |$this:ident| $kind:expr) => {
        impl From<$payload> for Facet {
            fn from(payload: $payload) -> Self {
                Facet::$variant(payload)
            }
        }

        impl FacetVariant for $payload {
            fn kind(&self) -> FacetKind {
                let $this = self;
                $kind
            }

            fn from_facet(facet: &Facet) -> Option<&Self> {
                match facet {
                    Facet::$variant(payload) => Some(payload),
                    _ => None,
                }
            }
        }
    };
}

facet_variant!(Named, NamedFacet);
facet_variant!(Plural, PluralFacet);
facet_variant!(Described, DescribedFacet);
facet_variant!(Title, TitleFacet);
facet_variant!(Icon, IconFacet);
facet_variant!(CssClass, CssClassFacet);
facet_variant!(Hidden, HiddenFacet);
facet_variant!(Disabled, DisabledFacet);
facet_variant!(MemberOrder, MemberOrderFacet);
facet_variant!(LayoutOrder, LayoutOrderFacet);
facet_variant!(Value, ValueFacet);
facet_variant!(Entity, EntityFacet);
facet_variant!(ViewModel, ViewModelFacet);
facet_variant!(DomainService, DomainServiceFacet);
facet_variant!(Mixin, MixinFacet);
facet_variant!(Introspection, IntrospectionFacet);
facet_variant!(Lifecycle, LifecycleFacet, |f| FacetKind::Lifecycle(f.event));
facet_variant!(PropertyAccessor, PropertyAccessorFacet);
facet_variant!(PropertySetter, PropertySetterFacet);
facet_variant!(PropertyClear, PropertyClearFacet);
facet_variant!(CollectionAccessor, CollectionAccessorFacet);
facet_variant!(CollectionModify, CollectionModifyFacet, |f| FacetKind::CollectionModify(f.op));
facet_variant!(ActionInvocation, ActionInvocationFacet);
facet_variant!(TypeOf, TypeOfFacet);
facet_variant!(Supporting, SupportingMethodFacet, |f| FacetKind::Supporting(f.kind));
facet_variant!(Mandatory, MandatoryFacet);
facet_variant!(Programmatic, ProgrammaticFacet);

impl Facet {
    /// The key this facet is stored under.
    #[must_use]
    pub fn kind(&self) -> FacetKind {
        match self {
            Self::Named(f) => f.kind(),
            Self::Plural(f) => f.kind(),
            Self::Described(f) => f.kind(),
            Self::Title(f) => f.kind(),
            Self::Icon(f) => f.kind(),
            Self::CssClass(f) => f.kind(),
            Self::Hidden(f) => f.kind(),
            Self::Disabled(f) => f.kind(),
            Self::MemberOrder(f) => f.kind(),
            Self::LayoutOrder(f) => f.kind(),
            Self::Value(f) => f.kind(),
            Self::Entity(f) => f.kind(),
            Self::ViewModel(f) => f.kind(),
            Self::DomainService(f) => f.kind(),
            Self::Mixin(f) => f.kind(),
            Self::Introspection(f) => f.kind(),
            Self::Lifecycle(f) => f.kind(),
            Self::PropertyAccessor(f) => f.kind(),
            Self::PropertySetter(f) => f.kind(),
            Self::PropertyClear(f) => f.kind(),
            Self::CollectionAccessor(f) => f.kind(),
            Self::CollectionModify(f) => f.kind(),
            Self::ActionInvocation(f) => f.kind(),
            Self::TypeOf(f) => f.kind(),
            Self::Supporting(f) => f.kind(),
            Self::Mandatory(f) => f.kind(),
            Self::Programmatic(f) => f.kind(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FacetHolder
// ─────────────────────────────────────────────────────────────────────────────

/// A facet together with how it got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFacet {
    /// The facet.
    pub facet: Facet,
    /// Its precedence.
    pub precedence: Precedence,
    /// Name of the factory (or phase) that installed it.
    pub origin: &'static str,
}

/// At most one facet per [`FacetKind`], in installation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetHolder {
    facets: IndexMap<FacetKind, AttachedFacet>,
}

impl FacetHolder {
    /// Creates an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `facet` unless a facet of the same kind with strictly
    /// higher precedence is already present. Returns true if installed.
    pub fn add(
        &mut self,
        facet: impl Into<Facet>,
        precedence: Precedence,
        origin: &'static str,
    ) -> bool {
        let facet = facet.into();
        let kind = facet.kind();
        if let Some(existing) = self.facets.get(&kind)
            && existing.precedence > precedence
        {
            return false;
        }
        self.facets.insert(
            kind,
            AttachedFacet {
                facet,
                precedence,
                origin,
            },
        );
        true
    }

    /// Typed lookup by payload type.
    #[must_use]
    pub fn lookup<F: UniqueFacet>(&self) -> Option<&F> {
        self.facets
            .get(&F::KIND)
            .and_then(|attached| F::from_facet(&attached.facet))
    }

    /// Typed lookup for payloads keyed by a parameter (lifecycle events,
    /// collection operations, supporting methods).
    #[must_use]
    pub fn lookup_kind<F: FacetVariant>(&self, kind: FacetKind) -> Option<&F> {
        self.facets
            .get(&kind)
            .and_then(|attached| F::from_facet(&attached.facet))
    }

    /// The attached facet of `kind`.
    #[must_use]
    pub fn get(&self, kind: FacetKind) -> Option<&AttachedFacet> {
        self.facets.get(&kind)
    }

    /// Returns true if a facet of `kind` is present.
    #[must_use]
    pub fn contains(&self, kind: FacetKind) -> bool {
        self.facets.contains_key(&kind)
    }

    /// Precedence of the facet of `kind`.
    #[must_use]
    pub fn precedence(&self, kind: FacetKind) -> Option<Precedence> {
        self.facets.get(&kind).map(|attached| attached.precedence)
    }

    /// Removes and returns the facet of `kind`.
    pub fn remove(&mut self, kind: FacetKind) -> Option<AttachedFacet> {
        self.facets.shift_remove(&kind)
    }

    /// Kinds present, in installation order.
    pub fn kinds(&self) -> impl Iterator<Item = FacetKind> + '_ {
        self.facets.keys().copied()
    }

    /// Attached facets, in installation order.
    pub fn iter(&self) -> impl Iterator<Item = &AttachedFacet> {
        self.facets.values()
    }

    /// Supporting-method facets.
    pub fn supporting(&self) -> impl Iterator<Item = &SupportingMethodFacet> {
        self.facets.values().filter_map(|attached| match &attached.facet {
            Facet::Supporting(support) => Some(support),
            _ => None,
        })
    }

    /// Number of facets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// Returns true if no facets are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Returns true if hidden everywhere or programmatic.
    #[must_use]
    pub fn is_always_hidden(&self) -> bool {
        self.contains(FacetKind::Programmatic)
            || self
                .lookup::<HiddenFacet>()
                .is_some_and(|hidden| hidden.location == Where::Everywhere)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_never_overrides() {
        let mut holder = FacetHolder::new();
        assert!(holder.add(MandatoryFacet { mandatory: false }, Precedence::Default, "a"));
        assert!(!holder.add(MandatoryFacet { mandatory: true }, Precedence::Fallback, "b"));

        let attached = holder.get(FacetKind::Mandatory).unwrap();
        assert_eq!(attached.origin, "a");
        assert!(!holder.lookup::<MandatoryFacet>().unwrap().mandatory);
    }

    #[test]
    fn later_facet_of_equal_precedence_wins() {
        let mut holder = FacetHolder::new();
        holder.add(NamedFacet::new("first"), Precedence::Default, "a");
        assert!(holder.add(NamedFacet::new("second"), Precedence::Default, "b"));
        assert_eq!(holder.lookup::<NamedFacet>().unwrap().name, "second");
        assert_eq!(holder.len(), 1);
    }

    #[test]
    fn definitive_sticks() {
        let mut holder = FacetHolder::new();
        holder.add(MandatoryFacet { mandatory: true }, Precedence::Definitive, "primitive");
        assert!(!holder.add(MandatoryFacet { mandatory: false }, Precedence::Default, "optional"));
        assert!(holder.add(MandatoryFacet { mandatory: false }, Precedence::Definitive, "override"));
        assert_eq!(holder.precedence(FacetKind::Mandatory), Some(Precedence::Definitive));
        assert!(!holder.lookup::<MandatoryFacet>().unwrap().mandatory);
    }

    #[test]
    fn keyed_kinds_coexist() {
        let mut holder = FacetHolder::new();
        holder.add(
            SupportingMethodFacet {
                kind: SupportKind::Hide,
                method: "hideTotal".into(),
            },
            Precedence::Default,
            "support",
        );
        holder.add(
            SupportingMethodFacet {
                kind: SupportKind::Validate,
                method: "validateTotal".into(),
            },
            Precedence::Default,
            "support",
        );

        assert_eq!(holder.supporting().count(), 2);
        let hide: &SupportingMethodFacet = holder
            .lookup_kind(FacetKind::Supporting(SupportKind::Hide))
            .unwrap();
        assert_eq!(hide.method, "hideTotal");
        assert!(!holder.contains(FacetKind::Supporting(SupportKind::Choices)));
    }

    #[test]
    fn absent_lookup_is_none() {
        let holder = FacetHolder::new();
        assert!(holder.lookup::<NamedFacet>().is_none());
        assert!(holder.is_empty());
    }

    #[test]
    fn always_hidden() {
        let mut holder = FacetHolder::new();
        holder.add(HiddenFacet { location: Where::AllTables }, Precedence::Default, "a");
        assert!(!holder.is_always_hidden());
        holder.add(HiddenFacet { location: Where::Everywhere }, Precedence::Default, "a");
        assert!(holder.is_always_hidden());

        let mut programmatic = FacetHolder::new();
        programmatic.add(ProgrammaticFacet, Precedence::Default, "a");
        assert!(programmatic.is_always_hidden());
    }

    #[test]
    fn facet_kind_matches_payload() {
        let facet: Facet = LifecycleFacet {
            event: LifecycleEvent::Persisting,
            method: "persisting".into(),
        }
        .into();
        assert_eq!(facet.kind(), FacetKind::Lifecycle(LifecycleEvent::Persisting));
        assert_eq!(LifecycleEvent::Removed.method_name(), "removed");
        assert_eq!(SupportKind::AutoComplete.prefix(), "autoComplete");
    }
}
