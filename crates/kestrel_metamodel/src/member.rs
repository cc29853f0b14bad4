//! Object members: properties, collections and actions.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::class::CollectionKind;
use crate::facet::{
    DescribedFacet, FacetHolder, FacetKind, MandatoryFacet, MemberOrderFacet, NamedFacet, Precedence,
};
use crate::ident::{ClassName, FeatureType, Identifier, LogicalType};
use crate::naming;
use crate::partition::{MethodKey, MethodPartition};

/// Where a mixed-in member came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinOrigin {
    /// The mixin class.
    pub mixin: ClassName,
    /// Its main method.
    pub method: String,
    /// The member's identifier on the mixin itself.
    pub mixin_identifier: Identifier,
}

/// State shared by every kind of member.
#[derive(Debug, Clone)]
pub struct MemberCore {
    pub(crate) identifier: Identifier,
    pub(crate) feature_type: FeatureType,
    pub(crate) element_type: ClassName,
    pub(crate) facets: FacetHolder,
    pub(crate) method: Option<MethodKey>,
    pub(crate) declaration_index: usize,
    pub(crate) mixin: Option<MixinOrigin>,
}

impl MemberCore {
    pub(crate) fn new(
        identifier: Identifier,
        feature_type: FeatureType,
        element_type: ClassName,
        facets: FacetHolder,
        method: Option<MethodKey>,
        declaration_index: usize,
    ) -> Self {
        Self {
            identifier,
            feature_type,
            element_type,
            facets,
            method,
            declaration_index,
            mixin: None,
        }
    }

    fn mixed_into(&self, host: &LogicalType, origin: &MixinOrigin, declaration_index: usize) -> Self {
        Self {
            identifier: self.identifier.with_logical_type(host.clone()),
            declaration_index,
            mixin: Some(origin.clone()),
            ..self.clone()
        }
    }
}

/// Behaviour common to every member.
pub trait Member {
    /// The shared member state.
    fn core(&self) -> &MemberCore;

    /// Local id, unique within the declaring type.
    fn id(&self) -> &str {
        self.core().identifier.member_logical_name()
    }

    /// Full identifier.
    fn identifier(&self) -> &Identifier {
        &self.core().identifier
    }

    /// Property, collection or action.
    fn feature_type(&self) -> FeatureType {
        self.core().feature_type
    }

    /// Type of the property, element type of the collection, or return
    /// type of the action (`void` for none).
    fn element_type(&self) -> &ClassName {
        &self.core().element_type
    }

    /// The member's facets.
    fn facets(&self) -> &FacetHolder {
        &self.core().facets
    }

    /// Declaring class and signature of the accessor or action method.
    fn method_key(&self) -> Option<&MethodKey> {
        self.core().method.as_ref()
    }

    /// Position in the declaring class's method list.
    fn declaration_index(&self) -> usize {
        self.core().declaration_index
    }

    /// Set for members contributed by a mixin.
    fn mixin(&self) -> Option<&MixinOrigin> {
        self.core().mixin.as_ref()
    }

    /// Returns true for members contributed by a mixin.
    fn is_mixed_in(&self) -> bool {
        self.core().mixin.is_some()
    }

    /// Display name.
    fn name(&self) -> String {
        self.facets()
            .lookup::<NamedFacet>()
            .map_or_else(|| naming::natural_name(self.id()), |named| named.name.clone())
    }

    /// Description, if any.
    fn description(&self) -> Option<String> {
        self.facets()
            .lookup::<DescribedFacet>()
            .map(|described| described.description.clone())
    }

    /// Explicit member order sequence.
    fn member_order(&self) -> Option<&str> {
        self.facets()
            .lookup::<MemberOrderFacet>()
            .map(|order| order.sequence.as_str())
    }

    /// Returns true if hidden everywhere or programmatic.
    fn is_always_hidden(&self) -> bool {
        self.facets().is_always_hidden()
    }
}

impl<M: Member + ?Sized> Member for Arc<M> {
    fn core(&self) -> &MemberCore {
        (**self).core()
    }
}

/// A scalar property.
#[derive(Debug, Clone)]
pub struct OneToOneAssociation {
    pub(crate) core: MemberCore,
}

impl OneToOneAssociation {
    /// Returns true unless the property is optional.
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.core
            .facets
            .lookup::<MandatoryFacet>()
            .is_none_or(|mandatory| mandatory.mandatory)
    }
}

impl Member for OneToOneAssociation {
    fn core(&self) -> &MemberCore {
        &self.core
    }
}

/// A collection.
#[derive(Debug, Clone)]
pub struct OneToManyAssociation {
    pub(crate) core: MemberCore,
    pub(crate) collection_kind: CollectionKind,
}

impl OneToManyAssociation {
    /// List, set or sorted set. Arrays are lists.
    #[must_use]
    pub fn collection_kind(&self) -> CollectionKind {
        self.collection_kind
    }
}

impl Member for OneToManyAssociation {
    fn core(&self) -> &MemberCore {
        &self.core
    }
}

/// One parameter of an action.
#[derive(Debug, Clone)]
pub struct ActionParameter {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) feature_type: FeatureType,
    pub(crate) element_type: ClassName,
    pub(crate) facets: FacetHolder,
}

impl ActionParameter {
    /// Zero-based position.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared name.
    #[must_use]
    pub fn declared_name(&self) -> &str {
        &self.name
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> String {
        self.facets
            .lookup::<NamedFacet>()
            .map_or_else(|| naming::natural_name(&self.name), |named| named.name.clone())
    }

    /// Scalar or collection parameter.
    #[must_use]
    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// Parameter type; element type for collection parameters.
    #[must_use]
    pub fn element_type(&self) -> &ClassName {
        &self.element_type
    }

    /// The parameter's facets.
    #[must_use]
    pub fn facets(&self) -> &FacetHolder {
        &self.facets
    }

    /// Returns true unless the parameter is optional.
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.facets
            .lookup::<MandatoryFacet>()
            .is_none_or(|mandatory| mandatory.mandatory)
    }
}

/// An action.
#[derive(Debug, Clone)]
pub struct ObjectAction {
    pub(crate) core: MemberCore,
    pub(crate) parameters: Vec<ActionParameter>,
    pub(crate) return_type: Option<ClassName>,
    pub(crate) returns_collection: bool,
}

impl ObjectAction {
    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ActionParameter] {
        &self.parameters
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Return type (element type for collection returns); `None` for void.
    #[must_use]
    pub fn return_type(&self) -> Option<&ClassName> {
        self.return_type.as_ref()
    }

    /// Returns true if the action returns a collection.
    #[must_use]
    pub fn returns_collection(&self) -> bool {
        self.returns_collection
    }
}

impl Member for ObjectAction {
    fn core(&self) -> &MemberCore {
        &self.core
    }
}

/// Any member.
#[derive(Debug, Clone)]
pub enum ObjectMember {
    /// A property.
    Property(Arc<OneToOneAssociation>),
    /// A collection.
    Collection(Arc<OneToManyAssociation>),
    /// An action.
    Action(Arc<ObjectAction>),
}

impl ObjectMember {
    /// The property, if this is one.
    #[must_use]
    pub fn as_property(&self) -> Option<&Arc<OneToOneAssociation>> {
        match self {
            Self::Property(property) => Some(property),
            _ => None,
        }
    }

    /// The collection, if this is one.
    #[must_use]
    pub fn as_collection(&self) -> Option<&Arc<OneToManyAssociation>> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// The action, if this is one.
    #[must_use]
    pub fn as_action(&self) -> Option<&Arc<ObjectAction>> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Returns true for properties and collections.
    #[must_use]
    pub fn is_association(&self) -> bool {
        !matches!(self, Self::Action(_))
    }

    /// A copy contributed to `host` by the mixin `mixin` through its main
    /// method `method`, identified on the host's logical type.
    #[must_use]
    pub(crate) fn mixed_into(
        &self,
        host: &LogicalType,
        mixin: &ClassName,
        method: &str,
        declaration_index: usize,
    ) -> Self {
        let origin = MixinOrigin {
            mixin: mixin.clone(),
            method: method.to_owned(),
            mixin_identifier: self.identifier().clone(),
        };
        let rehome = |core: &MemberCore| core.mixed_into(host, &origin, declaration_index);
        match self {
            Self::Property(property) => Self::Property(Arc::new(OneToOneAssociation {
                core: rehome(&property.core),
            })),
            Self::Collection(collection) => Self::Collection(Arc::new(OneToManyAssociation {
                core: rehome(&collection.core),
                collection_kind: collection.collection_kind,
            })),
            Self::Action(action) => Self::Action(Arc::new(ObjectAction {
                core: rehome(&action.core),
                parameters: action.parameters.clone(),
                return_type: action.return_type.clone(),
                returns_collection: action.returns_collection,
            })),
        }
    }

    /// Facet precedence of a kind, for diagnostics.
    #[must_use]
    pub fn facet_precedence(&self, kind: FacetKind) -> Option<Precedence> {
        self.facets().precedence(kind)
    }
}

impl Member for ObjectMember {
    fn core(&self) -> &MemberCore {
        match self {
            Self::Property(property) => &property.core,
            Self::Collection(collection) => &collection.core,
            Self::Action(action) => &action.core,
        }
    }
}

/// The members of a specification, published once introspection ends.
#[derive(Debug)]
pub struct MemberTable {
    associations: Vec<ObjectMember>,
    properties: Vec<Arc<OneToOneAssociation>>,
    collections: Vec<Arc<OneToManyAssociation>>,
    actions: Vec<Arc<ObjectAction>>,
    by_id: HashMap<String, ObjectMember>,
    partition: MethodPartition,
    pub(crate) ambiguities: Vec<String>,
    pub(crate) orphans: Vec<String>,
    pub(crate) unknown_in_order: Vec<String>,
    pub(crate) missing_mixin_main: Option<String>,
}

impl MemberTable {
    /// A table without members.
    #[must_use]
    pub fn empty(partition: MethodPartition) -> Self {
        Self::new(Vec::new(), Vec::new(), partition)
    }

    /// Builds a table from members already in display order.
    pub(crate) fn new(
        associations: Vec<ObjectMember>,
        actions: Vec<Arc<ObjectAction>>,
        partition: MethodPartition,
    ) -> Self {
        let properties = associations
            .iter()
            .filter_map(ObjectMember::as_property)
            .cloned()
            .collect();
        let collections = associations
            .iter()
            .filter_map(ObjectMember::as_collection)
            .cloned()
            .collect();
        let by_id = associations
            .iter()
            .cloned()
            .chain(actions.iter().cloned().map(ObjectMember::Action))
            .map(|member| (member.id().to_owned(), member))
            .collect();
        Self {
            associations,
            properties,
            collections,
            actions,
            by_id,
            partition,
            ambiguities: Vec::new(),
            orphans: Vec::new(),
            unknown_in_order: Vec::new(),
            missing_mixin_main: None,
        }
    }

    /// Properties and collections, in display order.
    #[must_use]
    pub fn associations(&self) -> &[ObjectMember] {
        &self.associations
    }

    /// Properties, in display order.
    #[must_use]
    pub fn properties(&self) -> &[Arc<OneToOneAssociation>] {
        &self.properties
    }

    /// Collections, in display order.
    #[must_use]
    pub fn collections(&self) -> &[Arc<OneToManyAssociation>] {
        &self.collections
    }

    /// Actions, in display order.
    #[must_use]
    pub fn actions(&self) -> &[Arc<ObjectAction>] {
        &self.actions
    }

    /// Associations followed by actions.
    pub fn iter(&self) -> impl Iterator<Item = ObjectMember> + '_ {
        self.associations
            .iter()
            .cloned()
            .chain(self.actions.iter().cloned().map(ObjectMember::Action))
    }

    /// The member with local id `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ObjectMember> {
        self.by_id.get(id)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Every method and its claim.
    #[must_use]
    pub fn partition(&self) -> &MethodPartition {
        &self.partition
    }

    /// Member ids declared more than once.
    #[must_use]
    pub fn ambiguities(&self) -> &[String] {
        &self.ambiguities
    }

    /// Supporting methods no member claimed.
    #[must_use]
    pub fn orphans(&self) -> &[String] {
        &self.orphans
    }

    /// Ids named by legacy order hints that match no member.
    #[must_use]
    pub fn unknown_in_order(&self) -> &[String] {
        &self.unknown_in_order
    }

    /// Main method a mixin declares but does not have.
    #[must_use]
    pub fn missing_mixin_main(&self) -> Option<&str> {
        self.missing_mixin_main.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::HiddenFacet;
    use crate::class::Where;

    fn property(class: &str, id: &str, index: usize) -> ObjectMember {
        let identifier =
            Identifier::property_or_collection(LogicalType::of(ClassName::new(class)), id);
        ObjectMember::Property(Arc::new(OneToOneAssociation {
            core: MemberCore::new(
                identifier,
                FeatureType::Property,
                ClassName::new("kestrel.lang.String"),
                FacetHolder::new(),
                Some(MethodKey::new(class, format!("get{}()", naming::capitalize(id)))),
                index,
            ),
        }))
    }

    #[test]
    fn names_default_to_natural_names() {
        let member = property("com.acme.Order", "placedOn", 0);
        assert_eq!(member.id(), "placedOn");
        assert_eq!(member.name(), "Placed On");
        assert!(member.is_association());
        assert!(!member.is_mixed_in());
    }

    #[test]
    fn mixed_in_members_are_rehomed() {
        let member = property("com.acme.Order_status", "status", 0);
        let host = LogicalType::new(ClassName::new("com.acme.Order"), "acme.Order");
        let mixed = member.mixed_into(
            &host,
            &ClassName::new("com.acme.Order_status"),
            "getStatus",
            7,
        );

        assert_eq!(mixed.identifier().full_identity_string(), "acme.Order#status");
        assert_eq!(mixed.declaration_index(), 7);
        let origin = mixed.mixin().unwrap();
        assert_eq!(origin.mixin.as_str(), "com.acme.Order_status");
        assert_eq!(origin.method, "getStatus");
        assert_eq!(origin.mixin_identifier, *member.identifier());
    }

    #[test]
    fn table_indexes_by_id() {
        let mut hidden = FacetHolder::new();
        hidden.add(
            HiddenFacet {
                location: Where::Everywhere,
            },
            Precedence::Default,
            "test",
        );
        let secret = ObjectMember::Property(Arc::new(OneToOneAssociation {
            core: MemberCore {
                facets: hidden,
                ..property("com.acme.Order", "secret", 1).core().clone()
            },
        }));
        let table = MemberTable::new(
            vec![property("com.acme.Order", "number", 0), secret],
            Vec::new(),
            MethodPartition::new(Vec::new()),
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.properties().len(), 2);
        assert!(table.collections().is_empty());
        assert!(table.get("secret").unwrap().is_always_hidden());
        assert!(table.get("missing").is_none());
    }
}
