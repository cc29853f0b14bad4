//! Application features: the nodes of the feature tree.

use std::collections::BTreeSet;

use indexmap::IndexSet;
use kestrel_metamodel::ident::{ClassName, FeatureType};
use serde::Serialize;

use crate::id::{ApplicationFeatureId, ApplicationFeatureSort};

/// Kind of a member feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMemberSort {
    /// A scalar association.
    Property,
    /// A multi-valued association.
    Collection,
    /// An action.
    Action,
}

impl ApplicationMemberSort {
    /// The member sort of a metamodel feature type, if it is a member.
    #[must_use]
    pub fn of(feature_type: FeatureType) -> Option<Self> {
        match feature_type {
            FeatureType::Property => Some(Self::Property),
            FeatureType::Collection => Some(Self::Collection),
            FeatureType::Action => Some(Self::Action),
            FeatureType::ObjectType
            | FeatureType::ActionParameterScalar
            | FeatureType::ActionParameterCollection => None,
        }
    }
}

/// A namespace, type or member in the feature tree.
///
/// Namespaces list their child namespaces and types in `contents`. Types
/// list their members by sort in declaration order. Members carry their
/// element type.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationFeature {
    id: ApplicationFeatureId,
    member_sort: Option<ApplicationMemberSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_type: Option<String>,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    returns_collection: bool,
    #[serde(skip_serializing_if = "core::ops::Not::not")]
    mixed_in: bool,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    contents: BTreeSet<ApplicationFeatureId>,
    #[serde(skip_serializing_if = "IndexSet::is_empty")]
    properties: IndexSet<ApplicationFeatureId>,
    #[serde(skip_serializing_if = "IndexSet::is_empty")]
    collections: IndexSet<ApplicationFeatureId>,
    #[serde(skip_serializing_if = "IndexSet::is_empty")]
    actions: IndexSet<ApplicationFeatureId>,
}

impl ApplicationFeature {
    pub(crate) fn new(id: ApplicationFeatureId) -> Self {
        Self {
            id,
            member_sort: None,
            element_type: None,
            returns_collection: false,
            mixed_in: false,
            contents: BTreeSet::new(),
            properties: IndexSet::new(),
            collections: IndexSet::new(),
            actions: IndexSet::new(),
        }
    }

    pub(crate) fn member(
        id: ApplicationFeatureId,
        sort: ApplicationMemberSort,
        element_type: Option<&ClassName>,
        returns_collection: bool,
        mixed_in: bool,
    ) -> Self {
        Self {
            member_sort: Some(sort),
            element_type: element_type.map(|class| class.as_str().to_owned()),
            returns_collection,
            mixed_in,
            ..Self::new(id)
        }
    }

    /// The feature's id.
    #[must_use]
    pub fn id(&self) -> &ApplicationFeatureId {
        &self.id
    }

    /// Namespace, type or member.
    #[must_use]
    pub fn sort(&self) -> ApplicationFeatureSort {
        self.id.sort()
    }

    /// Property, collection or action, for members.
    #[must_use]
    pub fn member_sort(&self) -> Option<ApplicationMemberSort> {
        self.member_sort
    }

    /// Property type, collection element type or action return type;
    /// `None` for actions returning nothing.
    #[must_use]
    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    /// Returns true for actions returning a collection.
    #[must_use]
    pub fn returns_collection(&self) -> bool {
        self.returns_collection
    }

    /// Returns true for members contributed by a mixin.
    #[must_use]
    pub fn is_mixed_in(&self) -> bool {
        self.mixed_in
    }

    /// Child namespaces and types of a namespace, sorted.
    #[must_use]
    pub fn contents(&self) -> &BTreeSet<ApplicationFeatureId> {
        &self.contents
    }

    /// Members of a type with this sort, in declaration order.
    #[must_use]
    pub fn members_of_sort(&self, sort: ApplicationMemberSort) -> &IndexSet<ApplicationFeatureId> {
        match sort {
            ApplicationMemberSort::Property => &self.properties,
            ApplicationMemberSort::Collection => &self.collections,
            ApplicationMemberSort::Action => &self.actions,
        }
    }

    pub(crate) fn add_content(&mut self, child: ApplicationFeatureId) {
        self.contents.insert(child);
    }

    pub(crate) fn remove_content(&mut self, child: &ApplicationFeatureId) {
        self.contents.remove(child);
    }

    pub(crate) fn add_member(&mut self, sort: ApplicationMemberSort, member: ApplicationFeatureId) {
        match sort {
            ApplicationMemberSort::Property => self.properties.insert(member),
            ApplicationMemberSort::Collection => self.collections.insert(member),
            ApplicationMemberSort::Action => self.actions.insert(member),
        };
    }

    pub(crate) fn has_members(&self) -> bool {
        !(self.properties.is_empty() && self.collections.is_empty() && self.actions.is_empty())
    }
}
