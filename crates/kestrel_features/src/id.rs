//! Application feature ids.
//!
//! An [`ApplicationFeatureId`] names a namespace, a type or a member. It has
//! two wire forms, both exactly invertible:
//!
//! - plain: `NAMESPACE:com.acme`, `TYPE:com.acme.Order`,
//!   `MEMBER:com.acme.Order#submit`
//! - encoded: the plain form in URL-safe base64, for use in paths and
//!   query strings
//!
//! Namespaces and type names must not contain `#`, type and member names
//! must not be empty. The constructors reject ids that break this, so every
//! id survives both wire forms.
//!
//! # Example
//!
//! ```
//! use kestrel_features::id::ApplicationFeatureId;
//!
//! let submit = ApplicationFeatureId::new_member("com.acme.Order", "submit").unwrap();
//! assert_eq!(submit.as_string(), "MEMBER:com.acme.Order#submit");
//!
//! let order = submit.get_parent_class_id().unwrap();
//! assert_eq!(order, ApplicationFeatureId::new_type("com.acme.Order").unwrap());
//! assert_eq!(
//!     order.get_parent_namespace_id(),
//!     ApplicationFeatureId::new_namespace("com.acme").ok()
//! );
//!
//! let encoded = submit.as_encoded_string();
//! assert_eq!(ApplicationFeatureId::parse_encoded(&encoded).unwrap(), submit);
//! ```

use core::fmt;
use core::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FeatureIdParseError;

const MEMBER_SEPARATOR: char = '#';

/// The three levels of the feature tree, in tree order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApplicationFeatureSort {
    /// A logical namespace such as `com.acme`.
    Namespace,
    /// A domain type.
    Type,
    /// A property, collection or action of a type.
    Member,
}

impl ApplicationFeatureSort {
    /// The wire prefix.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "NAMESPACE",
            Self::Type => "TYPE",
            Self::Member => "MEMBER",
        }
    }

    fn parse(prefix: &str) -> Result<Self, FeatureIdParseError> {
        match prefix {
            "NAMESPACE" => Ok(Self::Namespace),
            "TYPE" => Ok(Self::Type),
            "MEMBER" => Ok(Self::Member),
            other => Err(FeatureIdParseError::UnknownSort(other.to_owned())),
        }
    }
}

impl fmt::Display for ApplicationFeatureSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Id of a namespace, type or member feature.
///
/// Ordered by sort, then namespace, then type name, then member name, so
/// a sorted set lists namespaces before types before members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApplicationFeatureId {
    sort: ApplicationFeatureSort,
    namespace: String,
    type_simple_name: Option<String>,
    member_name: Option<String>,
}

impl ApplicationFeatureId {
    /// Id of the namespace `namespace`.
    ///
    /// # Errors
    ///
    /// [`FeatureIdParseError::MisplacedMemberSeparator`] if the name
    /// contains `#`.
    pub fn new_namespace(namespace: impl Into<String>) -> Result<Self, FeatureIdParseError> {
        let namespace = namespace.into();
        if namespace.contains(MEMBER_SEPARATOR) {
            return Err(FeatureIdParseError::MisplacedMemberSeparator(format!(
                "{}:{namespace}",
                ApplicationFeatureSort::Namespace
            )));
        }
        Ok(Self::namespace_of(namespace))
    }

    /// Id of the type with this logical type name. The namespace is
    /// everything before the last `.`.
    ///
    /// # Errors
    ///
    /// [`FeatureIdParseError::MissingTypeName`] if the name is empty or
    /// ends in `.`, [`FeatureIdParseError::MisplacedMemberSeparator`] if it
    /// contains `#`.
    pub fn new_type(logical_type_name: &str) -> Result<Self, FeatureIdParseError> {
        let plain = || format!("{}:{logical_type_name}", ApplicationFeatureSort::Type);
        if logical_type_name.contains(MEMBER_SEPARATOR) {
            return Err(FeatureIdParseError::MisplacedMemberSeparator(plain()));
        }
        let (namespace, simple_name) = split_type(logical_type_name);
        if simple_name.is_empty() {
            return Err(FeatureIdParseError::MissingTypeName(plain()));
        }
        Ok(Self {
            sort: ApplicationFeatureSort::Type,
            namespace: namespace.to_owned(),
            type_simple_name: Some(simple_name.to_owned()),
            member_name: None,
        })
    }

    /// Id of member `member` of the type with this logical type name.
    ///
    /// # Errors
    ///
    /// [`FeatureIdParseError::MissingMemberName`] if `member` is empty,
    /// otherwise as [`new_type`](Self::new_type).
    pub fn new_member(
        logical_type_name: &str,
        member: impl Into<String>,
    ) -> Result<Self, FeatureIdParseError> {
        let member = member.into();
        if member.is_empty() {
            return Err(FeatureIdParseError::MissingMemberName(format!(
                "{}:{logical_type_name}{MEMBER_SEPARATOR}",
                ApplicationFeatureSort::Member
            )));
        }
        Ok(Self {
            sort: ApplicationFeatureSort::Member,
            member_name: Some(member),
            ..Self::new_type(logical_type_name)?
        })
    }

    fn namespace_of(namespace: String) -> Self {
        Self {
            sort: ApplicationFeatureSort::Namespace,
            namespace,
            type_simple_name: None,
            member_name: None,
        }
    }

    /// Namespace, type or member.
    #[must_use]
    pub fn sort(&self) -> ApplicationFeatureSort {
        self.sort
    }

    /// The namespace, or the namespace of the type.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The type's simple name, for type and member ids.
    #[must_use]
    pub fn type_simple_name(&self) -> Option<&str> {
        self.type_simple_name.as_deref()
    }

    /// The member name, for member ids.
    #[must_use]
    pub fn member_name(&self) -> Option<&str> {
        self.member_name.as_deref()
    }

    /// `namespace.Type` for type and member ids.
    #[must_use]
    pub fn logical_type_name(&self) -> Option<String> {
        self.type_simple_name
            .as_deref()
            .map(|simple_name| qualify(&self.namespace, simple_name))
    }

    /// The owning type of a member id.
    #[must_use]
    pub fn get_parent_class_id(&self) -> Option<Self> {
        match self.sort {
            ApplicationFeatureSort::Member => Some(Self {
                sort: ApplicationFeatureSort::Type,
                member_name: None,
                ..self.clone()
            }),
            _ => None,
        }
    }

    /// The enclosing namespace.
    ///
    /// Types and members always have one, possibly the root namespace `""`.
    /// A namespace has one only when its name contains a `.`.
    #[must_use]
    pub fn get_parent_namespace_id(&self) -> Option<Self> {
        match self.sort {
            ApplicationFeatureSort::Namespace => self
                .namespace
                .rfind('.')
                .map(|dot| Self::namespace_of(self.namespace[..dot].to_owned())),
            ApplicationFeatureSort::Type | ApplicationFeatureSort::Member => {
                Some(Self::namespace_of(self.namespace.clone()))
            }
        }
    }

    /// Every ancestor, nearest first.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut ancestors = Vec::new();
        let mut next = self
            .get_parent_class_id()
            .or_else(|| self.get_parent_namespace_id());
        while let Some(id) = next {
            next = id
                .get_parent_class_id()
                .or_else(|| id.get_parent_namespace_id());
            ancestors.push(id);
        }
        ancestors
    }

    /// The plain wire form.
    #[must_use]
    pub fn as_string(&self) -> String {
        let mut out = format!("{}:", self.sort);
        match &self.type_simple_name {
            Some(simple_name) => out.push_str(&qualify(&self.namespace, simple_name)),
            None => out.push_str(&self.namespace),
        }
        if let Some(member) = &self.member_name {
            out.push(MEMBER_SEPARATOR);
            out.push_str(member);
        }
        out
    }

    /// Parses the plain wire form.
    pub fn parse(input: &str) -> Result<Self, FeatureIdParseError> {
        let (prefix, name) = input
            .split_once(':')
            .ok_or_else(|| FeatureIdParseError::MissingSort(input.to_owned()))?;
        match ApplicationFeatureSort::parse(prefix)? {
            ApplicationFeatureSort::Namespace => Self::new_namespace(name),
            ApplicationFeatureSort::Type => Self::new_type(name),
            ApplicationFeatureSort::Member => {
                let (type_name, member) = name
                    .split_once(MEMBER_SEPARATOR)
                    .ok_or_else(|| FeatureIdParseError::MissingMemberName(input.to_owned()))?;
                Self::new_member(type_name, member)
            }
        }
    }

    /// The plain form in URL-safe base64.
    #[must_use]
    pub fn as_encoded_string(&self) -> String {
        URL_SAFE.encode(self.as_string())
    }

    /// Parses the encoded wire form.
    pub fn parse_encoded(encoded: &str) -> Result<Self, FeatureIdParseError> {
        let bytes = URL_SAFE.decode(encoded)?;
        Self::parse(&String::from_utf8(bytes)?)
    }
}

fn split_type(logical_type_name: &str) -> (&str, &str) {
    match logical_type_name.rfind('.') {
        Some(dot) => (&logical_type_name[..dot], &logical_type_name[dot + 1..]),
        None => ("", logical_type_name),
    }
}

fn qualify(namespace: &str, simple_name: &str) -> String {
    if namespace.is_empty() {
        simple_name.to_owned()
    } else {
        format!("{namespace}.{simple_name}")
    }
}

impl fmt::Display for ApplicationFeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl FromStr for ApplicationFeatureId {
    type Err = FeatureIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ApplicationFeatureId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApplicationFeatureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let plain = String::deserialize(deserializer)?;
        Self::parse(&plain).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn member_parents_walk_up_the_tree() {
        let submit = ApplicationFeatureId::new_member("com.acme.Order", "submit").unwrap();
        let order = submit.get_parent_class_id().unwrap();
        assert_eq!(order, ApplicationFeatureId::new_type("com.acme.Order").unwrap());
        assert_eq!(
            order.get_parent_namespace_id(),
            Some(ApplicationFeatureId::new_namespace("com.acme").unwrap())
        );
        assert_eq!(
            submit.ancestors(),
            vec![
                order,
                ApplicationFeatureId::new_namespace("com.acme").unwrap(),
                ApplicationFeatureId::new_namespace("com").unwrap(),
            ]
        );
    }

    #[test]
    fn top_level_namespaces_have_no_parent() {
        assert_eq!(ApplicationFeatureId::new_namespace("com").unwrap().get_parent_namespace_id(), None);
        assert_eq!(ApplicationFeatureId::new_namespace("").unwrap().get_parent_namespace_id(), None);
        assert_eq!(ApplicationFeatureId::new_type("com.acme.Order").unwrap().get_parent_class_id(), None);
    }

    #[test]
    fn unqualified_types_live_in_the_root_namespace() {
        let order = ApplicationFeatureId::new_type("Order").unwrap();
        assert_eq!(order.namespace(), "");
        assert_eq!(order.as_string(), "TYPE:Order");
        assert_eq!(
            order.get_parent_namespace_id(),
            Some(ApplicationFeatureId::new_namespace("").unwrap())
        );
    }

    #[test]
    fn sorts_order_before_names() {
        let mut ids = vec![
            ApplicationFeatureId::new_member("a.B", "c").unwrap(),
            ApplicationFeatureId::new_type("z.Z").unwrap(),
            ApplicationFeatureId::new_namespace("zz").unwrap(),
            ApplicationFeatureId::new_type("a.B").unwrap(),
        ];
        ids.sort();
        let sorts: Vec<_> = ids.iter().map(ApplicationFeatureId::sort).collect();
        assert_eq!(
            sorts,
            vec![
                ApplicationFeatureSort::Namespace,
                ApplicationFeatureSort::Type,
                ApplicationFeatureSort::Type,
                ApplicationFeatureSort::Member,
            ]
        );
        assert_eq!(ids[1].type_simple_name(), Some("B"));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(
            ApplicationFeatureId::parse("com.acme.Order"),
            Err(FeatureIdParseError::MissingSort("com.acme.Order".to_owned()))
        );
        assert_eq!(
            ApplicationFeatureId::parse("CLASS:com.acme.Order"),
            Err(FeatureIdParseError::UnknownSort("CLASS".to_owned()))
        );
        assert!(matches!(
            ApplicationFeatureId::parse("TYPE:com.acme."),
            Err(FeatureIdParseError::MissingTypeName(_))
        ));
        assert!(matches!(
            ApplicationFeatureId::parse("MEMBER:com.acme.Order"),
            Err(FeatureIdParseError::MissingMemberName(_))
        ));
        assert!(matches!(
            ApplicationFeatureId::parse("MEMBER:com.acme.Order#"),
            Err(FeatureIdParseError::MissingMemberName(_))
        ));
        assert!(matches!(
            ApplicationFeatureId::parse("TYPE:com.acme.Order#submit"),
            Err(FeatureIdParseError::MisplacedMemberSeparator(_))
        ));
        assert!(matches!(
            ApplicationFeatureId::parse_encoded("not base64!"),
            Err(FeatureIdParseError::Base64(_))
        ));
    }

    #[test]
    fn constructors_reject_ids_their_wire_form_cannot_carry() {
        assert_eq!(
            ApplicationFeatureId::new_type(""),
            Err(FeatureIdParseError::MissingTypeName("TYPE:".to_owned()))
        );
        assert!(matches!(
            ApplicationFeatureId::new_type("com.acme."),
            Err(FeatureIdParseError::MissingTypeName(_))
        ));
        assert_eq!(
            ApplicationFeatureId::new_member("com.acme.Order", ""),
            Err(FeatureIdParseError::MissingMemberName(
                "MEMBER:com.acme.Order#".to_owned()
            ))
        );
        assert_eq!(
            ApplicationFeatureId::new_namespace("com#acme"),
            Err(FeatureIdParseError::MisplacedMemberSeparator(
                "NAMESPACE:com#acme".to_owned()
            ))
        );
        assert!(matches!(
            ApplicationFeatureId::new_member("com.acme.Order#x", "submit"),
            Err(FeatureIdParseError::MisplacedMemberSeparator(_))
        ));

        let odd = ApplicationFeatureId::new_member("Order", "a#b.c").unwrap();
        assert_eq!(ApplicationFeatureId::parse(&odd.as_string()), Ok(odd));
    }

    #[test]
    fn serializes_as_the_plain_form() {
        let id = ApplicationFeatureId::new_member("com.acme.Order", "submit").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"MEMBER:com.acme.Order#submit\"");
        let back: ApplicationFeatureId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ApplicationFeatureId>("\"TYPE:\"").is_err());
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_$]{0,8}"
    }

    fn namespace() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 0..4).prop_map(|parts| parts.join("."))
    }

    fn feature_id() -> impl Strategy<Value = ApplicationFeatureId> {
        prop_oneof![
            namespace().prop_map(|ns| ApplicationFeatureId::new_namespace(ns).unwrap()),
            (namespace(), segment())
                .prop_map(|(ns, name)| ApplicationFeatureId::new_type(&qualify(&ns, &name)).unwrap()),
            (namespace(), segment(), "[a-z][a-zA-Z0-9#.:]{0,8}").prop_map(|(ns, name, member)| {
                ApplicationFeatureId::new_member(&qualify(&ns, &name), member).unwrap()
            }),
        ]
    }

    /// Arbitrary names, including empty parts and stray separators.
    fn raw_name() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_.#:]{0,12}"
    }

    fn constructed_id() -> impl Strategy<Value = Result<ApplicationFeatureId, FeatureIdParseError>> {
        prop_oneof![
            raw_name().prop_map(ApplicationFeatureId::new_namespace),
            raw_name().prop_map(|name| ApplicationFeatureId::new_type(&name)),
            (raw_name(), raw_name())
                .prop_map(|(name, member)| ApplicationFeatureId::new_member(&name, member)),
        ]
    }

    fn name_part(id: &ApplicationFeatureId) -> String {
        let plain = id.as_string();
        plain[id.sort().as_str().len() + 1..].to_owned()
    }

    proptest! {
        #[test]
        fn plain_form_round_trips(id in feature_id()) {
            prop_assert_eq!(ApplicationFeatureId::parse(&id.as_string()).unwrap(), id);
        }

        #[test]
        fn every_constructed_id_round_trips(id in constructed_id()) {
            if let Ok(id) = id {
                prop_assert_eq!(ApplicationFeatureId::parse(&id.as_string()), Ok(id.clone()));
                prop_assert_eq!(ApplicationFeatureId::parse_encoded(&id.as_encoded_string()), Ok(id));
            }
        }

        #[test]
        fn encoded_form_round_trips(id in feature_id()) {
            let encoded = id.as_encoded_string();
            prop_assert!(!encoded.contains('+') && !encoded.contains('/'));
            prop_assert_eq!(ApplicationFeatureId::parse_encoded(&encoded).unwrap(), id);
        }

        #[test]
        fn ancestors_are_name_prefixes(id in feature_id()) {
            let name = name_part(&id);
            for ancestor in id.ancestors() {
                prop_assert!(ancestor.sort() <= id.sort());
                prop_assert!(name.starts_with(&name_part(&ancestor)));
            }
        }
    }
}
