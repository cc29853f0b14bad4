//! Navigating the specification graph.
//!
//! Forward links are class names resolved through the registry; the
//! reverse links live in the registry's subclass index. Specifications
//! reached through these methods are at least type-introspected.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::{IntrospectionState, ObjectSpecification};
use crate::class::{PrimitiveType, builtin};
use crate::ident::ClassName;
use crate::trigger::{IntrospectionTrigger, TriggerCause};

/// How far to follow the subclass index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Direct subclasses only.
    Direct,
    /// All descendants.
    Transitive,
}

impl ObjectSpecification {
    fn resolve_related(&self, name: &ClassName, cause: TriggerCause) -> Option<Arc<Self>> {
        let registry = self.registry()?;
        registry.resolve(
            name,
            IntrospectionState::TypeIntrospected,
            IntrospectionTrigger::from_class(cause, self.class()),
        )
    }

    fn supertype_names(&self) -> impl Iterator<Item = &ClassName> {
        self.superclass_name().into_iter().chain(self.interface_names())
    }

    /// The superclass. `None` at the root, for interfaces, primitives and
    /// arrays.
    #[must_use]
    pub fn superclass(&self) -> Option<Arc<Self>> {
        let name = self.superclass_name()?;
        self.resolve_related(name, TriggerCause::Superclass)
    }

    /// Declared interfaces that could be loaded.
    #[must_use]
    pub fn interfaces(&self) -> Vec<Arc<Self>> {
        self.interface_names()
            .iter()
            .filter_map(|name| self.resolve_related(name, TriggerCause::Interface))
            .collect()
    }

    /// Known subclasses and implementors, in registration order.
    #[must_use]
    pub fn subclasses(&self, depth: Depth) -> Vec<Arc<Self>> {
        let Some(registry) = self.registry() else {
            return Vec::new();
        };
        let mut seen = HashSet::from([self.class().clone()]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([self.class().clone()]);
        while let Some(class) = queue.pop_front() {
            for child in registry.subclass_names(&class) {
                if !seen.insert(child.clone()) {
                    continue;
                }
                if let Some(spec) = registry.cached(&child) {
                    out.push(spec);
                }
                if depth == Depth::Transitive {
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// Returns true if values of this type can be used where `other` is
    /// expected. Reflexive and transitive; every non-primitive type is of
    /// the root type; arrays are covariant.
    #[must_use]
    pub fn is_of_type(&self, other: &Self) -> bool {
        self.is_of_type_name(other.class())
    }

    fn is_of_type_name(&self, other: &ClassName) -> bool {
        if self.class() == other {
            return true;
        }
        if other.as_str() == builtin::OBJECT {
            return !self.is_primitive();
        }
        if let Some(element) = self.element_type() {
            let Some(other_element) = other.component() else {
                return false;
            };
            if builtin::is_primitive(element) || builtin::is_primitive(&other_element) {
                return *element == other_element;
            }
            return self
                .resolve_related(element, TriggerCause::MemberType)
                .is_some_and(|spec| spec.is_of_type_name(&other_element));
        }

        let mut seen = HashSet::from([self.class().clone()]);
        let mut queue: VecDeque<ClassName> = self.supertype_names().cloned().collect();
        while let Some(name) = queue.pop_front() {
            if name == *other {
                return true;
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(spec) = self.resolve_related(&name, TriggerCause::Superclass) {
                queue.extend(spec.supertype_names().cloned());
            }
        }
        false
    }

    /// Like [`is_of_type`](Self::is_of_type), with primitives on either
    /// side replaced by their wrapper types first.
    #[must_use]
    pub fn is_of_type_resolve_primitive(&self, other: &Self) -> bool {
        let wrapper = |spec: &Self| {
            PrimitiveType::from_name(spec.class().as_str())
                .map(|primitive| ClassName::new(primitive.wrapper()))
        };
        let target = wrapper(other).unwrap_or_else(|| other.class().clone());
        match wrapper(self) {
            Some(own) => self
                .resolve_related(&own, TriggerCause::Superclass)
                .is_some_and(|spec| spec.is_of_type_name(&target)),
            None => self.is_of_type_name(&target),
        }
    }

    /// This type followed by its superclass chain. Stops at the root or
    /// at the first class seen twice.
    #[must_use]
    pub fn type_hierarchy(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut seen = HashSet::from([self.class().clone()]);
        let mut chain = vec![Arc::clone(self)];
        let mut next = self.superclass();
        while let Some(spec) = next {
            if !seen.insert(spec.class().clone()) {
                break;
            }
            next = spec.superclass();
            chain.push(spec);
        }
        chain
    }

    /// The superclass chain, ending at the root type for every
    /// non-primitive type (interfaces and arrays included).
    fn chain_to_root(self: &Arc<Self>) -> Vec<Arc<Self>> {
        let mut chain = self.type_hierarchy();
        let ends_at_root = chain
            .last()
            .is_some_and(|spec| spec.class().as_str() == builtin::OBJECT);
        if !ends_at_root
            && !self.is_primitive()
            && let Some(root) =
                self.resolve_related(&ClassName::new(builtin::OBJECT), TriggerCause::Superclass)
        {
            chain.push(root);
        }
        chain
    }

    /// The most specific type both `a` and `b` are of. Symmetric.
    ///
    /// # Panics
    ///
    /// Panics if the two types share no ancestor, which only happens for a
    /// primitive paired with a different type.
    #[must_use]
    pub fn common_super_type(a: &Arc<Self>, b: &Arc<Self>) -> Arc<Self> {
        if a.is_of_type(b) {
            return Arc::clone(b);
        }
        if b.is_of_type(a) {
            return Arc::clone(a);
        }
        a.chain_to_root()
            .into_iter()
            .find(|candidate| b.is_of_type(candidate))
            .unwrap_or_else(|| panic!("{} and {} have no common super type", a.class(), b.class()))
    }
}
