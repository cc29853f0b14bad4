//! The method claim partition.
//!
//! Introspection never deletes methods from a working set. Instead every
//! phase claims the methods it consumes, and later phases only look at
//! unclaimed methods. A method is claimed at most once; the finished
//! partition stays on the specification so the decisions can be audited.

use core::fmt;
use std::collections::HashSet;

use crate::class::{ClassDescriptor, ClassRepository, MethodDescriptor};
use crate::ident::ClassName;

/// Identifies a method: declaring class plus signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey {
    /// Class that declares the method.
    pub declaring: ClassName,
    /// `name(T1,T2)`.
    pub signature: String,
}

impl MethodKey {
    /// Creates a method key.
    #[must_use]
    pub fn new(declaring: impl Into<ClassName>, signature: impl Into<String>) -> Self {
        Self {
            declaring: declaring.into(),
            signature: signature.into(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.declaring, self.signature)
    }
}

/// A method visible on the class being introspected, declared there or
/// inherited along the superclass chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedMethod {
    /// Position in the class's method list.
    pub index: usize,
    /// Class that declares it (the most derived override).
    pub declaring: ClassName,
    /// The method itself.
    pub descriptor: MethodDescriptor,
}

impl ReflectedMethod {
    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The method's key.
    #[must_use]
    pub fn key(&self) -> MethodKey {
        MethodKey::new(self.declaring.clone(), self.descriptor.signature())
    }
}

/// Why a method was claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Consumed by a class-level facet factory.
    ClassFacet {
        /// The factory.
        factory: &'static str,
    },
    /// A legacy static order hint.
    OrderHint,
    /// Deliberately not part of the metamodel.
    Ignored {
        /// Why.
        reason: &'static str,
    },
    /// Accessor of a property.
    Property {
        /// Member id.
        member: String,
    },
    /// Accessor of a collection.
    Collection {
        /// Member id.
        member: String,
    },
    /// An action.
    Action {
        /// Member id.
        member: String,
    },
    /// Supporting method of a member or parameter.
    Supporting {
        /// Member id.
        member: String,
        /// The factory that claimed it.
        factory: &'static str,
    },
    /// A member candidate whose types could not be resolved.
    Rejected {
        /// Why.
        reason: String,
    },
}

/// Introspection phase in which a claim was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaimPhase {
    /// Class-level facet processing.
    ClassFacets,
    /// Collection discovery.
    Collections,
    /// Property discovery.
    Properties,
    /// Action discovery.
    Actions,
    /// Mixin main methods.
    Mixins,
}

/// A claim and the phase that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    /// Phase.
    pub phase: ClaimPhase,
    /// Claim.
    pub claim: Claim,
}

/// Every method of a class and who claimed it.
#[derive(Debug, Clone)]
pub struct MethodPartition {
    methods: Vec<ReflectedMethod>,
    claims: Vec<Option<ClaimRecord>>,
    phase: ClaimPhase,
}

impl MethodPartition {
    /// Partition over an explicit method list, nothing claimed yet.
    #[must_use]
    pub fn new(methods: Vec<ReflectedMethod>) -> Self {
        let claims = vec![None; methods.len()];
        Self {
            methods,
            claims,
            phase: ClaimPhase::ClassFacets,
        }
    }

    /// Builds the method list of `descriptor`: inherited methods first,
    /// root-most class first, then declared methods. An override takes the
    /// place of the method it overrides.
    #[must_use]
    pub fn for_class(repository: &dyn ClassRepository, descriptor: &ClassDescriptor) -> Self {
        let mut chain = vec![descriptor.clone()];
        let mut seen = HashSet::from([descriptor.name.clone()]);
        let mut next = descriptor.superclass.clone();
        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                break;
            }
            let Some(parent) = repository.descriptor(&name) else {
                break;
            };
            next = parent.superclass.clone();
            chain.push((*parent).clone());
        }

        let mut methods: Vec<ReflectedMethod> = Vec::new();
        for class in chain.iter().rev() {
            for method in &class.methods {
                let signature = method.signature();
                let reflected = ReflectedMethod {
                    index: 0,
                    declaring: class.name.clone(),
                    descriptor: method.clone(),
                };
                match methods
                    .iter()
                    .position(|m| m.descriptor.signature() == signature)
                {
                    Some(position) => methods[position] = reflected,
                    None => methods.push(reflected),
                }
            }
        }
        for (index, method) in methods.iter_mut().enumerate() {
            method.index = index;
        }
        Self::new(methods)
    }

    /// All methods.
    #[must_use]
    pub fn methods(&self) -> &[ReflectedMethod] {
        &self.methods
    }

    /// The method at `index`.
    #[must_use]
    pub fn method(&self, index: usize) -> &ReflectedMethod {
        &self.methods[index]
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ClaimPhase {
        self.phase
    }

    /// Moves to the next phase.
    pub fn set_phase(&mut self, phase: ClaimPhase) {
        self.phase = phase;
    }

    /// Claims a method. Returns false, changing nothing, if it was already
    /// claimed.
    pub fn claim(&mut self, index: usize, claim: Claim) -> bool {
        if self.claims[index].is_some() {
            return false;
        }
        self.claims[index] = Some(ClaimRecord {
            phase: self.phase,
            claim,
        });
        true
    }

    /// The claim on a method.
    #[must_use]
    pub fn claim_of(&self, index: usize) -> Option<&ClaimRecord> {
        self.claims[index].as_ref()
    }

    /// Returns true if the method is claimed.
    #[must_use]
    pub fn is_claimed(&self, index: usize) -> bool {
        self.claims[index].is_some()
    }

    /// Unclaimed methods, in method-list order.
    pub fn unclaimed(&self) -> impl Iterator<Item = &ReflectedMethod> {
        self.methods
            .iter()
            .filter(|method| self.claims[method.index].is_none())
    }

    /// Indices of unclaimed methods.
    #[must_use]
    pub fn unclaimed_indices(&self) -> Vec<usize> {
        self.unclaimed().map(|method| method.index).collect()
    }

    /// First unclaimed method named `name` satisfying `accept`.
    #[must_use]
    pub fn find_unclaimed(
        &self,
        name: &str,
        accept: impl Fn(&MethodDescriptor) -> bool,
    ) -> Option<usize> {
        self.unclaimed()
            .find(|method| method.name() == name && accept(&method.descriptor))
            .map(|method| method.index)
    }

    /// Methods claimed during `phase`.
    pub fn claimed_in(&self, phase: ClaimPhase) -> impl Iterator<Item = (&ReflectedMethod, &Claim)> {
        self.methods.iter().filter_map(move |method| {
            self.claims[method.index]
                .as_ref()
                .filter(|record| record.phase == phase)
                .map(|record| (method, &record.claim))
        })
    }

    /// Number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if the class has no methods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{InMemoryClassRepository, TypeRef, builtin};

    fn repository() -> InMemoryClassRepository {
        InMemoryClassRepository::with_builtins()
            .with(
                ClassDescriptor::class("com.acme.Base")
                    .getter("getName", TypeRef::class(builtin::STRING))
                    .getter("getCode", TypeRef::class(builtin::STRING)),
            )
            .with(
                ClassDescriptor::class("com.acme.Derived")
                    .extends("com.acme.Base")
                    .getter("getName", TypeRef::class(builtin::STRING))
                    .getter("getExtra", TypeRef::class(builtin::STRING)),
            )
    }

    #[test]
    fn inherited_methods_come_first_and_overrides_shadow() {
        let repository = repository();
        let derived = repository.descriptor(&ClassName::new("com.acme.Derived")).unwrap();
        let partition = MethodPartition::for_class(&repository, &derived);

        let names: Vec<_> = partition
            .methods()
            .iter()
            .map(|m| (m.declaring.as_str(), m.name()))
            .collect();
        assert_eq!(
            names,
            vec![
                (builtin::OBJECT, "toString"),
                (builtin::OBJECT, "equals"),
                (builtin::OBJECT, "hashCode"),
                ("com.acme.Derived", "getName"),
                ("com.acme.Base", "getCode"),
                ("com.acme.Derived", "getExtra"),
            ]
        );
        assert!(partition.methods().iter().enumerate().all(|(i, m)| m.index == i));
    }

    #[test]
    fn methods_are_claimed_at_most_once() {
        let repository = repository();
        let base = repository.descriptor(&ClassName::new("com.acme.Base")).unwrap();
        let mut partition = MethodPartition::for_class(&repository, &base);
        let get_name = partition.find_unclaimed("getName", |_| true).unwrap();

        partition.set_phase(ClaimPhase::Properties);
        assert!(partition.claim(get_name, Claim::Property { member: "name".into() }));
        partition.set_phase(ClaimPhase::Actions);
        assert!(!partition.claim(get_name, Claim::Action { member: "getName".into() }));

        let record = partition.claim_of(get_name).unwrap();
        assert_eq!(record.phase, ClaimPhase::Properties);
        assert!(partition.find_unclaimed("getName", |_| true).is_none());
        assert_eq!(partition.claimed_in(ClaimPhase::Properties).count(), 1);
        assert_eq!(partition.claimed_in(ClaimPhase::Actions).count(), 0);
    }

    #[test]
    fn method_keys_name_the_declaring_class() {
        let repository = repository();
        let derived = repository.descriptor(&ClassName::new("com.acme.Derived")).unwrap();
        let partition = MethodPartition::for_class(&repository, &derived);
        let code = partition.find_unclaimed("getCode", |_| true).unwrap();
        assert_eq!(
            partition.method(code).key().to_string(),
            "com.acme.Base#getCode()"
        );
    }
}
