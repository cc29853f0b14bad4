//! Metamodel validation.
//!
//! Problems in the domain model itself (as opposed to lookup misses) are
//! collected rather than raised one at a time, so a broken model reports
//! everything wrong with it in one go.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::ident::ClassName;
use crate::member::Member;
use crate::spec::ObjectSpecification;

/// A problem found in the metamodel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    /// Services may only expose an association named `id`.
    #[error("service {service} exposes associations {members:?}")]
    ServiceHasAssociations {
        /// The service class.
        service: ClassName,
        /// Offending association ids.
        members: Vec<String>,
    },

    /// Two methods map to the same member id.
    #[error("{class}: member id {member:?} is ambiguous")]
    AmbiguousMember {
        /// The introspected class.
        class: ClassName,
        /// The contested id.
        member: String,
    },

    /// A supporting method whose member does not exist.
    #[error("{class}: supporting method {method:?} has no member")]
    OrphanedSupportingMethod {
        /// The introspected class.
        class: ClassName,
        /// The method signature.
        method: String,
    },

    /// More than one class carries the same logical type name.
    #[error("logical type name {logical_name:?} is used by {classes:?}")]
    DuplicateLogicalTypeName {
        /// The shared name.
        logical_name: String,
        /// Every class using it.
        classes: Vec<ClassName>,
    },

    /// A mixin without its main method.
    #[error("mixin {mixin} has no main method {method:?}")]
    MixinMainMethodMissing {
        /// The mixin class.
        mixin: ClassName,
        /// The expected method name.
        method: String,
    },

    /// A layout order names a member that does not exist.
    #[error("{class}: member order names unknown member {member:?}")]
    UnknownMemberInOrder {
        /// The introspected class.
        class: ClassName,
        /// The unknown id.
        member: String,
    },

    /// The class's supertypes lead back to itself.
    #[error("{class} is on a cyclic type hierarchy")]
    CyclicHierarchy {
        /// A class on the cycle.
        class: ClassName,
    },
}

/// Checks a snapshot of fully introspected specifications.
pub struct MetaModelValidator<'a> {
    specs: &'a [Arc<ObjectSpecification>],
    cycles: &'a [ClassName],
}

impl<'a> MetaModelValidator<'a> {
    /// Creates a validator over `specs`. `cycles` lists classes the loader
    /// found on cyclic hierarchies.
    #[must_use]
    pub fn new(specs: &'a [Arc<ObjectSpecification>], cycles: &'a [ClassName]) -> Self {
        Self { specs, cycles }
    }

    /// Runs every check.
    ///
    /// # Errors
    ///
    /// All failures found, grouped per class in snapshot order, followed by
    /// duplicate logical names and cycles.
    pub fn validate(&self) -> Result<(), Vec<ValidationFailure>> {
        let mut failures = Vec::new();

        for spec in self.specs {
            let Ok(members) = spec.try_members() else {
                continue;
            };
            let class = spec.class();

            if spec.is_service() {
                let associations: Vec<String> = members
                    .associations()
                    .iter()
                    .filter(|member| member.id() != "id")
                    .map(|member| member.id().to_owned())
                    .collect();
                if !associations.is_empty() {
                    failures.push(ValidationFailure::ServiceHasAssociations {
                        service: class.clone(),
                        members: associations,
                    });
                }
            }

            for member in members.ambiguities() {
                failures.push(ValidationFailure::AmbiguousMember {
                    class: class.clone(),
                    member: member.clone(),
                });
            }
            for method in members.orphans() {
                failures.push(ValidationFailure::OrphanedSupportingMethod {
                    class: class.clone(),
                    method: method.clone(),
                });
            }
            if let Some(method) = members.missing_mixin_main() {
                failures.push(ValidationFailure::MixinMainMethodMissing {
                    mixin: class.clone(),
                    method: method.to_owned(),
                });
            }
            for member in members.unknown_in_order() {
                failures.push(ValidationFailure::UnknownMemberInOrder {
                    class: class.clone(),
                    member: member.clone(),
                });
            }
        }

        let mut by_logical_name: IndexMap<&str, Vec<ClassName>> = IndexMap::new();
        for spec in self.specs {
            by_logical_name
                .entry(spec.logical_type_name())
                .or_default()
                .push(spec.class().clone());
        }
        for (logical_name, classes) in by_logical_name {
            if classes.len() > 1 {
                failures.push(ValidationFailure::DuplicateLogicalTypeName {
                    logical_name: logical_name.to_owned(),
                    classes,
                });
            }
        }

        failures.extend(
            self.cycles
                .iter()
                .map(|class| ValidationFailure::CyclicHierarchy { class: class.clone() }),
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}
