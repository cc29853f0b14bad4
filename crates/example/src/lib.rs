//! Example order domain introspected with Kestrel.
//!
//! The domain is a handful of classes described through the class model:
//!
//! ```text
//! AbstractEntity ◀── Order ──▶ Customer
//!                      │  ▲
//!                  lines │  │ order
//!                      ▼  │
//!                    OrderLine
//!
//! Order_cancel  (mixin, contributes `cancel` to Order)
//! OrderRepository (service)
//! ```
//!
//! [`render_specifications`] and [`render_features`] turn the booted
//! metamodel into text.

use std::fmt::Write as _;

use kestrel_features::feature::ApplicationMemberSort;
use kestrel_features::repository::ApplicationFeatureRepository;
use kestrel_metamodel::class::{
    Annotation, ClassDescriptor, InMemoryClassRepository, MethodDescriptor, PrimitiveType, TypeRef,
    Where, builtin,
};
use kestrel_metamodel::ident::ClassName;
use kestrel_metamodel::loader::SpecificationLoader;
use kestrel_metamodel::member::Member;
use kestrel_metamodel::spec::{BeanSort, Depth};

/// Base class of every entity.
pub const ABSTRACT_ENTITY: &str = "com.acme.AbstractEntity";
/// A customer.
pub const CUSTOMER: &str = "com.acme.Customer";
/// An order.
pub const ORDER: &str = "com.acme.Order";
/// A line of an order.
pub const ORDER_LINE: &str = "com.acme.OrderLine";
/// Mixin contributing `cancel` to orders.
pub const ORDER_CANCEL: &str = "com.acme.Order_cancel";
/// Finder service for orders.
pub const ORDER_REPOSITORY: &str = "com.acme.OrderRepository";

/// The order domain on top of the builtin types.
#[must_use]
pub fn domain() -> InMemoryClassRepository {
    InMemoryClassRepository::with_builtins()
        .with(
            ClassDescriptor::class(ABSTRACT_ENTITY)
                .into_abstract()
                .getter("getId", TypeRef::Primitive(PrimitiveType::Long)),
        )
        .with(
            ClassDescriptor::class(CUSTOMER)
                .extends(ABSTRACT_ENTITY)
                .annotate(Annotation::entity())
                .getter("getName", TypeRef::class(builtin::STRING))
                .getter("getEmail", TypeRef::class(builtin::STRING)),
        )
        .with(
            ClassDescriptor::class(ORDER)
                .extends(ABSTRACT_ENTITY)
                .annotate(Annotation::entity())
                .getter("getNumber", TypeRef::class(builtin::STRING))
                .getter("getPlacedOn", TypeRef::class(builtin::LOCAL_DATE))
                .getter("getCustomer", TypeRef::class(CUSTOMER))
                .method(MethodDescriptor::new("setCustomer").param("customer", TypeRef::class(CUSTOMER)))
                .getter("getLines", TypeRef::list(TypeRef::class(ORDER_LINE)))
                .method(MethodDescriptor::new("addToLines").param("line", TypeRef::class(ORDER_LINE)))
                .method(
                    MethodDescriptor::getter("getAuditTrail", TypeRef::class(builtin::STRING))
                        .annotate(Annotation::Hidden(Where::Everywhere)),
                )
                .method(MethodDescriptor::new("submit"))
                .method(MethodDescriptor::getter("hideSubmit", TypeRef::Primitive(PrimitiveType::Boolean))),
        )
        .with(
            ClassDescriptor::class(ORDER_LINE)
                .extends(ABSTRACT_ENTITY)
                .annotate(Annotation::entity())
                .getter("getOrder", TypeRef::class(ORDER))
                .getter("getProduct", TypeRef::class(builtin::STRING))
                .getter("getQuantity", TypeRef::Primitive(PrimitiveType::Int)),
        )
        .with(
            ClassDescriptor::class(ORDER_CANCEL)
                .annotate(Annotation::Mixin {
                    mixee: ClassName::new(ORDER),
                    method: "act".to_owned(),
                })
                .method(MethodDescriptor::new("act").param("reason", TypeRef::class(builtin::STRING))),
        )
        .with(
            ClassDescriptor::class(ORDER_REPOSITORY)
                .annotate(Annotation::service())
                .method(
                    MethodDescriptor::new("findByNumber")
                        .param("number", TypeRef::class(builtin::STRING))
                        .returns(TypeRef::class(ORDER)),
                )
                .method(MethodDescriptor::new("recent").returns(TypeRef::list(TypeRef::class(ORDER)))),
        )
}

fn sort_label(sort: BeanSort) -> &'static str {
    match sort {
        BeanSort::Vetoed => "vetoed",
        BeanSort::Value => "value",
        BeanSort::Collection => "collection",
        BeanSort::Service => "service",
        BeanSort::Mixin => "mixin",
        BeanSort::Entity => "entity",
        BeanSort::ViewModel => "view model",
        BeanSort::Abstract => "abstract",
        BeanSort::Unknown => "unknown",
    }
}

/// One block per non-value specification: its sort, supertypes,
/// subclasses and members.
#[must_use]
pub fn render_specifications(loader: &SpecificationLoader) -> String {
    let mut out = String::new();
    for spec in loader.snapshot() {
        if matches!(spec.bean_sort(), BeanSort::Value | BeanSort::Collection | BeanSort::Unknown) {
            continue;
        }
        let _ = writeln!(out, "{} ({})", spec.logical_type_name(), sort_label(spec.bean_sort()));
        if let Some(superclass) = spec.superclass() {
            let _ = writeln!(out, "  extends {}", superclass.logical_type_name());
        }
        let subclasses = spec.subclasses(Depth::Direct);
        if !subclasses.is_empty() {
            let names: Vec<_> = subclasses.iter().map(|sub| sub.logical_type_name()).collect();
            let _ = writeln!(out, "  subclasses {}", names.join(", "));
        }
        for member in spec.members().iter() {
            let kind = match ApplicationMemberSort::of(member.feature_type()) {
                Some(ApplicationMemberSort::Property) => "property",
                Some(ApplicationMemberSort::Collection) => "collection",
                Some(ApplicationMemberSort::Action) | None => "action",
            };
            let mut flags = String::new();
            if member.is_mixed_in() {
                flags.push_str(" [mixin]");
            }
            if member.is_always_hidden() {
                flags.push_str(" [hidden]");
            }
            let _ = writeln!(
                out,
                "  {kind:<10} {:<12} {}{flags}",
                member.id(),
                member.element_type()
            );
        }
    }
    out
}

/// The feature tree: namespaces, their types and each type's members.
#[must_use]
pub fn render_features(features: &ApplicationFeatureRepository) -> String {
    let mut out = String::new();
    for namespace in features.namespaces() {
        let name = namespace.id().namespace();
        let types = features.types_in_namespace(name);
        if types.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{name}");
        for feature in types {
            let logical_name = feature.id().logical_type_name().unwrap_or_default();
            let _ = writeln!(out, "  {}", feature.id().type_simple_name().unwrap_or_default());
            for sort in [
                ApplicationMemberSort::Property,
                ApplicationMemberSort::Collection,
                ApplicationMemberSort::Action,
            ] {
                for member in features.members_of(&logical_name, sort) {
                    let _ = writeln!(
                        out,
                        "    {:?} {}",
                        sort,
                        member.id().member_name().unwrap_or_default()
                    );
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn loader() -> Arc<SpecificationLoader> {
        let loader = SpecificationLoader::with_defaults(Arc::new(domain()));
        loader.introspect_all();
        Arc::new(loader)
    }

    #[test]
    fn domain_validates() {
        assert_eq!(loader().validate(), Ok(()));
    }

    #[test]
    fn specifications_render_members_and_hierarchy() {
        let text = render_specifications(&loader());
        assert!(text.contains("com.acme.Order (entity)"));
        assert!(text.contains("  extends com.acme.AbstractEntity"));
        assert!(text.contains("[mixin]"));
        assert!(text.contains("auditTrail"));
        assert!(!text.contains("java.lang.String (value)"));
    }

    #[test]
    fn features_leave_hidden_members_out() {
        let features = ApplicationFeatureRepository::new(loader());
        let text = render_features(&features);
        assert!(text.starts_with("com.acme\n"));
        assert!(text.contains("    Action cancel"));
        assert!(text.contains("    Collection lines"));
        assert!(!text.contains("auditTrail"));
    }
}
