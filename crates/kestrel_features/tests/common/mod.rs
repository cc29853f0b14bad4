//! Shared fixtures for feature tests: a small order domain spread over two
//! namespaces.

use std::sync::Arc;

use kestrel_features::repository::ApplicationFeatureRepository;
use kestrel_metamodel::class::{
    Annotation, ClassDescriptor, InMemoryClassRepository, MethodDescriptor, Nature, PrimitiveType,
    TypeRef, Where, builtin,
};
use kestrel_metamodel::ident::ClassName;
use kestrel_metamodel::loader::SpecificationLoader;

pub const ORDER: &str = "com.acme.Order";
pub const ORDER_LINE: &str = "com.acme.OrderLine";
pub const ORDER_CANCEL: &str = "com.acme.Order_cancel";
pub const ORDER_REPOSITORY: &str = "com.acme.OrderRepository";
pub const INVOICE: &str = "com.acme.billing.Invoice";
pub const SETTINGS: &str = "com.acme.Settings";

pub fn order_domain() -> InMemoryClassRepository {
    InMemoryClassRepository::with_builtins()
        .with(
            ClassDescriptor::class(ORDER)
                .annotate(Annotation::entity())
                .getter("getNumber", TypeRef::class(builtin::STRING))
                .method(
                    MethodDescriptor::getter("getSecret", TypeRef::class(builtin::STRING))
                        .annotate(Annotation::Hidden(Where::Everywhere)),
                )
                .getter("getLines", TypeRef::list(TypeRef::class(ORDER_LINE)))
                .method(MethodDescriptor::new("submit"))
                .method(MethodDescriptor::new("recalculate").annotate(Annotation::Programmatic)),
        )
        .with(
            ClassDescriptor::class(ORDER_LINE)
                .annotate(Annotation::entity())
                .getter("getQuantity", TypeRef::Primitive(PrimitiveType::Int)),
        )
        .with(
            ClassDescriptor::class(ORDER_CANCEL)
                .annotate(Annotation::Mixin {
                    mixee: ClassName::new(ORDER),
                    method: "act".to_owned(),
                })
                .method(MethodDescriptor::new("act")),
        )
        .with(
            ClassDescriptor::class(ORDER_REPOSITORY)
                .annotate(Annotation::service())
                .method(MethodDescriptor::new("recent").returns(TypeRef::list(TypeRef::class(ORDER)))),
        )
        .with(
            ClassDescriptor::class("com.acme.billing.InvoiceImpl").annotate(Annotation::DomainObject {
                nature: Nature::ViewModel,
                logical_type_name: Some(INVOICE.to_owned()),
                introspection: None,
            })
            .getter("getAmount", TypeRef::class(builtin::BIG_DECIMAL)),
        )
        .with(ClassDescriptor::class(SETTINGS).annotate(Annotation::entity()))
}

pub fn features() -> ApplicationFeatureRepository {
    let loader = SpecificationLoader::with_defaults(Arc::new(order_domain()));
    ApplicationFeatureRepository::new(Arc::new(loader))
}
