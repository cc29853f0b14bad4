//! Shared fixtures for metamodel integration tests: a small order domain.

use std::sync::Arc;

use kestrel_metamodel::class::{
    Annotation, ClassDescriptor, ClassRepository, InMemoryClassRepository, MethodDescriptor,
    PrimitiveType, TypeRef, builtin,
};
use kestrel_metamodel::config::MetaModelConfig;
use kestrel_metamodel::facet::ProgrammingModel;
use kestrel_metamodel::ident::ClassName;
use kestrel_metamodel::loader::SpecificationLoader;

pub const ABSTRACT_ENTITY: &str = "com.acme.AbstractEntity";
pub const CUSTOMER: &str = "com.acme.Customer";
pub const ORDER: &str = "com.acme.Order";
pub const ORDER_LINE: &str = "com.acme.OrderLine";
pub const ORDER_CANCEL: &str = "com.acme.Order_cancel";
pub const ORDER_REPOSITORY: &str = "com.acme.OrderRepository";
pub const AUDIT_LOG: &str = "com.acme.AuditLog";

pub fn class(name: &str) -> ClassName {
    ClassName::new(name)
}

pub fn abstract_entity() -> ClassDescriptor {
    ClassDescriptor::class(ABSTRACT_ENTITY)
        .into_abstract()
        .getter("getId", TypeRef::Primitive(PrimitiveType::Long))
}

pub fn customer() -> ClassDescriptor {
    ClassDescriptor::class(CUSTOMER)
        .annotate(Annotation::entity())
        .getter("getName", TypeRef::class(builtin::STRING))
        .getter("getEmail", TypeRef::class(builtin::STRING))
}

pub fn order() -> ClassDescriptor {
    ClassDescriptor::class(ORDER)
        .extends(ABSTRACT_ENTITY)
        .implements(builtin::COMPARABLE)
        .annotate(Annotation::entity())
        .getter("getNumber", TypeRef::class(builtin::STRING))
        .getter("getTotal", TypeRef::class(builtin::BIG_DECIMAL))
        .getter("getPlacedOn", TypeRef::class(builtin::LOCAL_DATE))
        .getter("getCustomer", TypeRef::class(CUSTOMER))
        .method(MethodDescriptor::new("setCustomer").param("customer", TypeRef::class(CUSTOMER)))
        .getter("getLines", TypeRef::list(TypeRef::class(ORDER_LINE)))
        .method(MethodDescriptor::new("addToLines").param("line", TypeRef::class(ORDER_LINE)))
        .method(MethodDescriptor::new("submit"))
        .method(MethodDescriptor::getter("hideSubmit", TypeRef::Primitive(PrimitiveType::Boolean)))
        .method(
            MethodDescriptor::new("compareTo")
                .param("other", TypeRef::class(builtin::OBJECT))
                .returns(TypeRef::Primitive(PrimitiveType::Int)),
        )
}

pub fn order_line() -> ClassDescriptor {
    ClassDescriptor::class(ORDER_LINE)
        .annotate(Annotation::entity())
        .getter("getOrder", TypeRef::class(ORDER))
        .getter("getProduct", TypeRef::class(builtin::STRING))
        .getter("getQuantity", TypeRef::Primitive(PrimitiveType::Int))
}

pub fn order_cancel() -> ClassDescriptor {
    ClassDescriptor::class(ORDER_CANCEL)
        .annotate(Annotation::Mixin {
            mixee: class(ORDER),
            method: "act".to_owned(),
        })
        .method(MethodDescriptor::new("act").param("reason", TypeRef::class(builtin::STRING)))
}

pub fn order_repository() -> ClassDescriptor {
    ClassDescriptor::class(ORDER_REPOSITORY)
        .annotate(Annotation::service())
        .method(
            MethodDescriptor::new("findByNumber")
                .param("number", TypeRef::class(builtin::STRING))
                .returns(TypeRef::class(ORDER)),
        )
        .method(MethodDescriptor::new("recent").returns(TypeRef::list(TypeRef::class(ORDER))))
}

pub fn audit_log() -> ClassDescriptor {
    ClassDescriptor::class(AUDIT_LOG).annotate(Annotation::Vetoed)
}

/// The whole order domain on top of the builtins.
pub fn order_domain() -> Arc<InMemoryClassRepository> {
    Arc::new(
        InMemoryClassRepository::with_builtins()
            .with(abstract_entity())
            .with(customer())
            .with(order())
            .with(order_line())
            .with(order_cancel())
            .with(order_repository())
            .with(audit_log()),
    )
}

pub fn loader_with(repository: &Arc<InMemoryClassRepository>, config: MetaModelConfig) -> SpecificationLoader {
    let repository: Arc<dyn ClassRepository> = Arc::clone(repository) as Arc<dyn ClassRepository>;
    SpecificationLoader::new(repository, ProgrammingModel::with_standard_factories(), config)
}

pub fn loader(repository: &Arc<InMemoryClassRepository>) -> SpecificationLoader {
    loader_with(repository, MetaModelConfig::default())
}
