//! Specification loader: caching, lookup, reload and triggers.

mod common;

use std::sync::Arc;

use common::*;
use kestrel_metamodel::class::{
    Annotation, ClassDescriptor, InMemoryClassRepository, Nature, TypeRef, builtin,
};
use kestrel_metamodel::config::MetaModelConfig;
use kestrel_metamodel::error::MetaModelError;
use kestrel_metamodel::ident::ClassName;
use kestrel_metamodel::member::Member;
use kestrel_metamodel::partition::MethodKey;
use kestrel_metamodel::spec::{Depth, IntrospectionState};
use kestrel_metamodel::trigger::TriggerCause;

#[test]
fn loading_twice_returns_the_same_specification() {
    let repository = order_domain();
    let loader = loader(&repository);
    let first = loader.load_specification(&class(ORDER)).unwrap();
    let second = loader.load_specification(&class(ORDER)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.state(), IntrospectionState::FullyIntrospected);
}

#[test]
fn completing_twice_is_an_error() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();
    assert!(matches!(
        order.complete_introspection(),
        Err(MetaModelError::AlreadyIntrospected(name)) if name.as_str() == ORDER
    ));
}

#[test]
fn supertypes_are_only_type_introspected_on_demand() {
    let repository = order_domain();
    let loader = loader(&repository);
    loader.load_specification(&class(ORDER_LINE)).unwrap();

    let order = loader.lookup(&class(ORDER)).unwrap();
    assert!(order.state() >= IntrospectionState::TypeIntrospected);
    assert!(loader.lookup(&class(CUSTOMER)).is_none());
}

#[test]
fn reload_rebuilds_only_the_reloaded_type() {
    let repository = order_domain();
    let loader = loader(&repository);
    let customer = loader.load_specification(&class(CUSTOMER)).unwrap();
    let order = loader.load_specification(&class(ORDER)).unwrap();
    assert!(order.get_member("notes").is_none());

    repository.replace(order_descriptor_with_notes());
    let reloaded = loader.reload(&class(ORDER)).unwrap();

    assert!(!Arc::ptr_eq(&order, &reloaded));
    assert!(reloaded.get_member("notes").is_some());
    assert_eq!(reloaded.trigger().cause, TriggerCause::Reload);
    assert!(Arc::ptr_eq(
        &customer,
        &loader.load_specification(&class(CUSTOMER)).unwrap()
    ));
    assert_eq!(
        customer.properties().iter().map(Member::id).collect::<Vec<_>>(),
        vec!["name", "email"]
    );

    let abstract_entity = loader.lookup(&class(ABSTRACT_ENTITY)).unwrap();
    let subclasses = abstract_entity.subclasses(Depth::Direct);
    assert_eq!(subclasses.len(), 1);
    assert!(Arc::ptr_eq(&subclasses[0], &reloaded));
}

fn order_descriptor_with_notes() -> ClassDescriptor {
    order().getter("getNotes", TypeRef::class(builtin::STRING))
}

#[test]
fn reloading_a_removed_class_fails_and_keeps_the_old_specification() {
    let repository = order_domain();
    let loader = loader(&repository);
    let customer = loader.load_specification(&class(CUSTOMER)).unwrap();

    repository.remove(&class(CUSTOMER));
    assert!(matches!(
        loader.reload(&class(CUSTOMER)),
        Err(MetaModelError::ClassNotFound(_))
    ));
    assert!(Arc::ptr_eq(&customer, &loader.lookup(&class(CUSTOMER)).unwrap()));
}

#[test]
fn logical_type_names_resolve_lazily() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins().with(
            ClassDescriptor::class("com.acme.billing.Invoice").annotate(Annotation::DomainObject {
                nature: Nature::Entity,
                logical_type_name: Some("billing.Invoice".to_owned()),
                introspection: None,
            }),
        ),
    );
    let loader = loader(&repository);

    let invoice = loader
        .specification_for_logical_type_name("billing.Invoice")
        .unwrap();
    assert_eq!(invoice.class().as_str(), "com.acme.billing.Invoice");
    assert_eq!(invoice.logical_type_name(), "billing.Invoice");
    assert!(invoice.is_fully_introspected());

    let again = loader
        .specification_for_logical_type_name_else_fail("billing.Invoice")
        .unwrap();
    assert!(Arc::ptr_eq(&invoice, &again));

    assert!(matches!(
        loader.specification_for_logical_type_name_else_fail("billing.Missing"),
        Err(MetaModelError::LogicalTypeNotFound(name)) if name == "billing.Missing"
    ));
}

#[test]
fn trigger_log_records_why_types_were_loaded() {
    let repository = order_domain();
    let loader = loader_with(&repository, MetaModelConfig::default().with_trigger_log(64));
    loader.load_specification(&class(ORDER)).unwrap();

    let records = loader.trigger_log();
    assert_eq!(records[0].class.as_str(), ORDER);
    assert_eq!(records[0].trigger.cause, TriggerCause::Request);
    assert!(records.iter().any(|record| {
        record.class.as_str() == ABSTRACT_ENTITY
            && record.trigger.cause == TriggerCause::Superclass
            && record.trigger.class.as_ref().map(ClassName::as_str) == Some(ORDER)
    }));
    assert!(records.iter().any(|record| {
        record.class.as_str() == builtin::COMPARABLE && record.trigger.cause == TriggerCause::Interface
    }));
    assert!(records.iter().any(|record| {
        record.class.as_str() == ORDER_CANCEL && record.trigger.cause == TriggerCause::Mixin
    }));
}

#[test]
fn trigger_log_keeps_the_most_recent_records() {
    let repository = order_domain();
    let loader = loader_with(&repository, MetaModelConfig::default().with_trigger_log(2));
    loader.introspect_all();
    assert_eq!(loader.trigger_log().len(), 2);
}

#[test]
fn members_are_found_by_their_method() {
    let repository = order_domain();
    let loader = loader(&repository);
    loader.load_specification(&class(ORDER)).unwrap();

    let submit = loader
        .member_for_method(&MethodKey::new(ORDER, "submit()"))
        .unwrap();
    assert_eq!(submit.id(), "submit");
    assert!(submit.as_action().is_some());

    let id = loader
        .member_for_method(&MethodKey::new(ABSTRACT_ENTITY, "getId()"))
        .unwrap();
    assert_eq!(id.id(), "id");

    assert!(
        loader
            .member_for_method(&MethodKey::new(ORDER, "setCustomer(com.acme.Customer)"))
            .is_none()
    );
}

#[test]
fn eager_introspection_covers_the_repository() {
    let repository = order_domain();
    let loader = loader(&repository);
    let snapshot = loader.introspect_all();

    assert_eq!(snapshot.len(), loader.len());
    for name in [ORDER, ORDER_LINE, CUSTOMER, ORDER_CANCEL, ORDER_REPOSITORY, AUDIT_LOG] {
        assert!(snapshot.iter().any(|spec| spec.class().as_str() == name), "{name}");
    }
    assert!(
        loader
            .subclasses(&class(ABSTRACT_ENTITY), Depth::Direct)
            .iter()
            .any(|spec| spec.class().as_str() == ORDER)
    );
}

#[test]
fn clearing_forgets_every_specification() {
    let repository = order_domain();
    let loader = loader(&repository);
    let before = loader.load_specification(&class(ORDER)).unwrap();
    loader.clear();
    assert!(loader.is_empty());

    let after = loader.load_specification(&class(ORDER)).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
}
