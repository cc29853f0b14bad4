//! Member discovery over the order domain.

mod common;

use std::sync::Arc;

use common::*;
use kestrel_metamodel::class::{
    Annotation, ClassDescriptor, InMemoryClassRepository, MethodDescriptor, TypeRef, builtin,
};
use kestrel_metamodel::facet::{
    CollectionModifyFacet, CollectionOp, FacetKind, PropertySetterFacet, SupportKind,
    SupportingMethodFacet,
};
use kestrel_metamodel::loader::SpecificationLoader;
use kestrel_metamodel::member::{Member, ObjectMember};
use kestrel_metamodel::partition::Claim;
use kestrel_metamodel::spec::BeanSort;

fn ids<M: Member>(members: &[M]) -> Vec<&str> {
    members.iter().map(Member::id).collect()
}

#[test]
fn getters_become_properties_in_declaration_order() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();

    assert_eq!(
        ids(order.properties()),
        vec!["id", "number", "total", "placedOn", "customer"]
    );
    assert_eq!(ids(order.collections()), vec!["lines"]);

    let total = order.get_property("total").unwrap();
    assert_eq!(total.element_type().as_str(), builtin::BIG_DECIMAL);
    assert_eq!(total.name(), "Total");
    assert_eq!(order.get_property("placedOn").unwrap().name(), "Placed On");
}

#[test]
fn single_getter_yields_one_property_and_no_action() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins().with(
            ClassDescriptor::class("com.acme.Widget").getter("getFoo", TypeRef::class(builtin::STRING)),
        ),
    );
    let loader = loader(&repository);
    let widget = loader.load_specification(&class("com.acme.Widget")).unwrap();

    assert_eq!(ids(widget.properties()), vec!["foo"]);
    assert!(widget.actions().is_empty());
    assert!(widget.get_action("getFoo").is_none());
}

#[test]
fn setters_are_never_actions() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins().with(
            ClassDescriptor::class("com.acme.Widget")
                .method(MethodDescriptor::new("setFoo").param("foo", TypeRef::class("com.acme.Foo"))),
        ),
    );
    let loader = loader(&repository);
    let widget = loader.load_specification(&class("com.acme.Widget")).unwrap();

    assert!(widget.get_member("setFoo").is_none());
    assert!(widget.actions().is_empty());
    let partition = widget.method_partition();
    let setter = partition.methods().iter().find(|m| m.name() == "setFoo").unwrap();
    assert!(matches!(
        partition.claim_of(setter.index).map(|record| &record.claim),
        Some(Claim::Ignored { .. })
    ));
}

#[test]
fn setters_of_any_arity_are_never_actions() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins().with(
            ClassDescriptor::class("com.acme.Widget")
                .method(MethodDescriptor::new("setUp"))
                .method(
                    MethodDescriptor::new("setRange")
                        .param("from", TypeRef::class(builtin::STRING))
                        .param("to", TypeRef::class(builtin::STRING)),
                )
                .method(MethodDescriptor::new("ship")),
        ),
    );
    let loader = loader(&repository);
    let widget = loader.load_specification(&class("com.acme.Widget")).unwrap();

    assert_eq!(ids(widget.actions()), vec!["ship"]);
    let partition = widget.method_partition();
    for name in ["setUp", "setRange"] {
        let method = partition.methods().iter().find(|m| m.name() == name).unwrap();
        assert!(
            matches!(
                partition.claim_of(method.index).map(|record| &record.claim),
                Some(Claim::Ignored { .. })
            ),
            "{name}"
        );
    }
}

#[test]
fn supporting_methods_attach_to_their_members() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();

    let customer = order.get_property("customer").unwrap();
    assert_eq!(
        customer.facets().lookup::<PropertySetterFacet>().unwrap().setter,
        "setCustomer"
    );

    let lines = order.get_collection("lines").unwrap();
    let add = lines
        .facets()
        .lookup_kind::<CollectionModifyFacet>(FacetKind::CollectionModify(CollectionOp::Add))
        .unwrap();
    assert_eq!(add.method, "addToLines");
    assert_eq!(lines.element_type().as_str(), ORDER_LINE);

    let submit = order.get_action("submit").unwrap();
    let hide = submit
        .facets()
        .lookup_kind::<SupportingMethodFacet>(FacetKind::Supporting(SupportKind::Hide))
        .unwrap();
    assert_eq!(hide.method, "hideSubmit");

    assert!(order.get_member("setCustomer").is_none());
    assert!(order.get_member("addToLines").is_none());
    assert!(order.get_member("hideSubmit").is_none());
}

#[test]
fn framework_interface_methods_are_ignored() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();

    assert!(order.get_action("compareTo").is_none());
    assert!(order.get_action("toString").is_none());
}

#[test]
fn mixins_contribute_under_their_own_id() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();

    let cancel = order.get_action("cancel").unwrap();
    assert!(cancel.is_mixed_in());
    assert_eq!(cancel.identifier().logical_type().class().as_str(), ORDER);
    assert_eq!(cancel.arity(), 1);

    let origin = cancel.mixin().unwrap();
    assert_eq!(origin.mixin.as_str(), ORDER_CANCEL);
    assert_eq!(origin.method, "act");

    let mixin = loader.lookup(&class(ORDER_CANCEL)).unwrap();
    assert!(mixin.is_mixin());
    assert_eq!(ids(mixin.actions()), vec!["cancel"]);

    let line = loader.load_specification(&class(ORDER_LINE)).unwrap();
    assert!(line.get_action("cancel").is_none());
}

#[test]
fn services_expose_actions_only() {
    let repository = order_domain();
    let loader = loader(&repository);
    let service = loader.load_specification(&class(ORDER_REPOSITORY)).unwrap();

    assert!(service.is_service());
    assert!(service.associations().is_empty());
    assert_eq!(ids(service.actions()), vec!["findByNumber", "recent"]);

    let recent = service.get_action("recent").unwrap();
    assert!(recent.returns_collection());
    assert_eq!(recent.return_type(), Some(&class(ORDER)));

    let find = service.get_action("findByNumber").unwrap();
    assert_eq!(find.parameters()[0].declared_name(), "number");
}

#[test]
fn members_of_vetoed_or_unknown_types_are_dropped() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins()
            .with(audit_log())
            .with(
                ClassDescriptor::class("com.acme.Widget")
                    .getter("getLog", TypeRef::class(AUDIT_LOG))
                    .getter("getGhost", TypeRef::class("com.acme.Ghost"))
                    .getter("getLabel", TypeRef::class(builtin::STRING)),
            ),
    );
    let loader = loader(&repository);
    let widget = loader.load_specification(&class("com.acme.Widget")).unwrap();
    assert_eq!(ids(widget.properties()), vec!["label"]);

    let log = loader.load_specification(&class(AUDIT_LOG)).unwrap();
    assert!(log.is_vetoed());
    assert_eq!(log.bean_sort(), BeanSort::Vetoed);
    assert!(log.try_members().unwrap().is_empty());
}

#[test]
fn member_order_overrides_declaration_order() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins().with(
            ClassDescriptor::class("com.acme.Widget")
                .getter("getAlpha", TypeRef::class(builtin::STRING))
                .method(
                    MethodDescriptor::getter("getBeta", TypeRef::class(builtin::STRING))
                        .annotate(Annotation::member_order("1")),
                )
                .getter("getGamma", TypeRef::class(builtin::STRING)),
        ),
    );
    let loader = loader(&repository);
    let widget = loader.load_specification(&class("com.acme.Widget")).unwrap();
    assert_eq!(ids(widget.properties()), vec!["beta", "alpha", "gamma"]);
}

#[test]
fn every_member_is_reachable_by_id() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();

    for member in order.members().iter() {
        let found = order.get_member_else_fail(member.id()).unwrap();
        assert_eq!(found.id(), member.id());
        assert_eq!(
            matches!(found, ObjectMember::Action(_)),
            member.as_action().is_some()
        );
    }
    assert!(order.get_member_else_fail("missing").is_err());
}

#[test]
fn whole_domain_validates() {
    let repository = order_domain();
    let loader: SpecificationLoader = loader(&repository);
    let snapshot = loader.introspect_all();

    assert!(snapshot.iter().all(|spec| spec.is_fully_introspected()));
    assert!(
        snapshot
            .windows(2)
            .all(|pair| pair[0].logical_type_name() <= pair[1].logical_type_name())
    );
    assert_eq!(loader.validate(), Ok(()));
}
