//! Type hierarchy navigation and subtype queries.

mod common;

use std::sync::Arc;

use common::*;
use kestrel_metamodel::class::{ClassDescriptor, ClassRepository, InMemoryClassRepository, builtin};
use kestrel_metamodel::ident::ClassName;
use kestrel_metamodel::spec::{Depth, ObjectSpecification};
use proptest::prelude::*;
use proptest::sample::Index;

#[test]
fn order_knows_its_supertypes_and_is_known_by_them() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();
    let abstract_entity = loader.lookup(&class(ABSTRACT_ENTITY)).unwrap();

    let superclass = order.superclass().unwrap();
    assert!(Arc::ptr_eq(&superclass, &abstract_entity));

    let interfaces = order.interfaces();
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].class().as_str(), builtin::COMPARABLE);
    assert!(interfaces[0].is_interface());

    let subclasses = abstract_entity.subclasses(Depth::Direct);
    assert!(subclasses.iter().any(|spec| Arc::ptr_eq(spec, &order)));

    let object = loader.lookup(&class(builtin::OBJECT)).unwrap();
    assert!(object.superclass().is_none());
    assert!(
        object
            .subclasses(Depth::Transitive)
            .iter()
            .any(|spec| Arc::ptr_eq(spec, &order))
    );
    assert!(
        !object
            .subclasses(Depth::Direct)
            .iter()
            .any(|spec| Arc::ptr_eq(spec, &order))
    );
}

#[test]
fn subtype_queries_follow_the_hierarchy() {
    let repository = order_domain();
    let loader = loader(&repository);
    let order = loader.load_specification(&class(ORDER)).unwrap();
    let abstract_entity = loader.lookup(&class(ABSTRACT_ENTITY)).unwrap();
    let comparable = loader.lookup(&class(builtin::COMPARABLE)).unwrap();
    let object = loader.lookup(&class(builtin::OBJECT)).unwrap();
    let customer = loader.load_specification(&class(CUSTOMER)).unwrap();

    assert!(order.is_of_type(&abstract_entity));
    assert!(order.is_of_type(&comparable));
    assert!(order.is_of_type(&object));
    assert!(order.is_of_type(&order));
    assert!(!abstract_entity.is_of_type(&order));
    assert!(!customer.is_of_type(&order));

    let chain = order.type_hierarchy();
    let hierarchy: Vec<&str> = chain.iter().map(|spec| spec.class().as_str()).collect();
    assert_eq!(hierarchy, vec![ORDER, ABSTRACT_ENTITY, builtin::OBJECT]);
}

#[test]
fn primitives_match_their_wrappers_only_when_asked() {
    let repository = order_domain();
    let loader = loader(&repository);
    let int = loader.load_specification(&class("int")).unwrap();
    let integer = loader.load_specification(&class(builtin::INTEGER)).unwrap();
    let object = loader.load_specification(&class(builtin::OBJECT)).unwrap();

    assert!(int.is_primitive());
    assert!(!int.is_of_type(&integer));
    assert!(int.is_of_type_resolve_primitive(&integer));
    assert!(!int.is_of_type(&object));
}

#[test]
fn arrays_are_covariant() {
    let repository = order_domain();
    let loader = loader(&repository);
    let orders = loader
        .load_specification(&class(ORDER).array_of())
        .unwrap();
    let entities = loader
        .load_specification(&class(ABSTRACT_ENTITY).array_of())
        .unwrap();
    let object = loader.load_specification(&class(builtin::OBJECT)).unwrap();

    assert!(orders.is_array());
    assert!(orders.is_of_type(&entities));
    assert!(!entities.is_of_type(&orders));
    assert!(orders.is_of_type(&object));
}

#[test]
fn common_super_type_finds_the_nearest_shared_class() {
    let repository = Arc::new(
        InMemoryClassRepository::with_builtins()
            .with(abstract_entity())
            .with(ClassDescriptor::class("com.acme.Invoice").extends(ABSTRACT_ENTITY))
            .with(ClassDescriptor::class("com.acme.Receipt").extends(ABSTRACT_ENTITY))
            .with(ClassDescriptor::class("com.acme.Note")),
    );
    let loader = loader(&repository);
    let invoice = loader.load_specification(&class("com.acme.Invoice")).unwrap();
    let receipt = loader.load_specification(&class("com.acme.Receipt")).unwrap();
    let note = loader.load_specification(&class("com.acme.Note")).unwrap();

    let shared = ObjectSpecification::common_super_type(&invoice, &receipt);
    assert_eq!(shared.class().as_str(), ABSTRACT_ENTITY);
    assert_eq!(
        ObjectSpecification::common_super_type(&invoice, &note).class().as_str(),
        builtin::OBJECT
    );
    assert!(Arc::ptr_eq(
        &ObjectSpecification::common_super_type(&invoice, &invoice),
        &invoice
    ));
}

#[test]
#[should_panic(expected = "no common super type")]
fn primitives_share_no_super_type_with_classes() {
    let repository = order_domain();
    let loader = loader(&repository);
    let int = loader.load_specification(&class("int")).unwrap();
    let customer = loader.load_specification(&class(CUSTOMER)).unwrap();
    let _ = ObjectSpecification::common_super_type(&int, &customer);
}

/// A random class forest: class `i` extends an earlier class or the root,
/// and may implement either of two interfaces, the second extending the
/// first.
fn generated_repository(shape: &[(Index, bool, bool)]) -> Arc<InMemoryClassRepository> {
    let repository = InMemoryClassRepository::with_builtins()
        .with(ClassDescriptor::interface("gen.Named"))
        .with(ClassDescriptor::interface("gen.Tagged").implements("gen.Named"));
    for (i, (parent, named, tagged)) in shape.iter().enumerate() {
        let mut descriptor = ClassDescriptor::class(format!("gen.C{i}"));
        let parent = parent.index(i + 1);
        if parent > 0 {
            descriptor = descriptor.extends(format!("gen.C{}", parent - 1));
        }
        if *named {
            descriptor = descriptor.implements("gen.Named");
        }
        if *tagged {
            descriptor = descriptor.implements("gen.Tagged");
        }
        repository.register(descriptor);
    }
    Arc::new(repository)
}

fn shape() -> impl Strategy<Value = Vec<(Index, bool, bool)>> {
    prop::collection::vec((any::<Index>(), any::<bool>(), any::<bool>()), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn is_of_type_agrees_with_the_class_model(shape in shape()) {
        let repository = generated_repository(&shape);
        let loader = loader(&repository);
        let mut names: Vec<ClassName> = (0..shape.len()).map(|i| class(&format!("gen.C{i}"))).collect();
        names.extend([class("gen.Named"), class("gen.Tagged"), class(builtin::OBJECT)]);

        for a in &names {
            for b in &names {
                let spec_a = loader.load_specification(a).unwrap();
                let spec_b = loader.load_specification(b).unwrap();
                prop_assert_eq!(spec_a.is_of_type(&spec_b), repository.is_assignable(a, b), "{} <: {}", a, b);
                if a != b && spec_a.is_of_type(&spec_b) && b.as_str() != builtin::OBJECT {
                    prop_assert!(!spec_b.is_of_type(&spec_a));
                }
            }
        }
    }

    #[test]
    fn common_super_type_is_symmetric(shape in shape()) {
        let repository = generated_repository(&shape);
        let loader = loader(&repository);
        let specs: Vec<_> = (0..shape.len())
            .map(|i| loader.load_specification(&class(&format!("gen.C{i}"))).unwrap())
            .collect();

        for a in &specs {
            for b in &specs {
                let ab = ObjectSpecification::common_super_type(a, b);
                let ba = ObjectSpecification::common_super_type(b, a);
                prop_assert_eq!(ab.class(), ba.class());
                prop_assert!(a.is_of_type(&ab) && b.is_of_type(&ab));
            }
        }
    }
}
