//! Concurrent loading.
//!
//! Threads start together behind a barrier so introspection of the same
//! types genuinely overlaps.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;
use kestrel_metamodel::class::{ClassDescriptor, InMemoryClassRepository, TypeRef, builtin};
use kestrel_metamodel::config::MetaModelConfig;
use kestrel_metamodel::loader::SpecificationLoader;
use kestrel_metamodel::spec::Depth;

const THREADS: usize = 8;

#[test]
fn same_class_yields_one_specification() {
    let repository = order_domain();
    let loader = Arc::new(loader(&repository));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader.load_specification(&class(ORDER)).unwrap()
            })
        })
        .collect();

    let specs: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();
    for spec in &specs {
        assert!(Arc::ptr_eq(spec, &specs[0]));
        assert!(spec.is_fully_introspected());
        assert_eq!(spec.properties().len(), 5);
    }
}

#[test]
fn different_classes_load_side_by_side() {
    let repository = order_domain();
    let loader = Arc::new(loader(&repository));
    let classes = [ORDER, ORDER_LINE, CUSTOMER, ORDER_REPOSITORY];
    let barrier = Arc::new(Barrier::new(classes.len() * 2));

    let handles: Vec<_> = classes
        .iter()
        .chain(classes.iter().rev())
        .map(|name| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            let name = class(name);
            thread::spawn(move || {
                barrier.wait();
                loader.load_specification(&name).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let spec = handle.join().expect("Thread panicked");
        assert!(spec.is_fully_introspected());
        assert!(Arc::ptr_eq(&spec, &loader.lookup(spec.class()).unwrap()));
    }
    assert_eq!(loader.validate(), Ok(()));
}

#[test]
fn no_subclass_registration_is_lost() {
    const CHILDREN: usize = 32;
    let repository = InMemoryClassRepository::with_builtins().with(abstract_entity());
    for i in 0..CHILDREN {
        repository.register(
            ClassDescriptor::class(format!("com.acme.Child{i}"))
                .extends(ABSTRACT_ENTITY)
                .getter("getLabel", TypeRef::class(builtin::STRING)),
        );
    }
    let repository = Arc::new(repository);
    let loader = Arc::new(loader(&repository));
    let barrier = Arc::new(Barrier::new(CHILDREN));

    let handles: Vec<_> = (0..CHILDREN)
        .map(|i| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader
                    .load_specification(&class(&format!("com.acme.Child{i}")))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let parent = loader.lookup(&class(ABSTRACT_ENTITY)).unwrap();
    assert_eq!(parent.subclasses(Depth::Direct).len(), CHILDREN);
}

#[test]
fn parallel_boot_matches_sequential_boot() {
    let repository = order_domain();
    let sequential = loader(&repository);
    let parallel: SpecificationLoader =
        loader_with(&repository, MetaModelConfig::default().with_boot_concurrency(4));

    let expected: Vec<_> = sequential
        .introspect_all()
        .iter()
        .map(|spec| (spec.class().clone(), spec.members().len()))
        .collect();
    let actual: Vec<_> = parallel
        .introspect_all()
        .iter()
        .map(|spec| (spec.class().clone(), spec.members().len()))
        .collect();

    assert_eq!(actual, expected);
    assert_eq!(parallel.validate(), Ok(()));
}
