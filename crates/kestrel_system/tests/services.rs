//! Service sharing across threads and plugin phases.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use kestrel_system::api::Api;
use kestrel_system::app::App;
use kestrel_system::plugin::{Plugin, PluginGroup, PluginGroupBuilder, PluginId};
use kestrel_system::service::{Service, Services};

#[derive(Default)]
struct Hits(AtomicUsize);
impl Service for Hits {}

#[test]
fn services_are_shared_between_threads() {
    let mut services = Services::new();
    services.insert(Hits::default());
    let services = Arc::new(services);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let services = Arc::clone(&services);
            thread::spawn(move || {
                for _ in 0..100 {
                    services.get::<Hits>().unwrap().0.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    assert_eq!(services.get::<Hits>().unwrap().0.load(Ordering::SeqCst), 400);
}

/// Registry filled by contributors during build and frozen into a service.
#[derive(Default)]
struct Names(Vec<&'static str>);
impl Api for Names {}

struct FrozenNames(Vec<&'static str>);
impl Service for FrozenNames {}

struct NamesPlugin;
impl Plugin for NamesPlugin {
    fn build(&self, app: &mut App) {
        app.insert_api(Names::default());
    }

    fn ready(&self, app: &mut App) {
        let names = app.remove_api::<Names>().expect("names api registered in build");
        app.insert_service(FrozenNames(names.0));
    }
}

struct Contributor(&'static str);
impl Plugin for Contributor {
    fn build(&self, app: &mut App) {
        app.api_mut::<Names>()
            .expect("NamesPlugin must be added first")
            .0
            .push(self.0);
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<NamesPlugin>()]
    }

    fn is_unique(&self) -> bool {
        false
    }
}

struct Contributors;
impl PluginGroup for Contributors {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(Contributor("alpha"))
            .add(Contributor("beta"))
    }
}

#[test]
fn build_time_api_is_frozen_into_a_service() {
    let mut app = App::new();
    app.add_plugins(Contributors.build()).add_plugins(NamesPlugin);
    app.finish();

    let frozen = app.service::<FrozenNames>().unwrap();
    assert_eq!(frozen.0, vec!["alpha", "beta"]);
    assert!(!app.contains_api::<Names>());
}
