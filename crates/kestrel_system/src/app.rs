//! The application orchestrator.
//!
//! [`App`] owns plugins, build-time APIs and shared services. It does nothing
//! on its own; every capability is contributed by a plugin.
//!
//! # Lifecycle
//!
//! 1. **Dependency Resolution** - validate and topologically sort plugins
//! 2. **Build Phase** - `plugin.build()` in dependency order
//! 3. **Ready Phase** - `plugin.ready()` in dependency order
//! 4. **Cleanup Phase** - `plugin.cleanup()` in reverse order
//!
//! ```
//! use kestrel_system::app::App;
//! use kestrel_system::plugin::Plugin;
//!
//! struct Noop;
//! impl Plugin for Noop {
//!     fn build(&self, _app: &mut App) {}
//! }
//!
//! let mut app = App::new();
//! app.add_plugins(Noop);
//! app.finish();
//! assert!(app.is_built());
//! app.cleanup();
//! ```

use crate::api::Api;
use crate::plugin::{Plugin, PluginId, Plugins};
use crate::service::{Service, Services};
use core::any::{Any, TypeId};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Type-erased API for dynamic storage.
type BoxedApi = Box<dyn Any + Send + Sync>;

/// Build state of the app: `NotStarted` → `Building` → `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    Building,
    Built,
}

/// Internal entry for a registered plugin.
struct PluginEntry {
    plugin: Box<dyn Plugin>,
    /// Cached for error messages and dependency lookup.
    name: String,
}

/// The runtime that orchestrates plugins, APIs and services.
pub struct App {
    /// Shared services, handed out as `Arc<T>`.
    services: Services,

    /// Build-time registries, keyed by type.
    apis: HashMap<TypeId, BoxedApi>,

    /// Plugins waiting for [`finish()`](Self::finish).
    pending_plugins: Vec<PluginEntry>,

    /// Plugins that have been built, in dependency order.
    built_plugins: Vec<PluginEntry>,

    /// Ids of every plugin added so far (duplicate detection).
    plugin_ids: HashSet<PluginId>,

    build_state: BuildState,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for App {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("App")
            .field("services", &self.services)
            .field("apis", &self.apis.len())
            .field("plugins", &self.plugin_names())
            .field("build_state", &self.build_state)
            .finish()
    }
}

impl App {
    /// Creates an app with no plugins, APIs or services.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: Services::new(),
            apis: HashMap::new(),
            pending_plugins: Vec::new(),
            built_plugins: Vec::new(),
            plugin_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds one plugin or a plugin group.
    ///
    /// # Panics
    ///
    /// Panics if a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_app(self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();

        if plugin.is_unique() && self.plugin_ids.contains(&id) {
            panic!(
                "Plugin '{name}' is unique and was already added.\n\
                 If you intended to add this plugin multiple times, \
                 set `is_unique()` to return `false`."
            );
        }
        self.plugin_ids.insert(id);

        let entry = PluginEntry { plugin, name };

        // Plugins added from within another plugin's build are built immediately.
        if self.build_state == BuildState::Building {
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        } else {
            self.pending_plugins.push(entry);
        }
    }

    /// Returns true if a plugin of the given type has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.plugin_ids.contains(&PluginId::of::<P>())
    }

    /// Returns the names of all plugins, built ones first in build order.
    #[must_use]
    pub fn plugin_names(&self) -> Vec<&str> {
        self.built_plugins
            .iter()
            .chain(self.pending_plugins.iter())
            .map(|entry| entry.name.as_str())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a service, replacing (and returning) any previous instance.
    pub fn insert_service<S: Service>(&mut self, service: S) -> Option<Arc<S>> {
        self.services.insert(service)
    }

    /// Inserts an already shared service.
    pub fn insert_service_arc<S: Service>(&mut self, service: Arc<S>) -> Option<Arc<S>> {
        self.services.insert_arc(service)
    }

    /// Returns true if a service of type `S` exists.
    #[must_use]
    pub fn contains_service<S: Service>(&self) -> bool {
        self.services.contains::<S>()
    }

    /// Returns a shared handle to a service, or `None` if it is not registered.
    #[must_use]
    pub fn service<S: Service>(&self) -> Option<Arc<S>> {
        self.services.get::<S>().ok()
    }

    /// Removes a service and returns it.
    pub fn remove_service<S: Service>(&mut self) -> Option<Arc<S>> {
        self.services.remove::<S>()
    }

    /// Returns the underlying service container.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    // ─────────────────────────────────────────────────────────────────────────
    // APIs
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts an API, returning the previous one of the same type.
    pub fn insert_api<A: Api>(&mut self, api: A) -> Option<A> {
        let boxed: BoxedApi = Box::new(api);
        self.apis
            .insert(TypeId::of::<A>(), boxed)
            .and_then(|old| old.downcast::<A>().ok())
            .map(|old| *old)
    }

    /// Returns a reference to an API.
    #[must_use]
    pub fn api<A: Api>(&self) -> Option<&A> {
        self.apis
            .get(&TypeId::of::<A>())
            .and_then(|boxed| boxed.downcast_ref::<A>())
    }

    /// Returns a mutable reference to an API, for contributions during build.
    #[must_use]
    pub fn api_mut<A: Api>(&mut self) -> Option<&mut A> {
        self.apis
            .get_mut(&TypeId::of::<A>())
            .and_then(|boxed| boxed.downcast_mut::<A>())
    }

    /// Returns true if an API of type `A` exists.
    #[must_use]
    pub fn contains_api<A: Api>(&self) -> bool {
        self.apis.contains_key(&TypeId::of::<A>())
    }

    /// Removes an API and returns it.
    pub fn remove_api<A: Api>(&mut self) -> Option<A> {
        self.apis
            .remove(&TypeId::of::<A>())
            .and_then(|boxed| boxed.downcast::<A>().ok())
            .map(|api| *api)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns whether [`finish()`](Self::finish) has completed.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.build_state == BuildState::Built
    }

    /// Sorts, builds and readies all plugins.
    ///
    /// # Panics
    ///
    /// - If a plugin's dependency was not added
    /// - If plugins depend on each other circularly
    /// - If called more than once
    /// - If a plugin panics in `build()`/`ready()` (the metamodel plugin does
    ///   so for invalid domain models)
    pub fn finish(&mut self) -> &mut Self {
        assert!(
            self.build_state == BuildState::NotStarted,
            "App::finish() was already called. Cannot build twice."
        );

        let sorted = self.sort_plugins_by_dependencies();

        self.build_state = BuildState::Building;
        for entry in sorted {
            tracing::debug!(plugin = %entry.name, "building plugin");
            entry.plugin.build(self);
            self.built_plugins.push(entry);
        }

        // `ready()` takes `&mut App`, so the list is detached while it runs.
        // Plugins added during ready are built on the spot and kept after.
        let built = core::mem::take(&mut self.built_plugins);
        for entry in &built {
            tracing::debug!(plugin = %entry.name, "readying plugin");
            entry.plugin.ready(self);
        }
        let late = core::mem::replace(&mut self.built_plugins, built);
        self.built_plugins.extend(late);

        self.build_state = BuildState::Built;
        tracing::info!(plugins = self.built_plugins.len(), "application ready");
        self
    }

    /// Cleans up all plugins in reverse dependency order.
    pub fn cleanup(&mut self) {
        let built = core::mem::take(&mut self.built_plugins);
        for entry in built.iter().rev() {
            tracing::debug!(plugin = %entry.name, "cleaning up plugin");
            entry.plugin.cleanup(self);
        }
        self.built_plugins = built;
    }

    /// Sorts pending plugins topologically (Kahn's algorithm).
    fn sort_plugins_by_dependencies(&mut self) -> Vec<PluginEntry> {
        if self.pending_plugins.is_empty() {
            return Vec::new();
        }

        let name_to_index: HashMap<String, usize> = self
            .pending_plugins
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        let n = self.pending_plugins.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, entry) in self.pending_plugins.iter().enumerate() {
            for dep_id in entry.plugin.dependencies() {
                let dep_name = dep_id.type_name();
                if let Some(&dep_idx) = name_to_index.get(dep_name) {
                    dependents[dep_idx].push(i);
                    in_degree[i] += 1;
                } else if !self.built_plugins.iter().any(|p| p.name == dep_name) {
                    panic!(
                        "Plugin '{}' requires '{}' which was not added.\n\
                         Add {} before {}, or use a plugin group that includes it.",
                        entry.name, dep_name, dep_name, entry.name
                    );
                }
            }
        }

        // Seed in insertion order; pop from the front so independent plugins
        // keep the order they were added in.
        let mut queue: std::collections::VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| i)
            .collect();
        let mut sorted_indices: Vec<usize> = Vec::with_capacity(n);

        while let Some(idx) = queue.pop_front() {
            sorted_indices.push(idx);
            for &dependent in &dependents[idx] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if sorted_indices.len() != n {
            let in_cycle: Vec<&str> = in_degree
                .iter()
                .enumerate()
                .filter(|(_, deg)| **deg > 0)
                .map(|(i, _)| self.pending_plugins[i].name.as_str())
                .collect();
            panic!(
                "Circular dependency detected among plugins: {in_cycle:?}\n\
                 Break the cycle by extracting shared functionality into a separate plugin."
            );
        }

        let mut slots: Vec<Option<PluginEntry>> = core::mem::take(&mut self.pending_plugins)
            .into_iter()
            .map(Some)
            .collect();
        sorted_indices
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect()
    }
}
