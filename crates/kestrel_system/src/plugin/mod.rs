//! Plugin system for assembling applications.
//!
//! Everything an application knows how to do arrives through a plugin: the
//! tracing setup, the programming model's facet factories, the specification
//! loader, the application feature repository. The [`App`] only orders and
//! drives them.
//!
//! # Example
//!
//! ```
//! use kestrel_system::app::App;
//! use kestrel_system::plugin::{Plugin, PluginId};
//!
//! struct LoggingPlugin;
//! impl Plugin for LoggingPlugin {
//!     fn build(&self, _app: &mut App) {}
//! }
//!
//! struct DomainPlugin;
//! impl Plugin for DomainPlugin {
//!     fn build(&self, _app: &mut App) {}
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<LoggingPlugin>()]
//!     }
//! }
//!
//! App::new()
//!     .add_plugins(DomainPlugin)
//!     .add_plugins(LoggingPlugin)
//!     .finish();
//! ```

use core::any::TypeId;

use crate::app::App;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
///
/// Used for dependency resolution and duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Creates a `PluginId` for the given plugin type.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for debugging.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of application functionality.
///
/// The [`App`] drives every plugin through the same lifecycle:
///
/// 1. **Build** - `build()` in dependency order. Register APIs, contribute to
///    the APIs of plugins you depend on, insert configuration services.
/// 2. **Ready** - `ready()` in dependency order. Turn finished APIs into
///    services, run eager work (the metamodel introspects everything here so
///    that malformed domain classes fail at boot).
/// 3. **Cleanup** - `cleanup()` in **reverse** dependency order.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the application. Called once.
    fn build(&self, app: &mut App);

    /// Called after every plugin has been built.
    fn ready(&self, _app: &mut App) {}

    /// Called when the application shuts down.
    fn cleanup(&self, _app: &mut App) {}

    /// Returns the plugin's name for debugging and error messages.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares plugins that must be built before this one.
    ///
    /// The app panics in [`App::finish`] if a dependency is missing.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Returns true if this plugin can only be added once.
    ///
    /// Default is `true`; adding a unique plugin twice panics.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for add_plugins polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Types that can be passed to [`App::add_plugins`]: a single [`Plugin`] or
/// a [`PluginGroupBuilder`].
pub trait Plugins {
    /// Adds these plugins to the app.
    fn add_to_app(self, app: &mut App);
}

impl<P: Plugin> Plugins for P {
    fn add_to_app(self, app: &mut App) {
        let id = PluginId::of::<P>();
        app.add_plugin_boxed(id, Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_app(self, app: &mut App) {
        for boxed in self.plugins {
            app.add_plugin_boxed(boxed.id, boxed.plugin);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A bundle of plugins that are usually added together.
///
/// ```ignore
/// App::new()
///     .add_plugins(DefaultPlugins.build().disable::<TracingPlugin>())
///     .finish();
/// ```
pub trait PluginGroup {
    /// Returns the plugins in this group.
    fn build(self) -> PluginGroupBuilder;
}

/// A boxed plugin with its captured [`PluginId`].
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Box<dyn Plugin>,
}

impl BoxedPlugin {
    pub(crate) fn name(&self) -> &str {
        self.plugin.name()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroupBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for customizing plugin groups.
#[derive(Default)]
pub struct PluginGroupBuilder {
    pub(crate) plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates a new empty plugin group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Box::new(plugin),
        });
        self
    }

    /// Adds a plugin after `Target`, or at the end if `Target` is absent.
    #[must_use]
    pub fn add_after<P: Plugin, Target: Plugin>(mut self, plugin: P) -> Self {
        let target = PluginId::of::<Target>();
        let position = self
            .plugins
            .iter()
            .position(|p| p.id == target)
            .map_or(self.plugins.len(), |i| i + 1);
        self.plugins.insert(
            position,
            BoxedPlugin {
                id: PluginId::of::<P>(),
                plugin: Box::new(plugin),
            },
        );
        self
    }

    /// Removes a plugin from the group by type. No-op if absent.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let target = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != target);
        self
    }

    /// Returns the names of the plugins in the group, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(BoxedPlugin::name).collect()
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PluginA;
    impl Plugin for PluginA {
        fn build(&self, _app: &mut App) {}
    }

    struct PluginB;
    impl Plugin for PluginB {
        fn build(&self, _app: &mut App) {}
        fn dependencies(&self) -> Vec<PluginId> {
            vec![PluginId::of::<PluginA>()]
        }
    }

    struct PluginC;
    impl Plugin for PluginC {
        fn build(&self, _app: &mut App) {}
    }

    #[test]
    fn plugin_id_equality() {
        assert_eq!(PluginId::of::<PluginA>(), PluginId::of::<PluginA>());
        assert_ne!(PluginId::of::<PluginA>(), PluginId::of::<PluginB>());
        assert!(PluginId::of::<PluginA>().type_name().contains("PluginA"));
    }

    #[test]
    fn plugin_defaults() {
        let plugin = PluginA;
        assert!(plugin.name().contains("PluginA"));
        assert!(plugin.is_unique());
        assert!(plugin.dependencies().is_empty());
    }

    #[test]
    fn plugin_with_dependencies() {
        assert_eq!(PluginB.dependencies(), vec![PluginId::of::<PluginA>()]);
    }

    #[test]
    fn group_builder_add_after() {
        let builder = PluginGroupBuilder::new()
            .add(PluginA)
            .add(PluginB)
            .add_after::<_, PluginA>(PluginC);

        let names = builder.names();
        assert_eq!(names.len(), 3);
        assert!(names[0].contains("PluginA"));
        assert!(names[1].contains("PluginC"));
        assert!(names[2].contains("PluginB"));
    }

    #[test]
    fn group_builder_add_after_missing_target_appends() {
        let builder = PluginGroupBuilder::new()
            .add(PluginA)
            .add_after::<_, PluginB>(PluginC);

        let names = builder.names();
        assert!(names[0].contains("PluginA"));
        assert!(names[1].contains("PluginC"));
    }

    #[test]
    fn group_builder_disable() {
        let builder = PluginGroupBuilder::new()
            .add(PluginA)
            .add(PluginB)
            .disable::<PluginA>()
            .disable::<PluginC>();

        assert_eq!(builder.len(), 1);
        assert!(builder.names()[0].contains("PluginB"));
    }

    struct TestGroup;
    impl PluginGroup for TestGroup {
        fn build(self) -> PluginGroupBuilder {
            PluginGroupBuilder::new().add(PluginA).add(PluginB)
        }
    }

    #[test]
    fn plugin_group_build() {
        let builder = TestGroup.build();
        assert_eq!(builder.len(), 2);
        assert!(!builder.is_empty());
        assert!(PluginGroupBuilder::new().is_empty());
    }
}
