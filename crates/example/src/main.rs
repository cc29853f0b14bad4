//! Boots the example order domain and prints its metamodel.
//!
//! # Usage
//!
//! ```bash
//! orders [config.json]
//! ```
//!
//! The optional file holds a `MetaModelConfig` as JSON; missing fields take
//! their defaults.
//!
//! # Example
//!
//! ```bash
//! echo '{ "boot_concurrency": 4, "record_triggers": true }' > metamodel.json
//! orders metamodel.json
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use example::{ORDER, domain, render_features, render_specifications};
use kestrel_core::DefaultPlugins;
use kestrel_features::plugin::FeaturesPlugin;
use kestrel_features::repository::ApplicationFeatureRepository;
use kestrel_metamodel::config::MetaModelConfig;
use kestrel_metamodel::ident::ClassName;
use kestrel_metamodel::loader::SpecificationLoader;
use kestrel_metamodel::plugin::MetaModelPlugin;
use kestrel_system::app::App;
use kestrel_system::plugin::PluginGroup;

fn load_config() -> Result<MetaModelConfig, String> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(MetaModelConfig::default());
    };
    let json = std::fs::read_to_string(&path).map_err(|e| format!("cannot read {path}: {e}"))?;
    MetaModelConfig::from_json_str(&json).map_err(|e| format!("{path}: {e}"))
}

fn main() -> io::Result<()> {
    let config = match load_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {message}");
            std::process::exit(1);
        }
    };

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.build());
    app.add_plugins(MetaModelPlugin::new(domain()).with_config(config));
    app.add_plugins(FeaturesPlugin::new());
    app.finish();

    let loader: Arc<SpecificationLoader> = app
        .service::<SpecificationLoader>()
        .expect("MetaModelPlugin publishes the loader");
    let features = app
        .service::<ApplicationFeatureRepository>()
        .expect("FeaturesPlugin publishes the feature repository");

    // Lazy boots only know what has been asked for so far.
    let order = loader.load_specification(&ClassName::new(ORDER));
    tracing::info!(loaded = order.is_some(), specifications = loader.len(), "order domain ready");

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "# Specifications\n")?;
    stdout.write_all(render_specifications(&loader).as_bytes())?;
    writeln!(stdout, "\n# Features\n")?;
    stdout.write_all(render_features(&features).as_bytes())?;

    let triggers = loader.trigger_log();
    if !triggers.is_empty() {
        writeln!(stdout, "\n# Introspection triggers\n")?;
        for record in triggers {
            writeln!(stdout, "{:<40} {:?}", record.class.as_str(), record.trigger.cause)?;
        }
    }
    stdout.flush()?;

    app.cleanup();
    Ok(())
}
