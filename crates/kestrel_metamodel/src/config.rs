//! Metamodel configuration.
//!
//! [`MetaModelConfig`] is inserted as a service by the
//! [`MetaModelPlugin`](crate::plugin::MetaModelPlugin) so other plugins can
//! read how the metamodel was booted.
//!
//! # Example
//!
//! ```
//! use kestrel_metamodel::config::MetaModelConfig;
//! use kestrel_metamodel::spec::IntrospectionPolicy;
//!
//! let config = MetaModelConfig::from_json_str(
//!     r#"{ "introspection_policy": "annotation_required", "boot_concurrency": 4 }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.introspection_policy, IntrospectionPolicy::AnnotationRequired);
//! assert_eq!(config.boot_concurrency, 4);
//! assert!(config.validate_on_boot);
//! ```

use kestrel_system::service::Service;
use serde::{Deserialize, Serialize};

use crate::error::MetaModelError;
use crate::spec::IntrospectionPolicy;

/// How the metamodel is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaModelConfig {
    /// Policy for classes without an explicit `DomainObject` override.
    pub introspection_policy: IntrospectionPolicy,
    /// Introspect every known class when the app becomes ready.
    pub eager_introspection: bool,
    /// Fail boot if the validator reports problems.
    pub validate_on_boot: bool,
    /// Keep a log of introspection triggers.
    pub record_triggers: bool,
    /// Maximum number of trigger records kept.
    pub trigger_log_capacity: usize,
    /// Threads used for eager introspection.
    pub boot_concurrency: usize,
}

impl Default for MetaModelConfig {
    fn default() -> Self {
        Self {
            introspection_policy: IntrospectionPolicy::default(),
            eager_introspection: true,
            validate_on_boot: true,
            record_triggers: false,
            trigger_log_capacity: 256,
            boot_concurrency: 1,
        }
    }
}

impl Service for MetaModelConfig {}

impl MetaModelConfig {
    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`MetaModelError::Config`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, MetaModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the default introspection policy.
    #[must_use]
    pub fn with_introspection_policy(mut self, policy: IntrospectionPolicy) -> Self {
        self.introspection_policy = policy;
        self
    }

    /// Enables or disables eager introspection.
    #[must_use]
    pub fn with_eager_introspection(mut self, eager: bool) -> Self {
        self.eager_introspection = eager;
        self
    }

    /// Enables or disables fail-fast validation.
    #[must_use]
    pub fn with_validate_on_boot(mut self, validate: bool) -> Self {
        self.validate_on_boot = validate;
        self
    }

    /// Enables the trigger log.
    #[must_use]
    pub fn with_trigger_log(mut self, capacity: usize) -> Self {
        self.record_triggers = true;
        self.trigger_log_capacity = capacity;
        self
    }

    /// Sets the number of boot threads. Zero is treated as one.
    #[must_use]
    pub fn with_boot_concurrency(mut self, threads: usize) -> Self {
        self.boot_concurrency = threads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = MetaModelConfig::from_json_str("{}").unwrap();
        assert_eq!(config, MetaModelConfig::default());
        assert!(config.eager_introspection);
        assert!(!config.record_triggers);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = MetaModelConfig::from_json_str(r#"{ "boot_concurrency": "many" }"#).unwrap_err();
        assert!(matches!(err, MetaModelError::Config(_)));
    }

    #[test]
    fn builders_compose() {
        let config = MetaModelConfig::default()
            .with_introspection_policy(IntrospectionPolicy::EncapsulationEnabled)
            .with_trigger_log(16)
            .with_boot_concurrency(3)
            .with_validate_on_boot(false);
        assert_eq!(config.introspection_policy, IntrospectionPolicy::EncapsulationEnabled);
        assert!(config.record_triggers);
        assert_eq!(config.trigger_log_capacity, 16);
        assert_eq!(config.boot_concurrency, 3);
        assert!(!config.validate_on_boot);
    }

    #[test]
    fn round_trips_through_json() {
        let config = MetaModelConfig::default().with_eager_introspection(false);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MetaModelConfig::from_json_str(&json).unwrap(), config);
    }
}
