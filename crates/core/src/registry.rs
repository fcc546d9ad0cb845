// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Service factory registry and discovery.
//!
//! This module provides the factory pattern for creating services:
//! - [`ServiceRegistry`]: Central registry of all available service kinds
//! - [`ServiceDefinition`]: Serializable service metadata for listings
//! - [`Service`]: A constructed producer, filter or transition

use crate::error::{FrameError, Result};
use crate::service::{Filter, Producer, Transition};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// The role a service plays in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Producer,
    Filter,
    Transition,
}

/// A constructed service instance.
#[derive(Clone)]
pub enum Service {
    Producer(Arc<dyn Producer>),
    Filter(Arc<dyn Filter>),
    Transition(Arc<dyn Transition>),
}

impl Service {
    pub const fn service_type(&self) -> ServiceType {
        match self {
            Self::Producer(_) => ServiceType::Producer,
            Self::Filter(_) => ServiceType::Filter,
            Self::Transition(_) => ServiceType::Transition,
        }
    }
}

/// Factory that builds a service from optional JSON parameters.
pub type ServiceFactory =
    Arc<dyn Fn(Option<&serde_json::Value>) -> Result<Service> + Send + Sync>;

/// A serializable representation of a service's definition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServiceDefinition {
    pub kind: String,
    pub service_type: ServiceType,
    /// Human-readable description of what this service does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub param_schema: serde_json::Value,
    /// Hierarchical categories for grouping (e.g., `["video", "filters"]`)
    pub categories: Vec<String>,
}

#[derive(Clone)]
struct ServiceInfo {
    factory: ServiceFactory,
    service_type: ServiceType,
    param_schema: serde_json::Value,
    categories: Vec<String>,
    description: Option<String>,
}

/// The ServiceRegistry holds all service kinds that can be constructed by name.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    info: HashMap<String, ServiceInfo>,
}

impl ServiceRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service kind.
    ///
    /// The factory MUST be able to produce a default instance when `params` is `None`.
    pub fn register<F>(
        &mut self,
        name: &str,
        service_type: ServiceType,
        factory: F,
        param_schema: serde_json::Value,
        categories: Vec<String>,
    ) where
        F: Fn(Option<&serde_json::Value>) -> Result<Service> + Send + Sync + 'static,
    {
        self.insert(name, service_type, Arc::new(factory), param_schema, categories, None);
    }

    /// Registers a service kind with a description.
    pub fn register_with_description<F>(
        &mut self,
        name: &str,
        service_type: ServiceType,
        factory: F,
        param_schema: serde_json::Value,
        categories: Vec<String>,
        description: impl Into<String>,
    ) where
        F: Fn(Option<&serde_json::Value>) -> Result<Service> + Send + Sync + 'static,
    {
        self.insert(
            name,
            service_type,
            Arc::new(factory),
            param_schema,
            categories,
            Some(description.into()),
        );
    }

    fn insert(
        &mut self,
        name: &str,
        service_type: ServiceType,
        factory: ServiceFactory,
        param_schema: serde_json::Value,
        categories: Vec<String>,
        description: Option<String>,
    ) {
        if self
            .info
            .insert(
                name.to_string(),
                ServiceInfo { factory, service_type, param_schema, categories, description },
            )
            .is_some()
        {
            tracing::warn!(kind = %name, "Service kind registered twice, replacing previous factory");
        }
    }

    /// Creates an instance of a service by its registered name.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::Configuration` if the kind is unknown, or the
    /// factory's error if construction fails.
    pub fn create(&self, name: &str, params: Option<&serde_json::Value>) -> Result<Service> {
        let info = self.info.get(name).ok_or_else(|| {
            FrameError::Configuration(format!("Service type '{name}' not found in registry"))
        })?;
        let service = (info.factory)(params)?;
        tracing::debug!(kind = %name, service_type = ?info.service_type, "Created service");
        Ok(service)
    }

    /// # Errors
    ///
    /// As [`ServiceRegistry::create`], plus `FrameError::Configuration` if the kind is not a producer.
    pub fn create_producer(
        &self,
        name: &str,
        params: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn Producer>> {
        match self.create(name, params)? {
            Service::Producer(p) => Ok(p),
            other => Err(wrong_type(name, ServiceType::Producer, &other)),
        }
    }

    /// # Errors
    ///
    /// As [`ServiceRegistry::create`], plus `FrameError::Configuration` if the kind is not a filter.
    pub fn create_filter(
        &self,
        name: &str,
        params: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn Filter>> {
        match self.create(name, params)? {
            Service::Filter(f) => Ok(f),
            other => Err(wrong_type(name, ServiceType::Filter, &other)),
        }
    }

    /// # Errors
    ///
    /// As [`ServiceRegistry::create`], plus `FrameError::Configuration` if the kind is not a transition.
    pub fn create_transition(
        &self,
        name: &str,
        params: Option<&serde_json::Value>,
    ) -> Result<Arc<dyn Transition>> {
        match self.create(name, params)? {
            Service::Transition(t) => Ok(t),
            other => Err(wrong_type(name, ServiceType::Transition, &other)),
        }
    }

    /// Returns definitions for all registered services, sorted by kind.
    pub fn definitions(&self) -> Vec<ServiceDefinition> {
        let mut defs: Vec<_> = self
            .info
            .iter()
            .map(|(kind, info)| ServiceDefinition {
                kind: kind.clone(),
                service_type: info.service_type,
                description: info.description.clone(),
                param_schema: info.param_schema.clone(),
                categories: info.categories.clone(),
            })
            .collect();
        defs.sort_by(|a, b| a.kind.cmp(&b.kind));
        defs
    }

    /// Removes a service definition from the registry.
    /// Returns true if a definition with the provided name was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.info.remove(name).is_some()
    }

    /// Checks whether a service definition exists in the registry.
    pub fn contains(&self, name: &str) -> bool {
        self.info.contains_key(name)
    }
}

fn wrong_type(name: &str, wanted: ServiceType, got: &Service) -> FrameError {
    FrameError::Configuration(format!(
        "Service '{name}' is a {:?}, expected a {wanted:?}",
        got.service_type()
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    struct Nothing;

    impl Filter for Nothing {
        fn id(&self) -> &str {
            "nothing"
        }

        fn process(&self, _frame: &mut Frame) -> Result<()> {
            Ok(())
        }
    }

    fn registry() -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();
        registry.register_with_description(
            "nothing",
            ServiceType::Filter,
            |_| Ok(Service::Filter(Arc::new(Nothing))),
            serde_json::json!({}),
            vec!["test".into()],
            "Does nothing",
        );
        registry
    }

    #[test]
    fn creates_registered_services() {
        let registry = registry();
        assert!(registry.contains("nothing"));
        assert_eq!(registry.create_filter("nothing", None).unwrap().id(), "nothing");
    }

    #[test]
    fn unknown_and_mistyped_kinds_fail() {
        let registry = registry();
        assert!(matches!(registry.create("missing", None), Err(FrameError::Configuration(_))));
        assert!(matches!(
            registry.create_producer("nothing", None),
            Err(FrameError::Configuration(_))
        ));
    }

    #[test]
    fn definitions_serialize() {
        let mut registry = registry();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        let json = serde_json::to_value(&defs[0]).unwrap();
        assert_eq!(json["service_type"], "filter");
        assert_eq!(json["description"], "Does nothing");

        assert!(registry.unregister("nothing"));
        assert!(registry.definitions().is_empty());
    }
}
