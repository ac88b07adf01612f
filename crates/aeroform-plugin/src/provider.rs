//! Provider abstraction
//!
//! A provider is configured once, produces type-erased provider data (API
//! clients and defaults) and registers resource factories. The
//! [`ProviderServer`] is what a host talks to: it instantiates resources by
//! type name and hands each one the provider data.

use crate::diagnostics::Diagnostics;
use crate::resource::Resource;
use async_trait::async_trait;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Data passed from the provider to every resource it creates
pub type ProviderData = Arc<dyn Any + Send + Sync>;

/// Builds a fresh, unconfigured resource
pub type ResourceFactory = fn() -> Box<dyn Resource>;

/// Provider abstraction trait
#[async_trait]
pub trait Provider: Send + Sync {
    /// Prefix of every resource type name (e.g. "aeroform")
    fn type_name(&self) -> &str;

    /// Build provider data; `None` with an error diagnostic aborts start-up
    async fn configure(&self, diags: &mut Diagnostics) -> Option<ProviderData>;

    fn resources(&self) -> Vec<ResourceFactory>;
}

/// Configured provider with its resource registry
pub struct ProviderServer {
    type_name: String,
    data: Option<ProviderData>,
    factories: BTreeMap<String, ResourceFactory>,
}

impl ProviderServer {
    /// Configure `provider` and index its resources by type name
    pub async fn start(provider: &dyn Provider) -> std::result::Result<Self, Diagnostics> {
        let mut diags = Diagnostics::new();
        let data = provider.configure(&mut diags).await;
        if diags.has_error() {
            return Err(diags);
        }

        let type_name = provider.type_name().to_string();
        let factories = provider
            .resources()
            .into_iter()
            .map(|factory| (factory().type_name(&type_name), factory))
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            provider = %type_name,
            resources = factories.len(),
            "Provider configured"
        );

        Ok(Self {
            type_name,
            data,
            factories,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate and configure a resource of the given type
    pub fn resource(&self, type_name: &str) -> std::result::Result<Box<dyn Resource>, Diagnostics> {
        let mut diags = Diagnostics::new();
        let Some(factory) = self.factories.get(type_name) else {
            diags.add_error(
                "Resource Type Not Found",
                format!(
                    "The provider {} does not support resource type {}",
                    self.type_name, type_name
                ),
            );
            return Err(diags);
        };

        let mut resource = factory();
        if let Some(configurable) = resource.as_configure() {
            configurable.configure(self.data.clone(), &mut diags);
        }
        if diags.has_error() {
            return Err(diags);
        }
        Ok(resource)
    }
}
