//! Provider registration
//!
//! [`AirflowProvider`] builds the SDK client once and hands it to every
//! resource as [`ProviderContext`].

use crate::resource::AirflowClusterResource;
use aeroform_config::ProviderConfig;
use aeroform_plugin::{Diagnostics, Provider, ProviderData, ResourceFactory};
use aeroform_sdk::{ClusterService, RestClusterService, RestConfig, Sdk, WaitConfig};
use async_trait::async_trait;
use std::sync::Arc;

pub const PROVIDER_TYPE_NAME: &str = "aeroform";

/// What resources receive from the provider
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub sdk: Sdk,
    /// Folder used when a resource does not set `folder_id`
    pub folder_id: Option<String>,
}

impl ProviderContext {
    pub fn from_config(config: &ProviderConfig) -> Self {
        let service = RestClusterService::new(RestConfig {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        });
        Self {
            sdk: Sdk::new(
                Arc::new(service),
                WaitConfig {
                    poll_interval: config.poll_interval,
                },
            ),
            folder_id: config.folder_id.clone(),
        }
    }
}

enum Source {
    /// Resolve `ProviderConfig` from env and config file on configure
    Environment,
    Context(ProviderContext),
}

pub struct AirflowProvider {
    source: Source,
}

impl AirflowProvider {
    pub fn new() -> Self {
        Self {
            source: Source::Environment,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            source: Source::Context(ProviderContext::from_config(config)),
        }
    }

    /// Provider backed by an arbitrary cluster service, e.g. the in-memory one
    pub fn with_service(service: Arc<dyn ClusterService>, folder_id: Option<String>) -> Self {
        Self {
            source: Source::Context(ProviderContext {
                sdk: Sdk::new(service, WaitConfig::default()),
                folder_id,
            }),
        }
    }
}

impl Default for AirflowProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for AirflowProvider {
    fn type_name(&self) -> &str {
        PROVIDER_TYPE_NAME
    }

    async fn configure(&self, diags: &mut Diagnostics) -> Option<ProviderData> {
        let context = match &self.source {
            Source::Context(context) => context.clone(),
            Source::Environment => match ProviderConfig::load() {
                Ok(config) => {
                    tracing::debug!(?config, "Provider configuration loaded");
                    ProviderContext::from_config(&config)
                }
                Err(e) => {
                    diags.add_error("Invalid provider configuration", e.to_string());
                    return None;
                }
            },
        };
        Some(Arc::new(context))
    }

    fn resources(&self) -> Vec<ResourceFactory> {
        vec![AirflowClusterResource::new_resource]
    }
}
