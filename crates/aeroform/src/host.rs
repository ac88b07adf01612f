//! The provider as seen from the CLI

use crate::utils;
use aeroform_airflow::{AirflowClusterResource, AirflowProvider, PROVIDER_TYPE_NAME};
use aeroform_plugin::{ProviderServer, Resource, Schema};

/// The managed cluster resource, configured or not
pub struct Host {
    pub resource_type: String,
    pub resource: Box<dyn Resource>,
}

impl Host {
    /// Configure the provider from the environment and config file
    pub async fn connect() -> anyhow::Result<Self> {
        let provider = AirflowProvider::new();
        let server = match ProviderServer::start(&provider).await {
            Ok(server) => server,
            Err(diags) => {
                utils::print_diagnostics(&diags);
                anyhow::bail!("Failed to configure the {} provider", PROVIDER_TYPE_NAME);
            }
        };

        let resource_type = AirflowClusterResource::new().type_name(server.type_name());
        let resource = match server.resource(&resource_type) {
            Ok(resource) => resource,
            Err(diags) => {
                utils::print_diagnostics(&diags);
                anyhow::bail!("Failed to configure resource type {}", resource_type);
            }
        };
        Ok(Self {
            resource_type,
            resource,
        })
    }

    /// Unconfigured resource; enough for schema and config validation
    pub fn offline() -> Self {
        let resource = AirflowClusterResource::new_resource();
        Self {
            resource_type: resource.type_name(PROVIDER_TYPE_NAME),
            resource,
        }
    }

    pub fn schema(&self) -> Schema {
        self.resource.schema()
    }

    pub fn address(&self, name: &str) -> String {
        format!("{}.{}", self.resource_type, name)
    }

    /// Resource name of an address owned by this host
    pub fn name_of<'a>(&self, address: &'a str) -> Option<&'a str> {
        address
            .strip_prefix(self.resource_type.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
    }

    pub fn ensure_type(&self, resource_type: &str) -> anyhow::Result<()> {
        if resource_type != self.resource_type {
            anyhow::bail!(
                "Resource type {} is not managed by this provider (expected {})",
                resource_type,
                self.resource_type
            );
        }
        Ok(())
    }
}
