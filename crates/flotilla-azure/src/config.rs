use std::{fmt, path::Path};

use serde::Deserialize;

use crate::error::AzureError;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const CONTAINER_INSTANCE_API_VERSION: &str = "2023-05-01";
pub const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";

/// Service-principal settings, usually loaded from a JSON document.
#[derive(Clone, Deserialize)]
pub struct AzureConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub resource_group: String,
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
}

fn default_management_endpoint() -> String {
    DEFAULT_MANAGEMENT_ENDPOINT.to_string()
}

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_string()
}

impl AzureConfig {
    pub fn from_json_str(s: &str) -> Result<Self, AzureError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AzureError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AzureError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json_str(&raw)
    }

    /// OAuth2 scope for the management plane.
    pub fn scope(&self) -> String {
        format!("{}/.default", self.management_endpoint.trim_end_matches('/'))
    }

    pub(crate) fn management(&self) -> &str {
        self.management_endpoint.trim_end_matches('/')
    }

    pub(crate) fn resource_group_url(&self, group: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourcegroups/{}?api-version={}",
            self.management(),
            self.subscription_id,
            group,
            RESOURCE_GROUP_API_VERSION
        )
    }

    pub(crate) fn container_group_url(&self, group: &str, name: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.ContainerInstance/containerGroups/{}?api-version={}",
            self.management(),
            self.subscription_id,
            group,
            name,
            CONTAINER_INSTANCE_API_VERSION
        )
    }
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .field("resource_group", &self.resource_group)
            .field("management_endpoint", &self.management_endpoint)
            .field("authority_host", &self.authority_host)
            .finish()
    }
}
