use std::{fmt, sync::Arc};

use async_trait::async_trait;
use flotilla_core::{
    ClientError, HandleRef, Operation, ReadyHandle, RemoteComputeClient, ResourceGroup,
};
use flotilla_model::{ContainerGroupSpec, ResourceStatus};
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::{
    config::AzureConfig,
    credential::{ClientSecretCredential, TokenCredential},
    error::AzureError,
    operation::LroHandle,
    wire::{ContainerGroupBody, ContainerGroupView, ErrorResponse, ResourceGroupView},
};

/// Authenticated HTTP access to the management plane.
#[derive(Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
}

impl Transport {
    pub(crate) async fn get(&self, url: &str) -> Result<Response, AzureError> {
        let token = self.credential.token().await?;
        Ok(self.http.get(url).bearer_auth(token).send().await?)
    }

    async fn put<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, AzureError> {
        let token = self.credential.token().await?;
        Ok(self
            .http
            .put(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    async fn delete(&self, url: &str) -> Result<Response, AzureError> {
        let token = self.credential.token().await?;
        Ok(self.http.delete(url).bearer_auth(token).send().await?)
    }

    /// Turn a non-success response into an [`AzureError::Api`].
    pub(crate) async fn api_error(response: Response) -> AzureError {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return AzureError::Http(e),
        };
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => AzureError::Api {
                status,
                code: parsed.error.code,
                message: parsed.error.message,
            },
            Err(_) => AzureError::Api {
                status,
                code: String::new(),
                message: body,
            },
        }
    }
}

/// [`RemoteComputeClient`] backed by Azure Container Instances.
#[derive(Clone)]
pub struct AciClient {
    config: Arc<AzureConfig>,
    transport: Transport,
}

impl AciClient {
    /// Client authenticating with the service principal in `config`.
    pub fn new(config: AzureConfig) -> Self {
        let http = reqwest::Client::new();
        let credential = Arc::new(ClientSecretCredential::new(http.clone(), &config));
        Self::with_credential(config, http, credential)
    }

    pub fn with_credential(
        config: AzureConfig,
        http: reqwest::Client,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport: Transport { http, credential },
        }
    }

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    /// Look up the configured resource group (its location is needed for creates).
    pub async fn resource_group(&self) -> Result<ResourceGroup, AzureError> {
        let url = self.config.resource_group_url(&self.config.resource_group);
        let response = self.transport.get(&url).await?;
        if !response.status().is_success() {
            return Err(Transport::api_error(response).await);
        }

        let body = response.text().await?;
        let view: ResourceGroupView = serde_json::from_str(&body)
            .map_err(|e| AzureError::InvalidResponse(format!("resource group: {e}")))?;
        Ok(ResourceGroup::new(view.name, view.location))
    }

    async fn create_group(
        &self,
        group: &ResourceGroup,
        name: &str,
        spec: &ContainerGroupSpec,
    ) -> Result<HandleRef, AzureError> {
        let url = self.config.container_group_url(&group.name, name);
        let response = self
            .transport
            .put(&url, &ContainerGroupBody::new(group, spec))
            .await?;
        if !response.status().is_success() {
            return Err(Transport::api_error(response).await);
        }
        debug!(target: "flotilla.azure", runner = name, status = %response.status(), "create accepted");
        Ok(LroHandle::from_response(
            Operation::Create,
            &self.transport,
            &response,
        ))
    }

    async fn group_status(
        &self,
        group: &ResourceGroup,
        name: &str,
    ) -> Result<ResourceStatus, AzureError> {
        let url = self.config.container_group_url(&group.name, name);
        let response = self.transport.get(&url).await?;
        if !response.status().is_success() {
            return Err(Transport::api_error(response).await);
        }

        let body = response.text().await?;
        let view: ContainerGroupView = serde_json::from_str(&body)
            .map_err(|e| AzureError::InvalidResponse(format!("container group {name}: {e}")))?;
        Ok(view.status())
    }

    async fn delete_group(&self, group: &ResourceGroup, name: &str) -> Result<HandleRef, AzureError> {
        let url = self.config.container_group_url(&group.name, name);
        let response = self.transport.delete(&url).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(target: "flotilla.azure", runner = name, "already gone");
                Ok(ReadyHandle::boxed())
            }
            s if s.is_success() => {
                debug!(target: "flotilla.azure", runner = name, status = %s, "delete accepted");
                Ok(LroHandle::from_response(
                    Operation::Delete,
                    &self.transport,
                    &response,
                ))
            }
            _ => Err(Transport::api_error(response).await),
        }
    }
}

impl fmt::Debug for AciClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AciClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteComputeClient for AciClient {
    async fn create(
        &self,
        group: &ResourceGroup,
        name: &str,
        spec: &ContainerGroupSpec,
    ) -> Result<HandleRef, ClientError> {
        Ok(self.create_group(group, name, spec).await?)
    }

    async fn get_status(
        &self,
        group: &ResourceGroup,
        name: &str,
    ) -> Result<ResourceStatus, ClientError> {
        Ok(self.group_status(group, name).await?)
    }

    async fn delete(&self, group: &ResourceGroup, name: &str) -> Result<HandleRef, ClientError> {
        Ok(self.delete_group(group, name).await?)
    }
}
