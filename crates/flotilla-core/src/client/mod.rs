//! Capability interface over a provider's container-group lifecycle API.
//!
//! The coordinator depends only on these traits; provider crates (and test fakes)
//! implement them.

use async_trait::async_trait;
use flotilla_model::{ContainerGroupSpec, ResourceStatus};

use crate::error::ClientError;

/// Resource group that hosts the batch's container groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub name: String,
    /// Region new container groups are placed in.
    pub location: String,
}

impl ResourceGroup {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Kind of remote operation a handle tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token for an in-flight remote operation.
#[async_trait]
pub trait OperationHandle: Send {
    /// Non-blocking completion probe.
    ///
    /// `Ok(false)` while the operation is still running, `Ok(true)` once it has
    /// succeeded, `Err` once it has failed. After `Ok(true)` the handle is not
    /// polled again.
    async fn done(&mut self) -> Result<bool, ClientError>;
}

/// Shared alias for boxed handles returned by clients.
pub type HandleRef = Box<dyn OperationHandle>;

/// Handle for an operation the provider acknowledged synchronously.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadyHandle;

impl ReadyHandle {
    pub fn boxed() -> HandleRef {
        Box::new(ReadyHandle)
    }
}

#[async_trait]
impl OperationHandle for ReadyHandle {
    async fn done(&mut self) -> Result<bool, ClientError> {
        Ok(true)
    }
}

/// Container-group lifecycle operations of a cloud provider.
#[async_trait]
pub trait RemoteComputeClient: Send + Sync {
    /// Request creation of container group `name`; returns once the request is accepted.
    async fn create(
        &self,
        group: &ResourceGroup,
        name: &str,
        spec: &ContainerGroupSpec,
    ) -> Result<HandleRef, ClientError>;

    /// Current status of container group `name`.
    async fn get_status(
        &self,
        group: &ResourceGroup,
        name: &str,
    ) -> Result<ResourceStatus, ClientError>;

    /// Request deletion of container group `name`; returns once the request is accepted.
    async fn delete(&self, group: &ResourceGroup, name: &str) -> Result<HandleRef, ClientError>;
}
