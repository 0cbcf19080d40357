#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use flotilla_core::{
    ClientError, HandleRef, Operation, OperationHandle, RemoteComputeClient, ResourceGroup,
};
use flotilla_model::{ContainerGroupSpec, ResourceStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    CreateProbe(String),
    Status(String),
    DeleteProbe(String),
    /// Delete issued after `after_queries` status queries of that resource.
    Delete { name: String, after_queries: u32 },
}

/// Scripted in-memory provider.
#[derive(Clone)]
pub struct FakeClient {
    state: Arc<Mutex<FakeState>>,
}

struct FakeState {
    calls: Vec<Call>,
    specs: HashMap<String, ContainerGroupSpec>,
    create_polls: u32,
    delete_polls: u32,
    create_reject: HashMap<String, ClientError>,
    create_fail: HashMap<String, ClientError>,
    delete_fail: HashMap<String, ClientError>,
    terminal_at: HashMap<String, u32>,
    status_errors: HashMap<String, u32>,
    queries: HashMap<String, u32>,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                specs: HashMap::new(),
                create_polls: 1,
                delete_polls: 1,
                create_reject: HashMap::new(),
                create_fail: HashMap::new(),
                delete_fail: HashMap::new(),
                terminal_at: HashMap::new(),
                status_errors: HashMap::new(),
                queries: HashMap::new(),
            })),
        }
    }
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create handles report done on their `k`-th probe.
    pub fn create_done_after(self, k: u32) -> Self {
        self.state.lock().unwrap().create_polls = k;
        self
    }

    /// Delete handles report done on their `k`-th probe.
    pub fn delete_done_after(self, k: u32) -> Self {
        self.state.lock().unwrap().delete_polls = k;
        self
    }

    /// The create request for `name` is rejected outright.
    pub fn reject_create(self, name: &str) -> Self {
        self.state.lock().unwrap().create_reject.insert(
            name.to_string(),
            ClientError::Rejected {
                status: 409,
                message: "conflict".into(),
            },
        );
        self
    }

    /// The create handle for `name` completes with an error.
    pub fn fail_create(self, name: &str) -> Self {
        self.state.lock().unwrap().create_fail.insert(
            name.to_string(),
            ClientError::OperationFailed {
                operation: Operation::Create,
                status: "Failed".into(),
                message: "image pull failed".into(),
            },
        );
        self
    }

    /// The delete handle for `name` completes with an error.
    pub fn fail_delete(self, name: &str) -> Self {
        self.state.lock().unwrap().delete_fail.insert(
            name.to_string(),
            ClientError::OperationFailed {
                operation: Operation::Delete,
                status: "Failed".into(),
                message: "locked".into(),
            },
        );
        self
    }

    /// `name` reports `Terminated` from its `query`-th status query on.
    pub fn terminate_at(self, name: &str, query: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .terminal_at
            .insert(name.to_string(), query);
        self
    }

    /// The first `n` status queries for `name` fail.
    pub fn fail_status(self, name: &str, n: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .status_errors
            .insert(name.to_string(), n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn status_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Status(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<(String, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete {
                    name,
                    after_queries,
                } => Some((name, after_queries)),
                _ => None,
            })
            .collect()
    }

    pub fn spec(&self, name: &str) -> Option<ContainerGroupSpec> {
        self.state.lock().unwrap().specs.get(name).cloned()
    }

    pub fn create_probes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateProbe(_)))
            .count()
    }

    pub fn delete_probes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::DeleteProbe(_)))
            .count()
    }
}

struct FakeHandle {
    name: String,
    create: bool,
    remaining: u32,
    outcome: Option<ClientError>,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl OperationHandle for FakeHandle {
    async fn done(&mut self) -> Result<bool, ClientError> {
        let probe = if self.create {
            Call::CreateProbe(self.name.clone())
        } else {
            Call::DeleteProbe(self.name.clone())
        };
        self.state.lock().unwrap().calls.push(probe);
        if self.remaining > 1 {
            self.remaining -= 1;
            return Ok(false);
        }
        match self.outcome.take() {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }
}

#[async_trait]
impl RemoteComputeClient for FakeClient {
    async fn create(
        &self,
        _group: &ResourceGroup,
        name: &str,
        spec: &ContainerGroupSpec,
    ) -> Result<HandleRef, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(name.to_string()));
        if let Some(e) = state.create_reject.get(name) {
            return Err(e.clone());
        }
        state.specs.insert(name.to_string(), spec.clone());
        Ok(Box::new(FakeHandle {
            name: name.to_string(),
            create: true,
            remaining: state.create_polls,
            outcome: state.create_fail.get(name).cloned(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn get_status(
        &self,
        _group: &ResourceGroup,
        name: &str,
    ) -> Result<ResourceStatus, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Status(name.to_string()));

        let query = {
            let q = state.queries.entry(name.to_string()).or_insert(0);
            *q += 1;
            *q
        };
        if state.status_errors.get(name).is_some_and(|n| query <= *n) {
            return Err(ClientError::Request("connection reset".into()));
        }
        match state.terminal_at.get(name) {
            Some(at) if query >= *at => Ok(ResourceStatus::Terminated),
            _ if query == 1 => Ok(ResourceStatus::Pending),
            _ => Ok(ResourceStatus::Running("Running".into())),
        }
    }

    async fn delete(&self, _group: &ResourceGroup, name: &str) -> Result<HandleRef, ClientError> {
        let mut state = self.state.lock().unwrap();
        let after_queries = state.queries.get(name).copied().unwrap_or(0);
        state.calls.push(Call::Delete {
            name: name.to_string(),
            after_queries,
        });
        Ok(Box::new(FakeHandle {
            name: name.to_string(),
            create: false,
            remaining: state.delete_polls,
            outcome: state.delete_fail.get(name).cloned(),
            state: Arc::clone(&self.state),
        }))
    }
}

pub fn group() -> ResourceGroup {
    ResourceGroup::new("rg-experiments", "westeurope")
}

pub fn runner(batch: &str, id: u32) -> String {
    format!("flotilla-runner-{batch}-{id}")
}
