use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, PoisonError, RwLock},
};

use flotilla_model::{ModelError, ResourceName, RunnerId, RunnerState, RunnerTask};
use tracing::{debug, error, info};

/// In-memory record of every runner in a batch.
///
/// Transitions are forward-only; the ledger outlives a failed run so the caller
/// can see which resources were created and still need out-of-band cleanup.
#[derive(Clone, Default)]
pub struct BatchLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

#[derive(Default)]
struct LedgerInner {
    /// Runners indexed by resource name.
    tasks: HashMap<ResourceName, RunnerTask>,
    /// Resource names in registration order.
    order: Vec<ResourceName>,
}

impl LedgerInner {
    fn insert(&mut self, task: RunnerTask) {
        if !self.tasks.contains_key(&task.resource_name) {
            self.order.push(task.resource_name.clone());
        }
        self.tasks.insert(task.resource_name.clone(), task);
    }
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a runner about to be launched (state `Pending`).
    pub fn register(&self, id: RunnerId, name: impl Into<ResourceName>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(RunnerTask::new(id, name));
    }

    /// Take a resource over for termination polling (state `Started`).
    ///
    /// Unknown names get a fresh record, e.g. when resuming cleanup of an earlier
    /// batch. A known runner keeps its id and has its record restarted, so a runner
    /// left `Creating` or `Failed` by an aborted launch can still be polled and deleted.
    pub fn adopt(&self, name: impl Into<ResourceName>) {
        let name = name.into();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let (id, previous) = match inner.tasks.get(&name) {
            Some(task) => (task.id, Some(task.state)),
            None => (inner.order.len() as RunnerId, None),
        };
        if let Some(from) = previous {
            info!(target: "flotilla.core.ledger", runner = %name, %from, "runner adopted for cleanup");
        }
        let mut task = RunnerTask::new(id, name);
        task.state = RunnerState::Started;
        inner.insert(task);
    }

    pub fn contains(&self, name: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tasks.contains_key(name)
    }

    /// Advance a runner to `next`.
    pub fn advance(&self, name: &str, next: RunnerState) -> Result<(), ModelError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let task = inner
            .tasks
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownRunner(name.to_string()))?;

        let from = task.state;
        task.advance(next)?;
        log_transition(name, from, next);
        Ok(())
    }

    /// Move a runner to `Failed` with the provider's reason.
    pub fn fail(&self, name: &str, reason: impl Into<String>) -> Result<(), ModelError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let task = inner
            .tasks
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownRunner(name.to_string()))?;

        let from = task.state;
        let reason = reason.into();
        task.fail(reason.clone())?;
        error!(target: "flotilla.core.ledger", runner = name, %from, %reason, "runner failed");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<RunnerTask> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tasks.get(name).cloned()
    }

    /// All runners in registration order.
    pub fn list_all(&self) -> Vec<RunnerTask> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|name| inner.tasks.get(name).cloned())
            .collect()
    }

    pub fn list_by_state(&self, state: RunnerState) -> Vec<RunnerTask> {
        self.list_all()
            .into_iter()
            .filter(|t| t.state == state)
            .collect()
    }

    /// Resource names currently in `state`.
    pub fn names_in(&self, state: RunnerState) -> BTreeSet<ResourceName> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .tasks
            .values()
            .filter(|t| t.state == state)
            .map(|t| t.resource_name.clone())
            .collect()
    }

    /// Resource names that may still exist remotely (created or being created, not deleted).
    pub fn possibly_live(&self) -> BTreeSet<ResourceName> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .tasks
            .values()
            .filter(|t| !matches!(t.state, RunnerState::Pending | RunnerState::Deleted))
            .map(|t| t.resource_name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn log_transition(name: &str, from: RunnerState, to: RunnerState) {
    match to {
        RunnerState::Started => {
            info!(target: "flotilla.core.ledger", runner = name, %from, "runner started")
        }
        RunnerState::Terminated => {
            info!(target: "flotilla.core.ledger", runner = name, %from, "runner terminated")
        }
        RunnerState::Deleted => {
            info!(target: "flotilla.core.ledger", runner = name, %from, "runner deleted")
        }
        _ => debug!(target: "flotilla.core.ledger", runner = name, %from, %to, "runner transition"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get() {
        let ledger = BatchLedger::new();
        ledger.register(0, "r-0");

        let task = ledger.get("r-0").expect("registered");
        assert_eq!(task.id, 0);
        assert_eq!(task.state, RunnerState::Pending);
        assert!(ledger.contains("r-0"));
        assert!(!ledger.contains("r-1"));
    }

    #[test]
    fn advance_through_full_lifecycle() {
        let ledger = BatchLedger::new();
        ledger.register(0, "r-0");
        for state in [
            RunnerState::Creating,
            RunnerState::Started,
            RunnerState::Polling,
            RunnerState::Terminated,
            RunnerState::Deleting,
            RunnerState::Deleted,
        ] {
            ledger.advance("r-0", state).unwrap();
        }
        assert_eq!(ledger.get("r-0").unwrap().state, RunnerState::Deleted);
        assert!(ledger.possibly_live().is_empty());
    }

    #[test]
    fn advance_rejects_regression() {
        let ledger = BatchLedger::new();
        ledger.adopt("r-0");
        ledger.advance("r-0", RunnerState::Polling).unwrap();
        ledger.advance("r-0", RunnerState::Terminated).unwrap();

        let err = ledger.advance("r-0", RunnerState::Started).unwrap_err();
        assert!(matches!(err, ModelError::IllegalTransition { .. }));
        assert_eq!(ledger.get("r-0").unwrap().state, RunnerState::Terminated);
    }

    #[test]
    fn unknown_runner_is_an_error() {
        let ledger = BatchLedger::new();
        let err = ledger.advance("nope", RunnerState::Creating).unwrap_err();
        assert_eq!(err, ModelError::UnknownRunner("nope".into()));
    }

    #[test]
    fn fail_records_reason() {
        let ledger = BatchLedger::new();
        ledger.register(1, "r-1");
        ledger.advance("r-1", RunnerState::Creating).unwrap();
        ledger.fail("r-1", "quota").unwrap();

        let task = ledger.get("r-1").unwrap();
        assert_eq!(task.state, RunnerState::Failed);
        assert_eq!(task.error.as_deref(), Some("quota"));
        assert!(ledger.possibly_live().contains("r-1"));
    }

    #[test]
    fn list_all_keeps_registration_order() {
        let ledger = BatchLedger::new();
        ledger.register(0, "r-0");
        ledger.register(1, "r-1");
        ledger.register(2, "r-2");
        ledger.advance("r-1", RunnerState::Creating).unwrap();

        let names: Vec<_> = ledger
            .list_all()
            .into_iter()
            .map(|t| t.resource_name)
            .collect();
        assert_eq!(names, vec!["r-0", "r-1", "r-2"]);
        assert_eq!(ledger.list_by_state(RunnerState::Pending).len(), 2);
        assert_eq!(
            ledger.names_in(RunnerState::Creating),
            BTreeSet::from(["r-1".to_string()])
        );
    }

    #[test]
    fn adopt_assigns_next_index() {
        let ledger = BatchLedger::new();
        ledger.register(0, "r-0");
        ledger.adopt("legacy-7");
        let task = ledger.get("legacy-7").unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.state, RunnerState::Started);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn adopt_restarts_a_failed_runner() {
        let ledger = BatchLedger::new();
        ledger.register(0, "r-0");
        ledger.register(1, "r-1");
        ledger.advance("r-1", RunnerState::Creating).unwrap();
        ledger.fail("r-1", "image pull failed").unwrap();

        ledger.adopt("r-1");
        let task = ledger.get("r-1").unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.state, RunnerState::Started);
        assert!(task.error.is_none());
        assert_eq!(ledger.len(), 2);
        ledger.advance("r-1", RunnerState::Polling).unwrap();
    }
}
