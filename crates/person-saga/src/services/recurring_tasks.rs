//! Recurring task service trait and in-memory implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::RecurringTaskId;

use crate::error::SagaError;
use crate::model::{Execution, NewRecurringTask, RecurringTask};

/// Operations the orchestrator needs from the recurring-task service.
#[async_trait]
pub trait RecurringTaskService: Send + Sync {
    /// Creates a task and returns it with its assigned id.
    async fn create(&self, task: NewRecurringTask) -> Result<RecurringTask, SagaError>;

    /// Loads a task, or `None` if the service does not know it.
    async fn find_by_id(&self, id: RecurringTaskId) -> Result<Option<RecurringTask>, SagaError>;

    /// Overwrites the remote task with `task`.
    async fn update(&self, task: &RecurringTask) -> Result<(), SagaError>;

    /// Deletes a task.
    async fn delete_by_id(&self, id: RecurringTaskId) -> Result<(), SagaError>;

    /// Appends an execution to a task's history.
    async fn add_execution(
        &self,
        execution: Execution,
        task_id: RecurringTaskId,
    ) -> Result<(), SagaError>;
}

#[derive(Debug, Default)]
struct InMemoryRecurringTaskState {
    tasks: BTreeMap<RecurringTaskId, RecurringTask>,
    executions: Vec<(RecurringTaskId, Execution)>,
    next_id: i64,
    create_calls: usize,
    update_calls: usize,
    delete_calls: usize,
    fail_on_create: bool,
    fail_on_update: bool,
    fail_on_delete: bool,
    fail_on_add_execution: bool,
}

/// In-memory recurring task service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecurringTaskService {
    state: Arc<Mutex<InMemoryRecurringTaskState>>,
}

impl InMemoryRecurringTaskService {
    /// Creates a new in-memory recurring task service.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryRecurringTaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the service to fail every create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state().fail_on_create = fail;
    }

    /// Configures the service to fail every update call.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.state().fail_on_update = fail;
    }

    /// Configures the service to fail every delete call.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state().fail_on_delete = fail;
    }

    /// Configures the service to fail every add_execution call.
    pub fn set_fail_on_add_execution(&self, fail: bool) {
        self.state().fail_on_add_execution = fail;
    }

    /// Returns the number of stored tasks.
    pub fn task_count(&self) -> usize {
        self.state().tasks.len()
    }

    /// Returns a copy of a stored task.
    pub fn get(&self, id: RecurringTaskId) -> Option<RecurringTask> {
        self.state().tasks.get(&id).cloned()
    }

    /// Removes a task without going through the trait, to simulate a
    /// diverged aggregate.
    pub fn remove(&self, id: RecurringTaskId) {
        self.state().tasks.remove(&id);
    }

    /// Returns how many times create was called.
    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    /// Returns how many times update was called, including failed calls.
    pub fn update_calls(&self) -> usize {
        self.state().update_calls
    }

    /// Returns how many times delete_by_id was called.
    pub fn delete_calls(&self) -> usize {
        self.state().delete_calls
    }

    /// Returns every execution recorded so far, with its task id.
    pub fn executions(&self) -> Vec<(RecurringTaskId, Execution)> {
        self.state().executions.clone()
    }
}

#[async_trait]
impl RecurringTaskService for InMemoryRecurringTaskService {
    async fn create(&self, task: NewRecurringTask) -> Result<RecurringTask, SagaError> {
        let mut state = self.state();
        state.create_calls += 1;

        if state.fail_on_create {
            return Err(SagaError::RecurringTaskService(
                "Recurring tasks unavailable".to_string(),
            ));
        }

        state.next_id += 1;
        let task = task.with_id(RecurringTaskId::new(state.next_id));
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn find_by_id(&self, id: RecurringTaskId) -> Result<Option<RecurringTask>, SagaError> {
        Ok(self.state().tasks.get(&id).cloned())
    }

    async fn update(&self, task: &RecurringTask) -> Result<(), SagaError> {
        let mut state = self.state();
        state.update_calls += 1;

        if state.fail_on_update {
            return Err(SagaError::RecurringTaskService(
                "Recurring tasks unavailable".to_string(),
            ));
        }

        match state.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(SagaError::RecurringTaskNotFound(task.id)),
        }
    }

    async fn delete_by_id(&self, id: RecurringTaskId) -> Result<(), SagaError> {
        let mut state = self.state();
        state.delete_calls += 1;

        if state.fail_on_delete {
            return Err(SagaError::RecurringTaskService(
                "Recurring tasks unavailable".to_string(),
            ));
        }

        match state.tasks.remove(&id) {
            Some(_) => Ok(()),
            None => Err(SagaError::RecurringTaskNotFound(id)),
        }
    }

    async fn add_execution(
        &self,
        execution: Execution,
        task_id: RecurringTaskId,
    ) -> Result<(), SagaError> {
        let mut state = self.state();

        if state.fail_on_add_execution {
            return Err(SagaError::RecurringTaskService(
                "Recurring tasks unavailable".to_string(),
            ));
        }

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(SagaError::RecurringTaskNotFound(task_id))?;
        if task.last_execution.is_none_or(|last| execution.date > last) {
            task.last_execution = Some(execution.date);
        }
        state.executions.push((task_id, execution));

        Ok(())
    }
}
