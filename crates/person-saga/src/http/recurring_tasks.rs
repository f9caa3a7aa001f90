//! Recurring task service client.

use async_trait::async_trait;
use common::RecurringTaskId;
use reqwest::{Response, StatusCode};

use super::normalize_base_url;
use crate::error::SagaError;
use crate::model::{Execution, NewRecurringTask, RecurringTask};
use crate::services::RecurringTaskService;

const API_CONTEXT_ROOT: &str = "api/recurring-task/";

/// [`RecurringTaskService`] backed by the recurring-tasks microservice.
#[derive(Debug, Clone)]
pub struct HttpRecurringTaskService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecurringTaskService {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}{API_CONTEXT_ROOT}", self.base_url)
    }

    /// `{id}`, as served by GET.
    fn task_resource_url(&self, id: RecurringTaskId) -> String {
        format!("{}{id}", self.collection_url())
    }

    /// `{id}/`, as served by PUT, DELETE and the execution endpoint.
    fn task_url(&self, id: RecurringTaskId) -> String {
        format!("{}/", self.task_resource_url(id))
    }
}

fn request_error(e: reqwest::Error) -> SagaError {
    SagaError::RecurringTaskService(e.to_string())
}

/// Maps a non-success response to an error; 404 means the task is unknown.
async fn check(response: Response, id: Option<RecurringTaskId>) -> Result<Response, SagaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
        return Err(SagaError::RecurringTaskNotFound(id));
    }
    let body = response.text().await.unwrap_or_default();
    Err(SagaError::RecurringTaskService(format!(
        "recurring tasks microservice responded with {status}: {body}"
    )))
}

#[async_trait]
impl RecurringTaskService for HttpRecurringTaskService {
    async fn create(&self, task: NewRecurringTask) -> Result<RecurringTask, SagaError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(&task)
            .send()
            .await
            .map_err(request_error)?;

        check(response, None)
            .await?
            .json()
            .await
            .map_err(request_error)
    }

    async fn find_by_id(&self, id: RecurringTaskId) -> Result<Option<RecurringTask>, SagaError> {
        let response = self
            .client
            .get(self.task_resource_url(id))
            .send()
            .await
            .map_err(request_error)?;

        match check(response, Some(id)).await {
            Ok(response) => Ok(Some(response.json().await.map_err(request_error)?)),
            Err(SagaError::RecurringTaskNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, task: &RecurringTask) -> Result<(), SagaError> {
        let response = self
            .client
            .put(self.task_url(task.id))
            .json(task)
            .send()
            .await
            .map_err(request_error)?;

        check(response, Some(task.id)).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: RecurringTaskId) -> Result<(), SagaError> {
        let response = self
            .client
            .delete(self.task_url(id))
            .send()
            .await
            .map_err(request_error)?;

        check(response, Some(id)).await?;
        Ok(())
    }

    async fn add_execution(
        &self,
        execution: Execution,
        task_id: RecurringTaskId,
    ) -> Result<(), SagaError> {
        let url = format!("{}execution/", self.task_url(task_id));
        let response = self
            .client
            .post(url)
            .json(&execution)
            .send()
            .await
            .map_err(request_error)?;

        check(response, Some(task_id)).await?;
        Ok(())
    }
}
