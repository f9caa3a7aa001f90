//! HTTP implementations of the collaborator traits.

pub mod image;
pub mod recurring_tasks;

use std::time::Duration;

pub use image::HttpImageService;
pub use recurring_tasks::HttpRecurringTaskService;

use crate::error::SagaError;

/// Builds the [`reqwest::Client`] shared by both HTTP collaborators.
///
/// A timeout counts as an ordinary failure of the call it interrupts.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, SagaError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SagaError::HttpClient(format!("failed to build HTTP client: {e}")))
}

/// Ensures a base URL ends with exactly one slash so paths can be appended.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}
