//! Types exchanged between the orchestrator, its callers and its collaborators.

use chrono::NaiveDate;
use common::{PersonId, RecurringTaskId};
use person_store::Person;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};

/// A recurring task as owned by the recurring-task service.
///
/// `name` mirrors the Person's name by convention only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTask {
    pub id: RecurringTaskId,
    pub name: String,
    #[serde(rename = "minNumberOfDaysBetweenExecutions")]
    pub min_days_between: u32,
    #[serde(rename = "maxNumberOfDaysBetweenExecutions")]
    pub max_days_between: u32,
    pub last_execution: Option<NaiveDate>,
}

/// Definition of a recurring task that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecurringTask {
    pub name: String,
    #[serde(rename = "minNumberOfDaysBetweenExecutions")]
    pub min_days_between: u32,
    #[serde(rename = "maxNumberOfDaysBetweenExecutions")]
    pub max_days_between: u32,
    pub last_execution: Option<NaiveDate>,
}

impl NewRecurringTask {
    /// Attaches the id assigned by the service.
    pub fn with_id(self, id: RecurringTaskId) -> RecurringTask {
        RecurringTask {
            id,
            name: self.name,
            min_days_between: self.min_days_between,
            max_days_between: self.max_days_between,
            last_execution: self.last_execution,
        }
    }
}

/// Who recorded a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionSource {
    /// Logged manually by the user.
    User,
    /// Inferred from an event in another system.
    Event,
}

/// An append-only event recording that a contact took place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub date: NaiveDate,
    pub source: ExecutionSource,
}

impl Execution {
    pub fn new(date: NaiveDate, source: ExecutionSource) -> Self {
        Self { date, source }
    }
}

/// A contact to record against a Person. Not persisted on its own.
///
/// The note always replaces the Person's latest updates; a date additionally
/// appends an [`Execution`] to the linked recurring task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub latest_updates: String,
    pub last_contact: Option<NaiveDate>,
}

impl Contact {
    /// A contact carrying only a note.
    pub fn note(latest_updates: impl Into<String>) -> Self {
        Self {
            latest_updates: latest_updates.into(),
            last_contact: None,
        }
    }

    /// Sets the date the contact took place.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.last_contact = Some(date);
        self
    }
}

/// References to the two thumbnails derived from one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Thumbnails {
    pub color: String,
    pub sepia: String,
}

impl Thumbnails {
    pub fn new(color: impl Into<String>, sepia: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            sepia: sepia.into(),
        }
    }

    /// Both references, color first.
    pub fn refs(&self) -> [&str; 2] {
        [&self.color, &self.sepia]
    }
}

/// Input of [`crate::PersonSaga::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDefinition {
    pub name: String,
    /// Uploaded image, as a data URL or bare base64.
    pub image_content: String,
    pub min_days_between_contacts: u32,
    pub max_days_between_contacts: u32,
    pub last_contact: Option<NaiveDate>,
    pub latest_updates: Option<String>,
}

impl PersonDefinition {
    pub fn new(
        name: impl Into<String>,
        image_content: impl Into<String>,
        min_days_between_contacts: u32,
        max_days_between_contacts: u32,
    ) -> Self {
        Self {
            name: name.into(),
            image_content: image_content.into(),
            min_days_between_contacts,
            max_days_between_contacts,
            last_contact: None,
            latest_updates: None,
        }
    }

    pub(crate) fn recurring_task(&self) -> NewRecurringTask {
        NewRecurringTask {
            name: self.name.clone(),
            min_days_between: self.min_days_between_contacts,
            max_days_between: self.max_days_between_contacts,
            last_execution: self.last_contact,
        }
    }
}

/// Input of [`crate::PersonSaga::update`]: the full desired state.
///
/// Thumbnails are kept unless `new_image_content` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
    pub id: PersonId,
    pub name: String,
    pub new_image_content: Option<String>,
    pub min_days_between_contacts: u32,
    pub max_days_between_contacts: u32,
    pub last_contact: Option<NaiveDate>,
    pub latest_updates: Option<String>,
}

impl PersonUpdate {
    /// Builds an update that leaves everything as shown in `view`.
    pub fn from_view(view: &PersonView) -> Self {
        Self {
            id: view.id,
            name: view.name.clone(),
            new_image_content: None,
            min_days_between_contacts: view.min_days_between_contacts,
            max_days_between_contacts: view.max_days_between_contacts,
            last_contact: view.last_contact,
            latest_updates: view.latest_updates.clone(),
        }
    }
}

/// The composed view of a Person: row fields plus cadence state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonView {
    pub id: PersonId,
    pub name: String,
    pub color_thumbnail: String,
    pub sepia_thumbnail: String,
    pub recurring_task_id: RecurringTaskId,
    pub min_days_between_contacts: u32,
    pub max_days_between_contacts: u32,
    pub last_contact: Option<NaiveDate>,
    pub latest_updates: Option<String>,
}

impl PersonView {
    pub fn compose(id: PersonId, person: &Person, task: &RecurringTask) -> Self {
        Self {
            id,
            name: person.name.clone(),
            color_thumbnail: person.color_thumbnail.clone(),
            sepia_thumbnail: person.sepia_thumbnail.clone(),
            recurring_task_id: person.recurring_task_id,
            min_days_between_contacts: task.min_days_between,
            max_days_between_contacts: task.max_days_between,
            last_contact: task.last_execution,
            latest_updates: person.latest_updates.clone(),
        }
    }
}

/// Outcome of [`crate::PersonSaga::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    Deleted,
    DoesNotExist,
}

pub(crate) fn validate_cadence(min_days: u32, max_days: u32) -> Result<()> {
    if min_days > max_days {
        return Err(SagaError::InvalidInput(format!(
            "minimum days between contacts ({min_days}) exceeds maximum ({max_days})"
        )));
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SagaError::InvalidInput("name is required".to_string()));
    }
    Ok(())
}
