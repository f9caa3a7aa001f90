//! Saga orchestrator for the Person aggregate.

use std::future::Future;
use std::time::Instant;

use common::{PersonId, RecurringTaskId};
use person_store::{Person, PersonStore, PersonStoreError, PersonStoreExt};

use crate::error::{Result, SagaError};
use crate::image_content;
use crate::model::{
    Contact, DeleteResult, Execution, ExecutionSource, PersonDefinition, PersonUpdate, PersonView,
    RecurringTask, Thumbnails, validate_cadence, validate_name,
};
use crate::services::{ImageService, RecurringTaskService};
use crate::steps;

/// Orchestrates create, update and delete of Person aggregates.
///
/// A Person lives in three places: its row in the person store, two
/// thumbnails in the image service and one recurring task in the
/// recurring-task service. There is no shared transaction, so every
/// operation runs its calls in a fixed order and, when a step fails, undoes
/// the steps that already succeeded with compensating calls. Compensation
/// is best effort: a failing compensation is logged and the original error
/// is returned.
///
/// Operations on the same Person are not serialized. Concurrent updates or
/// an update racing a delete resolve as last writer wins.
pub struct PersonSaga<S, I, R>
where
    S: PersonStore,
    I: ImageService,
    R: RecurringTaskService,
{
    store: S,
    images: I,
    tasks: R,
}

/// What an update has to do, and how far it got.
#[derive(Debug)]
struct UpdatePlan {
    original: Person,
    original_task: RecurringTask,
    desired: Person,
    desired_task: RecurringTask,
    new_image: Option<Vec<u8>>,
    new_thumbnails: Option<Thumbnails>,
    task_updated: bool,
}

impl<S, I, R> PersonSaga<S, I, R>
where
    S: PersonStore,
    I: ImageService,
    R: RecurringTaskService,
{
    /// Creates a new orchestrator over the three collaborators.
    pub fn new(store: S, images: I, tasks: R) -> Self {
        Self {
            store,
            images,
            tasks,
        }
    }

    /// Loads one Person with its cadence state.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: PersonId) -> Result<Option<PersonView>> {
        match self.store.find_by_id(id).await? {
            Some(person) => {
                let task = self.load_task(id, &person).await?;
                Ok(Some(PersonView::compose(id, &person, &task)))
            }
            None => Ok(None),
        }
    }

    /// Loads every Person with its cadence state, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<PersonView>> {
        let persons = self.store.find_all().await?;
        let mut views = Vec::with_capacity(persons.len());
        for person in persons {
            let id = persisted_id(&person)?;
            let task = self.load_task(id, &person).await?;
            views.push(PersonView::compose(id, &person, &task));
        }
        Ok(views)
    }

    /// Creates a Person: thumbnails, then recurring task, then row.
    ///
    /// Fails with `Conflict` if the name is taken. When a step fails, the
    /// steps before it are compensated in reverse order.
    #[tracing::instrument(skip(self, definition), fields(name = %definition.name))]
    pub async fn create(&self, definition: PersonDefinition) -> Result<PersonView> {
        let started = Instant::now();
        let result = self.run_create(definition).await;
        observe(steps::OP_CREATE, started, &result);
        result
    }

    /// Updates a Person to the given desired state.
    ///
    /// Only the parts that differ are written. The row is written last with
    /// a checkpoint commit; if anything fails before or during that write,
    /// new thumbnails are deleted and the recurring task is restored. Old
    /// thumbnails replaced by a new image are deleted only after success,
    /// and a failure there does not fail the update.
    #[tracing::instrument(skip(self, update), fields(person_id = %update.id))]
    pub async fn update(&self, update: PersonUpdate) -> Result<PersonView> {
        let started = Instant::now();
        let result = self.run_update(update).await;
        observe(steps::OP_UPDATE, started, &result);
        result
    }

    /// Deletes a Person: row, then recurring task, then thumbnails.
    ///
    /// Forward only. Once the row is gone there is nothing to compensate
    /// against, so a later failure leaves an orphaned task or image behind
    /// and is returned to the caller.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PersonId) -> Result<DeleteResult> {
        let started = Instant::now();
        let result = self.run_delete(id).await;
        observe(steps::OP_DELETE, started, &result);
        result
    }

    /// Records a contact with a Person.
    ///
    /// The note is staged on the row and only saved once the execution (if
    /// the contact carries a date) has been accepted by the recurring-task
    /// service.
    #[tracing::instrument(skip(self, contact))]
    pub async fn add_contact(
        &self,
        id: PersonId,
        contact: Contact,
        source: ExecutionSource,
    ) -> Result<()> {
        let started = Instant::now();
        let result = self.run_add_contact(id, contact, source).await;
        observe(steps::OP_ADD_CONTACT, started, &result);
        result
    }

    async fn run_create(&self, definition: PersonDefinition) -> Result<PersonView> {
        validate_name(&definition.name)?;
        validate_cadence(
            definition.min_days_between_contacts,
            definition.max_days_between_contacts,
        )?;
        let image = image_content::decode(&definition.image_content)?;

        if self.store.name_exists(&definition.name).await? {
            return Err(SagaError::Conflict(definition.name));
        }

        // 1. Thumbnails
        tracing::info!(step = steps::STEP_CREATE_THUMBNAILS, "saga step started");
        let thumbnails = self.images.create_thumbnails(&image).await?;

        // 2. Recurring task
        tracing::info!(step = steps::STEP_CREATE_RECURRING_TASK, "saga step started");
        let task = match self.tasks.create(definition.recurring_task()).await {
            Ok(task) => task,
            Err(e) => {
                step_failed(steps::OP_CREATE, steps::STEP_CREATE_RECURRING_TASK, &e);
                self.delete_new_thumbnails(&thumbnails).await;
                return Err(e);
            }
        };

        // 3. Person row
        tracing::info!(step = steps::STEP_SAVE_PERSON, "saga step started");
        let mut row = Person::new(
            definition.name,
            thumbnails.color.clone(),
            thumbnails.sepia.clone(),
            task.id,
        );
        row.latest_updates = definition.latest_updates;

        let saved = self
            .store
            .save(row)
            .await
            .map_err(SagaError::from)
            .and_then(|person| Ok((persisted_id(&person)?, person)));
        let (id, person) = match saved {
            Ok(saved) => saved,
            Err(e) => {
                step_failed(steps::OP_CREATE, steps::STEP_SAVE_PERSON, &e);
                compensate(
                    steps::STEP_CREATE_RECURRING_TASK,
                    self.tasks.delete_by_id(task.id),
                )
                .await;
                self.delete_new_thumbnails(&thumbnails).await;
                return Err(e);
            }
        };

        tracing::info!(%id, recurring_task_id = %task.id, "person created");
        Ok(PersonView::compose(id, &person, &task))
    }

    async fn run_update(&self, update: PersonUpdate) -> Result<PersonView> {
        validate_name(&update.name)?;
        validate_cadence(
            update.min_days_between_contacts,
            update.max_days_between_contacts,
        )?;
        let new_image = update
            .new_image_content
            .as_deref()
            .filter(|content| !content.is_empty())
            .map(image_content::decode)
            .transpose()?;

        let id = update.id;
        let original = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(SagaError::PersonNotFound(id))?;
        let original_task = self.load_task(id, &original).await?;

        if update.name != original.name {
            let owner = self.store.find_by_name(&update.name).await?;
            if owner.is_some_and(|other| other.id != Some(id)) {
                return Err(SagaError::Conflict(update.name));
            }
        }

        let desired = Person {
            id: Some(id),
            name: update.name.clone(),
            color_thumbnail: original.color_thumbnail.clone(),
            sepia_thumbnail: original.sepia_thumbnail.clone(),
            recurring_task_id: original.recurring_task_id,
            latest_updates: update.latest_updates,
        };
        let desired_task = RecurringTask {
            id: original_task.id,
            name: update.name,
            min_days_between: update.min_days_between_contacts,
            max_days_between: update.max_days_between_contacts,
            last_execution: update.last_contact,
        };

        let mut plan = UpdatePlan {
            original,
            original_task,
            desired,
            desired_task,
            new_image,
            new_thumbnails: None,
            task_updated: false,
        };

        if let Err(e) = self.apply_update(&mut plan).await {
            self.compensate_update(&plan).await;
            return Err(e);
        }

        if plan.new_thumbnails.is_some() {
            self.cleanup_old_thumbnails(&plan.original).await;
        }

        Ok(PersonView::compose(id, &plan.desired, &plan.desired_task))
    }

    /// Runs the forward steps of an update, recording progress in `plan`.
    async fn apply_update(&self, plan: &mut UpdatePlan) -> Result<()> {
        if let Some(image) = plan.new_image.take() {
            tracing::info!(step = steps::STEP_CREATE_THUMBNAILS, "saga step started");
            let thumbnails = self
                .images
                .create_thumbnails(&image)
                .await
                .inspect_err(|e| step_failed(steps::OP_UPDATE, steps::STEP_CREATE_THUMBNAILS, e))?;
            plan.desired.color_thumbnail = thumbnails.color.clone();
            plan.desired.sepia_thumbnail = thumbnails.sepia.clone();
            plan.new_thumbnails = Some(thumbnails);
        }

        if plan.desired_task != plan.original_task {
            tracing::info!(step = steps::STEP_UPDATE_RECURRING_TASK, "saga step started");
            self.tasks
                .update(&plan.desired_task)
                .await
                .inspect_err(|e| {
                    step_failed(steps::OP_UPDATE, steps::STEP_UPDATE_RECURRING_TASK, e)
                })?;
            plan.task_updated = true;
        }

        if plan.desired != plan.original {
            tracing::info!(step = steps::STEP_SAVE_PERSON, "saga step started");
            self.store
                .save(plan.desired.clone())
                .await
                .map_err(SagaError::from)
                .inspect_err(|e| step_failed(steps::OP_UPDATE, steps::STEP_SAVE_PERSON, e))?;
        }

        Ok(())
    }

    /// Undoes the remote effects of a failed update: new thumbnails first,
    /// then the recurring task is overwritten with its original values.
    async fn compensate_update(&self, plan: &UpdatePlan) {
        if let Some(thumbnails) = &plan.new_thumbnails {
            self.delete_new_thumbnails(thumbnails).await;
        }
        if plan.task_updated {
            tracing::warn!(
                recurring_task_id = %plan.original_task.id,
                "reverting update of recurring task"
            );
            compensate(
                steps::STEP_UPDATE_RECURRING_TASK,
                self.tasks.update(&plan.original_task),
            )
            .await;
        }
    }

    async fn cleanup_old_thumbnails(&self, original: &Person) {
        for reference in [&original.color_thumbnail, &original.sepia_thumbnail] {
            if let Err(e) = self.images.delete(reference).await {
                metrics::counter!(
                    "person_saga_cleanup_failures_total",
                    "step" => steps::STEP_CLEANUP_THUMBNAILS
                )
                .increment(1);
                tracing::warn!(
                    reference = reference.as_str(),
                    error = %e,
                    "failed to clean up old thumbnail after update"
                );
            }
        }
    }

    async fn run_delete(&self, id: PersonId) -> Result<DeleteResult> {
        let Some(person) = self.store.find_by_id(id).await? else {
            return Ok(DeleteResult::DoesNotExist);
        };

        self.store.delete_by_id(id).await?;

        self.tasks
            .delete_by_id(person.recurring_task_id)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    %id,
                    recurring_task_id = %person.recurring_task_id,
                    error = %e,
                    "person deleted but its recurring task was left behind"
                )
            })?;

        for reference in [&person.color_thumbnail, &person.sepia_thumbnail] {
            self.images.delete(reference).await.inspect_err(|e| {
                tracing::error!(
                    %id,
                    reference = reference.as_str(),
                    error = %e,
                    "person deleted but its thumbnail was left behind"
                )
            })?;
        }

        tracing::info!(%id, "person deleted");
        Ok(DeleteResult::Deleted)
    }

    async fn run_add_contact(
        &self,
        id: PersonId,
        contact: Contact,
        source: ExecutionSource,
    ) -> Result<()> {
        let person = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(SagaError::PersonNotFound(id))?;

        let mut staged = person.clone();
        staged.latest_updates = Some(contact.latest_updates);

        if let Some(date) = contact.last_contact {
            self.tasks
                .add_execution(Execution::new(date, source), person.recurring_task_id)
                .await?;
        }

        if staged != person {
            self.store.save(staged).await?;
        }
        Ok(())
    }

    /// Loads the recurring task a row points at. A missing task means the
    /// aggregate has diverged.
    async fn load_task(&self, id: PersonId, person: &Person) -> Result<RecurringTask> {
        self.tasks
            .find_by_id(person.recurring_task_id)
            .await?
            .ok_or_else(|| consistency_violation(id, person.recurring_task_id))
    }

    async fn delete_new_thumbnails(&self, thumbnails: &Thumbnails) {
        tracing::warn!(?thumbnails, "reverting creation of thumbnails");
        for reference in thumbnails.refs() {
            compensate(steps::STEP_CREATE_THUMBNAILS, self.images.delete(reference)).await;
        }
    }
}

/// Runs one compensating action. Failures are logged and swallowed so they
/// never replace the error that triggered the rollback.
async fn compensate<F>(step: &'static str, action: F)
where
    F: Future<Output = Result<()>>,
{
    metrics::counter!("person_saga_compensations_total", "step" => step).increment(1);
    if let Err(e) = action.await {
        metrics::counter!("person_saga_compensation_failures_total", "step" => step).increment(1);
        tracing::error!(step, error = %e, "compensation failed, resource left behind");
    }
}

fn step_failed(operation: &'static str, step: &'static str, error: &SagaError) {
    tracing::warn!(operation, step, error = %error, "saga step failed, compensating");
}

fn observe<T>(operation: &'static str, started: Instant, result: &Result<T>) {
    metrics::counter!("person_saga_operations_total", "operation" => operation).increment(1);
    metrics::histogram!("person_saga_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
    if let Err(e) = result {
        metrics::counter!("person_saga_failed_total", "operation" => operation).increment(1);
        tracing::warn!(operation, error = %e, "operation failed");
    }
}

fn persisted_id(person: &Person) -> Result<PersonId> {
    person.id.ok_or_else(|| {
        SagaError::Store(PersonStoreError::Unavailable(
            "store returned a row without an id".to_string(),
        ))
    })
}

fn consistency_violation(person_id: PersonId, task_id: RecurringTaskId) -> SagaError {
    tracing::error!(%person_id, %task_id, "person references a missing recurring task");
    SagaError::ConsistencyViolation { person_id, task_id }
}
