//! Integration tests for the Person saga.

use chrono::NaiveDate;
use person_saga::{
    Contact, DeleteResult, ErrorKind, ExecutionSource, InMemoryImageService,
    InMemoryRecurringTaskService, PersonDefinition, PersonSaga, PersonUpdate, PersonView,
    SagaError,
};
use person_store::{InMemoryPersonStore, Person, RecurringTaskId};

type TestSaga = PersonSaga<InMemoryPersonStore, InMemoryImageService, InMemoryRecurringTaskService>;

const PORTRAIT: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";

struct TestHarness {
    saga: TestSaga,
    store: InMemoryPersonStore,
    images: InMemoryImageService,
    tasks: InMemoryRecurringTaskService,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryPersonStore::new();
        let images = InMemoryImageService::new();
        let tasks = InMemoryRecurringTaskService::new();

        let saga = PersonSaga::new(store.clone(), images.clone(), tasks.clone());

        Self {
            saga,
            store,
            images,
            tasks,
        }
    }

    async fn create_person(&self, name: &str) -> PersonView {
        self.saga
            .create(PersonDefinition::new(name, PORTRAIT, 10, 20))
            .await
            .unwrap()
    }
}

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

#[tokio::test]
async fn test_create_then_duplicate_name_conflicts() {
    let h = TestHarness::new();

    let first = h.create_person("A").await;
    assert_eq!(first.name, "A");
    assert_eq!(first.min_days_between_contacts, 10);
    assert_eq!(first.max_days_between_contacts, 20);
    assert!(!first.color_thumbnail.is_empty());
    assert!(!first.sepia_thumbnail.is_empty());

    let err = h
        .saga
        .create(PersonDefinition::new("A", PORTRAIT, 10, 20))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.images.create_calls(), 1);
    assert_eq!(h.images.image_count(), 2);
    assert_eq!(h.tasks.create_calls(), 1);
    assert_eq!(h.tasks.task_count(), 1);
    assert_eq!(h.store.person_count(), 1);
}

#[tokio::test]
async fn test_full_lifecycle() {
    let h = TestHarness::new();
    let created = h.create_person("Ada").await;

    h.saga
        .add_contact(
            created.id,
            Contact::note("moved to Zurich").on(june(10)),
            ExecutionSource::User,
        )
        .await
        .unwrap();

    let found = h.saga.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(found.last_contact, Some(june(10)));
    assert_eq!(found.latest_updates.as_deref(), Some("moved to Zurich"));

    let mut update = PersonUpdate::from_view(&found);
    update.name = "Ada L.".to_string();
    update.new_image_content = Some(PORTRAIT.to_string());
    update.min_days_between_contacts = 5;
    let updated = h.saga.update(update).await.unwrap();

    assert_eq!(updated.name, "Ada L.");
    assert_eq!(updated.min_days_between_contacts, 5);
    assert_eq!(updated.last_contact, Some(june(10)));
    assert_ne!(updated.color_thumbnail, created.color_thumbnail);
    assert!(!h.images.has_image(&created.color_thumbnail));
    assert_eq!(h.images.image_count(), 2);

    assert_eq!(
        h.saga.delete(created.id).await.unwrap(),
        DeleteResult::Deleted
    );
    assert_eq!(h.store.person_count(), 0);
    assert_eq!(h.tasks.task_count(), 0);
    assert_eq!(h.images.image_count(), 0);
    assert_eq!(h.saga.find_by_id(created.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_create_failures_leave_no_trace() {
    let h = TestHarness::new();

    h.tasks.set_fail_on_create(true);
    let err = h
        .saga
        .create(PersonDefinition::new("A", PORTRAIT, 10, 20))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert_eq!(h.images.image_count(), 0);
    assert_eq!(h.store.person_count(), 0);

    h.tasks.set_fail_on_create(false);
    h.store.set_fail_on_save(true);
    let err = h
        .saga
        .create(PersonDefinition::new("A", PORTRAIT, 10, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, SagaError::Store(_)));
    assert_eq!(h.images.image_count(), 0);
    assert_eq!(h.tasks.task_count(), 0);
    assert_eq!(h.store.person_count(), 0);

    // A clean retry afterwards succeeds
    h.store.set_fail_on_save(false);
    let view = h.create_person("A").await;
    assert_eq!(h.saga.find_all().await.unwrap(), vec![view]);
}

#[tokio::test]
async fn test_update_rollback_keeps_previous_state_visible() {
    let h = TestHarness::new();
    let created = h.create_person("A").await;

    h.tasks.set_fail_on_update(true);
    let mut update = PersonUpdate::from_view(&created);
    update.name = "B".to_string();
    update.max_days_between_contacts = 40;
    update.new_image_content = Some(PORTRAIT.to_string());
    let err = h.saga.update(update).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);

    let after = h.saga.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(after, created);
    assert_eq!(h.images.image_count(), 2);
}

#[tokio::test]
async fn test_find_all_reports_divergence() {
    let h = TestHarness::new();
    let first = h.create_person("A").await;
    let second = h.create_person("B").await;

    assert_eq!(
        h.saga.find_all().await.unwrap(),
        vec![first.clone(), second.clone()]
    );

    h.tasks.remove(second.recurring_task_id);
    let err = h.saga.find_all().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConsistencyViolation);
    assert!(h.saga.find_by_id(first.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_row_pointing_at_unknown_task() {
    let h = TestHarness::new();
    let orphan = h.store.insert(Person::new(
        "Orphan",
        "THUMB-X",
        "SEPIA-X",
        RecurringTaskId::new(77),
    ));
    let id = orphan.id.unwrap();

    let err = h.saga.find_by_id(id).await.unwrap_err();
    assert!(matches!(
        err,
        SagaError::ConsistencyViolation { task_id, .. } if task_id == RecurringTaskId::new(77)
    ));

    // Delete still removes the row, then reports the missing task
    let err = h.saga.delete(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(h.store.person_count(), 0);
}

#[tokio::test]
async fn test_contact_sources_are_forwarded() {
    let h = TestHarness::new();
    let view = h.create_person("A").await;

    h.saga
        .add_contact(view.id, Contact::note("call").on(june(1)), ExecutionSource::User)
        .await
        .unwrap();
    h.saga
        .add_contact(view.id, Contact::note("party").on(june(8)), ExecutionSource::Event)
        .await
        .unwrap();
    h.saga
        .add_contact(view.id, Contact::note("just a note"), ExecutionSource::User)
        .await
        .unwrap();

    let sources: Vec<_> = h
        .tasks
        .executions()
        .into_iter()
        .map(|(task_id, execution)| {
            assert_eq!(task_id, view.recurring_task_id);
            execution.source
        })
        .collect();
    assert_eq!(sources, vec![ExecutionSource::User, ExecutionSource::Event]);

    let found = h.saga.find_by_id(view.id).await.unwrap().unwrap();
    assert_eq!(found.last_contact, Some(june(8)));
    assert_eq!(found.latest_updates.as_deref(), Some("just a note"));
}
