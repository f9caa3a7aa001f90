//! Wiring of the production collaborators.

use person_store::PostgresPersonStore;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::coordinator::PersonSaga;
use crate::error::Result;
use crate::http::{HttpImageService, HttpRecurringTaskService, build_client};

/// The orchestrator backed by Postgres and the two HTTP services.
pub type PostgresPersonSaga =
    PersonSaga<PostgresPersonStore, HttpImageService, HttpRecurringTaskService>;

/// Connects to Postgres, applies migrations and builds the HTTP clients.
pub async fn connect(config: &Config) -> Result<PostgresPersonSaga> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(person_store::PersonStoreError::from)?;

    let store = PostgresPersonStore::new(pool);
    store.run_migrations().await?;

    let client = build_client(config.http_timeout())?;
    let images = HttpImageService::new(client.clone(), &config.image_service_url);
    let tasks = HttpRecurringTaskService::new(client, &config.recurring_tasks_url);

    tracing::info!(
        image_service = %config.image_service_url,
        recurring_tasks = %config.recurring_tasks_url,
        "person saga connected"
    );

    Ok(PersonSaga::new(store, images, tasks))
}
