use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{Person, PersonId, PersonStore, PersonStoreError, RecurringTaskId, Result};

const UNIQUE_NAME_CONSTRAINT: &str = "unique_person_name";

/// Maps a violation of the unique name constraint to `NameTaken`.
fn name_violation(e: sqlx::Error, name: &str) -> PersonStoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some(UNIQUE_NAME_CONSTRAINT)
    {
        return PersonStoreError::NameTaken(name.to_string());
    }
    PersonStoreError::Database(e)
}

/// PostgreSQL-backed person store.
#[derive(Clone)]
pub struct PostgresPersonStore {
    pool: PgPool,
}

impl PostgresPersonStore {
    /// Creates a new PostgreSQL person store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_person(row: PgRow) -> Result<Person> {
        Ok(Person {
            id: Some(PersonId::new(row.try_get("id")?)),
            name: row.try_get("name")?,
            color_thumbnail: row.try_get("color_thumbnail")?,
            sepia_thumbnail: row.try_get("sepia_thumbnail")?,
            recurring_task_id: RecurringTaskId::new(row.try_get("recurring_task_id")?),
            latest_updates: row.try_get("latest_updates")?,
        })
    }
}

#[async_trait]
impl PersonStore for PostgresPersonStore {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, color_thumbnail, sepia_thumbnail, recurring_task_id, latest_updates
            FROM persons
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_person).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Person>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, color_thumbnail, sepia_thumbnail, recurring_task_id, latest_updates
            FROM persons
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_person).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, color_thumbnail, sepia_thumbnail, recurring_task_id, latest_updates
            FROM persons
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_person).collect()
    }

    #[tracing::instrument(skip(self, person), fields(person_id = ?person.id))]
    async fn save(&self, person: Person) -> Result<Person> {
        // Own transaction: committed here, regardless of what the caller does next.
        let mut tx = self.pool.begin().await?;

        let row = match person.id {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO persons (name, color_thumbnail, sepia_thumbnail, recurring_task_id, latest_updates)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, name, color_thumbnail, sepia_thumbnail, recurring_task_id, latest_updates
                    "#,
                )
                .bind(&person.name)
                .bind(&person.color_thumbnail)
                .bind(&person.sepia_thumbnail)
                .bind(person.recurring_task_id.as_i64())
                .bind(&person.latest_updates)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| name_violation(e, &person.name))?
            }
            Some(id) => sqlx::query(
                r#"
                UPDATE persons
                SET name = $2, color_thumbnail = $3, sepia_thumbnail = $4,
                    recurring_task_id = $5, latest_updates = $6
                WHERE id = $1
                RETURNING id, name, color_thumbnail, sepia_thumbnail, recurring_task_id, latest_updates
                "#,
            )
            .bind(id.as_i64())
            .bind(&person.name)
            .bind(&person.color_thumbnail)
            .bind(&person.sepia_thumbnail)
            .bind(person.recurring_task_id.as_i64())
            .bind(&person.latest_updates)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| name_violation(e, &person.name))?
            .ok_or(PersonStoreError::NotFound(id))?,
        };

        tx.commit().await?;
        metrics::counter!("person_store_commits_total").increment(1);

        Self::row_to_person(row)
    }

    async fn delete_by_id(&self, id: PersonId) -> Result<()> {
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersonStoreError::NotFound(id));
        }
        Ok(())
    }
}
