use async_trait::async_trait;

use crate::{Person, PersonId, Result};

/// Single-row access to the local Person table.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Loads a row by id.
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>>;

    /// Loads a row by its (unique) name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Person>>;

    /// Loads every row, ordered by id.
    async fn find_all(&self) -> Result<Vec<Person>>;

    /// Inserts a new row or overwrites an existing one as a whole.
    ///
    /// The write is committed independently of anything the caller is doing:
    /// once this returns `Ok`, the row is durable and visible to every other
    /// reader, and nothing rolls it back. New rows come back with their
    /// assigned id.
    ///
    /// Saving a row whose id no longer exists fails with `NotFound`.
    async fn save(&self, person: Person) -> Result<Person>;

    /// Deletes a row by id. Fails with `NotFound` if there is no such row.
    async fn delete_by_id(&self, id: PersonId) -> Result<()>;
}

/// Extension trait providing convenience methods for person stores.
#[async_trait]
pub trait PersonStoreExt: PersonStore {
    /// Checks whether a row with the given name exists.
    async fn name_exists(&self, name: &str) -> Result<bool> {
        Ok(self.find_by_name(name).await?.is_some())
    }
}

impl<T: PersonStore + ?Sized> PersonStoreExt for T {}
