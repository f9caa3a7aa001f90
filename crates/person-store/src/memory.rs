use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::{Person, PersonId, PersonStore, PersonStoreError, Result};

#[derive(Debug, Default)]
struct InMemoryPersonState {
    rows: BTreeMap<PersonId, Person>,
    next_id: i64,
    save_calls: usize,
    delete_calls: usize,
    fail_on_save: bool,
}

/// In-memory person store for testing.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// switches to simulate a failing database and counters to observe which
/// writes the orchestrator issued.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersonStore {
    state: Arc<Mutex<InMemoryPersonState>>,
}

impl InMemoryPersonStore {
    /// Creates a new empty in-memory person store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryPersonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures the store to fail every save until reset.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.state().fail_on_save = fail;
    }

    /// Returns the number of stored rows.
    pub fn person_count(&self) -> usize {
        self.state().rows.len()
    }

    /// Returns how many times `save` was called, including failed calls.
    pub fn save_calls(&self) -> usize {
        self.state().save_calls
    }

    /// Returns how many times `delete_by_id` was called.
    pub fn delete_calls(&self) -> usize {
        self.state().delete_calls
    }

    /// Returns a copy of the stored row, bypassing the trait.
    pub fn get(&self, id: PersonId) -> Option<Person> {
        self.state().rows.get(&id).cloned()
    }

    /// Inserts a row directly, bypassing counters and failure switches.
    ///
    /// Used to seed fixtures, including rows whose linked task is missing.
    pub fn insert(&self, person: Person) -> Person {
        let mut state = self.state();
        let mut person = person;
        let id = match person.id {
            Some(id) => {
                state.next_id = state.next_id.max(id.as_i64());
                id
            }
            None => {
                state.next_id += 1;
                PersonId::new(state.next_id)
            }
        };
        person.id = Some(id);
        state.rows.insert(id, person.clone());
        person
    }
}

#[async_trait]
impl PersonStore for InMemoryPersonStore {
    async fn find_by_id(&self, id: PersonId) -> Result<Option<Person>> {
        Ok(self.state().rows.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Person>> {
        Ok(self
            .state()
            .rows
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Person>> {
        Ok(self.state().rows.values().cloned().collect())
    }

    async fn save(&self, person: Person) -> Result<Person> {
        let mut state = self.state();
        state.save_calls += 1;

        if state.fail_on_save {
            return Err(PersonStoreError::Unavailable(
                "Connection refused".to_string(),
            ));
        }

        let mut person = person;
        let id = match person.id {
            Some(id) if !state.rows.contains_key(&id) => {
                return Err(PersonStoreError::NotFound(id));
            }
            Some(id) => id,
            None => {
                state.next_id += 1;
                PersonId::new(state.next_id)
            }
        };
        if state
            .rows
            .values()
            .any(|other| other.name == person.name && other.id != Some(id))
        {
            return Err(PersonStoreError::NameTaken(person.name));
        }
        person.id = Some(id);
        state.rows.insert(id, person.clone());

        Ok(person)
    }

    async fn delete_by_id(&self, id: PersonId) -> Result<()> {
        let mut state = self.state();
        state.delete_calls += 1;

        match state.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PersonStoreError::NotFound(id)),
        }
    }
}
