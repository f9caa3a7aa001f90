use crate::{PersonId, RecurringTaskId};

/// A Person row as held by the local store.
///
/// `id` is `None` until the store assigns one on the first save and never
/// changes afterwards. The thumbnail fields are opaque references resolved by
/// the image service; `recurring_task_id` links the row to exactly one record
/// in the recurring-task service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: Option<PersonId>,
    pub name: String,
    pub color_thumbnail: String,
    pub sepia_thumbnail: String,
    pub recurring_task_id: RecurringTaskId,
    pub latest_updates: Option<String>,
}

impl Person {
    /// Creates an unsaved row.
    pub fn new(
        name: impl Into<String>,
        color_thumbnail: impl Into<String>,
        sepia_thumbnail: impl Into<String>,
        recurring_task_id: RecurringTaskId,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            color_thumbnail: color_thumbnail.into(),
            sepia_thumbnail: sepia_thumbnail.into(),
            recurring_task_id,
            latest_updates: None,
        }
    }

    /// Sets the free-text note.
    pub fn with_latest_updates(mut self, latest_updates: impl Into<String>) -> Self {
        self.latest_updates = Some(latest_updates.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_person_has_no_id() {
        let person = Person::new("Slim Shady", "color.png", "sepia.png", 888.into());
        assert_eq!(person.id, None);
        assert_eq!(person.latest_updates, None);
    }

    #[test]
    fn with_latest_updates_sets_note() {
        let person = Person::new("Slim Shady", "c", "s", 1.into()).with_latest_updates("moved");
        assert_eq!(person.latest_updates.as_deref(), Some("moved"));
    }
}
