//! Operation and step names used in logs and metric labels.

pub const OP_CREATE: &str = "create";
pub const OP_UPDATE: &str = "update";
pub const OP_DELETE: &str = "delete";
pub const OP_ADD_CONTACT: &str = "add_contact";

/// Create or replace the color and sepia thumbnails.
pub const STEP_CREATE_THUMBNAILS: &str = "create_thumbnails";

/// Create the recurring task linked to a new Person.
pub const STEP_CREATE_RECURRING_TASK: &str = "create_recurring_task";

/// Overwrite the recurring task with the desired cadence.
pub const STEP_UPDATE_RECURRING_TASK: &str = "update_recurring_task";

/// Checkpoint-commit the Person row.
pub const STEP_SAVE_PERSON: &str = "save_person";

/// Delete the thumbnails an update replaced.
pub const STEP_CLEANUP_THUMBNAILS: &str = "cleanup_thumbnails";
