//! Invariant checks for content commands.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::validation::Validator;

use super::{ChangeContentStatus, ContentData, Status};

fn require_data(validator: &mut Validator, data: Option<&ContentData>) {
    if data.is_none() {
        validator.error("Data is required.", ["Data"]);
    }
}

pub fn can_create(data: Option<&ContentData>) -> Result<(), DomainError> {
    let mut validator = Validator::new();
    require_data(&mut validator, data);
    validator.finish("Cannot create content.")
}

pub fn can_update(data: Option<&ContentData>) -> Result<(), DomainError> {
    let mut validator = Validator::new();
    require_data(&mut validator, data);
    validator.finish("Cannot update content.")
}

pub fn can_patch(data: Option<&ContentData>) -> Result<(), DomainError> {
    let mut validator = Validator::new();
    require_data(&mut validator, data);
    validator.finish("Cannot patch content.")
}

pub fn can_change_status(
    current: Status,
    command: &ChangeContentStatus,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    let mut validator = Validator::new();

    if !current.can_change_to(command.status) {
        validator.error(
            format!(
                "Content cannot be changed from status {current} to {}.",
                command.status
            ),
            ["Status"],
        );
    }

    if let Some(due_time) = command.due_time
        && due_time < now
    {
        validator.error("Due time must be in the future.", ["DueTime"]);
    }

    validator.finish("Cannot change status.")
}
