//! Content status and the transitions allowed between statuses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Draft,
    Published,
    Archived,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Draft, Status::Published, Status::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Published => "Published",
            Status::Archived => "Archived",
        }
    }

    /// Returns true when content in this status may move to `to`.
    ///
    /// Published content can be unpublished back to draft, archived content
    /// can only be restored to draft.
    pub fn can_change_to(&self, to: Status) -> bool {
        matches!(
            (self, to),
            (Status::Draft, Status::Published)
                | (Status::Draft, Status::Archived)
                | (Status::Published, Status::Draft)
                | (Status::Published, Status::Archived)
                | (Status::Archived, Status::Draft)
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
