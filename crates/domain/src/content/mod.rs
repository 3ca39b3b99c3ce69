//! Content aggregate and status flow.

mod aggregate;
mod commands;
mod events;
pub mod guards;
mod status;

pub use aggregate::{Content, ScheduledStatus};
pub use commands::*;
pub use events::ContentEvent;
pub use status::Status;

/// Field values of a content item, keyed by field name.
///
/// Each value is usually an object keyed by partition such as `iv` or a
/// language code.
pub type ContentData = serde_json::Map<String, serde_json::Value>;
