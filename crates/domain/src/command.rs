//! Command trait and the actor issuing a command.

use std::fmt;

use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

/// Who issued a command: a signed-in user or an API client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Subject(String),
    Client(String),
}

impl Actor {
    pub fn subject(id: impl Into<String>) -> Self {
        Actor::Subject(id.into())
    }

    pub fn client(id: impl Into<String>) -> Self {
        Actor::Client(id.into())
    }

    /// Parses the `subject:<id>` or `client:<id>` form produced by `Display`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.split_once(':')? {
            ("subject", id) if !id.is_empty() => Some(Actor::subject(id)),
            ("client", id) if !id.is_empty() => Some(Actor::client(id)),
            _ => None,
        }
    }

    /// Returns the user id when the actor is a user.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Actor::Subject(id) => Some(id),
            Actor::Client(_) => None,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Subject(id) => write!(f, "subject:{id}"),
            Actor::Client(id) => write!(f, "client:{id}"),
        }
    }
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the stream this command targets.
    fn aggregate_id(&self) -> AggregateId;

    /// Returns who issued the command.
    fn actor(&self) -> &Actor;

    /// The version the caller last saw, when it wants to be rejected on any
    /// intervening change instead of having the command re-run.
    fn expected_version(&self) -> Option<Version> {
        None
    }
}

/// Implements [`Command`] for structs carrying `actor` and `expected_version`
/// fields, and adds a builder method to pin the expected version.
macro_rules! impl_command {
    ($aggregate:ty => $($command:ident.$id:ident),+ $(,)?) => {
        $(
            impl $crate::command::Command for $command {
                type Aggregate = $aggregate;

                fn aggregate_id(&self) -> common::AggregateId {
                    self.$id.into()
                }

                fn actor(&self) -> &$crate::command::Actor {
                    &self.actor
                }

                fn expected_version(&self) -> Option<event_store::Version> {
                    self.expected_version
                }
            }

            impl $command {
                /// Rejects the command unless the aggregate is still at `version`.
                pub fn expecting(mut self, version: event_store::Version) -> Self {
                    self.expected_version = Some(version);
                    self
                }
            }
        )+
    };
}

pub(crate) use impl_command;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_display_and_user_id() {
        let user = Actor::subject("42");
        assert_eq!(user.to_string(), "subject:42");
        assert_eq!(user.user_id(), Some("42"));

        let client = Actor::client("cli");
        assert_eq!(client.to_string(), "client:cli");
        assert_eq!(client.user_id(), None);
    }

    #[test]
    fn test_actor_parses_its_display_form() {
        for actor in [Actor::subject("42"), Actor::client("cli")] {
            assert_eq!(Actor::parse(&actor.to_string()), Some(actor));
        }
        assert_eq!(Actor::parse("42"), None);
        assert_eq!(Actor::parse("robot:42"), None);
        assert_eq!(Actor::parse("subject:"), None);
    }
}
