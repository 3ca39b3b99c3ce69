use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a UUID-backed identifier newtype with the usual conversions.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Names one event stream; 1:1 with an aggregate instance.
    AggregateId
}

uuid_id! {
    /// Identifies an app (tenant).
    AppId
}

uuid_id! {
    /// Identifies a schema within an app.
    SchemaId
}

uuid_id! {
    /// Identifies a content item.
    ContentId
}

macro_rules! stream_of {
    ($($name:ident),*) => {
        $(
            impl From<$name> for AggregateId {
                fn from(id: $name) -> Self {
                    AggregateId(id.0)
                }
            }
        )*
    };
}

// Each app, schema and content item owns exactly one stream keyed by its id.
stream_of!(AppId, SchemaId, ContentId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(AggregateId::new(), AggregateId::new());
        assert_ne!(ContentId::new(), ContentId::new());
    }

    #[test]
    fn test_typed_id_maps_onto_the_same_stream() {
        let app_id = AppId::new();
        let stream: AggregateId = app_id.into();
        assert_eq!(stream.as_uuid(), app_id.as_uuid());
    }

    #[test]
    fn test_parses_from_string() {
        let id = SchemaId::new();
        let parsed: SchemaId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SchemaId>().is_err());
    }

    #[test]
    fn test_serializes_transparently() {
        let id = ContentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
