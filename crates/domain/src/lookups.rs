//! Read-side collaborators consulted by command handlers.
//!
//! Implementations live with the read models; the command side only sees
//! these traits.

use async_trait::async_trait;
use common::{AppId, SchemaId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::app::LanguagesConfig;

/// Read model of an app.
#[derive(Debug, Clone, PartialEq)]
pub struct AppEntity {
    pub id: AppId,
    pub name: String,
    pub version: Version,
    pub languages: LanguagesConfig,
}

/// Read model of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntity {
    pub id: SchemaId,
    pub app_id: AppId,
    pub name: String,
    pub version: Version,
    pub is_published: bool,
    pub is_deleted: bool,
}

/// A user known to the identity system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
}

#[async_trait]
pub trait AppLookup: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Option<AppEntity>;

    async fn find_by_id(&self, id: AppId) -> Option<AppEntity>;
}

#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Option<User>;
}

#[async_trait]
pub trait SchemaLookup: Send + Sync {
    /// Returns the schema when it belongs to `app_id`, deleted or not.
    async fn get_schema(&self, app_id: AppId, schema_id: SchemaId) -> Option<SchemaEntity>;

    /// Finds a schema that is not deleted by its name within an app.
    async fn find_by_name(&self, app_id: AppId, name: &str) -> Option<SchemaEntity>;
}

/// Produces client secrets.
pub trait KeyGenerator: Send + Sync {
    fn generate_key(&self) -> String;
}

/// Generates 64 hex characters from two random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate_key(&self) -> String {
        format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        )
    }
}
