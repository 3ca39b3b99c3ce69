//! App domain events.

use chrono::{DateTime, Utc};
use common::AppId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Language, Permission};

/// Events that can occur on an app aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AppEvent {
    /// App was created with English as its only (master) language.
    AppCreated { app_id: AppId, name: String },

    /// Contributor was added or had their permission changed.
    AppContributorAssigned {
        contributor_id: String,
        permission: Permission,
    },

    AppContributorRemoved { contributor_id: String },

    /// Client was attached; its name starts out equal to its id.
    AppClientAttached {
        id: String,
        secret: String,
        expires: DateTime<Utc>,
    },

    AppClientRenamed { id: String, name: String },

    AppClientRevoked { id: String },

    AppLanguageAdded { language: Language },

    AppLanguageRemoved { language: Language },

    AppLanguageUpdated {
        language: Language,
        is_optional: bool,
        fallback: Vec<Language>,
    },

    AppMasterLanguageSet { language: Language },
}

impl DomainEvent for AppEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AppEvent::AppCreated { .. } => "AppCreated",
            AppEvent::AppContributorAssigned { .. } => "AppContributorAssigned",
            AppEvent::AppContributorRemoved { .. } => "AppContributorRemoved",
            AppEvent::AppClientAttached { .. } => "AppClientAttached",
            AppEvent::AppClientRenamed { .. } => "AppClientRenamed",
            AppEvent::AppClientRevoked { .. } => "AppClientRevoked",
            AppEvent::AppLanguageAdded { .. } => "AppLanguageAdded",
            AppEvent::AppLanguageRemoved { .. } => "AppLanguageRemoved",
            AppEvent::AppLanguageUpdated { .. } => "AppLanguageUpdated",
            AppEvent::AppMasterLanguageSet { .. } => "AppMasterLanguageSet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let event = AppEvent::AppLanguageAdded {
            language: Language::new("de"),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AppLanguageAdded");
        assert_eq!(json["data"]["language"], "de");
        assert_eq!(json["type"], event.event_type());

        let back: AppEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
