use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a freshly attached client credential stays valid.
pub fn client_lifetime() -> Duration {
    Duration::days(365)
}

/// An API client attached to an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClient {
    pub id: String,
    pub name: String,
    pub secret: String,
    pub expires: DateTime<Utc>,
}

/// Clients of an app keyed by client id.
pub type Clients = BTreeMap<String, AppClient>;
