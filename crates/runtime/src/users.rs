//! In-memory user directory.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::{User, UserLookup};

/// Users known to this process, seeded from configuration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory from `(id, display name)` pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let directory = Self::new();
        for (id, display_name) in entries {
            directory.add(User {
                id: id.into(),
                display_name: display_name.into(),
            });
        }
        directory
    }

    /// Adds or replaces a user.
    pub fn add(&self, user: User) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id.clone(), user);
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserLookup for InMemoryUserDirectory {
    async fn find_by_id(&self, id: &str) -> Option<User> {
        self.users.read().ok()?.get(id).cloned()
    }
}
