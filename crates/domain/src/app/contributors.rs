use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Access level of a contributor within an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Owner,
    Developer,
    Editor,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Owner => "Owner",
            Permission::Developer => "Developer",
            Permission::Editor => "Editor",
        };
        f.write_str(name)
    }
}

/// Contributors of an app keyed by user id.
pub type Contributors = BTreeMap<String, Permission>;

/// Number of contributors holding [`Permission::Owner`].
pub fn owner_count(contributors: &Contributors) -> usize {
    contributors
        .values()
        .filter(|p| **p == Permission::Owner)
        .count()
}

/// Returns true when `contributor_id` is the one and only owner.
pub fn is_only_owner(contributors: &Contributors, contributor_id: &str) -> bool {
    contributors.get(contributor_id) == Some(&Permission::Owner) && owner_count(contributors) == 1
}
