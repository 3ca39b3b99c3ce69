//! App aggregate and related types.

mod aggregate;
mod clients;
mod commands;
mod contributors;
mod events;
pub mod guards;
mod languages;

pub use aggregate::App;
pub use clients::{AppClient, Clients, client_lifetime};
pub use commands::*;
pub use contributors::{Contributors, Permission, is_only_owner, owner_count};
pub use events::AppEvent;
pub use languages::{Language, LanguageConfig, LanguagesConfig, LanguagesConfigBuilder};
