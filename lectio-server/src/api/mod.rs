//! HTTP API handlers for lectio-server

pub mod bible;
pub mod chat;
pub mod health;
pub mod journals;
pub mod notes;
pub mod tags;
pub mod users;

pub use bible::{query_verses, sync_verse};
pub use chat::chat;
pub use health::health_routes;
pub use journals::{create_journal, delete_journal, get_journal, list_journals, update_journal};
pub use notes::{delete_note, sync_notes, upsert_note};
pub use tags::{create_tag, list_tags};
pub use users::ensure_user;
