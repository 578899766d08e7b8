//! Business logic behind the HTTP handlers

pub mod chat;
pub mod journals;
pub mod note_sync;
pub mod verse_sync;
