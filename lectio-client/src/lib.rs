//! # Lectio Client
//!
//! Client-side state orchestration for the Lectio server:
//! - [`StudySession`]: per-session store of notes, highlights and bookmarks
//! - [`SyncTransport`]/[`HttpTransport`]: the path to the synchronizers
//! - [`StudyOrchestrator`]: optimistic mutation plus server reconciliation

pub mod error;
pub mod orchestrator;
pub mod store;
pub mod transport;

pub use error::{ClientError, Result};
pub use orchestrator::StudyOrchestrator;
pub use store::{Bookmark, EditorState, Highlight, LocalNote, StudySession, VerseRange};
pub use transport::{HttpTransport, SyncTransport};
