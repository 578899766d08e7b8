//! Wire types for the Lectio HTTP API
//!
//! Shared by the server (which decodes forms and encodes envelopes) and the
//! client (which does the opposite). Pure data plus parsing/validation; no
//! HTTP framework dependencies.

pub mod forms;
pub mod types;

pub use forms::{
    HighlightChange, JournalDraft, JournalForm, NoteBatchForm, NoteBatchItem, NoteDeleteForm,
    NotePayload, NoteUpsertForm, TagForm, UserForm, VerseChange, VerseQuery, VerseSyncForm,
    VerseSyncRequest,
};
pub use types::{
    ChatKind, ChatRequest, ChatResponse, FailureBody, HealthResponse, JournalDeleteResponse,
    JournalListResponse, JournalResponse, NoteBatchResponse, NoteDeleteResponse, NoteIdMapping,
    NoteSyncResult, NoteUpsertResponse, Status, TagListResponse, TagResponse, UserResponse,
    VerseQueryResponse, VerseSyncResponse,
};
