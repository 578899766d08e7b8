//! Response envelopes and JSON request bodies
//!
//! Every response carries `status: "success" | "fail"`. Failures share one
//! body shape ([`FailureBody`]); successes have one struct per endpoint.

use crate::error::FieldError;
use crate::models::{JournalEntry, Note, Tag, User, Verse};
use serde::{Deserialize, Serialize};

/// Outcome tag carried by every response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Failure envelope: `{status:"fail", error, fieldErrors?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureBody {
    pub status: Status,
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl FailureBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            error: error.into(),
            field_errors: Vec::new(),
        }
    }

    pub fn with_fields(error: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            status: Status::Fail,
            error: error.into(),
            field_errors,
        }
    }
}

// ========================================
// Verse synchronization
// ========================================

/// Maps the id a client sent for a note to the id the server persisted
///
/// `local_id` is `None` when the client sent no id at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteIdMapping {
    pub local_id: Option<String>,
    pub note_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseSyncResponse {
    pub status: Status,
    /// Post-write snapshot of the verse and all of its notes
    pub verse: Verse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_ids: Option<NoteIdMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseQueryResponse {
    pub status: Status,
    pub verses: Vec<Verse>,
}

// ========================================
// Notes
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpsertResponse {
    pub status: Status,
    pub note: Note,
    pub note_ids: NoteIdMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDeleteResponse {
    pub status: Status,
    pub message: String,
    pub note: Note,
}

/// One reconciled item of a batch note sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSyncResult {
    /// The `noteId` the client sent for this item
    pub local_id: Option<String>,
    /// True when the item produced a new note
    pub created: bool,
    #[serde(flatten)]
    pub note: Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteBatchResponse {
    pub status: Status,
    pub notes: Vec<NoteSyncResult>,
}

// ========================================
// Journals, tags, users
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalResponse {
    pub status: Status,
    pub journal: JournalEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalListResponse {
    pub status: Status,
    pub journals: Vec<JournalEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDeleteResponse {
    pub status: Status,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagListResponse {
    pub status: Status,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResponse {
    pub status: Status,
    pub tag: Tag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub status: Status,
    pub user: User,
}

// ========================================
// Chat relay
// ========================================

/// Prompt template selector for the chat relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// Explain the words in their biblical context
    Biblical,
    /// Apply the words to modern life
    Life,
    /// Free-form verse explanation
    General,
}

impl ChatKind {
    /// Unknown or missing selectors fall back to the general template
    pub fn from_type(kind: Option<&str>) -> Self {
        match kind.map(str::trim) {
            Some("biblical") => ChatKind::Biblical,
            Some("life") => ChatKind::Life,
            _ => ChatKind::General,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_prompt: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
}

// ========================================
// Health
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_body_omits_empty_field_errors() {
        let body = serde_json::to_value(FailureBody::new("boom")).unwrap();
        assert_eq!(body, json!({"status": "fail", "error": "boom"}));
    }

    #[test]
    fn test_failure_body_with_fields() {
        let body = FailureBody::with_fields(
            "Validation failed",
            vec![FieldError::new("title", "Title is required")],
        );
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["fieldErrors"][0]["field"], "title");
    }

    #[test]
    fn test_chat_kind_selection() {
        assert_eq!(ChatKind::from_type(Some("biblical")), ChatKind::Biblical);
        assert_eq!(ChatKind::from_type(Some("life")), ChatKind::Life);
        assert_eq!(ChatKind::from_type(Some("poetry")), ChatKind::General);
        assert_eq!(ChatKind::from_type(None), ChatKind::General);
    }

    #[test]
    fn test_chat_request_reads_type_field() {
        let req: ChatRequest =
            serde_json::from_value(json!({"userPrompt": "kings", "type": "life"})).unwrap();
        assert_eq!(req.kind.as_deref(), Some("life"));
    }
}
