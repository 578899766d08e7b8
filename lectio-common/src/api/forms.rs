//! Form-encoded request bodies and their parsing
//!
//! Forms arrive as flat string maps. Each form type here mirrors the wire
//! shape exactly and converts into a typed request (`into_request`,
//! `validate`) so handlers never branch on raw field presence.

use crate::error::{Error, FieldError, Result};
use crate::models::{VerseKey, NO_COLOR_SENTINEL};
use serde::{Deserialize, Serialize};

/// Longest accepted journal title, in characters
pub const MAX_JOURNAL_TITLE_CHARS: usize = 100;

// ========================================
// Verse synchronization
// ========================================

/// Note carried inside a verse-sync form (JSON-encoded in the `note` field)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePayload {
    /// Server id, or a client-local temporary id that has not been saved yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Requested change to a verse's highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightChange {
    Set(String),
    Clear,
}

impl HighlightChange {
    /// Parse a raw form value; an empty value means "not supplied"
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw == NO_COLOR_SENTINEL {
            Some(HighlightChange::Clear)
        } else {
            Some(HighlightChange::Set(raw.to_string()))
        }
    }

    /// Value to store in the `highlight_color` column
    pub fn stored_value(&self) -> Option<&str> {
        match self {
            HighlightChange::Set(color) => Some(color),
            HighlightChange::Clear => None,
        }
    }

    /// Value to put back on the wire
    pub fn form_value(&self) -> &str {
        match self {
            HighlightChange::Set(color) => color,
            HighlightChange::Clear => NO_COLOR_SENTINEL,
        }
    }
}

/// The single change a verse-sync request asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerseChange {
    Note(NotePayload),
    Highlight(HighlightChange),
    Bookmark(bool),
    /// No field supplied: ensure the record exists, change nothing
    Touch,
}

/// Typed verse-sync request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseSyncRequest {
    pub key: VerseKey,
    pub change: VerseChange,
}

/// Raw `POST /api/bible` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseSyncForm {
    #[serde(default)]
    pub chapter_id: String,
    #[serde(default)]
    pub verse_id: String,
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bookmarked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl VerseSyncForm {
    /// Resolve the form into one change: note > highlight > bookmark > touch
    pub fn into_request(self) -> Result<VerseSyncRequest> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("userId", &self.user_id),
            ("bookId", &self.book_id),
            ("chapterId", &self.chapter_id),
            ("verseId", &self.verse_id),
        ] {
            if value.trim().is_empty() {
                missing.push(FieldError::new(field, format!("{} is required", field)));
            }
        }
        if !missing.is_empty() {
            return Err(Error::Validation(missing));
        }

        let note = match self.note.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                serde_json::from_str::<NotePayload>(raw)
                    .map_err(|e| Error::InvalidInput(format!("note is not valid JSON: {}", e)))?,
            ),
            _ => None,
        };

        let change = if let Some(note) = note {
            VerseChange::Note(note)
        } else if let Some(highlight) = self.highlight_color.as_deref().and_then(HighlightChange::parse) {
            VerseChange::Highlight(highlight)
        } else if let Some(flag) = self.is_bookmarked.as_deref() {
            VerseChange::Bookmark(flag.trim() == "true")
        } else {
            VerseChange::Touch
        };

        Ok(VerseSyncRequest {
            key: VerseKey::new(self.user_id, self.book_id, self.chapter_id, self.verse_id),
            change,
        })
    }

    /// Build the wire form for a typed request
    pub fn from_request(request: &VerseSyncRequest) -> Result<Self> {
        let mut form = VerseSyncForm {
            chapter_id: request.key.chapter_id.clone(),
            verse_id: request.key.verse_id.clone(),
            book_id: request.key.book_id.clone(),
            user_id: request.key.user_id.clone(),
            ..Default::default()
        };

        match &request.change {
            VerseChange::Note(note) => form.note = Some(serde_json::to_string(note)?),
            VerseChange::Highlight(change) => {
                form.highlight_color = Some(change.form_value().to_string())
            }
            VerseChange::Bookmark(flag) => form.is_bookmarked = Some(flag.to_string()),
            VerseChange::Touch => {}
        }

        Ok(form)
    }
}

/// `GET /api/bible` query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    /// Comma-separated scripture verse ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_ids: Option<String>,
}

impl VerseQuery {
    pub fn verse_id_list(&self) -> Vec<String> {
        self.verse_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn chapter(&self) -> Option<&str> {
        non_empty(self.chapter_id.as_deref())
    }

    pub fn book(&self) -> Option<&str> {
        non_empty(self.book_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ========================================
// Notes
// ========================================

/// `POST /api/note/createOrUpdateNote` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpsertForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
    /// Verse record id the note belongs to
    #[serde(default)]
    pub verse_id: String,
    #[serde(default)]
    pub content: String,
}

/// `DELETE /api/note/createOrUpdateNote` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDeleteForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
}

/// One entry of the JSON `notes` array in a batch sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBatchItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
    /// Verse record id the note belongs to
    pub verse_id: String,
    #[serde(default)]
    pub content: String,
}

/// `POST /api/note/createOrUpdateMultipleNotes` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBatchForm {
    #[serde(default)]
    pub user_id: String,
    /// JSON-encoded `[NoteBatchItem]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NoteBatchForm {
    pub fn new(user_id: impl Into<String>, items: &[NoteBatchItem]) -> Result<Self> {
        Ok(Self {
            user_id: user_id.into(),
            notes: Some(serde_json::to_string(items)?),
        })
    }

    /// Decode the item list; an absent or empty list is an input error
    pub fn items(&self) -> Result<Vec<NoteBatchItem>> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation(vec![FieldError::new(
                "userId",
                "userId is required",
            )]));
        }

        let items: Vec<NoteBatchItem> = match self.notes.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
                .map_err(|e| Error::InvalidInput(format!("notes is not a valid JSON array: {}", e)))?,
            _ => Vec::new(),
        };

        if items.is_empty() {
            return Err(Error::InvalidInput("No notes provided".to_string()));
        }

        Ok(items)
    }
}

// ========================================
// Journals
// ========================================

/// Journal create/edit form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalForm {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tag_id: String,
    #[serde(default)]
    pub entry_type: String,
}

/// Journal form that passed schema validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalDraft {
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub tag_id: String,
    pub entry_type: String,
}

impl JournalForm {
    /// Check the fixed schema, reporting every failing field at once
    pub fn validate(self) -> std::result::Result<JournalDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.user_id.trim().is_empty() {
            errors.push(FieldError::new("userId", "userId is required"));
        }

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if title.chars().count() > MAX_JOURNAL_TITLE_CHARS {
            errors.push(FieldError::new(
                "title",
                format!("Title must be at most {} characters", MAX_JOURNAL_TITLE_CHARS),
            ));
        }

        if self.body.trim().is_empty() {
            errors.push(FieldError::new("body", "Body is required"));
        }
        if self.tag_id.trim().is_empty() {
            errors.push(FieldError::new("tagId", "Tag is required"));
        }
        if self.entry_type.trim().is_empty() {
            errors.push(FieldError::new("entryType", "Entry type is required"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(JournalDraft {
            title: title.to_string(),
            user_id: self.user_id.trim().to_string(),
            tag_id: self.tag_id.trim().to_string(),
            entry_type: self.entry_type.trim().to_string(),
            body: self.body,
        })
    }
}

// ========================================
// Tags and users
// ========================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagForm {
    #[serde(default)]
    pub name: String,
}

/// Profile fields mirrored from the identity provider on first sign-in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}
