//! Record models
//!
//! Rows of the relational schema as seen by both the server (decoded with
//! sqlx when the `sqlx` feature is on) and the client (decoded from JSON).
//! Field names serialize in camelCase to match the HTTP contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-band highlight value meaning "explicitly cleared"; never stored
pub const NO_COLOR_SENTINEL: &str = "no-color";

/// Composite identity of a verse record: one record per user per verse
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseKey {
    pub user_id: String,
    pub book_id: String,
    pub chapter_id: String,
    pub verse_id: String,
}

impl VerseKey {
    pub fn new(
        user_id: impl Into<String>,
        book_id: impl Into<String>,
        chapter_id: impl Into<String>,
        verse_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            book_id: book_id.into(),
            chapter_id: chapter_id.into(),
            verse_id: verse_id.into(),
        }
    }
}

/// Per-user persisted state for one scripture verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub chapter_id: String,
    pub verse_id: String,
    /// `None` reads as "no highlight"
    pub highlight_color: Option<String>,
    pub is_bookmarked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Verse {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(
            self.user_id.clone(),
            self.book_id.clone(),
            self.chapter_id.clone(),
            self.verse_id.clone(),
        )
    }

    /// True when a highlight colour is set (empty strings count as cleared)
    pub fn is_highlighted(&self) -> bool {
        self.highlight_color
            .as_deref()
            .is_some_and(|c| !c.is_empty())
    }
}

/// Free-text note attached to a verse record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    /// Id of the owning verse record (not the scripture verse id)
    pub verse_model_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Journal classification tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// User profile as mirrored from the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: Option<String>,
    /// Payment provider customer id, set by the billing flow
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Journal row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: String,
    pub title: String,
    /// Rich document body (HTML or editor JSON)
    pub body: String,
    pub entry_type: String,
    pub tag_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Journal rehydrated with its tag and owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(flatten)]
    pub journal: Journal,
    pub tag: Tag,
    pub user: User,
}
