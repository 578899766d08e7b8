//! Per-session study state
//!
//! [`StudySession`] is an explicit store instance passed through the call
//! chain; nothing here is global. Local mutations apply immediately and the
//! `merge_*` methods fold authoritative server responses back in.
//!
//! Only [`EditorState`] survives a restart, through [`EditorState::save`] and
//! [`EditorState::load`].

use chrono::Utc;
use lectio_common::api::{
    HighlightChange, NoteBatchItem, NoteIdMapping, NoteSyncResult, VerseSyncResponse,
};
use lectio_common::models::{Note, Verse, VerseKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// A note as the client holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNote {
    /// Temporary timestamp-derived id until persisted, then the server id
    pub id: String,
    /// Scripture verse id, e.g. `GEN.1.1`
    pub verse_id: String,
    /// Server verse record id, once known
    pub verse_record_id: Option<String>,
    /// Composite key of the verse, fixed when the note was added
    pub key: Option<VerseKey>,
    pub content: String,
    pub persisted: bool,
}

impl LocalNote {
    fn from_server(verse: &Verse, note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            verse_id: verse.verse_id.clone(),
            verse_record_id: Some(note.verse_model_id.clone()),
            key: Some(verse.key()),
            content: note.content.clone(),
            persisted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub verse_id: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub id: String,
    pub verse_id: String,
    /// Composite key of the verse, fixed when the bookmark was added
    pub key: Option<VerseKey>,
    /// Verse text shown in the bookmark list
    pub content: String,
}

/// Book, chapter and verses currently displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRange {
    pub book_id: String,
    pub chapter_id: String,
    pub verse_ids: Vec<String>,
}

/// Editor state that persists across restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub search_query: String,
}

impl EditorState {
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Load saved state; a missing file yields the empty state
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No saved editor state at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }
}

/// In-memory state of one study session
#[derive(Debug, Clone)]
pub struct StudySession {
    user_id: String,
    notes: Vec<LocalNote>,
    highlights: Vec<Highlight>,
    bookmarks: Vec<Bookmark>,
    verses: Vec<Verse>,
    range: Option<VerseRange>,
    editor: EditorState,
    last_local_id: i64,
}

impl StudySession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_editor(user_id, EditorState::default())
    }

    /// Start a session with previously saved editor state
    pub fn with_editor(user_id: impl Into<String>, editor: EditorState) -> Self {
        Self {
            user_id: user_id.into(),
            notes: Vec::new(),
            highlights: Vec::new(),
            bookmarks: Vec::new(),
            verses: Vec::new(),
            range: None,
            editor,
            last_local_id: 0,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn notes(&self) -> &[LocalNote] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&LocalNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn notes_for_verse<'a>(&'a self, verse_id: &'a str) -> impl Iterator<Item = &'a LocalNote> {
        self.notes.iter().filter(move |n| n.verse_id == verse_id)
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn highlight_for(&self, verse_id: &str) -> Option<&str> {
        self.highlights
            .iter()
            .find(|h| h.verse_id == verse_id)
            .map(|h| h.color.as_str())
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn is_bookmarked(&self, verse_id: &str) -> bool {
        self.bookmarks.iter().any(|b| b.verse_id == verse_id)
    }

    /// Verse records received from the server
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn range(&self) -> Option<&VerseRange> {
        self.range.as_ref()
    }

    pub fn set_range(&mut self, range: VerseRange) {
        self.range = Some(range);
    }

    /// Composite key for a verse shown in the current range
    pub fn key_for(&self, verse_id: &str) -> Result<VerseKey> {
        self.resolve_key(verse_id, None)
    }

    /// Composite key for a verse, whichever range it was touched in
    ///
    /// A known verse record wins, then the key captured when the note or
    /// bookmark was added, then the current range.
    pub fn resolve_key(&self, verse_id: &str, captured: Option<&VerseKey>) -> Result<VerseKey> {
        if let Some(verse) = self.verses.iter().find(|v| v.verse_id == verse_id) {
            return Ok(verse.key());
        }
        if let Some(key) = captured.filter(|k| k.verse_id == verse_id) {
            return Ok(key.clone());
        }

        let range = self.range.as_ref().ok_or(ClientError::NoVerseRange)?;
        Ok(VerseKey::new(
            self.user_id.clone(),
            range.book_id.clone(),
            range.chapter_id.clone(),
            verse_id,
        ))
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.editor.body = body.into();
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.editor.search_query = query.into();
    }

    // ========================================
    // Optimistic mutations
    // ========================================

    /// Timestamp-derived id, strictly increasing within the session
    fn next_local_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last_local_id = now.max(self.last_local_id + 1);
        self.last_local_id.to_string()
    }

    /// Add an empty unsaved note to a verse, returning its temporary id
    pub fn add_note(&mut self, verse_id: impl Into<String>) -> String {
        let verse_id = verse_id.into();
        let id = self.next_local_id();
        let verse_record_id = self.record_id_for(&verse_id);
        let key = self.key_for(&verse_id).ok();

        self.notes.push(LocalNote {
            id: id.clone(),
            verse_id,
            verse_record_id,
            key,
            content: String::new(),
            persisted: false,
        });
        id
    }

    pub fn edit_note(&mut self, id: &str, content: impl Into<String>) -> Result<&LocalNote> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| ClientError::UnknownNote(id.to_string()))?;
        note.content = content.into();
        Ok(note)
    }

    /// Drop a note locally; returns the server id when the server must be told
    pub fn remove_note(&mut self, id: &str) -> Option<String> {
        let index = self.notes.iter().position(|n| n.id == id)?;
        let note = self.notes.remove(index);
        note.persisted.then_some(note.id)
    }

    /// Same colour again clears the highlight; any other colour replaces it
    pub fn toggle_highlight(&mut self, verse_id: &str, color: &str) -> HighlightChange {
        match self.highlights.iter().position(|h| h.verse_id == verse_id) {
            Some(index) if self.highlights[index].color == color => {
                self.highlights.remove(index);
                HighlightChange::Clear
            }
            Some(index) => {
                self.highlights[index].color = color.to_string();
                HighlightChange::Set(color.to_string())
            }
            None => {
                self.highlights.push(Highlight {
                    verse_id: verse_id.to_string(),
                    color: color.to_string(),
                });
                HighlightChange::Set(color.to_string())
            }
        }
    }

    pub fn add_bookmark(&mut self, verse_id: impl Into<String>, content: impl Into<String>) -> String {
        let verse_id = verse_id.into();
        let id = self.next_local_id();
        let key = self.key_for(&verse_id).ok();
        self.bookmarks.push(Bookmark {
            id: id.clone(),
            verse_id,
            key,
            content: content.into(),
        });
        id
    }

    pub fn remove_bookmark(&mut self, id: &str) -> Option<Bookmark> {
        let index = self.bookmarks.iter().position(|b| b.id == id)?;
        Some(self.bookmarks.remove(index))
    }

    // ========================================
    // Merging server responses
    // ========================================

    fn record_id_for(&self, verse_id: &str) -> Option<String> {
        self.verses
            .iter()
            .find(|v| v.verse_id == verse_id)
            .map(|v| v.id.clone())
    }

    /// Insert or replace a verse record (matched by record id or key)
    fn upsert_verse(&mut self, verse: Verse) {
        let key = verse.key();
        match self
            .verses
            .iter_mut()
            .find(|v| v.id == verse.id || v.key() == key)
        {
            Some(existing) => *existing = verse,
            None => self.verses.push(verse),
        }
    }

    /// Mirror a verse record's highlight and bookmark into local collections
    fn apply_verse_flags(&mut self, verse: &Verse) {
        self.highlights.retain(|h| h.verse_id != verse.verse_id);
        if let Some(color) = verse.highlight_color.as_deref().filter(|c| !c.is_empty()) {
            self.highlights.push(Highlight {
                verse_id: verse.verse_id.clone(),
                color: color.to_string(),
            });
        }

        if verse.is_bookmarked && !self.is_bookmarked(&verse.verse_id) {
            self.bookmarks.push(Bookmark {
                id: verse.id.clone(),
                verse_id: verse.verse_id.clone(),
                key: Some(verse.key()),
                content: String::new(),
            });
        } else if !verse.is_bookmarked {
            self.bookmarks.retain(|b| b.verse_id != verse.verse_id);
        }
    }

    /// Insert or overwrite a persisted note by id (last seen wins)
    fn upsert_server_note(&mut self, note: LocalNote) {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }

    /// Fold a verse-range fetch into the session
    ///
    /// Fetched notes are combined with local ones and deduplicated by id;
    /// a fetched note replaces the local entry with the same id.
    pub fn merge_fetched(&mut self, verses: Vec<Verse>) {
        for verse in verses {
            for note in &verse.notes {
                self.upsert_server_note(LocalNote::from_server(&verse, note));
            }
            self.apply_verse_flags(&verse);
            self.link_unsaved_notes(&verse);
            self.upsert_verse(verse);
        }
    }

    /// Unsaved local notes learn their verse's record id once it exists
    fn link_unsaved_notes(&mut self, verse: &Verse) {
        for note in self
            .notes
            .iter_mut()
            .filter(|n| n.verse_id == verse.verse_id && n.verse_record_id.is_none())
        {
            note.verse_record_id = Some(verse.id.clone());
            note.key = Some(verse.key());
        }
    }

    /// Fold a verse-sync response into the session
    ///
    /// `sent_local_id` is the note id the request carried, if any. The server
    /// mapping is matched by value; only when the server returned no mapping
    /// does the newest note of the verse replace the sent note.
    pub fn merge_verse_sync(&mut self, sent_local_id: Option<&str>, response: VerseSyncResponse) {
        let VerseSyncResponse {
            verse, note_ids, ..
        } = response;

        match (&note_ids, sent_local_id) {
            (Some(mapping), _) => self.reconcile(mapping, &verse),
            (None, Some(local_id)) => {
                if let Some(newest) = verse.notes.last() {
                    warn!(
                        "No id mapping for note {}; adopting newest note {} of verse {}",
                        local_id, newest.id, verse.verse_id
                    );
                    let mapping = NoteIdMapping {
                        local_id: Some(local_id.to_string()),
                        note_id: newest.id.clone(),
                    };
                    self.reconcile(&mapping, &verse);
                }
            }
            (None, None) => {}
        }

        for note in &verse.notes {
            self.upsert_server_note(LocalNote::from_server(&verse, note));
        }
        self.apply_verse_flags(&verse);
        self.link_unsaved_notes(&verse);
        self.upsert_verse(verse);
    }

    /// Give the local note named by `mapping.local_id` its server identity
    fn reconcile(&mut self, mapping: &NoteIdMapping, verse: &Verse) {
        let Some(local_id) = mapping.local_id.as_deref() else {
            return;
        };
        if local_id == mapping.note_id {
            return;
        }

        // The server note may already be present from a fetch; keep one entry
        if self.notes.iter().any(|n| n.id == mapping.note_id) {
            self.notes.retain(|n| n.id != local_id);
            return;
        }

        if let Some(note) = self.notes.iter_mut().find(|n| n.id == local_id) {
            debug!("Reconciled note {} -> {}", local_id, mapping.note_id);
            note.id = mapping.note_id.clone();
            note.verse_record_id = Some(verse.id.clone());
            note.key = Some(verse.key());
            note.persisted = true;
        }
    }

    /// Notes that can be saved through the batch endpoint: those whose verse
    /// record is already known
    pub fn batch_items(&self) -> Vec<NoteBatchItem> {
        self.notes
            .iter()
            .filter_map(|note| {
                note.verse_record_id.as_ref().map(|verse_record_id| NoteBatchItem {
                    note_id: Some(note.id.clone()),
                    verse_id: verse_record_id.clone(),
                    content: note.content.clone(),
                })
            })
            .collect()
    }

    /// Fold batch results into the session, matching each by its `localId`
    pub fn merge_batch(&mut self, results: &[NoteSyncResult]) {
        for result in results {
            let local_id = result.local_id.as_deref().unwrap_or(&result.note.id);
            let verse_id = self
                .verses
                .iter()
                .find(|v| v.id == result.note.verse_model_id)
                .map(|v| (v.verse_id.clone(), v.key()));

            match self.notes.iter_mut().find(|n| n.id == local_id) {
                Some(note) => {
                    note.id = result.note.id.clone();
                    note.content = result.note.content.clone();
                    note.verse_record_id = Some(result.note.verse_model_id.clone());
                    note.persisted = true;
                }
                None => match verse_id {
                    Some((verse_id, key)) => self.notes.push(LocalNote {
                        id: result.note.id.clone(),
                        verse_id,
                        verse_record_id: Some(result.note.verse_model_id.clone()),
                        key: Some(key),
                        content: result.note.content.clone(),
                        persisted: true,
                    }),
                    None => warn!(
                        "Batch result {} for unknown verse record {}",
                        result.note.id, result.note.verse_model_id
                    ),
                },
            }
        }
    }
}
