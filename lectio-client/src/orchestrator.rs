//! Optimistic mutate-then-sync flows
//!
//! Each operation applies its change to the [`StudySession`] first, then
//! calls the server and merges the authoritative response. A failed call
//! leaves the optimistic state in place and hands the error to the caller.

use lectio_common::api::{
    HighlightChange, NotePayload, NoteSyncResult, VerseChange, VerseQuery, VerseSyncRequest,
};
use lectio_common::models::VerseKey;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::store::{StudySession, VerseRange};
use crate::transport::SyncTransport;

pub struct StudyOrchestrator<T: SyncTransport> {
    session: StudySession,
    transport: T,
}

impl<T: SyncTransport> StudyOrchestrator<T> {
    pub fn new(session: StudySession, transport: T) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &StudySession {
        &self.session
    }

    /// Local-only edits (note text, editor body) go straight to the session
    pub fn session_mut(&mut self) -> &mut StudySession {
        &mut self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_parts(self) -> (StudySession, T) {
        (self.session, self.transport)
    }

    /// Show a chapter and pull the user's records for its verses
    pub async fn load_range(&mut self, range: VerseRange) -> Result<usize> {
        let query = VerseQuery {
            user_id: self.session.user_id().to_string(),
            chapter_id: Some(range.chapter_id.clone()),
            book_id: Some(range.book_id.clone()),
            verse_ids: (!range.verse_ids.is_empty()).then(|| range.verse_ids.join(",")),
        };
        self.session.set_range(range);

        let verses = self.transport.fetch_verses(&query).await?;
        let count = verses.len();
        self.session.merge_fetched(verses);
        info!(
            "Loaded {} verse records for {}",
            count,
            query.chapter_id.as_deref().unwrap_or_default()
        );
        Ok(count)
    }

    /// Persist one note through the verse synchronizer
    ///
    /// Returns the note's id after reconciliation (the server id).
    pub async fn save_note(&mut self, note_id: &str) -> Result<String> {
        let note = self
            .session
            .note(note_id)
            .cloned()
            .ok_or_else(|| ClientError::UnknownNote(note_id.to_string()))?;

        let request = VerseSyncRequest {
            key: self.session.resolve_key(&note.verse_id, note.key.as_ref())?,
            change: VerseChange::Note(NotePayload {
                id: Some(note.id.clone()),
                content: note.content.clone(),
            }),
        };

        let response = self.transport.sync_verse(&request).await?;
        let saved_id = response
            .note_ids
            .as_ref()
            .map(|m| m.note_id.clone())
            .or_else(|| response.verse.notes.last().map(|n| n.id.clone()))
            .unwrap_or_else(|| note.id.clone());

        self.session.merge_verse_sync(Some(&note.id), response);
        debug!("Saved note {} as {}", note.id, saved_id);
        Ok(saved_id)
    }

    /// Drop a note locally and, when it was persisted, on the server
    pub async fn delete_note(&mut self, note_id: &str) -> Result<()> {
        if self.session.note(note_id).is_none() {
            return Err(ClientError::UnknownNote(note_id.to_string()));
        }

        match self.session.remove_note(note_id) {
            Some(server_id) => {
                self.transport.delete_note(&server_id).await?;
                debug!("Deleted note {}", server_id);
            }
            None => debug!("Discarded unsaved note {}", note_id),
        }
        Ok(())
    }

    /// Toggle a verse highlight and sync it
    pub async fn toggle_highlight(&mut self, verse_id: &str, color: &str) -> Result<HighlightChange> {
        let change = self.session.toggle_highlight(verse_id, color);
        let key = self.session.key_for(verse_id)?;
        self.sync_change(key, VerseChange::Highlight(change.clone())).await?;
        Ok(change)
    }

    /// Bookmark a verse; returns the bookmark id
    pub async fn add_bookmark(&mut self, verse_id: &str, content: &str) -> Result<String> {
        let key = self.session.key_for(verse_id)?;
        let id = self.session.add_bookmark(verse_id, content);
        self.sync_change(key, VerseChange::Bookmark(true)).await?;
        Ok(id)
    }

    pub async fn remove_bookmark(&mut self, bookmark_id: &str) -> Result<()> {
        let bookmark = self
            .session
            .remove_bookmark(bookmark_id)
            .ok_or_else(|| ClientError::UnknownBookmark(bookmark_id.to_string()))?;
        let key = self
            .session
            .resolve_key(&bookmark.verse_id, bookmark.key.as_ref())?;
        self.sync_change(key, VerseChange::Bookmark(false)).await
    }

    /// Save every note whose verse record is known in one batch call
    pub async fn sync_pending_notes(&mut self) -> Result<Vec<NoteSyncResult>> {
        let items = self.session.batch_items();
        if items.is_empty() {
            debug!("No notes to sync");
            return Ok(Vec::new());
        }

        let results = self
            .transport
            .sync_notes(self.session.user_id(), &items)
            .await?;
        self.session.merge_batch(&results);
        info!("Synced {} notes", results.len());
        Ok(results)
    }

    async fn sync_change(&mut self, key: VerseKey, change: VerseChange) -> Result<()> {
        let request = VerseSyncRequest { key, change };
        let response = self.transport.sync_verse(&request).await?;
        self.session.merge_verse_sync(None, response);
        Ok(())
    }
}
