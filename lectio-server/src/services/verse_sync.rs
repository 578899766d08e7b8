//! Verse-state synchronizer
//!
//! Applies one [`VerseChange`] to the caller's record for one scripture
//! verse, creating the record on first touch, and returns the post-write
//! snapshot with all notes.
//!
//! The whole sequence runs in one transaction. It opens with the atomic
//! insert-or-ignore on the composite key, so the SQLite write lock is held
//! from the first statement and two first-touch requests for the same key
//! can never both create a record.

use lectio_common::api::{NoteIdMapping, NotePayload, VerseChange, VerseSyncRequest};
use lectio_common::db::{notes, verses};
use lectio_common::models::Verse;
use lectio_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

/// Result of one verse synchronization
#[derive(Debug, Clone)]
pub struct VerseSyncOutcome {
    pub verse: Verse,
    /// Present when the request carried a note
    pub note_ids: Option<NoteIdMapping>,
    /// True when this request created the verse record
    pub created: bool,
}

/// Apply `request` and return the authoritative verse state
pub async fn sync_verse(pool: &SqlitePool, request: VerseSyncRequest) -> Result<VerseSyncOutcome> {
    let VerseSyncRequest { key, change } = request;

    let (initial_highlight, initial_bookmark) = match &change {
        VerseChange::Highlight(highlight) => (highlight.stored_value(), false),
        VerseChange::Bookmark(flag) => (None, *flag),
        VerseChange::Note(_) | VerseChange::Touch => (None, false),
    };

    let mut tx = pool.begin().await?;

    let created_id =
        verses::insert_verse_if_absent(&mut tx, &key, initial_highlight, initial_bookmark).await?;
    let created = created_id.is_some();

    let verse_model_id = match created_id {
        Some(id) => id,
        None => {
            verses::find_verse_by_key(&mut tx, &key)
                .await?
                .ok_or_else(|| Error::Internal("Verse record missing after insert".to_string()))?
                .id
        }
    };

    let note_ids = match change {
        VerseChange::Note(payload) => {
            Some(apply_note(&mut tx, &verse_model_id, payload, created).await?)
        }
        VerseChange::Highlight(highlight) if !created => {
            verses::set_highlight(&mut tx, &verse_model_id, highlight.stored_value()).await?;
            None
        }
        VerseChange::Bookmark(flag) if !created => {
            verses::set_bookmark(&mut tx, &verse_model_id, flag).await?;
            None
        }
        _ => None,
    };

    let verse = verses::load_verse_with_notes(&mut tx, &key)
        .await?
        .ok_or_else(|| Error::Internal("Verse record missing after write".to_string()))?;

    tx.commit().await?;

    debug!(
        "Synchronized verse {} for user {} (created: {}, notes: {})",
        key.verse_id,
        key.user_id,
        created,
        verse.notes.len()
    );

    Ok(VerseSyncOutcome {
        verse,
        note_ids,
        created,
    })
}

/// Write the note carried by a verse-sync request
///
/// An id that matches no note of this verse (for example a client-local
/// temporary id) falls back to creating a new note.
async fn apply_note(
    conn: &mut SqliteConnection,
    verse_model_id: &str,
    payload: NotePayload,
    verse_created: bool,
) -> Result<NoteIdMapping> {
    let existing_id = payload.id.as_deref().filter(|id| !id.trim().is_empty());

    let updated = match existing_id {
        Some(id) if !verse_created => {
            notes::update_note_in_verse(conn, id, verse_model_id, &payload.content).await?
        }
        _ => None,
    };

    let note = match updated {
        Some(note) => note,
        None => notes::insert_note(conn, verse_model_id, &payload.content).await?,
    };

    if !verse_created {
        verses::touch_verse(conn, verse_model_id).await?;
    }

    Ok(NoteIdMapping {
        local_id: payload.id,
        note_id: note.id,
    })
}
