//! Note synchronizers
//!
//! Single upsert, delete and batch sync of notes by verse record id.
//!
//! Batch items are independent: each runs on its own pooled connection and
//! all of them run to completion before results are collected in request
//! order. Callers must not hold a connection while a batch runs.

use futures::future::join_all;
use lectio_common::api::{NoteBatchForm, NoteBatchItem, NoteIdMapping, NoteSyncResult, NoteUpsertForm};
use lectio_common::db::{notes, verses};
use lectio_common::models::Note;
use lectio_common::{Error, FieldError, Result};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Update the note with `form.note_id` inside `form.verse_id`, or create one
///
/// The single-note forms carry no user id, so these two operations are keyed
/// by record ids alone. Ownership is checked only on the batch path.
pub async fn upsert_note(pool: &SqlitePool, form: NoteUpsertForm) -> Result<(Note, NoteIdMapping)> {
    let verse_model_id = form.verse_id.trim();
    if verse_model_id.is_empty() {
        return Err(Error::Validation(vec![FieldError::new(
            "verseId",
            "verseId is required",
        )]));
    }

    let mut conn = pool.acquire().await?;

    if verses::find_verse_by_id(&mut conn, verse_model_id).await?.is_none() {
        return Err(Error::NotFound(format!("Verse {} not found", verse_model_id)));
    }

    // An id from another verse (or a client temporary id) creates a new note
    let existing = match form.note_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(id) => notes::find_note_in_verse(&mut conn, id, verse_model_id).await?,
        None => None,
    };

    let note = match existing {
        Some(existing) => notes::update_note_in_verse(
            &mut conn,
            &existing.id,
            verse_model_id,
            &form.content,
        )
        .await?
        .ok_or_else(|| Error::NotFound(format!("Note {} not found", existing.id)))?,
        None => notes::insert_note(&mut conn, verse_model_id, &form.content).await?,
    };
    verses::touch_verse(&mut conn, verse_model_id).await?;

    let mapping = NoteIdMapping {
        local_id: form.note_id,
        note_id: note.id.clone(),
    };
    Ok((note, mapping))
}

/// Delete a note by id, returning the removed note
///
/// Not scoped by user; see [`upsert_note`].
pub async fn delete_note(pool: &SqlitePool, note_id: Option<&str>) -> Result<Note> {
    let note_id = note_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::InvalidInput("Note ID is required".to_string()))?;

    let mut conn = pool.acquire().await?;
    let note = notes::delete_note(&mut conn, note_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Note {} not found", note_id)))?;

    info!("Deleted note {} from verse record {}", note.id, note.verse_model_id);
    Ok(note)
}

/// Synchronize every note of a batch for one user
///
/// Items never abort each other. When any item fails, the first failure in
/// request order is returned after all items have finished.
pub async fn sync_batch(pool: &SqlitePool, form: NoteBatchForm) -> Result<Vec<NoteSyncResult>> {
    let items = form.items()?;
    let user_id = form.user_id.trim();

    debug!("Syncing batch of {} notes for user {}", items.len(), user_id);

    let outcomes = join_all(items.into_iter().map(|item| sync_item(pool, user_id, item))).await;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Batch note item failed: {}", e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

/// One batch item: update the user's note by id, else create it in a verse
/// the user owns
async fn sync_item(pool: &SqlitePool, user_id: &str, item: NoteBatchItem) -> Result<NoteSyncResult> {
    let mut conn = pool.acquire().await?;

    let existing = match item.note_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(id) => notes::find_note_for_user(&mut conn, id, user_id).await?,
        None => None,
    };

    if let Some(existing) = existing {
        let note = notes::update_note_in_verse(
            &mut conn,
            &existing.id,
            &existing.verse_model_id,
            &item.content,
        )
        .await?
        .ok_or_else(|| Error::NotFound(format!("Note {} not found", existing.id)))?;

        return Ok(NoteSyncResult {
            local_id: item.note_id,
            created: false,
            note,
        });
    }

    if verses::find_verse_for_user(&mut conn, &item.verse_id, user_id)
        .await?
        .is_none()
    {
        return Err(Error::NotFound(format!("Verse {} not found", item.verse_id)));
    }

    let note = notes::insert_note(&mut conn, &item.verse_id, &item.content).await?;
    Ok(NoteSyncResult {
        local_id: item.note_id,
        created: true,
        note,
    })
}
