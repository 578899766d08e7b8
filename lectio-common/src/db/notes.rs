//! Note records

use crate::models::Note;
use crate::Result;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;
use uuid::Uuid;

/// Find a note by id, only if it belongs to the given verse record
pub async fn find_note_in_verse(
    conn: &mut SqliteConnection,
    note_id: &str,
    verse_model_id: &str,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        "SELECT * FROM notes WHERE id = ? AND verse_model_id = ?",
    )
    .bind(note_id)
    .bind(verse_model_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(note)
}

/// Find a note by id, only if its verse record is owned by `user_id`
pub async fn find_note_for_user(
    conn: &mut SqliteConnection,
    note_id: &str,
    user_id: &str,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        SELECT n.* FROM notes n
        JOIN verses v ON v.id = n.verse_model_id
        WHERE n.id = ? AND v.user_id = ?
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(note)
}

/// Create a note attached to a verse record
pub async fn insert_note(
    conn: &mut SqliteConnection,
    verse_model_id: &str,
    content: &str,
) -> Result<Note> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let note = sqlx::query_as::<_, Note>(
        r#"
        INSERT INTO notes (id, verse_model_id, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(verse_model_id)
    .bind(content)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Created note {} on verse record {}", id, verse_model_id);
    Ok(note)
}

/// Replace a note's content; `None` when no note with that id is in the verse
pub async fn update_note_in_verse(
    conn: &mut SqliteConnection,
    note_id: &str,
    verse_model_id: &str,
    content: &str,
) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        UPDATE notes SET content = ?, updated_at = ?
        WHERE id = ? AND verse_model_id = ?
        RETURNING *
        "#,
    )
    .bind(content)
    .bind(Utc::now())
    .bind(note_id)
    .bind(verse_model_id)
    .fetch_optional(&mut *conn)
    .await?;

    if note.is_some() {
        debug!("Updated note {}", note_id);
    }
    Ok(note)
}

/// Delete a note by id, returning the removed row
pub async fn delete_note(conn: &mut SqliteConnection, note_id: &str) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>("DELETE FROM notes WHERE id = ? RETURNING *")
        .bind(note_id)
        .fetch_optional(&mut *conn)
        .await?;

    if note.is_some() {
        debug!("Deleted note {}", note_id);
    }
    Ok(note)
}

/// All notes of the given verse records, oldest first
pub async fn notes_for_verses(
    conn: &mut SqliteConnection,
    verse_model_ids: &[String],
) -> Result<Vec<Note>> {
    if verse_model_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM notes WHERE verse_model_id IN (");
    let mut separated = builder.separated(", ");
    for id in verse_model_ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(") ORDER BY created_at, rowid");

    let notes = builder
        .build_query_as::<Note>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(notes)
}

/// Number of notes attached to a verse record
pub async fn count_notes(conn: &mut SqliteConnection, verse_model_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE verse_model_id = ?")
        .bind(verse_model_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
