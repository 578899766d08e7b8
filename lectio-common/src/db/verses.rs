//! Verse records
//!
//! One row per (user, book, chapter, verse). The composite key carries a
//! UNIQUE constraint, so [`insert_verse_if_absent`] is the only way rows are
//! created and concurrent first writes can never produce a duplicate.

use super::notes::notes_for_verses;
use crate::models::{Note, Verse, VerseKey};
use crate::Result;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Look up a verse record (without notes) by composite key
pub async fn find_verse_by_key(
    conn: &mut SqliteConnection,
    key: &VerseKey,
) -> Result<Option<Verse>> {
    let verse = sqlx::query_as::<_, Verse>(
        r#"
        SELECT * FROM verses
        WHERE user_id = ? AND book_id = ? AND chapter_id = ? AND verse_id = ?
        "#,
    )
    .bind(&key.user_id)
    .bind(&key.book_id)
    .bind(&key.chapter_id)
    .bind(&key.verse_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(verse)
}

/// Look up a verse record by its id, only if owned by `user_id`
pub async fn find_verse_for_user(
    conn: &mut SqliteConnection,
    verse_model_id: &str,
    user_id: &str,
) -> Result<Option<Verse>> {
    let verse = sqlx::query_as::<_, Verse>("SELECT * FROM verses WHERE id = ? AND user_id = ?")
        .bind(verse_model_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(verse)
}

/// Look up a verse record by its id
pub async fn find_verse_by_id(
    conn: &mut SqliteConnection,
    verse_model_id: &str,
) -> Result<Option<Verse>> {
    let verse = sqlx::query_as::<_, Verse>("SELECT * FROM verses WHERE id = ?")
        .bind(verse_model_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(verse)
}

/// Atomically create the verse record for `key` unless one exists
///
/// Returns the new record id when this call created it, `None` when the key
/// was already taken. The initial highlight/bookmark values only apply to a
/// newly created row.
pub async fn insert_verse_if_absent(
    conn: &mut SqliteConnection,
    key: &VerseKey,
    highlight_color: Option<&str>,
    is_bookmarked: bool,
) -> Result<Option<String>> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let created: Option<String> = sqlx::query_scalar(
        r#"
        INSERT INTO verses (id, user_id, book_id, chapter_id, verse_id,
                            highlight_color, is_bookmarked, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, book_id, chapter_id, verse_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&id)
    .bind(&key.user_id)
    .bind(&key.book_id)
    .bind(&key.chapter_id)
    .bind(&key.verse_id)
    .bind(highlight_color)
    .bind(is_bookmarked)
    .bind(now)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if created.is_some() {
        debug!(
            "Created verse record {} for {}/{}/{}",
            id, key.user_id, key.chapter_id, key.verse_id
        );
    }
    Ok(created)
}

/// Set or clear (`None`) the highlight colour
pub async fn set_highlight(
    conn: &mut SqliteConnection,
    verse_model_id: &str,
    highlight_color: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE verses SET highlight_color = ?, updated_at = ? WHERE id = ?")
        .bind(highlight_color)
        .bind(Utc::now())
        .bind(verse_model_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn set_bookmark(
    conn: &mut SqliteConnection,
    verse_model_id: &str,
    is_bookmarked: bool,
) -> Result<()> {
    sqlx::query("UPDATE verses SET is_bookmarked = ?, updated_at = ? WHERE id = ?")
        .bind(is_bookmarked)
        .bind(Utc::now())
        .bind(verse_model_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Bump `updated_at` after a change to one of the verse's notes
pub async fn touch_verse(conn: &mut SqliteConnection, verse_model_id: &str) -> Result<()> {
    sqlx::query("UPDATE verses SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(verse_model_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Full verse record with its notes, by composite key
pub async fn load_verse_with_notes(
    conn: &mut SqliteConnection,
    key: &VerseKey,
) -> Result<Option<Verse>> {
    let Some(mut verse) = find_verse_by_key(conn, key).await? else {
        return Ok(None);
    };

    verse.notes = notes_for_verses(conn, &[verse.id.clone()]).await?;
    Ok(Some(verse))
}

/// A user's verse records filtered by book, chapter and scripture verse ids
///
/// Filters that are `None` (or an empty id list) are not applied. Notes are
/// loaded with one extra query for the whole result set.
pub async fn query_verses(
    conn: &mut SqliteConnection,
    user_id: &str,
    book_id: Option<&str>,
    chapter_id: Option<&str>,
    verse_ids: &[String],
) -> Result<Vec<Verse>> {
    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM verses WHERE user_id = ");
    builder.push_bind(user_id.to_string());

    if let Some(book_id) = book_id {
        builder.push(" AND book_id = ").push_bind(book_id.to_string());
    }
    if let Some(chapter_id) = chapter_id {
        builder.push(" AND chapter_id = ").push_bind(chapter_id.to_string());
    }
    if !verse_ids.is_empty() {
        builder.push(" AND verse_id IN (");
        let mut separated = builder.separated(", ");
        for id in verse_ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at, rowid");

    let mut verses = builder
        .build_query_as::<Verse>()
        .fetch_all(&mut *conn)
        .await?;

    attach_notes(conn, &mut verses).await?;
    Ok(verses)
}

async fn attach_notes(conn: &mut SqliteConnection, verses: &mut [Verse]) -> Result<()> {
    let ids: Vec<String> = verses.iter().map(|v| v.id.clone()).collect();

    let mut by_verse: HashMap<String, Vec<Note>> = HashMap::new();
    for note in notes_for_verses(conn, &ids).await? {
        by_verse
            .entry(note.verse_model_id.clone())
            .or_default()
            .push(note);
    }

    for verse in verses.iter_mut() {
        verse.notes = by_verse.remove(&verse.id).unwrap_or_default();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_memory_database;
    use crate::db::notes::insert_note;

    fn key(user: &str, verse: &str) -> VerseKey {
        VerseKey::new(user, "GEN", "GEN.1", verse)
    }

    #[tokio::test]
    async fn test_insert_if_absent_creates_once() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = insert_verse_if_absent(&mut conn, &key("u1", "GEN.1.1"), Some("bg-yellow-200"), false)
            .await
            .unwrap();
        let second = insert_verse_if_absent(&mut conn, &key("u1", "GEN.1.1"), None, true)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verses")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);

        // Initial values of the losing insert are not applied
        let verse = find_verse_by_key(&mut conn, &key("u1", "GEN.1.1")).await.unwrap().unwrap();
        assert_eq!(verse.highlight_color.as_deref(), Some("bg-yellow-200"));
        assert!(!verse.is_bookmarked);
    }

    #[tokio::test]
    async fn test_same_verse_different_users() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert!(insert_verse_if_absent(&mut conn, &key("u1", "GEN.1.1"), None, false).await.unwrap().is_some());
        assert!(insert_verse_if_absent(&mut conn, &key("u2", "GEN.1.1"), None, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_set_highlight_and_bookmark() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let id = insert_verse_if_absent(&mut conn, &key("u1", "GEN.1.1"), Some("bg-red-200"), false)
            .await
            .unwrap()
            .unwrap();

        set_highlight(&mut conn, &id, None).await.unwrap();
        set_bookmark(&mut conn, &id, true).await.unwrap();

        let verse = find_verse_by_id(&mut conn, &id).await.unwrap().unwrap();
        assert_eq!(verse.highlight_color, None);
        assert!(verse.is_bookmarked);
    }

    #[tokio::test]
    async fn test_query_verses_filters_and_nests_notes() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = insert_verse_if_absent(&mut conn, &key("u1", "GEN.1.1"), None, false)
            .await
            .unwrap()
            .unwrap();
        insert_verse_if_absent(&mut conn, &key("u1", "GEN.1.2"), None, true).await.unwrap();
        insert_verse_if_absent(&mut conn, &key("u2", "GEN.1.1"), None, false).await.unwrap();
        insert_note(&mut conn, &first, "light").await.unwrap();

        let verses = query_verses(
            &mut conn,
            "u1",
            Some("GEN"),
            Some("GEN.1"),
            &["GEN.1.1".to_string(), "GEN.1.2".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(verses.len(), 2);
        assert!(verses.iter().all(|v| v.user_id == "u1"));
        let with_note = verses.iter().find(|v| v.verse_id == "GEN.1.1").unwrap();
        assert_eq!(with_note.notes.len(), 1);
        assert_eq!(with_note.notes[0].content, "light");

        let only_second = query_verses(&mut conn, "u1", None, None, &["GEN.1.2".to_string()])
            .await
            .unwrap();
        assert_eq!(only_second.len(), 1);
        assert!(only_second[0].notes.is_empty());
    }

    #[tokio::test]
    async fn test_load_verse_with_notes_missing_key() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert!(load_verse_with_notes(&mut conn, &key("u1", "EXO.1.1")).await.unwrap().is_none());
    }
}
