//! Journal entry manager
//!
//! Validated CRUD over journal entries. Every operation is scoped by the
//! acting user; a journal id that belongs to someone else is reported as
//! not found.

use lectio_common::api::{JournalDraft, JournalForm};
use lectio_common::db::{journals, tags, users};
use lectio_common::models::JournalEntry;
use lectio_common::{Error, FieldError, Result};
use sqlx::{SqliteConnection, SqlitePool};

fn require_user(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(Error::Validation(vec![FieldError::new(
            "userId",
            "userId is required",
        )]));
    }
    Ok(user_id)
}

/// Schema validation plus the checks that need the database
async fn validate(conn: &mut SqliteConnection, form: JournalForm) -> Result<JournalDraft> {
    let draft = form.validate().map_err(Error::Validation)?;

    let mut errors = Vec::new();
    if tags::find_tag(conn, &draft.tag_id).await?.is_none() {
        errors.push(FieldError::new("tagId", "Unknown tag"));
    }
    if users::find_user(conn, &draft.user_id).await?.is_none() {
        errors.push(FieldError::new("userId", "Unknown user"));
    }
    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }

    Ok(draft)
}

fn not_found(journal_id: &str) -> Error {
    Error::NotFound(format!("Journal {} not found", journal_id))
}

pub async fn create_journal(pool: &SqlitePool, form: JournalForm) -> Result<JournalEntry> {
    let mut conn = pool.acquire().await?;
    let draft = validate(&mut conn, form).await?;

    let id = journals::insert_journal(&mut conn, &draft).await?;
    journals::find_journal_for_user(&mut conn, &id, &draft.user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Journal {} missing after insert", id)))
}

pub async fn get_journal(pool: &SqlitePool, journal_id: &str, user_id: &str) -> Result<JournalEntry> {
    let user_id = require_user(user_id)?;
    let mut conn = pool.acquire().await?;

    journals::find_journal_for_user(&mut conn, journal_id, user_id)
        .await?
        .ok_or_else(|| not_found(journal_id))
}

/// A user's journals, newest first
pub async fn list_journals(
    pool: &SqlitePool,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<JournalEntry>> {
    let user_id = require_user(user_id)?;
    if limit.is_some_and(|l| l < 1) {
        return Err(Error::InvalidInput("limit must be positive".to_string()));
    }

    let mut conn = pool.acquire().await?;
    journals::list_journals_for_user(&mut conn, user_id, limit).await
}

pub async fn update_journal(
    pool: &SqlitePool,
    journal_id: &str,
    form: JournalForm,
) -> Result<JournalEntry> {
    let mut conn = pool.acquire().await?;
    let draft = validate(&mut conn, form).await?;

    if !journals::update_journal_for_user(&mut conn, journal_id, &draft).await? {
        return Err(not_found(journal_id));
    }

    journals::find_journal_for_user(&mut conn, journal_id, &draft.user_id)
        .await?
        .ok_or_else(|| not_found(journal_id))
}

pub async fn delete_journal(pool: &SqlitePool, journal_id: &str, user_id: &str) -> Result<()> {
    let user_id = require_user(user_id)?;
    let mut conn = pool.acquire().await?;

    if !journals::delete_journal_for_user(&mut conn, journal_id, user_id).await? {
        return Err(not_found(journal_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_common::api::UserForm;
    use lectio_common::db::init_memory_database;

    async fn seed(pool: &SqlitePool) -> String {
        let mut conn = pool.acquire().await.unwrap();
        for id in ["u1", "u2"] {
            users::ensure_user(
                &mut conn,
                &UserForm {
                    id: id.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        tags::create_tag(&mut conn, "Gratitude").await.unwrap().id
    }

    fn form(user_id: &str, tag_id: &str, title: &str) -> JournalForm {
        JournalForm {
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: "<p>Give thanks</p>".to_string(),
            tag_id: tag_id.to_string(),
            entry_type: "gratitude".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_returns_rehydrated_entry() {
        let pool = init_memory_database().await.unwrap();
        let tag_id = seed(&pool).await;

        let entry = create_journal(&pool, form("u1", &tag_id, "  Evening  ")).await.unwrap();

        assert_eq!(entry.journal.title, "Evening");
        assert_eq!(entry.tag.name, "Gratitude");
        assert_eq!(entry.user.id, "u1");
    }

    #[tokio::test]
    async fn test_unknown_tag_is_field_error() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        match create_journal(&pool, form("u1", "no-such-tag", "Evening")).await {
            Err(Error::Validation(fields)) => assert_eq!(fields[0].field, "tagId"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_foreign_journal_is_not_found() {
        let pool = init_memory_database().await.unwrap();
        let tag_id = seed(&pool).await;
        let entry = create_journal(&pool, form("u1", &tag_id, "Mine")).await.unwrap();
        let id = entry.journal.id;

        assert!(matches!(get_journal(&pool, &id, "u2").await, Err(Error::NotFound(_))));
        assert!(matches!(
            update_journal(&pool, &id, form("u2", &tag_id, "Taken")).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(delete_journal(&pool, &id, "u2").await, Err(Error::NotFound(_))));

        assert_eq!(get_journal(&pool, &id, "u1").await.unwrap().journal.title, "Mine");
    }

    #[tokio::test]
    async fn test_list_rejects_non_positive_limit() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        assert!(matches!(
            list_journals(&pool, "u1", Some(0)).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(list_journals(&pool, "u1", None).await.unwrap().is_empty());
    }
}
