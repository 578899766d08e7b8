//! Journal entries
//!
//! Reads return [`JournalEntry`] values rehydrated with their tag and owner
//! in a single JOIN. Every read and write is scoped by the owning user.

use crate::api::JournalDraft;
use crate::models::{Journal, JournalEntry, Tag, User};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::{debug, info};
use uuid::Uuid;

const ENTRY_SELECT: &str = r#"
    SELECT j.id, j.title, j.body, j.entry_type, j.tag_id, j.user_id,
           j.created_at, j.updated_at,
           t.name AS tag_name, t.created_at AS tag_created_at,
           u.email AS user_email, u.first_name AS user_first_name,
           u.last_name AS user_last_name, u.profile_image AS user_profile_image,
           u.customer_id AS user_customer_id, u.created_at AS user_created_at
    FROM journals j
    JOIN tags t ON t.id = j.tag_id
    JOIN users u ON u.id = j.user_id
"#;

/// Flat JOIN row, split into journal, tag and user
#[derive(FromRow)]
struct EntryRow {
    id: String,
    title: String,
    body: String,
    entry_type: String,
    tag_id: String,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tag_name: String,
    tag_created_at: DateTime<Utc>,
    user_email: String,
    user_first_name: String,
    user_last_name: String,
    user_profile_image: Option<String>,
    user_customer_id: Option<String>,
    user_created_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_entry(self) -> JournalEntry {
        JournalEntry {
            tag: Tag {
                id: self.tag_id.clone(),
                name: self.tag_name,
                created_at: self.tag_created_at,
            },
            user: User {
                id: self.user_id.clone(),
                email: self.user_email,
                first_name: self.user_first_name,
                last_name: self.user_last_name,
                profile_image: self.user_profile_image,
                customer_id: self.user_customer_id,
                created_at: self.user_created_at,
            },
            journal: Journal {
                id: self.id,
                title: self.title,
                body: self.body,
                entry_type: self.entry_type,
                tag_id: self.tag_id,
                user_id: self.user_id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }
}

/// Insert a validated draft, returning the new journal id
pub async fn insert_journal(conn: &mut SqliteConnection, draft: &JournalDraft) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO journals (id, title, body, entry_type, tag_id, user_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&draft.title)
    .bind(&draft.body)
    .bind(&draft.entry_type)
    .bind(&draft.tag_id)
    .bind(&draft.user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    info!("Created journal {} for user {}", id, draft.user_id);
    Ok(id)
}

pub async fn find_journal_for_user(
    conn: &mut SqliteConnection,
    journal_id: &str,
    user_id: &str,
) -> Result<Option<JournalEntry>> {
    let sql = format!("{} WHERE j.id = ? AND j.user_id = ?", ENTRY_SELECT);
    let row = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(journal_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(EntryRow::into_entry))
}

/// A user's journals, newest first
pub async fn list_journals_for_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<JournalEntry>> {
    // SQLite treats a negative LIMIT as "no limit"
    let sql = format!(
        "{} WHERE j.user_id = ? ORDER BY j.created_at DESC, j.rowid DESC LIMIT ?",
        ENTRY_SELECT
    );
    let rows = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(user_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(EntryRow::into_entry).collect())
}

/// Overwrite a journal owned by `draft.user_id`; false when no such pair
pub async fn update_journal_for_user(
    conn: &mut SqliteConnection,
    journal_id: &str,
    draft: &JournalDraft,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE journals
        SET title = ?, body = ?, entry_type = ?, tag_id = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.body)
    .bind(&draft.entry_type)
    .bind(&draft.tag_id)
    .bind(Utc::now())
    .bind(journal_id)
    .bind(&draft.user_id)
    .execute(&mut *conn)
    .await?;

    let updated = result.rows_affected() > 0;
    if updated {
        debug!("Updated journal {}", journal_id);
    }
    Ok(updated)
}

/// Delete a journal owned by `user_id`; false when no such pair
pub async fn delete_journal_for_user(
    conn: &mut SqliteConnection,
    journal_id: &str,
    user_id: &str,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM journals WHERE id = ? AND user_id = ?")
        .bind(journal_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        info!("Deleted journal {}", journal_id);
    }
    Ok(deleted)
}
