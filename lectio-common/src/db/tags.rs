//! Journal tags

use crate::models::Tag;
use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

/// All tags, alphabetically
pub async fn list_tags(conn: &mut SqliteConnection) -> Result<Vec<Tag>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
        .fetch_all(&mut *conn)
        .await?;

    Ok(tags)
}

pub async fn find_tag(conn: &mut SqliteConnection, tag_id: &str) -> Result<Option<Tag>> {
    let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = ?")
        .bind(tag_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(tag)
}

/// Create a tag, or return the existing one with the same name
pub async fn create_tag(conn: &mut SqliteConnection, name: &str) -> Result<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Tag name is required".to_string()));
    }

    let inserted = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (id, name, created_at) VALUES (?, ?, ?)
        ON CONFLICT (name) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(tag) = inserted {
        info!("Created tag '{}' ({})", tag.name, tag.id);
        return Ok(tag);
    }

    let existing = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(existing)
}
