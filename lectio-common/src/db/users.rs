//! User profiles
//!
//! Profiles are keyed by the identity provider's user id. The server never
//! authenticates; it only mirrors the profile on first sign-in.

use crate::api::UserForm;
use crate::models::User;
use crate::{Error, FieldError, Result};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

pub async fn find_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(user)
}

/// Find the profile for `form.id`, creating it when absent
///
/// Returns the stored profile and whether this call created it. An existing
/// profile is returned unchanged.
pub async fn ensure_user(conn: &mut SqliteConnection, form: &UserForm) -> Result<(User, bool)> {
    let user_id = form.id.trim();
    if user_id.is_empty() {
        return Err(Error::Validation(vec![FieldError::new("id", "id is required")]));
    }

    let inserted = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, first_name, last_name, profile_image, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(form.email.trim())
    .bind(form.first_name.trim())
    .bind(form.last_name.trim())
    .bind(form.profile_image.as_deref())
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(user) = inserted {
        info!("Created user profile {}", user.id);
        return Ok((user, true));
    }

    let existing = find_user(conn, user_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} vanished after conflict", user_id)))?;
    Ok((existing, false))
}
