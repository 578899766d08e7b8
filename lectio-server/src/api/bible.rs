//! Verse endpoints
//!
//! - `POST /api/bible`: apply one change to a verse record (form-encoded)
//! - `GET /api/bible`: a user's verse records with nested notes

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    Form, Json,
};
use lectio_common::api::{Status, VerseQuery, VerseQueryResponse, VerseSyncForm, VerseSyncResponse};
use lectio_common::db::verses;
use lectio_common::FieldError;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::services::verse_sync;
use crate::AppState;

/// POST /api/bible
pub async fn sync_verse(
    State(state): State<AppState>,
    form: Result<Form<VerseSyncForm>, FormRejection>,
) -> ApiResult<Json<VerseSyncResponse>> {
    let Form(form) = form?;
    let request = form.into_request()?;

    let outcome = verse_sync::sync_verse(&state.db, request).await?;

    Ok(Json(VerseSyncResponse {
        status: Status::Success,
        verse: outcome.verse,
        note_ids: outcome.note_ids,
    }))
}

/// GET /api/bible?userId=&chapterId=&bookId=&verseIds=a,b,c
pub async fn query_verses(
    State(state): State<AppState>,
    query: Result<Query<VerseQuery>, QueryRejection>,
) -> ApiResult<Json<VerseQueryResponse>> {
    let Query(query) = query?;

    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "userId",
            "userId is required",
        )]));
    }

    let verse_ids = query.verse_id_list();
    let mut conn = state.db.acquire().await?;
    let verses = verses::query_verses(&mut conn, user_id, query.book(), query.chapter(), &verse_ids)
        .await?;

    debug!("Verse query for user {} returned {} records", user_id, verses.len());

    Ok(Json(VerseQueryResponse {
        status: Status::Success,
        verses,
    }))
}
