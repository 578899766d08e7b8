//! Note endpoints
//!
//! - `POST /api/note/createOrUpdateNote`: update or create one note
//! - `DELETE /api/note/createOrUpdateNote`: delete one note by id
//! - `POST /api/note/createOrUpdateMultipleNotes`: batch sync for one user

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use lectio_common::api::{
    NoteBatchForm, NoteBatchResponse, NoteDeleteForm, NoteDeleteResponse, NoteUpsertForm,
    NoteUpsertResponse, Status,
};
use tracing::info;

use crate::error::ApiResult;
use crate::services::note_sync;
use crate::AppState;

/// POST /api/note/createOrUpdateNote
pub async fn upsert_note(
    State(state): State<AppState>,
    form: Result<Form<NoteUpsertForm>, FormRejection>,
) -> ApiResult<Json<NoteUpsertResponse>> {
    let Form(form) = form?;

    let (note, note_ids) = note_sync::upsert_note(&state.db, form).await?;

    Ok(Json(NoteUpsertResponse {
        status: Status::Success,
        note,
        note_ids,
    }))
}

/// DELETE /api/note/createOrUpdateNote
pub async fn delete_note(
    State(state): State<AppState>,
    form: Result<Form<NoteDeleteForm>, FormRejection>,
) -> ApiResult<Json<NoteDeleteResponse>> {
    let Form(form) = form?;

    let note = note_sync::delete_note(&state.db, form.note_id.as_deref()).await?;

    Ok(Json(NoteDeleteResponse {
        status: Status::Success,
        message: "Note deleted successfully".to_string(),
        note,
    }))
}

/// POST /api/note/createOrUpdateMultipleNotes
pub async fn sync_notes(
    State(state): State<AppState>,
    form: Result<Form<NoteBatchForm>, FormRejection>,
) -> ApiResult<Json<NoteBatchResponse>> {
    let Form(form) = form?;

    let notes = note_sync::sync_batch(&state.db, form).await?;
    info!("Batch synchronized {} notes", notes.len());

    Ok(Json(NoteBatchResponse {
        status: Status::Success,
        notes,
    }))
}
