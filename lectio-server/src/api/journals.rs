//! Journal endpoints
//!
//! Reads and deletes take the acting user from `?userId=`; creates and edits
//! carry it in the form.

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Path, Query, State,
    },
    Form, Json,
};
use lectio_common::api::{
    JournalDeleteResponse, JournalForm, JournalListResponse, JournalResponse, Status,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::journals;
use crate::AppState;

/// `?userId=&limit=` on journal reads
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalScope {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// GET /api/journals?userId=&limit=
pub async fn list_journals(
    State(state): State<AppState>,
    scope: Result<Query<JournalScope>, QueryRejection>,
) -> ApiResult<Json<JournalListResponse>> {
    let Query(scope) = scope?;

    let journals = journals::list_journals(&state.db, &scope.user_id, scope.limit).await?;

    Ok(Json(JournalListResponse {
        status: Status::Success,
        journals,
    }))
}

/// POST /api/journals
pub async fn create_journal(
    State(state): State<AppState>,
    form: Result<Form<JournalForm>, FormRejection>,
) -> ApiResult<Json<JournalResponse>> {
    let Form(form) = form?;

    let journal = journals::create_journal(&state.db, form).await?;

    Ok(Json(JournalResponse {
        status: Status::Success,
        journal,
    }))
}

/// GET /api/journals/:id?userId=
pub async fn get_journal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    scope: Result<Query<JournalScope>, QueryRejection>,
) -> ApiResult<Json<JournalResponse>> {
    let Query(scope) = scope?;

    let journal = journals::get_journal(&state.db, &id, &scope.user_id).await?;

    Ok(Json(JournalResponse {
        status: Status::Success,
        journal,
    }))
}

/// PUT /api/journals/:id
pub async fn update_journal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<JournalForm>, FormRejection>,
) -> ApiResult<Json<JournalResponse>> {
    let Form(form) = form?;

    let journal = journals::update_journal(&state.db, &id, form).await?;

    Ok(Json(JournalResponse {
        status: Status::Success,
        journal,
    }))
}

/// DELETE /api/journals/:id?userId=
pub async fn delete_journal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    scope: Result<Query<JournalScope>, QueryRejection>,
) -> ApiResult<Json<JournalDeleteResponse>> {
    let Query(scope) = scope?;

    journals::delete_journal(&state.db, &id, &scope.user_id).await?;

    Ok(Json(JournalDeleteResponse {
        status: Status::Success,
        id,
    }))
}
