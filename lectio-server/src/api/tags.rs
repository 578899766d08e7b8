//! Tag endpoints offered by the journal form

use axum::{
    extract::{rejection::FormRejection, State},
    Form, Json,
};
use lectio_common::api::{Status, TagForm, TagListResponse, TagResponse};
use lectio_common::db::tags;

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<TagListResponse>> {
    let mut conn = state.db.acquire().await?;
    let tags = tags::list_tags(&mut conn).await?;

    Ok(Json(TagListResponse {
        status: Status::Success,
        tags,
    }))
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    form: Result<Form<TagForm>, FormRejection>,
) -> ApiResult<Json<TagResponse>> {
    let Form(form) = form?;

    let mut conn = state.db.acquire().await?;
    let tag = tags::create_tag(&mut conn, &form.name).await?;

    Ok(Json(TagResponse {
        status: Status::Success,
        tag,
    }))
}
