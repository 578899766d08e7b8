//! User profile endpoint
//!
//! Called once after sign-in so that journals have an owner row. The
//! identity provider handshake happens elsewhere.

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    Form, Json,
};
use lectio_common::api::{Status, UserForm, UserResponse};
use lectio_common::db::users;

use crate::error::ApiResult;
use crate::AppState;

/// POST /api/users
///
/// 201 when the profile was created, 200 when it already existed.
pub async fn ensure_user(
    State(state): State<AppState>,
    form: Result<Form<UserForm>, FormRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Form(form) = form?;

    let mut conn = state.db.acquire().await?;
    let (user, created) = users::ensure_user(&mut conn, &form).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(UserResponse {
            status: Status::Success,
            user,
        }),
    ))
}
