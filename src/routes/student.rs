use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use validator::Validate;

use crate::dto::quiz_dto::{StartQuizRequest, SubmitAnswerRequest};
use crate::error::Result;
use crate::middleware::auth::CurrentUser;
use crate::AppState;

#[axum::debug_handler]
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<StartQuizRequest>,
) -> Result<Response> {
    req.validate()?;
    let res = state.attempt_service.start_attempt(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(res)).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Response> {
    req.validate()?;
    let res = state.attempt_service.submit_answer(user.id, req).await?;
    Ok(Json(res).into_response())
}

#[axum::debug_handler]
pub async fn complete_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(attempt_id): Path<i64>,
) -> Result<Response> {
    let res = state
        .attempt_service
        .complete_attempt(user.id, attempt_id)
        .await?;
    Ok(Json(res).into_response())
}

#[axum::debug_handler]
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response> {
    let attempts = state.attempt_service.list_my_attempts(user.id).await?;
    Ok(Json(attempts).into_response())
}

#[axum::debug_handler]
pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(attempt_id): Path<i64>,
) -> Result<Response> {
    let detail = state
        .attempt_service
        .get_attempt_detail(user.id, attempt_id)
        .await?;
    Ok(Json(detail).into_response())
}
