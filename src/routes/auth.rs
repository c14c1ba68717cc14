use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::auth_dto::{LoginRequest, RegisterRequest};
use crate::error::Result;
use crate::models::user::UserRole;
use crate::AppState;

#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    req.validate()?;
    let res = state.auth_service.login(req, UserRole::Admin).await?;
    Ok(Json(res).into_response())
}

#[axum::debug_handler]
pub async fn student_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    req.validate()?;
    let res = state.auth_service.login(req, UserRole::Student).await?;
    Ok(Json(res).into_response())
}

#[axum::debug_handler]
pub async fn student_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response> {
    req.validate()?;
    let res = state.auth_service.register_student(req).await?;
    Ok((StatusCode::CREATED, Json(res)).into_response())
}
