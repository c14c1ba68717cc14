//! Unauthenticated endpoints: course catalog, phone-keyed registration and the guest quiz.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use validator::Validate;

use crate::dto::public_dto::{
    CourseRegistrationRequest, DeviceCheckQuery, PhoneCheckQuery, PublicQuizSubmission,
    RegistrationStatusQuery,
};
use crate::error::{Error, Result};
use crate::AppState;

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| Error::BadRequest(format!("{} is required", name)))
}

fn required_text(value: Option<String>, name: &str) -> Result<String> {
    required(value.filter(|v| !v.trim().is_empty()), name)
}

#[axum::debug_handler]
pub async fn register_for_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Json(req): Json<CourseRegistrationRequest>,
) -> Result<Response> {
    req.validate()?;
    let res = state
        .enrollment_service
        .register_for_course(course_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(res)).into_response())
}

#[axum::debug_handler]
pub async fn check_registration(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Query(query): Query<RegistrationStatusQuery>,
) -> Result<Response> {
    let phone = required_text(query.phone_number, "phone_number")?;
    let res = state
        .enrollment_service
        .check_registration_status(course_id, &phone)
        .await?;
    Ok(Json(res).into_response())
}

#[axum::debug_handler]
pub async fn list_courses(State(state): State<AppState>) -> Result<Response> {
    let courses = state.catalog_service.list_courses().await?;
    Ok(Json(courses).into_response())
}

#[axum::debug_handler]
pub async fn get_course(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let course = state.catalog_service.get_course(id).await?;
    Ok(Json(course).into_response())
}

#[axum::debug_handler]
pub async fn get_quiz_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let package = state.catalog_service.get_package(id).await?;
    Ok(Json(package).into_response())
}

#[axum::debug_handler]
pub async fn list_package_questions(
    State(state): State<AppState>,
    Path(package_id): Path<i64>,
) -> Result<Response> {
    let questions = state.catalog_service.list_questions(package_id).await?;
    Ok(Json(questions).into_response())
}

#[axum::debug_handler]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Json(req): Json<PublicQuizSubmission>,
) -> Result<Response> {
    req.validate()?;
    let res = state.attempt_service.submit_guest_attempt(req).await?;
    Ok((StatusCode::CREATED, Json(res)).into_response())
}

#[axum::debug_handler]
pub async fn check_device(
    State(state): State<AppState>,
    Query(query): Query<DeviceCheckQuery>,
) -> Result<Response> {
    let device_id = required_text(query.device_id, "device_id")?;
    let quiz_package_id = required(query.quiz_package_id, "quiz_package_id")?;
    let res = state
        .eligibility_service
        .check_device_eligibility(device_id.trim(), quiz_package_id)
        .await?;
    Ok(Json(res).into_response())
}

#[axum::debug_handler]
pub async fn check_phone(
    State(state): State<AppState>,
    Query(query): Query<PhoneCheckQuery>,
) -> Result<Response> {
    let phone = required_text(query.phone_number, "phone_number")?;
    let course_id = required(query.course_id, "course_id")?;
    let res = state
        .eligibility_service
        .check_phone_for_quiz(phone.trim(), course_id, query.quiz_package_id)
        .await?;
    Ok(Json(res).into_response())
}
