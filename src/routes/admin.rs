use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::dto::admin_dto::{EnrollmentStatusUpdated, PackageListQuery, UpdateEnrollmentStatusRequest};
use crate::dto::catalog_dto::{CourseRequest, QuestionRequest, QuizPackageRequest};
use crate::error::{Error, Result};
use crate::models::enrollment::EnrollmentStatus;
use crate::AppState;

fn deleted(what: &str) -> Response {
    Json(json!({ "message": format!("{} deleted successfully", what) })).into_response()
}

// Courses

#[axum::debug_handler]
pub async fn list_courses(State(state): State<AppState>) -> Result<Response> {
    Ok(Json(state.catalog_service.list_courses().await?).into_response())
}

#[axum::debug_handler]
pub async fn get_course(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    Ok(Json(state.catalog_service.get_course(id).await?).into_response())
}

#[axum::debug_handler]
pub async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<CourseRequest>,
) -> Result<Response> {
    req.validate()?;
    let course = state.catalog_service.create_course(req).await?;
    Ok((StatusCode::CREATED, Json(course)).into_response())
}

#[axum::debug_handler]
pub async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CourseRequest>,
) -> Result<Response> {
    req.validate()?;
    Ok(Json(state.catalog_service.update_course(id, req).await?).into_response())
}

#[axum::debug_handler]
pub async fn delete_course(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    state.catalog_service.delete_course(id).await?;
    Ok(deleted("Course"))
}

#[axum::debug_handler]
pub async fn course_stats(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    Ok(Json(state.stats_service.course_stats(id).await?).into_response())
}

// Quiz packages

#[axum::debug_handler]
pub async fn list_quiz_packages(
    State(state): State<AppState>,
    Query(query): Query<PackageListQuery>,
) -> Result<Response> {
    let course_id = query
        .course_id
        .ok_or_else(|| Error::BadRequest("course_id is required".to_string()))?;
    Ok(Json(state.catalog_service.list_packages(course_id).await?).into_response())
}

#[axum::debug_handler]
pub async fn get_quiz_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    Ok(Json(state.catalog_service.get_package(id).await?).into_response())
}

#[axum::debug_handler]
pub async fn create_quiz_package(
    State(state): State<AppState>,
    Json(req): Json<QuizPackageRequest>,
) -> Result<Response> {
    req.validate()?;
    let package = state.catalog_service.create_package(req).await?;
    Ok((StatusCode::CREATED, Json(package)).into_response())
}

#[axum::debug_handler]
pub async fn update_quiz_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<QuizPackageRequest>,
) -> Result<Response> {
    req.validate()?;
    Ok(Json(state.catalog_service.update_package(id, req).await?).into_response())
}

#[axum::debug_handler]
pub async fn delete_quiz_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    state.catalog_service.delete_package(id).await?;
    Ok(deleted("Quiz package"))
}

#[axum::debug_handler]
pub async fn quiz_package_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    Ok(Json(state.stats_service.package_stats(id).await?).into_response())
}

// Questions

#[axum::debug_handler]
pub async fn get_question(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    Ok(Json(state.catalog_service.get_question(id).await?).into_response())
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Response> {
    req.validate()?;
    let question = state.catalog_service.create_question(req).await?;
    Ok((StatusCode::CREATED, Json(question)).into_response())
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<QuestionRequest>,
) -> Result<Response> {
    req.validate()?;
    Ok(Json(state.catalog_service.update_question(id, req).await?).into_response())
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    state.catalog_service.delete_question(id).await?;
    Ok(deleted("Question"))
}

// Students

#[axum::debug_handler]
pub async fn list_students(State(state): State<AppState>) -> Result<Response> {
    Ok(Json(state.student_service.list_students().await?).into_response())
}

#[axum::debug_handler]
pub async fn courses_overview(State(state): State<AppState>) -> Result<Response> {
    Ok(Json(state.stats_service.courses_overview().await?).into_response())
}

#[axum::debug_handler]
pub async fn students_by_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Response> {
    Ok(Json(state.student_service.students_by_course(course_id).await?).into_response())
}

#[axum::debug_handler]
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    state.student_service.delete_student(id).await?;
    Ok(deleted("Student"))
}

// Enrollments

#[axum::debug_handler]
pub async fn list_enrollments(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Response> {
    Ok(Json(state.enrollment_service.list_enrollments(course_id).await?).into_response())
}

#[axum::debug_handler]
pub async fn update_enrollment_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEnrollmentStatusRequest>,
) -> Result<Response> {
    req.validate()?;
    let status: EnrollmentStatus = req
        .status
        .trim()
        .parse()
        .map_err(|_| Error::BadRequest("Invalid status".to_string()))?;
    let status = state
        .enrollment_service
        .update_enrollment_status(id, status)
        .await?;
    Ok(Json(EnrollmentStatusUpdated {
        message: "Enrollment status updated successfully".to_string(),
        status,
    })
    .into_response())
}
