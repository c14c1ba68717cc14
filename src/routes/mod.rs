pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod student;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::auth::{require_admin, require_auth};
use crate::middleware::cors::cors_layer;
use crate::middleware::rate_limit::{rps_middleware, RateLimiter};
use crate::AppState;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/auth/admin/login", post(auth::admin_login))
        .route("/api/auth/student/login", post(auth::student_login))
        .route("/api/auth/student/register", post(auth::student_register))
        .route("/api/register/course/:course_id", post(public::register_for_course))
        .route("/api/register/check/:course_id", get(public::check_registration))
        .route("/api/student/courses", get(public::list_courses))
        .route("/api/student/courses/:id", get(public::get_course))
        .route("/api/student/quiz-packages/:id", get(public::get_quiz_package))
        .route(
            "/api/student/questions/package/:package_id",
            get(public::list_package_questions),
        )
        .route("/api/quiz/submit", post(public::submit_quiz))
        .route("/api/quiz/check-device", get(public::check_device))
        .route("/api/quiz/check-phone", get(public::check_phone))
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.public_rps),
            rps_middleware,
        ));

    let student_api = Router::new()
        .route("/api/student/quiz/start", post(student::start_quiz))
        .route("/api/student/quiz/answer", post(student::submit_answer))
        .route(
            "/api/student/quiz/complete/:attempt_id",
            post(student::complete_quiz),
        )
        .route("/api/student/attempts", get(student::list_attempts))
        .route("/api/student/attempts/:attempt_id", get(student::get_attempt))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin_api = Router::new()
        .route(
            "/api/admin/courses",
            get(admin::list_courses).post(admin::create_course),
        )
        .route(
            "/api/admin/courses/:id",
            get(admin::get_course)
                .put(admin::update_course)
                .delete(admin::delete_course),
        )
        .route("/api/admin/courses/:id/stats", get(admin::course_stats))
        .route(
            "/api/admin/quiz-packages",
            get(admin::list_quiz_packages).post(admin::create_quiz_package),
        )
        .route(
            "/api/admin/quiz-packages/:id",
            get(admin::get_quiz_package)
                .put(admin::update_quiz_package)
                .delete(admin::delete_quiz_package),
        )
        .route(
            "/api/admin/quiz-packages/:id/stats",
            get(admin::quiz_package_stats),
        )
        .route("/api/admin/questions", post(admin::create_question))
        .route(
            "/api/admin/questions/:id",
            get(admin::get_question)
                .put(admin::update_question)
                .delete(admin::delete_question),
        )
        .route("/api/admin/students", get(admin::list_students))
        .route("/api/admin/students/courses", get(admin::courses_overview))
        .route(
            "/api/admin/students/course/:course_id",
            get(admin::students_by_course),
        )
        .route(
            "/api/admin/students/:id",
            axum::routing::delete(admin::delete_student),
        )
        .route(
            "/api/admin/enrollments/course/:course_id",
            get(admin::list_enrollments),
        )
        .route(
            "/api/admin/enrollments/:id/status",
            put(admin::update_enrollment_status),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let cors = cors_layer(state.config.cors_allowed_origins.as_deref());

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(student_api)
        .merge(admin_api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
