mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn authenticated_attempt_end_to_end() {
    let app = common::spawn().await;
    let admin = app.admin_token().await;
    let (course_id, package_id, questions) = app.seed_quiz(&admin, 2).await;
    let student = app.student_token("mia@example.com").await;

    let (status, started) = app
        .send(
            "POST",
            "/api/student/quiz/start",
            Some(&student),
            Some(json!({ "course_id": course_id, "quiz_package_id": package_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", started);
    assert_eq!(started["attempt"]["attempt_count"], 1);
    assert_eq!(started["attempt"]["total_points"], 10);
    assert_eq!(started["attempt"]["status"], "in_progress");
    assert_eq!(started["exam_time"], 20);
    let listed = started["questions"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|q| q.get("correct_answer").is_none()));
    let attempt_id = started["attempt"]["id"].as_i64().unwrap();

    let (status, answered) = app
        .send(
            "POST",
            "/api/student/quiz/answer",
            Some(&student),
            Some(json!({
                "attempt_id": attempt_id,
                "question_id": questions[0],
                "student_answer": "  tokyo ",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", answered);
    assert_eq!(answered["is_correct"], true);
    assert_eq!(answered["points_earned"], 4);

    // Same answer again overwrites rather than duplicating.
    app.send(
        "POST",
        "/api/student/quiz/answer",
        Some(&student),
        Some(json!({
            "attempt_id": attempt_id,
            "question_id": questions[0],
            "student_answer": "TOKYO",
        })),
    )
    .await;
    app.send(
        "POST",
        "/api/student/quiz/answer",
        Some(&student),
        Some(json!({
            "attempt_id": attempt_id,
            "question_id": questions[1],
            "student_answer": "Lyon",
        })),
    )
    .await;

    let (status, done) = app
        .send(
            "POST",
            &format!("/api/student/quiz/complete/{}", attempt_id),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", done);
    assert_eq!(done["score"], 4);
    assert_eq!(done["total_points"], 10);
    assert_eq!(done["percentage"], 40.0);
    assert_eq!(done["attempt"]["status"], "completed");

    let (status, detail) = app
        .send(
            "GET",
            &format!("/api/student/attempts/{}", attempt_id),
            Some(&student),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["answers"].as_array().unwrap().len(), 2);

    // Answers after completion are refused.
    let (status, _) = app
        .send(
            "POST",
            "/api/student/quiz/answer",
            Some(&student),
            Some(json!({
                "attempt_id": attempt_id,
                "question_id": questions[1],
                "student_answer": "Paris",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn retry_count_caps_attempts() {
    let app = common::spawn().await;
    let admin = app.admin_token().await;
    let (course_id, package_id, _) = app.seed_quiz(&admin, 2).await;
    let student = app.student_token("leo@example.com").await;
    let body = json!({ "course_id": course_id, "quiz_package_id": package_id });

    for expected in 1..=2 {
        let (status, started) = app
            .send("POST", "/api/student/quiz/start", Some(&student), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(started["attempt"]["attempt_count"], expected);
    }

    let (status, denied) = app
        .send("POST", "/api/student/quiz/start", Some(&student), Some(body))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(denied["error"], "retake_limit_reached");

    let (status, attempts) = app
        .send("GET", "/api/student/attempts", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempts.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn protected_routes_check_tokens_and_roles() {
    let app = common::spawn().await;
    let student = app.student_token("ivy@example.com").await;

    let (status, body) = app.send("GET", "/api/student/attempts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, _) = app
        .send("GET", "/api/student/attempts", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send("GET", "/api/admin/students", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "admin_only");

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/student/login",
            None,
            Some(json!({ "email": common::ADMIN_EMAIL, "password": common::ADMIN_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_request_bodies_are_rejected() {
    let app = common::spawn().await;
    let (status, _) = app
        .send(
            "POST",
            "/api/auth/student/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "secret1", "name": "X" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "POST",
            "/api/auth/student/register",
            None,
            Some(json!({ "email": "ok@example.com", "password": "123", "name": "X" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
