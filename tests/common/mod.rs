#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use quiz_backend::config::{AdminSeed, Config};
use quiz_backend::repositories::Repositories;
use quiz_backend::{routes, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@quiz.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn spawn() -> TestApp {
    let state = AppState::new(Config::for_tests("test_secret_key"), Repositories::in_memory());
    state
        .auth_service
        .seed_admin(&AdminSeed {
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
            name: "Admin".into(),
        })
        .await
        .expect("seed admin");
    TestApp {
        router: routes::create_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/admin/login",
                None,
                Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn student_token(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/student/register",
                None,
                Some(json!({ "email": email, "password": "secret1", "name": "Student" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().expect("token").to_string()
    }

    /// Creates a course with one package holding two questions worth 4 and 6 points.
    /// Returns (course_id, package_id, [question ids]).
    pub async fn seed_quiz(&self, admin: &str, retry_count: i64) -> (i64, i64, Vec<i64>) {
        let (status, course) = self
            .send(
                "POST",
                "/api/admin/courses",
                Some(admin),
                Some(json!({ "title": "Geography", "retry_count": retry_count, "exam_time": 20 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", course);
        let course_id = course["id"].as_i64().expect("course id");

        let (status, package) = self
            .send(
                "POST",
                "/api/admin/quiz-packages",
                Some(admin),
                Some(json!({ "course_id": course_id, "title": "Capitals", "max_retake_count": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", package);
        let package_id = package["id"].as_i64().expect("package id");

        let mut questions = Vec::new();
        for (order, (text, answer, points)) in
            [("Capital of Japan?", "Tokyo", 4), ("Capital of France?", "Paris", 6)]
                .into_iter()
                .enumerate()
        {
            let (status, question) = self
                .send(
                    "POST",
                    "/api/admin/questions",
                    Some(admin),
                    Some(json!({
                        "quiz_package_id": package_id,
                        "question_text": text,
                        "question_type": "short_answer",
                        "correct_answer": answer,
                        "points": points,
                        "order_number": order + 1,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{}", question);
            questions.push(question["id"].as_i64().expect("question id"));
        }

        (course_id, package_id, questions)
    }
}
