mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn package_and_course_statistics() {
    let app = common::spawn().await;
    let admin = app.admin_token().await;
    let (course_id, package_id, _) = app.seed_quiz(&admin, 3).await;

    // Six passing and four failing guest results, each from its own device.
    for i in 0..10 {
        let score = if i < 6 { 7 } else { 3 };
        let (status, body) = app
            .send(
                "POST",
                "/api/quiz/submit",
                None,
                Some(json!({
                    "student_name": format!("Taker {}", i),
                    "course_id": course_id,
                    "quiz_package_id": package_id,
                    "device_id": format!("device-{}", i),
                    "score": score,
                    "total_points": 10,
                    "time_taken": 60,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, stats) = app
        .send(
            "GET",
            &format!("/api/admin/quiz-packages/{}/stats", package_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_attempts"], 10);
    assert_eq!(stats["pass_rate"], 60);
    assert_eq!(stats["completion_rate"], 100);
    assert_eq!(stats["average_score"], 5);
    assert_eq!(stats["score_distribution"]["average"], 6);
    assert_eq!(stats["score_distribution"]["poor"], 4);
    assert_eq!(stats["recent_attempts"].as_array().unwrap().len(), 10);

    let (status, course) = app
        .send(
            "GET",
            &format!("/api/admin/courses/{}/stats", course_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(course["total_attempts"], 10);
    assert_eq!(course["unique_students"], 10);
    assert_eq!(course["students"].as_array().unwrap().len(), 10);

    let (status, overview) = app
        .send("GET", "/api/admin/students/courses", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["total_students"], 10);
    assert_eq!(overview["courses"][0]["total_attempt_count"], 10);
    assert_eq!(overview["courses"][0]["attempted_count"], 10);
}

#[tokio::test]
async fn students_listing_and_deletion() {
    let app = common::spawn().await;
    let admin = app.admin_token().await;
    let (course_id, package_id, _) = app.seed_quiz(&admin, 3).await;
    app.student_token("zoe@example.com").await;

    let (status, _) = app
        .send(
            "POST",
            "/api/quiz/submit",
            None,
            Some(json!({
                "student_name": "Zed",
                "course_id": course_id,
                "quiz_package_id": package_id,
                "score": 8,
                "total_points": 10,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, students) = app
        .send("GET", "/api/admin/students", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let students = students.as_array().unwrap();
    assert_eq!(students.len(), 2);
    let zed = students
        .iter()
        .find(|s| s["name"] == "Zed")
        .expect("guest listed");
    assert_eq!(zed["attempt_count"], 1);

    let (status, by_course) = app
        .send(
            "GET",
            &format!("/api/admin/students/course/{}", course_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_course[0]["best_score"], 8);
    assert_eq!(by_course[0]["best_percentage"], 80.0);

    let zed_id = zed["id"].as_i64().unwrap();
    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/admin/students/{}", zed_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, students) = app
        .send("GET", "/api/admin/students", Some(&admin), None)
        .await;
    assert_eq!(students.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/admin/students/{}", zed_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_crud_round() {
    let app = common::spawn().await;
    let admin = app.admin_token().await;
    let (course_id, package_id, questions) = app.seed_quiz(&admin, 3).await;

    let (status, updated) = app
        .send(
            "PUT",
            &format!("/api/admin/courses/{}", course_id),
            Some(&admin),
            Some(json!({ "title": "World Geography" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "World Geography");
    assert_eq!(updated["retry_count"], 3);

    let (status, _) = app
        .send(
            "POST",
            "/api/admin/quiz-packages",
            Some(&admin),
            Some(json!({ "course_id": 9999, "title": "Orphan" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            "DELETE",
            &format!("/api/admin/questions/{}", questions[1]),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, package) = app
        .send(
            "GET",
            &format!("/api/student/quiz-packages/{}", package_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(package["questions"].as_array().unwrap().len(), 1);

    let (status, courses) = app.send("GET", "/api/student/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(courses[0]["quiz_packages"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(
            "GET",
            "/api/admin/quiz-packages",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_open() {
    let app = common::spawn().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
