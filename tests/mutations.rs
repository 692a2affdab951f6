mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use common::{names, response_json, TestApp};
use serde_json::{json, Value};
use std::time::Duration;

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| panic!("not a timestamp: {}", value))
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = TestApp::new();
    let (status, created) = app.post("/api/cities", json!({ "name": "Bukhara" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &created["data"];
    assert_eq!(data["name"], "Bukhara");
    assert_eq!(data["isDeleted"], false);
    assert_eq!(timestamp(&data["createdDate"]), timestamp(&data["lastUpdatedDate"]));

    let id = data["id"].as_i64().unwrap();
    let (status, fetched) = app.get(&format!("/api/cities/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&fetched["data"], data);
}

#[tokio::test]
async fn student_renders_gender_name_and_age_fields() {
    let app = TestApp::new();
    let city = app.city("Samarkand").await;
    let dept = app.department("History").await;
    let (status, body) = app
        .post(
            "/api/students",
            json!({
                "name": "Dilnoza",
                "birthDate": "2008-06-01",
                "gender": 1,
                "currentGradeLevel": 10,
                "cityId": city,
                "departmentId": dept
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let data = &body["data"];
    assert_eq!(data["gender"], "Female");
    assert_eq!(data["birthDate"], "2008-06-01");
    assert_eq!(data["cityId"], city);
    assert_eq!(data["departmentId"], dept);
}

#[tokio::test]
async fn soft_delete_hides_from_default_filter_but_not_get() {
    let app = TestApp::new();
    let id = app.city("Andijan").await;
    let (status, body) = app.delete(&format!("/api/cities/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "City successfully deleted");

    let (_, live) = app.get("/api/cities?IsDeleted=false").await;
    assert!(names(&live).is_empty());
    let (status, fetched) = app.get(&format!("/api/cities/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["isDeleted"], true);
    assert!(
        timestamp(&fetched["data"]["lastUpdatedDate"]) >= timestamp(&fetched["data"]["createdDate"])
    );
}

#[tokio::test]
async fn student_with_bad_references_reports_every_problem() {
    let app = TestApp::new();
    let city = app.city("Termez").await;
    let (status, body) = app
        .post(
            "/api/students",
            json!({
                "name": "Aziz",
                "birthDate": "2009-01-01",
                "gender": "Other",
                "currentGradeLevel": 9,
                "cityId": city,
                "departmentId": 99
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["statusCode"], 422);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Department with ID 99 not found."), "{}", message);
    assert!(message.contains("Invalid gender value: Other"), "{}", message);
    assert!(!message.contains("City"), "{}", message);

    let (_, list) = app.get("/api/students").await;
    assert_eq!(list["totalCount"], 0);
}

#[tokio::test]
async fn name_checks_apply_to_trimmed_text() {
    let app = TestApp::new();
    let (status, body) = app.post("/api/departments", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Name is required.");

    let padded = format!("  {}  ", "a".repeat(100));
    let (status, body) = app.post("/api/departments", json!({ "name": padded })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["name"], "a".repeat(100));

    let long = "x".repeat(101);
    let (status, body) = app.post("/api/departments", json!({ "name": long })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Name must be at most 100 characters.");
}

#[tokio::test]
async fn mark_must_be_whole_and_in_range() {
    let app = TestApp::new();
    let city = app.city("Nukus").await;
    let dept = app.department("Physics").await;
    let student = app.student("Timur", city, dept).await;
    let subject = app.subject("Optics", 10).await;

    let (status, body) = app
        .post(
            "/api/studentsubjects",
            json!({ "studentId": student, "subjectId": subject, "mark": 101 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Mark must be between 0 and 100, got 101.");

    let (status, body) = app
        .post(
            "/api/studentsubjects",
            json!({ "studentId": student, "subjectId": subject, "mark": 85.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["mark"], 85);

    let (status, body) = app
        .post(
            "/api/studentsubjects",
            json!({ "studentId": student, "subjectId": subject, "mark": 85.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Mark must be a whole number, got 85.5.");

    let edge = app.mark(student, subject, 100).await;
    let (status, _) = app
        .put(
            &format!("/api/studentsubjects/{}", edge),
            json!({ "studentId": student, "subjectId": subject, "mark": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/teachers/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Teacher with ID 77 was not found.");

    let (status, _) = app.put("/api/cities/5", json!({ "name": "Ghost" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete("/api/subjects/5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn route_and_body_ids_must_agree() {
    let app = TestApp::new();
    let id = app.city("Gulistan").await;
    let (status, body) = app
        .put(&format!("/api/cities/{}", id), json!({ "id": id + 1, "name": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        format!("Route ID {} does not match body ID {}.", id, id + 1)
    );

    let (status, body) = app
        .put(&format!("/api/cities/{}", id), json!({ "id": id, "name": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Renamed");
}

#[tokio::test]
async fn update_moves_last_updated_forward() {
    let app = TestApp::new();
    let id = app.subject("Latin", 8).await;
    let (_, before) = app.get(&format!("/api/subjects/{}", id)).await;
    std::thread::sleep(Duration::from_millis(5));

    let (status, after) = app
        .put(&format!("/api/subjects/{}", id), json!({ "name": "Latin II", "gradeLevel": 9 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["data"]["gradeLevel"], 9);
    assert_eq!(after["data"]["createdDate"], before["data"]["createdDate"]);
    assert!(
        timestamp(&after["data"]["lastUpdatedDate"]) > timestamp(&before["data"]["lastUpdatedDate"])
    );
}

#[tokio::test]
async fn malformed_ids_and_bodies_are_bad_requests() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/cities/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);

    let (status, _) = app.post("/api/cities", json!(["not", "an", "object"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post("/api/subjects", json!({ "name": "Art" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Request::post("/api/cities")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn body_without_json_content_type_gets_error_envelope() {
    let app = TestApp::new();
    let response = app
        .request(
            Request::post("/api/cities")
                .body(Body::from(json!({ "name": "Khiva" }).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = response_json(response).await;
    assert_eq!(body["statusCode"], 415);
    assert!(body["message"].as_str().unwrap().contains("Content-Type"));

    let (_, list) = app.get("/api/cities").await;
    assert_eq!(list["totalCount"], 0);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let app = TestApp::new();
    let name = "y".repeat(school_api::MAX_BODY_BYTES + 1);
    let body = json!({ "name": name }).to_string();
    let response = app
        .request(
            Request::post("/api/cities")
                .header("content-type", "application/json")
                .header("content-length", body.len())
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = response_json(response).await;
    assert_eq!(json["statusCode"], 413);
    assert_eq!(json["error"], "Payload Too Large");

    let streamed = app
        .request(
            Request::post("/api/cities")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(streamed.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response_json(streamed).await["statusCode"], 413);
}

#[tokio::test]
async fn service_endpoints_respond() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"], "ok");

    let (_, body) = app.get("/version").await;
    assert_eq!(body["name"], "school-api");

    let (status, body) = app.get("/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["components"]["schemas"]["ErrorBody"].is_object());
}
