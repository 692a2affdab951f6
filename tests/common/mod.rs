//! Shared harness: the full router over an in-memory store, plus seeding helpers.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use school_api::schema::TableDef;
use school_api::store::{Row, Store};
use school_api::{app, AppState, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState { store: store.clone() };
        TestApp {
            router: app(state),
            store,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        split(response).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("POST", uri, body).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("PUT", uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .request(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        split(response).await
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .request(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        split(response).await
    }

    /// POST and return the new id, failing the test on anything but 201.
    pub async fn create(&self, uri: &str, body: Value) -> i64 {
        let (status, json) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", uri, json);
        json["data"]["id"].as_i64().expect("created id")
    }

    pub async fn city(&self, name: &str) -> i64 {
        self.create("/api/cities", json!({ "name": name })).await
    }

    pub async fn department(&self, name: &str) -> i64 {
        self.create("/api/departments", json!({ "name": name })).await
    }

    pub async fn subject(&self, name: &str, grade_level: i32) -> i64 {
        self.create("/api/subjects", json!({ "name": name, "gradeLevel": grade_level }))
            .await
    }

    pub async fn student(&self, name: &str, city_id: i64, department_id: i64) -> i64 {
        self.create(
            "/api/students",
            json!({
                "name": name,
                "birthDate": "2009-03-14",
                "gender": "Female",
                "currentGradeLevel": 9,
                "cityId": city_id,
                "departmentId": department_id
            }),
        )
        .await
    }

    pub async fn teacher(&self, name: &str, city_id: i64) -> i64 {
        self.create(
            "/api/teachers",
            json!({
                "name": name,
                "birthDate": "1980-11-02",
                "gender": "Male",
                "cityId": city_id
            }),
        )
        .await
    }

    pub async fn mark(&self, student_id: i64, subject_id: i64, mark: i64) -> i64 {
        self.create(
            "/api/studentsubjects",
            json!({ "studentId": student_id, "subjectId": subject_id, "mark": mark }),
        )
        .await
    }

    pub async fn teaches(&self, teacher_id: i64, subject_id: i64) -> i64 {
        self.create(
            "/api/teachersubjects",
            json!({ "teacherId": teacher_id, "subjectId": subject_id }),
        )
        .await
    }

    /// Insert a named row with explicit audit timestamps, bypassing the API.
    pub async fn insert_named_at(&self, table: &'static TableDef, name: &str, created: DateTime<Utc>) -> i64 {
        let mut row = Row::new();
        row.insert("name", name.into());
        row.insert("created_date", created.into());
        row.insert("last_updated_date", created.into());
        row.insert("is_deleted", false.into());
        let stored = self.store.insert(table, row).await.expect("insert");
        stored["id"].as_i64().expect("id")
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
        .and_utc()
}

pub async fn response_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(&body);
        panic!("Failed to parse JSON: {text}");
    })
}

async fn split(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    (status, response_json(response).await)
}

/// `name` field of every item in a list envelope.
pub fn names(body: &Value) -> Vec<String> {
    items(body)
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

pub fn ids(body: &Value) -> Vec<i64> {
    items(body)
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

pub fn items(body: &Value) -> &Vec<Value> {
    body["data"].as_array().expect("data array")
}
