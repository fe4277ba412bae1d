//! User and Event Route Tests

use crate::harness::{data, error, TestApp};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn create_then_fetch_user() {
    let app = TestApp::new();
    let created = data(app.post("/api/users", json!({"id": "u1", "name": " Ada "})).await);
    assert_eq!(created["name"], "Ada");
    assert_eq!(created["preferences"]["theme"], "dark");

    let fetched = data(app.get("/api/users/u1").await);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_without_body_fields_uses_defaults() {
    let app = TestApp::new();
    let created = data(app.post("/api/users", json!({})).await);
    assert_eq!(created["name"], "New User");
    let id = created["id"].as_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn missing_user_is_404() {
    let app = TestApp::new();
    let msg = error(app.get("/api/users/nobody").await, StatusCode::NOT_FOUND);
    assert_eq!(msg, "User not found");
    error(
        app.patch("/api/users/nobody", json!({"name": "x"})).await,
        StatusCode::NOT_FOUND,
    );
    error(
        app.post("/api/users/nobody/events", json!({"title": "t"})).await,
        StatusCode::NOT_FOUND,
    );
}

#[tokio::test]
async fn list_users_with_cursor() {
    let app = TestApp::new();
    for id in ["a", "b", "c"] {
        data(app.post("/api/users", json!({"id": id, "name": id})).await);
    }

    let first = data(app.get("/api/users?limit=2").await);
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    let next = first["next"].as_str().unwrap().to_string();
    assert_eq!(next, "i:b");

    let second = data(app.get(&format!("/api/users?limit=2&cursor={}", next)).await);
    assert_eq!(second["items"][0]["id"], "c");
    assert!(second["next"].is_null());
}

#[tokio::test]
async fn patch_merges_fields() {
    let app = TestApp::new();
    data(app.post("/api/users", json!({"id": "u1", "name": "Ada"})).await);
    let patched = data(
        app.patch(
            "/api/users/u1",
            json!({"preferences": {"theme": "light", "notificationsEnabled": false}}),
        )
        .await,
    );
    assert_eq!(patched["name"], "Ada");
    assert_eq!(patched["preferences"]["theme"], "light");
}

#[tokio::test]
async fn patch_with_wrong_field_type_is_rejected() {
    let app = TestApp::new();
    data(app.post("/api/users", json!({"id": "u1"})).await);
    let (status, body) = app.patch("/api/users/u1", json!({"events": "nope"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(data(app.get("/api/users/u1").await)["events"], json!([]));
}

#[tokio::test]
async fn delete_and_delete_many() {
    let app = TestApp::new();
    for id in ["a", "b", "c"] {
        data(app.post("/api/users", json!({"id": id})).await);
    }

    assert_eq!(data(app.delete("/api/users/a").await), json!({"deleted": true}));
    assert_eq!(data(app.delete("/api/users/a").await), json!({"deleted": false}));

    let result = data(
        app.post("/api/users/deleteMany", json!({"ids": ["b", "c", "zz"]}))
            .await,
    );
    assert_eq!(result, json!({"deletedCount": 2}));
    assert_eq!(data(app.get("/api/users").await)["items"], json!([]));

    error(
        app.post("/api/users/deleteMany", json!({})).await,
        StatusCode::BAD_REQUEST,
    );
}

#[tokio::test]
async fn event_lifecycle() {
    let app = TestApp::new();
    data(app.post("/api/users", json!({"id": "u1"})).await);

    let msg = error(
        app.post("/api/users/u1/events", json!({"title": ""})).await,
        StatusCode::BAD_REQUEST,
    );
    assert_eq!(msg, "Title required");

    let user = data(
        app.post(
            "/api/users/u1/events",
            json!({"id": "client-id", "title": "Standup", "type": "meeting", "startDate": "2024-05-01T09:00:00Z"}),
        )
        .await,
    );
    let event = &user["events"][0];
    let event_id = event["id"].as_str().unwrap().to_string();
    assert_ne!(event_id, "client-id");
    assert_eq!(event["type"], "meeting");

    let user = data(
        app.patch(
            &format!("/api/users/u1/events/{}", event_id),
            json!({"title": "Retro"}),
        )
        .await,
    );
    assert_eq!(user["events"][0]["title"], "Retro");
    assert_eq!(user["events"][0]["id"], event_id);

    error(
        app.patch("/api/users/u1/events/missing", json!({"title": "x"}))
            .await,
        StatusCode::NOT_FOUND,
    );

    let user = data(
        app.send(Method::DELETE, &format!("/api/users/u1/events/{}", event_id), None)
            .await,
    );
    assert_eq!(user["events"], json!([]));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::PATCH, "/api/users/u1", Some(json!("just a string")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_is_ok() {
    let app = TestApp::new();
    assert_eq!(data(app.get("/health").await)["status"], "ok");
}
