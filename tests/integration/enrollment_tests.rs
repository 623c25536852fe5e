//! Embedded enrollment list tests for `/all-users/{id}/enrolled` and
//! `/all-users/{id}/live_enroll`.

use axum::http::StatusCode;
use serde_json::json;

use course_cms::Collection;

use super::test_utils::TestApp;

const UNKNOWN_ID: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

async fn new_user(app: &TestApp) -> String {
    app.create("all-users", json!({"email": "learner@example.com"}))
        .await
}

#[tokio::test]
async fn test_fresh_user_has_empty_lists() {
    let app = TestApp::new();
    let id = new_user(&app).await;

    for segment in ["enrolled", "live_enroll"] {
        let response = app.get(&format!("/all-users/{}/{}", id, segment)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!([]));
    }
}

#[tokio::test]
async fn test_appends_are_kept_in_order() {
    let app = TestApp::new();
    let id = new_user(&app).await;
    let uri = format!("/all-users/{}/enrolled", id);

    let first = json!({"courseId": "rust-101", "paid": 49});
    let second = json!({"courseId": "tokio-201", "paid": 0});

    let response = app.put_json(&uri, first.clone()).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["result"]["modifiedCount"], 1);
    app.put_json(&uri, second.clone()).await;

    let list = app.get(&uri).await.json();
    assert_eq!(list, json!([first, second]));
}

#[tokio::test]
async fn test_lists_are_independent() {
    let app = TestApp::new();
    let id = new_user(&app).await;

    app.put_json(
        &format!("/all-users/{}/live_enroll", id),
        json!({"courseId": "live-1"}),
    )
    .await;

    let recorded = app.get(&format!("/all-users/{}/enrolled", id)).await.json();
    let live = app.get(&format!("/all-users/{}/live_enroll", id)).await.json();
    assert_eq!(recorded, json!([]));
    assert_eq!(live, json!([{"courseId": "live-1"}]));

    let user = app.get(&format!("/all-users/{}", id)).await.json();
    assert_eq!(user["live_enroll"], json!([{"courseId": "live-1"}]));
    assert_eq!(user.get("Enrolled"), None);
}

#[tokio::test]
async fn test_append_accepts_any_json_value() {
    let app = TestApp::new();
    let id = new_user(&app).await;
    let uri = format!("/all-users/{}/enrolled", id);

    app.put_json(&uri, json!("rust-101")).await;
    app.put_json(&uri, json!(7)).await;

    assert_eq!(app.get(&uri).await.json(), json!(["rust-101", 7]));
}

#[tokio::test]
async fn test_append_to_unknown_user_creates_nothing() {
    let app = TestApp::new();
    let response = app
        .put_json(
            &format!("/all-users/{}/enrolled", UNKNOWN_ID),
            json!({"courseId": "rust-101"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.count(Collection::Users).await, 0);
}

#[tokio::test]
async fn test_read_unknown_user_is_not_found() {
    let app = TestApp::new();
    let response = app
        .get(&format!("/all-users/{}/live_enroll", UNKNOWN_ID))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "not_found");
}
