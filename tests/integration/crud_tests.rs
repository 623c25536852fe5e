//! Collection CRUD integration tests.
//!
//! Tests verify:
//! - List, fetch, create and update for every collection
//! - Field allow-lists on update
//! - Identifier validation and not-found handling
//! - Enrollment deletion
//! - JSON body rejections

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};

use course_cms::{Collection, RouterConfig};

use super::test_utils::TestApp;

const UNKNOWN_ID: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

// =============================================================================
// Service Routes
// =============================================================================

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new();
    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text().contains("running"));
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["store"], "memory");
    assert!(json["version"].is_string());
}

// =============================================================================
// List and Create
// =============================================================================

#[tokio::test]
async fn test_every_collection_starts_empty() {
    let app = TestApp::new();
    for collection in Collection::ALL {
        let response = app.get(&format!("/{}", collection.name())).await;
        assert_eq!(response.status, StatusCode::OK, "{}", collection);
        assert_eq!(response.json(), json!([]), "{}", collection);
    }
}

#[tokio::test]
async fn test_list_after_create_includes_document() {
    let app = TestApp::new();
    for collection in Collection::ALL {
        let body = json!({
            "title": format!("first in {}", collection.name()),
            "email": format!("{}@example.com", collection.name()),
        });
        let id = app.create(collection.name(), body).await;

        let list = app.get(&format!("/{}", collection.name())).await.json();
        let docs = list.as_array().unwrap();
        assert_eq!(docs.len(), 1, "{}", collection);
        assert_eq!(docs[0]["_id"], id);
    }
}

#[tokio::test]
async fn test_create_acknowledges_with_hex_id() {
    let app = TestApp::new();
    let response = app
        .post_json("/all-courses", json!({"title": "Rust 101", "price": 49}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["acknowledged"], true);
    let id = json["insertedId"].as_str().unwrap();
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_list_preserves_insertion_order() {
    let app = TestApp::new();
    for title in ["a", "b", "c"] {
        app.create("all-ebooks", json!({"title": title})).await;
    }

    let list = app.get("/all-ebooks").await.json();
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_create_ignores_client_id() {
    let app = TestApp::new();
    let id = app
        .create(
            "live-courses",
            json!({"_id": UNKNOWN_ID, "title": "Live Rust"}),
        )
        .await;
    assert_ne!(id, UNKNOWN_ID);

    let response = app.get(&format!("/live-courses/{}", UNKNOWN_ID)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_rejects_non_object_body() {
    let app = TestApp::new();
    let response = app.post_json("/all-courses", json!(["not", "an", "object"])).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "invalid_body");
    assert_eq!(app.store.count(Collection::Courses).await, 0);
}

#[tokio::test]
async fn test_live_enroll_create_returns_created_envelope() {
    let app = TestApp::new();
    let response = app
        .post_json(
            "/live-enroll",
            json!({"email": "a@example.com", "courseId": "c1", "status": "pending"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let json = response.json();
    assert!(json["message"].is_string());
    assert_eq!(json["result"]["acknowledged"], true);
    assert!(json["result"]["insertedId"].is_string());
}

// =============================================================================
// Fetch by Id
// =============================================================================

#[tokio::test]
async fn test_get_fresh_document() {
    let app = TestApp::new();
    let id = app
        .create(
            "all-courses",
            json!({"title": "Rust 101", "price": 49, "tags": ["systems"], "discount": 0.25}),
        )
        .await;

    let response = app.get(&format!("/all-courses/{}", id)).await;
    assert_eq!(response.status, StatusCode::OK);

    let doc = response.json();
    assert_eq!(doc["_id"], id);
    assert_eq!(doc["title"], "Rust 101");
    assert_eq!(doc["price"], 49);
    assert_eq!(doc["tags"], json!(["systems"]));
    assert_eq!(doc["discount"], 0.25);
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let app = TestApp::new();
    let response = app.get(&format!("/all-ebooks/{}", UNKNOWN_ID)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let json = response.json();
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_invalid_ids_are_rejected_on_every_id_route() {
    let app = TestApp::new();

    for collection in Collection::ALL {
        let uri = format!("/{}/not-an-id", collection.name());
        let response = app.get(&uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "GET {}", uri);
        assert_eq!(response.json()["error"], "invalid_id");

        let response = app.put_json(&uri, json!({"title": "x"})).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "PUT {}", uri);
    }

    let response = app.delete("/live-enroll/123").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    for segment in ["enrolled", "live_enroll"] {
        let uri = format!("/all-users/zzz/{}", segment);
        assert_eq!(app.get(&uri).await.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            app.put_json(&uri, json!({"courseId": "c"})).await.status,
            StatusCode::BAD_REQUEST
        );
    }
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_applies_only_allowed_fields() {
    let app = TestApp::new();
    let id = app
        .create("all-courses", json!({"title": "Old", "price": 10, "secret": "keep"}))
        .await;

    let response = app
        .put_json(
            &format!("/all-courses/{}", id),
            json!({"title": "New", "secret": "overwrite", "injected": true}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["result"]["matchedCount"], 1);
    assert_eq!(json["result"]["modifiedCount"], 1);

    let doc = app.get(&format!("/all-courses/{}", id)).await.json();
    assert_eq!(doc["title"], "New");
    assert_eq!(doc["price"], 10);
    assert_eq!(doc["secret"], "keep");
    assert_eq!(doc.get("injected"), None);
}

#[tokio::test]
async fn test_live_course_update_accepts_offer_and_deadline() {
    let app = TestApp::new();
    let id = app.create("live-courses", json!({"title": "Live"})).await;

    let response = app
        .put_json(
            &format!("/live-courses/{}", id),
            json!({"offer": "early bird", "deadline": "2026-12-01"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let doc = app.get(&format!("/live-courses/{}", id)).await.json();
    assert_eq!(doc["offer"], "early bird");
    assert_eq!(doc["deadline"], "2026-12-01");
}

#[tokio::test]
async fn test_update_with_same_values_matches_without_modifying() {
    let app = TestApp::new();
    let id = app.create("all-ebooks", json!({"title": "Same"})).await;

    let response = app
        .put_json(&format!("/all-ebooks/{}", id), json!({"title": "Same"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["result"]["modifiedCount"], 0);
}

#[tokio::test]
async fn test_update_without_allowed_fields_is_rejected() {
    let app = TestApp::new();
    let id = app.create("home-banner", json!({"title": "Hero"})).await;

    let response = app
        .put_json(&format!("/home-banner/{}", id), json!({"unknown": 1}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "invalid_body");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let app = TestApp::new();
    let response = app
        .put_json(&format!("/class-records/{}", UNKNOWN_ID), json!({"title": "x"}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.count(Collection::ClassRecords).await, 0);
}

#[tokio::test]
async fn test_enrollment_status_update() {
    let app = TestApp::new();
    let id = app
        .create("live-enroll", json!({"email": "a@example.com", "status": "pending"}))
        .await;

    let response = app
        .put_json(
            &format!("/live-enroll/{}", id),
            json!({"status": "approved", "email": "b@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let doc = app.get(&format!("/live-enroll/{}", id)).await.json();
    assert_eq!(doc["status"], "approved");
    assert_eq!(doc["email"], "a@example.com");
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn test_delete_enrollment() {
    let app = TestApp::new();
    let keep = app.create("live-enroll", json!({"email": "keep@example.com"})).await;
    let gone = app.create("live-enroll", json!({"email": "gone@example.com"})).await;

    let response = app.delete(&format!("/live-enroll/{}", gone)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["message"].is_string());

    assert_eq!(
        app.get(&format!("/live-enroll/{}", gone)).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.get(&format!("/live-enroll/{}", keep)).await.status,
        StatusCode::OK
    );

    let again = app.delete(&format!("/live-enroll/{}", gone)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.count(Collection::LiveEnrollments).await, 1);
}

#[tokio::test]
async fn test_other_collections_have_no_delete_route() {
    let app = TestApp::new();
    let id = app.create("all-courses", json!({"title": "Permanent"})).await;

    let response = app.delete(&format!("/all-courses/{}", id)).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.store.count(Collection::Courses).await, 1);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/all-podcasts").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), Value::Null);
}

// =============================================================================
// Request Bodies
// =============================================================================

fn raw_post(uri: &str, content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut request = Request::post(uri);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    request.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let app = TestApp::new();
    let response = app
        .send(raw_post("/all-courses", Some("application/json"), "{not json"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(response.json()["error"], "invalid_body");
    assert_eq!(app.get("/all-courses").await.json(), json!([]));
}

#[tokio::test]
async fn test_missing_content_type_is_json_error() {
    let app = TestApp::new();
    let response = app
        .send(raw_post("/all-courses", None, r#"{"title": "Rust"}"#))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "invalid_body");

    let id = app.create("all-courses", json!({"title": "Rust"})).await;
    let update = Request::put(format!("/all-courses/{}", id))
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"title": "Go"}"#))
        .unwrap();
    let response = app.send(update).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "invalid_body");
}

#[tokio::test]
async fn test_body_over_json_limit_is_payload_too_large() {
    let app = TestApp::with_config(RouterConfig::new().with_max_json_body(32));
    let response = app
        .send(raw_post(
            "/all-courses",
            Some("application/json"),
            r#"{"title": "A course title well past the body limit"}"#,
        ))
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json()["error"], "payload_too_large");
    assert_eq!(app.get("/all-courses").await.json(), json!([]));
}
