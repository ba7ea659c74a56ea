//! End-to-end tests for the execution REST API over a real TCP listener.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::StatusCode;
use serde_json::{Value, json};

use tour_tracker::api;
use tour_tracker::api::auth::{Claims, TokenVerifier};
use tour_tracker::app_state::AppState;
use tour_tracker::domain::{KeyPoint, KeyPointId, Tour, TourId, TourStatus};
use tour_tracker::persistence::InMemoryRepository;
use tour_tracker::service::ExecutionService;

const SECRET: &str = "integration-secret";

struct TestApp {
    base: String,
    client: reqwest::Client,
    published: TourId,
    draft: TourId,
    k1: KeyPointId,
    k2: KeyPointId,
}

async fn spawn_app() -> TestApp {
    let repository = InMemoryRepository::new();
    let published = TourId::new();
    let draft = TourId::new();
    for (id, status) in [(published, TourStatus::Published), (draft, TourStatus::Draft)] {
        repository
            .insert_tour(Tour {
                id,
                author_id: "author-1".to_string(),
                name: "Old town".to_string(),
                status,
                created_at: Utc::now(),
            })
            .await;
    }

    let k1 = KeyPointId::new();
    let k2 = KeyPointId::new();
    for (id, order, latitude) in [(k1, 0, 45.0), (k2, 1, 45.001)] {
        let inserted = repository
            .insert_key_point(KeyPoint {
                id,
                tour_id: published,
                name: format!("point {order}"),
                latitude,
                longitude: 19.0,
                order,
                created_at: Utc::now(),
            })
            .await;
        let Ok(()) = inserted else {
            panic!("key point should insert");
        };
    }

    let state = AppState {
        execution_service: Arc::new(ExecutionService::new(
            Arc::new(repository),
            Duration::from_secs(5),
        )),
        token_verifier: Arc::new(TokenVerifier::new(SECRET)),
    };

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, api::build_app(state)).await;
    });

    TestApp {
        base: base_url(addr),
        client: reqwest::Client::new(),
        published,
        draft,
        k1,
        k2,
    }
}

fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

fn token(uid: &str) -> String {
    let claims = Claims {
        uid: uid.to_string(),
        username: uid.to_string(),
        roles: vec!["tourist".to_string()],
        exp: u64::try_from(Utc::now().timestamp() + 3600).unwrap_or_default(),
    };
    let Ok(token) = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    ) else {
        panic!("token encoding failed");
    };
    token
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base)
    }

    async fn post(&self, uid: &str, path: &str, body: Value) -> reqwest::Response {
        let Ok(resp) = self
            .client
            .post(self.url(path))
            .bearer_auth(token(uid))
            .json(&body)
            .send()
            .await
        else {
            panic!("request to {path} failed");
        };
        resp
    }

    async fn put(&self, uid: &str, path: &str, body: Value) -> reqwest::Response {
        let Ok(resp) = self
            .client
            .put(self.url(path))
            .bearer_auth(token(uid))
            .json(&body)
            .send()
            .await
        else {
            panic!("request to {path} failed");
        };
        resp
    }

    async fn get(&self, uid: &str, path: &str) -> reqwest::Response {
        let Ok(resp) = self
            .client
            .get(self.url(path))
            .bearer_auth(token(uid))
            .send()
            .await
        else {
            panic!("request to {path} failed");
        };
        resp
    }

    async fn start(&self, uid: &str) -> String {
        let resp = self
            .post(uid, "/executions", json!({ "tourId": self.published.to_string() }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        let Some(id) = body["id"].as_str() else {
            panic!("execution has no id: {body}");
        };
        id.to_string()
    }
}

async fn json_body(resp: reqwest::Response) -> Value {
    let Ok(body) = resp.json::<Value>().await else {
        panic!("response is not JSON");
    };
    body
}

async fn error_code(resp: reqwest::Response) -> u64 {
    let body = json_body(resp).await;
    let Some(code) = body["error"]["code"].as_u64() else {
        panic!("no error code in {body}");
    };
    code
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let Ok(resp) = app.client.get(format!("{}/health", app.base)).send().await else {
        panic!("health request failed");
    };
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "healthy");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = spawn_app().await;
    let Ok(resp) = app
        .client
        .post(app.url("/executions"))
        .json(&json!({ "tourId": app.published.to_string() }))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(resp).await, 1401);
}

#[tokio::test]
async fn token_with_wrong_secret_is_unauthorized() {
    let app = spawn_app().await;
    let claims = Claims {
        uid: "u-1".to_string(),
        username: String::new(),
        roles: Vec::new(),
        exp: u64::try_from(Utc::now().timestamp() + 3600).unwrap_or_default(),
    };
    let Ok(forged) = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"someone-elses-secret"),
    ) else {
        panic!("token encoding failed");
    };
    let Ok(resp) = app
        .client
        .get(app.url(&format!("/executions/{}/active", app.published)))
        .bearer_auth(forged)
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_rejects_malformed_tour_id() {
    let app = spawn_app().await;
    let resp = app
        .post("u-1", "/executions", json!({ "tourId": "not-a-uuid" }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], 1001);
    assert_eq!(body["error"]["message"], "invalid request: invalid tourId: not-a-uuid");
}

#[tokio::test]
async fn create_rejects_malformed_body() {
    let app = spawn_app().await;
    let resp = app.post("u-1", "/executions", json!({ "tour": 1 })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1001);
}

#[tokio::test]
async fn create_on_unknown_tour_is_not_found() {
    let app = spawn_app().await;
    let resp = app
        .post("u-1", "/executions", json!({ "tourId": TourId::new().to_string() }))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(resp).await, 2001);
}

#[tokio::test]
async fn create_on_draft_tour_is_rejected() {
    let app = spawn_app().await;
    let resp = app
        .post("u-1", "/executions", json!({ "tourId": app.draft.to_string() }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1003);
}

#[tokio::test]
async fn second_create_returns_existing_execution() {
    let app = spawn_app().await;
    let first = app.start("u-1").await;

    let resp = app
        .post("u-1", "/executions", json!({ "tourId": app.published.to_string() }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["id"], first.as_str());
}

#[tokio::test]
async fn executions_are_private_to_their_tourist() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app.get("u-2", &format!("/executions/{exec}")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .post(
            "u-2",
            &format!("/executions/{exec}/location"),
            json!({ "latitude": 45.0, "longitude": 19.0 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn location_far_from_key_points_is_rejected() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app
        .post(
            "u-1",
            &format!("/executions/{exec}/location"),
            json!({ "latitude": 44.991, "longitude": 19.0 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1002);
}

#[tokio::test]
async fn location_out_of_range_is_invalid_input() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app
        .post(
            "u-1",
            &format!("/executions/{exec}/location"),
            json!({ "latitude": 95.0, "longitude": 19.0 }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1001);
}

#[tokio::test]
async fn complete_before_any_location_is_rejected() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app
        .post(
            "u-1",
            &format!("/executions/{exec}/complete"),
            json!({ "keyPointId": app.k1.to_string() }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1002);
}

#[tokio::test]
async fn complete_with_malformed_key_point_is_invalid_input() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app
        .post(
            "u-1",
            &format!("/executions/{exec}/complete"),
            json!({ "keyPointId": "kp" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1001);
}

#[tokio::test]
async fn update_to_unknown_status_is_invalid_input() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app
        .put(
            "u-1",
            &format!("/executions/{exec}"),
            json!({ "status": "paused" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, 1001);
}

#[tokio::test]
async fn full_walk_completes_tour() {
    let app = spawn_app().await;
    let exec = app.start("u-1").await;

    let resp = app.get("u-1", &format!("/executions/{}/active", app.published)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "active");

    for (latitude, key_point) in [(45.0, app.k1), (45.001, app.k2)] {
        let resp = app
            .post(
                "u-1",
                &format!("/executions/{exec}/location"),
                json!({ "latitude": latitude, "longitude": 19.0 }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .post(
                "u-1",
                &format!("/executions/{exec}/complete"),
                json!({ "keyPointId": key_point.to_string() }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    let resp = app
        .put(
            "u-1",
            &format!("/executions/{exec}"),
            json!({
                "status": "completed",
                "completedPoints": [app.k1.to_string(), app.k2.to_string()],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.get("u-1", &format!("/executions/{exec}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "completed");
    assert!(body["finishedAt"].is_string());
    assert_eq!(body["locations"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["completedPoints"].as_array().map(Vec::len), Some(2));

    let resp = app.get("u-1", &format!("/executions/{}/active", app.published)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
