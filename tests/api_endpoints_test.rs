//! HTTP surface tests
//!
//! Drives the axum router end-to-end: bearer-session auth, status
//! mapping for every synchronous-path error, and the exact response
//! shapes the clients depend on.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use sophrosyne_core::api::{ApiServer, AppState, HmacSessions};
use sophrosyne_core::feedback::{FeedbackService, GhostCardDispatcher};
use sophrosyne_core::learning::{LearningOrchestrator, SkillbookAdapter, SkillbookCurator};
use sophrosyne_core::storage::sqlite::SqliteStore;
use sophrosyne_core::storage::RecordStore;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &[u8] = b"integration-test-secret";

struct HttpHarness {
    router: axum::Router,
    store: Arc<SqliteStore>,
    sessions: HmacSessions,
}

async fn http_harness() -> HttpHarness {
    let store = memory_store().await;
    let telemetry = RecordingTelemetry::default();
    let reflection = StubReflection::new(ReflectionBehavior::Nothing);

    let curator = Arc::new(SkillbookCurator::new(SkillbookAdapter::new(
        store.clone(),
        8000,
    )));
    let orchestrator = LearningOrchestrator::new(
        Arc::new(reflection),
        curator,
        Arc::new(telemetry.clone()),
        store.clone(),
    );
    let (dispatcher, _worker) = orchestrator.spawn();

    let ghost_cards = Arc::new(GhostCardDispatcher::new(store.clone()));
    let feedback = Arc::new(FeedbackService::new(
        store.clone(),
        Arc::new(telemetry),
        ghost_cards,
        dispatcher,
    ));

    let state = AppState::new(Arc::new(HmacSessions::new(SECRET.to_vec())), feedback);

    HttpHarness {
        router: ApiServer::build_router(state),
        store,
        sessions: HmacSessions::new(SECRET.to_vec()),
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_session_is_401() {
    let h = http_harness().await;

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/feedback",
            None,
            r#"{"outcome":"accepted"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn test_forged_session_is_401() {
    let h = http_harness().await;
    let forged = HmacSessions::new(b"wrong-secret".to_vec()).token_for("user-1");

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/feedback",
            Some(&forged),
            r#"{"outcome":"accepted"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_interaction_is_404() {
    let h = http_harness().await;
    let token = h.sessions.token_for("user-1");

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-missing/feedback",
            Some(&token),
            r#"{"outcome":"wait"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_interaction_is_403() {
    let h = http_harness().await;
    h.store
        .insert_interaction(&pending_interaction("int-1", "other-user"))
        .await
        .unwrap();
    let token = h.sessions.token_for("user-1");

    let response = h
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/feedback",
            Some(&token),
            r#"{"outcome":"accepted"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/wizard",
            Some(&token),
            r#"{"responses":[{"step":1,"question":"q","answer":"a"}],"outcome":"accepted"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_out_of_vocabulary_outcome_is_400() {
    let h = http_harness().await;
    h.store
        .insert_interaction(&pending_interaction("int-1", "user-1"))
        .await
        .unwrap();
    let token = h.sessions.token_for("user-1");

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/feedback",
            Some(&token),
            r#"{"outcome":"maybe_later"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_feedback_resubmission_shapes() {
    let h = http_harness().await;
    h.store
        .insert_interaction(&pending_interaction("int-1", "user-1"))
        .await
        .unwrap();
    let token = h.sessions.token_for("user-1");

    let response = h
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/feedback",
            Some(&token),
            r#"{"outcome":"override"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["feedbackId"], "int-1");
    assert!(body.get("updated").is_none());

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/feedback",
            Some(&token),
            r#"{"outcome":"accepted"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["updated"], true);
}

#[tokio::test]
async fn test_wizard_replay_is_409_with_exact_body() {
    let h = http_harness().await;
    h.store
        .insert_interaction(&pending_interaction("int-1", "user-1"))
        .await
        .unwrap();
    let token = h.sessions.token_for("user-1");
    let body = r#"{"responses":[{"step":1,"question":"q","answer":"a"}],"outcome":"accepted"}"#;

    let response = h
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/wizard",
            Some(&token),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = h
        .router
        .oneshot(request(
            "POST",
            "/api/interactions/int-1/wizard",
            Some(&token),
            body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "Interaction already has an outcome"
    );
}

#[tokio::test]
async fn test_satisfaction_patch_shape() {
    let h = http_harness().await;
    h.store
        .insert_interaction(&pending_interaction("int-1", "user-1"))
        .await
        .unwrap();
    h.store
        .insert_ghost_card(&pending_ghost_card("ghost-1", "user-1", "int-1"))
        .await
        .unwrap();
    let token = h.sessions.token_for("user-1");

    let response = h
        .router
        .clone()
        .oneshot(request(
            "PATCH",
            "/api/ghost-cards/ghost-1/feedback",
            Some(&token),
            r#"{"satisfactionFeedback":"worth_it"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["ghostCardId"], "ghost-1");
    assert_eq!(body["satisfactionFeedback"], "worth_it");

    let response = h
        .router
        .oneshot(request(
            "PATCH",
            "/api/ghost-cards/ghost-missing/feedback",
            Some(&token),
            r#"{"satisfactionFeedback":"not_sure"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_is_open() {
    let h = http_harness().await;

    let response = h
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}
