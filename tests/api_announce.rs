//! REST surface tests: health probes and the service-token-guarded
//! announcement endpoints, driven through the router with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tower::ServiceExt;
use uuid::Uuid;

use noteroom::collab::{CollabHub, HubSettings};
use noteroom::config::Config;
use noteroom::models::{
    AnnounceCreatedRequest, AnnounceUpdatedRequest, DiagnosticsResponse, FieldChange,
    FieldChanges, NoteRecord, ServerMessage, UserRecord, UserView,
};
use noteroom::store::{MemoryNoteStore, MemoryUserStore};
use noteroom::{create_app, AppState};

const SECRET: &str = "test-secret";

fn token(sub: &str, token_type: &str) -> String {
    let claims = json!({
        "sub": sub,
        "type": token_type,
        "exp": Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn user(id: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        username: format!("{}@example.com", id),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        avatar: None,
        is_active: true,
    }
}

fn note(owner: &str, is_public: bool) -> NoteRecord {
    NoteRecord {
        id: Uuid::new_v4().to_string(),
        title: "Meeting notes".to_string(),
        content: "hello".to_string(),
        owner: owner.to_string(),
        collaborators: Vec::new(),
        is_public,
        tags: Vec::new(),
        version: 1,
        last_edited_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        is_deleted: false,
    }
}

fn build_app() -> (axum::Router, CollabHub, Arc<MemoryNoteStore>, Arc<MemoryUserStore>) {
    let config = Config {
        auth_jwt_secret: Some(SECRET.to_string()),
        ..Config::default()
    };
    let notes = Arc::new(MemoryNoteStore::new());
    let users = Arc::new(MemoryUserStore::new());
    let hub = CollabHub::new(notes.clone(), users.clone(), HubSettings::from_config(&config));
    let state = Arc::new(AppState {
        config,
        hub: hub.clone(),
    });
    (create_app(state), hub, notes, users)
}

fn post_json(uri: &str, auth: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn health_probes_are_open() {
    let (app, _hub, _notes, _users) = build_app();

    for uri in ["/api/health", "/api/ready"] {
        let res = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn announcements_require_a_service_token() {
    let (app, _hub, _notes, users) = build_app();
    users.insert(user("carol"));
    let payload = serde_json::to_string(&AnnounceCreatedRequest {
        document: note("carol", true),
        creator_id: "carol".to_string(),
    })
    .unwrap();

    // No token.
    let res = app
        .clone()
        .oneshot(post_json("/api/v1/announce/created", None, payload.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // User tokens are not enough for the internal surface.
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/v1/announce/created",
            Some(&token("carol", "user")),
            payload.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .oneshot(post_json(
            "/api/v1/announce/created",
            Some(&token("notes-api", "service")),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn accepted_announcements_reach_global_subscribers() {
    let (app, hub, _notes, users) = build_app();
    users.insert(user("alice"));
    users.insert(user("carol"));

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.connect(UserView::from(&user("alice")), tx).await;
    match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
        Some(ServerMessage::Connected(_)) => {}
        other => panic!("expected connected, got {:?}", other),
    }

    let doc = note("carol", true);
    let payload = serde_json::to_string(&AnnounceCreatedRequest {
        document: doc.clone(),
        creator_id: "carol".to_string(),
    })
    .unwrap();
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/v1/announce/created",
            Some(&token("notes-api", "service")),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
        Some(ServerMessage::PublicDocCreated(m)) => assert_eq!(m.document.id, doc.id),
        other => panic!("expected public-doc-created, got {:?}", other),
    }

    // A public-to-private update turns into a privatized notice.
    let payload = serde_json::to_string(&AnnounceUpdatedRequest {
        document: note("carol", false),
        editor_id: "carol".to_string(),
        changes: FieldChanges {
            is_public: Some(FieldChange {
                old: true,
                new: false,
            }),
            ..Default::default()
        },
    })
    .unwrap();
    let res = app
        .oneshot(post_json(
            "/api/v1/announce/updated",
            Some(&token("notes-api", "service")),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
        Some(ServerMessage::PublicDocPrivatized(_)) => {}
        other => panic!("expected public-doc-privatized, got {:?}", other),
    }
}

#[tokio::test]
async fn diagnostics_report_hub_counters() {
    let (app, hub, notes, users) = build_app();
    users.insert(user("alice"));
    let doc = note("alice", true);
    let doc_id = doc.id.clone();
    notes.insert(doc);

    // The surface is service-guarded like the announce endpoints.
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/diagnostics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // One session in one room, with an edit waiting on the debouncer.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = hub.connect(UserView::from(&user("alice")), tx).await;
    match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
        Some(ServerMessage::Connected(_)) => {}
        other => panic!("expected connected, got {:?}", other),
    }
    hub.join_document(session, &doc_id).await;
    match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
        Some(ServerMessage::DocumentJoined(_)) => {}
        other => panic!("expected document-joined, got {:?}", other),
    }
    hub.content_change(
        session,
        noteroom::models::ContentChangeMessage {
            document_id: doc_id.clone(),
            content: "hello world".to_string(),
            operation: None,
            position: None,
            length: None,
            timestamp: None,
        },
    )
    .await;

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/diagnostics")
                .header("authorization", format!("Bearer {}", token("ops", "service")))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let stats: DiagnosticsResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.active_documents, 1);
    assert_eq!(stats.total_active_users, 1);
    assert_eq!(stats.global_subscribers, 1);
    assert_eq!(stats.pending_saves, 1);
}

#[tokio::test]
async fn announcements_reject_unknown_actors() {
    let (app, _hub, _notes, _users) = build_app();
    let payload = serde_json::to_string(&AnnounceCreatedRequest {
        document: note("ghost", true),
        creator_id: "ghost".to_string(),
    })
    .unwrap();

    let res = app
        .oneshot(post_json(
            "/api/v1/announce/created",
            Some(&token("notes-api", "service")),
            payload,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
