//! HttpTransport against a live lectio-server on a loopback port

use async_trait::async_trait;
use lectio_client::{ClientError, HttpTransport, StudyOrchestrator, StudySession, SyncTransport, VerseRange};
use lectio_common::api::{ChatKind, HighlightChange, VerseChange, VerseSyncRequest};
use lectio_common::db::init_memory_database;
use lectio_common::models::VerseKey;
use lectio_server::services::chat::{ChatError, ChatProvider};
use lectio_server::{build_router, AppState};
use std::sync::Arc;

struct NoChat;

#[async_trait]
impl ChatProvider for NoChat {
    async fn complete(&self, _kind: ChatKind, _user_prompt: &str) -> Result<String, ChatError> {
        Err(ChatError::MissingApiKey("OPENAI_API_KEY".to_string()))
    }
}

/// Serve a fresh app on 127.0.0.1 and return a transport pointed at it
async fn spawn_server() -> HttpTransport {
    let db = init_memory_database().await.unwrap();
    let app = build_router(AppState::new(db, Arc::new(NoChat)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpTransport::new(format!("http://{}/", addr)).unwrap()
}

fn psalm_23() -> VerseRange {
    VerseRange {
        book_id: "PSA".to_string(),
        chapter_id: "PSA.23".to_string(),
        verse_ids: vec!["PSA.23.1".to_string(), "PSA.23.2".to_string()],
    }
}

#[tokio::test]
async fn test_note_lifecycle_over_http() {
    let transport = spawn_server().await;
    let mut orch = StudyOrchestrator::new(StudySession::new("u1"), transport);
    assert_eq!(orch.load_range(psalm_23()).await.unwrap(), 0);

    let local = orch.session_mut().add_note("PSA.23.1");
    orch.session_mut()
        .edit_note(&local, "The Lord is my shepherd")
        .unwrap();
    let saved = orch.save_note(&local).await.unwrap();
    assert_ne!(saved, local);
    assert!(orch.session().note(&saved).unwrap().persisted);

    // Second note goes through the batch endpoint with its temporary id
    let pending = orch.session_mut().add_note("PSA.23.1");
    orch.session_mut().edit_note(&pending, "I shall not want").unwrap();
    let results = orch.sync_pending_notes().await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(orch.session().note(&pending).is_none());

    // A fresh session sees both notes
    let (_, transport) = orch.into_parts();
    let mut reader = StudyOrchestrator::new(StudySession::new("u1"), transport);
    reader.load_range(psalm_23()).await.unwrap();
    assert_eq!(reader.session().notes().len(), 2);

    reader.delete_note(&saved).await.unwrap();
    assert_eq!(reader.session().notes().len(), 1);
}

#[tokio::test]
async fn test_highlight_and_bookmark_over_http() {
    let transport = spawn_server().await;
    let mut orch = StudyOrchestrator::new(StudySession::new("u1"), transport);
    orch.load_range(psalm_23()).await.unwrap();

    orch.toggle_highlight("PSA.23.2", "bg-green-200").await.unwrap();
    let bookmark = orch.add_bookmark("PSA.23.2", "green pastures").await.unwrap();
    assert_eq!(orch.session().verses().len(), 1);

    let cleared = orch.toggle_highlight("PSA.23.2", "bg-green-200").await.unwrap();
    assert_eq!(cleared, HighlightChange::Clear);
    orch.remove_bookmark(&bookmark).await.unwrap();

    let verse = &orch.session().verses()[0];
    assert_eq!(verse.highlight_color, None);
    assert!(!verse.is_bookmarked);
}

#[tokio::test]
async fn test_fail_envelope_becomes_rejected() {
    let transport = spawn_server().await;

    match transport.delete_note("no-such-note").await {
        Err(ClientError::Rejected { status, message, .. }) => {
            assert_eq!(status, 404);
            assert!(message.contains("no-such-note"), "message: {}", message);
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    let request = VerseSyncRequest {
        key: VerseKey::new("u1", "", "PSA.23", "PSA.23.1"),
        change: VerseChange::Touch,
    };
    let err = transport.sync_verse(&request).await.unwrap_err();
    let fields: Vec<_> = err.field_errors().iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["bookId"]);
}
