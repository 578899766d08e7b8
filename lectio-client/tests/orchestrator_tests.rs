//! Orchestrator flows against an in-memory transport

use async_trait::async_trait;
use chrono::Utc;
use lectio_client::{ClientError, StudyOrchestrator, StudySession, SyncTransport, VerseRange};
use lectio_common::api::{
    HighlightChange, NoteBatchItem, NoteIdMapping, NoteSyncResult, Status, VerseChange,
    VerseQuery, VerseSyncRequest, VerseSyncResponse,
};
use lectio_common::models::{Note, Verse};
use std::sync::Mutex;

/// Minimal server stand-in keyed like the real synchronizer
#[derive(Default)]
struct FakeServer {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    verses: Vec<Verse>,
    next_id: u32,
    offline: bool,
    /// Drop the id mapping from verse-sync responses
    omit_mapping: bool,
    deleted: Vec<String>,
    requests: Vec<VerseSyncRequest>,
}

impl FakeState {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

fn offline() -> ClientError {
    ClientError::Rejected {
        status: 503,
        message: "offline".to_string(),
        field_errors: Vec::new(),
    }
}

fn note(id: &str, verse_record: &str, content: &str) -> Note {
    let now = Utc::now();
    Note {
        id: id.to_string(),
        verse_model_id: verse_record.to_string(),
        content: content.to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl SyncTransport for FakeServer {
    async fn sync_verse(&self, request: &VerseSyncRequest) -> lectio_client::Result<VerseSyncResponse> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(offline());
        }
        state.requests.push(request.clone());

        let index = match state.verses.iter().position(|v| v.key() == request.key) {
            Some(index) => index,
            None => {
                let id = state.fresh_id("verse");
                let now = Utc::now();
                state.verses.push(Verse {
                    id,
                    user_id: request.key.user_id.clone(),
                    book_id: request.key.book_id.clone(),
                    chapter_id: request.key.chapter_id.clone(),
                    verse_id: request.key.verse_id.clone(),
                    highlight_color: None,
                    is_bookmarked: false,
                    created_at: now,
                    updated_at: now,
                    notes: Vec::new(),
                });
                state.verses.len() - 1
            }
        };

        let mut note_ids = None;
        match &request.change {
            VerseChange::Note(payload) => {
                let existing = payload.id.as_deref().and_then(|id| {
                    state.verses[index].notes.iter().position(|n| n.id == id)
                });
                let note_id = match existing {
                    Some(pos) => {
                        state.verses[index].notes[pos].content = payload.content.clone();
                        state.verses[index].notes[pos].id.clone()
                    }
                    None => {
                        let note_id = state.fresh_id("note");
                        let record = state.verses[index].id.clone();
                        state.verses[index]
                            .notes
                            .push(note(&note_id, &record, &payload.content));
                        note_id
                    }
                };
                note_ids = Some(NoteIdMapping {
                    local_id: payload.id.clone(),
                    note_id,
                });
            }
            VerseChange::Highlight(change) => {
                state.verses[index].highlight_color = change.stored_value().map(str::to_string);
            }
            VerseChange::Bookmark(flag) => state.verses[index].is_bookmarked = *flag,
            VerseChange::Touch => {}
        }

        if state.omit_mapping {
            note_ids = None;
        }

        Ok(VerseSyncResponse {
            status: Status::Success,
            verse: state.verses[index].clone(),
            note_ids,
        })
    }

    async fn fetch_verses(&self, query: &VerseQuery) -> lectio_client::Result<Vec<Verse>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(offline());
        }
        let wanted = query.verse_id_list();
        Ok(state
            .verses
            .iter()
            .filter(|v| v.user_id == query.user_id)
            .filter(|v| query.chapter().map_or(true, |c| v.chapter_id == c))
            .filter(|v| wanted.is_empty() || wanted.contains(&v.verse_id))
            .cloned()
            .collect())
    }

    async fn sync_notes(
        &self,
        _user_id: &str,
        items: &[NoteBatchItem],
    ) -> lectio_client::Result<Vec<NoteSyncResult>> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(offline());
        }

        let mut results = Vec::new();
        for item in items {
            let index = state
                .verses
                .iter()
                .position(|v| v.id == item.verse_id)
                .ok_or_else(|| ClientError::Rejected {
                    status: 404,
                    message: format!("Verse not found: {}", item.verse_id),
                    field_errors: Vec::new(),
                })?;

            let existing = item.note_id.as_deref().and_then(|id| {
                state.verses[index].notes.iter().position(|n| n.id == id)
            });
            let (saved, created) = match existing {
                Some(pos) => {
                    state.verses[index].notes[pos].content = item.content.clone();
                    (state.verses[index].notes[pos].clone(), false)
                }
                None => {
                    let note_id = state.fresh_id("note");
                    let saved = note(&note_id, &item.verse_id, &item.content);
                    state.verses[index].notes.push(saved.clone());
                    (saved, true)
                }
            };
            results.push(NoteSyncResult {
                local_id: item.note_id.clone(),
                created,
                note: saved,
            });
        }
        Ok(results)
    }

    async fn delete_note(&self, note_id: &str) -> lectio_client::Result<Note> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if state.offline {
            return Err(offline());
        }
        for verse in state.verses.iter_mut() {
            if let Some(pos) = verse.notes.iter().position(|n| n.id == note_id) {
                let removed = verse.notes.remove(pos);
                state.deleted.push(note_id.to_string());
                return Ok(removed);
            }
        }
        Err(ClientError::Rejected {
            status: 404,
            message: format!("Note not found: {}", note_id),
            field_errors: Vec::new(),
        })
    }
}

fn genesis_one() -> VerseRange {
    VerseRange {
        book_id: "GEN".to_string(),
        chapter_id: "GEN.1".to_string(),
        verse_ids: vec!["GEN.1.1".to_string(), "GEN.1.2".to_string()],
    }
}

async fn orchestrator() -> StudyOrchestrator<FakeServer> {
    let mut orchestrator = StudyOrchestrator::new(StudySession::new("u1"), FakeServer::default());
    orchestrator.load_range(genesis_one()).await.unwrap();
    orchestrator
}

#[tokio::test]
async fn test_save_note_replaces_temporary_id() {
    let mut orch = orchestrator().await;
    let local = orch.session_mut().add_note("GEN.1.1");
    orch.session_mut().edit_note(&local, "Let there be light").unwrap();

    let saved = orch.save_note(&local).await.unwrap();

    assert_ne!(saved, local);
    let session = orch.session();
    assert!(session.note(&local).is_none());
    let note = session.note(&saved).unwrap();
    assert!(note.persisted);
    assert_eq!(note.content, "Let there be light");
    assert_eq!(session.notes().len(), 1);
}

#[tokio::test]
async fn test_resaving_updates_in_place() {
    let mut orch = orchestrator().await;
    let local = orch.session_mut().add_note("GEN.1.1");
    let saved = orch.save_note(&local).await.unwrap();

    orch.session_mut().edit_note(&saved, "revised").unwrap();
    let again = orch.save_note(&saved).await.unwrap();

    assert_eq!(again, saved);
    let state = orch.transport().state.lock().unwrap();
    assert_eq!(state.verses[0].notes.len(), 1);
    assert_eq!(state.verses[0].notes[0].content, "revised");
}

#[tokio::test]
async fn test_missing_mapping_falls_back_to_newest_note() {
    let mut orch = orchestrator().await;
    orch.transport().state.lock().unwrap().omit_mapping = true;

    let local = orch.session_mut().add_note("GEN.1.2");
    let saved = orch.save_note(&local).await.unwrap();

    assert!(orch.session().note(&local).is_none());
    assert!(orch.session().note(&saved).unwrap().persisted);
}

#[tokio::test]
async fn test_highlight_toggle_syncs_clear() {
    let mut orch = orchestrator().await;

    let first = orch.toggle_highlight("GEN.1.1", "bg-yellow-200").await.unwrap();
    let second = orch.toggle_highlight("GEN.1.1", "bg-yellow-200").await.unwrap();

    assert_eq!(first, HighlightChange::Set("bg-yellow-200".to_string()));
    assert_eq!(second, HighlightChange::Clear);
    assert_eq!(orch.session().highlight_for("GEN.1.1"), None);

    let state = orch.transport().state.lock().unwrap();
    assert_eq!(state.verses[0].highlight_color, None);
    assert_eq!(
        state.requests.last().map(|r| &r.change),
        Some(&VerseChange::Highlight(HighlightChange::Clear))
    );
}

#[tokio::test]
async fn test_bookmark_add_and_remove() {
    let mut orch = orchestrator().await;

    let id = orch.add_bookmark("GEN.1.1", "In the beginning").await.unwrap();
    assert!(orch.session().is_bookmarked("GEN.1.1"));
    assert!(orch.transport().state.lock().unwrap().verses[0].is_bookmarked);

    orch.remove_bookmark(&id).await.unwrap();
    assert!(!orch.session().is_bookmarked("GEN.1.1"));
    assert!(!orch.transport().state.lock().unwrap().verses[0].is_bookmarked);

    assert!(matches!(
        orch.remove_bookmark(&id).await,
        Err(ClientError::UnknownBookmark(_))
    ));
}

#[tokio::test]
async fn test_delete_unsaved_note_skips_server() {
    let mut orch = orchestrator().await;
    let local = orch.session_mut().add_note("GEN.1.1");

    orch.delete_note(&local).await.unwrap();

    assert!(orch.session().notes().is_empty());
    assert!(orch.transport().state.lock().unwrap().deleted.is_empty());
}

#[tokio::test]
async fn test_delete_persisted_note_reaches_server() {
    let mut orch = orchestrator().await;
    let local = orch.session_mut().add_note("GEN.1.1");
    let saved = orch.save_note(&local).await.unwrap();

    orch.delete_note(&saved).await.unwrap();

    assert_eq!(orch.transport().state.lock().unwrap().deleted, vec![saved]);
}

#[tokio::test]
async fn test_failed_sync_keeps_optimistic_state() {
    let mut orch = orchestrator().await;
    orch.transport().state.lock().unwrap().offline = true;

    let result = orch.toggle_highlight("GEN.1.2", "bg-pink-200").await;
    assert!(matches!(result, Err(ClientError::Rejected { status: 503, .. })));
    assert_eq!(orch.session().highlight_for("GEN.1.2"), Some("bg-pink-200"));

    let local = orch.session_mut().add_note("GEN.1.2");
    assert!(orch.save_note(&local).await.is_err());
    assert!(!orch.session().note(&local).unwrap().persisted);
}

#[tokio::test]
async fn test_batch_sync_reconciles_by_local_id() {
    let mut orch = orchestrator().await;

    // A first save creates the verse record so later notes know its id
    let first = orch.session_mut().add_note("GEN.1.1");
    let saved = orch.save_note(&first).await.unwrap();

    let second = orch.session_mut().add_note("GEN.1.1");
    orch.session_mut().edit_note(&second, "second").unwrap();
    orch.session_mut().edit_note(&saved, "first, revised").unwrap();

    let results = orch.sync_pending_notes().await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().any(|r| r.local_id.as_deref() == Some(second.as_str()) && r.created));
    assert!(orch.session().note(&second).is_none());
    assert!(orch.session().notes().iter().all(|n| n.persisted));
    assert_eq!(orch.session().note(&saved).unwrap().content, "first, revised");
}

#[tokio::test]
async fn test_load_range_merges_existing_records() {
    let server = FakeServer::default();
    let mut writer = StudyOrchestrator::new(StudySession::new("u1"), server);
    writer.load_range(genesis_one()).await.unwrap();
    let local = writer.session_mut().add_note("GEN.1.2");
    writer.save_note(&local).await.unwrap();
    writer.toggle_highlight("GEN.1.2", "bg-green-200").await.unwrap();

    // A fresh session over the same server sees the stored state
    let (_, server) = writer.into_parts();
    let mut reader = StudyOrchestrator::new(StudySession::new("u1"), server);
    let count = reader.load_range(genesis_one()).await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(reader.session().notes().len(), 1);
    assert_eq!(reader.session().highlight_for("GEN.1.2"), Some("bg-green-200"));
}

#[tokio::test]
async fn test_verse_operations_need_a_range() {
    let mut orch = StudyOrchestrator::new(StudySession::new("u1"), FakeServer::default());
    let local = orch.session_mut().add_note("GEN.1.1");

    assert!(matches!(orch.save_note(&local).await, Err(ClientError::NoVerseRange)));
}

fn exodus_two() -> VerseRange {
    VerseRange {
        book_id: "EXO".to_string(),
        chapter_id: "EXO.2".to_string(),
        verse_ids: vec!["EXO.2.1".to_string()],
    }
}

#[tokio::test]
async fn test_note_saved_after_range_change_keeps_its_chapter() {
    let mut orch = orchestrator().await;
    let local = orch.session_mut().add_note("GEN.1.1");
    orch.session_mut().edit_note(&local, "formless and void").unwrap();

    orch.load_range(exodus_two()).await.unwrap();
    orch.save_note(&local).await.unwrap();

    {
        let state = orch.transport().state.lock().unwrap();
        let key = &state.requests.last().unwrap().key;
        assert_eq!(key.book_id, "GEN");
        assert_eq!(key.chapter_id, "GEN.1");
        assert_eq!(key.verse_id, "GEN.1.1");
    }

    // Returning to Genesis finds the saved note on its verse record
    let (_, server) = orch.into_parts();
    let mut reader = StudyOrchestrator::new(StudySession::new("u1"), server);
    reader.load_range(genesis_one()).await.unwrap();
    assert_eq!(reader.session().notes().len(), 1);
    assert_eq!(reader.session().notes()[0].content, "formless and void");
}

#[tokio::test]
async fn test_bookmark_removed_after_range_change_keeps_its_chapter() {
    let mut orch = orchestrator().await;
    let synced = orch.add_bookmark("GEN.1.1", "In the beginning").await.unwrap();

    // Added while the server was unreachable, so no verse record exists
    orch.transport().state.lock().unwrap().offline = true;
    assert!(orch.add_bookmark("GEN.1.2", "the Spirit").await.is_err());
    let unsynced = orch.session().bookmarks()[1].id.clone();
    orch.transport().state.lock().unwrap().offline = false;

    orch.load_range(exodus_two()).await.unwrap();
    orch.remove_bookmark(&synced).await.unwrap();
    orch.remove_bookmark(&unsynced).await.unwrap();

    let state = orch.transport().state.lock().unwrap();
    let keys: Vec<_> = state.requests.iter().map(|r| &r.key).collect();
    assert!(keys.iter().all(|k| k.book_id == "GEN" && k.chapter_id == "GEN.1"));
    assert!(state.verses.iter().all(|v| v.book_id == "GEN" && !v.is_bookmarked));
    assert_eq!(state.verses.len(), 2);
}
