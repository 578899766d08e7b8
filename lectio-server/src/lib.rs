//! lectio-server library - Bible study persistence service
//!
//! HTTP surface over the verse synchronizer, note synchronizers, journal
//! manager and chat relay. The binary in `main.rs` only wires configuration,
//! the database pool and the listener around [`build_router`].

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod services;

use services::chat::ChatProvider;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Language-model provider behind `/api/chat`
    pub chat: Arc<dyn ChatProvider>,
}

impl AppState {
    pub fn new(db: SqlitePool, chat: Arc<dyn ChatProvider>) -> Self {
        Self { db, chat }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let routes = Router::new()
        .route("/api/bible", post(api::sync_verse).get(api::query_verses))
        .route(
            "/api/note/createOrUpdateNote",
            post(api::upsert_note).delete(api::delete_note),
        )
        .route(
            "/api/note/createOrUpdateMultipleNotes",
            post(api::sync_notes),
        )
        .route(
            "/api/journals",
            get(api::list_journals).post(api::create_journal),
        )
        .route(
            "/api/journals/:id",
            get(api::get_journal)
                .put(api::update_journal)
                .delete(api::delete_journal),
        )
        .route("/api/tags", get(api::list_tags).post(api::create_tag))
        .route("/api/users", post(api::ensure_user))
        .route("/api/chat", post(api::chat));

    Router::new()
        .merge(routes)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
