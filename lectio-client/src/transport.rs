//! Transport to the Lectio server
//!
//! [`SyncTransport`] is the seam the orchestrator talks through.
//! [`HttpTransport`] is the production implementation over reqwest; tests
//! substitute in-memory fakes.

use async_trait::async_trait;
use lectio_common::api::{
    FailureBody, NoteBatchForm, NoteBatchItem, NoteBatchResponse, NoteDeleteForm,
    NoteDeleteResponse, NoteSyncResult, VerseQuery, VerseQueryResponse, VerseSyncForm,
    VerseSyncRequest, VerseSyncResponse,
};
use lectio_common::models::{Note, Verse};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

const USER_AGENT: &str = concat!("lectio-client/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// `POST /api/bible`
    async fn sync_verse(&self, request: &VerseSyncRequest) -> Result<VerseSyncResponse>;

    /// `GET /api/bible`
    async fn fetch_verses(&self, query: &VerseQuery) -> Result<Vec<Verse>>;

    /// `POST /api/note/createOrUpdateMultipleNotes`
    async fn sync_notes(&self, user_id: &str, items: &[NoteBatchItem])
        -> Result<Vec<NoteSyncResult>>;

    /// `DELETE /api/note/createOrUpdateNote`
    async fn delete_note(&self, note_id: &str) -> Result<Note>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:5780`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a success body, or turn the fail envelope into [`ClientError::Rejected`]
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let (message, field_errors) = match serde_json::from_slice::<FailureBody>(&bytes) {
            Ok(body) => (body.error, body.field_errors),
            Err(_) => (String::from_utf8_lossy(&bytes).into_owned(), Vec::new()),
        };
        warn!("Server rejected request ({}): {}", status, message);
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
            field_errors,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn sync_verse(&self, request: &VerseSyncRequest) -> Result<VerseSyncResponse> {
        let form = VerseSyncForm::from_request(request)?;
        debug!(verse = %request.key.verse_id, "Syncing verse");

        let response = self
            .client
            .post(self.url("/api/bible"))
            .form(&form)
            .send()
            .await?;

        decode(response).await
    }

    async fn fetch_verses(&self, query: &VerseQuery) -> Result<Vec<Verse>> {
        let response = self
            .client
            .get(self.url("/api/bible"))
            .query(query)
            .send()
            .await?;

        let body: VerseQueryResponse = decode(response).await?;
        debug!("Fetched {} verse records", body.verses.len());
        Ok(body.verses)
    }

    async fn sync_notes(
        &self,
        user_id: &str,
        items: &[NoteBatchItem],
    ) -> Result<Vec<NoteSyncResult>> {
        let form = NoteBatchForm::new(user_id, items)?;

        let response = self
            .client
            .post(self.url("/api/note/createOrUpdateMultipleNotes"))
            .form(&form)
            .send()
            .await?;

        let body: NoteBatchResponse = decode(response).await?;
        Ok(body.notes)
    }

    async fn delete_note(&self, note_id: &str) -> Result<Note> {
        let form = NoteDeleteForm {
            note_id: Some(note_id.to_string()),
        };

        let response = self
            .client
            .delete(self.url("/api/note/createOrUpdateNote"))
            .form(&form)
            .send()
            .await?;

        let body: NoteDeleteResponse = decode(response).await?;
        Ok(body.note)
    }
}
