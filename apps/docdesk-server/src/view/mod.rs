//! Document view
//!
//! A [`DocumentView`] is one viewer's window onto a single document. Each
//! navigation runs a one-shot sequence and settles into a [`RenderState`]:
//!
//! ```text
//!   navigate(id)
//!     │  generation += 1, state = Loading
//!     ▼
//!   resolve ──▶ fetch ──▶ decode ──▶ open
//!     │           │          │         │
//!     │ NotFound  │ NotFound │ Decode  │ Render      ──▶ NotFound state
//!     │ Transient │ Transient│         │             ──▶ Failed state
//!     ▼
//!   settle: discard if a newer navigation started, else publish
//! ```
//!
//! Nothing is cached across navigations: every navigation re-resolves and
//! re-fetches. Results for an abandoned id are dropped when they arrive,
//! so a slow response can never overwrite a fresher view.

mod actions;
mod error;
mod registry;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::document::{decode, DecodedContent, DocumentRecord};
use crate::lookup::{fetch, resolve, Fetched, Resolution};
use crate::render::{render_pages, PageRenderer, RenderEngine, RenderResult, RenderedPage};
use crate::store::DocumentStore;

pub use actions::{Download, Navigation};
pub use error::{Action, ActionError, ViewError};
pub use registry::ViewRegistry;

/// Message shown for missing or unreadable documents
pub const NOT_FOUND_MESSAGE: &str = "Document not found.";

/// Message shown when the store could not be reached
pub const FAILED_MESSAGE: &str = "Failed to load document. Reload to try again.";

/// Lifecycle of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewStatus {
    /// Nothing requested yet, or torn down after a delete
    Idle,
    Loading,
    Ready,
    NotFound,
    Failed,
}

/// Which lifecycle actions a view offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub can_delete: bool,
    pub can_download: bool,
}

impl Capabilities {
    pub const VIEW_ONLY: Capabilities = Capabilities {
        can_delete: false,
        can_download: false,
    };

    pub const FULL: Capabilities = Capabilities {
        can_delete: true,
        can_download: true,
    };
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::FULL
    }
}

/// Per-view settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub capabilities: Capabilities,
    /// Where a successful delete sends the user
    pub home_route: String,
    /// Pages rendered concurrently by eager rendering
    pub render_concurrency: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            home_route: "/".to_string(),
            render_concurrency: 4,
        }
    }
}

/// Snapshot of a view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub id: Option<String>,
    pub status: ViewStatus,
    pub loading: bool,
    pub record: Option<DocumentRecord>,
    /// Zero until the document has been opened
    pub page_count: usize,
    pub message: Option<String>,
    /// When the navigation settled; unset while idle or loading
    pub settled_at: Option<DateTime<Utc>>,
}

impl RenderState {
    fn idle() -> Self {
        Self {
            id: None,
            status: ViewStatus::Idle,
            loading: false,
            record: None,
            page_count: 0,
            message: None,
            settled_at: None,
        }
    }

    fn loading(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            status: ViewStatus::Loading,
            loading: true,
            ..Self::idle()
        }
    }

    fn ready(loaded: &LoadedDocument) -> Self {
        Self {
            id: Some(loaded.record.id.clone()),
            status: ViewStatus::Ready,
            loading: false,
            record: Some(loaded.record.clone()),
            page_count: loaded.pages.page_count(),
            message: None,
            settled_at: Some(Utc::now()),
        }
    }

    fn failed(id: &str, err: &ViewError) -> Self {
        let status = err.status();
        let message = match status {
            ViewStatus::Failed => FAILED_MESSAGE,
            _ => NOT_FOUND_MESSAGE,
        };
        Self {
            id: Some(id.to_string()),
            status,
            loading: false,
            message: Some(message.to_string()),
            settled_at: Some(Utc::now()),
            ..Self::idle()
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ViewStatus::Ready
    }
}

/// A document that made it all the way through open
pub struct LoadedDocument {
    pub record: DocumentRecord,
    pub content: DecodedContent,
    pub pages: Arc<dyn PageRenderer>,
}

impl LoadedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    /// Render every page once in ascending order
    pub async fn render_all(&self, concurrency: usize) -> RenderResult<Vec<Arc<RenderedPage>>> {
        render_pages(self.pages.as_ref(), concurrency).await
    }
}

/// Result of a navigation
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// The navigation settled and is what the view now shows
    Current(RenderState),
    /// A newer navigation started first; this result was discarded
    Superseded,
}

/// Resolve, fetch, decode and open `id`
pub async fn load_document(
    store: &dyn DocumentStore,
    engine: &RenderEngine,
    id: &str,
) -> Result<LoadedDocument, ViewError> {
    let partition = match resolve(store, id).await? {
        Resolution::Found(partition) => partition,
        Resolution::NotFound => return Err(ViewError::NotFound(id.to_string())),
    };

    let record = match fetch(store, id, partition).await? {
        Fetched::Found(record) => record,
        Fetched::NotFound => return Err(ViewError::NotFound(id.to_string())),
    };

    let content = decode(&record.file_content)?;
    let pages = engine.open(&content).await?;

    Ok(LoadedDocument {
        record,
        content,
        pages,
    })
}

struct Slot {
    generation: u64,
    state: RenderState,
    loaded: Option<Arc<LoadedDocument>>,
}

/// One viewer's document view
pub struct DocumentView {
    store: Arc<dyn DocumentStore>,
    engine: RenderEngine,
    options: ViewOptions,
    slot: RwLock<Slot>,
}

impl DocumentView {
    pub fn new(store: Arc<dyn DocumentStore>, engine: RenderEngine, options: ViewOptions) -> Self {
        Self {
            store,
            engine,
            options,
            slot: RwLock::new(Slot {
                generation: 0,
                state: RenderState::idle(),
                loaded: None,
            }),
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn capabilities(&self) -> Capabilities {
        self.options.capabilities
    }

    pub fn state(&self) -> RenderState {
        self.slot.read().state.clone()
    }

    /// The loaded document, if the view is ready
    pub fn loaded(&self) -> Option<Arc<LoadedDocument>> {
        self.slot.read().loaded.clone()
    }

    /// The loaded document if it is `id`
    pub fn loaded_for(&self, id: &str) -> Option<Arc<LoadedDocument>> {
        self.loaded().filter(|loaded| loaded.record.id == id)
    }

    /// Point the view at `id` and load it
    pub async fn navigate(&self, id: &str) -> ViewUpdate {
        let generation = self.begin(id);
        let result = load_document(self.store.as_ref(), &self.engine, id).await;
        self.settle(generation, id, result)
    }

    /// Drop whatever the view holds; in-flight navigations are discarded
    pub fn reset(&self) {
        let mut slot = self.slot.write();
        slot.generation += 1;
        slot.state = RenderState::idle();
        slot.loaded = None;
    }

    /// Reset only if the view still holds `loaded`
    fn release(&self, loaded: &Arc<LoadedDocument>) {
        let mut slot = self.slot.write();
        let holding = slot
            .loaded
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, loaded));
        if holding {
            slot.generation += 1;
            slot.state = RenderState::idle();
            slot.loaded = None;
        }
    }

    fn begin(&self, id: &str) -> u64 {
        let mut slot = self.slot.write();
        slot.generation += 1;
        slot.state = RenderState::loading(id);
        slot.loaded = None;
        slot.generation
    }

    fn settle(
        &self,
        generation: u64,
        id: &str,
        result: Result<LoadedDocument, ViewError>,
    ) -> ViewUpdate {
        let mut slot = self.slot.write();
        if slot.generation != generation {
            tracing::debug!(
                "Discarding stale result for {} (generation {} < {})",
                id,
                generation,
                slot.generation
            );
            return ViewUpdate::Superseded;
        }

        match result {
            Ok(loaded) => {
                let loaded = Arc::new(loaded);
                slot.state = RenderState::ready(&loaded);
                slot.loaded = Some(loaded);
                tracing::info!(
                    "View ready: {} ({} pages, {})",
                    id,
                    slot.state.page_count,
                    slot.state
                        .record
                        .as_ref()
                        .map(|r| r.partition.collection())
                        .unwrap_or_default()
                );
            }
            Err(err) => {
                match &err {
                    ViewError::Transient(e) => tracing::error!("Loading {} failed: {}", id, e),
                    other => tracing::warn!("Document {} unavailable: {}", id, other),
                }
                slot.state = RenderState::failed(id, &err);
                slot.loaded = None;
            }
        }

        ViewUpdate::Current(slot.state.clone())
    }
}
