//! Document view API
//!
//! ```text
//! GET    /api/v1/documents/:id                 navigate the caller's view
//! GET    /api/v1/documents/:id/pages/:number   one rendered page
//! GET    /api/v1/documents/:id/download        save-as of the loaded content
//! DELETE /api/v1/documents/:id                 delete from processing
//! ```
//!
//! Each caller gets its own view (see [`Identity::viewer_key`]). Page,
//! download and delete requests for an id the view does not hold navigate
//! it there first.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, DocumentRecord};
use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::state::AppState;
use crate::store::Partition;
use crate::view::{
    Capabilities, DocumentView, LoadedDocument, RenderState, ViewStatus, ViewUpdate,
};

/// Base path the router is nested under
pub const BASE_PATH: &str = "/api/v1/documents";

const SUPERSEDED_MESSAGE: &str = "A newer request replaced this one";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(open_document).delete(delete_document))
        .route("/:id/pages/:number", get(render_page))
        .route("/:id/download", get(download_document))
}

/// Query parameters for opening a document
#[derive(Debug, Default, Deserialize)]
pub struct OpenQuery {
    /// Render every page before responding
    #[serde(default)]
    pub eager: bool,
}

/// Record fields exposed to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: String,
    pub file_name: Option<String>,
    pub display_name: String,
    pub partition: Partition,
}

impl From<&DocumentRecord> for RecordSummary {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            id: record.id.clone(),
            file_name: record.file_name.clone(),
            display_name: record.display_name().to_string(),
            partition: record.partition,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub href: String,
}

/// Response for a view navigation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub id: Option<String>,
    pub status: ViewStatus,
    pub loading: bool,
    pub record: Option<RecordSummary>,
    pub page_count: usize,
    pub message: Option<String>,
    pub capabilities: Capabilities,
    pub requested_by: String,
    pub viewed_at: DateTime<Utc>,
    pub pages: Vec<PageLink>,
}

impl ViewResponse {
    fn new(
        state: RenderState,
        loaded: Option<&LoadedDocument>,
        capabilities: Capabilities,
        identity: &Identity,
    ) -> Self {
        let pages = loaded.map(page_links).unwrap_or_default();
        let viewed_at = state.settled_at.unwrap_or_else(Utc::now);
        Self {
            record: state.record.as_ref().map(RecordSummary::from),
            id: state.id,
            status: state.status,
            loading: state.loading,
            page_count: state.page_count,
            message: state.message,
            capabilities,
            requested_by: identity.requested_by().to_string(),
            viewed_at,
            pages,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.status {
            ViewStatus::Ready => StatusCode::OK,
            ViewStatus::NotFound => StatusCode::NOT_FOUND,
            ViewStatus::Failed => StatusCode::SERVICE_UNAVAILABLE,
            ViewStatus::Idle | ViewStatus::Loading => StatusCode::ACCEPTED,
        }
    }
}

fn page_href(id: &str, page: usize) -> String {
    format!("{}/{}/pages/{}", BASE_PATH, urlencoding::encode(id), page)
}

fn page_links(loaded: &LoadedDocument) -> Vec<PageLink> {
    (1..=loaded.page_count())
        .filter_map(|number| {
            let size = loaded.pages.page_size(number).ok()?;
            Some(PageLink {
                number,
                width: size.width,
                height: size.height,
                href: page_href(&loaded.record.id, number),
            })
        })
        .collect()
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// The caller's view, holding `id`
async fn ensure_loaded(view: &DocumentView, id: &DocumentId) -> Result<Arc<LoadedDocument>> {
    if let Some(loaded) = view.loaded_for(id.as_str()) {
        return Ok(loaded);
    }

    match view.navigate(id.as_str()).await {
        ViewUpdate::Superseded => Err(AppError::Conflict(SUPERSEDED_MESSAGE.to_string())),
        ViewUpdate::Current(state) => {
            if let Some(loaded) = view.loaded_for(id.as_str()) {
                return Ok(loaded);
            }
            let message = state.message.unwrap_or_default();
            match state.status {
                ViewStatus::Failed => Err(AppError::Unavailable(message)),
                _ => Err(AppError::NotFound(message)),
            }
        }
    }
}

/// GET /api/v1/documents/:id
async fn open_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OpenQuery>,
    identity: Identity,
) -> Result<Response> {
    let id = DocumentId::parse(&id)?;
    let view = state.view_for(identity.viewer_key());

    let settled = match view.navigate(id.as_str()).await {
        ViewUpdate::Current(settled) => settled,
        ViewUpdate::Superseded => {
            tracing::debug!("Navigation to {} superseded", id);
            return Err(AppError::Conflict(SUPERSEDED_MESSAGE.to_string()));
        }
    };

    let loaded = view.loaded_for(id.as_str());
    if query.eager {
        if let Some(loaded) = &loaded {
            let pages = loaded.render_all(view.options().render_concurrency).await?;
            tracing::debug!("Eagerly rendered {} pages of {}", pages.len(), id);
        }
    }

    let response = ViewResponse::new(settled, loaded.as_deref(), view.capabilities(), &identity);
    Ok((response.status_code(), Json(response)).into_response())
}

/// GET /api/v1/documents/:id/pages/:number
async fn render_page(
    State(state): State<AppState>,
    Path((id, number)): Path<(String, usize)>,
    identity: Identity,
) -> Result<Response> {
    let id = DocumentId::parse(&id)?;
    let view = state.view_for(identity.viewer_key());
    let loaded = ensure_loaded(&view, &id).await?;

    let page = loaded.pages.render_page(number).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, crate::render::RenderedPage::CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, page.data.len())
        .header(header::ETAG, format!("\"{}-{}\"", loaded.content.digest(), page.number))
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .header("x-page-number", page.number)
        .header("x-page-count", loaded.page_count())
        .header("x-page-width", page.width.to_string())
        .header("x-page-height", page.height.to_string())
        .body(Body::from(page.data.as_ref().clone()))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /api/v1/documents/:id/download
async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<Response> {
    let id = DocumentId::parse(&id)?;
    let view = state.view_for(identity.viewer_key());
    if !view.capabilities().can_download {
        return Err(AppError::Forbidden(format!(
            "The download action is not enabled for {}",
            id
        )));
    }
    let loaded = ensure_loaded(&view, &id).await?;
    let download = view.download_of(&loaded)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CONTENT_LENGTH, download.bytes.len())
        .header(header::CONTENT_DISPOSITION, content_disposition(&download.file_name))
        .header(header::ETAG, format!("\"{}\"", download.digest))
        .body(Body::from(download.bytes.as_ref().clone()))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// DELETE /api/v1/documents/:id
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    identity: Identity,
) -> Result<Redirect> {
    let id = DocumentId::parse(&id)?;
    let view = state.view_for(identity.viewer_key());
    if !view.capabilities().can_delete {
        return Err(AppError::Forbidden(format!(
            "The delete action is not enabled for {}",
            id
        )));
    }
    let loaded = ensure_loaded(&view, &id).await?;

    let navigation = view.delete_of(loaded).await?;
    tracing::info!(
        "{} deleted {}; redirecting to {}",
        identity.requested_by(),
        id,
        navigation.location
    );
    Ok(Redirect::to(&navigation.location))
}
