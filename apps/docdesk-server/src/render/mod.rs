//! Pagination renderer
//!
//! Turns decoded document content into a page-addressable artifact:
//!
//! ```text
//!   DecodedContent ──open()──▶ PdfPages (page tree parsed, sizes known)
//!                                  │
//!                    render_page(n)│  any order, concurrently, idempotent
//!                                  ▼
//!                            RenderedPage (single-page PDF + size)
//! ```
//!
//! Parsing and extraction are CPU-bound and run on tokio's blocking pool,
//! bounded by a semaphore and a timeout. Both limits, and the rendered page
//! cache, live in a process-wide [`RenderEngine`] created by [`init`].
//!
//! # Initialization
//!
//! Nothing is configured at load time. Call [`init`] once at startup; any
//! later call returns the engine created first and ignores its argument
//! (with a warning if the configuration differs). [`RenderEngine::new`]
//! builds a standalone engine for tests and embedding.

mod cache;
mod error;
mod pdf;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::document::DecodedContent;

pub use cache::{PageCache, PageCacheKey, PageCacheStats};
pub use error::{RenderError, RenderResult};
pub use pdf::PdfPages;

/// Page dimensions in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter, the default when a page tree carries no MediaBox
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
}

/// One rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// 1-indexed page number
    pub number: usize,
    pub width: f32,
    pub height: f32,
    /// Standalone single-page PDF
    pub data: Arc<Vec<u8>>,
}

impl RenderedPage {
    pub const CONTENT_TYPE: &'static str = "application/pdf";
}

/// Page access for an opened document
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Total pages, fixed once the document is open
    fn page_count(&self) -> usize;

    /// Size of a 1-indexed page
    fn page_size(&self, page: usize) -> RenderResult<PageSize>;

    /// Render a 1-indexed page; repeated calls yield identical output
    async fn render_page(&self, page: usize) -> RenderResult<Arc<RenderedPage>>;
}

/// Render every page once, returned in ascending order
///
/// Up to `concurrency` pages are in flight at a time; results keep page
/// order regardless of completion order. The first failure aborts.
pub async fn render_pages(
    renderer: &dyn PageRenderer,
    concurrency: usize,
) -> RenderResult<Vec<Arc<RenderedPage>>> {
    stream::iter(1..=renderer.page_count())
        .map(|page| renderer.render_page(page))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEngineConfig {
    /// Maximum parse/extract operations running at once
    pub max_concurrent: usize,
    /// Per-operation timeout
    pub timeout: Duration,
    /// Rendered pages kept in the LRU cache
    pub page_cache_capacity: usize,
}

impl Default for RenderEngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            timeout: Duration::from_secs(30),
            page_cache_capacity: 256,
        }
    }
}

/// Shared render limits and page cache
///
/// Cloning is cheap; clones share the semaphore and cache.
#[derive(Clone)]
pub struct RenderEngine {
    config: RenderEngineConfig,
    permits: Arc<Semaphore>,
    pages: PageCache,
}

static ENGINE: OnceLock<RenderEngine> = OnceLock::new();

/// Initialize the process-wide engine (idempotent)
pub fn init(config: RenderEngineConfig) -> RenderEngine {
    let mut created = false;
    let engine = ENGINE.get_or_init(|| {
        created = true;
        RenderEngine::new(config.clone())
    });

    if created {
        tracing::info!(
            "Render engine initialized (max_concurrent={}, timeout={}s, page_cache={})",
            config.max_concurrent,
            config.timeout.as_secs(),
            config.page_cache_capacity
        );
    } else if engine.config != config {
        tracing::warn!("Render engine already initialized; ignoring new configuration");
    }

    engine.clone()
}

/// The process-wide engine, if [`init`] has run
pub fn global() -> Option<RenderEngine> {
    ENGINE.get().cloned()
}

impl RenderEngine {
    pub fn new(config: RenderEngineConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            pages: PageCache::new(config.page_cache_capacity),
            config,
        }
    }

    pub fn config(&self) -> &RenderEngineConfig {
        &self.config
    }

    pub fn page_cache(&self) -> &PageCache {
        &self.pages
    }

    /// Parse content into an opened, page-addressable document
    pub async fn open(&self, content: &DecodedContent) -> RenderResult<Arc<PdfPages>> {
        let bytes = content.shared();
        let parsed = self.run_blocking(move || pdf::parse(&bytes)).await?;
        let pages = PdfPages::new(content.digest().to_string(), parsed, self.clone());

        tracing::debug!(
            "Opened document {} with {} pages",
            &content.digest()[..12],
            pages.page_count()
        );
        Ok(Arc::new(pages))
    }

    /// Run CPU-bound work on the blocking pool under the engine limits
    ///
    /// The timeout covers waiting for a slot as well as the work itself. The
    /// slot stays taken until the work returns, even after its caller has
    /// given up.
    pub(crate) async fn run_blocking<T, F>(&self, f: F) -> RenderResult<T>
    where
        F: FnOnce() -> RenderResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let limit = self.config.timeout;
        let job = async {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .map_err(|e| RenderError::Task(e.to_string()))?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                f()
            })
            .await
            .map_err(|e| RenderError::Task(format!("Task join error: {}", e)))?
        };

        timeout(limit, job)
            .await
            .map_err(|_| RenderError::Timeout(limit))?
    }
}
