//! Shared helpers for API tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, Response};
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use docdesk_server::config::Config;
use docdesk_server::document::encode;
use docdesk_server::render::{RenderEngine, RenderEngineConfig};
use docdesk_server::state::AppState;
use docdesk_server::store::{DocumentStore, MemoryStore, Partition, StoreResult, StoredRecord};

/// A PDF with `num_pages` US Letter pages
pub fn sample_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = vec![];
    for i in 1..=num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 18.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Request page {}", i).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn record(file_name: Option<&str>, num_pages: u32) -> StoredRecord {
    StoredRecord::new(file_name, encode(&sample_pdf(num_pages)))
}

/// `doc123` finished with 3 pages, `req7` processing with 2
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert(Partition::Finished, "doc123", record(Some("Request_Form.pdf"), 3));
    store.insert(Partition::Processing, "req7", record(None, 2));
    store
}

/// Holds the first read of one id until released
pub struct GatedStore {
    inner: Arc<MemoryStore>,
    gated_id: &'static str,
    gated: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryStore>, gated_id: &'static str) -> Self {
        Self {
            inner,
            gated_id,
            gated: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    fn backend(&self) -> &'static str {
        "gated"
    }

    async fn get(&self, partition: Partition, id: &str) -> StoreResult<Option<StoredRecord>> {
        if id == self.gated_id && !self.gated.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.get(partition, id).await
    }

    async fn delete(&self, partition: Partition, id: &str) -> StoreResult<()> {
        self.inner.delete(partition, id).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub memory: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let memory = seeded_store();
        Self::with_store(config, memory.clone(), memory)
    }

    /// App over `store`; `memory` is the backing data tests inspect
    pub fn with_store(
        config: Config,
        memory: Arc<MemoryStore>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let engine = RenderEngine::new(RenderEngineConfig::default());
        let state = AppState::new(config, store, engine);
        Self {
            router: docdesk_server::app(state.clone()),
            state,
            memory,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(viewer_request(Method::GET, uri)).await
    }

    pub async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(viewer_request(Method::DELETE, uri)).await
    }

    /// Issue a GET in the background
    pub fn spawn_get(&self, uri: &str) -> JoinHandle<Response<Body>> {
        let router = self.router.clone();
        let request = viewer_request(Method::GET, uri);
        tokio::spawn(async move { router.oneshot(request).await.unwrap() })
    }
}

fn viewer_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-viewer-id", "test-viewer")
        .header("x-user-name", "Dana Reyes")
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
