//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::render::RenderEngine;
use crate::store::{DocumentStore, InstrumentedStore};
use crate::view::{DocumentView, ViewRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<InstrumentedStore>,
    engine: RenderEngine,
    views: ViewRegistry,
}

impl AppState {
    /// Create the application state
    ///
    /// The store is wrapped for instrumentation; every view shares it.
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, engine: RenderEngine) -> Self {
        let store = Arc::new(InstrumentedStore::new(store));
        let views = ViewRegistry::new(
            store.clone(),
            engine.clone(),
            config.view_options(),
            config.view.sessions_max,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                engine,
                views,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the instrumented store
    pub fn store(&self) -> &InstrumentedStore {
        &self.inner.store
    }

    /// Get the render engine
    pub fn engine(&self) -> &RenderEngine {
        &self.inner.engine
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.inner.views
    }

    /// The view serving `viewer`
    pub fn view_for(&self, viewer: &str) -> Arc<DocumentView> {
        self.inner.views.view_for(viewer)
    }
}
