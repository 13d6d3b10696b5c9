//! Per-viewer views
//!
//! Each viewer gets its own [`DocumentView`], so navigation and stale-result
//! handling never cross between users. Views are kept in an LRU; an evicted
//! view is reset, which discards anything it still had in flight.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::render::RenderEngine;
use crate::store::DocumentStore;

use super::{DocumentView, ViewOptions};

/// Bounded map of viewer key to view
pub struct ViewRegistry {
    store: Arc<dyn DocumentStore>,
    engine: RenderEngine,
    options: ViewOptions,
    views: Mutex<LruCache<String, Arc<DocumentView>>>,
}

impl ViewRegistry {
    /// Create a registry holding at most `capacity` views (minimum 1)
    pub fn new(
        store: Arc<dyn DocumentStore>,
        engine: RenderEngine,
        options: ViewOptions,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            engine,
            options,
            views: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The view for `viewer`, created on first use
    pub fn view_for(&self, viewer: &str) -> Arc<DocumentView> {
        let mut views = self.views.lock();
        if let Some(view) = views.get(viewer) {
            return Arc::clone(view);
        }

        let view = Arc::new(DocumentView::new(
            Arc::clone(&self.store),
            self.engine.clone(),
            self.options.clone(),
        ));
        if let Some((evicted, old)) = views.push(viewer.to_string(), Arc::clone(&view)) {
            if evicted != viewer {
                tracing::debug!("Evicting view for {}", evicted);
                old.reset();
            }
        }
        view
    }

    pub fn len(&self) -> usize {
        self.views.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.views.lock().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderEngineConfig;
    use crate::testing::seeded_store;
    use crate::view::{ViewStatus, ViewUpdate};

    fn registry(capacity: usize) -> ViewRegistry {
        ViewRegistry::new(
            seeded_store(),
            RenderEngine::new(RenderEngineConfig::default()),
            ViewOptions::default(),
            capacity,
        )
    }

    #[test]
    fn test_same_viewer_same_view() {
        let registry = registry(4);

        let a = registry.view_for("alice");
        let b = registry.view_for("alice");
        let c = registry.view_for("bob");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_viewers_are_isolated() {
        let registry = registry(4);

        registry.view_for("alice").navigate("doc123").await;
        registry.view_for("bob").navigate("doc999").await;

        assert!(registry.view_for("alice").state().is_ready());
        assert_eq!(registry.view_for("bob").state().status, ViewStatus::NotFound);
    }

    #[tokio::test]
    async fn test_eviction_resets_view() {
        let registry = registry(1);

        let alice = registry.view_for("alice");
        assert!(matches!(alice.navigate("doc123").await, ViewUpdate::Current(_)));

        registry.view_for("bob");

        assert_eq!(registry.len(), 1);
        assert_eq!(alice.state().status, ViewStatus::Idle);
        assert!(alice.loaded().is_none());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        assert_eq!(registry(0).capacity(), 1);
    }
}
