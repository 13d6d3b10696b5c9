//! Download and delete

use std::sync::Arc;

use crate::render::RenderedPage;
use crate::store::Partition;

use super::error::{Action, ActionError};
use super::{DocumentView, LoadedDocument};

/// Save-as payload for the loaded document
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Arc<Vec<u8>>,
    pub digest: String,
}

/// Where the user goes after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub location: String,
}

impl DocumentView {
    fn ensure_enabled(&self, action: Action) -> Result<(), ActionError> {
        let capabilities = self.capabilities();
        let enabled = match action {
            Action::Download => capabilities.can_download,
            Action::Delete => capabilities.can_delete,
        };
        if enabled {
            Ok(())
        } else {
            Err(ActionError::Disabled(action))
        }
    }

    fn require_loaded(&self) -> Result<Arc<LoadedDocument>, ActionError> {
        self.loaded().ok_or(ActionError::NotLoaded)
    }

    /// Hand the already-decoded content to the save flow
    ///
    /// Never touches the store.
    pub fn download(&self) -> Result<Download, ActionError> {
        self.ensure_enabled(Action::Download)?;
        let loaded = self.require_loaded()?;
        self.download_of(&loaded)
    }

    /// [`download`](Self::download) for a document obtained from this view
    pub fn download_of(&self, loaded: &LoadedDocument) -> Result<Download, ActionError> {
        self.ensure_enabled(Action::Download)?;

        let file_name = loaded.record.download_name();
        tracing::info!("Download of {} as {}", loaded.record.id, file_name);

        Ok(Download {
            file_name,
            content_type: RenderedPage::CONTENT_TYPE,
            bytes: loaded.content.shared(),
            digest: loaded.content.digest().to_string(),
        })
    }

    /// Delete the loaded document from `processing` and leave the view
    ///
    /// Finished documents are refused without a store call. On a store
    /// failure the view keeps showing the document.
    pub async fn delete(&self) -> Result<Navigation, ActionError> {
        self.ensure_enabled(Action::Delete)?;
        let loaded = self.require_loaded()?;
        self.delete_of(loaded).await
    }

    /// [`delete`](Self::delete) for a document obtained from this view
    ///
    /// The view is only reset if it still holds `loaded` afterwards.
    pub async fn delete_of(&self, loaded: Arc<LoadedDocument>) -> Result<Navigation, ActionError> {
        self.ensure_enabled(Action::Delete)?;
        let record = &loaded.record;

        if record.partition != Partition::Processing {
            tracing::warn!("Refusing to delete {} from {}", record.id, record.partition);
            return Err(ActionError::Unsupported(record.partition));
        }

        if let Err(e) = self.store.delete(Partition::Processing, &record.id).await {
            tracing::error!("Failed to delete {}: {}", record.id, e);
            return Err(e.into());
        }

        let evicted = self
            .engine
            .page_cache()
            .remove_document(loaded.content.digest());
        tracing::info!("Deleted {} ({} cached pages dropped)", record.id, evicted);

        self.release(&loaded);
        Ok(Navigation {
            location: self.options.home_route.clone(),
        })
    }
}
