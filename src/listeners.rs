//! Listener installation guard
//!
//! Page content can replace its document (`document.open()`, a new
//! navigation in a frame), which silently drops the recorder's DOM
//! listeners. The registry remembers which documents already carry them and
//! a re-arm loop polls the host to re-install on fresh documents.
//!
//! The host is the live browser bridge that also drives
//! [`PageRecorder`](crate::interpreter::PageRecorder). Offline replay has no
//! documents and does not use the registry.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use soulbrowser_core_types::{DocumentId, SoulError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[async_trait]
pub trait ListenerHost: Send + Sync {
    /// Document currently loaded, `None` while the frame has none
    async fn current_document(&self) -> Option<DocumentId>;

    async fn install_listeners(&self, document: &DocumentId) -> Result<(), SoulError>;
}

#[derive(Clone, Default)]
pub struct ListenerRegistry {
    installed: Arc<Mutex<HashSet<DocumentId>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self, document: &DocumentId) -> bool {
        self.installed.lock().contains(document)
    }

    pub fn installed_count(&self) -> usize {
        self.installed.lock().len()
    }

    /// Installs listeners on the host's current document unless already
    /// done. Returns whether an install happened.
    pub async fn ensure_installed(&self, host: &dyn ListenerHost) -> Result<bool, SoulError> {
        let Some(document) = host.current_document().await else {
            return Ok(false);
        };
        if self.is_installed(&document) {
            return Ok(false);
        }
        host.install_listeners(&document).await?;
        debug!(document = %document.0, "recorder listeners installed");
        self.installed.lock().insert(document);
        Ok(true)
    }

    /// Re-checks the host every `interval` until `cancel` fires.
    pub fn spawn_rearm(
        &self,
        host: Arc<dyn ListenerHost>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = registry.ensure_installed(host.as_ref()).await {
                            warn!(%err, "failed to install recorder listeners");
                        }
                    }
                }
            }
        })
    }
}
