//! Backend cart mirroring.
//!
//! The backend copy trails local state and is only eventually consistent;
//! reads never consult it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use samagri::cart::CartId;

use crate::api::CartsApi;
use crate::cart::document::CartDocument;
use crate::notify::{Notice, Notices};

enum Command {
    Upsert(CartDocument),
    Delete(CartId),
    Close,
}

/// Fire-and-forget replication of local cart state to the backend.
///
/// One worker task applies commands strictly in submission order. Failures
/// surface as [`Notice::SyncFailed`] and are otherwise dropped; the local
/// store stays the source of truth either way.
#[derive(Debug, Clone)]
pub struct MirrorSync {
    tx: mpsc::UnboundedSender<Command>,
}

impl MirrorSync {
    /// Spawn the mirror worker on the current runtime.
    ///
    /// The returned handle resolves once [`MirrorSync::close`] has been
    /// called and every previously queued command has been attempted.
    #[must_use]
    pub fn spawn(api: Arc<dyn CartsApi>, notices: Notices) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(run(api, notices, rx));

        (MirrorSync { tx }, worker)
    }

    /// Queue a full-cart upsert.
    pub fn upsert(&self, document: CartDocument) {
        self.send(Command::Upsert(document));
    }

    /// Queue a backend-side cart deletion.
    pub fn delete(&self, id: CartId) {
        self.send(Command::Delete(id));
    }

    /// Ask the worker to exit once already queued commands have drained.
    pub fn close(&self) {
        self.send(Command::Close);
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("cart mirror worker is gone, dropping command");
        }
    }
}

async fn run(api: Arc<dyn CartsApi>, notices: Notices, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Upsert(document) => match api.upsert_cart(&document).await {
                Ok(()) => debug!(cart_id = %document.cart_id, "cart mirrored"),
                Err(error) => {
                    warn!(%error, cart_id = %document.cart_id, "cart mirror upsert failed");

                    notices.publish(Notice::SyncFailed {
                        operation: "upsert",
                        reason: error.to_string(),
                    });
                }
            },
            Command::Delete(id) => {
                if let Err(error) = api.delete_cart(&id).await {
                    warn!(%error, cart_id = %id, "cart mirror delete failed");

                    notices.publish(Notice::SyncFailed {
                        operation: "delete",
                        reason: error.to_string(),
                    });
                }
            }
            Command::Close => break,
        }
    }
}
