//! Shared state handed to every server task.

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use super::registry::ClientRegistry;
use crate::frame::ExposedFrame;
use crate::source::StreamSource;

/// Read-only copy of the exposed frame taken at a single point in time.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub online: bool,
}

/// State shared between the refresh scheduler, the request handlers and
/// the per-connection tasks.
///
/// The exposed frame is written only by the refresh scheduler; handlers
/// take snapshots under the read lock. Neither lock is ever held across
/// an await point or socket write.
pub struct RelayState {
    source: Arc<StreamSource>,
    exposed: RwLock<ExposedFrame>,
    registry: Mutex<ClientRegistry>,
}

impl RelayState {
    pub(crate) fn new(source: Arc<StreamSource>) -> Self {
        Self {
            source,
            exposed: RwLock::new(ExposedFrame::new()),
            registry: Mutex::new(ClientRegistry::new()),
        }
    }

    /// The producer-shared frame source this server consumes.
    pub fn source(&self) -> &Arc<StreamSource> {
        &self.source
    }

    /// Number of currently registered streaming clients.
    pub fn client_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Copy out the current frame, its geometry and the online flag.
    pub fn frame_snapshot(&self) -> FrameSnapshot {
        let exposed = self.exposed.read();
        FrameSnapshot {
            data: Bytes::copy_from_slice(exposed.data()),
            width: exposed.width(),
            height: exposed.height(),
            online: exposed.online(),
        }
    }

    pub(crate) fn exposed(&self) -> &RwLock<ExposedFrame> {
        &self.exposed
    }

    pub(crate) fn registry(&self) -> &Mutex<ClientRegistry> {
        &self.registry
    }
}
