//! Active streaming clients and the per-tick fan-out.

use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tracing::debug;
use uuid::Uuid;

use super::push;
use crate::frame::ExposedFrame;

/// Channel buffer size for each client.
/// Larger buffer allows clients to handle temporary slowdowns without being disconnected.
pub(crate) const CLIENT_BUFFER_SIZE: usize = 5;

/// Number of consecutive send failures before removing a client.
/// This prevents dropping clients due to momentary network hiccups.
pub(crate) const MAX_CONSECUTIVE_FAILURES: u8 = 10;

/// One registered `/stream` client.
struct StreamClient {
    sender: Sender<Bytes>,
    need_initial: bool,
    consecutive_failures: u8,
    connected_at: Instant,
}

/// Registry of active streaming clients, keyed by client id.
///
/// Removal is O(1) and idempotent. The registry is only mutated from the
/// refresh task and the per-connection disconnect paths; the surrounding
/// lock is never held across an await point.
#[derive(Default)]
pub struct ClientRegistry {
    clients: HashMap<Uuid, StreamClient>,
}

impl ClientRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a new client; returns its id and the receiving end its
    /// connection task drains.
    pub(crate) fn add(&mut self) -> (Uuid, Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER_SIZE);
        let id = Uuid::new_v4();
        self.clients.insert(
            id,
            StreamClient {
                sender: tx,
                need_initial: true,
                consecutive_failures: 0,
                connected_at: Instant::now(),
            },
        );
        (id, rx)
    }

    /// Remove a client. Harmless when the client is already gone.
    pub(crate) fn remove(&mut self, id: &Uuid) -> bool {
        if let Some(client) = self.clients.remove(id) {
            debug!(
                "Stream client {} removed after {:.1}s",
                id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    /// Drop every client sender; their connection tasks then close the
    /// sockets.
    pub(crate) fn clear(&mut self) {
        self.clients.clear();
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Push the current frame to every client.
    ///
    /// Each client gets its own buffer with the timestamp sampled at write
    /// time; the preamble is prepended for clients that have not received
    /// it yet. Clients whose channel is closed are removed immediately;
    /// clients whose channel stays full are removed after
    /// [`MAX_CONSECUTIVE_FAILURES`] attempts.
    pub(crate) fn fan_out(&mut self, frame: &ExposedFrame) {
        if self.clients.is_empty() {
            return;
        }
        self.clients.retain(|id, client| {
            let mut payload = BytesMut::new();
            if client.need_initial {
                payload.extend_from_slice(push::PREAMBLE);
            }
            push::write_part(&mut payload, frame.data(), &push::now_timestamp());

            match client.sender.try_send(payload.freeze()) {
                Ok(()) => {
                    client.need_initial = false;
                    client.consecutive_failures = 0;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    client.consecutive_failures += 1;
                    if client.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        debug!(
                            "Removing slow stream client {} after {} consecutive failures",
                            id, MAX_CONSECUTIVE_FAILURES
                        );
                        false
                    } else {
                        true
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Stream client {} channel closed", id);
                    false
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame() -> ExposedFrame {
        let mut frame = ExposedFrame::new();
        frame.copy_from(&[0xFF, 0xD8, 0xFF, 0xD9], 2, 1, true);
        frame
    }

    #[test]
    fn test_add_and_remove() {
        let mut registry = ClientRegistry::new();
        assert!(registry.is_empty());

        let (id, _rx) = registry.add();
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&id));
        assert!(registry.is_empty());

        // Double removal must be harmless
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_first_fan_out_carries_preamble() {
        let mut registry = ClientRegistry::new();
        let (_id, mut rx) = registry.add();
        let frame = test_frame();

        registry.fan_out(&frame);
        let first = rx.recv().await.unwrap();
        assert!(first.starts_with(push::PREAMBLE));

        registry.fan_out(&frame);
        let second = rx.recv().await.unwrap();
        assert!(second.starts_with(b"Content-Type: image/jpeg\r\n"));
    }

    #[tokio::test]
    async fn test_closed_receiver_is_evicted() {
        let mut registry = ClientRegistry::new();
        let (_id, rx) = registry.add();
        drop(rx);

        registry.fan_out(&test_frame());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_slow_client_is_evicted_after_threshold() {
        let mut registry = ClientRegistry::new();
        let (_id, _rx) = registry.add();
        let frame = test_frame();

        // Fill the channel, then keep failing without draining it
        for _ in 0..CLIENT_BUFFER_SIZE {
            registry.fan_out(&frame);
        }
        assert_eq!(registry.len(), 1);

        for _ in 0..MAX_CONSECUTIVE_FAILURES - 1 {
            registry.fan_out(&frame);
            assert_eq!(registry.len(), 1);
        }
        registry.fan_out(&frame);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_drain_resets_failure_count() {
        let mut registry = ClientRegistry::new();
        let (_id, mut rx) = registry.add();
        let frame = test_frame();

        for _ in 0..CLIENT_BUFFER_SIZE {
            registry.fan_out(&frame);
        }
        // A few failures, then the client catches up
        for _ in 0..3 {
            registry.fan_out(&frame);
        }
        while rx.try_recv().is_ok() {}

        for _ in 0..MAX_CONSECUTIVE_FAILURES - 1 {
            registry.fan_out(&frame);
            while rx.try_recv().is_ok() {}
        }
        assert_eq!(registry.len(), 1);
    }
}
