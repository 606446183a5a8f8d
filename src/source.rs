//! Producer-shared frame state.
//!
//! The capture component runs on its own thread and hands frames to the
//! HTTP side exclusively through this structure: one mutex over the latest
//! picture plus an `updated` flag. The refresh scheduler drains it with
//! [`StreamSource::try_consume`], holding the lock no longer than one
//! memcpy.

use parking_lot::Mutex;

use crate::frame::ExposedFrame;

/// What a consume attempt found under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// A new frame was copied into the destination and marked online.
    Fresh,
    /// The producer flagged itself offline (empty picture). The caller is
    /// expected to install the blank frame outside the source lock.
    Offline,
    /// Nothing new since the last consume.
    Unchanged,
}

#[derive(Debug, Default)]
struct SourceInner {
    picture: Vec<u8>,
    width: u32,
    height: u32,
    updated: bool,
}

/// Shared hand-off point between the producer thread and the event loop.
#[derive(Debug, Default)]
pub struct StreamSource {
    inner: Mutex<SourceInner>,
}

impl StreamSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: publish a captured JPEG.
    ///
    /// The internal buffer only ever grows, matching the exposed frame's
    /// allocation policy.
    pub fn publish(&self, bytes: &[u8], width: u32, height: u32) {
        let mut inner = self.inner.lock();
        inner.picture.clear();
        inner.picture.extend_from_slice(bytes);
        inner.width = width;
        inner.height = height;
        inner.updated = true;
    }

    /// Producer side: signal that capture is unavailable.
    ///
    /// An update with an empty picture is the offline marker.
    pub fn set_offline(&self) {
        let mut inner = self.inner.lock();
        inner.picture.clear();
        inner.updated = true;
    }

    /// Consumer side: drain the latest update into `dest`, if any.
    ///
    /// The decision and the copy happen in a single lock acquisition, and
    /// `updated` is cleared in that same acquisition, so a producer write
    /// racing with the consume is never lost. On [`ConsumeOutcome::Offline`]
    /// the destination is left untouched; the caller installs the blank
    /// frame after the lock is released.
    pub fn try_consume(&self, dest: &mut ExposedFrame) -> ConsumeOutcome {
        let mut inner = self.inner.lock();
        if !inner.updated {
            return ConsumeOutcome::Unchanged;
        }
        inner.updated = false;
        if inner.picture.is_empty() {
            return ConsumeOutcome::Offline;
        }
        dest.copy_from(&inner.picture, inner.width, inner.height, true);
        ConsumeOutcome::Fresh
    }
}
