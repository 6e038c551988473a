//! Hand-off of decoded frames from the RTP worker to the host.

use std::sync::Arc;

use parking_lot::Mutex;

/// A decoded image, BGRA8 (4 bytes per pixel, row-major, no padding).
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Latest-frame slot shared between the RTP worker and the consumer.
///
/// Overwrite semantics: [`publish`](Self::publish) replaces any frame the
/// consumer has not taken yet, and [`take`](Self::take) clears the slot.
/// A single mutex covers both sides; holding a frame is the "ready" flag.
#[derive(Clone, Default)]
pub struct FrameSlot {
    latest: Arc<Mutex<Option<DecodedFrame>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame, superseding any unread one.
    pub fn publish(&self, frame: DecodedFrame) {
        if self.latest.lock().replace(frame).is_some() {
            tracing::trace!("unread frame superseded");
        }
    }

    /// Take the latest frame if one arrived since the last call.
    pub fn take(&self) -> Option<DecodedFrame> {
        self.latest.lock().take()
    }

    pub fn is_ready(&self) -> bool {
        self.latest.lock().is_some()
    }
}
