//! RTP depacketization and Motion-JPEG frame recovery.
//!
//! Datagrams from the RTP socket flow through these stages:
//!
//! 1. [`rtp::RtpPacket`] strips the RFC 3550 fixed header, CSRCs,
//!    header extension and padding.
//! 2. [`mjpeg::JpegFragment`] parses the RFC 2435 payload headers.
//! 3. [`reassembler::MjpegReassembler`] stitches fragments into a frame.
//! 4. [`jpeg_header::FrameHeader`] rebuilds the JFIF markers the sender
//!    stripped, so the frame is a standalone JPEG image.
//! 5. A [`decoder::JpegDecoder`] turns it into BGRA pixels.
//!
//! [`receiver::RtpReceiver`] wires the stages together on the worker thread.
//!
//! ## Supported payloads
//!
//! | Codec | Module | RFC | Status |
//! |-------|--------|-----|--------|
//! | MJPEG | [`mjpeg`] | [RFC 2435](https://tools.ietf.org/html/rfc2435) | Types 0, 1, 64, 65 |

pub mod decoder;
pub mod jpeg_header;
pub mod mjpeg;
pub mod reassembler;
pub mod receiver;
pub mod rtp;

use std::sync::atomic::{AtomicU64, Ordering};

pub use decoder::{JpegDecoder, SoftwareJpegDecoder};
pub use reassembler::{JpegFrame, MjpegReassembler};
pub use receiver::{RtcpReceiver, RtpReceiver};

/// Receive-path counters, shared between the RTP worker and the client.
#[derive(Debug, Default)]
pub struct StreamStats {
    packets_received: AtomicU64,
    frames_completed: AtomicU64,
    frames_dropped: AtomicU64,
    orphan_fragments: AtomicU64,
    decode_failures: AtomicU64,
}

impl StreamStats {
    pub fn record_packet(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_completed(&self) {
        self.frames_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_orphan(&self) {
        self.orphan_fragments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            packets_received: self.packets_received.load(Ordering::Relaxed),
            frames_completed: self.frames_completed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            orphan_fragments: self.orphan_fragments.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`StreamStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Datagrams read from the RTP socket, valid or not.
    pub packets_received: u64,
    pub frames_completed: u64,
    /// Frames abandoned on a restart, an offset gap or missing tables.
    pub frames_dropped: u64,
    /// Continuation fragments seen with no frame open.
    pub orphan_fragments: u64,
    pub decode_failures: u64,
}
