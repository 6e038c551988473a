use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PacketErrorKind, Result, RtspError};
use crate::media::StreamStats;
use crate::media::jpeg_header::{FrameHeader, QuantTables};
use crate::media::mjpeg::JpegFragment;

/// A frame under reconstruction.
#[derive(Debug)]
struct FrameAccumulator {
    header: FrameHeader,
    timestamp: u32,
    scan: Vec<u8>,
}

/// A reassembled JPEG frame, ready for the decoder.
#[derive(Debug, Clone)]
pub struct JpegFrame {
    pub header: FrameHeader,
    pub timestamp: u32,
    scan: Vec<u8>,
}

impl JpegFrame {
    pub fn width(&self) -> u16 {
        self.header.width
    }

    pub fn height(&self) -> u16 {
        self.header.height
    }

    /// Concatenated scan data of every fragment, in arrival order.
    pub fn scan_data(&self) -> &[u8] {
        &self.scan
    }

    /// Complete JPEG image: synthesized header, scan data, EOI.
    pub fn to_jpeg(&self) -> Vec<u8> {
        self.header.assemble(&self.scan)
    }
}

/// Stitches RTP/JPEG fragments into frames (RFC 2435).
///
/// Holds at most one frame in flight. MJPEG frames are never interleaved
/// on the wire, so there is no per-timestamp pool:
///
/// - offset 0 opens a new frame; a frame already open is dropped as lost;
/// - a continuation is appended only if its offset equals the bytes
///   accumulated so far, otherwise the open frame is dropped;
/// - a continuation with no open frame is an orphan and is discarded;
/// - the marker bit closes the frame and [`push`](Self::push) returns it.
///
/// Nothing here is an error for the caller: loss and reordering are the
/// normal state of a UDP stream, and every case ends with the accumulator
/// in a consistent state for the next offset-0 fragment.
#[derive(Debug)]
pub struct MjpegReassembler {
    current: Option<FrameAccumulator>,
    /// In-band tables for Q 128..=254, which senders may omit on later
    /// frames (RFC 2435 §3.1.8).
    table_cache: HashMap<u8, QuantTables>,
    stats: Arc<StreamStats>,
}

impl MjpegReassembler {
    pub fn new() -> Self {
        Self::with_stats(Arc::new(StreamStats::default()))
    }

    pub fn with_stats(stats: Arc<StreamStats>) -> Self {
        Self {
            current: None,
            table_cache: HashMap::new(),
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<StreamStats> {
        &self.stats
    }

    /// Whether a frame is currently being accumulated.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    /// Feed one fragment. Returns the frame when this fragment completes it.
    pub fn push(&mut self, fragment: &JpegFragment<'_>) -> Option<JpegFrame> {
        if fragment.offset == 0 {
            if let Some(dropped) = self.current.take() {
                tracing::warn!(
                    seq = fragment.sequence,
                    timestamp = dropped.timestamp,
                    len = dropped.scan.len(),
                    "new frame started before previous completed, dropping it"
                );
                self.stats.record_frame_dropped();
            }

            let tables = match self.resolve_tables(fragment) {
                Ok(tables) => tables,
                Err(e) => {
                    tracing::warn!(seq = fragment.sequence, error = %e, "cannot start frame");
                    self.stats.record_frame_dropped();
                    return None;
                }
            };

            tracing::debug!(
                seq = fragment.sequence,
                len = fragment.data.len(),
                width = fragment.width,
                height = fragment.height,
                "first fragment"
            );

            self.current = Some(FrameAccumulator {
                header: FrameHeader {
                    subsampling: fragment.subsampling,
                    width: fragment.width,
                    height: fragment.height,
                    restart_interval: fragment.restart_interval,
                    tables,
                },
                timestamp: fragment.timestamp,
                scan: fragment.data.to_vec(),
            });
        } else {
            let Some(frame) = self.current.as_mut() else {
                tracing::debug!(
                    seq = fragment.sequence,
                    offset = fragment.offset,
                    "fragment without a frame, discarding"
                );
                self.stats.record_orphan();
                return None;
            };

            if fragment.offset as usize != frame.scan.len() {
                tracing::warn!(
                    seq = fragment.sequence,
                    offset = fragment.offset,
                    expected = frame.scan.len(),
                    "fragment gap, dropping frame"
                );
                self.current = None;
                self.stats.record_frame_dropped();
                return None;
            }

            tracing::trace!(seq = fragment.sequence, len = fragment.data.len(), "fragment");
            frame.scan.extend_from_slice(fragment.data);
        }

        if !fragment.last {
            return None;
        }

        let frame = self.current.take()?;
        self.stats.record_frame_completed();
        Some(JpegFrame {
            header: frame.header,
            timestamp: frame.timestamp,
            scan: frame.scan,
        })
    }

    fn resolve_tables(&mut self, fragment: &JpegFragment<'_>) -> Result<QuantTables> {
        let q = fragment.q;
        if q < 128 {
            return Ok(QuantTables::from_q_factor(q));
        }

        match fragment.quant {
            Some(quant) if !quant.tables.is_empty() => {
                if quant.precision != 0 {
                    return Err(RtspError::packet(PacketErrorKind::UnsupportedPrecision));
                }
                let tables = QuantTables::from_inband(quant.tables)
                    .ok_or(RtspError::packet(PacketErrorKind::TooShort))?;
                if q != 255 {
                    self.table_cache.insert(q, tables.clone());
                }
                Ok(tables)
            }
            _ => self
                .table_cache
                .get(&q)
                .cloned()
                .ok_or(RtspError::packet(PacketErrorKind::MissingQuantTables(q))),
        }
    }
}

impl Default for MjpegReassembler {
    fn default() -> Self {
        Self::new()
    }
}
