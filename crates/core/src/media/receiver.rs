use std::sync::Arc;

use crate::frame::FrameSlot;
use crate::media::StreamStats;
use crate::media::decoder::JpegDecoder;
use crate::media::mjpeg::JpegFragment;
use crate::media::reassembler::MjpegReassembler;
use crate::media::rtp::RtpPacket;
use crate::transport::PacketHandler;

/// RTP handler: parse, reassemble, decode, publish.
///
/// Runs on the RTP worker thread and owns the reassembler, so no lock is
/// taken until a decoded frame is published to the [`FrameSlot`].
pub struct RtpReceiver {
    reassembler: MjpegReassembler,
    decoder: Arc<dyn JpegDecoder>,
    slot: FrameSlot,
    stats: Arc<StreamStats>,
    /// Payload type negotiated via DESCRIBE; other types are ignored.
    payload_type: Option<u8>,
}

impl RtpReceiver {
    pub fn new(
        decoder: Arc<dyn JpegDecoder>,
        slot: FrameSlot,
        stats: Arc<StreamStats>,
        payload_type: Option<u8>,
    ) -> Self {
        Self {
            reassembler: MjpegReassembler::with_stats(stats.clone()),
            decoder,
            slot,
            stats,
            payload_type,
        }
    }
}

impl PacketHandler for RtpReceiver {
    fn handle_packet(&mut self, data: &[u8]) {
        self.stats.record_packet();

        let packet = match RtpPacket::parse(data) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(len = data.len(), error = %e, "dropping malformed RTP packet");
                return;
            }
        };

        if let Some(pt) = self.payload_type
            && packet.payload_type != pt
        {
            tracing::trace!(
                payload_type = packet.payload_type,
                expected = pt,
                "ignoring RTP packet with unexpected payload type"
            );
            return;
        }

        let fragment = match JpegFragment::parse(&packet) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(seq = packet.sequence, error = %e, "dropping malformed JPEG fragment");
                return;
            }
        };

        let Some(frame) = self.reassembler.push(&fragment) else {
            return;
        };

        let jpeg = frame.to_jpeg();
        match self.decoder.decode(&jpeg) {
            Ok(decoded) => {
                tracing::debug!(
                    len = jpeg.len(),
                    width = decoded.width,
                    height = decoded.height,
                    "frame decoded"
                );
                self.slot.publish(decoded);
            }
            Err(e) => {
                tracing::error!(len = jpeg.len(), error = %e, "failed to decode frame");
                self.stats.record_decode_failure();
            }
        }
    }
}

/// RTCP handler.
///
/// Sender and receiver reports are not processed yet; packets are only
/// logged. The handler exists so the RTCP socket is drained like the RTP
/// one and report handling has a place to go.
#[derive(Debug, Default)]
pub struct RtcpReceiver;

impl PacketHandler for RtcpReceiver {
    fn handle_packet(&mut self, data: &[u8]) {
        // second byte of the common header is the packet type (RFC 3550 §6.4)
        tracing::trace!(len = data.len(), packet_type = data.get(1), "RTCP packet");
    }
}
