//! RTP/JPEG payload format (RFC 2435).
//!
//! Every RTP/JPEG payload starts with an 8-byte main header:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | Type-specific |              Fragment Offset                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Type     |       Q       |     Width     |     Height    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! followed by, in order and only when applicable:
//!
//! - a 4-byte restart marker header, for types 64–127 (§3.1.7);
//! - a quantization table header plus tables, when Q ≥ 128 and the
//!   fragment offset is 0 (§3.1.8);
//! - the entropy-coded scan data fragment.
//!
//! Width and height travel in units of 8 pixels. Types 0 and 1 (and their
//! restart-marker variants 64 and 65) are the only ones defined by the RFC;
//! anything else is rejected.

use crate::error::{PacketErrorKind, Result, RtspError};
use crate::media::rtp::RtpPacket;

/// Static RTP payload type for JPEG (RFC 3551 §6).
pub const JPEG_PAYLOAD_TYPE: u8 = 26;

const MAIN_HEADER_LEN: usize = 8;
const RESTART_HEADER_LEN: usize = 4;
const QUANT_HEADER_LEN: usize = 4;

/// Chroma subsampling of the frame, from the RFC 2435 type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsampling {
    /// Type 0: Y sampled 2×1 relative to chroma.
    Yuv422,
    /// Type 1: Y sampled 2×2 relative to chroma.
    Yuv420,
}

/// In-band quantization tables carried by the first fragment (§3.1.8).
#[derive(Debug, Clone, Copy)]
pub struct QuantTableHeader<'a> {
    /// One bit per table; set means 16-bit entries.
    pub precision: u8,
    /// Concatenated tables, zigzag order. Empty when the sender relies on
    /// tables cached from an earlier frame.
    pub tables: &'a [u8],
}

/// One RTP/JPEG fragment, decomposed from its RTP packet.
#[derive(Debug, Clone, Copy)]
pub struct JpegFragment<'a> {
    pub sequence: u16,
    pub timestamp: u32,
    /// Byte offset of [`data`](Self::data) within the frame's scan data.
    pub offset: u32,
    /// Marker bit: this fragment completes the frame.
    pub last: bool,
    pub subsampling: Subsampling,
    pub q: u8,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Restart interval in MCUs, 0 when the type carries no restart markers.
    pub restart_interval: u16,
    pub quant: Option<QuantTableHeader<'a>>,
    /// Scan data fragment.
    pub data: &'a [u8],
}

impl<'a> JpegFragment<'a> {
    pub fn parse(packet: &RtpPacket<'a>) -> Result<Self> {
        let payload = packet.payload;
        if payload.len() < MAIN_HEADER_LEN {
            return Err(RtspError::packet(PacketErrorKind::TooShort));
        }

        let offset = u32::from_be_bytes([0, payload[1], payload[2], payload[3]]);
        let jpeg_type = payload[4];
        let q = payload[5];
        let width = payload[6] as u16 * 8;
        let height = payload[7] as u16 * 8;

        let subsampling = match jpeg_type & 0x3f {
            0 if jpeg_type < 128 => Subsampling::Yuv422,
            1 if jpeg_type < 128 => Subsampling::Yuv420,
            _ => {
                return Err(RtspError::packet(PacketErrorKind::UnsupportedJpegType(
                    jpeg_type,
                )));
            }
        };

        let mut rest = &payload[MAIN_HEADER_LEN..];

        let mut restart_interval = 0;
        if jpeg_type >= 64 {
            if rest.len() < RESTART_HEADER_LEN {
                return Err(RtspError::packet(PacketErrorKind::TooShort));
            }
            restart_interval = u16::from_be_bytes([rest[0], rest[1]]);
            rest = &rest[RESTART_HEADER_LEN..];
        }

        let mut quant = None;
        if q >= 128 && offset == 0 {
            if rest.len() < QUANT_HEADER_LEN {
                return Err(RtspError::packet(PacketErrorKind::TooShort));
            }
            let precision = rest[1];
            let length = u16::from_be_bytes([rest[2], rest[3]]) as usize;
            rest = &rest[QUANT_HEADER_LEN..];
            if rest.len() < length {
                return Err(RtspError::packet(PacketErrorKind::TooShort));
            }
            quant = Some(QuantTableHeader {
                precision,
                tables: &rest[..length],
            });
            rest = &rest[length..];
        }

        Ok(JpegFragment {
            sequence: packet.sequence,
            timestamp: packet.timestamp,
            offset,
            last: packet.marker,
            subsampling,
            q,
            width,
            height,
            restart_interval,
            quant,
            data: rest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(payload: &[u8], marker: bool) -> RtpPacket<'_> {
        RtpPacket {
            marker,
            payload_type: JPEG_PAYLOAD_TYPE,
            sequence: 7,
            timestamp: 3000,
            ssrc: 1,
            payload,
        }
    }

    #[test]
    fn parses_main_header() {
        let payload = [0, 0x01, 0x02, 0x03, 1, 50, 80, 60, 0xAA, 0xBB];
        let frag = JpegFragment::parse(&packet(&payload, true)).unwrap();
        assert_eq!(frag.offset, 0x010203);
        assert_eq!(frag.subsampling, Subsampling::Yuv420);
        assert_eq!(frag.q, 50);
        assert_eq!(frag.width, 640);
        assert_eq!(frag.height, 480);
        assert_eq!(frag.restart_interval, 0);
        assert!(frag.quant.is_none());
        assert!(frag.last);
        assert_eq!(frag.data, &[0xAA, 0xBB]);
    }

    #[test]
    fn parses_restart_header() {
        let payload = [0, 0, 0, 0, 64, 50, 2, 1, 0x00, 0x10, 0xff, 0xff, 0xCC];
        let frag = JpegFragment::parse(&packet(&payload, false)).unwrap();
        assert_eq!(frag.subsampling, Subsampling::Yuv422);
        assert_eq!(frag.restart_interval, 16);
        assert_eq!(frag.data, &[0xCC]);
    }

    #[test]
    fn parses_inband_quant_tables_on_first_fragment() {
        let mut payload = vec![0, 0, 0, 0, 0, 255, 2, 1, 0, 0, 0, 128];
        payload.extend(std::iter::repeat_n(3u8, 128));
        payload.push(0xDD);
        let frag = JpegFragment::parse(&packet(&payload, false)).unwrap();
        let quant = frag.quant.unwrap();
        assert_eq!(quant.precision, 0);
        assert_eq!(quant.tables.len(), 128);
        assert_eq!(frag.data, &[0xDD]);
    }

    #[test]
    fn no_quant_header_after_first_fragment() {
        let payload = [0, 0, 0, 10, 0, 255, 2, 1, 0xEE];
        let frag = JpegFragment::parse(&packet(&payload, true)).unwrap();
        assert!(frag.quant.is_none());
        assert_eq!(frag.data, &[0xEE]);
    }

    #[test]
    fn rejects_unknown_type() {
        let payload = [0, 0, 0, 0, 2, 50, 2, 1];
        assert!(matches!(
            JpegFragment::parse(&packet(&payload, true)),
            Err(RtspError::Packet {
                kind: PacketErrorKind::UnsupportedJpegType(2)
            })
        ));
    }

    #[test]
    fn rejects_truncated_quant_tables() {
        let payload = [0, 0, 0, 0, 0, 255, 2, 1, 0, 0, 0, 128, 1, 2];
        assert!(JpegFragment::parse(&packet(&payload, false)).is_err());
    }
}
