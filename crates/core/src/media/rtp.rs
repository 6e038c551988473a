use crate::error::{PacketErrorKind, Result, RtspError};

/// Size of the RTP fixed header in bytes.
pub const RTP_HEADER_LEN: usize = 12;

/// A parsed RTP packet borrowing its datagram (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    CSRC list (CC × 32 bits)                   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// CSRC identifiers and the header extension (X bit) are skipped, and
/// trailing padding (P bit) is stripped, so [`payload`](Self::payload) is
/// exactly the codec payload.
#[derive(Debug, Clone, Copy)]
pub struct RtpPacket<'a> {
    /// Marker bit. For RTP/JPEG, set on the last fragment of a frame
    /// (RFC 2435 §3).
    pub marker: bool,
    /// RTP payload type (7-bit, RFC 3551).
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub payload: &'a [u8],
}

impl<'a> RtpPacket<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < RTP_HEADER_LEN {
            return Err(RtspError::packet(PacketErrorKind::TooShort));
        }

        let version = data[0] >> 6;
        if version != 2 {
            return Err(RtspError::packet(PacketErrorKind::UnsupportedVersion(
                version,
            )));
        }

        let padding = data[0] & 0x20 != 0;
        let extension = data[0] & 0x10 != 0;
        let csrc_count = (data[0] & 0x0f) as usize;

        let mut offset = RTP_HEADER_LEN + csrc_count * 4;
        if extension {
            // 16-bit profile id, 16-bit length in 32-bit words (RFC 3550 §5.3.1)
            let ext = data
                .get(offset..offset + 4)
                .ok_or(RtspError::packet(PacketErrorKind::TooShort))?;
            let words = u16::from_be_bytes([ext[2], ext[3]]) as usize;
            offset += 4 + words * 4;
        }
        if offset > data.len() {
            return Err(RtspError::packet(PacketErrorKind::TooShort));
        }

        let mut end = data.len();
        if padding {
            let pad = data[end - 1] as usize;
            if pad == 0 || offset + pad > end {
                return Err(RtspError::packet(PacketErrorKind::InvalidPadding));
            }
            end -= pad;
        }

        Ok(RtpPacket {
            marker: data[1] & 0x80 != 0,
            payload_type: data[1] & 0x7f,
            sequence: u16::from_be_bytes([data[2], data[3]]),
            timestamp: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            ssrc: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            payload: &data[offset..end],
        })
    }
}
