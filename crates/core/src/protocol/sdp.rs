//! SDP media line extraction (RFC 4566 §5.14).
//!
//! Only the first `m=video` line of a DESCRIBE body is consumed:
//!
//! ```text
//! v=0
//! o=- 0 0 IN IP4 192.168.1.100
//! s=Stream
//! t=0 0
//! m=video 0 RTP/AVP 26        ← port and payload type are read from here
//! a=rtpmap:26 JPEG/90000
//! ```
//!
//! This is deliberately not an SDP parser. The line must have exactly the
//! shape `m=video <port> RTP/AVP <payload-type>`. Known unsupported inputs,
//! all rejected rather than guessed at:
//!
//! - more than one payload type (`m=video 0 RTP/AVP 26 96`)
//! - port counts (`m=video 5000/2 RTP/AVP 26`)
//! - any protocol other than `RTP/AVP` (`RTP/SAVP`, `RTP/AVPF`, TCP)
//! - fields separated by anything but a single space
//!
//! Attribute lines (`a=rtpmap`, `a=control`, ...) are never read.

use crate::error::{ParseErrorKind, Result, RtspError};

const VIDEO_MEDIA: &str = "m=video";
const RTP_AVP: &str = "RTP/AVP";

/// Port and payload type negotiated for the video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub rtp_port: u16,
    pub payload_type: u8,
}

impl MediaDescriptor {
    /// Extract the descriptor from an SDP body.
    ///
    /// The line runs from `m=video` to the next CRLF, LF, or end of input.
    pub fn extract(body: &str) -> Result<Self> {
        let start = body
            .find(VIDEO_MEDIA)
            .ok_or(RtspError::parse(ParseErrorKind::NoVideoMedia))?;

        let line = &body[start..];
        let line = &line[..line.find(['\r', '\n']).unwrap_or(line.len())];

        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() != 4 || fields[0] != VIDEO_MEDIA || fields[2] != RTP_AVP {
            tracing::warn!(line, "unsupported m=video line");
            return Err(RtspError::parse(ParseErrorKind::MalformedMediaLine));
        }

        let rtp_port: u16 = fields[1].parse().map_err(|_| {
            RtspError::parse(ParseErrorKind::InvalidNumericField(fields[1].to_string()))
        })?;
        let payload_type: u8 = fields[3]
            .parse()
            .ok()
            .filter(|pt| *pt < 128)
            .ok_or_else(|| {
                RtspError::parse(ParseErrorKind::InvalidNumericField(fields[3].to_string()))
            })?;

        tracing::debug!(rtp_port, payload_type, "video media negotiated");

        Ok(MediaDescriptor {
            rtp_port,
            payload_type,
        })
    }
}
