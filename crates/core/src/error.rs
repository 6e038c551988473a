//! Error types for the RTSP client library.

use std::fmt;

use crate::session::SessionState;

/// Errors that can occur in the RTSP client library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Transport**: [`Io`](Self::Io), [`InvalidAddress`](Self::InvalidAddress):
///   socket, connect and address failures.
/// - **Protocol**: [`Parse`](Self::Parse): malformed or non-success RTSP
///   responses and SDP media lines.
/// - **Media**: [`Packet`](Self::Packet): malformed RTP or RTP/JPEG
///   payloads. [`Decode`](Self::Decode): the JPEG decoder rejected a frame.
/// - **Session**: [`InvalidState`](Self::InvalidState): a lifecycle
///   operation was called before its prerequisites were met.
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server address given to `connect` is not an IP address.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// Failed to parse an RTSP response or SDP body (RFC 2326 §7, RFC 4566).
    #[error("RTSP parse error: {kind}")]
    Parse { kind: ParseErrorKind },

    /// Failed to parse an RTP packet or its JPEG payload (RFC 3550, RFC 2435).
    #[error("RTP packet error: {kind}")]
    Packet { kind: PacketErrorKind },

    /// The JPEG decoder rejected a reassembled frame.
    #[error("JPEG decode error: {0}")]
    Decode(String),

    /// Lifecycle operation invoked from a state that does not allow it.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

impl RtspError {
    pub(crate) fn parse(kind: ParseErrorKind) -> Self {
        Self::Parse { kind }
    }

    pub(crate) fn packet(kind: PacketErrorKind) -> Self {
        Self::Packet { kind }
    }
}

/// Specific kind of RTSP/SDP parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Response was zero-length.
    EmptyInput,
    /// No `RTSP/1.0 ` status line, no terminator after it, or a
    /// non-numeric status code.
    MalformedStatusLine,
    /// Status line parsed but the code was not 200.
    NonSuccessStatus { code: u16, reason: String },
    /// SDP body has no `m=video` line.
    NoVideoMedia,
    /// The `m=video` line is not `m=video <port> RTP/AVP <payload-type>`.
    MalformedMediaLine,
    /// Port or payload type field was not a number in range.
    InvalidNumericField(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty response"),
            Self::MalformedStatusLine => write!(f, "malformed status line"),
            Self::NonSuccessStatus { code, reason } => {
                write!(f, "non-success status {} {}", code, reason)
            }
            Self::NoVideoMedia => write!(f, "no m=video line in SDP"),
            Self::MalformedMediaLine => write!(f, "malformed m=video line"),
            Self::InvalidNumericField(field) => write!(f, "invalid numeric field {:?}", field),
        }
    }
}

/// Specific kind of RTP or RTP/JPEG payload failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketErrorKind {
    /// Packet ended before a complete header.
    TooShort,
    /// RTP version field was not 2.
    UnsupportedVersion(u8),
    /// Padding count exceeds the payload.
    InvalidPadding,
    /// RFC 2435 type outside 0, 1, 64, 65.
    UnsupportedJpegType(u8),
    /// 16-bit quantization tables are not supported.
    UnsupportedPrecision,
    /// Q >= 128 with no in-band tables and none cached for this Q.
    MissingQuantTables(u8),
}

impl fmt::Display for PacketErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "packet too short"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported RTP version {}", v),
            Self::InvalidPadding => write!(f, "invalid padding"),
            Self::UnsupportedJpegType(t) => write!(f, "unsupported JPEG type {}", t),
            Self::UnsupportedPrecision => write!(f, "16-bit quantization tables not supported"),
            Self::MissingQuantTables(q) => write!(f, "no quantization tables for Q={}", q),
        }
    }
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;
