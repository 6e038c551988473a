//! RTSP protocol implementation, client side (RFC 2326).
//!
//! This module handles the text-based RTSP signaling protocol: building
//! requests, parsing responses, and extracting the negotiated video media
//! from the DESCRIBE SDP body.
//!
//! ## RTSP message format (RFC 2326 §4)
//!
//! ```text
//! DESCRIBE /mjpeg/1 RTSP/1.0\r\n
//! CSeq: 1\r\n
//! User-Agent: rtsp-client-rs/0.1\r\n
//! Accept: application/sdp\r\n
//! \r\n
//! ```
//!
//! ## Methods emitted
//!
//! | Method | RFC section | Purpose |
//! |--------|-------------|---------|
//! | OPTIONS | §10.1 | Capability probe right after connecting |
//! | DESCRIBE | §10.2 | Retrieve SDP, negotiate port and payload type |
//! | SETUP | §10.4 | Announce client RTP/RTCP ports |
//! | PLAY | §10.5 | Start media delivery |
//! | PAUSE | §10.6 | Suspend media delivery |
//! | TEARDOWN | §10.7 | Destroy the server session |
//!
//! Responses are only read for their status line, `Session` header and
//! body; see [`RtspResponse`] for the exact (narrow) parsing rules.

pub mod request;
pub mod response;
pub mod sdp;

pub use request::{Method, RtspRequest};
pub use response::RtspResponse;
pub use sdp::MediaDescriptor;
