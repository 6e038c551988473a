//! Network transport for the RTSP client.
//!
//! RTSP uses a split transport model:
//!
//! - **TCP** ([`tcp`]): the control connection carrying request/response
//!   signaling. Driven synchronously from the caller's thread.
//!
//! - **UDP** ([`udp`], [`worker`]): RTP and RTCP arrive on two sockets,
//!   each drained by its own [`ReceiveWorker`] thread.
//!
//! Future: interleaved TCP transport (RFC 2326 §10.12) would carry RTP on
//! the control connection using `$` framing.

pub mod tcp;
pub mod udp;
pub mod worker;

pub use tcp::ControlChannel;
pub use udp::bind_media_socket;
pub use worker::{PacketHandler, ReceiveWorker};
