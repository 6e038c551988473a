//! RTSP client session state (RFC 2326 §3, §12.37, §A.1).
//!
//! A [`Session`] is owned by the [`RtspClient`](crate::RtspClient) and
//! mutated only on the caller's thread, through lifecycle operations. It
//! tracks:
//!
//! - The server address and stream path.
//! - CSeq: starts at 0, advanced once per successful exchange.
//! - The session id assigned by the server. Empty until a response carries
//!   one, then echoed on every request.
//! - The negotiated video media (port and payload type) from DESCRIBE.
//! - Connection state and playback state.
//!
//! ## Connection lifecycle
//!
//! ```text
//! connect       Disconnected -> Connected
//! describe      Connected | Described | SetUp -> Described
//! setup         Described | SetUp -> SetUp
//! teardown      Connected | Described | SetUp -> TornDown
//! disconnect    any -> Disconnected
//! ```
//!
//! Playback (`Idle`, `Playing`, `Paused`) moves independently while
//! `SetUp`, driven by PLAY and PAUSE.

pub mod transport;

use std::fmt;
use std::net::SocketAddr;

use crate::protocol::{MediaDescriptor, RtspResponse};
pub use transport::TransportHeader;

/// Control connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No control connection.
    Disconnected,
    /// Control connection open, OPTIONS answered.
    Connected,
    /// DESCRIBE succeeded; media descriptor known.
    Described,
    /// SETUP succeeded; RTP/RTCP receive loops running.
    SetUp,
    /// TEARDOWN sent; media stopped, control connection still open.
    TornDown,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Described => "described",
            Self::SetUp => "set up",
            Self::TornDown => "torn down",
        };
        f.write_str(name)
    }
}

/// Media delivery state within a set-up session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Client-side RTSP session.
#[derive(Debug)]
pub struct Session {
    pub server: SocketAddr,
    pub path: String,
    cseq: u32,
    session_id: String,
    media: Option<MediaDescriptor>,
    state: SessionState,
    playback: PlaybackState,
}

impl Session {
    pub fn new(server: SocketAddr, path: &str) -> Self {
        Session {
            server,
            path: path.to_string(),
            cseq: 0,
            session_id: String::new(),
            media: None,
            state: SessionState::Disconnected,
            playback: PlaybackState::Idle,
        }
    }

    /// Sequence number for the next request.
    pub fn cseq(&self) -> u32 {
        self.cseq
    }

    /// Session id to send, if the server has assigned one.
    pub fn session_id(&self) -> Option<&str> {
        if self.session_id.is_empty() {
            None
        } else {
            Some(&self.session_id)
        }
    }

    /// Apply the post-conditions of a successful exchange: advance CSeq
    /// and adopt the session id if the response carried one.
    pub fn record_success(&mut self, response: &RtspResponse) {
        self.cseq = self.cseq.wrapping_add(1);
        if let Some(id) = &response.session
            && *id != self.session_id
        {
            tracing::debug!(session_id = %id, "session id assigned");
            self.session_id = id.clone();
        }
    }

    pub fn media(&self) -> Option<MediaDescriptor> {
        self.media
    }

    pub fn set_media(&mut self, media: MediaDescriptor) {
        self.media = Some(media);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transition to a new connection state.
    pub fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            tracing::debug!(old_state = %self.state, new_state = %state, "state transition");
            self.state = state;
        }
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn set_playback(&mut self, playback: PlaybackState) {
        self.playback = playback;
    }
}
