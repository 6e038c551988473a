use std::io::{self, ErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, RtspError};
use crate::frame::{DecodedFrame, FrameSlot};
use crate::media::{
    JpegDecoder, RtcpReceiver, RtpReceiver, SoftwareJpegDecoder, StatsSnapshot, StreamStats,
};
use crate::protocol::request::USER_AGENT;
use crate::protocol::{MediaDescriptor, Method, RtspRequest, RtspResponse};
use crate::session::{PlaybackState, Session, SessionState, TransportHeader};
use crate::transport::{ControlChannel, ReceiveWorker, bind_media_socket};

/// Client-level configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Value of the `User-Agent` header on every request.
    pub user_agent: String,
    /// Bound on establishing the control connection.
    pub connect_timeout: Duration,
    /// Read/write timeout on the control connection. Expiry fails the
    /// exchange with an I/O error; it is not retried.
    pub response_timeout: Duration,
    /// Blocking-receive bound on the media sockets.
    pub recv_timeout: Duration,
    /// Pause between receive attempts in the media workers.
    ///
    /// A stop request takes effect within `recv_timeout + poll_interval`.
    pub poll_interval: Duration,
    /// Receive buffer size for one datagram.
    pub max_datagram_size: usize,
    /// Upper bound on one RTSP response, headers and body together.
    /// Anything larger fails the exchange with an I/O error.
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            recv_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
            max_datagram_size: 64 * 1024,
            max_response_size: 64 * 1024,
        }
    }
}

/// RTSP client for a single Motion-JPEG stream.
///
/// Drives the session lifecycle on the caller's thread:
///
/// ```text
/// connect -> describe -> setup -> play <-> pause -> teardown -> disconnect
/// ```
///
/// `setup` starts one receive worker per media socket (RTP and RTCP).
/// Completed frames are decoded on the RTP worker and left in a
/// [`FrameSlot`]; poll it with [`take_frame`](Self::take_frame).
///
/// Lifecycle operations take `&mut self` and are therefore never
/// concurrent. Dropping the client disconnects it.
pub struct RtspClient {
    config: ClientConfig,
    decoder: Arc<dyn JpegDecoder>,
    session: Option<Session>,
    control: Option<ControlChannel>,
    rtp_worker: Option<ReceiveWorker>,
    rtcp_worker: Option<ReceiveWorker>,
    frames: FrameSlot,
    stats: Arc<StreamStats>,
}

impl RtspClient {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_decoder(config, Arc::new(SoftwareJpegDecoder))
    }

    /// Create a client that hands reassembled frames to `decoder`.
    pub fn with_decoder(config: ClientConfig, decoder: Arc<dyn JpegDecoder>) -> Self {
        Self {
            config,
            decoder,
            session: None,
            control: None,
            rtp_worker: None,
            rtcp_worker: None,
            frames: FrameSlot::new(),
            stats: Arc::new(StreamStats::default()),
        }
    }

    /// Open the control connection and probe the server with `OPTIONS *`.
    ///
    /// `address` must be a literal IP address. An open connection is
    /// closed first. On any failure the client stays `Disconnected`.
    pub fn connect(&mut self, address: &str, port: u16, path: &str) -> Result<()> {
        if self.session.is_some() {
            self.disconnect();
        }

        let ip: IpAddr = address.parse().map_err(|_| {
            tracing::error!(address, "invalid server address");
            RtspError::InvalidAddress(address.to_string())
        })?;
        let server = SocketAddr::new(ip, port);

        let control = ControlChannel::connect(
            server,
            self.config.connect_timeout,
            self.config.response_timeout,
            self.config.max_response_size,
        )
        .inspect_err(|e| tracing::error!(%server, error = %e, "connect failed"))?;

        self.control = Some(control);
        self.session = Some(Session::new(server, path));

        if let Err(e) = self.exchange(RtspRequest::new(Method::Options, "*")) {
            tracing::error!(%server, error = %e, "OPTIONS failed, closing connection");
            self.close_control();
            self.session = None;
            return Err(e);
        }

        self.session_mut("connect")?.set_state(SessionState::Connected);
        tracing::info!(%server, path, "connected");
        Ok(())
    }

    /// Fetch the session description and record the negotiated video media.
    ///
    /// From `SetUp` the descriptor is refreshed without leaving `SetUp`.
    pub fn describe(&mut self) -> Result<()> {
        self.require(
            "describe",
            &[
                SessionState::Connected,
                SessionState::Described,
                SessionState::SetUp,
            ],
        )?;

        let path = self.session_mut("describe")?.path.clone();
        let response = self.exchange(RtspRequest::new(Method::Describe, &path))?;
        let media = MediaDescriptor::extract(&response.body).inspect_err(|e| {
            tracing::warn!(error = %e, "DESCRIBE body has no usable video media");
        })?;

        let session = self.session_mut("describe")?;
        session.set_media(media);
        if session.state() != SessionState::SetUp {
            session.set_state(SessionState::Described);
        }
        tracing::info!(
            rtp_port = media.rtp_port,
            payload_type = media.payload_type,
            "media described"
        );
        Ok(())
    }

    /// Request unicast delivery to the given local ports and start the
    /// RTP and RTCP receive workers on them.
    ///
    /// Requires a media descriptor from a prior [`describe`](Self::describe).
    /// Workers from an earlier setup are stopped first. If the server
    /// accepts but a local port cannot be bound, the error is returned and
    /// the session falls back to `Described`.
    pub fn setup(&mut self, rtp_port: u16, rtcp_port: u16) -> Result<()> {
        self.require("setup", &[SessionState::Described, SessionState::SetUp])?;
        let session = self.session_mut("setup")?;
        let Some(media) = session.media() else {
            return Err(RtspError::InvalidState {
                operation: "setup",
                state: session.state(),
            });
        };
        let path = session.path.clone();

        let transport = TransportHeader::new(rtp_port, rtcp_port);
        let request =
            RtspRequest::new(Method::Setup, &path).add_header("Transport", &transport.to_string());
        self.exchange(request)?;

        self.stop_media();
        if let Err(e) = self.start_media(rtp_port, rtcp_port, media) {
            tracing::error!(rtp_port, rtcp_port, error = %e, "failed to start media receive");
            self.stop_media();
            let session = self.session_mut("setup")?;
            session.set_playback(PlaybackState::Idle);
            session.set_state(SessionState::Described);
            return Err(e);
        }

        let session = self.session_mut("setup")?;
        session.set_playback(PlaybackState::Idle);
        session.set_state(SessionState::SetUp);
        tracing::info!(
            rtp_port,
            rtcp_port,
            session_id = session.session_id().unwrap_or_default(),
            "session set up"
        );
        Ok(())
    }

    /// Ask the server to start sending media.
    pub fn play(&mut self) -> Result<()> {
        self.set_playback(Method::Play, PlaybackState::Playing)
    }

    /// Ask the server to suspend media delivery.
    pub fn pause(&mut self) -> Result<()> {
        self.set_playback(Method::Pause, PlaybackState::Paused)
    }

    /// Tear down the server session.
    ///
    /// Local cleanup happens whatever the server answers: the media workers
    /// are stopped, playback goes `Idle` and the state becomes `TornDown`.
    /// The returned result reflects the TEARDOWN exchange only.
    ///
    /// The server session is gone afterwards; only
    /// [`disconnect`](Self::disconnect) (or a new `connect`) leaves
    /// `TornDown`.
    pub fn teardown(&mut self) -> Result<()> {
        self.require(
            "teardown",
            &[
                SessionState::Connected,
                SessionState::Described,
                SessionState::SetUp,
            ],
        )?;

        let path = self.session_mut("teardown")?.path.clone();
        let result = self.exchange(RtspRequest::new(Method::Teardown, &path));

        self.stop_media();
        let session = self.session_mut("teardown")?;
        session.set_playback(PlaybackState::Idle);
        session.set_state(SessionState::TornDown);

        match result {
            Ok(_) => {
                tracing::info!("session torn down");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "TEARDOWN failed, session cleaned up locally");
                Err(e)
            }
        }
    }

    /// Best-effort teardown, then stop the workers, close every socket and
    /// forget the session. Safe to call in any state, any number of times.
    pub fn disconnect(&mut self) {
        let Some(session) = self.session.as_ref() else {
            self.stop_media();
            self.close_control();
            return;
        };

        if session.state() != SessionState::TornDown {
            let _ = self.teardown();
        }

        self.stop_media();
        self.close_control();
        if let Some(session) = self.session.take() {
            tracing::info!(server = %session.server, "disconnected");
        }
    }

    /// Take the most recent decoded frame, if one arrived since the last
    /// call.
    pub fn take_frame(&self) -> Option<DecodedFrame> {
        self.frames.take()
    }

    /// Shared handle to the decoded frame slot, for polling from another
    /// thread.
    pub fn frames(&self) -> FrameSlot {
        self.frames.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Disconnected, Session::state)
    }

    pub fn playback(&self) -> PlaybackState {
        self.session
            .as_ref()
            .map_or(PlaybackState::Idle, Session::playback)
    }

    /// CSeq the next request will carry.
    pub fn cseq(&self) -> u32 {
        self.session.as_ref().map_or(0, Session::cseq)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().and_then(Session::session_id)
    }

    pub fn media(&self) -> Option<MediaDescriptor> {
        self.session.as_ref().and_then(Session::media)
    }

    /// Whether both media workers are running.
    pub fn is_receiving(&self) -> bool {
        self.rtp_worker.as_ref().is_some_and(ReceiveWorker::is_running)
            && self.rtcp_worker.as_ref().is_some_and(ReceiveWorker::is_running)
    }

    fn set_playback(&mut self, method: Method, playback: PlaybackState) -> Result<()> {
        self.require(method.as_str(), &[SessionState::SetUp])?;
        let path = self.session_mut(method.as_str())?.path.clone();
        self.exchange(RtspRequest::new(method, &path))?;
        self.session_mut(method.as_str())?.set_playback(playback);
        tracing::info!(%method, ?playback, "playback changed");
        Ok(())
    }

    /// One request/response round trip.
    ///
    /// CSeq and session id advance only when the response parsed as a
    /// success; any failure leaves the session untouched.
    ///
    /// An I/O failure closes the control connection: a partially read
    /// response would otherwise be taken as the start of the next one.
    /// Later exchanges fail with [`ErrorKind::NotConnected`] until the
    /// client reconnects.
    fn exchange(&mut self, request: RtspRequest) -> Result<RtspResponse> {
        let Some(session) = self.session.as_mut() else {
            return Err(RtspError::InvalidState {
                operation: request.method.as_str(),
                state: SessionState::Disconnected,
            });
        };
        let Some(control) = self.control.as_mut() else {
            return Err(io::Error::new(ErrorKind::NotConnected, "control connection closed").into());
        };

        let cseq = session.cseq();
        let bytes = request.serialize(cseq, session.session_id(), &self.config.user_agent);
        tracing::debug!(cseq, method = %request.method, target = %request.target, "request");

        let raw = match control.send(&bytes).and_then(|_| control.read_response()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    cseq,
                    method = %request.method,
                    error = %e,
                    "control connection failed, closing it"
                );
                if let Some(control) = self.control.take() {
                    control.shutdown();
                }
                return Err(e);
            }
        };
        let response = RtspResponse::parse(&raw).inspect_err(|e| {
            tracing::warn!(cseq, method = %request.method, error = %e, "request failed");
        })?;

        session.record_success(&response);
        tracing::debug!(
            cseq,
            method = %request.method,
            status = response.status_code,
            "response"
        );
        Ok(response)
    }

    fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        let state = self.state();
        if allowed.contains(&state) {
            Ok(())
        } else {
            Err(RtspError::InvalidState { operation, state })
        }
    }

    fn session_mut(&mut self, operation: &'static str) -> Result<&mut Session> {
        self.session.as_mut().ok_or(RtspError::InvalidState {
            operation,
            state: SessionState::Disconnected,
        })
    }

    fn start_media(&mut self, rtp_port: u16, rtcp_port: u16, media: MediaDescriptor) -> Result<()> {
        let rtp_socket = bind_media_socket(rtp_port, self.config.recv_timeout)?;
        let rtcp_socket = bind_media_socket(rtcp_port, self.config.recv_timeout)?;

        let rtp = RtpReceiver::new(
            self.decoder.clone(),
            self.frames.clone(),
            self.stats.clone(),
            Some(media.payload_type),
        );
        self.rtp_worker = Some(ReceiveWorker::spawn(
            "rtp",
            rtp_socket,
            rtp,
            self.config.max_datagram_size,
            self.config.poll_interval,
        )?);
        self.rtcp_worker = Some(ReceiveWorker::spawn(
            "rtcp",
            rtcp_socket,
            RtcpReceiver,
            self.config.max_datagram_size,
            self.config.poll_interval,
        )?);
        Ok(())
    }

    /// Stop and join both workers. Their sockets close as the threads exit.
    fn stop_media(&mut self) {
        for mut worker in [self.rtp_worker.take(), self.rtcp_worker.take()]
            .into_iter()
            .flatten()
        {
            worker.stop();
        }
    }

    fn close_control(&mut self) {
        if let Some(control) = self.control.take() {
            control.shutdown();
            tracing::debug!(peer_addr = %control.peer_addr(), "control connection closed");
        }
    }
}

impl Default for RtspClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RtspClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}
