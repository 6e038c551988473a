//! Integration tests: the full client lifecycle against a scripted RTSP
//! server, with RTP/JPEG fragments sent over real UDP sockets.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rtsp_client::{
    ClientConfig, DecodedFrame, JpegDecoder, ParseErrorKind, PlaybackState, Result, RtspClient,
    RtspError, SessionState,
};

const SDP: &str = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=Stream\r\nt=0 0\r\nm=video 5004 RTP/AVP 26\r\na=control:track1\r\n";
const SESSION: &str = "ABC123;timeout=60";

/// Requests received by the fake server, in order.
type Log = Arc<Mutex<Vec<String>>>;

/// Serve one control connection. `respond` maps a request's method and
/// CSeq to the raw response.
fn fake_server(respond: fn(&str, &str) -> String) -> (SocketAddr, Log) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Log = Arc::default();
    let requests = log.clone();

    thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        loop {
            let mut request = String::new();
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {
                        request.push_str(&line);
                        if line == "\r\n" {
                            break;
                        }
                    }
                }
            }

            let method = request.split(' ').next().unwrap_or_default().to_string();
            let cseq = header(&request, "CSeq").unwrap_or_default();
            requests.lock().push(request);
            if writer.write_all(respond(&method, &cseq).as_bytes()).is_err() {
                return;
            }
        }
    });

    (addr, log)
}

fn header(request: &str, name: &str) -> Option<String> {
    request.lines().find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.eq_ignore_ascii_case(name).then(|| v.trim().to_string())
    })
}

fn ok(cseq: &str, extra: &str) -> String {
    format!("RTSP/1.0 200 OK\r\nCSeq: {cseq}\r\n{extra}\r\n")
}

/// A well-behaved MJPEG server.
fn standard(method: &str, cseq: &str) -> String {
    match method {
        "OPTIONS" => ok(
            cseq,
            "Public: OPTIONS, DESCRIBE, SETUP, PLAY, PAUSE, TEARDOWN\r\n",
        ),
        "DESCRIBE" => format!(
            "RTSP/1.0 200 OK\r\nCSeq: {cseq}\r\nContent-Type: application/sdp\r\nContent-Length: {}\r\n\r\n{SDP}",
            SDP.len()
        ),
        "SETUP" => ok(
            cseq,
            &format!(
                "Session: {SESSION}\r\nTransport: RTP/AVP;unicast;client_port=5000-5001;server_port=6000-6001\r\n"
            ),
        ),
        _ => ok(cseq, &format!("Session: {SESSION}\r\n")),
    }
}

#[derive(Default)]
struct StubDecoder {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl JpegDecoder for StubDecoder {
    fn decode(&self, jpeg: &[u8]) -> Result<DecodedFrame> {
        self.frames.lock().push(jpeg.to_vec());
        Ok(DecodedFrame {
            pixels: vec![0x80; 16 * 8 * 4],
            width: 16,
            height: 8,
        })
    }
}

fn test_config() -> ClientConfig {
    ClientConfig {
        connect_timeout: Duration::from_secs(2),
        response_timeout: Duration::from_secs(2),
        recv_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(1),
        ..Default::default()
    }
}

fn client_with(decoder: Arc<StubDecoder>) -> RtspClient {
    RtspClient::with_decoder(test_config(), decoder)
}

/// Two adjacent free UDP ports, released for the client to bind.
fn free_ports() -> (u16, u16) {
    let rtp = UdpSocket::bind("0.0.0.0:0").unwrap();
    let rtcp = UdpSocket::bind("0.0.0.0:0").unwrap();
    (
        rtp.local_addr().unwrap().port(),
        rtcp.local_addr().unwrap().port(),
    )
}

/// RTP packet carrying an RFC 2435 type 1 fragment of a 16x8 image.
fn jpeg_packet(seq: u16, marker: bool, offset: u32, scan: &[u8]) -> Vec<u8> {
    let mut buf = vec![0x80, if marker { 0x80 | 26 } else { 26 }];
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(&90_000u32.to_be_bytes());
    buf.extend_from_slice(&0x1234_5678u32.to_be_bytes());
    let off = offset.to_be_bytes();
    buf.extend_from_slice(&[0, off[1], off[2], off[3], 1, 75, 2, 1]);
    buf.extend_from_slice(scan);
    buf
}

fn wait_for_frame(client: &RtspClient) -> Option<DecodedFrame> {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if let Some(frame) = client.take_frame() {
            return Some(frame);
        }
        thread::sleep(Duration::from_millis(5));
    }
    None
}

fn methods(log: &Log) -> Vec<String> {
    methods_of(&log.lock())
}

fn methods_of(requests: &[String]) -> Vec<String> {
    requests
        .iter()
        .map(|r| r.split(' ').next().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn full_lifecycle_delivers_frames() {
    let (addr, log) = fake_server(standard);
    let decoder = Arc::new(StubDecoder::default());
    let mut client = client_with(decoder.clone());
    let (rtp_port, rtcp_port) = free_ports();

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.cseq(), 1);

    client.describe().unwrap();
    assert_eq!(client.state(), SessionState::Described);
    let media = client.media().unwrap();
    assert_eq!((media.rtp_port, media.payload_type), (5004, 26));

    client.setup(rtp_port, rtcp_port).unwrap();
    assert_eq!(client.state(), SessionState::SetUp);
    assert_eq!(client.session_id(), Some(SESSION));
    assert!(client.is_receiving());

    client.play().unwrap();
    assert_eq!(client.playback(), PlaybackState::Playing);

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let target = ("127.0.0.1", rtp_port);
    sender.send_to(&jpeg_packet(1, false, 0, &[0x11, 0x22]), target).unwrap();
    sender.send_to(&jpeg_packet(2, true, 2, &[0x33]), target).unwrap();

    let frame = wait_for_frame(&client).expect("decoded frame");
    assert_eq!((frame.width, frame.height), (16, 8));
    assert!(client.take_frame().is_none());
    {
        let jpegs = decoder.frames.lock();
        assert_eq!(jpegs.len(), 1);
        assert!(jpegs[0].starts_with(&[0xff, 0xd8]));
        assert!(jpegs[0].ends_with(&[0x11, 0x22, 0x33, 0xff, 0xd9]));
    }
    let stats = client.stats();
    assert_eq!(stats.packets_received, 2);
    assert_eq!(stats.frames_completed, 1);

    client.pause().unwrap();
    assert_eq!(client.playback(), PlaybackState::Paused);
    assert_eq!(client.state(), SessionState::SetUp);

    client.teardown().unwrap();
    assert_eq!(client.state(), SessionState::TornDown);
    assert_eq!(client.playback(), PlaybackState::Idle);
    assert!(!client.is_receiving());

    client.disconnect();
    assert_eq!(client.state(), SessionState::Disconnected);

    assert_eq!(
        methods(&log),
        ["OPTIONS", "DESCRIBE", "SETUP", "PLAY", "PAUSE", "TEARDOWN"]
    );
    let requests = log.lock();
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(header(request, "CSeq"), Some(i.to_string()));
        assert_eq!(
            header(request, "User-Agent").as_deref(),
            Some("rtsp-client-rs/0.1")
        );
    }
    assert!(requests[0].starts_with("OPTIONS * RTSP/1.0\r\n"));
    assert!(requests[1].starts_with("DESCRIBE /mjpeg/1 RTSP/1.0\r\n"));
    assert!(requests[2].contains(&format!(
        "Transport: RTP/AVP;unicast;client_port={rtp_port}-{rtcp_port}\r\n"
    )));
    assert_eq!(header(&requests[2], "Session"), None);
    for request in &requests[3..] {
        assert_eq!(header(request, "Session").as_deref(), Some(SESSION));
    }
}

#[test]
fn non_success_response_leaves_cseq_unchanged() {
    fn respond(method: &str, cseq: &str) -> String {
        match method {
            "DESCRIBE" => format!("RTSP/1.0 404 Not Found\r\nCSeq: {cseq}\r\n\r\n"),
            _ => standard(method, cseq),
        }
    }
    let (addr, log) = fake_server(respond);
    let mut client = client_with(Arc::default());

    client.connect("127.0.0.1", addr.port(), "/missing").unwrap();
    assert_eq!(client.cseq(), 1);

    let err = client.describe().unwrap_err();
    assert!(matches!(
        err,
        RtspError::Parse {
            kind: ParseErrorKind::NonSuccessStatus { code: 404, .. }
        }
    ));
    assert_eq!(client.cseq(), 1);
    assert_eq!(client.state(), SessionState::Connected);
    assert!(client.media().is_none());

    // retry reuses the sequence number
    assert!(client.describe().is_err());
    let requests = log.lock();
    assert_eq!(requests.len(), 3);
    assert_eq!(header(&requests[1], "CSeq").as_deref(), Some("1"));
    assert_eq!(header(&requests[2], "CSeq").as_deref(), Some("1"));
}

#[test]
fn describe_without_video_media_fails() {
    fn respond(method: &str, cseq: &str) -> String {
        match method {
            "DESCRIBE" => {
                let body = "v=0\r\nm=audio 5004 RTP/AVP 0\r\n";
                format!(
                    "RTSP/1.0 200 OK\r\nCSeq: {cseq}\r\nContent-Length: {}\r\n\r\n{body}",
                    body.len()
                )
            }
            _ => standard(method, cseq),
        }
    }
    let (addr, _log) = fake_server(respond);
    let mut client = client_with(Arc::default());

    client.connect("127.0.0.1", addr.port(), "/audio").unwrap();
    assert!(matches!(
        client.describe(),
        Err(RtspError::Parse {
            kind: ParseErrorKind::NoVideoMedia
        })
    ));
    assert_eq!(client.state(), SessionState::Connected);
    assert!(client.media().is_none());
}

#[test]
fn setup_before_describe_is_rejected() {
    let (addr, log) = fake_server(standard);
    let mut client = client_with(Arc::default());

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    assert!(matches!(
        client.setup(5000, 5001),
        Err(RtspError::InvalidState {
            operation: "setup",
            state: SessionState::Connected
        })
    ));
    assert!(matches!(client.play(), Err(RtspError::InvalidState { .. })));
    assert_eq!(client.cseq(), 1);
    assert_eq!(methods(&log), ["OPTIONS"]);
}

#[test]
fn options_failure_leaves_client_disconnected() {
    fn respond(_method: &str, cseq: &str) -> String {
        format!("RTSP/1.0 500 Internal Server Error\r\nCSeq: {cseq}\r\n\r\n")
    }
    let (addr, _log) = fake_server(respond);
    let mut client = client_with(Arc::default());

    assert!(matches!(
        client.connect("127.0.0.1", addr.port(), "/mjpeg/1"),
        Err(RtspError::Parse {
            kind: ParseErrorKind::NonSuccessStatus { code: 500, .. }
        })
    ));
    assert_eq!(client.state(), SessionState::Disconnected);
    assert_eq!(client.cseq(), 0);
}

#[test]
fn connection_refused_is_io_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = client_with(Arc::default());

    assert!(matches!(
        client.connect("127.0.0.1", port, "/mjpeg/1"),
        Err(RtspError::Io(_))
    ));
    assert_eq!(client.state(), SessionState::Disconnected);
}

#[test]
fn failed_teardown_still_cleans_up() {
    fn respond(method: &str, cseq: &str) -> String {
        match method {
            "TEARDOWN" => format!("RTSP/1.0 454 Session Not Found\r\nCSeq: {cseq}\r\n\r\n"),
            _ => standard(method, cseq),
        }
    }
    let (addr, _log) = fake_server(respond);
    let mut client = client_with(Arc::default());
    let (rtp_port, rtcp_port) = free_ports();

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    client.describe().unwrap();
    client.setup(rtp_port, rtcp_port).unwrap();
    client.play().unwrap();

    assert!(client.teardown().is_err());
    assert_eq!(client.state(), SessionState::TornDown);
    assert_eq!(client.playback(), PlaybackState::Idle);
    assert!(!client.is_receiving());

    // the media ports are free again
    UdpSocket::bind(("0.0.0.0", rtp_port)).unwrap();
    UdpSocket::bind(("0.0.0.0", rtcp_port)).unwrap();
}

#[test]
fn disconnect_twice_is_harmless() {
    let (addr, log) = fake_server(standard);
    let mut client = client_with(Arc::default());
    let (rtp_port, rtcp_port) = free_ports();

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    client.describe().unwrap();
    client.setup(rtp_port, rtcp_port).unwrap();

    client.disconnect();
    assert_eq!(client.state(), SessionState::Disconnected);
    assert_eq!(client.cseq(), 0);
    assert!(client.session_id().is_none());
    assert!(!client.is_receiving());

    client.disconnect();
    assert_eq!(client.state(), SessionState::Disconnected);

    assert_eq!(methods(&log), ["OPTIONS", "DESCRIBE", "SETUP", "TEARDOWN"]);
    UdpSocket::bind(("0.0.0.0", rtp_port)).unwrap();
}

#[test]
fn reconnect_starts_a_fresh_session() {
    let (first, _) = fake_server(standard);
    let (second, second_log) = fake_server(standard);
    let mut client = client_with(Arc::default());
    let (rtp_port, rtcp_port) = free_ports();

    client.connect("127.0.0.1", first.port(), "/mjpeg/1").unwrap();
    client.describe().unwrap();
    client.setup(rtp_port, rtcp_port).unwrap();

    client.connect("127.0.0.1", second.port(), "/mjpeg/2").unwrap();
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.cseq(), 1);
    assert!(client.session_id().is_none());
    assert!(!client.is_receiving());
    assert_eq!(header(&second_log.lock()[0], "CSeq").as_deref(), Some("0"));
}

#[test]
fn torn_down_session_only_disconnects() {
    let (addr, log) = fake_server(standard);
    let mut client = client_with(Arc::default());
    let (rtp_port, rtcp_port) = free_ports();

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    client.describe().unwrap();
    client.setup(rtp_port, rtcp_port).unwrap();
    client.teardown().unwrap();

    for result in [
        client.setup(rtp_port, rtcp_port),
        client.describe(),
        client.play(),
        client.teardown(),
    ] {
        assert!(matches!(
            result,
            Err(RtspError::InvalidState {
                state: SessionState::TornDown,
                ..
            })
        ));
    }
    assert_eq!(client.state(), SessionState::TornDown);

    client.disconnect();
    assert_eq!(client.state(), SessionState::Disconnected);
    assert_eq!(methods(&log), ["OPTIONS", "DESCRIBE", "SETUP", "TEARDOWN"]);
}

#[test]
fn disconnect_tears_down_before_setup() {
    let (addr, log) = fake_server(standard);
    let mut client = client_with(Arc::default());

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    client.disconnect();

    assert_eq!(client.state(), SessionState::Disconnected);
    let requests = log.lock();
    assert_eq!(methods_of(&requests), ["OPTIONS", "TEARDOWN"]);
    assert!(requests[1].starts_with("TEARDOWN /mjpeg/1 RTSP/1.0\r\n"));
    assert_eq!(header(&requests[1], "Session"), None);
}

#[test]
fn truncated_response_closes_control_connection() {
    fn respond(method: &str, cseq: &str) -> String {
        match method {
            // promises 10 body bytes, sends 3, keeps the connection open
            "DESCRIBE" => {
                format!("RTSP/1.0 200 OK\r\nCSeq: {cseq}\r\nContent-Length: 10\r\n\r\nm=v")
            }
            _ => standard(method, cseq),
        }
    }
    let (addr, log) = fake_server(respond);
    let mut client = RtspClient::with_config(ClientConfig {
        response_timeout: Duration::from_millis(200),
        ..test_config()
    });

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    assert!(matches!(client.describe(), Err(RtspError::Io(_))));
    assert_eq!(client.cseq(), 1);

    // nothing is sent on the closed connection
    assert!(matches!(
        client.describe(),
        Err(RtspError::Io(e)) if e.kind() == std::io::ErrorKind::NotConnected
    ));
    client.disconnect();
    assert_eq!(client.state(), SessionState::Disconnected);
    assert_eq!(methods(&log), ["OPTIONS", "DESCRIBE"]);
}

#[test]
fn oversized_content_length_is_an_error() {
    fn respond(method: &str, cseq: &str) -> String {
        match method {
            "DESCRIBE" => format!(
                "RTSP/1.0 200 OK\r\nCSeq: {cseq}\r\nContent-Length: 18446744073709551615\r\n\r\n"
            ),
            _ => standard(method, cseq),
        }
    }
    let (addr, _log) = fake_server(respond);
    let mut client = client_with(Arc::default());

    client.connect("127.0.0.1", addr.port(), "/mjpeg/1").unwrap();
    assert!(matches!(
        client.describe(),
        Err(RtspError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData
    ));
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.cseq(), 1);
}
