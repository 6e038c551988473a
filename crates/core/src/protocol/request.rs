use std::fmt;

/// Client identification string sent in every request (RFC 2326 §12.41).
pub const USER_AGENT: &str = "rtsp-client-rs/0.1";

/// RTSP methods this client emits (RFC 2326 §10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Options,
    Describe,
    Setup,
    Play,
    Pause,
    Teardown,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Describe => "DESCRIBE",
            Self::Setup => "SETUP",
            Self::Play => "PLAY",
            Self::Pause => "PAUSE",
            Self::Teardown => "TEARDOWN",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing RTSP request (RFC 2326 §6).
///
/// Serializes to:
///
/// ```text
/// METHOD target RTSP/1.0\r\n
/// CSeq: <n>\r\n
/// Session: <id>\r\n          (only once the server assigned one)
/// <extra headers>\r\n
/// User-Agent: <agent>\r\n
/// Accept: application/sdp\r\n
/// \r\n
/// ```
///
/// Values are written verbatim. Callers must not put CR or LF in header
/// values; nothing is escaped.
#[must_use]
#[derive(Debug, Clone)]
pub struct RtspRequest {
    pub method: Method,
    /// Request target, either a path/URI or `*` for OPTIONS.
    pub target: String,
    /// Extra headers in insertion order.
    pub headers: Vec<(String, String)>,
}

impl RtspRequest {
    pub fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            target: target.to_string(),
            headers: Vec::new(),
        }
    }

    /// Add an extra header. A header with the same name (case-insensitive)
    /// is replaced so names stay unique.
    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Serialize to RTSP wire bytes with the given sequence number and
    /// optional session id.
    pub fn serialize(&self, cseq: u32, session_id: Option<&str>, user_agent: &str) -> Vec<u8> {
        let mut request = format!("{} {} RTSP/1.0\r\n", self.method, self.target);
        request.push_str(&format!("CSeq: {}\r\n", cseq));

        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            request.push_str(&format!("Session: {}\r\n", id));
        }

        for (name, value) in &self.headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }

        request.push_str(&format!("User-Agent: {}\r\n", user_agent));
        request.push_str("Accept: application/sdp\r\n");
        request.push_str("\r\n");
        request.into_bytes()
    }
}
