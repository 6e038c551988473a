use std::fmt;

/// Client-side `Transport` header value for SETUP (RFC 2326 §12.39).
///
/// Only unicast RTP/AVP over UDP is requested:
///
/// ```text
/// Transport: RTP/AVP;unicast;client_port=5000-5001
/// ```
///
/// The server's reply `Transport` header is not read; the client receives
/// on the ports it asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportHeader {
    /// Local port the RTP receive loop binds.
    pub client_rtp_port: u16,
    /// Local port the RTCP receive loop binds.
    pub client_rtcp_port: u16,
}

impl TransportHeader {
    /// ## Examples
    ///
    /// ```
    /// use rtsp_client::session::TransportHeader;
    ///
    /// let th = TransportHeader::new(5000, 5001);
    /// assert_eq!(th.to_string(), "RTP/AVP;unicast;client_port=5000-5001");
    /// ```
    pub fn new(client_rtp_port: u16, client_rtcp_port: u16) -> Self {
        Self {
            client_rtp_port,
            client_rtcp_port,
        }
    }
}

impl fmt::Display for TransportHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RTP/AVP;unicast;client_port={}-{}",
            self.client_rtp_port, self.client_rtcp_port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unicast_port_pair() {
        let th = TransportHeader::new(8000, 8001);
        assert_eq!(th.to_string(), "RTP/AVP;unicast;client_port=8000-8001");
    }
}
