use crate::error::{ParseErrorKind, Result, RtspError};

const STATUS_PREFIX: &str = "RTSP/1.0 ";
const SESSION_HEADER: &str = "\r\nSession: ";

/// A successful RTSP response (RFC 2326 §7).
///
/// Only three things are interpreted: the status line, the `Session`
/// header and the body. Every other header is ignored.
///
/// ```text
/// RTSP/1.0 200 OK\r\n
/// CSeq: 3\r\n
/// Session: 12345678;timeout=60\r\n
/// \r\n
/// [body]
/// ```
///
/// The parser is positional, not a general RTSP grammar:
///
/// - The status line is located by the first occurrence of `RTSP/1.0 `
///   and must be terminated by CRLF.
/// - `Session` must be spelled exactly `Session: ` at the start of a
///   header line. Its value is everything up to the next CRLF, kept raw
///   (including any `;timeout=` suffix) and echoed back as-is.
/// - The body is whatever follows the first blank line.
#[derive(Debug, Clone)]
pub struct RtspResponse {
    pub status_code: u16,
    pub reason: String,
    pub session: Option<String>,
    pub body: String,
}

impl RtspResponse {
    /// Parse a complete response. Fails unless the status code is 200.
    ///
    /// Does not touch session state; the caller advances CSeq and stores
    /// the session id after a successful parse.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.is_empty() {
            return Err(RtspError::parse(ParseErrorKind::EmptyInput));
        }

        let text = String::from_utf8_lossy(raw);

        let start = text
            .find(STATUS_PREFIX)
            .ok_or(RtspError::parse(ParseErrorKind::MalformedStatusLine))?;
        let line_end = text[start..]
            .find("\r\n")
            .map(|pos| start + pos)
            .ok_or(RtspError::parse(ParseErrorKind::MalformedStatusLine))?;

        let status = &text[start + STATUS_PREFIX.len()..line_end];
        let (code, reason) = status.split_once(' ').unwrap_or((status, ""));
        let status_code: u16 = code
            .parse()
            .map_err(|_| RtspError::parse(ParseErrorKind::MalformedStatusLine))?;

        if status_code != 200 {
            return Err(RtspError::parse(ParseErrorKind::NonSuccessStatus {
                code: status_code,
                reason: reason.to_string(),
            }));
        }

        let (head, body) = match text[line_end..].find("\r\n\r\n") {
            Some(pos) => {
                let split = line_end + pos;
                (&text[line_end..split + 2], &text[split + 4..])
            }
            None => (&text[line_end..], ""),
        };

        let session = head.find(SESSION_HEADER).map(|pos| {
            let value = &head[pos + SESSION_HEADER.len()..];
            let end = value.find("\r\n").unwrap_or(value.len());
            value[..end].to_string()
        });

        Ok(RtspResponse {
            status_code,
            reason: reason.to_string(),
            session,
            body: body.to_string(),
        })
    }
}
