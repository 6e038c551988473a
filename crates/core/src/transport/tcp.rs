use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// Blocking RTSP control connection.
///
/// Requests are written whole; responses are read as a header block up to
/// the first empty line, followed by exactly `Content-Length` body bytes.
/// Reads and writes are bounded by the response timeout, and an expired
/// timeout surfaces as an I/O error. A response larger than
/// `max_response_size`, headers and body together, is rejected with
/// [`ErrorKind::InvalidData`] before the body is buffered.
pub struct ControlChannel {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    peer_addr: SocketAddr,
    max_response_size: usize,
}

impl ControlChannel {
    pub fn connect(
        addr: SocketAddr,
        connect_timeout: Duration,
        response_timeout: Duration,
        max_response_size: usize,
    ) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, connect_timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(response_timeout))?;
        stream.set_write_timeout(Some(response_timeout))?;

        let reader = BufReader::new(stream.try_clone()?);
        tracing::info!(peer_addr = %addr, "control connection established");

        Ok(Self {
            reader,
            writer: stream,
            peer_addr: addr,
            max_response_size,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn send(&mut self, request: &[u8]) -> Result<()> {
        self.writer.write_all(request)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read one complete response.
    ///
    /// A connection closed before any byte arrived is reported as
    /// [`ErrorKind::UnexpectedEof`]. A connection closed mid-response
    /// returns what was read, which the response parser then rejects.
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut raw = Vec::new();
        let mut content_length = 0usize;

        loop {
            let start = raw.len();
            // one byte over the limit is enough to tell it was exceeded
            let budget = ((self.max_response_size - start) as u64).saturating_add(1);
            let n = (&mut self.reader).take(budget).read_until(b'\n', &mut raw)?;
            if raw.len() > self.max_response_size {
                return Err(too_large(raw.len(), self.max_response_size));
            }
            if n == 0 {
                if raw.is_empty() {
                    return Err(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "connection closed by server",
                    )
                    .into());
                }
                return Ok(raw);
            }

            let line = &raw[start..];
            if line == b"\r\n" || line == b"\n" {
                break;
            }
            if let Some(value) = content_length_of(line) {
                content_length = value.parse().map_err(|_| {
                    std::io::Error::new(
                        ErrorKind::InvalidData,
                        format!("invalid Content-Length {value:?}"),
                    )
                })?;
            }
        }

        if content_length > 0 {
            let start = raw.len();
            let total = start
                .checked_add(content_length)
                .filter(|&total| total <= self.max_response_size)
                .ok_or_else(|| too_large(content_length, self.max_response_size))?;
            raw.resize(total, 0);
            self.reader.read_exact(&mut raw[start..])?;
        }

        tracing::trace!(peer_addr = %self.peer_addr, len = raw.len(), "response read");
        Ok(raw)
    }

    pub fn shutdown(&self) {
        let _ = self.writer.shutdown(std::net::Shutdown::Both);
    }
}

fn too_large(len: usize, limit: usize) -> crate::RtspError {
    std::io::Error::new(
        ErrorKind::InvalidData,
        format!("response of {len} bytes exceeds limit of {limit}"),
    )
    .into()
}

/// Raw value of a `Content-Length` header line.
fn content_length_of(line: &[u8]) -> Option<&str> {
    let line = std::str::from_utf8(line).ok()?;
    let (name, value) = line.split_once(':')?;
    name.trim()
        .eq_ignore_ascii_case("content-length")
        .then(|| value.trim())
}
