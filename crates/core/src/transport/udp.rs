use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use crate::error::Result;

/// Bind a media receive socket on all interfaces.
///
/// The read timeout lets the worker loop observe its stop flag even when
/// the sender goes quiet. Port 0 binds an ephemeral port.
pub fn bind_media_socket(port: u16, recv_timeout: Duration) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
    socket.set_read_timeout(Some(recv_timeout))?;
    tracing::debug!(local_addr = ?socket.local_addr().ok(), "media socket bound");
    Ok(socket)
}
