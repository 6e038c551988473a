use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::Result;

/// Consumer of datagrams read by a [`ReceiveWorker`].
///
/// Runs on the worker thread. Handlers absorb their own errors: a bad
/// packet is logged and dropped, never allowed to stop the loop.
pub trait PacketHandler: Send + 'static {
    fn handle_packet(&mut self, data: &[u8]);
}

/// Background receive loop for one UDP socket.
///
/// The socket is moved into the thread, so only the worker ever reads it.
/// [`stop`](Self::stop) clears the running flag and joins; the loop sees
/// the flag within one read timeout plus one poll interval.
pub struct ReceiveWorker {
    name: &'static str,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReceiveWorker {
    pub fn spawn<H: PacketHandler>(
        name: &'static str,
        socket: UdpSocket,
        handler: H,
        max_datagram_size: usize,
        poll_interval: Duration,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();

        let handle = thread::Builder::new()
            .name(format!("rtsp-{name}"))
            .spawn(move || {
                receive_loop(name, socket, handler, max_datagram_size, poll_interval, r);
            })?;

        tracing::debug!(worker = name, "receive worker started");

        Ok(Self {
            name,
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop to exit and wait for it. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(worker = self.name, "receive worker panicked");
            } else {
                tracing::debug!(worker = self.name, "receive worker stopped");
            }
        }
    }
}

impl Drop for ReceiveWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop<H: PacketHandler>(
    name: &'static str,
    socket: UdpSocket,
    mut handler: H,
    max_datagram_size: usize,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; max_datagram_size];

    while running.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buf) {
            Ok((0, _)) => {}
            Ok((n, _)) => handler.handle_packet(&buf[..n]),
            Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(worker = name, error = %e, "UDP receive error");
                }
            }
        }
        thread::sleep(poll_interval);
    }

    tracing::debug!(worker = name, "receive loop exited");
}
