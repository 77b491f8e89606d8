use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::QueryConfig;
use crate::error::SourceQueryError;

/// Responses are a single UDP datagram, which can exceed the 1400 bytes
/// Valve recommends (Rust servers do), so receive up to the UDP maximum.
const RECV_BUFFER_SIZE: usize = 65_507;

/// A connected datagram channel to one game server.
///
/// Implementations enforce their own timeouts and report
/// [SourceQueryError::Timeout] separately from [SourceQueryError::Cancelled].
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, data: &[u8], cancel: &CancellationToken) -> Result<usize, SourceQueryError>;

    async fn recv(&mut self, cancel: &CancellationToken) -> Result<(Vec<u8>, SocketAddr), SourceQueryError>;

    /// Drop replies already waiting, such as one that arrived after a timeout.
    /// Returns how many were dropped.
    async fn discard_pending(&mut self) -> usize {
        0
    }

    fn is_connected(&self) -> bool;

    async fn close(&mut self);
}

/// [Transport] over a connected tokio [UdpSocket].
#[derive(Debug)]
pub struct UdpTransport {
    sock: Option<UdpSocket>,
    send_timeout: Duration,
    receive_timeout: Duration,
}

impl UdpTransport {
    /// Bind to `config.local_addr` and connect to `remote`.
    pub async fn connect(remote: SocketAddr, config: &QueryConfig) -> Result<Self, SourceQueryError> {
        let sock: UdpSocket = UdpSocket::bind(config.local_addr)
            .await
            .map_err(SourceQueryError::Bind)?;

        // connecting
        with_deadline(config.send_timeout, &CancellationToken::new(), sock.connect(remote))
            .await?
            .map_err(SourceQueryError::Connect)?;
        debug!("connected UDP socket to {}", remote);

        Ok(UdpTransport {
            sock: Some(sock),
            send_timeout: config.send_timeout,
            receive_timeout: config.receive_timeout,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.sock.as_ref().and_then(|s| s.local_addr().ok())
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&mut self, data: &[u8], cancel: &CancellationToken) -> Result<usize, SourceQueryError> {
        let sock: &UdpSocket = self.sock.as_ref().ok_or(SourceQueryError::Closed)?;
        trace!("sending {:02X?}", data);
        with_deadline(self.send_timeout, cancel, sock.send(data))
            .await?
            .map_err(SourceQueryError::Send)
    }

    async fn recv(&mut self, cancel: &CancellationToken) -> Result<(Vec<u8>, SocketAddr), SourceQueryError> {
        let sock: &UdpSocket = self.sock.as_ref().ok_or(SourceQueryError::Closed)?;
        let mut buf: Vec<u8> = vec![0u8; RECV_BUFFER_SIZE];
        let (len, source) = with_deadline(self.receive_timeout, cancel, sock.recv_from(&mut buf))
            .await?
            .map_err(SourceQueryError::Receive)?;
        buf.truncate(len);
        trace!("received {:02X?} from {}", buf, source);
        Ok((buf, source))
    }

    async fn discard_pending(&mut self) -> usize {
        let Some(sock) = self.sock.as_ref() else {
            return 0;
        };
        let mut buf: Vec<u8> = vec![0u8; RECV_BUFFER_SIZE];
        let mut discarded: usize = 0;
        loop {
            match sock.try_recv(&mut buf) {
                Ok(len) => {
                    trace!("discarding stale {:02X?}", &buf[..len]);
                    discarded += 1;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    // e.g. an ICMP port unreachable left over from an earlier send
                    debug!("error while draining socket: {}", e);
                    break;
                }
            }
        }
        if discarded > 0 {
            debug!("discarded {} stale datagrams", discarded);
        }
        discarded
    }

    fn is_connected(&self) -> bool {
        self.sock.as_ref().is_some_and(|s| s.peer_addr().is_ok())
    }

    async fn close(&mut self) {
        if self.sock.take().is_some() {
            debug!("closed UDP socket");
        }
    }
}

/// Run `fut` until it finishes, `dur` elapses or `cancel` fires, whichever is first.
async fn with_deadline<F: Future>(
    dur: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, SourceQueryError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SourceQueryError::Cancelled),
        res = timeout(dur, fut) => res.map_err(|_| SourceQueryError::Timeout),
    }
}
