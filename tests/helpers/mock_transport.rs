use a2squery::{SourceQueryError, Transport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Replays scripted replies and records every request it is given.
pub struct MockTransport {
    replies: VecDeque<Result<Vec<u8>, SourceQueryError>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: bool,
}

impl MockTransport {
    pub fn new(replies: Vec<Vec<u8>>) -> Self {
        Self::with_results(replies.into_iter().map(Ok).collect())
    }

    pub fn with_results(replies: Vec<Result<Vec<u8>, SourceQueryError>>) -> Self {
        Self {
            replies: replies.into(),
            sent: Arc::new(Mutex::new(Vec::new())),
            closed: false,
        }
    }

    /// Handle to the requests sent so far, usable after the mock is moved.
    pub fn sent(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.sent)
    }

    pub fn remote() -> SocketAddr {
        "127.0.0.1:27015".parse().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8], cancel: &CancellationToken) -> Result<usize, SourceQueryError> {
        if cancel.is_cancelled() {
            return Err(SourceQueryError::Cancelled);
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    async fn recv(&mut self, cancel: &CancellationToken) -> Result<(Vec<u8>, SocketAddr), SourceQueryError> {
        if cancel.is_cancelled() {
            return Err(SourceQueryError::Cancelled);
        }
        // let other tasks run, as a real socket would
        tokio::task::yield_now().await;
        let reply = self.replies.pop_front().unwrap_or(Err(SourceQueryError::Timeout))?;
        Ok((reply, Self::remote()))
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
