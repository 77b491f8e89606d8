use thiserror::Error;

/// Everything that can go wrong while querying a server.
///
/// Protocol-sequencing anomalies (a server answering with the wrong header,
/// or challenging forever) are *not* errors; see [crate::query::QueryOutcome].
#[derive(Debug, Error)]
pub enum SourceQueryError {
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
    #[error("invalid server port: {0}")]
    InvalidPort(String),
    #[error("could not resolve host: {0}")]
    Unresolvable(String),

    #[error("failed to bind local socket: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to connect to host: {0}")]
    Connect(#[source] std::io::Error),
    #[error("failed to send packet: {0}")]
    Send(#[source] std::io::Error),
    #[error("failed to receive packet: {0}")]
    Receive(#[source] std::io::Error),

    #[error("operation timed out")]
    Timeout,
    #[error("operation was cancelled")]
    Cancelled,

    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),
    #[error("unknown packet header: {0}")]
    UnknownPacketHeader(i32),
    #[error("split responses are not supported")]
    SplitPacket,
    #[error("unknown server type: {0:#04x}")]
    UnknownServerType(u8),
    #[error("unknown server environment: {0:#04x}")]
    UnknownEnvironment(u8),
    #[error("unknown server visibility: {0}")]
    UnknownVisibility(u8),

    /// The server answered with the success header for the query, but no data.
    #[error("server did not respond to the {0} query")]
    EmptyResponse(&'static str),

    #[error("query client is closed")]
    Closed,
}

impl SourceQueryError {
    /// Whether this error came from decoding a response rather than from I/O or input.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            SourceQueryError::MalformedResponse(_)
                | SourceQueryError::UnknownPacketHeader(_)
                | SourceQueryError::SplitPacket
                | SourceQueryError::UnknownServerType(_)
                | SourceQueryError::UnknownEnvironment(_)
                | SourceQueryError::UnknownVisibility(_)
        )
    }
}
