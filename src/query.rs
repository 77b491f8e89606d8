use std::fmt;
use std::net::SocketAddr;

use log::{debug, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::address::resolve;
use crate::config::{ChallengePolicy, QueryConfig};
use crate::error::SourceQueryError;
use crate::info::ServerInfo;
use crate::packet::{PacketType, RequestPacket, ResponsePacket, NO_CHALLENGE};
use crate::player::Player;
use crate::rules::Rule;
use crate::transport::{Transport, UdpTransport};

/// Why a query produced no data even though nothing failed outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// The first reply should have been a challenge but was not.
    MissingChallenge { header: u8 },
    /// The final reply carried neither a challenge nor the expected header.
    UnexpectedHeader { expected: u8, header: u8 },
    /// The server kept sending challenges.
    ChallengeExhausted { retries: u8 },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::MissingChallenge { header } => {
                write!(f, "expected a challenge, got header {:#04x}", header)
            }
            Anomaly::UnexpectedHeader { expected, header } => {
                write!(f, "expected header {:#04x}, got {:#04x}", expected, header)
            }
            Anomaly::ChallengeExhausted { retries } => {
                write!(f, "still challenged after {} retries", retries)
            }
        }
    }
}

/// The result of a query that did not fail: either data, or a reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    Data(T),
    NoData(Anomaly),
}

impl<T> QueryOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            QueryOutcome::Data(data) => Some(data),
            QueryOutcome::NoData(_) => None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryOutcome::Data(data) => Some(data),
            QueryOutcome::NoData(_) => None,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, QueryOutcome::Data(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryOutcome<U> {
        match self {
            QueryOutcome::Data(data) => QueryOutcome::Data(f(data)),
            QueryOutcome::NoData(anomaly) => QueryOutcome::NoData(anomaly),
        }
    }
}

/// What differs between the three queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryKind {
    pub name: &'static str,
    pub opcode: u8,
    pub success_header: u8,
    pub challenge: ChallengePolicy,
}

impl QueryKind {
    pub const INFO: QueryKind = QueryKind {
        name: "A2S_INFO",
        opcode: PacketType::INFO_REQUEST,
        success_header: PacketType::INFO_RESPONSE,
        challenge: ChallengePolicy::Optional,
    };
    pub const PLAYER: QueryKind = QueryKind {
        name: "A2S_PLAYER",
        opcode: PacketType::PLAYER_REQUEST,
        success_header: PacketType::PLAYER_RESPONSE,
        challenge: ChallengePolicy::Required,
    };
    pub const RULES: QueryKind = QueryKind {
        name: "A2S_RULES",
        opcode: PacketType::RULES_REQUEST,
        success_header: PacketType::RULES_RESPONSE,
        challenge: ChallengePolicy::Required,
    };

    fn request(&self, challenge: Option<[u8; 4]>) -> RequestPacket {
        if self.opcode == PacketType::INFO_REQUEST {
            RequestPacket::info(challenge)
        } else {
            let challenge: i32 = challenge.map_or(NO_CHALLENGE, i32::from_le_bytes);
            RequestPacket::generic(self.opcode, challenge)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Connected, no exchange in flight.
    Bound,
    Active,
    Closed,
}

struct Session<T> {
    transport: T,
    state: State,
}

/// A query client bound to one server.
///
/// Queries on the same instance are serialized, since replies on the shared
/// socket can't be told apart.
pub struct ServerQuery<T: Transport = UdpTransport> {
    session: Mutex<Session<T>>,
    remote: SocketAddr,
    config: QueryConfig,
}

impl ServerQuery<UdpTransport> {
    /// Resolve `address` (see [crate::address::parse_address]) and connect a UDP socket to it.
    pub async fn connect(address: &str, config: QueryConfig) -> Result<Self, SourceQueryError> {
        let remote: SocketAddr = resolve(address).await?;
        Self::connect_addr(remote, config).await
    }

    pub async fn connect_addr(remote: SocketAddr, config: QueryConfig) -> Result<Self, SourceQueryError> {
        let transport: UdpTransport = UdpTransport::connect(remote, &config).await?;
        Ok(Self::with_transport(transport, remote, config))
    }
}

impl<T: Transport> ServerQuery<T> {
    pub fn with_transport(transport: T, remote: SocketAddr, config: QueryConfig) -> Self {
        ServerQuery {
            session: Mutex::new(Session {
                transport,
                state: State::Bound,
            }),
            remote,
            config,
        }
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        let session = self.session.lock().await;
        session.state != State::Closed && session.transport.is_connected()
    }

    /// Close the underlying transport. Later queries fail with [SourceQueryError::Closed].
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        if session.state != State::Closed {
            session.transport.close().await;
            session.state = State::Closed;
        }
    }

    /// Query server information with A2S_INFO.
    ///
    /// Example usage:
    /// ```no_run
    /// # async fn run() -> Result<(), a2squery::SourceQueryError> {
    /// use a2squery::{QueryConfig, ServerQuery};
    ///
    /// let query = ServerQuery::connect("nyc-1.us.uncletopia.com:27015", QueryConfig::default()).await?;
    /// if let Some(info) = query.info().await?.into_option() {
    ///     println!("{} on {}", info.name, info.map);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn info(&self) -> Result<QueryOutcome<ServerInfo>, SourceQueryError> {
        self.info_with_cancellation(&CancellationToken::new()).await
    }

    pub async fn info_with_cancellation(
        &self,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<ServerInfo>, SourceQueryError> {
        self.run_query(QueryKind::INFO, cancel, ServerInfo::parse).await
    }

    /// Query the player list with A2S_PLAYER.
    pub async fn players(&self) -> Result<QueryOutcome<Vec<Player>>, SourceQueryError> {
        self.players_with_cancellation(&CancellationToken::new()).await
    }

    pub async fn players_with_cancellation(
        &self,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<Vec<Player>>, SourceQueryError> {
        self.run_query(QueryKind::PLAYER, cancel, Player::parse_list).await
    }

    /// Query server rules with A2S_RULES.
    pub async fn rules(&self) -> Result<QueryOutcome<Vec<Rule>>, SourceQueryError> {
        self.rules_with_cancellation(&CancellationToken::new()).await
    }

    pub async fn rules_with_cancellation(
        &self,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome<Vec<Rule>>, SourceQueryError> {
        let kind = QueryKind {
            challenge: self.config.rules_challenge,
            ..QueryKind::RULES
        };
        self.run_query(kind, cancel, Rule::parse_list).await
    }

    /// Send `kind`'s request, answer challenges, and decode the reply with `decode`.
    pub async fn run_query<R>(
        &self,
        kind: QueryKind,
        cancel: &CancellationToken,
        decode: fn(&[u8]) -> Result<R, SourceQueryError>,
    ) -> Result<QueryOutcome<R>, SourceQueryError> {
        let mut session = self.session.lock().await;
        if session.state == State::Closed {
            return Err(SourceQueryError::Closed);
        }

        session.state = State::Active;
        let result = exchange(&mut session.transport, kind, self.config.max_challenge_retries, cancel).await;
        session.state = State::Bound;
        drop(session);

        let packet: ResponsePacket = match result? {
            QueryOutcome::Data(packet) => packet,
            QueryOutcome::NoData(anomaly) => {
                warn!("{} to {} returned no data: {}", kind.name, self.remote, anomaly);
                return Ok(QueryOutcome::NoData(anomaly));
            }
        };

        if packet.body().is_empty() {
            return Err(SourceQueryError::EmptyResponse(kind.name));
        }
        decode(packet.body()).map(QueryOutcome::Data)
    }
}

/// The request/challenge/response sequence. Returns the final packet carrying
/// `kind.success_header`.
async fn exchange<T: Transport>(
    transport: &mut T,
    kind: QueryKind,
    max_retries: u8,
    cancel: &CancellationToken,
) -> Result<QueryOutcome<ResponsePacket>, SourceQueryError> {
    // a reply to an earlier, timed out exchange must not answer this one
    transport.discard_pending().await;

    // sending initial packet
    let mut packet: ResponsePacket = send_recv(transport, kind.request(None), cancel).await?;

    if kind.challenge == ChallengePolicy::Required && !packet.is_challenge() {
        return Ok(QueryOutcome::NoData(Anomaly::MissingChallenge {
            header: packet.header(),
        }));
    }

    // absolving challenge
    let mut retries: u8 = 0;
    while packet.is_challenge() && retries < max_retries {
        let challenge: [u8; 4] = packet.challenge()?;
        debug!("{} challenged with {:02X?}", kind.name, challenge);
        packet = send_recv(transport, kind.request(Some(challenge)), cancel).await?;
        retries += 1;
    }

    if packet.is_challenge() {
        return Ok(QueryOutcome::NoData(Anomaly::ChallengeExhausted { retries }));
    }
    if packet.header() != kind.success_header {
        return Ok(QueryOutcome::NoData(Anomaly::UnexpectedHeader {
            expected: kind.success_header,
            header: packet.header(),
        }));
    }

    Ok(QueryOutcome::Data(packet))
}

async fn send_recv<T: Transport>(
    transport: &mut T,
    packet: RequestPacket,
    cancel: &CancellationToken,
) -> Result<ResponsePacket, SourceQueryError> {
    // sending
    transport.send(&packet.pack(), cancel).await?;

    // receiving packet
    let (data, source) = transport.recv(cancel).await?;
    debug!("received {} bytes from {}", data.len(), source);

    ResponsePacket::unpack(&data)
}

/// Query `address` once with A2S_INFO, closing the socket afterwards.
pub async fn query_info(address: &str, config: QueryConfig) -> Result<Option<ServerInfo>, SourceQueryError> {
    let query: ServerQuery = ServerQuery::connect(address, config).await?;
    let outcome: QueryOutcome<ServerInfo> = query.info().await?;
    query.close().await;
    Ok(outcome.into_option())
}
