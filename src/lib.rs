//! Pure Rust async implementation of the [Source Server Query Protocol](https://developer.valvesoftware.com/wiki/Server_queries):
//! A2S_INFO, A2S_PLAYER and A2S_RULES.
pub mod address;
pub mod config;
pub mod error;
pub mod info;
pub mod packet;
pub mod player;
pub mod query;
pub mod rules;
pub mod transport;
mod parse;

pub use config::{ChallengePolicy, QueryConfig};
pub use error::SourceQueryError;
pub use info::{Environment, ServerInfo, ServerType, ShipInfo, SourceTv, Visibility};
pub use player::Player;
pub use query::{query_info, Anomaly, QueryKind, QueryOutcome, ServerQuery};
pub use rules::Rule;
pub use transport::{Transport, UdpTransport};
