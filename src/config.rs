use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_TIMEOUT_MS: u64 = 2000;
const DEFAULT_MAX_CHALLENGE_RETRIES: u8 = 3;

/// Whether a query's first reply must be an S2C_CHALLENGE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePolicy {
    /// The server may answer directly or challenge first.
    Optional,
    /// A direct answer to the first request is treated as a protocol anomaly.
    Required,
}

/// Settings for a [crate::query::ServerQuery].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub send_timeout: Duration,
    pub receive_timeout: Duration,
    /// How many times a challenged request is resent before giving up.
    pub max_challenge_retries: u8,
    /// Servers disagree on whether A2S_RULES is challenged.
    pub rules_challenge: ChallengePolicy,
    /// Local address to bind the UDP socket to.
    pub local_addr: SocketAddr,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            receive_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_challenge_retries: DEFAULT_MAX_CHALLENGE_RETRIES,
            rules_challenge: ChallengePolicy::Required,
            local_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        }
    }
}

impl QueryConfig {
    /// A zero duration falls back to the default.
    pub fn with_timeouts(mut self, send: Duration, receive: Duration) -> Self {
        self.send_timeout = non_zero_or_default(send);
        self.receive_timeout = non_zero_or_default(receive);
        self
    }

    pub fn with_max_challenge_retries(mut self, retries: u8) -> Self {
        self.max_challenge_retries = retries;
        self
    }

    pub fn with_rules_challenge(mut self, policy: ChallengePolicy) -> Self {
        self.rules_challenge = policy;
        self
    }

    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = addr;
        self
    }
}

fn non_zero_or_default(dur: Duration) -> Duration {
    if dur.is_zero() {
        Duration::from_millis(DEFAULT_TIMEOUT_MS)
    } else {
        dur
    }
}
