use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};

use crate::error::{QueryError, QueryFailure};
use crate::info::{decode_info, ServerInfo};
use crate::packet::{
    decode_challenge, encode_challenge_request, encode_info_request, encode_player_request,
};
use crate::players::{decode_players, PlayerRecord};
use crate::transport::Transport;

/// Host and query port of a server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ServerAddress {
            host: host.into(),
            port,
        }
    }

    /// Arma answers queries on the port right after its game port.
    ///
    /// Returns `None` if `game_port` is the last valid port.
    pub fn from_game_port(host: impl Into<String>, game_port: u16) -> Option<Self> {
        Some(ServerAddress::new(host, game_port.checked_add(1)?))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ServerAddress {
    type Err = QueryError;

    /// Parse `host:port`, with IPv6 hosts written as `[addr]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QueryError::InvalidAddress(s.to_owned());

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        let host = match host.strip_prefix('[') {
            Some(inner) => inner.strip_suffix(']').ok_or_else(invalid)?,
            None if host.contains(':') => return Err(invalid()),
            None => host,
        };
        if host.is_empty() {
            return Err(invalid());
        }
        let port: u16 = port.parse().map_err(|_| invalid())?;

        Ok(ServerAddress::new(host, port))
    }
}

/// Knobs for a [QueryClient].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long to wait for each datagram; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Receive buffer size; longer datagrams are truncated.
    pub buffer_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            timeout: Some(Self::DEFAULT_TIMEOUT),
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
        }
    }
}

impl QueryConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    /// According to the Valve wiki, Source query responses use 1400 bytes + IP/UDP headers.
    pub const DEFAULT_BUFFER_SIZE: usize = 1400;

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Read `ARMAQUERY_TIMEOUT_MS` (`0` disables the timeout) and
    /// `ARMAQUERY_BUFFER_SIZE`, keeping defaults for anything absent or invalid.
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("ARMAQUERY_TIMEOUT_MS").ok().as_deref(),
            env::var("ARMAQUERY_BUFFER_SIZE").ok().as_deref(),
        )
    }

    fn from_vars(timeout_ms: Option<&str>, buffer_size: Option<&str>) -> Self {
        let defaults = QueryConfig::default();
        QueryConfig {
            timeout: match timeout_ms.and_then(|v| v.trim().parse::<u64>().ok()) {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.timeout,
            },
            buffer_size: buffer_size
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|&size| size > 0)
                .unwrap_or(defaults.buffer_size),
        }
    }
}

/// Snapshot of one polling cycle as produced by [QueryClient::fetch_status].
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatus {
    info: Option<ServerInfo>,
    players: Vec<PlayerRecord>,
}

impl ServerStatus {
    pub fn offline() -> Self {
        ServerStatus {
            info: None,
            players: Vec::new(),
        }
    }

    /// `None` when the server did not answer the info query.
    pub fn info(&self) -> Option<&ServerInfo> {
        self.info.as_ref()
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn is_online(&self) -> bool {
        self.info.is_some()
    }
}

/// Info and player queries against one server.
///
/// Performs exactly one round trip per info query and two per player query,
/// never retrying; polling and backoff belong to the caller.
#[derive(Debug)]
pub struct QueryClient {
    transport: Transport,
}

impl QueryClient {
    /// Open a socket to `address`. Failing to do so is the one error that is
    /// not folded into [QueryFailure].
    pub async fn connect(address: &ServerAddress, config: QueryConfig) -> Result<Self, QueryError> {
        let transport = Transport::connect(address, config.timeout, config.buffer_size).await?;
        Ok(QueryClient::new(transport))
    }

    pub fn new(transport: Transport) -> Self {
        QueryClient { transport }
    }

    /// Query the A2S_INFO of the server.
    ///
    /// Example usage:
    /// ```no_run
    /// # async fn run() -> Result<(), armaquery::QueryError> {
    /// use armaquery::{QueryClient, QueryConfig, ServerAddress};
    ///
    /// let address = ServerAddress::from_game_port("127.0.0.1", 2302).unwrap();
    /// let mut client = QueryClient::connect(&address, QueryConfig::default()).await?;
    /// match client.fetch_info().await {
    ///     Ok(info) => println!("{} on {}", info.mission, info.map),
    ///     Err(_) => println!("offline"),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_info(&mut self) -> Result<ServerInfo, QueryFailure> {
        let response = self.transport.round_trip(&encode_info_request()).await?;
        Ok(decode_info(&response)?)
    }

    /// Query the player list with a challenge followed by the actual A2S_PLAYER request.
    ///
    /// A server that answers the second request by repeating its challenge
    /// reply has no player data ready yet, which yields an empty list.
    pub async fn fetch_players(&mut self) -> Result<Vec<PlayerRecord>, QueryFailure> {
        let challenge_response = self.transport.round_trip(&encode_challenge_request()).await?;
        let token = decode_challenge(&challenge_response)?;
        debug!("Received {:?}", token);

        let response = self.transport.round_trip(&encode_player_request(&token)).await?;
        if response.get(5..) == challenge_response.get(5..) {
            debug!("Player response repeats the challenge, treating as empty");
            return Ok(Vec::new());
        }

        Ok(decode_players(&response)?)
    }

    /// Info query, followed by a player query if the server answered.
    ///
    /// A failed player query after a successful info query leaves the server
    /// online with no listed players.
    pub async fn fetch_status(&mut self) -> ServerStatus {
        let info = match self.fetch_info().await {
            Ok(info) => info,
            Err(_) => {
                info!("Server at {:?} is offline", self.transport.peer_addr().ok());
                return ServerStatus::offline();
            }
        };
        let players = self.fetch_players().await.unwrap_or_default();

        ServerStatus {
            info: Some(info),
            players,
        }
    }
}
