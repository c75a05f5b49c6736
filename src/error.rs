use std::io;

use thiserror::Error;
use tokio::time::error::Elapsed;

/// Everything that can go wrong while talking to a server.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no response within the configured timeout")]
    Timeout(#[from] Elapsed),
    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),
    #[error("failed to bind a local port: {0}")]
    FailedPortBind(#[source] io::Error),
    #[error("host unreachable: {0}")]
    UnreachableHost(#[source] io::Error),
    #[error("failed to send packet: {0}")]
    SendError(#[source] io::Error),
    #[error("failed to receive packet: {0}")]
    ReceiveError(#[source] io::Error),
    #[error("invalid address `{0}`, expected host:port")]
    InvalidAddress(String),
    #[error("`{0}` did not resolve to any address")]
    NoAddress(String),
}

impl QueryError {
    /// `true` for the "server offline right now" case.
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout(_))
    }
}

/// The only failure a caller of [crate::QueryClient] ever sees.
///
/// Carries no detail: the sensible reaction is always to try again on the next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("query failed")]
pub struct QueryFailure;

impl From<QueryError> for QueryFailure {
    fn from(_: QueryError) -> Self {
        QueryFailure
    }
}
