//! Pure Rust async client for the A2S info and player queries of the
//! [Source Query Protocol](https://developer.valvesoftware.com/wiki/Server_queries),
//! as answered by Arma game servers.
pub mod error;
pub mod info;
pub mod packet;
mod parse;
pub mod players;
pub mod query;
pub mod transport;

pub use error::{QueryError, QueryFailure};
pub use info::ServerInfo;
pub use packet::ChallengeToken;
pub use players::PlayerRecord;
pub use query::{QueryClient, QueryConfig, ServerAddress, ServerStatus};
pub use transport::Transport;
