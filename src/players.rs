use std::time::Duration;

use log::trace;

use crate::error::QueryError;
use crate::packet::PacketType;
use crate::parse::{find_terminator, get_f32, get_u8, lossy_string};

/// One entry of an A2S_PLAYER response.
///
/// Order within a response carries no meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub score: i32,
    /// Seconds since the player connected, as reported by the server.
    pub connected_seconds: f32,
}

impl PlayerRecord {
    /// Connected time as a [Duration]; negative or non-finite values become zero.
    pub fn connected(&self) -> Duration {
        Duration::try_from_secs_f32(self.connected_seconds).unwrap_or(Duration::ZERO)
    }
}

/// Bytes following a name terminator: score, three ignored bytes, connected time.
const ENTRY_TAIL: usize = 8;

/// Decode an A2S_PLAYER response.
///
/// Entries are found by scanning for name terminators rather than trusting the
/// player count, so a truncated trailing entry is dropped instead of failing
/// the whole response.
pub fn decode_players(data: &[u8]) -> Result<Vec<PlayerRecord>, QueryError> {
    let mut players = Vec::new();

    if PacketType::of(data) == Some(PacketType::Challenge) {
        return Err(QueryError::MalformedResponse("unexpected challenge in player response"));
    }

    // the first zero is the index byte of the first entry
    let mut start = match find_terminator(data, 0) {
        Some(first) => first + 1,
        None => return Ok(players),
    };

    while start < data.len() {
        let Some(terminator) = find_terminator(data, start) else {
            break;
        };
        if terminator + ENTRY_TAIL >= data.len() {
            trace!("Dropping truncated player entry at offset {}", start);
            break;
        }

        let name = lossy_string(&data[start..terminator]);
        let mut offset = terminator + 1;
        let score = i32::from(get_u8(data, &mut offset)?);
        offset += 3;
        let connected_seconds = get_f32(data, &mut offset)?;

        trace!("Decoded player {:?} ({} points, {}s)", name, score, connected_seconds);
        players.push(PlayerRecord {
            name,
            score,
            connected_seconds,
        });

        // skip the index byte of the next entry
        start = offset + 1;
    }

    Ok(players)
}
