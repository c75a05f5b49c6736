use std::fmt;
use std::ops::Range;

use crate::error::QueryError;

/// Marker that prefixes every single-datagram request and response.
pub const SINGLE_PACKET_HEADER: [u8; 4] = [0xFF; 4];

/// Body of an A2S_INFO request.
const INFO_REQUEST_BODY: &[u8] = b"Source Engine Query\0";

/// Challenge value sent when asking the server for a fresh one.
const NEUTRAL_CHALLENGE: [u8; 4] = [0xFF; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// A2S_INFO Request -- https://developer.valvesoftware.com/wiki/Server_queries#A2S_INFO
    InfoRequest,
    /// A2S_PLAYER Request -- https://developer.valvesoftware.com/wiki/Server_queries#A2S_PLAYER
    ///
    /// Used both to ask for a challenge and, with the challenge echoed back, for player data.
    PlayerRequest,
    /// S2C_CHALLENGE
    Challenge,
    /// A2S_INFO Response, decoded by [crate::info::decode_info].
    InfoResponse,
    /// A2S_PLAYER Response, decoded by [crate::players::decode_players].
    PlayerResponse,
}

impl TryFrom<u8> for PacketType {
    type Error = QueryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x54 => Ok(PacketType::InfoRequest),
            0x55 => Ok(PacketType::PlayerRequest),
            0x41 => Ok(PacketType::Challenge),
            0x49 => Ok(PacketType::InfoResponse),
            0x44 => Ok(PacketType::PlayerResponse),
            _ => Err(QueryError::MalformedResponse("unknown packet type")),
        }
    }
}

impl PacketType {
    pub fn to_byte(self) -> u8 {
        match self {
            PacketType::InfoRequest => 0x54, // 'T'
            PacketType::PlayerRequest => 0x55, // 'U'
            PacketType::Challenge => 0x41, // 'A'
            PacketType::InfoResponse => 0x49, // 'I'
            PacketType::PlayerResponse => 0x44, // 'D'
        }
    }

    /// Kind of a raw datagram, if it carries the single-packet header and a known type byte.
    pub fn of(datagram: &[u8]) -> Option<PacketType> {
        if !datagram.starts_with(&SINGLE_PACKET_HEADER) {
            return None;
        }
        datagram.get(4).and_then(|&b| PacketType::try_from(b).ok())
    }
}

/// Anti-spoofing value handed out by the server.
///
/// Only valid for the player request that immediately follows it, so it is
/// never stored beyond a single [crate::QueryClient::fetch_players] call.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChallengeToken([u8; 4]);

impl ChallengeToken {
    const RANGE: Range<usize> = 5..9;

    pub fn new(bytes: [u8; 4]) -> Self {
        ChallengeToken(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Debug for ChallengeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChallengeToken({:02X?})", self.0)
    }
}

fn request(packet_type: PacketType, body: &[u8]) -> Vec<u8> {
    // packet structure: header, type, body
    let mut payload = Vec::with_capacity(SINGLE_PACKET_HEADER.len() + 1 + body.len());
    payload.extend_from_slice(&SINGLE_PACKET_HEADER);
    payload.push(packet_type.to_byte());
    payload.extend_from_slice(body);
    payload
}

/// `FF FF FF FF 'T' "Source Engine Query" 00`
pub fn encode_info_request() -> Vec<u8> {
    request(PacketType::InfoRequest, INFO_REQUEST_BODY)
}

/// `FF FF FF FF 'U' FF FF FF FF`
pub fn encode_challenge_request() -> Vec<u8> {
    request(PacketType::PlayerRequest, &NEUTRAL_CHALLENGE)
}

/// `FF FF FF FF 'U'` followed by the token exactly as the server sent it.
pub fn encode_player_request(token: &ChallengeToken) -> Vec<u8> {
    request(PacketType::PlayerRequest, token.as_bytes())
}

/// Extract the challenge token from bytes 5..9 of a challenge response.
pub fn decode_challenge(data: &[u8]) -> Result<ChallengeToken, QueryError> {
    let bytes: [u8; 4] = data
        .get(ChallengeToken::RANGE)
        .and_then(|b| b.try_into().ok())
        .ok_or(QueryError::MalformedResponse("challenge response too short"))?;

    Ok(ChallengeToken(bytes))
}
