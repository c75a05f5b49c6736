use log::warn;

use crate::error::QueryError;
use crate::parse::{find_terminator, get_string, get_u8};

/// Server information as obtained by [crate::QueryClient::fetch_info].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server hostname
    pub name: String,
    /// Current map (terrain)
    pub map: String,
    /// Mission currently being played
    pub mission: String,
    /// Current players
    pub player_count: u8,
    /// Max players
    pub player_limit: u8,
}

/// Byte preceding the server name in an A2S_INFO response.
const NAME_MARKER: u8 = 0x11;

/// Distance from the mission terminator to the player count.
const PLAYER_COUNT_OFFSET: usize = 3;

/// Decode an A2S_INFO response.
///
/// Layout after the marker: name, map, one skipped field, mission (all
/// zero-terminated), two fixed bytes, then player count and player limit.
pub fn decode_info(data: &[u8]) -> Result<ServerInfo, QueryError> {
    decode(data).map_err(|err| {
        warn!("Failed to decode info response of {} bytes: {}", data.len(), err);
        err
    })
}

fn decode(data: &[u8]) -> Result<ServerInfo, QueryError> {
    let marker = data
        .iter()
        .position(|&c| c == NAME_MARKER)
        .ok_or(QueryError::MalformedResponse("missing info marker"))?;

    let mut offset: usize = marker + 1;
    let name = get_string(data, &mut offset)?;
    let map = get_string(data, &mut offset)?;

    let skipped = find_terminator(data, offset)
        .ok_or(QueryError::MalformedResponse("missing folder field"))?;
    offset = skipped + 1;

    let mission = get_string(data, &mut offset)?;

    // get_string left us one past the terminator
    offset += PLAYER_COUNT_OFFSET - 1;
    let player_count = get_u8(data, &mut offset)?;
    let player_limit = get_u8(data, &mut offset)?;

    Ok(ServerInfo {
        name,
        map,
        mission,
        player_count,
        player_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 5] = [0xFF, 0xFF, 0xFF, 0xFF, 0x49];

    fn fabricate(info: &ServerInfo, folder: &str) -> Vec<u8> {
        let mut data = HEADER.to_vec();
        data.push(NAME_MARKER);
        for field in [info.name.as_str(), info.map.as_str(), folder, info.mission.as_str()] {
            data.extend_from_slice(field.as_bytes());
            data.push(0);
        }
        // app id
        data.extend_from_slice(&[0xA2, 0x6B]);
        data.push(info.player_count);
        data.push(info.player_limit);
        // bots, server type, environment, visibility, vac
        data.extend_from_slice(&[0, b'd', b'w', 0, 0]);
        data
    }

    #[test]
    fn decodes_info_response() {
        let mut data = HEADER.to_vec();
        data.push(NAME_MARKER);
        data.extend_from_slice(b"MyServer\0de_dust\0\0briefing\0");
        data.extend_from_slice(&[0x00, 0x00, 0x05, 0x10, 0x00]);

        assert_eq!(
            decode_info(&data).unwrap(),
            ServerInfo {
                name: "MyServer".to_owned(),
                map: "de_dust".to_owned(),
                mission: "briefing".to_owned(),
                player_count: 5,
                player_limit: 16,
            }
        );
    }

    #[test]
    fn refabricated_response_decodes_identically() {
        let original = ServerInfo {
            name: "[EU] Achilles Public Zeus".to_owned(),
            map: "Altis".to_owned(),
            mission: "Zeus Sandbox".to_owned(),
            player_count: 12,
            player_limit: 64,
        };
        let first = decode_info(&fabricate(&original, "arma3")).unwrap();
        assert_eq!(first, original);

        let second = decode_info(&fabricate(&first, "")).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn invalid_text_is_replaced() {
        let mut data = HEADER.to_vec();
        data.push(NAME_MARKER);
        data.extend_from_slice(&[b'M', 0xFC, b'n', b'c', b'h', b'e', b'n', 0]);
        data.extend_from_slice(b"Tanoa\0arma3\0Escape\0");
        data.extend_from_slice(&[0, 0, 1, 10]);

        let info = decode_info(&data).unwrap();
        assert_eq!(info.name, "M\u{FFFD}nchen");
        assert_eq!(info.map, "Tanoa");
        assert_eq!(info.mission, "Escape");
        assert_eq!((info.player_count, info.player_limit), (1, 10));
    }

    #[test]
    fn missing_marker_is_malformed() {
        assert!(matches!(decode_info(&[]), Err(QueryError::MalformedResponse(_))));
        assert!(matches!(
            decode_info(&HEADER),
            Err(QueryError::MalformedResponse(_))
        ));
    }

    #[test]
    fn truncated_response_is_malformed() {
        let mut data = HEADER.to_vec();
        data.push(NAME_MARKER);
        data.extend_from_slice(b"MyServer\0de_dust\0\0briefing\0");
        for cut in (HEADER.len() + 1)..data.len() {
            assert!(decode_info(&data[..cut]).is_err(), "cut at {}", cut);
        }

        // fields present but the counts are missing
        data.extend_from_slice(&[0, 0, 5]);
        assert!(matches!(
            decode_info(&data),
            Err(QueryError::MalformedResponse(_))
        ));
    }
}
