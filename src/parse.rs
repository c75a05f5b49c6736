use byteorder::{ByteOrder, LittleEndian};

use crate::error::QueryError;

/// Index of the first zero byte at or after `offset`.
pub fn find_terminator(data: &[u8], offset: usize) -> Option<usize> {
    data.get(offset..)?
        .iter()
        .position(|&c| c == 0)
        .map(|pos| offset + pos)
}

/// Decode `bytes` as text, replacing invalid sequences instead of failing.
pub fn lossy_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Get the value of a null-terminated string
/// with index 0 at `offset` in an array of bytes.
///
/// Mutates `offset` to the index after the null-termination byte.
/// Fails if no terminator follows `offset`.
pub fn get_string(data: &[u8], offset: &mut usize) -> Result<String, QueryError> {
    let end_offset = find_terminator(data, *offset)
        .ok_or(QueryError::MalformedResponse("unterminated string"))?;
    let value = lossy_string(&data[*offset..end_offset]);
    *offset = end_offset + 1;

    Ok(value)
}

/// Get the [u8] at index `offset` from `data`.
///
/// Mutates `offset` to the index after the byte.
pub fn get_u8(data: &[u8], offset: &mut usize) -> Result<u8, QueryError> {
    let byte = *data
        .get(*offset)
        .ok_or(QueryError::MalformedResponse("response too short"))?;
    *offset += 1;

    Ok(byte)
}

/// Get 4 bytes (as a little-endian [f32]) at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_f32(data: &[u8], offset: &mut usize) -> Result<f32, QueryError> {
    let bytes = data
        .get(*offset..*offset + 4)
        .ok_or(QueryError::MalformedResponse("response too short"))?;
    *offset += 4;

    Ok(LittleEndian::read_f32(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_terminator_from_offset() {
        let data = b"ab\0cd\0";
        assert_eq!(find_terminator(data, 0), Some(2));
        assert_eq!(find_terminator(data, 3), Some(5));
        assert_eq!(find_terminator(data, 6), None);
        assert_eq!(find_terminator(data, 42), None);
    }

    #[test]
    fn get_string_advances_past_terminator() {
        let data = b"Altis\0Stratis\0";
        let mut offset = 0;
        assert_eq!(get_string(data, &mut offset).unwrap(), "Altis");
        assert_eq!(offset, 6);
        assert_eq!(get_string(data, &mut offset).unwrap(), "Stratis");
        assert_eq!(offset, data.len());
    }

    #[test]
    fn get_string_replaces_invalid_bytes() {
        let data = [b'J', 0xE4, b'g', b'e', b'r', 0];
        let mut offset = 0;
        assert_eq!(get_string(&data, &mut offset).unwrap(), "J\u{FFFD}ger");
    }

    #[test]
    fn get_string_without_terminator_is_malformed() {
        let mut offset = 0;
        assert!(matches!(
            get_string(b"open", &mut offset),
            Err(QueryError::MalformedResponse(_))
        ));
        assert_eq!(offset, 0);
    }

    #[test]
    fn reads_little_endian_f32() {
        let data = 90.5f32.to_le_bytes();
        let mut offset = 0;
        assert_eq!(get_f32(&data, &mut offset).unwrap(), 90.5);
        assert_eq!(offset, 4);
        assert!(get_f32(&data, &mut offset).is_err());
    }

    #[test]
    fn get_u8_out_of_bounds() {
        let mut offset = 1;
        assert!(get_u8(&[7], &mut offset).is_err());
        offset = 0;
        assert_eq!(get_u8(&[7], &mut offset).unwrap(), 7);
    }
}
