use byteorder::{ByteOrder, LittleEndian};

use crate::error::SourceQueryError;

/// Borrow `len` bytes at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
fn take<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8], SourceQueryError> {
    let end: usize = offset
        .checked_add(len)
        .ok_or(SourceQueryError::MalformedResponse("offset overflow"))?;
    let bytes: &[u8] = data
        .get(*offset..end)
        .ok_or(SourceQueryError::MalformedResponse("unexpected end of packet"))?;
    *offset = end;
    Ok(bytes)
}

/// Get the value of a null-terminated string
/// with index 0 at `offset` in an array of bytes.
///
/// Invalid UTF-8 is replaced with U+FFFD; servers cut names at a byte
/// limit, which can split a multi-byte character.
///
/// Mutates `offset` to the index after the null-termination byte.
pub fn get_string(data: &[u8], offset: &mut usize) -> Result<String, SourceQueryError> {
    let rest: &[u8] = data
        .get(*offset..)
        .ok_or(SourceQueryError::MalformedResponse("unexpected end of packet"))?;
    let len: usize = rest
        .iter()
        .position(|c| *c == 0)
        .ok_or(SourceQueryError::MalformedResponse("unterminated string"))?;
    let value: String = String::from_utf8_lossy(&rest[..len]).into_owned();
    *offset += len + 1;

    Ok(value)
}

/// Get the [u8] at index `offset` from `data`.
///
/// Mutates `offset` to the index after the byte.
pub fn get_u8(data: &[u8], offset: &mut usize) -> Result<u8, SourceQueryError> {
    Ok(take(data, offset, 1)?[0])
}

/// Get 2 bytes (as a [u16]) at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_u16(data: &[u8], offset: &mut usize) -> Result<u16, SourceQueryError> {
    Ok(LittleEndian::read_u16(take(data, offset, 2)?))
}

/// Get 4 bytes (as an [i32]) at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_i32(data: &[u8], offset: &mut usize) -> Result<i32, SourceQueryError> {
    Ok(LittleEndian::read_i32(take(data, offset, 4)?))
}

/// Get 4 bytes (as an [f32]) at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_f32(data: &[u8], offset: &mut usize) -> Result<f32, SourceQueryError> {
    Ok(LittleEndian::read_f32(take(data, offset, 4)?))
}

/// Get 8 bytes (as a [u64]) at index `offset` from `data`.
///
/// Mutates `offset` to the index after the bytes.
pub fn get_u64(data: &[u8], offset: &mut usize) -> Result<u64, SourceQueryError> {
    Ok(LittleEndian::read_u64(take(data, offset, 8)?))
}

/// Get 4 raw bytes at index `offset` from `data`.
pub fn get_array4(data: &[u8], offset: &mut usize) -> Result<[u8; 4], SourceQueryError> {
    let bytes: &[u8] = take(data, offset, 4)?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_advances_past_terminator() {
        let data: &[u8] = b"de_dust2\0cstrike\0";
        let mut offset: usize = 0;
        assert_eq!(get_string(data, &mut offset).unwrap(), "de_dust2");
        assert_eq!(offset, 9);
        assert_eq!(get_string(data, &mut offset).unwrap(), "cstrike");
        assert_eq!(offset, data.len());
    }

    #[test]
    fn empty_string() {
        let mut offset: usize = 0;
        assert_eq!(get_string(&[0], &mut offset).unwrap(), "");
        assert_eq!(offset, 1);
    }

    #[test]
    fn unterminated_string_is_malformed() {
        let mut offset: usize = 0;
        let err = get_string(b"no terminator", &mut offset).unwrap_err();
        assert!(matches!(err, SourceQueryError::MalformedResponse(_)));
        assert_eq!(offset, 0);
    }

    #[test]
    fn invalid_utf8_string_is_replaced() {
        let mut offset: usize = 0;
        assert_eq!(get_string(&[0xC3, 0x28, 0x00], &mut offset).unwrap(), "\u{FFFD}(");
        assert_eq!(offset, 3);

        // a character cut in half by the server's name length limit
        let mut offset: usize = 0;
        assert_eq!(get_string(&[0x41, 0xE3, 0x83, 0x00], &mut offset).unwrap(), "A\u{FFFD}");
        assert_eq!(offset, 4);
    }

    #[test]
    fn integers_are_little_endian() {
        let data: [u8; 18] = [
            0x87, 0x69, // u16
            0x22, 0x9A, 0x34, 0x12, // i32
            0x00, 0x00, 0x80, 0x3F, // f32 1.0
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // u64
        ];
        let mut offset: usize = 0;
        assert_eq!(get_u16(&data, &mut offset).unwrap(), 0x6987);
        assert_eq!(get_i32(&data, &mut offset).unwrap(), 0x12349A22);
        assert_eq!(get_f32(&data, &mut offset).unwrap(), 1.0);
        assert_eq!(get_u64(&data, &mut offset).unwrap(), 0x0807060504030201);
        assert_eq!(offset, data.len());
    }

    #[test]
    fn short_reads_do_not_move_offset() {
        let data: [u8; 3] = [1, 2, 3];
        let mut offset: usize = 1;
        assert!(get_i32(&data, &mut offset).is_err());
        assert_eq!(offset, 1);
        assert!(get_u8(&data, &mut 3).is_err());
    }
}
