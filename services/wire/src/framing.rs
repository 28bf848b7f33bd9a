//! Length-prefixed framing
//!
//! Each message on the wire is an ASCII decimal byte count, a newline,
//! then exactly that many bytes of XML. Responses are framed the same
//! way. The length line is read byte-by-byte so no payload bytes are
//! consumed ahead of the frame boundary.

use std::io::{Read, Write};

use crate::WireError;

/// Upper bound on a single frame; anything larger is rejected rather
/// than buffered.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Read one frame, returning `None` on a clean end-of-stream before any
/// length byte
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<String>, WireError> {
    let mut length_line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte)? {
            0 => {
                if length_line.is_empty() {
                    return Ok(None);
                }
                return Err(WireError::malformed("connection closed inside length prefix"));
            }
            _ => {
                if byte[0] == b'\n' {
                    break;
                }
                if length_line.len() >= 20 {
                    return Err(WireError::malformed("length prefix too long"));
                }
                length_line.push(byte[0]);
            }
        }
    }

    let length: usize = std::str::from_utf8(&length_line)
        .ok()
        .map(str::trim)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| WireError::malformed("length prefix is not a number"))?;
    if length > MAX_FRAME_LEN {
        return Err(WireError::malformed("frame exceeds maximum length"));
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload)?;
    let text = String::from_utf8(payload)
        .map_err(|_| WireError::malformed("frame is not valid UTF-8"))?;
    Ok(Some(text))
}

/// Write one frame: length line then payload
pub fn write_frame<W: Write>(writer: &mut W, payload: &str) -> Result<(), WireError> {
    writer.write_all(payload.len().to_string().as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(payload.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_round_trip() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, "<create/>").unwrap();
        assert_eq!(buffer, b"9\n<create/>");

        let mut reader = Cursor::new(buffer);
        assert_eq!(read_frame(&mut reader).unwrap(), Some("<create/>".to_string()));
        // Stream exhausted cleanly.
        assert_eq!(read_frame(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_two_frames_back_to_back() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, "<a/>").unwrap();
        write_frame(&mut buffer, "<bb/>").unwrap();

        let mut reader = Cursor::new(buffer);
        assert_eq!(read_frame(&mut reader).unwrap(), Some("<a/>".to_string()));
        assert_eq!(read_frame(&mut reader).unwrap(), Some("<bb/>".to_string()));
        assert_eq!(read_frame(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_non_numeric_length_rejected() {
        let mut reader = Cursor::new(b"abc\n<a/>".to_vec());
        let err = read_frame(&mut reader).unwrap_err();
        assert!(err.to_string().contains("length prefix is not a number"));
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut reader = Cursor::new(format!("{}\n", MAX_FRAME_LEN + 1).into_bytes());
        let err = read_frame(&mut reader).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn test_truncated_payload_is_io_error() {
        let mut reader = Cursor::new(b"10\n<a/>".to_vec());
        assert!(matches!(
            read_frame(&mut reader).unwrap_err(),
            WireError::Io(_)
        ));
    }

    #[test]
    fn test_eof_inside_length_prefix() {
        let mut reader = Cursor::new(b"12".to_vec());
        let err = read_frame(&mut reader).unwrap_err();
        assert!(err.to_string().contains("closed inside length prefix"));
    }

    #[test]
    fn test_carriage_return_tolerated() {
        let mut reader = Cursor::new(b"4\r\n<a/>".to_vec());
        assert_eq!(read_frame(&mut reader).unwrap(), Some("<a/>".to_string()));
    }
}
