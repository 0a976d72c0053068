//! Signed decimal text shared by integer payloads and string length prefixes.
//!
//! Reading is permissive about leading zeros (`i007e` decodes as 7) but
//! writing never produces them, so a decode/encode cycle normalizes.
use std::io::{BufRead, Write};

use super::*;

/// Longest possible output: `-9223372036854775808`.
const MAX_DECIMAL_LEN: usize = 20;

/// Write `value` as ASCII decimal, returning the number of bytes written.
pub fn write_decimal<W: Write>(writer: &mut W, value: i64) -> Result<usize> {
    let mut buf = [0u8; MAX_DECIMAL_LEN];
    let mut start = buf.len();
    let mut magnitude = value.unsigned_abs();
    loop {
        start -= 1;
        buf[start] = b'0' + (magnitude % 10) as u8;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }
    if value < 0 {
        start -= 1;
        buf[start] = b'-';
    }
    writer.write_all(&buf[start..])?;
    Ok(buf.len() - start)
}

/// Peek the next byte without consuming it.
pub(super) fn peek_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    loop {
        match reader.fill_buf() {
            Ok(buf) => return Ok(buf.first().copied()),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read an optionally signed decimal starting at byte offset `position`.
///
/// Stops at the first non-digit byte and leaves it unread. Returns the value
/// together with the number of bytes consumed. `-0` (with any number of zeros)
/// and values outside `i64` are rejected.
pub fn read_decimal<R: BufRead>(reader: &mut R, position: usize) -> Result<(i64, usize)> {
    let mut consumed = 0;
    let negative = peek_byte(reader)? == Some(b'-');
    if negative {
        reader.consume(1);
        consumed += 1;
    }

    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(byte) = peek_byte(reader)? {
        if !byte.is_ascii_digit() {
            break;
        }
        let digit = i64::from(byte - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            })
            .ok_or(Error::MalformedInteger {
                position: position + consumed,
            })?;
        reader.consume(1);
        consumed += 1;
        digits += 1;
    }

    if digits == 0 || (negative && value == 0) {
        return Err(Error::MalformedInteger {
            position: position + consumed,
        });
    }
    Ok((value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(value: i64) -> String {
        let mut buf = vec![];
        let len = write_decimal(&mut buf, value).unwrap();
        assert_eq!(len, buf.len());
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_decimal() {
        assert_eq!(write(0), "0");
        assert_eq!(write(7), "7");
        assert_eq!(write(-42), "-42");
        assert_eq!(write(1000), "1000");
        assert_eq!(write(i64::MAX), "9223372036854775807");
        assert_eq!(write(i64::MIN), "-9223372036854775808");
    }

    #[test]
    fn test_read_decimal_pushes_back_delimiter() {
        let mut input: &[u8] = b"123:rest";
        assert_eq!(read_decimal(&mut input, 0).unwrap(), (123, 3));
        assert_eq!(input, b":rest");

        let mut input: &[u8] = b"-42e";
        assert_eq!(read_decimal(&mut input, 0).unwrap(), (-42, 3));
        assert_eq!(input, b"e");
    }

    #[test]
    fn test_read_decimal_is_permissive_about_leading_zeros() {
        let mut input: &[u8] = b"007e";
        assert_eq!(read_decimal(&mut input, 0).unwrap(), (7, 3));
        let mut input: &[u8] = b"0";
        assert_eq!(read_decimal(&mut input, 0).unwrap(), (0, 1));
    }

    #[test]
    fn test_read_decimal_bounds() {
        let mut input: &[u8] = b"-9223372036854775808e";
        assert_eq!(read_decimal(&mut input, 0).unwrap().0, i64::MIN);
        let mut input: &[u8] = b"9223372036854775808e";
        assert!(matches!(
            read_decimal(&mut input, 0),
            Err(Error::MalformedInteger { .. })
        ));
    }

    #[test]
    fn test_read_decimal_rejects_missing_digits() {
        let inputs: [&[u8]; 7] = [b"", b"-", b"-e", b"e", b" 1", b"-0", b"-00e"];
        for input in inputs {
            let mut reader = input;
            assert!(
                matches!(
                    read_decimal(&mut reader, 5),
                    Err(Error::MalformedInteger { position }) if position >= 5
                ),
                "{:?}",
                input
            );
        }
    }
}
