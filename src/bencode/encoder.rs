use std::io::Write;

use super::*;

/// Write `<len>:<bytes>`.
pub fn encode_string<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<usize> {
    let len = i64::try_from(bytes.len()).map_err(|_| Error::IntegerOutOfRange {
        value: bytes.len() as i128,
        target: "string length",
    })?;
    let mut written = write_decimal(writer, len)?;
    writer.write_all(b":")?;
    writer.write_all(bytes)?;
    written += 1 + bytes.len();
    Ok(written)
}

/// Write `i<value>e`.
pub fn encode_int<W: Write>(writer: &mut W, value: i64) -> Result<usize> {
    writer.write_all(b"i")?;
    let written = write_decimal(writer, value)?;
    writer.write_all(b"e")?;
    Ok(written + 2)
}

/// Serialize `value` into `writer`, returning the number of bytes written.
///
/// Dict entries come out sorted by raw key bytes, so encoding the same
/// logical value always yields the same bytes.
pub fn encode<W: Write>(value: &Value, writer: &mut W) -> Result<usize> {
    match value {
        Value::Str(bytes) => encode_string(writer, bytes),
        Value::Int(int) => encode_int(writer, *int),
        Value::List(list) => {
            writer.write_all(b"l")?;
            let mut written = 2;
            for item in list {
                written += encode(item, writer)?;
            }
            writer.write_all(b"e")?;
            Ok(written)
        }
        Value::Dict(dict) => {
            writer.write_all(b"d")?;
            let mut written = 2;
            for (key, item) in dict {
                written += encode_string(writer, key)?;
                written += encode(item, writer)?;
            }
            writer.write_all(b"e")?;
            Ok(written)
        }
    }
}

pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    let mut buf = vec![];
    encode(value, &mut buf)?;
    Ok(buf)
}
