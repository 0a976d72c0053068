use std::fmt::Display;

use thiserror::Error;

/// Every failure the codec and its torrent/tracker consumers can report.
///
/// Structural decode errors carry the byte offset (relative to the start of
/// the value being decoded) where the problem was detected.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed integer at {position}")]
    MalformedInteger { position: usize },
    #[error("malformed string at {position}")]
    MalformedString { position: usize },
    #[error("unrecognized type byte {byte:#04x} at {position}")]
    UnrecognizedType { byte: u8, position: usize },
    #[error("dict key at {position} is not a string")]
    InvalidKey { position: usize },
    #[error("truncated input at {position}: expected {expected} bytes, got {actual}")]
    TruncatedInput {
        position: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unexpected EOF at {position}")]
    UnexpectedEof { position: usize },
    #[error("nesting deeper than {max_depth} at {position}")]
    NestingTooDeep { max_depth: usize, position: usize },
    #[error("trailing data at {position}")]
    TrailingData { position: usize },
    #[error("expect {expected} but get {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unsupported root {0}, expect list or dict")]
    UnsupportedRoot(&'static str),
    #[error("bencode cannot represent {0}")]
    UnsupportedType(&'static str),
    #[error("integer {value} out of range for {target}")]
    IntegerOutOfRange { value: i128, target: &'static str },
    #[error("UTF-8 error: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("duplicate dict key {0:?}")]
    DuplicateKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde custom error: {0}")]
    Custom(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("tracker failure: {0}")]
    Tracker(String),
    #[error("compact peer list length {0} is not a multiple of 6")]
    MalformedPeers(usize),
    #[error("pieces length {0} is not a multiple of 20")]
    MalformedPieces(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

impl serde::de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}
