//! Bencode decoder.
//!
//! Example:
//! ```
//! use bencodec::{Decoder, Value};
//!
//! // "{"key1": "value", "key2": 123}" in Json format
//! let mut data: &[u8] = b"d4:key15:value4:key2i123eei7e";
//! let mut decoder = Decoder::new(&mut data);
//! let value = decoder.parse().unwrap();
//! assert_eq!(value.get(b"key1"), Some(&Value::from("value")));
//! assert_eq!(value.get(b"key2"), Some(&Value::Int(123)));
//! // the stream is left right after the first value
//! assert_eq!(decoder.offset(), 26);
//! assert_eq!(decoder.parse().unwrap(), Value::Int(7));
//! ```
use std::io::{BufRead, Read};

use log::{debug, trace};

use super::*;
use super::Error::*;

pub struct Decoder<R> {
    reader: R,
    offset: usize,
    depth: usize,
    config: DecoderConfig,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Decoder {
            reader,
            offset: 0,
            depth: 0,
            config,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode exactly one value, leaving the stream right after it.
    pub fn parse(&mut self) -> Result<Value> {
        self.depth = 0;
        self.parse_value()
    }

    fn parse_value(&mut self) -> Result<Value> {
        let position = self.offset;
        let token = self.peek_token()?;
        trace!("parse {} at {}", token, position);
        match token {
            Token::String => self.take_string().map(Value::Str),
            Token::Int => self.take_int().map(Value::Int),
            Token::List => self.take_list().map(Value::List),
            Token::Dict => self.take_dict().map(Value::Dict),
            Token::End => Err(UnrecognizedType {
                byte: b'e',
                position,
            }),
        }
    }

    /// Classify the next byte without consuming it.
    fn peek_token(&mut self) -> Result<Token> {
        let position = self.offset;
        let byte = decimal::peek_byte(&mut self.reader)?.ok_or(UnexpectedEof { position })?;
        Token::from_lead_byte(byte).ok_or(UnrecognizedType { byte, position })
    }

    /// Move forward for one byte
    fn take_byte(&mut self) -> Result<Option<u8>> {
        let byte = decimal::peek_byte(&mut self.reader)?;
        if byte.is_some() {
            self.reader.consume(1);
            self.offset += 1;
        }
        Ok(byte)
    }

    fn take_decimal(&mut self) -> Result<i64> {
        let (value, consumed) = decimal::read_decimal(&mut self.reader, self.offset)?;
        self.offset += consumed;
        Ok(value)
    }

    /// Read `<len>:<bytes>`.
    ///
    /// Before:
    ///
    /// ```text
    /// "d2:xxe"
    ///  -^----
    /// ```
    ///
    /// After:
    ///
    /// ```text
    /// "d2:xxe"
    ///  _____^
    /// ```
    fn take_string(&mut self) -> Result<Vec<u8>> {
        let start = self.offset;
        let len = self.take_decimal().map_err(|e| match e {
            MalformedInteger { .. } => MalformedString { position: start },
            other => other,
        })?;
        let len = usize::try_from(len).map_err(|_| MalformedString { position: start })?;
        let position = self.offset;
        if self.take_byte()? != Some(b':') {
            return Err(MalformedString { position });
        }

        // read through `take` so a bogus length prefix can't force a huge allocation
        let mut bytes = Vec::new();
        let actual = (&mut self.reader).take(len as u64).read_to_end(&mut bytes)?;
        self.offset += actual;
        if actual < len {
            return Err(TruncatedInput {
                position: self.offset,
                expected: len,
                actual,
            });
        }
        Ok(bytes)
    }

    fn take_int(&mut self) -> Result<i64> {
        self.take_byte()?;
        let value = self.take_decimal()?;
        let position = self.offset;
        match self.take_byte()? {
            Some(b'e') => Ok(value),
            _ => Err(MalformedInteger { position }),
        }
    }

    /// Returns true and consumes the terminator if the container is closed.
    fn take_end(&mut self) -> Result<bool> {
        if self.peek_token()? == Token::End {
            self.take_byte()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(NestingTooDeep {
                max_depth: self.config.max_depth,
                position: self.offset,
            });
        }
        self.depth += 1;
        self.take_byte()?;
        Ok(())
    }

    fn take_list(&mut self) -> Result<Vec<Value>> {
        self.enter()?;
        let mut list = vec![];
        while !self.take_end()? {
            list.push(self.parse_value()?);
        }
        self.depth -= 1;
        Ok(list)
    }

    fn take_dict(&mut self) -> Result<Dict> {
        self.enter()?;
        let mut dict = Dict::new();
        loop {
            let position = self.offset;
            // anything but a string or the terminator is a bad key, even bytes
            // that start no value at all
            match decimal::peek_byte(&mut self.reader)?.map(Token::from_lead_byte) {
                None => return Err(UnexpectedEof { position }),
                Some(Some(Token::End)) => {
                    self.take_byte()?;
                    break;
                }
                Some(Some(Token::String)) => {}
                Some(_) => return Err(InvalidKey { position }),
            }
            let key = self.take_string()?;
            let value = self.parse_value()?;
            if let Some(_old) = dict.insert(key, value) {
                debug!("duplicate dict key at {}, keeping the last one", position);
            }
        }
        self.depth -= 1;
        Ok(dict)
    }
}

/// Decode one value from `reader`, leaving anything after it unread.
pub fn parse<R: BufRead>(reader: R) -> Result<Value> {
    Decoder::new(reader).parse()
}

/// Decode `data`, which must hold exactly one value.
pub fn decode(data: &[u8]) -> Result<Value> {
    decode_with_config(data, DecoderConfig::default())
}

pub fn decode_with_config(data: &[u8], config: DecoderConfig) -> Result<Value> {
    let mut decoder = Decoder::with_config(data, config);
    let value = decoder.parse()?;
    if decoder.offset() != data.len() {
        return Err(TrailingData {
            position: decoder.offset(),
        });
    }
    Ok(value)
}
