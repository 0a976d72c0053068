use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_bytes::{ByteBuf, Bytes};

use super::*;

/// Dictionary payload. Keys are raw bytes; the `BTreeMap` keeps them sorted
/// so that re-encoding a decoded dict is byte-stable.
pub type Dict = BTreeMap<Vec<u8>, Value>;

/// Any well-formed bencode term.
///
/// ```
/// use bencodec::Value;
///
/// let value = Value::List(vec![Value::from("spam"), Value::Int(42)]);
/// assert_eq!(value.as_list().unwrap().len(), 2);
/// assert!(value.as_integer().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// Byte string, not necessarily valid UTF-8.
    Str(Vec<u8>),
    Int(i64),
    List(Vec<Value>),
    Dict(Dict),
}

impl Value {
    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Value::Str(bytes) => Ok(bytes),
            other => Err(other.mismatch("string")),
        }
    }

    /// Like [Self::as_string] but also requires the bytes to be UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        Ok(std::str::from_utf8(self.as_string()?)?)
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Value::Int(int) => Ok(*int),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn as_dict(&self) -> Result<&Dict> {
        match self {
            Value::Dict(dict) => Ok(dict),
            other => Err(other.mismatch("dict")),
        }
    }

    pub fn into_string(self) -> Result<Vec<u8>> {
        match self {
            Value::Str(bytes) => Ok(bytes),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_list(self) -> Result<Vec<Value>> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn into_dict(self) -> Result<Dict> {
        match self {
            Value::Dict(dict) => Ok(dict),
            other => Err(other.mismatch("dict")),
        }
    }

    /// Looks up `key` if this is a dict.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict().ok()?.get(key)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(bytes) => match std::str::from_utf8(bytes) {
                Ok(str) => write!(f, "{str:?}"),
                Err(_) => write!(f, "Bytes({})", bytes.len()),
            },
            Value::Int(int) => write!(f, "{int}"),
            Value::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Dict(dict) => {
                write!(f, "{{")?;
                for (i, (key, item)) in dict.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {item}", String::from_utf8_lossy(key))?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Value::Int(int)
    }
}

impl From<&str> for Value {
    fn from(str: &str) -> Self {
        Value::Str(str.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(string: String) -> Self {
        Value::Str(string.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Str(bytes.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(list)
    }
}

impl From<Dict> for Value {
    fn from(dict: Dict) -> Self {
        Value::Dict(dict)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Str(bytes) => serializer.serialize_bytes(bytes),
            Value::Int(int) => serializer.serialize_i64(*int),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (key, item) in dict {
                    map.serialize_entry(Bytes::new(key), item)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("a bencode value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Int(v as i64))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E>
    where
        E: serde::de::Error,
    {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {v} out of range for i64")))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> std::result::Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> std::result::Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut list = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            list.push(item);
        }
        Ok(Value::List(list))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut dict = Dict::new();
        while let Some((key, item)) = map.next_entry::<ByteBuf, Value>()? {
            dict.insert(key.into_vec(), item);
        }
        Ok(Value::Dict(dict))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}
