//! Type-directed bencode deserializer.
//!
//! Input is decoded to a [Value] first; the tree then drives serde's
//! visitors. A record field's key is its `#[serde(rename = "...")]` or its
//! identifier; `#[serde(rename_all = "lowercase")]` gives the lowercased
//! identifier for types whose fields are not already lowercase.
//!
//! By default unmarshaling is permissive below the root: a record field whose
//! key is absent, or whose value has the wrong shape, is left at its zero
//! value (`0`, `false`, empty string or list, `None`, a record of zeros).
//! [DecoderConfig::strict] turns a mismatch into [Error::TypeMismatch] and
//! leaves absent keys to serde (`#[serde(default)]` or `Option` fields).
//! The root itself must always be a list or dict matching the destination.
use std::io::BufRead;
use std::vec;

use log::{debug, trace};
use serde::de::value::StrDeserializer;
use serde::de::{
    DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::Deserializer as _;

use super::*;
use super::Error::*;

macro_rules! deserialize_integer {
    ($self:ident, $visitor:ident, $int_type:ty, $visit:ident) => {{
        trace!("deserialize_integer for {}", stringify!($int_type));
        if !$self.check("integer")? {
            return $visitor.$visit(0);
        }
        let value = $self.value.as_integer()?;
        let int = <$int_type>::try_from(value).map_err(|_| IntegerOutOfRange {
            value: value.into(),
            target: stringify!($int_type),
        })?;
        $visitor.$visit(int)
    }};
}

/// Feeds an owned [Value] to serde.
pub struct Deserializer {
    value: Value,
    config: DecoderConfig,
    /// The root has to match its destination even when unmarshaling is lenient.
    root: bool,
}

impl Deserializer {
    pub fn new(value: Value) -> Self {
        Self::with_config(value, DecoderConfig::default())
    }

    pub fn with_config(value: Value, config: DecoderConfig) -> Self {
        Deserializer {
            value,
            config,
            root: true,
        }
    }

    fn nested(value: Value, config: DecoderConfig) -> Self {
        Deserializer {
            value,
            config,
            root: false,
        }
    }

    /// Whether the value is of kind `expected`. On a mismatch this fails at
    /// the root or in strict mode, and otherwise returns false so the caller
    /// produces the zero value.
    fn check(&self, expected: &'static str) -> Result<bool> {
        self.accept(self.value.kind() == expected, expected)
    }

    fn accept(&self, matched: bool, expected: &'static str) -> Result<bool> {
        if matched {
            return Ok(true);
        }
        if self.root || self.config.strict {
            return Err(TypeMismatch {
                expected,
                found: self.value.kind(),
            });
        }
        debug!("skip {} where {} is expected", self.value.kind(), expected);
        Ok(false)
    }

    fn into_utf8(self) -> Result<String> {
        String::from_utf8(self.value.into_string()?).map_err(|e| InvalidUtf8(e.utf8_error()))
    }
}

impl<'de> serde::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_any {}", self.value.kind());
        let config = self.config;
        match self.value {
            Value::Str(bytes) => visitor.visit_byte_buf(bytes),
            Value::Int(int) => visitor.visit_i64(int),
            Value::List(list) => visit_list(list, config, visitor),
            Value::Dict(dict) => visitor.visit_map(DictAccess::new(dict, config)),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if !self.check("integer")? {
            return visitor.visit_bool(false);
        }
        match self.value.as_integer()? {
            positive if positive > 0 => visitor.visit_bool(true),
            _ => visitor.visit_bool(false),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, i8, visit_i8)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, i16, visit_i16)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, i32, visit_i32)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, i64, visit_i64)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, u8, visit_u8)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, u16, visit_u16)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, u32, visit_u32)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        deserialize_integer!(self, visitor, u64, visit_u64)
    }

    fn deserialize_f32<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(UnsupportedType("f32"))
    }

    fn deserialize_f64<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(UnsupportedType("f64"))
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if !self.check("string")? {
            return Zero.deserialize_char(visitor);
        }
        let string = self.into_utf8()?;
        let mut chars = string.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Custom(format!("expect char but get {:?}", string))),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_string");
        if !self.check("string")? {
            return Zero.deserialize_string(visitor);
        }
        visitor.visit_string(self.into_utf8()?)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_byte_buf");
        if !self.check("string")? {
            return Zero.deserialize_byte_buf(visitor);
        }
        visitor.visit_byte_buf(self.value.into_string()?)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // a present key is always Some; absent keys never reach here
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if !self.check("list")? {
            return visitor.visit_unit();
        }
        let list = self.value.into_list()?;
        if !list.is_empty() {
            return Err(serde::de::Error::invalid_length(list.len(), &"empty list"));
        }
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_seq");
        if !self.check("list")? {
            return Zero.deserialize_seq(visitor);
        }
        let config = self.config;
        visit_list(self.value.into_list()?, config, visitor)
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if !self.check("list")? {
            return Zero.deserialize_tuple(len, visitor);
        }
        let config = self.config;
        visit_list(self.value.into_list()?, config, visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_map");
        if !self.check("dict")? {
            return Zero.deserialize_map(visitor);
        }
        let config = self.config;
        visitor.visit_map(DictAccess::new(self.value.into_dict()?, config))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_struct {}", name);
        if !self.check("dict")? {
            return Zero.deserialize_struct(name, fields, visitor);
        }
        let config = self.config;
        visitor.visit_map(DictAccess::record(self.value.into_dict()?, fields, config))
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("deserialize_enum");
        let shaped = matches!(self.value, Value::Str(_) | Value::Dict(_));
        if !self.accept(shaped, "string or single-entry dict")? {
            return Zero.deserialize_enum(name, variants, visitor);
        }
        let config = self.config;
        match self.value {
            Value::Str(bytes) => {
                let variant = String::from_utf8(bytes).map_err(|e| InvalidUtf8(e.utf8_error()))?;
                // Delegate to StringDeserializer
                visitor.visit_enum(variant.into_deserializer())
            }
            Value::Dict(dict) => {
                let mut entries = dict.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(VariantDeserializer {
                        variant,
                        value,
                        config,
                    }),
                    _ => Err(TypeMismatch {
                        expected: "single-entry dict",
                        found: "dict",
                    }),
                }
            }
            other => Err(TypeMismatch {
                expected: "string or single-entry dict",
                found: other.kind(),
            }),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let bytes = self.value.into_string()?;
        match String::from_utf8(bytes) {
            Ok(key) => visitor.visit_string(key),
            Err(e) => visitor.visit_byte_buf(e.into_bytes()),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

fn visit_list<'de, V>(list: Vec<Value>, config: DecoderConfig, visitor: V) -> Result<V::Value>
where
    V: Visitor<'de>,
{
    let len = list.len();
    let mut access = ListAccess {
        iter: list.into_iter(),
        config,
    };
    let value = visitor.visit_seq(&mut access)?;
    if access.iter.len() != 0 {
        return Err(serde::de::Error::invalid_length(
            len,
            &"fewer elements in list",
        ));
    }
    Ok(value)
}

struct ListAccess {
    iter: vec::IntoIter<Value>,
    config: DecoderConfig,
}

impl<'de> SeqAccess<'de> for ListAccess {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        let config = self.config;
        self.iter
            .next()
            .map(|item| seed.deserialize(Deserializer::nested(item, config)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

enum Pending {
    Present(Value),
    Absent,
}

/// Walks a dict's entries, then, for records, the declared fields it lacks.
struct DictAccess {
    iter: std::collections::btree_map::IntoIter<Vec<u8>, Value>,
    absent: vec::IntoIter<&'static str>,
    pending: Option<Pending>,
    config: DecoderConfig,
}

impl DictAccess {
    fn new(dict: Dict, config: DecoderConfig) -> Self {
        Self::record(dict, &[], config)
    }

    fn record(dict: Dict, fields: &'static [&'static str], config: DecoderConfig) -> Self {
        let absent: Vec<&'static str> = if config.strict {
            vec![]
        } else {
            fields
                .iter()
                .copied()
                .filter(|field| !dict.contains_key(field.as_bytes()))
                .collect()
        };
        DictAccess {
            iter: dict.into_iter(),
            absent: absent.into_iter(),
            pending: None,
            config,
        }
    }

    /// A record with every field absent.
    fn zeroed(fields: &'static [&'static str]) -> Self {
        Self::record(Dict::new(), fields, DecoderConfig::default())
    }
}

impl<'de> MapAccess<'de> for DictAccess {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if let Some((key, value)) = self.iter.next() {
            trace!("visit map key {}", String::from_utf8_lossy(&key));
            self.pending = Some(Pending::Present(value));
            let key = Deserializer::nested(Value::Str(key), self.config);
            return seed.deserialize(key).map(Some);
        }
        let Some(field) = self.absent.next() else {
            return Ok(None);
        };
        trace!("zero-fill absent field {}", field);
        self.pending = Some(Pending::Absent);
        let key: StrDeserializer<'static, Error> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        trace!("visit map value");
        match self.pending.take() {
            Some(Pending::Present(value)) => {
                seed.deserialize(Deserializer::nested(value, self.config))
            }
            Some(Pending::Absent) => seed.deserialize(Zero),
            None => Err(Custom("map value requested before its key".to_string())),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len() + self.absent.len())
    }
}

/// `d<variant><payload>e` form of a non-unit enum variant.
struct VariantDeserializer {
    variant: Vec<u8>,
    value: Value,
    config: DecoderConfig,
}

impl<'de> EnumAccess<'de> for VariantDeserializer {
    type Error = Error;
    type Variant = Deserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Deserializer)>
    where
        V: DeserializeSeed<'de>,
    {
        trace!("variant_seed");
        let variant = seed.deserialize(Deserializer::nested(Value::Str(self.variant), self.config))?;
        Ok((variant, Deserializer::nested(self.value, self.config)))
    }
}

impl<'de> VariantAccess<'de> for Deserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        trace!("unit_variant");
        serde::Deserialize::deserialize(self)
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        trace!("newtype_variant_seed");
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("tuple_variant");
        serde::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        trace!("struct_variant");
        serde::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}

/// Stands in for a value that is absent or has the wrong shape, and hands the
/// visitor the zero value of whatever it asks for.
struct Zero;

impl<'de> serde::Deserializer<'de> for Zero {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // buffering adapters such as serde_with's `OneOrMany` see an empty list
        visitor.visit_seq(ZeroSeq { remaining: 0 })
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bool(false)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i8(0)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i16(0)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i32(0)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(0)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u8(0)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u16(0)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u32(0)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_u64(0)
    }

    fn deserialize_f32<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(UnsupportedType("f32"))
    }

    fn deserialize_f64<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        Err(UnsupportedType("f64"))
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_char('\0')
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_str("")
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_str("")
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bytes(&[])
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_bytes(&[])
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_none()
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ZeroSeq { remaining: 0 })
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ZeroSeq { remaining: len })
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ZeroSeq { remaining: len })
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(DictAccess::zeroed(&[]))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(DictAccess::zeroed(fields))
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        // the first declared variant plays the zero value
        match variants.first() {
            Some(variant) => visitor.visit_enum(ZeroVariant(variant)),
            None => Err(Custom(format!("enum {} has no variants", name))),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_str("")
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct ZeroSeq {
    remaining: usize,
}

impl<'de> SeqAccess<'de> for ZeroSeq {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(Zero).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct ZeroVariant(&'static str);

impl<'de> EnumAccess<'de> for ZeroVariant {
    type Error = Error;
    type Variant = Zero;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Zero)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant: StrDeserializer<'static, Error> = self.0.into_deserializer();
        Ok((seed.deserialize(variant)?, Zero))
    }
}

impl<'de> VariantAccess<'de> for Zero {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(Zero)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(ZeroSeq { remaining: len })
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(DictAccess::zeroed(fields))
    }
}

/// Unmarshal an already decoded tree. The root must be a list or a dict.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value_with_config(value, DecoderConfig::default())
}

pub fn from_value_with_config<T>(value: Value, config: DecoderConfig) -> Result<T>
where
    T: DeserializeOwned,
{
    match value {
        Value::List(_) | Value::Dict(_) => T::deserialize(Deserializer::with_config(value, config)),
        other => Err(UnsupportedRoot(other.kind())),
    }
}

pub fn from_bytes<T>(data: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_bytes_with_config(data, DecoderConfig::default())
}

pub fn from_bytes_with_config<T>(data: &[u8], config: DecoderConfig) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value_with_config(decode_with_config(data, config)?, config)
}

/// Unmarshal one value from `reader`, leaving anything after it unread.
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: BufRead,
    T: DeserializeOwned,
{
    from_reader_with_config(reader, DecoderConfig::default())
}

pub fn from_reader_with_config<R, T>(reader: R, config: DecoderConfig) -> Result<T>
where
    R: BufRead,
    T: DeserializeOwned,
{
    from_value_with_config(Decoder::with_config(reader, config).parse()?, config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use log::{LevelFilter, Metadata, Record};
    use serde::{Deserialize, Serialize};
    use serde_with::{serde_as, DefaultOnError};

    use crate::{de, ser};
    use super::*;

    struct Logger;

    impl log::Log for Logger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            println!("{}", record.args())
        }

        fn flush(&self) {}
    }

    static LOGGER: Logger = Logger;

    fn init_logger() {
        // only the first test to get here installs it
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    }

    #[derive(Deserialize, Serialize, PartialEq, Debug, Default)]
    struct CowSpam {
        cow: String,
        spam: Vec<String>,
    }

    #[derive(Deserialize, PartialEq, Debug, Default)]
    struct FooBar {
        foo: String,
        bar: String,
    }

    #[derive(Deserialize, Serialize, PartialEq, Debug)]
    enum Enum {
        Unit,
        Int(i32),
        Str(String),
        Tuple((i8, i32)),
        Struct { key: String, values: Vec<i64> },
    }

    #[derive(Deserialize, Serialize, PartialEq, Debug)]
    struct Nested {
        #[serde(rename = "piece length")]
        piece_length: u32,
        #[serde(with = "serde_bytes")]
        pieces: Vec<u8>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        private: Option<bool>,
        files: Vec<CowSpam>,
        tiers: Vec<Vec<String>>,
        map: HashMap<String, i64>,
        tuple: (u8, String),
        choice: Enum,
    }

    #[test]
    fn test_record_mapping() {
        init_logger();
        let ret: CowSpam = de::from_bytes(b"d3:cow3:moo4:spaml3:a1b3:a2bee").unwrap();
        assert_eq!(
            ret,
            CowSpam {
                cow: "moo".into(),
                spam: vec!["a1b".into(), "a2b".into()],
            }
        );
    }

    #[test]
    fn test_missing_key_keeps_default() {
        let ret: FooBar = de::from_bytes(b"d3:foo3:bare").unwrap();
        assert_eq!(ret.foo, "bar");
        assert_eq!(ret.bar, "");
        // unknown keys are ignored
        let ret: FooBar = de::from_bytes(b"d3:bar1:x5:extrai1ee").unwrap();
        assert_eq!(ret.bar, "x");
    }

    #[test]
    fn test_missing_keys_zero_fill_every_shape() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Inner {
            name: String,
            size: u32,
        }

        #[derive(Deserialize, Debug)]
        struct Sparse {
            text: String,
            count: i64,
            flag: bool,
            list: Vec<String>,
            inner: Inner,
            maybe: Option<i64>,
            map: HashMap<String, i64>,
            pair: (u8, String),
            choice: Enum,
            #[serde(with = "serde_bytes")]
            raw: Vec<u8>,
        }

        let ret: Sparse = de::from_bytes(b"d5:counti7ee").unwrap();
        assert_eq!(ret.count, 7);
        assert_eq!(ret.text, "");
        assert!(!ret.flag);
        assert!(ret.list.is_empty());
        assert_eq!(
            ret.inner,
            Inner {
                name: "".into(),
                size: 0
            }
        );
        assert_eq!(ret.maybe, None);
        assert!(ret.map.is_empty());
        assert_eq!(ret.pair, (0, "".to_string()));
        assert_eq!(ret.choice, Enum::Unit);
        assert!(ret.raw.is_empty());

        // a nested record fills its own missing fields
        let ret: Sparse = de::from_bytes(b"d5:innerd4:name1:xee").unwrap();
        assert_eq!(ret.inner.name, "x");
        assert_eq!(ret.inner.size, 0);
    }

    #[test]
    fn test_shape_mismatch_leaves_field_at_zero() {
        init_logger();
        #[derive(Deserialize, Debug, PartialEq)]
        struct Plain {
            foo: String,
            bar: String,
            n: i64,
        }

        let ret: Plain = de::from_bytes(b"d3:bar1:x3:fooi1e1:ni2ee").unwrap();
        assert_eq!(
            ret,
            Plain {
                foo: "".into(),
                bar: "x".into(),
                n: 2
            }
        );
        let ret: CowSpam = de::from_bytes(b"d3:cowli1ee4:spamd1:ai1eee").unwrap();
        assert_eq!(ret, CowSpam::default());
        let ret: Nested = de::from_bytes(b"d6:choicei3e5:filesi1e5:tuple2:xxe").unwrap();
        assert_eq!(ret.choice, Enum::Unit);
        assert!(ret.files.is_empty());
        assert_eq!(ret.tuple, (0, "".to_string()));
    }

    #[test]
    fn test_strict_mode_rejects_mismatch() {
        let strict = DecoderConfig::default().with_strict(true);
        assert!(matches!(
            de::from_bytes_with_config::<FooBar>(b"d3:fooi1e3:bar0:e", strict),
            Err(TypeMismatch {
                expected: "string",
                found: "integer"
            })
        ));
        assert!(matches!(
            de::from_bytes_with_config::<CowSpam>(b"d3:cow3:moo4:spamd1:ai1eee", strict),
            Err(TypeMismatch {
                expected: "list",
                found: "dict"
            })
        ));
        let ret: CowSpam =
            de::from_bytes_with_config(b"d3:cow3:moo4:spaml1:aee", strict).unwrap();
        assert_eq!(ret.spam, vec!["a"]);
    }

    #[test]
    fn test_strict_mode_leaves_missing_keys_to_serde() {
        let strict = DecoderConfig::default().with_strict(true);
        let ret = de::from_bytes_with_config::<CowSpam>(b"d3:cow3:mooe", strict);
        assert!(matches!(ret, Err(Custom(msg)) if msg.contains("spam")));

        #[derive(Deserialize, Debug)]
        struct Sparse {
            #[serde(default = "default_port")]
            port: u16,
            comment: Option<String>,
        }
        fn default_port() -> u16 {
            6881
        }
        let ret: Sparse = de::from_bytes_with_config(b"de", strict).unwrap();
        assert_eq!(ret.port, 6881);
        assert_eq!(ret.comment, None);
    }

    #[test]
    fn test_strict_mode_field_opts_into_leniency() {
        #[serde_as]
        #[derive(Deserialize, Debug, Default, PartialEq)]
        #[serde(default)]
        struct Lenient {
            #[serde_as(as = "DefaultOnError")]
            foo: String,
            #[serde_as(as = "DefaultOnError")]
            list: Vec<i64>,
            bar: i64,
        }

        let strict = DecoderConfig::default().with_strict(true);
        let ret: Lenient =
            de::from_bytes_with_config(b"d3:bari2e3:fooi1e4:list3:abce", strict).unwrap();
        assert_eq!(
            ret,
            Lenient {
                foo: "".into(),
                list: vec![],
                bar: 2
            }
        );
        let ret: Lenient =
            de::from_bytes_with_config(b"d3:foo2:ok4:listli1ei2eee", strict).unwrap();
        assert_eq!(ret.foo, "ok");
        assert_eq!(ret.list, vec![1, 2]);
    }

    #[test]
    fn test_skipped_field_untouched() {
        #[derive(Deserialize, Debug, Default)]
        struct Hidden {
            name: String,
            #[serde(skip)]
            secret: String,
        }
        let ret: Hidden = de::from_bytes(b"d4:name1:a6:secret1:be").unwrap();
        assert_eq!(ret.name, "a");
        assert_eq!(ret.secret, "");
    }

    #[test]
    fn test_list_root() {
        let ret: Vec<Vec<i64>> = de::from_bytes(b"lli1ei2eelee").unwrap();
        assert_eq!(ret, vec![vec![1, 2], vec![]]);
        let ret: Vec<String> = de::from_bytes(b"l4:spam4:eggse").unwrap();
        assert_eq!(ret, vec!["spam", "eggs"]);
    }

    #[test]
    fn test_empty_list_uses_declared_element_type() {
        let ret: Vec<Vec<CowSpam>> = de::from_bytes(b"le").unwrap();
        assert!(ret.is_empty());
        let ret: Vec<CowSpam> = de::from_bytes(b"ld3:cow1:a4:spamleee").unwrap();
        assert_eq!(ret[0].cow, "a");
        assert!(ret[0].spam.is_empty());
    }

    #[test]
    fn test_unsupported_root() {
        assert!(matches!(
            de::from_bytes::<i64>(b"i1e"),
            Err(UnsupportedRoot("integer"))
        ));
        assert!(matches!(
            de::from_bytes::<String>(b"4:spam"),
            Err(UnsupportedRoot("string"))
        ));
    }

    #[test]
    fn test_root_shape_must_match_destination() {
        assert!(matches!(
            de::from_bytes::<Vec<String>>(b"d3:foo3:bare"),
            Err(TypeMismatch {
                expected: "list",
                found: "dict"
            })
        ));
    }

    #[test]
    fn test_decode_errors_propagate() {
        assert!(matches!(
            de::from_bytes::<FooBar>(b"d3:foo"),
            Err(UnexpectedEof { .. })
        ));
        assert!(matches!(
            de::from_bytes::<FooBar>(b"d3:foo3:bareXX"),
            Err(TrailingData { position: 12 })
        ));
        let config = DecoderConfig::default().with_max_depth(1);
        assert!(matches!(
            de::from_bytes_with_config::<Vec<Vec<i64>>>(b"llee", config),
            Err(NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_integer_range() {
        #[derive(Deserialize, Debug)]
        struct Small {
            #[allow(dead_code)]
            port: u16,
        }
        assert!(matches!(
            de::from_bytes::<Small>(b"d4:porti70000ee"),
            Err(IntegerOutOfRange {
                value: 70000,
                target: "u16"
            })
        ));
        assert!(de::from_bytes::<Small>(b"d4:porti-1ee").is_err());
    }

    #[test]
    fn test_from_reader_leaves_rest() {
        let mut input: &[u8] = b"l1:ae4:rest";
        let ret: Vec<String> = de::from_reader(&mut input).unwrap();
        assert_eq!(ret, vec!["a"]);
        assert_eq!(input, b"4:rest");
    }

    #[test]
    fn test_value_destination() {
        let ret: Value = de::from_bytes(b"d1:ali1e1:bee").unwrap();
        assert_eq!(
            ret.get(b"a"),
            Some(&Value::List(vec![Value::Int(1), Value::from("b")]))
        );
    }

    #[test]
    fn test_round_trip_nested() {
        init_logger();
        let mut nested = Nested {
            piece_length: 262144,
            pieces: vec![0, 1, 2, 255],
            private: Some(true),
            files: vec![
                CowSpam {
                    cow: "moo".into(),
                    spam: vec![],
                },
                CowSpam::default(),
            ],
            tiers: vec![vec!["udp://a".into(), "http://b".into()], vec![]],
            map: HashMap::from([("k1".into(), 1), ("k2".into(), -2)]),
            tuple: (7, "seven".into()),
            choice: Enum::Unit,
        };
        for choice in [
            Enum::Unit,
            Enum::Int(-13),
            Enum::Str("abc".into()),
            Enum::Tuple((1, 2)),
            Enum::Struct {
                key: "k".into(),
                values: vec![1, 2],
            },
        ] {
            nested.choice = choice;
            let bytes = ser::to_bytes(&nested).unwrap();
            let copy: Nested = de::from_bytes(&bytes).unwrap();
            assert_eq!(copy, nested);
        }

        nested.private = None;
        let bytes = ser::to_bytes(&nested).unwrap();
        let copy: Nested = de::from_bytes(&bytes).unwrap();
        assert_eq!(copy.private, None);
    }

    #[test]
    fn test_reads_bendy_output() -> anyhow::Result<()> {
        let original = CowSpam {
            cow: "moo".into(),
            spam: vec!["a".into(), "b".into()],
        };
        let bytes = bendy::serde::to_bytes(&original).unwrap();
        let copy: CowSpam = de::from_bytes(&bytes)?;
        assert_eq!(copy, original);
        Ok(())
    }
}
