//! Type-directed bencode serializer.
//!
//! Scalars become strings/integers, sequences become lists, and structs
//! become dicts whose entries follow the struct's declaration order. Maps are
//! buffered and written with their keys sorted, since their iteration order
//! is not stable.
//!
//! A field's key is its `#[serde(rename = "...")]` or its identifier. Put
//! `#[serde(rename_all = "lowercase")]` on the type to key fields by their
//! lowercased identifier.
//!
//! ```
//! use serde::Serialize;
//! use bencodec::ser;
//!
//! #[derive(Serialize)]
//! struct Info {
//!     length: i64,
//!     name: String,
//!     #[serde(rename = "piece length")]
//!     piece_length: i64,
//! }
//!
//! let info = Info { length: 1024, name: "demo".into(), piece_length: 256 };
//! let bytes = ser::to_bytes(&info).unwrap();
//! assert_eq!(bytes, b"d6:lengthi1024e4:name4:demo12:piece lengthi256ee");
//! ```
use std::io::Write;

use log::trace;
use serde::ser::{
    SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant,
};
use serde::Serialize;

use super::*;
use super::Error::*;

pub struct Serializer<W> {
    writer: W,
    written: usize,
}

impl<W: Write> Serializer<W> {
    pub fn new(writer: W) -> Self {
        Serializer { writer, written: 0 }
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    fn write_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.written += encode_string(&mut self.writer, bytes)?;
        Ok(())
    }

    fn write_int(&mut self, value: i64) -> Result<()> {
        self.written += encode_int(&mut self.writer, value)?;
        Ok(())
    }
}

macro_rules! serialize_wide_integer {
    ($self:ident, $value:ident, $source_type:literal) => {{
        trace!("serialize_integer for {}", $source_type);
        let int = i64::try_from($value).map_err(|_| IntegerOutOfRange {
            value: $value as i128,
            target: "i64",
        })?;
        $self.write_int(int)
    }};
}

impl<'a, W: Write> serde::Serializer for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = MapCompound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write_int(v as i64)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_int(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_int(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        serialize_wide_integer!(self, v, "u64")
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(UnsupportedType("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(UnsupportedType("f64"))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write_string(v.encode_utf8(&mut buf).as_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_string(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write_string(v)
    }

    fn serialize_none(self) -> Result<()> {
        // there is no null in bencode; skip the field with `skip_serializing_if`
        Err(UnsupportedType("none"))
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.write_raw(b"le")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.write_string(variant.as_bytes())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        trace!("serialize_newtype_variant {}", variant);
        self.write_raw(b"d")?;
        self.write_string(variant.as_bytes())?;
        value.serialize(&mut *self)?;
        self.write_raw(b"e")
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a, W>> {
        trace!("serialize_seq");
        self.write_raw(b"l")?;
        Ok(Compound::new(self, 1))
    }

    fn serialize_tuple(self, len: usize) -> Result<Compound<'a, W>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Compound<'a, W>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a, W>> {
        trace!("serialize_tuple_variant {}", variant);
        self.write_raw(b"d")?;
        self.write_string(variant.as_bytes())?;
        self.write_raw(b"l")?;
        Ok(Compound::new(self, 2))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCompound<'a, W>> {
        trace!("serialize_map");
        Ok(MapCompound {
            ser: self,
            entries: vec![],
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Compound<'a, W>> {
        trace!("serialize_struct {}", name);
        self.write_raw(b"d")?;
        Ok(Compound::new(self, 1))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a, W>> {
        trace!("serialize_struct_variant {}", variant);
        self.write_raw(b"d")?;
        self.write_string(variant.as_bytes())?;
        self.write_raw(b"d")?;
        Ok(Compound::new(self, 2))
    }
}

/// Lists, and structs written straight through in declaration order.
pub struct Compound<'a, W> {
    ser: &'a mut Serializer<W>,
    /// Number of `e` terminators owed when the compound ends.
    closers: usize,
    keys: Vec<&'static str>,
}

impl<'a, W: Write> Compound<'a, W> {
    fn new(ser: &'a mut Serializer<W>, closers: usize) -> Self {
        Compound {
            ser,
            closers,
            keys: vec![],
        }
    }

    fn element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut *self.ser)
    }

    fn field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if self.keys.contains(&key) {
            return Err(DuplicateKey(key.to_string()));
        }
        self.keys.push(key);
        trace!("serialize field {}", key);
        self.ser.write_string(key.as_bytes())?;
        value.serialize(&mut *self.ser)
    }

    fn finish(self) -> Result<()> {
        for _ in 0..self.closers {
            self.ser.write_raw(b"e")?;
        }
        Ok(())
    }
}

impl<'a, W: Write> SerializeSeq for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> SerializeTuple for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> SerializeTupleStruct for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> SerializeTupleVariant for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> SerializeStruct for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> SerializeStructVariant for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

/// Buffers map entries so they can be written sorted by raw key bytes.
pub struct MapCompound<'a, W> {
    ser: &'a mut Serializer<W>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pending_key: Option<Vec<u8>>,
}

impl<'a, W: Write> SerializeMap for MapCompound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        // keys go through the regular serializer and must come out as a string
        let encoded = to_bytes(key)?;
        self.pending_key = Some(decode(&encoded)?.into_string()?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or(Custom("map value serialized before its key".to_string()))?;
        self.entries.push((key, to_bytes(value)?));
        Ok(())
    }

    fn end(mut self) -> Result<()> {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = self.entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(DuplicateKey(
                String::from_utf8_lossy(&pair[0].0).into_owned(),
            ));
        }
        self.ser.write_raw(b"d")?;
        for (key, value) in &self.entries {
            self.ser.write_string(key)?;
            self.ser.write_raw(value)?;
        }
        self.ser.write_raw(b"e")
    }
}

/// Serialize `value` into `writer`, returning the number of bytes written.
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<usize>
where
    W: Write,
    T: ?Sized + Serialize,
{
    let mut serializer = Serializer::new(writer);
    value.serialize(&mut serializer)?;
    Ok(serializer.written())
}

pub fn to_bytes<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut buf = vec![];
    to_writer(&mut buf, value)?;
    Ok(buf)
}
