//! Bencode codec with a dynamic value model and serde integration.
//!
//! Decode into a [`Value`] and encode it back canonically:
//!
//! ```
//! use bencodec::{decode, to_vec, Value};
//!
//! let value = decode(b"d4:spaml1:a1:bee").unwrap();
//! let spam = value.get(b"spam").unwrap().as_list().unwrap();
//! assert_eq!(spam, &[Value::from("a"), Value::from("b")][..]);
//! assert_eq!(to_vec(&value).unwrap(), b"d4:spaml1:a1:bee".to_vec());
//! ```
//!
//! Or map straight to and from your own types:
//!
//! ```
//! use std::collections::BTreeMap;
//! use serde::{Deserialize, Serialize};
//! use serde_with::{serde_as, Bytes};
//! use bencodec::{de, ser};
//!
//! #[serde_as]
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Foo {
//!     str: String,
//!     int: i32,
//!     #[serde_as(as = "Bytes")]
//!     bytes: Vec<u8>,
//!     map: BTreeMap<String, String>,
//! }
//! let data = b"d3:str4:demo3:inti1e5:bytes4:12343:mapd4:key16:value1ee";
//!
//! let foo: Foo = de::from_bytes(data).unwrap();
//! assert_eq!(foo.str, "demo".to_string());
//! assert_eq!(ser::to_bytes(&foo).unwrap(), data.to_vec());
//! ```
//!
//! Torrent metainfo and tracker announce are built on the same codec, see
//! [`Torrent`] and [`Client`].
pub use bencode::*;
pub use common::*;
pub use meta::*;
pub use tracker::*;

mod bencode;
mod common;
mod meta;
mod tracker;
