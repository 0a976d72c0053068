pub use client::*;
pub use response::*;

use super::bencode::*;
use super::common::*;
use super::meta::*;

mod client;
mod response;
