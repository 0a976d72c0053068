pub use meta_info::*;
pub use sha1_digest::*;
pub use torrent::*;

use super::bencode::*;
use super::common::*;

mod meta_info;
mod sha1_digest;
mod torrent;
