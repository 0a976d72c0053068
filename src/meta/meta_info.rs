use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_bytes::ByteBuf;
use serde_with::{serde_as, OneOrMany};

use super::*;

pub type AnnounceList = Vec<Vec<String>>;

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetaInfo {
    /// The URL of the tracker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announce: Option<String>,
    /// [BEP-0012](https://www.bittorrent.org/beps/bep_0012.html) extends BitTorrent to support
    /// multiple trackers
    #[serde(rename = "announce-list", skip_serializing_if = "Option::is_none")]
    pub announce_list: Option<AnnounceList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "created by", skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(rename = "creation date", skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
    pub info: Info,
    /// [BEP-0005](https://www.bittorrent.org/beps/bep_0005.html#entropy)
    /// DHT support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
    /// [BEP-0019](https://www.bittorrent.org/beps/bep_0019.html) web seeds, either a single
    /// string or a list of them.
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(rename = "url-list", skip_serializing_if = "Vec::is_empty", default)]
    pub url_list: Vec<String>,
}

/// Fields are declared in key order so that marshaling an `Info` reproduces
/// the canonical encoding the info hash is computed over.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Info {
    /// Present in multi-file torrents instead of `length`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileInfo>>,
    /// Present in single-file torrents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    /// The name key maps to a UTF-8 encoded string which is the suggested name to save the file
    /// (or directory) as. It is purely advisory.
    pub name: String,
    /// piece length maps to the number of bytes in each piece the file is split into. For the
    /// purposes of transfer, files are split into fixed-size pieces which are all the same length
    /// except for possibly the last one which may be truncated.
    #[serde(rename = "piece length")]
    pub piece_length: u64,
    /// pieces maps to a string whose length is a multiple of 20. It is to be subdivided into
    /// strings of length 20, each of which is the SHA1 hash of the piece at the corresponding index.
    pub pieces: PieceList,
    /// [BEP-0027](https://www.bittorrent.org/beps/bep_0027.html)
    /// extends BitTorrent to support private torrents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

#[derive(Debug, PartialEq)]
pub enum FileMode<'a> {
    Single { length: u64 },
    Multiple { files: &'a [FileInfo] },
}

impl Info {
    pub fn mode(&self) -> FileMode<'_> {
        match &self.files {
            Some(files) => FileMode::Multiple { files },
            None => FileMode::Single {
                length: self.length.unwrap_or_default(),
            },
        }
    }

    /// Bytes to download: the single file's length or the sum over all files.
    pub fn total_length(&self) -> u64 {
        match self.mode() {
            FileMode::Single { length } => length,
            FileMode::Multiple { files } => files.iter().map(|file| file.length).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PieceList(
    /// SHA-1 digest
    pub Vec<Sha1Digest>,
);

impl PieceList {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % Sha1Digest::LENGTH != 0 {
            return Err(Error::MalformedPieces(bytes.len()));
        }

        let digest_list = bytes
            .chunks_exact(Sha1Digest::LENGTH)
            .filter_map(Sha1Digest::from_slice)
            .collect();

        Ok(Self(digest_list))
    }
}

impl Serialize for PieceList {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut bytes = Vec::with_capacity(self.0.len() * Sha1Digest::LENGTH);

        for piece in self.0.as_slice() {
            bytes.extend_from_slice(piece);
        }

        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for PieceList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = ByteBuf::deserialize(deserializer)?;
        PieceList::from_bytes(&bytes).map_err(D::Error::custom)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub length: u64,
    pub path: Vec<String>,
}

/// DHT bootstrap node, encoded as a `[host, port]` list.
#[derive(Debug, PartialEq, Clone)]
pub struct Node {
    pub host: String,
    pub port: u16,
}

impl Node {
    pub fn new(host: String, port: u16) -> Self {
        Node { host, port }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.host, self.port).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (host, port) = <(String, u16)>::deserialize(deserializer)?;
        Ok(Node::new(host, port))
    }
}
