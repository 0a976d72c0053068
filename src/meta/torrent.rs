use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use super::*;

/// A parsed metainfo file together with its identity.
#[derive(Debug, Clone)]
pub struct Torrent {
    pub meta_info: MetaInfo,
    /// SHA-1 of the canonical encoding of the `info` dict.
    pub info_hash: Sha1Digest,
}

impl Torrent {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("open torrent {:?}", path.as_ref());
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Self::from_value(parse(reader)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_value(decode(data)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        // the info dict is the torrent's identity, so it can't be zero-filled
        let info_hash = match value.get(b"info") {
            Some(info @ Value::Dict(_)) => Sha1Digest::digest(to_vec(info)?),
            Some(other) => {
                return Err(Error::TypeMismatch {
                    expected: "dict",
                    found: other.kind(),
                })
            }
            None => return Err(Error::Custom("missing field `info`".to_string())),
        };
        let meta_info: MetaInfo = de::from_value(value)?;
        debug!("torrent {:?} info hash {}", meta_info.info.name, info_hash);
        Ok(Self {
            meta_info,
            info_hash,
        })
    }

    pub fn announce(&self) -> Option<&str> {
        self.meta_info.announce.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.meta_info.info.name
    }

    pub fn total_length(&self) -> u64 {
        self.meta_info.info.total_length()
    }

    pub fn piece_length(&self) -> u64 {
        self.meta_info.info.piece_length
    }

    pub fn piece_hashes(&self) -> &[Sha1Digest] {
        &self.meta_info.info.pieces.0
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::ser;

    const SAMPLE_TORRENT: &str = concat!(
        "d",
        "8:announce41:http://bttracker.debian.org:6969/announce",
        "7:comment4:test",
        "4:info",
        "d",
        "6:lengthi100e",
        "4:name8:demo.iso",
        "12:piece lengthi64e",
        "6:pieces40:AAAAAAAAAAAAAAAAAAAABBBBBBBBBBBBBBBBBBBB",
        "e",
        "e"
    );

    fn raw_info() -> &'static str {
        let start = SAMPLE_TORRENT.find("4:info").unwrap() + "4:info".len();
        &SAMPLE_TORRENT[start..SAMPLE_TORRENT.len() - 1]
    }

    #[test]
    fn test_parse_torrent() {
        let torrent = Torrent::from_bytes(SAMPLE_TORRENT.as_bytes()).unwrap();
        assert_eq!(
            torrent.announce(),
            Some("http://bttracker.debian.org:6969/announce")
        );
        assert_eq!(torrent.meta_info.comment.as_deref(), Some("test"));
        assert_eq!(torrent.name(), "demo.iso");
        assert_eq!(torrent.total_length(), 100);
        assert_eq!(torrent.piece_length(), 64);
        assert_eq!(torrent.piece_hashes().len(), 2);
        assert_eq!(&torrent.piece_hashes()[1][..], &[b'B'; 20][..]);
        assert_eq!(torrent.info_hash, Sha1Digest::digest(raw_info()));
    }

    #[test]
    fn test_info_hash_matches_marshaled_info() {
        let torrent = Torrent::from_bytes(SAMPLE_TORRENT.as_bytes()).unwrap();
        let marshaled = ser::to_bytes(&torrent.meta_info.info).unwrap();
        assert_eq!(Sha1Digest::digest(marshaled), torrent.info_hash);
    }

    #[test]
    fn test_info_hash_uses_canonical_key_order() {
        // same info dict with keys out of order and an unknown key
        let reordered = concat!(
            "d8:announce1:x4:info",
            "d4:name8:demo.iso6:lengthi100e6:pieces40:AAAAAAAAAAAAAAAAAAAABBBBBBBBBBBBBBBBBBBB",
            "12:piece lengthi64ee",
            "e"
        );
        let torrent = Torrent::from_bytes(reordered.as_bytes()).unwrap();
        assert_eq!(torrent.info_hash, Sha1Digest::digest(raw_info()));

        let extended = SAMPLE_TORRENT.replace("4:name", "1:xi1e4:name");
        let torrent = Torrent::from_bytes(extended.as_bytes()).unwrap();
        assert_ne!(torrent.info_hash, Sha1Digest::digest(raw_info()));
    }

    #[test]
    fn test_open_file() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("bencodec-{}.torrent", std::process::id()));
        File::create(&path)?.write_all(SAMPLE_TORRENT.as_bytes())?;
        let torrent = Torrent::open(&path);
        std::fs::remove_file(&path)?;
        assert_eq!(torrent?.name(), "demo.iso");
        Ok(())
    }

    #[test]
    fn test_bad_torrents() {
        assert!(matches!(
            Torrent::from_bytes(b"l4:infoe"),
            Err(Error::TypeMismatch { expected: "dict", .. })
        ));
        assert!(matches!(
            Torrent::from_bytes(b"d4:infoi1ee"),
            Err(Error::TypeMismatch {
                expected: "dict",
                found: "integer"
            })
        ));
        assert!(matches!(
            Torrent::from_bytes(b"d8:announce3:urle"),
            Err(Error::Custom(msg)) if msg.contains("info")
        ));
        assert!(matches!(
            Torrent::from_bytes(b"d4:infod12:piece lengthi1e6:pieces3:abcee"),
            Err(Error::Custom(_))
        ));
        assert!(Torrent::open("/nonexistent/file.torrent").is_err());
    }
}
