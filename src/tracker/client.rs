use std::fmt;
use std::time::Duration;

use log::{debug, trace};
use rand::random;
use url::form_urlencoded::byte_serialize;
use url::Url;

use super::*;

/// Port reported to trackers in announce requests.
pub const PEER_PORT: u16 = 6666;
pub const ANNOUNCE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerId(pub [u8; 20]);

impl PeerId {
    pub fn random() -> Self {
        Self(random())
    }
}

impl AsRef<[u8]> for PeerId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

pub struct Client {
    torrent: Torrent,
    peer_id: PeerId,
}

impl Client {
    pub fn new(torrent: Torrent) -> Self {
        Self::with_peer_id(torrent, PeerId::random())
    }

    pub fn with_peer_id(torrent: Torrent, peer_id: PeerId) -> Self {
        Self { torrent, peer_id }
    }

    pub fn torrent(&self) -> &Torrent {
        &self.torrent
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Build the announce URL, keeping any query the tracker URL already has.
    pub fn announce_url(&self) -> Result<Url> {
        let announce = self
            .torrent
            .announce()
            .ok_or_else(|| Error::Tracker("torrent has no announce url".to_string()))?;
        let mut url = Url::parse(announce)?;
        let info_hash: String = byte_serialize(self.torrent.info_hash.as_ref()).collect();
        let peer_id: String = byte_serialize(self.peer_id.as_ref()).collect();
        let query = format!(
            "info_hash={}&peer_id={}&port={}&uploaded=0&downloaded=0&compact=1&left={}",
            info_hash,
            peer_id,
            PEER_PORT,
            self.torrent.total_length()
        );
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
            _ => query,
        };
        url.set_query(Some(&query));
        Ok(url)
    }

    pub async fn announce(&self) -> Result<TrackerResponse> {
        let url = self.announce_url()?;
        debug!("announce {} to {}", self.torrent.name(), url);
        let http = reqwest::Client::builder()
            .timeout(ANNOUNCE_TIMEOUT)
            .build()?;
        let bytes = http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        trace!("tracker replied with {} bytes", bytes.len());
        TrackerResponse::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(announce: &str) -> Torrent {
        let data = format!(
            "d8:announce{}:{}4:infod6:lengthi100e4:name4:demo12:piece lengthi64e6:pieces20:AAAAAAAAAAAAAAAAAAAAee",
            announce.len(),
            announce
        );
        Torrent::from_bytes(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_announce_url() {
        let torrent = torrent("http://tracker.example:6969/announce");
        let info_hash = torrent.info_hash;
        let client = Client::with_peer_id(torrent, PeerId([b'-'; 20]));
        let url = client.announce_url().unwrap();
        assert_eq!(url.host_str(), Some("tracker.example"));
        assert_eq!(url.port(), Some(6969));

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("peer_id"), "-".repeat(20));
        assert_eq!(get("port"), "6666");
        assert_eq!(get("uploaded"), "0");
        assert_eq!(get("downloaded"), "0");
        assert_eq!(get("compact"), "1");
        assert_eq!(get("left"), "100");

        let expected: String = byte_serialize(info_hash.as_ref()).collect();
        assert!(url.query().unwrap().contains(&format!("info_hash={}", expected)));
    }

    #[test]
    fn test_announce_url_keeps_existing_query() {
        let client = Client::new(torrent("http://tracker.example/announce?key=abc"));
        let url = client.announce_url().unwrap();
        assert!(url.query().unwrap().starts_with("key=abc&info_hash="));
    }

    #[test]
    fn test_announce_url_errors() {
        let client = Client::new(torrent("not a url"));
        assert!(matches!(client.announce_url(), Err(Error::Url(_))));

        let data = b"d4:infod6:lengthi1e4:name1:x12:piece lengthi1e6:pieces0:ee";
        let client = Client::new(Torrent::from_bytes(data).unwrap());
        assert!(matches!(client.announce_url(), Err(Error::Tracker(_))));
    }

    #[test]
    fn test_random_peer_id() {
        assert_ne!(PeerId::random(), PeerId::random());
        assert_eq!(PeerId([0xab; 20]).to_string(), "ab".repeat(20));
    }
}
