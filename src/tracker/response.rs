use std::net::{Ipv4Addr, SocketAddrV4};

use log::warn;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::*;

/// Bytes per compact peer: IPv4 address followed by a big-endian port.
pub const COMPACT_PEER_LEN: usize = 6;

/// Reply to an announce. Every key is optional on the wire.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct TrackerResponse {
    #[serde(rename = "failure reason", skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(rename = "warning message", skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    pub interval: u64,
    #[serde(rename = "min interval", skip_serializing_if = "Option::is_none")]
    pub min_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<u64>,
    pub peers: CompactPeers,
}

impl TrackerResponse {
    /// Unmarshal a tracker reply, turning a `failure reason` into an error.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let response: Self = de::from_bytes(data)?;
        if let Some(reason) = response.failure_reason {
            return Err(Error::Tracker(reason));
        }
        if let Some(warning) = &response.warning_message {
            warn!("tracker warning: {}", warning);
        }
        Ok(response)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompactPeers(pub Vec<SocketAddrV4>);

impl CompactPeers {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % COMPACT_PEER_LEN != 0 {
            return Err(Error::MalformedPeers(bytes.len()));
        }
        let address_list = bytes
            .chunks_exact(COMPACT_PEER_LEN)
            .map(|chunk| {
                let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
                let port = u16::from_be_bytes([chunk[4], chunk[5]]);
                SocketAddrV4::new(ip, port)
            })
            .collect();
        Ok(Self(address_list))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.0.len() * COMPACT_PEER_LEN);
        for addr in &self.0 {
            bytes.extend_from_slice(&addr.ip().octets());
            bytes.extend_from_slice(&addr.port().to_be_bytes());
        }
        bytes
    }
}

impl Serialize for CompactPeers {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes::Bytes::new(self.to_bytes().as_slice()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompactPeers {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?.into_vec();
        CompactPeers::from_bytes(&bytes).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_peers() {
        let peers = CompactPeers::from_bytes(&[127, 0, 0, 1, 0x1a, 0xe1, 10, 1, 2, 3, 0, 80]).unwrap();
        assert_eq!(
            peers.0,
            vec![
                SocketAddrV4::new(Ipv4Addr::LOCALHOST, 6881),
                SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 3), 80),
            ]
        );
        assert_eq!(peers.to_bytes().len(), 12);
        assert!(CompactPeers::from_bytes(&[]).unwrap().0.is_empty());
        assert!(matches!(
            CompactPeers::from_bytes(&[1, 2, 3, 4, 5]),
            Err(Error::MalformedPeers(5))
        ));
    }

    #[test]
    fn test_tracker_response() {
        let data = b"d8:completei3e10:incompletei1e8:intervali900e5:peers6:\x7f\x00\x00\x01\x1a\xe1e";
        let response = TrackerResponse::from_bytes(data).unwrap();
        assert_eq!(response.interval, 900);
        assert_eq!(response.complete, Some(3));
        assert_eq!(response.incomplete, Some(1));
        assert_eq!(response.min_interval, None);
        assert_eq!(
            response.peers.0,
            vec![SocketAddrV4::new(Ipv4Addr::LOCALHOST, 6881)]
        );
    }

    #[test]
    fn test_sparse_response_uses_defaults() {
        let response = TrackerResponse::from_bytes(b"d8:intervali60ee").unwrap();
        assert_eq!(response.interval, 60);
        assert!(response.peers.0.is_empty());
        assert_eq!(response.complete, None);
    }

    #[test]
    fn test_mistyped_key_keeps_peers() {
        // some trackers send the interval as a string
        let data = b"d8:interval4:18005:peers6:\x0a\x00\x00\x02\x1a\xe1e";
        let response = TrackerResponse::from_bytes(data).unwrap();
        assert_eq!(response.interval, 0);
        assert_eq!(
            response.peers.0,
            vec![SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 6881)]
        );

        let response = TrackerResponse::from_bytes(b"d8:intervali30e5:peersi0ee").unwrap();
        assert_eq!(response.interval, 30);
        assert!(response.peers.0.is_empty());
    }

    #[test]
    fn test_failure_reason() {
        let ret = TrackerResponse::from_bytes(b"d14:failure reason12:unregisterede");
        assert!(matches!(ret, Err(Error::Tracker(reason)) if reason == "unregistered"));
    }

    #[test]
    fn test_malformed_peers() {
        let ret = TrackerResponse::from_bytes(b"d5:peers5:abcdee");
        assert!(matches!(ret, Err(Error::Custom(msg)) if msg.contains("multiple of 6")));
    }

    #[test]
    fn test_round_trip() {
        let response = TrackerResponse {
            interval: 1800,
            complete: Some(10),
            peers: CompactPeers(vec![SocketAddrV4::new(Ipv4Addr::new(1, 2, 3, 4), 6666)]),
            ..Default::default()
        };
        let bytes = ser::to_bytes(&response).unwrap();
        assert_eq!(TrackerResponse::from_bytes(&bytes).unwrap(), response);
    }
}
