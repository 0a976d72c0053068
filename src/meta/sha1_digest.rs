use std::fmt;
use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::ops::Deref;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_bytes::ByteBuf;
use sha1_smol::Sha1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha1Digest(pub [u8; Self::LENGTH]);

impl Sha1Digest {
    pub const LENGTH: usize = 20;

    pub fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    /// `None` unless `bytes` is exactly [Self::LENGTH] long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        Sha1::from(data).digest().into()
    }
}

impl From<sha1_smol::Digest> for Sha1Digest {
    fn from(digest: sha1_smol::Digest) -> Self {
        Self(digest.bytes())
    }
}

impl Deref for Sha1Digest {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Sha1Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Sha1Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

impl<'de> Deserialize<'de> for Sha1Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = ByteBuf::deserialize(deserializer)?;
        Sha1Digest::from_slice(&bytes).ok_or_else(|| {
            D::Error::custom(format!(
                "digest length {} is not {}",
                bytes.len(),
                Self::LENGTH
            ))
        })
    }
}

impl Serialize for Sha1Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}
