//! Registry vocabulary: committee addresses and bootup records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RegistryError;

// ── CommitteeAddress ──────────────────────────────────────────────────────────

/// Byte length of a [`CommitteeAddress`].
pub const ADDRESS_LEN: usize = 33;

/// Fixed-size binary identifier naming a committee.
///
/// One version byte followed by a 32-byte digest. Equality is byte-exact;
/// the textual form is lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitteeAddress([u8; ADDRESS_LEN]);

impl CommitteeAddress {
    pub const LEN: usize = ADDRESS_LEN;

    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }
}

impl fmt::Display for CommitteeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for CommitteeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitteeAddress({self})")
    }
}

impl FromStr for CommitteeAddress {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim())
            .map_err(|e| RegistryError::InvalidAddress(format!("{s:?}: {e}")))?;
        let bytes: [u8; Self::LEN] = raw.try_into().map_err(|v: Vec<u8>| {
            RegistryError::InvalidAddress(format!(
                "{s:?}: expected {} bytes, got {}",
                Self::LEN,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for CommitteeAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CommitteeAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── BootupRecord ──────────────────────────────────────────────────────────────

/// Persisted description of a committee this node should (re)join at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootupRecord {
    pub address: CommitteeAddress,
    /// Address of the chain owner, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<CommitteeAddress>,
    /// Hex-encoded token color of the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Peering endpoints (`host:port`) of the committee members, in index order.
    #[serde(default)]
    pub committee_nodes: Vec<String>,
    /// Peering endpoints of non-voting access nodes.
    #[serde(default)]
    pub access_nodes: Vec<String>,
    /// Explicit quorum size; defaults to a two-thirds majority when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorum: Option<u16>,
}

impl BootupRecord {
    /// Minimal record with no members, mostly useful to tests and tooling.
    pub fn new(address: CommitteeAddress) -> Self {
        Self {
            address,
            owner_address: None,
            color: None,
            committee_nodes: Vec::new(),
            access_nodes: Vec::new(),
            quorum: None,
        }
    }

    pub fn with_committee<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.committee_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_quorum(mut self, quorum: u16) -> Self {
        self.quorum = Some(quorum);
        self
    }

    /// Quorum size in effect: the explicit value, or `floor(2n/3) + 1`.
    pub fn effective_quorum(&self) -> usize {
        match self.quorum {
            Some(q) => q as usize,
            None => self.committee_nodes.len() * 2 / 3 + 1,
        }
    }
}
