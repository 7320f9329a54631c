use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a storage node inside a driver-owned collection.
///
/// Native drivers usually register peers by this index rather than by
/// reference, which keeps peer links free of ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: u32) -> Self { Self(idx) }
}

impl TryFrom<usize> for NodeId {
    type Error = std::num::TryFromIntError;

    /// Fails for indices past `u32::MAX` instead of wrapping onto another node.
    fn try_from(idx: usize) -> Result<Self, Self::Error> {
        u32::try_from(idx).map(Self)
    }
}

/// Instance identifier of a storage node. Drivers use either numbered
/// (HRU 12, segment 4) or named (`"outlet"`) instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Number(n) => write!(f, "{}", n),
            UnitId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for UnitId {
    fn from(n: i64) -> Self { UnitId::Number(n) }
}

impl From<u32> for UnitId {
    fn from(n: u32) -> Self { UnitId::Number(n as i64) }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self { UnitId::Text(s.to_string()) }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self { UnitId::Text(s) }
}

/// A topology record: some peer and the process that connects it to this node.
/// Purely informational; the node never calls into `peer`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerLink<P> {
    pub peer: P,
    pub process: String,
}

impl<P> PeerLink<P> {
    pub fn new(peer: P, process: impl Into<String>) -> Self {
        Self { peer, process: process.into() }
    }
}
