//! Plain data carried by a storage node: identity, peer links and step volumes.
pub mod types;
pub mod volumes;

pub use types::{NodeId, PeerLink, UnitId};
pub use volumes::{ChannelVolumes, StepVolumes};
