//! volumes.rs
//! Per-step channel volumes of a single storage node.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Volumes keyed by channel name. Keys are kept sorted so that summaries
/// render the same way regardless of the order channels were set in.
pub type ChannelVolumes = BTreeMap<String, f64>;

/// The inflow and outflow volumes recorded during one time step.
///
/// A fresh value is built on every `advance`, so nothing recorded for an
/// earlier step can leak into the current one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepVolumes {
    pub inflow: ChannelVolumes,
    pub outflow: ChannelVolumes,
}

impl StepVolumes {
    pub fn new() -> Self { Self::default() }

    /// Last write wins for a repeated channel name.
    #[inline]
    pub fn set_inflow(&mut self, name: impl Into<String>, volume: f64) {
        self.inflow.insert(name.into(), volume);
    }

    #[inline]
    pub fn set_outflow(&mut self, name: impl Into<String>, volume: f64) {
        self.outflow.insert(name.into(), volume);
    }

    pub fn inflow_total(&self) -> f64 {
        self.inflow.values().sum()
    }

    pub fn outflow_total(&self) -> f64 {
        self.outflow.values().sum()
    }

    /// Signed sum of every stored volume. Outflow entries are added as stored;
    /// callers supply them already signed.
    pub fn net(&self) -> f64 {
        self.inflow.values().chain(self.outflow.values()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inflow.is_empty() && self.outflow.is_empty()
    }
}
