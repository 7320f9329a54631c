//! node.rs
//! Per-step water accounting for one storage element.

use super::error::{StorageError, StorageResult};
use super::summary::{self, BudgetSnapshot};
use crate::config::StorageNodeConfig;
use crate::store::{ChannelVolumes, NodeId, PeerLink, StepVolumes, UnitId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{info, trace, warn};

/// Where a node is in its step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Only seen while the constructor runs.
    Uninitialized,
    /// Volumes cleared, accepting `add_water`/`remove_water`.
    ReadyForInput,
    /// `calculate` has produced this step's residual.
    Calculated,
    /// The driver has ended the simulation.
    Finalized,
}

type PeerLinks<P> = SmallVec<[PeerLink<P>; 2]>;

/// A storage element (reservoir, soil zone, stream segment) that accumulates
/// the volumes a driver hands it and reports their signed sum as a residual.
///
/// `F` is the forcing handle and `P` the peer handle. Both are opaque to the
/// node: it stores them and hands them back, nothing else. Construction always
/// leaves the node `ReadyForInput`.
///
/// The per-step sequence is `advance` -> any number of `add_water` /
/// `remove_water` -> `calculate`. Access must be exclusive; the node does no
/// locking of its own.
#[derive(Debug)]
pub struct StorageNode<F, P = NodeId> {
    kind: String,
    id: UnitId,
    name: String,
    area: f64,
    forcing: F,
    verbose: bool,
    state: NodeState,
    residual_old: Option<f64>,
    residual_new: Option<f64>,
    volumes: StepVolumes,
    recipients: PeerLinks<P>,
    dependencies: PeerLinks<P>,
    /// Whether `residual_new` reflects the volumes recorded this step.
    step_calculated: bool,
    calculations: usize,
    history: Vec<BudgetSnapshot>,
}

impl<F, P> StorageNode<F, P> {
    pub fn new(
        kind: impl Into<String>,
        id: impl Into<UnitId>,
        area: f64,
        forcing: F,
        verbose: bool,
    ) -> Self {
        let kind = kind.into();
        let id = id.into();
        let name = format!("{}{}", kind, id);
        let mut node = Self {
            kind,
            id,
            name,
            area,
            forcing,
            verbose,
            state: NodeState::Uninitialized,
            residual_old: None,
            residual_new: None,
            volumes: StepVolumes::new(),
            recipients: SmallVec::new(),
            dependencies: SmallVec::new(),
            step_calculated: false,
            calculations: 0,
            history: Vec::new(),
        };
        node.advance(0);
        node
    }

    pub fn from_config(config: StorageNodeConfig, forcing: F) -> Self {
        Self::new(config.kind, config.id, config.area, forcing, config.verbose)
    }

    // --- Topology bookkeeping ---

    /// Appends `(peer, process)` to the consumers of this node's output.
    /// Duplicates are kept.
    pub fn register_recipient(&mut self, peer: P, process: impl Into<String>) {
        self.recipients.push(PeerLink::new(peer, process));
    }

    /// Appends `(peer, process)` to the producers this node depends on.
    pub fn register_dependency(&mut self, peer: P, process: impl Into<String>) {
        self.dependencies.push(PeerLink::new(peer, process));
    }

    // --- Step cycle ---

    /// Starts a new step: the previous residual becomes `residual_old` and the
    /// volume maps are replaced with empty ones. `step_index` is not checked;
    /// ordering is the driver's concern.
    pub fn advance(&mut self, step_index: usize) {
        self.warn_if_finalized("advance");
        self.residual_old = self.residual_new;
        self.volumes = StepVolumes::new();
        self.step_calculated = false;
        if self.state != NodeState::Finalized {
            self.state = NodeState::ReadyForInput;
        }
        trace!(node = %self.name, step = step_index, residual_old = ?self.residual_old, "advanced");
    }

    /// Records `rate * duration` under `name`, replacing any earlier inflow of
    /// the same name this step.
    pub fn add_water(&mut self, name: impl Into<String>, rate: f64, duration: f64) {
        self.warn_if_finalized("add_water");
        self.volumes.set_inflow(name, rate * duration);
        self.step_calculated = false;
    }

    /// Records `rate * duration` under `name` as an outflow. The product is
    /// stored as given, so callers pass rates already signed for the balance.
    pub fn remove_water(&mut self, name: impl Into<String>, rate: f64, duration: f64) {
        self.warn_if_finalized("remove_water");
        self.volumes.set_outflow(name, rate * duration);
        self.step_calculated = false;
    }

    /// Sums every inflow and outflow volume of the step into `residual_new`
    /// and returns it. `duration` is unused: the volumes are already products
    /// of rate and duration.
    pub fn calculate(&mut self, _duration: f64) -> f64 {
        self.warn_if_finalized("calculate");
        let residual = self.volumes.net();
        self.residual_new = Some(residual);
        self.step_calculated = true;
        self.calculations += 1;
        if self.state != NodeState::Finalized {
            self.state = NodeState::Calculated;
        }
        let snapshot = self.budget_snapshot();
        self.history.push(snapshot);
        trace!(node = %self.name, residual, "calculated");
        residual
    }

    /// Ends the node's life. Holds no resources yet, so this only marks the
    /// state; calling it twice is harmless.
    pub fn finalize(&mut self) {
        self.state = NodeState::Finalized;
    }

    fn warn_if_finalized(&self, op: &'static str) {
        if self.state == NodeState::Finalized {
            warn!(node = %self.name, op, "operation on a finalized storage node");
        }
    }

    // --- Reporting ---

    pub fn get_name(&self) -> &str { &self.name }

    pub fn get_budget_summary_str(&self) -> String {
        summary::format_summary(&self.name, &self.volumes, self.residual_new)
    }

    /// Emits the budget summary at info level when the node is verbose and
    /// returns it; returns `None` otherwise.
    pub fn report_budget(&self) -> Option<String> {
        if !self.verbose {
            return None;
        }
        let line = self.get_budget_summary_str();
        info!(node = %self.name, "{}", line);
        Some(line)
    }

    pub fn budget_snapshot(&self) -> BudgetSnapshot {
        BudgetSnapshot {
            name: self.name.clone(),
            ordinal: self.calculations,
            state: self.state,
            inflow: self.volumes.inflow.clone(),
            outflow: self.volumes.outflow.clone(),
            residual_old: self.residual_old,
            residual_new: self.residual_new,
        }
    }

    pub fn to_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string(&self.budget_snapshot())?)
    }

    // --- Balance helpers ---

    pub fn net_inflow(&self) -> f64 { self.volumes.inflow_total() }
    pub fn net_outflow(&self) -> f64 { self.volumes.outflow_total() }

    /// `residual_new - residual_old`, once the previous and the current step
    /// have both been calculated.
    pub fn residual_change(&self) -> StorageResult<f64> {
        let new = self.current_residual()?;
        let old = self.residual_old.ok_or_else(|| self.residual_unavailable())?;
        Ok(new - old)
    }

    /// Returns the current step's residual if its magnitude is within
    /// `tolerance`. A NaN residual never passes.
    pub fn check_balance(&self, tolerance: f64) -> StorageResult<f64> {
        let residual = self.current_residual()?;
        if residual.abs() <= tolerance {
            Ok(residual)
        } else {
            Err(StorageError::BalanceExceeded { name: self.name.clone(), residual, tolerance })
        }
    }

    /// `residual_new`, but only if nothing was recorded since the last `calculate`.
    fn current_residual(&self) -> StorageResult<f64> {
        match self.residual_new {
            Some(residual) if self.step_calculated => Ok(residual),
            _ => Err(self.residual_unavailable()),
        }
    }

    fn residual_unavailable(&self) -> StorageError {
        StorageError::ResidualUnavailable { name: self.name.clone() }
    }

    // --- Accessors ---

    pub fn kind(&self) -> &str { &self.kind }
    pub fn id(&self) -> &UnitId { &self.id }
    pub fn area(&self) -> f64 { self.area }
    pub fn forcing(&self) -> &F { &self.forcing }
    pub fn is_verbose(&self) -> bool { self.verbose }
    pub fn state(&self) -> NodeState { self.state }
    pub fn residual_old(&self) -> Option<f64> { self.residual_old }
    pub fn residual_new(&self) -> Option<f64> { self.residual_new }
    pub fn volumes(&self) -> &StepVolumes { &self.volumes }
    pub fn inflow_volumes(&self) -> &ChannelVolumes { &self.volumes.inflow }
    pub fn outflow_volumes(&self) -> &ChannelVolumes { &self.volumes.outflow }
    pub fn recipients(&self) -> &[PeerLink<P>] { &self.recipients }
    pub fn dependencies(&self) -> &[PeerLink<P>] { &self.dependencies }
    pub fn history(&self) -> &[BudgetSnapshot] { &self.history }

    /// Hands the recorded history to the caller and starts a new, empty one.
    /// Drivers that keep a node for a long run call this every few steps.
    pub fn take_history(&mut self) -> Vec<BudgetSnapshot> {
        std::mem::take(&mut self.history)
    }
}
