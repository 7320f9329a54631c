// FFI Facade: The main entry point for Python.
// The native API lives in `storage`, `store` and `config`; this file wires
// the pyo3 wrappers into the `_core` Python module.

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod config;
pub mod logging;
pub mod storage;
pub mod store;

#[cfg(feature = "python")]
pub mod bindings {
    pub mod python;
}

pub use config::StorageNodeConfig;
pub use storage::{BudgetSnapshot, NodeState, StorageError, StorageNode, StorageResult};
pub use store::{NodeId, PeerLink, StepVolumes, UnitId};

// --- Module Definition ---
/// This function defines the `_core` Python module.
/// The name `_core` is chosen to indicate it's an internal, compiled component.
#[cfg(feature = "python")]
#[pymodule]
fn _core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<bindings::python::PyStorageUnit>()?;
    m.add_function(wrap_pyfunction!(bindings::python::init_logging, m)?)?;
    Ok(())
}
