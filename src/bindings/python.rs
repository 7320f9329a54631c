use crate::logging;
use crate::storage::{StorageError, StorageNode};
use crate::store::UnitId;
use pyo3::prelude::*;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::types::PyBool;
use std::collections::BTreeMap;

fn to_py_err(err: StorageError) -> PyErr {
    match err {
        StorageError::BalanceExceeded { .. } => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Ints stay numeric; anything else, bools included, is displayed via `str()`.
fn extract_unit_id(id: &Bound<'_, PyAny>) -> PyResult<UnitId> {
    if id.is_instance_of::<PyBool>() {
        return Ok(UnitId::Text(id.str()?.to_cow()?.into_owned()));
    }
    if let Ok(n) = id.extract::<i64>() {
        return Ok(UnitId::Number(n));
    }
    Ok(UnitId::Text(id.str()?.to_cow()?.into_owned()))
}

/// Python view of a storage node. Forcing and peers are arbitrary Python
/// objects, held by reference.
#[pyclass(name = "StorageUnit")]
#[derive(Debug)]
pub struct PyStorageUnit {
    inner: StorageNode<Py<PyAny>, Py<PyAny>>,
}

#[pymethods]
impl PyStorageUnit {
    #[new]
    #[pyo3(signature = (kind, id, area, forcing, verbose = false))]
    pub fn new(
        kind: String,
        id: &Bound<'_, PyAny>,
        area: f64,
        forcing: Py<PyAny>,
        verbose: bool,
    ) -> PyResult<Self> {
        let id = extract_unit_id(id)?;
        Ok(Self { inner: StorageNode::new(kind, id, area, forcing, verbose) })
    }

    pub fn register_recipient(&mut self, recipient: Py<PyAny>, process: String) {
        self.inner.register_recipient(recipient, process);
    }

    pub fn register_dependency(&mut self, dependency: Py<PyAny>, process: String) {
        self.inner.register_dependency(dependency, process);
    }

    /// Any object is accepted. Only non-negative ints reach the trace events;
    /// everything else is reported as step 0.
    pub fn advance(&mut self, step_index: &Bound<'_, PyAny>) {
        self.inner.advance(step_index.extract::<usize>().unwrap_or_default());
    }

    pub fn add_water(&mut self, name: String, rate: f64, duration: f64) {
        self.inner.add_water(name, rate, duration);
    }

    pub fn remove_water(&mut self, name: String, rate: f64, duration: f64) {
        self.inner.remove_water(name, rate, duration);
    }

    pub fn calculate(&mut self, duration: f64) -> f64 {
        self.inner.calculate(duration)
    }

    pub fn finalize(&mut self) {
        self.inner.finalize();
    }

    pub fn get_name(&self) -> String {
        self.inner.get_name().to_string()
    }

    pub fn get_budget_summary_str(&self) -> String {
        self.inner.get_budget_summary_str()
    }

    pub fn report_budget(&self) -> Option<String> {
        self.inner.report_budget()
    }

    pub fn budget_snapshot_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    pub fn check_balance(&self, tolerance: f64) -> PyResult<f64> {
        self.inner.check_balance(tolerance).map_err(to_py_err)
    }

    pub fn residual_change(&self) -> PyResult<f64> {
        self.inner.residual_change().map_err(to_py_err)
    }

    #[getter]
    pub fn residual_old(&self) -> Option<f64> { self.inner.residual_old() }

    #[getter]
    pub fn residual_new(&self) -> Option<f64> { self.inner.residual_new() }

    #[getter]
    pub fn inflow_volumes(&self) -> BTreeMap<String, f64> {
        self.inner.inflow_volumes().clone()
    }

    #[getter]
    pub fn outflow_volumes(&self) -> BTreeMap<String, f64> {
        self.inner.outflow_volumes().clone()
    }

    #[getter]
    pub fn recipients(&self, py: Python<'_>) -> Vec<(Py<PyAny>, String)> {
        self.inner
            .recipients()
            .iter()
            .map(|l| (l.peer.clone_ref(py), l.process.clone()))
            .collect()
    }

    #[getter]
    pub fn dependencies(&self, py: Python<'_>) -> Vec<(Py<PyAny>, String)> {
        self.inner
            .dependencies()
            .iter()
            .map(|l| (l.peer.clone_ref(py), l.process.clone()))
            .collect()
    }

    #[getter]
    pub fn forcing(&self, py: Python<'_>) -> Py<PyAny> { self.inner.forcing().clone_ref(py) }

    #[getter]
    pub fn area(&self) -> f64 { self.inner.area() }

    #[getter]
    pub fn verbose(&self) -> bool { self.inner.is_verbose() }

    #[getter]
    pub fn state(&self) -> String { format!("{:?}", self.inner.state()) }

    fn __repr__(&self) -> String {
        format!("StorageUnit({})", self.inner.get_name())
    }
}

/// Routes node events to stderr. Returns False if logging was already set up.
#[pyfunction]
#[pyo3(signature = (level = "info"))]
pub fn init_logging(level: &str) -> bool {
    logging::init_logging(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::types::{PyInt, PyString};
    use rstest::rstest;
    use std::ffi::CString;

    fn unit<'py>(py: Python<'py>, id: &Bound<'py, PyAny>) -> PyStorageUnit {
        PyStorageUnit::new("soil".to_string(), id, 10.0, py.None(), false).unwrap()
    }

    #[rstest]
    #[case("1", "soil1")]
    #[case("-4", "soil-4")]
    #[case("'north'", "soilnorth")]
    #[case("1.5", "soil1.5")]
    #[case("2.0", "soil2.0")]
    #[case("True", "soilTrue")]
    #[case("False", "soilFalse")]
    fn test_name_follows_python_formatting(#[case] id_expr: &str, #[case] expected: &str) {
        Python::initialize();
        Python::attach(|py| {
            let code = CString::new(id_expr).unwrap();
            let id = py.eval(&code, None, None).unwrap();
            assert_eq!(unit(py, &id).get_name(), expected);
        });
    }

    #[test]
    fn test_advance_accepts_any_step_index() {
        Python::initialize();
        Python::attach(|py| {
            let mut u = unit(py, &PyInt::new(py, 1).into_any());
            u.add_water("precip".into(), 2.0, 3.0);
            u.remove_water("evap".into(), -1.0, 3.0);
            assert_eq!(u.calculate(3.0), 3.0);

            u.advance(&PyInt::new(py, -1).into_any());
            assert_eq!(u.residual_old(), Some(3.0));
            assert!(u.inflow_volumes().is_empty());

            u.advance(&PyString::new(py, "next").into_any());
            u.advance(&py.None().into_bound(py));
            assert_eq!(u.calculate(3.0), 0.0);
            assert_eq!(u.state(), "Calculated");
        });
    }

    #[test]
    fn test_peers_and_forcing_are_the_same_objects() {
        Python::initialize();
        Python::attach(|py| {
            let forcing = PyString::new(py, "cbh.nc").into_any().unbind();
            let peer = PyString::new(py, "channel3").into_any().unbind();
            let id = PyInt::new(py, 1).into_any();
            let mut u = PyStorageUnit::new("soil".into(), &id, 1.0, forcing.clone_ref(py), true)
                .unwrap();
            u.register_recipient(peer.clone_ref(py), "runoff".into());
            u.register_recipient(peer.clone_ref(py), "runoff".into());

            let recipients = u.recipients(py);
            assert_eq!(recipients.len(), 2);
            assert!(recipients[0].0.is(&peer));
            assert_eq!(recipients[1].1, "runoff");
            assert!(u.dependencies(py).is_empty());
            assert!(u.forcing(py).is(&forcing));
            assert!(u.verbose());
        });
    }

    #[test]
    fn test_balance_errors_map_to_python_exceptions() {
        Python::initialize();
        Python::attach(|py| {
            let mut u = unit(py, &PyInt::new(py, 1).into_any());
            let err = u.check_balance(1.0).unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));

            u.add_water("precip".into(), 5.0, 1.0);
            u.calculate(1.0);
            let err = u.check_balance(1.0).unwrap_err();
            assert!(err.is_instance_of::<PyRuntimeError>(py));
            assert_eq!(u.check_balance(5.0).unwrap(), 5.0);
        });
    }
}
