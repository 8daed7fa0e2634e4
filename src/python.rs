//! Python bindings
//!
//! Exposes the simulation engine to a Python web front-end. Requests and
//! responses cross the boundary as plain dicts with the same shape as the
//! JSON bodies in [`crate::api`].

use crate::api::SimulationRequest;
use crate::engine::{EngineBuilder, SimulationEngine};
use altearth_core::config::EngineConfig;
use altearth_core::errors::AltEarthError;
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyValueError};
use pyo3::prelude::*;
use pythonize::{depythonize, pythonize};
use serde::Serialize;

create_exception!(_lib, AltEarthException, PyException);
create_exception!(_lib, InvalidParameterError, AltEarthException);
create_exception!(_lib, UnknownRegionError, AltEarthException);
create_exception!(_lib, ConfigError, AltEarthException);

fn to_py_err(error: AltEarthError) -> PyErr {
    let message = error.to_string();
    match error {
        AltEarthError::InvalidParameter { .. } => InvalidParameterError::new_err(message),
        AltEarthError::UnknownRegion(_) => UnknownRegionError::new_err(message),
        AltEarthError::Config(_) => ConfigError::new_err(message),
        _ => AltEarthException::new_err(message),
    }
}

fn to_py_object<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    pythonize(py, value)
        .map(Bound::unbind)
        .map_err(|e| PyValueError::new_err(format!("{}", e)))
}

fn build_engine(config: EngineConfig) -> PyResult<PyEngine> {
    EngineBuilder::new()
        .with_config(config)
        .build()
        .map(PyEngine)
        .map_err(to_py_err)
}

/// Scenario simulation engine
///
/// Example:
///     engine = Engine()
///     result = engine.simulate({
///         "region": "Tamil Nadu",
///         "year": 2035,
///         "rainfall_delta": -15.0,
///         "temperature_delta": 1.2,
///         "urban_growth": 30.0,
///     })
#[pyclass(frozen)]
#[pyo3(name = "Engine")]
pub struct PyEngine(SimulationEngine);

#[pymethods]
impl PyEngine {
    /// Create an engine from an optional TOML configuration document
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&str>) -> PyResult<Self> {
        let config = match config {
            Some(contents) => EngineConfig::from_toml_str(contents).map_err(to_py_err)?,
            None => EngineConfig::default(),
        };
        build_engine(config)
    }

    /// Create an engine from a TOML configuration file
    #[staticmethod]
    fn from_path(path: &str) -> PyResult<Self> {
        build_engine(EngineConfig::from_path(path).map_err(to_py_err)?)
    }

    /// Run a scenario, returning the response as a dict
    fn simulate(&self, py: Python<'_>, request: Bound<'_, PyAny>) -> PyResult<PyObject> {
        let request: SimulationRequest =
            depythonize(&request).map_err(|e| PyValueError::new_err(format!("{}", e)))?;
        let result = py
            .allow_threads(|| self.0.simulate_request(&request))
            .map_err(to_py_err)?;
        to_py_object(py, &result)
    }

    /// Human-readable report of a scenario
    fn summary(&self, py: Python<'_>, request: Bound<'_, PyAny>) -> PyResult<String> {
        let request: SimulationRequest =
            depythonize(&request).map_err(|e| PyValueError::new_err(format!("{}", e)))?;
        let result = py
            .allow_threads(|| self.0.simulate_request(&request))
            .map_err(to_py_err)?;
        Ok(result.summary())
    }

    fn regions(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py_object(py, &self.0.regions())
    }

    fn region(&self, py: Python<'_>, name: &str) -> PyResult<PyObject> {
        let details = self.0.region_details(name).map_err(to_py_err)?;
        to_py_object(py, &details)
    }

    fn health(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py_object(py, &self.0.health())
    }

    fn cache_stats(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py_object(py, &self.0.cache_stats())
    }

    fn clear_cache(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py_object(py, &self.0.clear_cache())
    }
}

#[pymodule]
#[pyo3(name = "_lib")]
fn altearth(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<PyEngine>()?;
    m.add("AltEarthError", py.get_type_bound::<AltEarthException>())?;
    m.add("InvalidParameterError", py.get_type_bound::<InvalidParameterError>())?;
    m.add("UnknownRegionError", py.get_type_bound::<UnknownRegionError>())?;
    m.add("ConfigError", py.get_type_bound::<ConfigError>())?;
    Ok(())
}
