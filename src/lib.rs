//! Rule Engine Core - boolean rule parsing and evaluation
//!
//! Parses comparison rules such as `age > 30 AND department = 'Sales'` into a
//! strictly left-associative tree, combines several rules under AND, and
//! evaluates trees against attribute records.
//!
//! ```
//! use rule_engine_core::rule::{combine, evaluate, parse};
//! use serde_json::json;
//!
//! let ast = parse("age > '25' AND department = 'Sales'");
//! let record = json!({"age": 30, "department": "Sales"});
//! assert!(evaluate(ast.as_ref(), &record).unwrap());
//!
//! let combined = combine(&["age > 25", "department = 'Ops'"]);
//! assert!(!evaluate(combined.as_ref(), &record).unwrap());
//! ```
//!
//! The crate also builds as a Python extension module exposing the same
//! operations on dicts.

use pyo3::prelude::*;

pub mod config;
pub mod convert;
pub mod error;
pub mod rule;

use pyo3::exceptions::PyRuntimeError;
use pyo3::types::PyDict;

// ============================================================================
// Python Functions
// ============================================================================

/// Parse a rule string into its transport form
///
/// # Returns
/// A dict with `kind`, `left`, `right`, `value`, or `None` when the rule holds
/// no operand clause
#[pyfunction]
fn parse_rule<'py>(py: Python<'py>, rule: &str) -> PyResult<Option<Bound<'py, PyDict>>> {
    rule::parse(rule)
        .map(|ast| convert::node_to_dict(py, &ast))
        .transpose()
}

/// Parse several rules and join them left to right under AND
///
/// # Returns
/// The combined tree in transport form, or `None` for an empty list
#[pyfunction]
fn combine_rules<'py>(py: Python<'py>, rules: Vec<String>) -> PyResult<Option<Bound<'py, PyDict>>> {
    rule::combine(&rules)
        .map(|ast| convert::node_to_dict(py, &ast))
        .transpose()
}

/// Evaluate a tree in transport form against a record
///
/// # Raises
/// ValueError for malformed trees, unknown operators or invalid operands
#[pyfunction]
fn evaluate_rule(ast: &Bound<'_, PyAny>, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let ast = convert::extract_node(ast)?;
    let record = convert::extract_record(data)?;
    Ok(rule::evaluate(ast.as_ref(), &record)?)
}

/// Evaluate a tree asynchronously
///
/// Inputs are converted while holding the GIL; the evaluation itself runs on
/// Tokio's blocking pool.
///
/// # Example (Python)
/// ```python
/// ok = await evaluate_rule_async(parse_rule("age > 30"), {"age": 31})
/// ```
#[pyfunction]
fn evaluate_rule_async<'py>(
    py: Python<'py>,
    ast: &Bound<'py, PyAny>,
    data: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    let ast = convert::extract_node(ast)?;
    let record = convert::extract_record(data)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let verdict = tokio::task::spawn_blocking(move || rule::evaluate(ast.as_ref(), &record))
            .await
            .map_err(|e| PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e)))??;

        Ok(verdict)
    })
}

/// Parse (cached) and evaluate a rule string in one call
#[pyfunction]
fn check_rule(rule: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = convert::extract_record(data)?;
    Ok(rule::check_rule(rule, &record)?)
}

/// Apply engine configuration; `None` restores the defaults
#[pyfunction]
#[pyo3(signature = (config=None))]
fn configure(config: Option<&Bound<'_, PyAny>>) -> PyResult<()> {
    let config = match config {
        Some(obj) => convert::extract_config(obj)?,
        None => config::EngineConfig::default(),
    };
    Ok(config::configure(config)?)
}

#[pyfunction]
fn clear_cache() {
    rule::clear_cache();
}

#[pyfunction]
fn cache_size() -> usize {
    rule::cache_size()
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_rule, m)?)?;
    m.add_function(wrap_pyfunction!(combine_rules, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule_async, m)?)?;
    m.add_function(wrap_pyfunction!(check_rule, m)?)?;
    m.add_function(wrap_pyfunction!(configure, m)?)?;
    m.add_function(wrap_pyfunction!(clear_cache, m)?)?;
    m.add_function(wrap_pyfunction!(cache_size, m)?)?;
    Ok(())
}
