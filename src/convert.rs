//! Conversions between Python objects and engine types
//!
//! Trees cross the boundary in their transport form (dicts with `kind`,
//! `left`, `right`, `value`); records are dicts of plain Python values.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use serde_json::{Map, Number, Value};

use crate::config::EngineConfig;
use crate::rule::{NodeRepr, RuleNode};

/// Helper to get attribute from either dict or object
fn get_attr<'py>(obj: &Bound<'py, PyAny>, name: &str) -> PyResult<Bound<'py, PyAny>> {
    if let Ok(dict) = obj.downcast::<PyDict>() {
        dict.get_item(name)?
            .ok_or_else(|| pyo3::exceptions::PyKeyError::new_err(name.to_string()))
    } else {
        obj.getattr(name)
    }
}

/// Helper to get optional attribute from either dict or object; `None` values count as missing
fn get_attr_opt<'py>(obj: &Bound<'py, PyAny>, name: &str) -> Option<Bound<'py, PyAny>> {
    let value = if let Ok(dict) = obj.downcast::<PyDict>() {
        dict.get_item(name).ok().flatten()
    } else {
        obj.getattr(name).ok()
    };
    value.filter(|v| !v.is_none())
}

// ============================================================================
// Configuration
// ============================================================================

/// Extract engine configuration; missing keys take their defaults
pub fn extract_config(obj: &Bound<'_, PyAny>) -> PyResult<EngineConfig> {
    let defaults = EngineConfig::default();

    let cache_enabled = match get_attr_opt(obj, "cache_enabled") {
        Some(v) => v.extract()?,
        None => defaults.cache_enabled,
    };
    let cache_capacity = match get_attr_opt(obj, "cache_capacity") {
        Some(v) => v.extract()?,
        None => defaults.cache_capacity,
    };

    Ok(EngineConfig {
        cache_enabled,
        cache_capacity,
    })
}

// ============================================================================
// Rule trees
// ============================================================================

/// Rebuild a tree from its transport form. `None` is the absent tree.
pub fn extract_node(obj: &Bound<'_, PyAny>) -> PyResult<Option<RuleNode>> {
    if obj.is_none() {
        return Ok(None);
    }
    let repr = extract_repr(obj)?;
    Ok(Some(RuleNode::try_from(repr)?))
}

fn extract_repr(obj: &Bound<'_, PyAny>) -> PyResult<NodeRepr> {
    let kind: String = get_attr(obj, "kind")?.extract()?;
    let value: Option<String> = match get_attr_opt(obj, "value") {
        Some(v) => Some(v.extract()?),
        None => None,
    };

    Ok(NodeRepr {
        kind,
        left: extract_child(obj, "left")?,
        right: extract_child(obj, "right")?,
        value,
    })
}

fn extract_child(obj: &Bound<'_, PyAny>, name: &str) -> PyResult<Option<Box<NodeRepr>>> {
    match get_attr_opt(obj, name) {
        Some(child) => Ok(Some(Box::new(extract_repr(&child)?))),
        None => Ok(None),
    }
}

/// Transport form of a tree as a Python dict
pub fn node_to_dict<'py>(py: Python<'py>, node: &RuleNode) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("kind", node.kind().as_str())?;
    match node.left() {
        Some(left) => dict.set_item("left", node_to_dict(py, left)?)?,
        None => dict.set_item("left", py.None())?,
    }
    match node.right() {
        Some(right) => dict.set_item("right", node_to_dict(py, right)?)?,
        None => dict.set_item("right", py.None())?,
    }
    dict.set_item("value", node.value())?;
    Ok(dict)
}

// ============================================================================
// Records
// ============================================================================

/// Convert a Python dict into a record. Non-string keys go through `str()`.
pub fn extract_record(dict: &Bound<'_, PyDict>) -> PyResult<Map<String, Value>> {
    let mut record = Map::new();
    for (key, value) in dict.iter() {
        let key: String = match key.extract() {
            Ok(key) => key,
            Err(_) => key.str()?.to_string(),
        };
        record.insert(key, extract_value(&value)?);
    }
    Ok(record)
}

/// Convert a Python value into a record value
pub fn extract_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }

    // bool before int: bool is an int subclass in Python
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }

    if obj.is_instance_of::<PyInt>() {
        if let Ok(i) = obj.extract::<i64>() {
            return Ok(Value::from(i));
        }
        if let Ok(u) = obj.extract::<u64>() {
            return Ok(Value::from(u));
        }
        // Larger ints keep their digits as text
        return Ok(Value::String(obj.str()?.to_string()));
    }

    if let Ok(f) = obj.downcast::<PyFloat>() {
        return Ok(Number::from_f64(f.value())
            .map(Value::Number)
            .unwrap_or(Value::Null));
    }

    if obj.is_instance_of::<PyString>() {
        return Ok(Value::String(obj.extract()?));
    }

    if let Ok(list) = obj.downcast::<PyList>() {
        let items = list
            .iter()
            .map(|item| extract_value(&item))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Value::Array(items));
    }

    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        let items = tuple
            .iter()
            .map(|item| extract_value(&item))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Value::Array(items));
    }

    if let Ok(dict) = obj.downcast::<PyDict>() {
        return Ok(Value::Object(extract_record(dict)?));
    }

    Ok(Value::String(obj.str()?.to_string()))
}
