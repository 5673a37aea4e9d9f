//! Named-dimension arrays with attached metadata.
//!
//! A [`Field`] is the unit of data stored in a [`Dataset`](crate::dataset::Dataset):
//! an n-dimensional array of `f64` values where every axis carries a dimension name
//! (e.g. `time_counter`, `deptht`, `y`, `x`), together with key-value attributes
//! following the CF conventions used by ocean-model output (`units`, `long_name`, ...).
//!
//! Missing values are represented as NaN.

use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    /// Get the value as text if this is a `Text` attribute.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Number(_) => None,
        }
    }

    /// Get the value as a number if this is a `Number` attribute.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(v) => write!(f, "{}", v),
            AttrValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Insertion-ordered attributes of a field.
pub type Attributes = IndexMap<String, AttrValue>;

/// Build an [`Attributes`] map from `(key, value)` pairs.
///
/// ```rust
/// use ocdiag_core::field::{attributes, AttrValue};
///
/// let attrs = attributes([("units", AttrValue::from("m")), ("valid_min", (-1e20).into())]);
/// assert_eq!(attrs["units"].as_text(), Some("m"));
/// ```
pub fn attributes<K, I>(pairs: I) -> Attributes
where
    K: Into<String>,
    I: IntoIterator<Item = (K, AttrValue)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// An array with named dimensions and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    dims: Vec<String>,
    values: ArrayD<f64>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    attrs: Attributes,
}

impl Field {
    /// Create a new field without attributes.
    ///
    /// # Panics
    ///
    /// Panics if the number of dimension names does not match the dimensionality
    /// of `values`, or if a dimension name is repeated.
    pub fn new<S, I>(dims: I, values: ArrayD<f64>) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let field = Self {
            dims: dims.into_iter().map(Into::into).collect(),
            values,
            attrs: Attributes::new(),
        };
        if let Err(reason) = field.check_dims() {
            panic!("{}", reason);
        }
        field
    }

    /// Create a zero-dimensional field holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: vec![],
            values: ArrayD::from_elem(IxDyn(&[]), value),
            attrs: Attributes::new(),
        }
    }

    /// Replace the attributes, returning the updated field.
    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Replace all attributes of the field.
    pub fn set_attrs(&mut self, attrs: Attributes) {
        self.attrs = attrs;
    }

    /// Get a single attribute
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Axis index of a named dimension
    pub fn axis_of(&self, dim: &str) -> Option<Axis> {
        self.dims.iter().position(|d| d == dim).map(Axis)
    }

    /// Length of a named dimension
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.values.len_of(axis))
    }

    /// Check that the dimension names are consistent with the values.
    pub(crate) fn check_dims(&self) -> Result<(), String> {
        if self.dims.len() != self.values.ndim() {
            return Err(format!(
                "{} dimension names {:?} given for a {}-dimensional array",
                self.dims.len(),
                self.dims,
                self.values.ndim()
            ));
        }
        for (i, dim) in self.dims.iter().enumerate() {
            if self.dims[..i].contains(dim) {
                return Err(format!("dimension '{}' is repeated", dim));
            }
        }
        Ok(())
    }

    /// Apply `f` to every value, keeping dimensions and dropping attributes.
    pub fn map<F>(&self, f: F) -> Field
    where
        F: Fn(f64) -> f64,
    {
        Field {
            dims: self.dims.clone(),
            values: self.values.mapv(f),
            attrs: Attributes::new(),
        }
    }

    /// Combine two fields element-wise.
    ///
    /// Returns `None` if the fields do not have identical dimensions and shape.
    /// The result carries no attributes.
    pub fn zip_with<F>(&self, other: &Field, f: F) -> Option<Field>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.dims != other.dims || self.shape() != other.shape() {
            return None;
        }
        let values = Zip::from(&self.values)
            .and(&other.values)
            .map_collect(|&a, &b| f(a, b));
        Some(Field {
            dims: self.dims.clone(),
            values,
            attrs: Attributes::new(),
        })
    }

    /// Compare values and dimensions, treating NaN as equal to NaN.
    ///
    /// Attributes are not compared.
    pub fn same_values(&self, other: &Field) -> bool {
        self.dims == other.dims
            && self.shape() == other.shape()
            && Zip::from(&self.values)
                .and(&other.values)
                .all(|&a, &b| a == b || (a.is_nan() && b.is_nan()))
    }
}
