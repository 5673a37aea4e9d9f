//! A mutable collection of named fields sharing dimensions.
//!
//! The dataset mirrors the content of a model output file: coordinate fields
//! (such as the depth-level centres `deptht`), data variables (tracers, rates and
//! derived diagnostics) and global attributes. Field names are unique across
//! coordinates and data variables; inserting a field under an existing name
//! replaces it.

use crate::errors::{DiagError, DiagResult};
use crate::field::{Attributes, Field};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Depth coordinate name used by NEMO T-grid output.
pub const DEFAULT_VERTICAL_AXIS: &str = "deptht";

/// Attribute on a coordinate naming the field that holds its cell bounds.
pub const BOUNDS_ATTRIBUTE: &str = "bounds";

fn default_vertical_axis() -> String {
    DEFAULT_VERTICAL_AXIS.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Name of the coordinate describing the vertical (depth) axis.
    #[serde(default = "default_vertical_axis")]
    vertical_axis: String,
    #[serde(default)]
    coords: IndexMap<String, Field>,
    #[serde(default)]
    data_vars: IndexMap<String, Field>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    attrs: Attributes,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self {
            vertical_axis: default_vertical_axis(),
            coords: IndexMap::new(),
            data_vars: IndexMap::new(),
            attrs: Attributes::new(),
        }
    }

    /// Declare which coordinate describes the vertical axis.
    pub fn with_vertical_axis(mut self, name: impl Into<String>) -> Self {
        self.vertical_axis = name.into();
        self
    }

    pub fn set_vertical_axis(&mut self, name: impl Into<String>) {
        self.vertical_axis = name.into();
    }

    pub fn vertical_axis(&self) -> &str {
        &self.vertical_axis
    }

    /// Global (dataset-level) attributes
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    /// Test if a coordinate or data variable with the given name exists
    pub fn contains(&self, name: &str) -> bool {
        self.coords.contains_key(name) || self.data_vars.contains_key(name)
    }

    /// Get a coordinate or data variable by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.data_vars.get(name).or_else(|| self.coords.get(name))
    }

    /// Get a coordinate or data variable, failing if it is absent.
    pub fn field(&self, name: &str) -> DiagResult<&Field> {
        self.get(name).ok_or_else(|| DiagError::FieldNotFound {
            name: name.to_string(),
        })
    }

    /// Insert a data variable, replacing any existing field with the same name.
    ///
    /// Returns the replaced field, if any.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) -> Option<Field> {
        let name = name.into();
        let previous_coord = self.coords.shift_remove(&name);
        self.data_vars.insert(name, field).or(previous_coord)
    }

    /// Insert a coordinate, replacing any existing field with the same name.
    pub fn insert_coord(&mut self, name: impl Into<String>, field: Field) -> Option<Field> {
        let name = name.into();
        let previous_var = self.data_vars.shift_remove(&name);
        self.coords.insert(name, field).or(previous_var)
    }

    /// Replace all attributes of an existing field.
    pub fn set_attrs(&mut self, name: &str, attrs: Attributes) -> DiagResult<()> {
        let field = self
            .data_vars
            .get_mut(name)
            .or_else(|| self.coords.get_mut(name))
            .ok_or_else(|| DiagError::FieldNotFound {
                name: name.to_string(),
            })?;
        field.set_attrs(attrs);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.data_vars
            .shift_remove(name)
            .or_else(|| self.coords.shift_remove(name))
    }

    /// Names of all fields, coordinates first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().chain(self.data_vars.keys()).map(|k| k.as_str())
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(|k| k.as_str())
    }

    pub fn data_names(&self) -> impl Iterator<Item = &str> {
        self.data_vars.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.coords.len() + self.data_vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the field holding the cell bounds of `coord`, as declared by its
    /// `bounds` attribute.
    pub fn bounds_of(&self, coord: &str) -> Option<&str> {
        self.get(coord)?.attr(BOUNDS_ATTRIBUTE)?.as_text()
    }

    /// Element-wise sum of the named fields.
    ///
    /// All fields must share the same dimensions and shape.
    pub fn sum_of(&self, names: &[&str]) -> DiagResult<Field> {
        let (first, rest) = names.split_first().ok_or_else(|| DiagError::MalformedField {
            name: String::new(),
            reason: "cannot sum an empty list of fields".to_string(),
        })?;
        let mut total = self.field(first)?.map(|v| v);
        for name in rest {
            let next = self.field(name)?;
            total = total
                .zip_with(next, |a, b| a + b)
                .ok_or_else(|| DiagError::DimensionMismatch {
                    left: first.to_string(),
                    right: name.to_string(),
                    left_dims: total.dims().to_vec(),
                    right_dims: next.dims().to_vec(),
                })?;
        }
        Ok(total)
    }

    /// Check that every field has consistent dimension names.
    ///
    /// Datasets built through [`Field::new`] are always valid; this is intended
    /// for datasets deserialised from storage.
    pub fn validate(&self) -> DiagResult<()> {
        for (name, field) in self.coords.iter().chain(self.data_vars.iter()) {
            field
                .check_dims()
                .map_err(|reason| DiagError::MalformedField {
                    name: name.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    /// Merge another dataset into this one.
    ///
    /// Fields only present in `other` are added. Fields present in both must hold
    /// the same values (NaN compares equal to NaN); the existing field, including its
    /// attributes, is kept. Global attributes missing from `self` are copied over.
    ///
    /// On conflict nothing is merged.
    pub fn merge(&mut self, other: Dataset) -> DiagResult<()> {
        for (name, field) in other.coords.iter().chain(other.data_vars.iter()) {
            if let Some(existing) = self.get(name) {
                if !existing.same_values(field) {
                    return Err(DiagError::MergeConflict { name: name.clone() });
                }
            }
        }

        for (name, field) in other.coords {
            if !self.contains(&name) {
                self.coords.insert(name, field);
            }
        }
        for (name, field) in other.data_vars {
            if !self.contains(&name) {
                self.data_vars.insert(name, field);
            }
        }
        for (key, value) in other.attrs {
            self.attrs.entry(key).or_insert(value);
        }
        Ok(())
    }

    /// Extract the named data variables together with the coordinates they use.
    ///
    /// A coordinate is included when its name is one of the dimensions of a selected
    /// field; the field referenced by its `bounds` attribute is included too.
    pub fn subset(&self, names: &[&str]) -> DiagResult<Dataset> {
        let mut selected: IndexSet<&str> = IndexSet::new();
        for name in names {
            let field = self.field(name)?;
            for dim in field.dims() {
                if self.coords.contains_key(dim.as_str()) {
                    selected.insert(dim.as_str());
                    if let Some(bounds) = self.bounds_of(dim) {
                        if self.contains(bounds) {
                            selected.insert(bounds);
                        }
                    }
                }
            }
            selected.insert(*name);
        }

        let mut out = Dataset::new().with_vertical_axis(self.vertical_axis.clone());
        out.attrs = self.attrs.clone();
        for (name, field) in &self.coords {
            if selected.contains(name.as_str()) {
                out.coords.insert(name.clone(), field.clone());
            }
        }
        for (name, field) in &self.data_vars {
            if selected.contains(name.as_str()) {
                out.data_vars.insert(name.clone(), field.clone());
            }
        }
        Ok(out)
    }
}
