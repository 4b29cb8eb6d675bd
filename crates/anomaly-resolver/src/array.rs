//! Labeled N-dimensional arrays as delivered by providers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{ResolverError, Result};

/// Coordinate values along one dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinate {
    /// Observation timestamps.
    Time(Vec<DateTime<Utc>>),
    /// Degrees (latitude, longitude) or level values.
    Values(Vec<f64>),
}

impl Coordinate {
    pub fn len(&self) -> usize {
        match self {
            Coordinate::Time(t) => t.len(),
            Coordinate::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, indices: &[usize]) -> Coordinate {
        match self {
            Coordinate::Time(t) => Coordinate::Time(indices.iter().map(|&i| t[i]).collect()),
            Coordinate::Values(v) => Coordinate::Values(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// A named dimension with its coordinate values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub coordinate: Coordinate,
}

impl Dimension {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinate,
        }
    }

    pub fn len(&self) -> usize {
        self.coordinate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinate.is_empty()
    }
}

/// Row-major array of `f32` values indexed by named dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    dims: Vec<Dimension>,
    values: Vec<f32>,
    fill_value: Option<f32>,
}

impl LabeledArray {
    /// Create an array; the value count must equal the product of the dimension lengths.
    pub fn new(dims: Vec<Dimension>, values: Vec<f32>, fill_value: Option<f32>) -> Result<Self> {
        let expected: usize = dims.iter().map(Dimension::len).product();
        if values.len() != expected {
            let shape: Vec<String> = dims
                .iter()
                .map(|d| format!("{}={}", d.name, d.len()))
                .collect();
            return Err(ResolverError::malformed(format!(
                "array of shape [{}] needs {} values, got {}",
                shape.join(", "),
                expected,
                values.len()
            )));
        }

        Ok(Self {
            dims,
            values,
            fill_value,
        })
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn fill_value(&self) -> Option<f32> {
        self.fill_value
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::len).collect()
    }

    /// Position of a dimension by exact name.
    pub fn axis_of(&self, name: &str) -> Option<usize> {
        self.dims.iter().position(|d| d.name == name)
    }

    /// Keep only `indices` (in that order) along `axis`.
    pub fn take(&self, axis: usize, indices: &[usize]) -> LabeledArray {
        let len = self.dims[axis].len();
        let outer: usize = self.dims[..axis].iter().map(Dimension::len).product();
        let inner: usize = self.dims[axis + 1..].iter().map(Dimension::len).product();

        let mut values = Vec::with_capacity(outer * indices.len() * inner);
        for o in 0..outer {
            for &i in indices {
                let start = (o * len + i) * inner;
                values.extend_from_slice(&self.values[start..start + inner]);
            }
        }

        let mut dims = self.dims.clone();
        dims[axis].coordinate = self.dims[axis].coordinate.take(indices);

        LabeledArray {
            dims,
            values,
            fill_value: self.fill_value,
        }
    }

    /// Select a single index along `axis`, dropping that dimension.
    pub fn select(&self, axis: usize, index: usize) -> LabeledArray {
        let mut selected = self.take(axis, &[index]);
        selected.dims.remove(axis);
        selected
    }

    /// Value at a full multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Option<f32> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0;
        for (i, dim) in index.iter().zip(&self.dims) {
            if *i >= dim.len() {
                return None;
            }
            flat = flat * dim.len() + i;
        }
        self.values.get(flat).copied()
    }
}

/// A set of named variables fetched from a provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: BTreeMap<String, LabeledArray>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_variable(mut self, name: impl Into<String>, array: LabeledArray) -> Self {
        self.insert(name, array);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, array: LabeledArray) {
        self.variables.insert(name.into(), array);
    }

    /// Look up a variable, falling back to a case-insensitive match.
    pub fn variable(&self, name: &str) -> Option<&LabeledArray> {
        self.variables.get(name).or_else(|| {
            self.variables
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
