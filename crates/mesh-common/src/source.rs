//! Query interface over a structured, self-describing array file.
//!
//! The loader never touches the file format directly; anything that can
//! answer these questions (a netCDF file, an in-memory fixture) can back a
//! mesh load.

use std::fmt;
use std::path::Path;

use crate::error::MeshResult;

/// Opaque identity of a dimension, used to detect two variables that share
/// the same underlying dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DimensionId(String);

impl DimensionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a variable resolved by [`StructuredSource::find_variable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableHandle(String);

impl VariableHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Read-only queries the loader needs from a structured source.
pub trait StructuredSource {
    /// Open a sibling file of the same format (used for grid side files).
    fn open(path: &Path) -> MeshResult<Self>
    where
        Self: Sized;

    /// Path of the underlying file, if any.
    fn location(&self) -> Option<&Path>;

    /// Resolve the first name in `names` that exists.
    ///
    /// Returns `NotFound` listing every name tried when none resolve.
    fn find_variable(&self, names: &[String]) -> MeshResult<VariableHandle>;

    /// Lengths of each dimension of the variable, slowest-varying first.
    fn dim_lengths(&self, var: &VariableHandle) -> Vec<usize>;

    /// Identity of the variable's dimension at `axis`.
    fn dim_identity(&self, var: &VariableHandle, axis: usize) -> DimensionId;

    /// Name of the variable's dimension at `axis`.
    fn dim_name(&self, var: &VariableHandle, axis: usize) -> String;

    fn read_attribute_text(&self, var: &VariableHandle, name: &str) -> Option<String>;

    fn read_attribute_int(&self, var: &VariableHandle, name: &str) -> Option<i64>;

    /// Read all values of the variable as `f64`, in native flattened order.
    fn read_values(&self, var: &VariableHandle) -> MeshResult<Vec<f64>>;

    /// Read all values of an integer variable.
    fn read_values_int(&self, var: &VariableHandle) -> MeshResult<Vec<i32>>;

    /// Number of dimensions of the variable.
    fn rank(&self, var: &VariableHandle) -> usize {
        self.dim_lengths(var).len()
    }
}
