//! In-memory [`StructuredSource`] for loader tests.
//!
//! A `MemorySource` can be saved as JSON and reopened through
//! [`StructuredSource::open`], which is how side-file loads are exercised
//! without a netCDF library.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mesh_common::{
    DimensionId, MeshError, MeshResult, StructuredSource, VariableHandle,
};

/// One variable: its dimensions, data and attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryVariable {
    /// (name, length), slowest-varying first.
    pub dims: Vec<(String, usize)>,
    pub values: Vec<f64>,
    pub text_attributes: HashMap<String, String>,
    pub int_attributes: HashMap<String, i64>,
    /// Make every read fail with an I/O error.
    pub fail_reads: bool,
}

impl MemoryVariable {
    pub fn new(dims: &[(&str, usize)], values: Vec<f64>) -> Self {
        Self {
            dims: dims.iter().map(|(n, l)| (n.to_string(), *l)).collect(),
            values,
            ..Default::default()
        }
    }

    pub fn ints(dims: &[(&str, usize)], values: &[i32]) -> Self {
        Self::new(dims, values.iter().map(|&v| v as f64).collect())
    }

    pub fn units(mut self, units: &str) -> Self {
        self.text_attributes
            .insert("units".to_string(), units.to_string());
        self
    }

    pub fn int_attribute(mut self, name: &str, value: i64) -> Self {
        self.int_attributes.insert(name.to_string(), value);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

/// Structured source held entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySource {
    #[serde(skip)]
    path: Option<PathBuf>,
    variables: HashMap<String, MemoryVariable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: &str, var: MemoryVariable) -> Self {
        self.variables.insert(name.to_string(), var);
        self
    }

    /// Write the source as JSON so it can be reopened as a side file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)
    }

    fn var(&self, handle: &VariableHandle) -> Option<&MemoryVariable> {
        self.variables.get(handle.name())
    }
}

impl StructuredSource for MemorySource {
    fn open(path: &Path) -> MeshResult<Self> {
        let bytes = std::fs::read(path)?;
        let mut source: MemorySource = serde_json::from_slice(&bytes)?;
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn find_variable(&self, names: &[String]) -> MeshResult<VariableHandle> {
        names
            .iter()
            .find(|n| self.variables.contains_key(n.as_str()))
            .map(|n| VariableHandle::new(n.as_str()))
            .ok_or_else(|| MeshError::not_found(format!("none of {:?} exist", names)))
    }

    fn dim_lengths(&self, var: &VariableHandle) -> Vec<usize> {
        self.var(var)
            .map(|v| v.dims.iter().map(|(_, l)| *l).collect())
            .unwrap_or_default()
    }

    fn dim_identity(&self, var: &VariableHandle, axis: usize) -> DimensionId {
        DimensionId::new(self.dim_name(var, axis))
    }

    fn dim_name(&self, var: &VariableHandle, axis: usize) -> String {
        self.var(var)
            .and_then(|v| v.dims.get(axis))
            .map(|(n, _)| n.clone())
            .unwrap_or_default()
    }

    fn read_attribute_text(&self, var: &VariableHandle, name: &str) -> Option<String> {
        self.var(var)?.text_attributes.get(name).cloned()
    }

    fn read_attribute_int(&self, var: &VariableHandle, name: &str) -> Option<i64> {
        self.var(var)?.int_attributes.get(name).copied()
    }

    fn read_values(&self, var: &VariableHandle) -> MeshResult<Vec<f64>> {
        let v = self
            .var(var)
            .ok_or_else(|| MeshError::not_found(var.name().to_string()))?;
        if v.fail_reads {
            return Err(MeshError::io(format!("read of {} failed", var.name())));
        }
        Ok(v.values.clone())
    }

    fn read_values_int(&self, var: &VariableHandle) -> MeshResult<Vec<i32>> {
        Ok(self
            .read_values(var)?
            .into_iter()
            .map(|v| v as i32)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_variable_in_order() {
        let src = MemorySource::new()
            .with_variable("lat", MemoryVariable::new(&[("n", 1)], vec![0.0]))
            .with_variable("latitude", MemoryVariable::new(&[("n", 1)], vec![0.0]));
        let names = vec!["latitude".to_string(), "lat".to_string()];
        assert_eq!(src.find_variable(&names).unwrap().name(), "latitude");
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.json");
        MemorySource::new()
            .with_variable("lon", MemoryVariable::new(&[("nCells", 2)], vec![1.0, 2.0]))
            .save(&path)
            .unwrap();

        let src = MemorySource::open(&path).unwrap();
        assert_eq!(src.location(), Some(path.as_path()));
        let h = src.find_variable(&["lon".to_string()]).unwrap();
        assert_eq!(src.rank(&h), 1);
        assert_eq!(src.read_values(&h).unwrap(), vec![1.0, 2.0]);
    }
}
