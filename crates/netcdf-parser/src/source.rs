//! [`StructuredSource`] over a native netCDF file.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::debug;

use mesh_common::{DimensionId, MeshError, MeshResult, StructuredSource, VariableHandle};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose diagnostics even for errors the Rust
/// side handles, such as probing an optional attribute. Call this early in
/// `main()`; it is safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open netCDF file.
pub struct NetCdfSource {
    path: PathBuf,
    file: netcdf::File,
}

impl std::fmt::Debug for NetCdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetCdfSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl NetCdfSource {
    /// Open a netCDF file read-only.
    pub fn open_path(path: impl AsRef<Path>) -> MeshResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref();
        if !path.exists() {
            return Err(MeshError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        let file = netcdf::open(path)
            .map_err(|e| MeshError::io(format!("failed to open {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "Opened netCDF file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn variable(&self, var: &VariableHandle) -> Option<netcdf::Variable<'_>> {
        self.file.variable(var.name())
    }

    fn dimension(&self, var: &VariableHandle, axis: usize) -> Option<(String, usize)> {
        let v = self.variable(var)?;
        let dim = v.dimensions().get(axis)?;
        Some((dim.name(), dim.len()))
    }

    fn attribute(&self, var: &VariableHandle, name: &str) -> Option<netcdf::AttributeValue> {
        let v = self.variable(var)?;
        if !has_attr(&v, name) {
            return None;
        }
        v.attribute_value(name)?.ok()
    }

    fn require(&self, var: &VariableHandle) -> MeshResult<netcdf::Variable<'_>> {
        self.variable(var).ok_or_else(|| {
            MeshError::not_found(format!("variable '{}' in {}", var.name(), self.path.display()))
        })
    }
}

impl StructuredSource for NetCdfSource {
    fn open(path: &Path) -> MeshResult<Self> {
        Self::open_path(path)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn find_variable(&self, names: &[String]) -> MeshResult<VariableHandle> {
        names
            .iter()
            .find(|name| self.file.variable(name).is_some())
            .map(|name| VariableHandle::new(name.as_str()))
            .ok_or_else(|| {
                MeshError::not_found(format!(
                    "none of {:?} exist in {}",
                    names,
                    self.path.display()
                ))
            })
    }

    fn dim_lengths(&self, var: &VariableHandle) -> Vec<usize> {
        self.variable(var)
            .map(|v| v.dimensions().iter().map(|d| d.len()).collect())
            .unwrap_or_default()
    }

    // Dimension names are unique within a netCDF group, so the name is the
    // identity.
    fn dim_identity(&self, var: &VariableHandle, axis: usize) -> DimensionId {
        DimensionId::new(self.dim_name(var, axis))
    }

    fn dim_name(&self, var: &VariableHandle, axis: usize) -> String {
        self.dimension(var, axis)
            .map(|(name, _)| name)
            .unwrap_or_default()
    }

    fn read_attribute_text(&self, var: &VariableHandle, name: &str) -> Option<String> {
        match self.attribute(var, name)? {
            netcdf::AttributeValue::Str(s) => Some(s),
            netcdf::AttributeValue::Strs(mut s) if !s.is_empty() => Some(s.swap_remove(0)),
            _ => None,
        }
    }

    fn read_attribute_int(&self, var: &VariableHandle, name: &str) -> Option<i64> {
        i64::try_from(self.attribute(var, name)?).ok()
    }

    fn read_values(&self, var: &VariableHandle) -> MeshResult<Vec<f64>> {
        self.require(var)?
            .get_values::<f64, _>(..)
            .map_err(|e| MeshError::io(format!("failed to read '{}': {}", var.name(), e)))
    }

    fn read_values_int(&self, var: &VariableHandle) -> MeshResult<Vec<i32>> {
        self.require(var)?
            .get_values::<i32, _>(..)
            .map_err(|e| MeshError::io(format!("failed to read '{}': {}", var.name(), e)))
    }
}

/// Check for an attribute without triggering HDF5 error spam.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}
