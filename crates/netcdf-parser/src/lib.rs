//! netCDF reader for mesh coordinate files.
//!
//! [`NetCdfSource`] answers the [`StructuredSource`] queries over a netCDF
//! file opened through the native netcdf library, so it can be handed
//! straight to `mesh_loader::load_from_structured_source`.
//!
//! ```ignore
//! use mesh_loader::load_from_structured_source;
//! use netcdf_parser::NetCdfSource;
//!
//! let data = NetCdfSource::open_path("history.0000.nc")?;
//! let mesh = load_from_structured_source(&data, Some(Path::new("x1.2562.grid.nc")))?;
//! ```
//!
//! [`StructuredSource`]: mesh_common::StructuredSource

mod source;

pub use source::{silence_hdf5_errors, NetCdfSource};
