//! Shared types for geographic mesh loading.
//!
//! This crate holds the [`Mesh`] snapshot every loader produces, the error
//! taxonomy, the loader configuration and the query trait a structured
//! array file must implement to back a load.

pub mod config;
pub mod error;
pub mod mesh;
pub mod source;
pub mod sphere;

pub use config::LoaderConfig;
pub use error::{MeshError, MeshResult};
pub use mesh::{Backend, Connectivity, GridExtent, Mesh, SourceDescriptor, Topology};
pub use source::{DimensionId, StructuredSource, VariableHandle};
pub use sphere::{chord_length, normalize_longitude, project, EARTH_RADIUS_M};
