//! Geographic mesh loading.
//!
//! Turns coordinates stored in either a structured array file or a chunked
//! array store into one canonical [`Mesh`]:
//!
//! ```text
//! load_from_structured_source / load_from_chunked_store
//!      │
//!      ├─► describe lon/lat (name lists from LoaderConfig)
//!      │
//!      ├─► classify topology (unstructured / product / curvilinear)
//!      │
//!      ├─► read values, radians → degrees, wrap to (-180, 180]
//!      │         └─► expand product grids to one point per node
//!      │
//!      ├─► project onto the unit sphere
//!      │
//!      └─► optional face/vertex table (failures only drop the table)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mesh_loader::load_from_chunked_store;
//!
//! let mesh = load_from_chunked_store("grids/mpas_x1.40962.zarr")?;
//! let nearest = mesh.nearest_point(-105.0, 40.0, 50_000.0);
//! ```

pub mod backend;
pub mod connectivity;
pub mod coordinates;
pub mod loader;
pub mod projection;
pub mod topology;

pub use backend::{ChunkedBackend, MeshBackend, RawIndexTable, StructuredBackend};
pub use coordinates::{expand_product, Coordinates};
pub use loader::{
    load_from_chunk_source, load_from_chunked_store, load_from_chunked_store_with_config,
    load_from_structured_source, load_from_structured_source_with_config,
};
pub use topology::{classify, Classification, CoordinateDescriptor};

pub use mesh_common::{
    chord_length, normalize_longitude, project, Backend, Connectivity, GridExtent, LoaderConfig,
    Mesh, MeshError, MeshResult, SourceDescriptor, Topology,
};
