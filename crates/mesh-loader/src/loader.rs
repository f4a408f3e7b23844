//! The two load entry points and the pipeline they share.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use mesh_common::{
    Backend, Connectivity, LoaderConfig, Mesh, MeshError, MeshResult, SourceDescriptor,
    StructuredSource,
};
use zarr_reader::{ChunkSource, ChunkedArrayReader, FilesystemChunkSource};

use crate::backend::{ChunkedBackend, MeshBackend, StructuredBackend};
use crate::connectivity;
use crate::coordinates::load_coordinates;
use crate::projection::project_points;
use crate::topology::classify;

/// Load a mesh from a structured array file.
///
/// When `side_file` is given the coordinates are read from that file
/// (opened with [`StructuredSource::open`]) instead of `source`.
pub fn load_from_structured_source<S: StructuredSource>(
    source: &S,
    side_file: Option<&Path>,
) -> MeshResult<Mesh> {
    load_from_structured_source_with_config(source, side_file, &LoaderConfig::default())
}

pub fn load_from_structured_source_with_config<S: StructuredSource>(
    source: &S,
    side_file: Option<&Path>,
    config: &LoaderConfig,
) -> MeshResult<Mesh> {
    let side = side_file.map(S::open).transpose()?;
    let descriptor = SourceDescriptor {
        backend: Backend::Structured,
        location: source.location().map(Path::to_path_buf),
        side_file: side_file.map(Path::to_path_buf),
    };

    let primary = StructuredBackend::new(source);
    match &side {
        Some(side) => {
            let side = StructuredBackend::new(side);
            assemble(&side, &[&side, &primary], descriptor, config)
        }
        None => assemble(&primary, &[&primary], descriptor, config),
    }
}

/// Load a mesh from a chunked store directory.
pub fn load_from_chunked_store(location: impl AsRef<Path>) -> MeshResult<Mesh> {
    load_from_chunked_store_with_config(location, &LoaderConfig::default())
}

pub fn load_from_chunked_store_with_config(
    location: impl AsRef<Path>,
    config: &LoaderConfig,
) -> MeshResult<Mesh> {
    let source = FilesystemChunkSource::open(location)?;
    load_from_chunk_source(source, config)
}

/// Load a mesh from any [`ChunkSource`].
pub fn load_from_chunk_source<C: ChunkSource>(source: C, config: &LoaderConfig) -> MeshResult<Mesh> {
    let descriptor = SourceDescriptor {
        backend: Backend::ChunkedStore,
        location: Some(PathBuf::from(source.base_location())),
        side_file: None,
    };
    let reader = ChunkedArrayReader::new(source).with_parallel(config.parallel);
    let backend = ChunkedBackend::new(&reader);
    assemble(&backend, &[&backend], descriptor, config)
}

/// Classify, read and project the coordinates from `coords`, then try each
/// of `tables` in order for a connectivity table.
fn assemble<B: MeshBackend>(
    coords: &B,
    tables: &[&dyn IndexTableSource],
    descriptor: SourceDescriptor,
    config: &LoaderConfig,
) -> MeshResult<Mesh> {
    let lon = coords.describe(&config.longitude_names)?;
    let lat = coords.describe(&config.latitude_names)?;
    let classification = classify(&lon, &lat, config)?;

    let coordinates = load_coordinates(coords, &lon, &lat, &classification, config)?;
    let cartesian = project_points(
        &coordinates.longitude,
        &coordinates.latitude,
        config.parallel,
    );

    let connectivity = load_connectivity(tables, classification.point_count, config);

    info!(
        points = classification.point_count,
        topology = %classification.topology,
        lon = %lon.name,
        lat = %lat.name,
        elements = connectivity.as_ref().map(|c| c.element_count).unwrap_or(0),
        "Loaded mesh"
    );

    Ok(Mesh::new(
        coordinates.longitude,
        coordinates.latitude,
        cartesian,
        classification.topology,
        classification.grid_extent,
        descriptor,
    )?
    .with_connectivity(connectivity)
    .with_reference_radius(config.reference_radius_m))
}

/// Object-safe view of a backend's index-table lookup.
trait IndexTableSource {
    fn connectivity(&self, names: &[String], point_count: usize) -> MeshResult<Connectivity>;
}

impl<B: MeshBackend> IndexTableSource for B {
    fn connectivity(&self, names: &[String], point_count: usize) -> MeshResult<Connectivity> {
        let table = self.index_table(names)?;
        connectivity::normalize(table, point_count)
    }
}

/// Connectivity is optional: every failure is logged and downgraded to
/// "absent".
fn load_connectivity(
    tables: &[&dyn IndexTableSource],
    point_count: usize,
    config: &LoaderConfig,
) -> Option<Connectivity> {
    if config.connectivity_names.is_empty() {
        return None;
    }
    for source in tables {
        match source.connectivity(&config.connectivity_names, point_count) {
            Ok(conn) => return Some(conn),
            Err(MeshError::NotFound(msg)) => {
                debug!(reason = %msg, "No connectivity table");
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unusable connectivity table");
                return None;
            }
        }
    }
    None
}
