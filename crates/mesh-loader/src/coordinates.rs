//! Coordinate retrieval and normalization per topology.

use tracing::debug;

use mesh_common::{normalize_longitude, LoaderConfig, MeshError, MeshResult, Topology};

use crate::backend::MeshBackend;
use crate::topology::{Classification, CoordinateDescriptor};

/// Flattened per-point longitude and latitude in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub longitude: Vec<f64>,
    pub latitude: Vec<f64>,
}

/// Read, normalize and (for product grids) expand both coordinates.
pub fn load_coordinates<B: MeshBackend>(
    backend: &B,
    lon: &CoordinateDescriptor<B::Handle>,
    lat: &CoordinateDescriptor<B::Handle>,
    classification: &Classification,
    config: &LoaderConfig,
) -> MeshResult<Coordinates> {
    let mut lon_values = backend.read(lon)?;
    let mut lat_values = backend.read(lat)?;

    let (want_lon, want_lat) = match classification.topology {
        Topology::StructuredProduct => (
            classification.grid_extent.nx,
            classification.grid_extent.ny,
        ),
        Topology::Unstructured | Topology::Curvilinear => {
            (classification.point_count, classification.point_count)
        }
    };
    check_len(&lon.name, lon_values.len(), want_lon)?;
    check_len(&lat.name, lat_values.len(), want_lat)?;

    let in_radians = [&lon.units, &lat.units]
        .iter()
        .any(|u| u.as_deref().is_some_and(|u| config.is_radian_unit(u)));
    if in_radians {
        debug!(lon = %lon.name, lat = %lat.name, "Converting coordinates from radians");
        radians_to_degrees(&mut lon_values);
        radians_to_degrees(&mut lat_values);
    }
    wrap_longitudes(&mut lon_values);

    Ok(match classification.topology {
        Topology::StructuredProduct => expand_product(&lon_values, &lat_values),
        Topology::Unstructured | Topology::Curvilinear => Coordinates {
            longitude: lon_values,
            latitude: lat_values,
        },
    })
}

fn check_len(name: &str, got: usize, want: usize) -> MeshResult<()> {
    if got != want {
        return Err(MeshError::shape_mismatch(format!(
            "'{}' holds {} values, expected {}",
            name, got, want
        )));
    }
    Ok(())
}

pub fn radians_to_degrees(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = v.to_degrees();
    }
}

/// Reduce every longitude into (-180, 180].
pub fn wrap_longitudes(values: &mut [f64]) {
    for v in values.iter_mut() {
        *v = normalize_longitude(*v);
    }
}

/// Outer product of two axes, latitude varying slowest: output index
/// `j * nx + i` holds `(lon_axis[i], lat_axis[j])`.
pub fn expand_product(lon_axis: &[f64], lat_axis: &[f64]) -> Coordinates {
    let n = lon_axis.len() * lat_axis.len();
    let mut longitude = Vec::with_capacity(n);
    let mut latitude = Vec::with_capacity(n);
    for &lat in lat_axis {
        longitude.extend_from_slice(lon_axis);
        latitude.extend(std::iter::repeat(lat).take(lon_axis.len()));
    }
    Coordinates {
        longitude,
        latitude,
    }
}
