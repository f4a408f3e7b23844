//! The in-memory mesh snapshot produced by a load call.

use std::f64::consts::PI;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::sphere::{chord_length_with_radius, distance_squared, project, EARTH_RADIUS_M};

/// Grid topology inferred from the coordinate variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// Point cloud; adjacency comes only from a connectivity table.
    Unstructured,
    /// Outer product of two independent 1D axes.
    StructuredProduct,
    /// Logically rectangular grid with full 2D coordinate arrays.
    Curvilinear,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topology::Unstructured => "unstructured",
            Topology::StructuredProduct => "structured-product",
            Topology::Curvilinear => "curvilinear",
        };
        f.write_str(name)
    }
}

/// Grid extent (nx, ny). Both zero for unstructured meshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridExtent {
    pub nx: usize,
    pub ny: usize,
}

impl GridExtent {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    pub fn point_count(&self) -> usize {
        self.nx * self.ny
    }
}

/// Face to vertex index table, zero-based, ordered (element, vertex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connectivity {
    pub element_count: usize,
    pub vertices_per_element: usize,
    pub indices: Vec<u32>,
}

impl Connectivity {
    /// Vertex indices of element `e`.
    pub fn element(&self, e: usize) -> &[u32] {
        let start = e * self.vertices_per_element;
        &self.indices[start..start + self.vertices_per_element]
    }
}

/// Which backend produced the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    Structured,
    ChunkedStore,
}

/// Where a mesh came from. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub backend: Backend,
    /// Primary location (file or store directory) when known.
    pub location: Option<PathBuf>,
    /// Side file the coordinates were read from, if any.
    pub side_file: Option<PathBuf>,
}

/// Geographic mesh with coordinates in degrees and their unit-sphere
/// embedding.
///
/// Every per-point array has exactly `point_count()` entries. Longitudes lie
/// in (-180, 180].
#[derive(Debug, Clone)]
pub struct Mesh {
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    cartesian: Vec<[f64; 3]>,
    topology: Topology,
    grid_extent: GridExtent,
    connectivity: Option<Connectivity>,
    source: SourceDescriptor,
    reference_radius_m: f64,
}

impl Mesh {
    /// Assemble a mesh, checking that the per-point arrays agree.
    pub fn new(
        longitude: Vec<f64>,
        latitude: Vec<f64>,
        cartesian: Vec<[f64; 3]>,
        topology: Topology,
        grid_extent: GridExtent,
        source: SourceDescriptor,
    ) -> MeshResult<Self> {
        let n = longitude.len();
        if latitude.len() != n || cartesian.len() != n {
            return Err(MeshError::shape_mismatch(format!(
                "per-point arrays disagree: {} longitudes, {} latitudes, {} cartesian",
                n,
                latitude.len(),
                cartesian.len()
            )));
        }
        let extent_ok = match topology {
            Topology::Unstructured => grid_extent == GridExtent::default(),
            _ => grid_extent.point_count() == n,
        };
        if !extent_ok {
            return Err(MeshError::shape_mismatch(format!(
                "{} mesh with {} points has extent {}x{}",
                topology, n, grid_extent.nx, grid_extent.ny
            )));
        }
        Ok(Self {
            longitude,
            latitude,
            cartesian,
            topology,
            grid_extent,
            connectivity: None,
            source,
            reference_radius_m: EARTH_RADIUS_M,
        })
    }

    /// Sphere radius used to turn distances in meters into chord lengths.
    pub fn with_reference_radius(mut self, reference_radius_m: f64) -> Self {
        self.reference_radius_m = reference_radius_m;
        self
    }

    pub fn reference_radius(&self) -> f64 {
        self.reference_radius_m
    }

    /// Attach a connectivity table.
    pub fn with_connectivity(mut self, connectivity: Option<Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn point_count(&self) -> usize {
        self.longitude.len()
    }

    pub fn longitude(&self) -> &[f64] {
        &self.longitude
    }

    pub fn latitude(&self) -> &[f64] {
        &self.latitude
    }

    pub fn cartesian(&self) -> &[[f64; 3]] {
        &self.cartesian
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn grid_extent(&self) -> GridExtent {
        self.grid_extent
    }

    pub fn connectivity(&self) -> Option<&Connectivity> {
        self.connectivity.as_ref()
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    /// (min_lon, min_lat, max_lon, max_lat), or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.longitude.is_empty() {
            return None;
        }
        let fold = |values: &[f64]| {
            values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        let (min_lon, max_lon) = fold(&self.longitude);
        let (min_lat, max_lat) = fold(&self.latitude);
        Some((min_lon, min_lat, max_lon, max_lat))
    }

    /// Index of the point nearest to (lon, lat) within `max_distance_m`
    /// of great-circle distance on the mesh's reference sphere.
    pub fn nearest_point(&self, lon: f64, lat: f64, max_distance_m: f64) -> Option<usize> {
        self.nearest_point_with_radius(lon, lat, max_distance_m, self.reference_radius_m)
    }

    /// Same as [`Mesh::nearest_point`] on a sphere of the given radius.
    pub fn nearest_point_with_radius(
        &self,
        lon: f64,
        lat: f64,
        max_distance_m: f64,
        reference_radius: f64,
    ) -> Option<usize> {
        let target = project(lon, lat);
        // Chord length peaks at half a circumference
        let arc = max_distance_m.min(PI * reference_radius);
        let limit = chord_length_with_radius(arc, reference_radius);
        let limit_sq = limit * limit;

        self.cartesian
            .iter()
            .enumerate()
            .map(|(i, p)| (i, distance_squared(p, &target)))
            .filter(|&(_, d)| d <= limit_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Check the mesh invariants.
    pub fn validate(&self) -> MeshResult<()> {
        for (i, &lon) in self.longitude.iter().enumerate() {
            if !(lon > -180.0 && lon <= 180.0) {
                return Err(MeshError::shape_mismatch(format!(
                    "longitude {} at point {} is outside (-180, 180]",
                    lon, i
                )));
            }
        }

        for (i, p) in self.cartesian.iter().enumerate() {
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            if (norm - 1.0).abs() > 1e-9 {
                return Err(MeshError::shape_mismatch(format!(
                    "point {} has norm {}",
                    i, norm
                )));
            }
        }

        if let Some(conn) = &self.connectivity {
            if conn.indices.len() != conn.element_count * conn.vertices_per_element {
                return Err(MeshError::shape_mismatch(format!(
                    "connectivity has {} indices for {} x {} elements",
                    conn.indices.len(),
                    conn.element_count,
                    conn.vertices_per_element
                )));
            }
            let n = self.point_count();
            if let Some(bad) = conn.indices.iter().find(|&&i| i as usize >= n) {
                return Err(MeshError::shape_mismatch(format!(
                    "connectivity index {} out of range for {} points",
                    bad, n
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> SourceDescriptor {
        SourceDescriptor {
            backend: Backend::ChunkedStore,
            location: None,
            side_file: None,
        }
    }

    fn mesh(lon: Vec<f64>, lat: Vec<f64>) -> Mesh {
        let cart = lon.iter().zip(&lat).map(|(&x, &y)| project(x, y)).collect();
        Mesh::new(
            lon,
            lat,
            cart,
            Topology::Unstructured,
            GridExtent::default(),
            descriptor(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = Mesh::new(
            vec![0.0, 1.0],
            vec![0.0],
            vec![[1.0, 0.0, 0.0]],
            Topology::Unstructured,
            GridExtent::default(),
            descriptor(),
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::ShapeMismatch(_)));
    }

    #[test]
    fn test_new_rejects_wrong_extent() {
        let err = Mesh::new(
            vec![0.0; 4],
            vec![0.0; 4],
            vec![[1.0, 0.0, 0.0]; 4],
            Topology::Curvilinear,
            GridExtent::new(3, 2),
            descriptor(),
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::ShapeMismatch(_)));
    }

    #[test]
    fn test_bounds() {
        let m = mesh(vec![-10.0, 20.0, 5.0], vec![3.0, -4.0, 1.0]);
        assert_eq!(m.bounds(), Some((-10.0, -4.0, 20.0, 3.0)));
    }

    #[test]
    fn test_nearest_point() {
        let m = mesh(vec![0.0, 10.0, 179.9], vec![0.0, 0.0, 0.0]);
        assert_eq!(m.nearest_point(9.0, 0.5, 500_000.0), Some(1));
        // Across the antimeridian
        assert_eq!(m.nearest_point(-179.9, 0.0, 100_000.0), Some(2));
        // Nothing within 1 km of the pole
        assert_eq!(m.nearest_point(0.0, 90.0, 1_000.0), None);
    }

    #[test]
    fn test_nearest_point_beyond_half_circumference() {
        let m = mesh(vec![120.0], vec![0.0]);
        assert_eq!(m.nearest_point(0.0, 0.0, 20_000_000.0), Some(0));
        assert_eq!(m.nearest_point(0.0, 0.0, 35_000_000.0), Some(0));
        assert_eq!(m.nearest_point(0.0, 0.0, f64::INFINITY), Some(0));
    }

    #[test]
    fn test_reference_radius_changes_cutoff() {
        let m = mesh(vec![1.0], vec![0.0]);
        assert_eq!(m.reference_radius(), EARTH_RADIUS_M);
        // One degree is ~111 km on the Earth but ~17 km on a 1000 km sphere
        assert_eq!(m.nearest_point(0.0, 0.0, 50_000.0), None);

        let small = m.with_reference_radius(1_000_000.0);
        assert_eq!(small.nearest_point(0.0, 0.0, 50_000.0), Some(0));
    }

    #[test]
    fn test_validate_connectivity_range() {
        let m = mesh(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]).with_connectivity(Some(
            Connectivity {
                element_count: 1,
                vertices_per_element: 3,
                indices: vec![0, 1, 3],
            },
        ));
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_connectivity_element() {
        let conn = Connectivity {
            element_count: 2,
            vertices_per_element: 3,
            indices: vec![0, 1, 2, 2, 1, 3],
        };
        assert_eq!(conn.element(1), &[2, 1, 3]);
    }
}
