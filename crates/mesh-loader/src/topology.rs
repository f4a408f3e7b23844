//! Grid topology classification from a pair of coordinate descriptors.
//!
//! The same rank/shape combination can mean either a point cloud or two
//! independent axes, so the decision also looks at dimension names and
//! dimension identity. Rules, first match wins:
//!
//! 1. both 1D, equal length, and a node-like dimension name or a shared
//!    dimension: unstructured
//! 2. both 1D otherwise: structured product of the two axes
//! 3. both 2D with identical extents: curvilinear
//! 4. anything else: `ShapeMismatch`

use tracing::debug;

use mesh_common::{DimensionId, GridExtent, LoaderConfig, MeshError, MeshResult, Topology};

/// What the loader knows about one coordinate variable before reading it.
#[derive(Debug, Clone)]
pub struct CoordinateDescriptor<H> {
    /// Backend handle used to read the values.
    pub handle: H,
    /// Resolved variable name.
    pub name: String,
    /// Per-axis extents, slowest-varying first.
    pub extents: Vec<usize>,
    pub dim_ids: Vec<DimensionId>,
    pub dim_names: Vec<String>,
    /// Declared `units` attribute.
    pub units: Option<String>,
}

impl<H> CoordinateDescriptor<H> {
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    pub fn element_count(&self) -> usize {
        self.extents.iter().product()
    }

    fn has_node_dimension(&self, config: &LoaderConfig) -> bool {
        self.dim_names
            .first()
            .map(|name| config.is_node_dimension(name))
            .unwrap_or(false)
    }

    fn describe(&self) -> String {
        format!("{}{:?} dims {:?}", self.name, self.extents, self.dim_names)
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub topology: Topology,
    pub grid_extent: GridExtent,
    pub point_count: usize,
}

/// Decide the grid topology of a longitude/latitude pair.
pub fn classify<H>(
    lon: &CoordinateDescriptor<H>,
    lat: &CoordinateDescriptor<H>,
    config: &LoaderConfig,
) -> MeshResult<Classification> {
    let classification = match (lon.rank(), lat.rank()) {
        (1, 1) => {
            let (nx, ny) = (lon.extents[0], lat.extents[0]);
            let node_named = lon.has_node_dimension(config) || lat.has_node_dimension(config);
            let shared = lon.dim_ids.first() == lat.dim_ids.first();

            if nx == ny && (node_named || shared) {
                Classification {
                    topology: Topology::Unstructured,
                    grid_extent: GridExtent::default(),
                    point_count: nx,
                }
            } else {
                Classification {
                    topology: Topology::StructuredProduct,
                    grid_extent: GridExtent::new(nx, ny),
                    point_count: nx * ny,
                }
            }
        }
        (2, 2) if lon.extents == lat.extents => Classification {
            topology: Topology::Curvilinear,
            grid_extent: GridExtent::new(lon.extents[1], lon.extents[0]),
            point_count: lon.extents[0] * lon.extents[1],
        },
        _ => {
            return Err(MeshError::shape_mismatch(format!(
                "cannot pair longitude {} with latitude {}",
                lon.describe(),
                lat.describe()
            )))
        }
    };

    debug!(
        lon = %lon.describe(),
        lat = %lat.describe(),
        topology = %classification.topology,
        points = classification.point_count,
        "Classified coordinates"
    );

    Ok(classification)
}
