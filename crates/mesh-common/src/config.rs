//! Configuration for mesh loading.

use serde::{Deserialize, Serialize};

use crate::sphere::EARTH_RADIUS_M;

/// Configuration for mesh loading.
///
/// The name lists are tried in order; the dimension hints are matched
/// case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Candidate names for the longitude coordinate.
    pub longitude_names: Vec<String>,

    /// Candidate names for the latitude coordinate.
    pub latitude_names: Vec<String>,

    /// Candidate names for the face/vertex index table.
    pub connectivity_names: Vec<String>,

    /// Dimension names that mark a coordinate as living on mesh nodes.
    pub node_dimension_hints: Vec<String>,

    /// Unit strings that mean the coordinate is stored in radians.
    pub radian_unit_names: Vec<String>,

    /// Radius of the reference sphere in meters.
    pub reference_radius_m: f64,

    /// Decode chunks and project points on the rayon pool.
    pub parallel: bool,
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            longitude_names: strings(&[
                "lon",
                "longitude",
                "lonCell",
                "lon_rho",
                "nav_lon",
                "clon",
                "grid_center_lon",
                "mesh2d_node_x",
                "Mesh2_node_x",
                "x",
            ]),
            latitude_names: strings(&[
                "lat",
                "latitude",
                "latCell",
                "lat_rho",
                "nav_lat",
                "clat",
                "grid_center_lat",
                "mesh2d_node_y",
                "Mesh2_node_y",
                "y",
            ]),
            connectivity_names: strings(&[
                "face_node_connectivity",
                "mesh2d_face_nodes",
                "Mesh2_face_nodes",
                "element_node_connectivity",
                "triangles",
                "elem",
            ]),
            node_dimension_hints: strings(&[
                "node",
                "nodes",
                "cell",
                "cells",
                "vertex",
                "vertices",
                "elem",
                "ncells",
                "nvertices",
                "ncol",
                "nod2",
                "nmesh2_node",
                "nmesh2d_node",
                "grid_size",
                "npoints",
            ]),
            radian_unit_names: strings(&["rad", "radian", "radians"]),
            reference_radius_m: EARTH_RADIUS_M,
            parallel: true,
        }
    }
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl LoaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MESH_LON_NAMES") {
            config.longitude_names = split_list(&val);
        }

        if let Ok(val) = std::env::var("MESH_LAT_NAMES") {
            config.latitude_names = split_list(&val);
        }

        if let Ok(val) = std::env::var("MESH_CONNECTIVITY_NAMES") {
            config.connectivity_names = split_list(&val);
        }

        if let Ok(val) = std::env::var("MESH_NODE_DIM_HINTS") {
            config.node_dimension_hints = split_list(&val);
        }

        if let Ok(val) = std::env::var("MESH_REFERENCE_RADIUS_M") {
            if let Ok(radius) = val.parse() {
                config.reference_radius_m = radius;
            }
        }

        if let Ok(val) = std::env::var("MESH_PARALLEL") {
            config.parallel = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.longitude_names.is_empty() {
            return Err("longitude_names must not be empty".to_string());
        }

        if self.latitude_names.is_empty() {
            return Err("latitude_names must not be empty".to_string());
        }

        if !(self.reference_radius_m.is_finite() && self.reference_radius_m > 0.0) {
            return Err("reference_radius_m must be a positive number".to_string());
        }

        Ok(())
    }

    /// Whether a dimension name is one of the node-like hints.
    pub fn is_node_dimension(&self, name: &str) -> bool {
        self.node_dimension_hints
            .iter()
            .any(|hint| hint.eq_ignore_ascii_case(name))
    }

    /// Whether a units string denotes radians.
    pub fn is_radian_unit(&self, units: &str) -> bool {
        let units = units.trim();
        self.radian_unit_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LoaderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_node_hints_case_insensitive() {
        let config = LoaderConfig::default();
        assert!(config.is_node_dimension("nCells"));
        assert!(config.is_node_dimension("NODE"));
        assert!(!config.is_node_dimension("lon"));
    }

    #[test]
    fn test_hints_are_extensible() {
        let mut config = LoaderConfig::default();
        assert!(!config.is_node_dimension("nSCHISM_hgrid_node"));
        config.node_dimension_hints.push("nSCHISM_hgrid_node".to_string());
        assert!(config.is_node_dimension("nschism_hgrid_node"));
    }

    #[test]
    fn test_radian_units() {
        let config = LoaderConfig::default();
        assert!(config.is_radian_unit("Radians"));
        assert!(config.is_radian_unit("rad"));
        assert!(!config.is_radian_unit("degrees_east"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        let config = LoaderConfig {
            reference_radius_m: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_hints() {
        let config = LoaderConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: LoaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.node_dimension_hints, config.node_dimension_hints);
    }
}
