//! Cartesian embedding of mesh points on the unit sphere.

use rayon::prelude::*;

use mesh_common::sphere::project;

/// Project every (lon, lat) pair in degrees onto the unit sphere.
pub fn project_points(longitude: &[f64], latitude: &[f64], parallel: bool) -> Vec<[f64; 3]> {
    if parallel {
        longitude
            .par_iter()
            .zip(latitude.par_iter())
            .map(|(&lon, &lat)| project(lon, lat))
            .collect()
    } else {
        longitude
            .iter()
            .zip(latitude)
            .map(|(&lon, &lat)| project(lon, lat))
            .collect()
    }
}
