//! Synthetic coordinate generators.
//!
//! Values are predictable so tests can check exact positions after a load.

/// Evenly spaced axis `start, start + step, ...` of length `n`.
pub fn regular_axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Quasi-uniform points on the sphere (Fibonacci lattice), in degrees.
///
/// Longitudes are returned in [0, 360) so loaders have to wrap them.
pub fn fibonacci_sphere(n: usize) -> (Vec<f64>, Vec<f64>) {
    let golden = (1.0 + 5.0f64.sqrt()) / 2.0;
    let mut lon = Vec::with_capacity(n);
    let mut lat = Vec::with_capacity(n);
    for i in 0..n {
        let z = 1.0 - (2.0 * i as f64 + 1.0) / n as f64;
        lat.push(z.asin().to_degrees());
        lon.push((360.0 * i as f64 / golden).rem_euclid(360.0));
    }
    (lon, lat)
}

/// Curvilinear coordinates for an `nx` x `ny` grid, flattened y-major.
///
/// The grid is a regular lon/lat grid rotated by `skew` degrees of
/// longitude per row, so neither array is separable.
pub fn skewed_grid(nx: usize, ny: usize, skew: f64) -> (Vec<f64>, Vec<f64>) {
    let mut lon = Vec::with_capacity(nx * ny);
    let mut lat = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            lon.push(i as f64 + skew * j as f64);
            lat.push(j as f64 - 0.1 * i as f64);
        }
    }
    (lon, lat)
}

/// Two triangles per cell of an `nx` x `ny` node grid, one-based,
/// stored element-major.
pub fn triangulated_grid(nx: usize, ny: usize) -> Vec<i32> {
    let mut tris = Vec::new();
    for j in 0..ny.saturating_sub(1) {
        for i in 0..nx.saturating_sub(1) {
            let a = (j * nx + i) as i32 + 1;
            let b = a + 1;
            let c = a + nx as i32;
            let d = c + 1;
            tris.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }
    tris
}

/// Transpose an element-major `(n, k)` table into vertex-major `(k, n)`.
pub fn vertex_major<T: Copy>(table: &[T], k: usize) -> Vec<T> {
    let n = table.len() / k;
    let mut out = Vec::with_capacity(table.len());
    for v in 0..k {
        for e in 0..n {
            out.push(table[e * k + v]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_axis() {
        assert_eq!(regular_axis(10.0, 10.0, 3), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_fibonacci_sphere_ranges() {
        let (lon, lat) = fibonacci_sphere(100);
        assert_eq!(lon.len(), 100);
        assert!(lon.iter().all(|&v| (0.0..360.0).contains(&v)));
        assert!(lat.iter().all(|&v| (-90.0..=90.0).contains(&v)));
    }

    #[test]
    fn test_triangulated_grid() {
        let tris = triangulated_grid(3, 2);
        assert_eq!(tris.len(), 2 * 2 * 3);
        assert_eq!(&tris[..3], &[1, 2, 5]);
        assert_eq!(*tris.iter().max().unwrap(), 6);
    }

    #[test]
    fn test_vertex_major() {
        let t = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(vertex_major(&t, 3), vec![1, 4, 2, 5, 3, 6]);
    }
}
