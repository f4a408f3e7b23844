//! Integration test: load meshes through the structured-source query
//! interface, backed by the in-memory fixture.

use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, regular_axis, triangulated_grid, vertex_major,
    MemorySource, MemoryVariable,
};

use mesh_loader::{
    load_from_structured_source, load_from_structured_source_with_config, Backend, GridExtent,
    LoaderConfig, MeshError, Topology,
};

fn node_coords(lon: &[f64], lat: &[f64], dim: &str) -> MemorySource {
    MemorySource::new()
        .with_variable("lon", MemoryVariable::new(&[(dim, lon.len())], lon.to_vec()))
        .with_variable("lat", MemoryVariable::new(&[(dim, lat.len())], lat.to_vec()))
}

#[test]
fn test_shared_dimension_is_unstructured() {
    let src = node_coords(&[0.0, 10.0, 20.0], &[5.0, 6.0, 7.0], "n");
    let mesh = load_from_structured_source(&src, None).unwrap();

    assert_eq!(mesh.topology(), Topology::Unstructured);
    assert_eq!(mesh.point_count(), 3);
    assert_eq!(mesh.source().backend, Backend::Structured);
    assert!(mesh.source().side_file.is_none());
}

#[test]
fn test_product_expansion() {
    let src = MemorySource::new()
        .with_variable("lon", MemoryVariable::new(&[("lon", 2)], vec![10.0, 20.0]))
        .with_variable("lat", MemoryVariable::new(&[("lat", 3)], vec![1.0, 2.0, 3.0]));
    let mesh = load_from_structured_source(&src, None).unwrap();

    assert_eq!(mesh.topology(), Topology::StructuredProduct);
    assert_eq!(mesh.grid_extent(), GridExtent::new(2, 3));
    assert_eq!((mesh.longitude()[4], mesh.latitude()[4]), (10.0, 3.0));
}

#[test]
fn test_curvilinear() {
    let lon: Vec<f64> = (0..15).map(|v| v as f64).collect();
    let lat: Vec<f64> = (0..15).map(|v| v as f64 * 0.5).collect();
    let src = MemorySource::new()
        .with_variable("longitude", MemoryVariable::new(&[("y", 3), ("x", 5)], lon))
        .with_variable("latitude", MemoryVariable::new(&[("y", 3), ("x", 5)], lat));
    let mesh = load_from_structured_source(&src, None).unwrap();

    assert_eq!(mesh.topology(), Topology::Curvilinear);
    assert_eq!(mesh.grid_extent(), GridExtent::new(5, 3));
    assert_eq!(mesh.latitude()[14], 7.0);
}

#[test]
fn test_rank_mismatch_fails() {
    let src = MemorySource::new()
        .with_variable("lon", MemoryVariable::new(&[("x", 5)], vec![0.0; 5]))
        .with_variable("lat", MemoryVariable::new(&[("y", 3), ("x", 5)], vec![0.0; 15]));
    let err = load_from_structured_source(&src, None).unwrap_err();
    assert!(matches!(err, MeshError::ShapeMismatch(_)));
}

#[test]
fn test_declared_size_disagrees_with_data() {
    let src = MemorySource::new()
        .with_variable("lon", MemoryVariable::new(&[("n", 4)], vec![0.0; 3]))
        .with_variable("lat", MemoryVariable::new(&[("n", 4)], vec![0.0; 4]));
    let err = load_from_structured_source(&src, None).unwrap_err();
    assert!(matches!(err, MeshError::ShapeMismatch(_)));
}

#[test]
fn test_read_failure_is_io() {
    let src = MemorySource::new()
        .with_variable("lon", MemoryVariable::new(&[("n", 2)], vec![0.0; 2]).failing())
        .with_variable("lat", MemoryVariable::new(&[("n", 2)], vec![0.0; 2]));
    let err = load_from_structured_source(&src, None).unwrap_err();
    assert!(matches!(err, MeshError::Io(_)));
}

#[test]
fn test_missing_longitude_lists_names() {
    let src = MemorySource::new()
        .with_variable("lat", MemoryVariable::new(&[("n", 2)], vec![0.0; 2]));
    let err = load_from_structured_source(&src, None).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("longitude"));
}

#[test]
fn test_radians_on_one_axis_converts_both() {
    let pi = std::f64::consts::PI;
    let src = MemorySource::new()
        .with_variable(
            "lon",
            MemoryVariable::new(&[("nCells", 2)], vec![0.5 * pi, 1.5 * pi]).units("radians"),
        )
        .with_variable("lat", MemoryVariable::new(&[("nCells", 2)], vec![0.25 * pi, 0.0]));
    let mesh = load_from_structured_source(&src, None).unwrap();

    assert_coords_approx_eq!(
        (mesh.longitude()[0], mesh.latitude()[0]),
        (90.0, 45.0),
        1e-9
    );
    assert_approx_eq!(mesh.longitude()[1], -90.0, 1e-9);
}

#[test]
fn test_connectivity_zero_basing_and_transpose() {
    let lon: Vec<f64> = (0..8).map(|i| (i % 4) as f64).collect();
    let lat: Vec<f64> = (0..8).map(|i| (i / 4) as f64).collect();
    let zero_based: Vec<i32> = triangulated_grid(4, 2).iter().map(|v| v - 1).collect();
    let stored = vertex_major(&zero_based, 3);
    let src = node_coords(&lon, &lat, "node").with_variable(
        "face_node_connectivity",
        MemoryVariable::ints(&[("three", 3), ("nFaces", 6)], &stored).int_attribute("start_index", 0),
    );
    let mesh = load_from_structured_source(&src, None).unwrap();

    let conn = mesh.connectivity().unwrap();
    assert_eq!(conn.element_count, 6);
    assert_eq!(conn.element(0), &[0, 1, 5]);
    mesh.validate().unwrap();
}

#[test]
fn test_default_start_index_is_one_based() {
    let src = node_coords(&[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0], "vertex").with_variable(
        "face_node_connectivity",
        MemoryVariable::ints(&[("nFaces", 1), ("three", 3)], &[1, 2, 3]),
    );
    let mesh = load_from_structured_source(&src, None).unwrap();
    assert_eq!(mesh.connectivity().unwrap().indices, vec![0, 1, 2]);
}

#[test]
fn test_connectivity_read_failure_is_dropped() {
    let src = node_coords(&[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0], "vertex").with_variable(
        "face_node_connectivity",
        MemoryVariable::ints(&[("nFaces", 1), ("three", 3)], &[1, 2, 3]).failing(),
    );
    let mesh = load_from_structured_source(&src, None).unwrap();
    assert!(mesh.connectivity().is_none());
    assert_eq!(mesh.point_count(), 3);
}

#[test]
fn test_side_file_supplies_coordinates() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let grid_path = temp_dir.path().join("grid.json");
    node_coords(&[350.0, 10.0, 20.0], &[0.0, 1.0, 2.0], "nCells")
        .save(&grid_path)
        .unwrap();

    // Data file has no coordinates but carries the cell table
    let data = MemorySource::new().with_variable(
        "face_node_connectivity",
        MemoryVariable::ints(&[("nFaces", 1), ("three", 3)], &[1, 2, 3]),
    );
    let mesh = load_from_structured_source(&data, Some(&grid_path)).unwrap();

    assert_eq!(mesh.point_count(), 3);
    assert_eq!(mesh.longitude()[0], -10.0);
    assert_eq!(mesh.source().side_file.as_deref(), Some(grid_path.as_path()));
    assert_eq!(mesh.connectivity().unwrap().element_count, 1);
}

#[test]
fn test_missing_side_file_is_io() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = node_coords(&[0.0], &[0.0], "n");
    let err = load_from_structured_source(&src, Some(&temp_dir.path().join("nope.json")))
        .unwrap_err();
    assert!(matches!(err, MeshError::Io(_)));
}

#[test]
fn test_nearest_point_on_loaded_mesh() {
    let src = MemorySource::new()
        .with_variable("lon", MemoryVariable::new(&[("lon", 4)], regular_axis(0.0, 90.0, 4)))
        .with_variable("lat", MemoryVariable::new(&[("lat", 3)], regular_axis(-45.0, 45.0, 3)));
    let config = LoaderConfig {
        parallel: false,
        ..Default::default()
    };
    let mesh = load_from_structured_source_with_config(&src, None, &config).unwrap();

    // (-90, 0) is index 1 * 4 + 3
    assert_eq!(mesh.nearest_point(-85.0, 2.0, 1_000_000.0), Some(7));
    assert_eq!(mesh.nearest_point(-45.0, 0.0, 1_000.0), None);
}

#[test]
fn test_configured_radius_sets_search_cutoff() {
    let src = node_coords(&[1.0, 2.0], &[0.0, 0.0], "node");

    let mesh = load_from_structured_source(&src, None).unwrap();
    assert_eq!(mesh.nearest_point(0.0, 0.0, 50_000.0), None);

    let config = LoaderConfig {
        reference_radius_m: 1_000_000.0,
        ..Default::default()
    };
    let mesh = load_from_structured_source_with_config(&src, None, &config).unwrap();
    assert_eq!(mesh.reference_radius(), 1_000_000.0);
    assert_eq!(mesh.nearest_point(0.0, 0.0, 50_000.0), Some(0));
}
