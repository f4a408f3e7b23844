//! Face/vertex index table normalization.
//!
//! Tables may be stored element-major `(n, k)` or vertex-major `(k, n)` with
//! `k` in {3, 4}, and may be one-based. The loaded table is always
//! element-major and zero-based.

use mesh_common::{Connectivity, MeshError, MeshResult};

use crate::backend::RawIndexTable;

/// Index base assumed when the table carries no `start_index`.
pub const DEFAULT_START_INDEX: i64 = 1;

fn is_vertex_count(len: usize) -> bool {
    len == 3 || len == 4
}

/// Normalize a raw table against a mesh of `point_count` points.
pub fn normalize(table: RawIndexTable, point_count: usize) -> MeshResult<Connectivity> {
    let shape = table.shape.as_slice();
    if shape.len() != 2 {
        return Err(MeshError::unsupported(format!(
            "index table '{}' has rank {}, expected 2",
            table.name,
            shape.len()
        )));
    }

    // Prefer element-major when both axes could be the vertex axis.
    let (element_count, vertices, vertex_major) = if is_vertex_count(shape[1]) {
        (shape[0], shape[1], false)
    } else if is_vertex_count(shape[0]) {
        (shape[1], shape[0], true)
    } else {
        return Err(MeshError::unsupported(format!(
            "index table '{}' has shape {:?}; no axis of length 3 or 4",
            table.name, shape
        )));
    };

    if table.values.len() != element_count * vertices {
        return Err(MeshError::shape_mismatch(format!(
            "index table '{}' holds {} values for shape {:?}",
            table.name,
            table.values.len(),
            shape
        )));
    }

    let start = table.start_index.unwrap_or(DEFAULT_START_INDEX);
    let mut indices = Vec::with_capacity(table.values.len());
    for e in 0..element_count {
        for v in 0..vertices {
            let raw = if vertex_major {
                table.values[v * element_count + e]
            } else {
                table.values[e * vertices + v]
            };
            let zero_based = raw.checked_sub(start).unwrap_or(-1);
            if zero_based < 0 || zero_based as usize >= point_count {
                return Err(MeshError::unsupported(format!(
                    "index table '{}' element {} refers to vertex {} (start_index {}) of {} points",
                    table.name, e, raw, start, point_count
                )));
            }
            indices.push(zero_based as u32);
        }
    }

    Ok(Connectivity {
        element_count,
        vertices_per_element: vertices,
        indices,
    })
}
