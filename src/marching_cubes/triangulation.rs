//! Cell classification and edge interpolation producing a raw triangle soup

use itertools::iproduct;
use log::trace;
use nalgebra::Vector3;
use ndarray::ArrayView3;
use rayon::prelude::*;

use crate::marching_cubes::case_table;
use crate::utils::{ChunkSize, ParallelPolicy, reserve_total};
use crate::Real;

/// One triangle of the raw surface, each vertex carrying its own copy of the coordinate
pub(crate) type RawTriangle<R> = [Vector3<R>; 3];

/// Walks every cell of the volume's cell grid and collects the triangles crossing the level
///
/// The resulting soup lists triangles in lexicographic (x, then y, then z) cell order,
/// with vertices duplicated wherever neighboring triangles meet. Cells are processed in
/// parallel slabs along the x-axis; the per-slab buffers are concatenated in slab order,
/// so the output is identical to a sequential pass.
pub(crate) fn triangulate_volume<R: Real>(
    volume: &ArrayView3<'_, R>,
    level: R,
    spacing: [R; 3],
) -> Vec<RawTriangle<R>> {
    let (nx, ny, nz) = volume.dim();
    if nx < 2 || ny < 2 || nz < 2 {
        // No complete cell exists, so no surface can cross the level
        return Vec::new();
    }
    let cells = [nx - 1, ny - 1, nz - 1];

    let chunks = ChunkSize::new(&ParallelPolicy::default(), cells[0]);
    let slab_buffers: Vec<Vec<RawTriangle<R>>> = (0..cells[0])
        .collect::<Vec<_>>()
        .par_chunks(chunks.chunk_size)
        .map(|slab| {
            let mut buffer = Vec::new();
            for (&i, j, k) in iproduct!(slab, 0..cells[1], 0..cells[2]) {
                triangulate_cell(volume, level, &spacing, [i, j, k], &mut buffer);
            }
            buffer
        })
        .collect();
    debug_assert_eq!(slab_buffers.len(), chunks.num_chunks);

    let mut soup = Vec::new();
    reserve_total(&mut soup, slab_buffers.iter().map(Vec::len).sum());
    for mut buffer in slab_buffers {
        soup.append(&mut buffer);
    }

    trace!("Raw triangle soup contains {} triangles", soup.len());
    soup
}

/// Classifies a single cell and appends its interpolated triangles to the buffer
fn triangulate_cell<R: Real>(
    volume: &ArrayView3<'_, R>,
    level: R,
    spacing: &[R; 3],
    cell: [usize; 3],
    buffer: &mut Vec<RawTriangle<R>>,
) {
    let mut corner_values = [R::zero(); 8];
    for (corner, offset) in case_table::CORNER_OFFSETS.iter().enumerate() {
        corner_values[corner] =
            volume[(cell[0] + offset[0], cell[1] + offset[1], cell[2] + offset[2])];
    }

    let mut config = 0u8;
    for (corner, &value) in corner_values.iter().enumerate() {
        if value >= level {
            config |= 1 << corner;
        }
    }

    let crossed_edges = case_table::edge_mask(config);
    if crossed_edges == 0 {
        return;
    }

    let mut edge_vertices = [None; 12];
    for (edge, vertex) in edge_vertices.iter_mut().enumerate() {
        if crossed_edges & (1 << edge) != 0 {
            *vertex = interpolate_edge(level, spacing, &cell, edge, &corner_values);
        }
    }

    for triangle in case_table::triangulation(config) {
        // An interpolation can only be missing for a degenerate edge (equal corner
        // values); such edges are treated as inactive and their triangles dropped
        if let [Some(v0), Some(v1), Some(v2)] = triangle.map(|edge| edge_vertices[edge]) {
            buffer.push([v0, v1, v2]);
        }
    }
}

/// Interpolates the position where the field crosses the level along the given cell edge
///
/// The interpolation runs in index space and only afterwards scales by the voxel spacing.
/// Both corner coordinates are reproduced exactly for t = 0 and t = 1. Returns `None` for
/// a degenerate edge whose two corner values are equal.
fn interpolate_edge<R: Real>(
    level: R,
    spacing: &[R; 3],
    cell: &[usize; 3],
    edge: usize,
    corner_values: &[R; 8],
) -> Option<Vector3<R>> {
    let [a, b] = case_table::EDGE_ENDPOINTS[edge];
    let (va, vb) = (corner_values[a], corner_values[b]);
    if va == vb {
        return None;
    }

    let t = ((level - va) / (vb - va)).clamp(R::zero(), R::one());

    let mut position = Vector3::zeros();
    for axis in 0..3 {
        let pa = R::from_usize(cell[axis] + case_table::CORNER_OFFSETS[a][axis]).unwrap();
        let pb = R::from_usize(cell[axis] + case_table::CORNER_OFFSETS[b][axis]).unwrap();
        position[axis] = (pa + t * (pb - pa)) * spacing[axis];
    }
    Some(position)
}
