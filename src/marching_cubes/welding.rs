//! Deduplication of the raw triangle soup into an indexed surface mesh

use log::trace;
use nalgebra::Vector3;

use crate::marching_cubes::triangulation::RawTriangle;
use crate::mesh::TriMesh3d;
use crate::utils::reserve_total;
use crate::{MapType, Real, new_map};

/// Welds the duplicated vertices of a raw triangle soup into a compact indexed mesh
///
/// Coordinates are compared by exact floating point equality, not by spatial tolerance:
/// coincident vertices of neighboring triangles stem from identical interpolation inputs
/// and are bit-identical by construction. Vertex indices are assigned in first-seen order
/// while scanning the soup, so the vertex and face ordering of the output follows the
/// traversal order of the soup.
pub(crate) fn weld_triangle_soup<R: Real>(soup: &[RawTriangle<R>]) -> TriMesh3d<R> {
    let mut vertex_indices: MapType<[u64; 3], usize> = new_map();
    let mut mesh = TriMesh3d::default();
    reserve_total(&mut mesh.triangles, soup.len());

    for triangle in soup {
        let mut face = [0usize; 3];
        for (index, vertex) in face.iter_mut().zip(triangle.iter()) {
            let next_index = vertex_indices.len();
            *index = *vertex_indices
                .entry(coordinate_key(vertex))
                .or_insert_with(|| {
                    mesh.vertices.push(*vertex);
                    next_index
                });
        }
        mesh.triangles.push(face);
    }

    trace!(
        "Welded {} raw triangles into a mesh with {} vertices",
        soup.len(),
        mesh.vertices.len()
    );
    mesh
}

/// Maps a coordinate to its exact bit pattern for use as a hash key
///
/// `f32` to `f64` conversion is exact, so the key is injective for the scalar types the
/// crate is used with.
fn coordinate_key<R: Real>(vertex: &Vector3<R>) -> [u64; 3] {
    [
        vertex.x.to_f64_unchecked().to_bits(),
        vertex.y.to_f64_unchecked().to_bits(),
        vertex.z.to_f64_unchecked().to_bits(),
    ]
}
