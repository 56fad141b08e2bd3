//! Triangulation of dense scalar fields using marching cubes

use log::info;
use ndarray::ArrayView3;

use crate::Real;
use crate::mesh::TriMesh3d;

pub mod case_table;
mod triangulation;
mod welding;

/// Extracts the isosurface of the given (validated) volume as an indexed triangle mesh
///
/// Runs the two stages of the extraction: cell-wise triangulation into a raw triangle
/// soup, followed by vertex welding into a compact mesh. Vertex and face ordering is
/// determined by the first encounter during the lexicographic cell traversal.
pub(crate) fn extract_surface<R: Real>(
    volume: &ArrayView3<'_, R>,
    level: R,
    spacing: [R; 3],
) -> TriMesh3d<R> {
    let (nx, ny, nz) = volume.dim();
    info!(
        "Extracting isosurface at level {:?} from a {}x{}x{} volume",
        level, nx, ny, nz
    );

    let soup = triangulation::triangulate_volume(volume, level, spacing);
    let mesh = welding::weld_triangle_soup(&soup);

    info!(
        "Surface mesh has {} triangles and {} vertices",
        mesh.triangles.len(),
        mesh.vertices.len()
    );
    mesh
}
