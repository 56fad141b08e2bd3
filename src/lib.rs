//!
//! Library for isosurface extraction from dense 3D scalar fields using marching cubes.
//! Entry point is the [marching_cubes] function; [mesh_surface_area] and
//! [correct_mesh_orientation] post-process the extracted mesh.
//!
//! The implementation is the naive Lorensen & Cline formulation: known ambiguous cell
//! configurations are not resolved, so the extracted surface may be non-manifold or
//! non-closed for complicated contours, and no guarantee is made that a single connected
//! contour is returned. All isosurfaces crossing the requested level are extracted.
//!

/// Re-export the version of nalgebra used by this crate
pub use nalgebra;
/// Re-export the version of ndarray used by this crate
pub use ndarray;

/// Triangulation of dense scalar fields using marching cubes
pub mod marching_cubes;
/// Basic triangle mesh type produced by the surface extraction
pub mod mesh;
mod numeric_types;
/// Gradient-based correction of mesh face orientations
pub mod orientation;
mod utils;
mod volume;

use log::info;
use nalgebra::Vector3;
use ndarray::ArrayViewD;
use thiserror::Error as ThisError;

pub use mesh::{TriMesh3d, mesh_surface_area};
pub use numeric_types::{Real, ThreadSafe};
pub use orientation::GradientDirection;

pub(crate) type HashState = fxhash::FxBuildHasher;
pub(crate) type MapType<K, V> = std::collections::HashMap<K, V, HashState>;
pub(crate) fn new_map<K, V>() -> MapType<K, V> {
    MapType::with_hasher(HashState::default())
}

/// Error type returned when extraction or post-processing is rejected during validation
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum IsosurfaceError {
    /// The input volume does not have exactly 3 dimensions
    #[error("input volume must have exactly 3 dimensions, got {ndim}")]
    InvalidDimension { ndim: usize },
    /// The requested level lies outside of the volume's value range, no surface can exist
    #[error("level {level} is outside of the volume data range [{min}, {max}]")]
    LevelOutOfRange { level: f64, min: f64, max: f64 },
    /// The gradient direction mode is not one of the recognized values
    #[error("unrecognized gradient direction {0:?}, expected \"descent\" or \"ascent\"")]
    InvalidMode(String),
}

/// Initializes the global thread pool used by this library with the given parameters.
///
/// Initialization of the global thread pool happens exactly once.
/// Therefore, if you call `initialize_thread_pool` a second time, it will return an error.
/// An `Ok` result indicates that this is the first initialization of the thread pool.
pub fn initialize_thread_pool(num_threads: usize) -> Result<(), anyhow::Error> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;
    Ok(())
}

/// Extracts the isosurface of a dense 3D scalar field at the given level
///
/// The volume is indexed as `(x, y, z)`; `spacing` gives the physical distance per index
/// step along each axis and scales the output coordinates only, never the topology. The
/// returned mesh consists of unique vertices and index triples referencing them. Vertex
/// and face ordering is determined by the position of the smallest (x, y, z) coordinate
/// of the contour in lexicographic order, a side effect of the cell traversal that can be
/// relied upon.
///
/// Face windings are not guaranteed to be globally consistent, see
/// [correct_mesh_orientation].
///
/// Returns an error if the volume does not have exactly 3 dimensions or if `level` lies
/// outside of the volume's value range (inclusive bounds are accepted).
pub fn marching_cubes<R: Real>(
    volume: ArrayViewD<'_, R>,
    level: R,
    spacing: [R; 3],
) -> Result<TriMesh3d<R>, IsosurfaceError> {
    let volume = volume::require_3d(volume)?;

    let range = volume::value_range(&volume);
    match range {
        Some((min, max)) if level >= min && level <= max => {}
        _ => {
            let (min, max) = range
                .map(|(min, max)| (min.to_f64_unchecked(), max.to_f64_unchecked()))
                .unwrap_or((f64::NAN, f64::NAN));
            return Err(IsosurfaceError::LevelOutOfRange {
                level: level.to_f64_unchecked(),
                min,
                max,
            });
        }
    }

    Ok(marching_cubes::extract_surface(&volume, level, spacing))
}

/// Corrects the orientations of the faces of an extracted mesh
///
/// Computes the gradient of the volume with central differences scaled by `spacing`,
/// samples it at each face centroid via multilinear interpolation and flips every face
/// whose normal disagrees with the gradient under the given [GradientDirection]
/// convention. Only the face list is corrected and returned; the vertices do not change,
/// only the order in which they are referenced.
pub fn correct_mesh_orientation<R: Real>(
    volume: ArrayViewD<'_, R>,
    vertices: &[Vector3<R>],
    faces: &[[usize; 3]],
    spacing: [R; 3],
    direction: GradientDirection,
) -> Result<Vec<[usize; 3]>, IsosurfaceError> {
    let volume = volume::require_3d(volume)?;
    info!(
        "Correcting orientation of {} faces ({:?} convention)",
        faces.len(),
        direction
    );
    Ok(orientation::correct_orientation(
        &volume, vertices, faces, spacing, direction,
    ))
}
