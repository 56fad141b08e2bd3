//! Basic triangle mesh type produced by the surface extraction

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::Real;

/// A triangle (surface) mesh in 3D
///
/// Vertices are unique: coincident points produced during extraction are merged into a
/// single entry and shared by all referencing triangles.
#[derive(Clone, Debug)]
pub struct TriMesh3d<R: Real> {
    /// Coordinates of all vertices of the mesh
    pub vertices: Vec<Vector3<R>>,
    /// The triangles of the mesh identified by their vertex indices
    pub triangles: Vec<[usize; 3]>,
}

impl<R: Real> Default for TriMesh3d<R> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }
}

impl<R: Real> TriMesh3d<R> {
    /// Returns whether the mesh contains no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Clears the vertex and triangle storage, keeps allocated memory
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
    }

    /// Appends the other mesh to this mesh, shifts the vertex indices of the appended triangles
    pub fn append(&mut self, other: &mut TriMesh3d<R>) {
        let vertex_offset = self.vertices.len();
        self.vertices.append(&mut other.vertices);
        self.triangles.extend(
            other
                .triangles
                .drain(..)
                .map(|tri| tri.map(|v| v + vertex_offset)),
        );
    }

    /// Computes the total surface area of the mesh
    pub fn surface_area(&self) -> R {
        mesh_surface_area(&self.vertices, &self.triangles)
    }
}

/// Computes the total surface area of a triangle mesh given by vertices and index triples
///
/// Each triangle contributes half the norm of the cross product of two of its edge vectors.
/// Degenerate (zero-area) faces contribute nothing. All faces have to be triangles.
pub fn mesh_surface_area<R: Real>(vertices: &[Vector3<R>], faces: &[[usize; 3]]) -> R {
    let two = R::from_f64_unchecked(2.0);
    faces
        .par_iter()
        .map(|&[i0, i1, i2]| {
            let a = vertices[i0] - vertices[i1];
            let b = vertices[i0] - vertices[i2];
            a.cross(&b).norm()
        })
        .reduce(R::zero, |acc, area| acc + area)
        / two
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_surface_area_unit_triangle() {
        let vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        assert_relative_eq!(mesh_surface_area(&vertices, &faces), 0.5);
    }

    #[test]
    fn test_surface_area_empty_mesh() {
        let mesh = TriMesh3d::<f64>::default();
        assert_eq!(mesh.surface_area(), 0.0);
    }

    #[test]
    fn test_surface_area_degenerate_face() {
        let vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(2.0, 2.0, 2.0),
        ];
        // Collinear vertices span no area
        let faces = vec![[0, 1, 2]];
        assert_relative_eq!(mesh_surface_area(&vertices, &faces), 0.0);
    }

    #[test]
    fn test_clear_empties_mesh() {
        let mut mesh = TriMesh3d::<f64> {
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        };
        let vertex_capacity = mesh.vertices.capacity();

        mesh.clear();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
        assert_eq!(mesh.vertices.capacity(), vertex_capacity);
    }

    #[test]
    fn test_append_shifts_indices() {
        let mut mesh = TriMesh3d::<f64> {
            vertices: vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        };
        let mut other = mesh.clone();
        mesh.append(&mut other);

        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [3, 4, 5]]);
        assert!(other.is_empty());
    }
}
