use isosurf::{
    GradientDirection, IsosurfaceError, TriMesh3d, correct_mesh_orientation, marching_cubes,
};

use nalgebra::Vector3;
use ndarray::{Array3, ArrayD};

const CENTER: f64 = 15.5;
const RADIUS: f64 = 8.0;

/// Distance field of a sphere, its gradient points radially outward
fn sphere_field() -> Array3<f64> {
    Array3::from_shape_fn((32, 32, 32), |(i, j, k): (usize, usize, usize)| {
        let dx = i as f64 - CENTER;
        let dy = j as f64 - CENTER;
        let dz = k as f64 - CENTER;
        (dx * dx + dy * dy + dz * dz).sqrt()
    })
}

fn sphere_mesh(field: &Array3<f64>) -> TriMesh3d<f64> {
    marching_cubes(field.view().into_dyn(), RADIUS, [1.0; 3]).unwrap()
}

/// Same normal convention as the orientation correction itself
fn face_normal(vertices: &[Vector3<f64>], face: &[usize; 3]) -> Vector3<f64> {
    let [v0, v1, v2] = face.map(|i| vertices[i]);
    (v0 - v1).cross(&(v0 - v2))
}

#[test]
fn test_descent_aligns_normals_with_gradient() {
    let field = sphere_field();
    let mesh = sphere_mesh(&field);
    assert!(!mesh.is_empty());

    let corrected = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &mesh.triangles,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();

    // The distance field increases radially, so every corrected normal has to point
    // away from the sphere center
    let center = Vector3::new(CENTER, CENTER, CENTER);
    for face in &corrected {
        let normal = face_normal(&mesh.vertices, face);
        let centroid = (mesh.vertices[face[0]] + mesh.vertices[face[1]] + mesh.vertices[face[2]]) / 3.0;
        let outward = centroid - center;
        assert!(
            normal.dot(&outward) > 0.0,
            "face {:?} points inward after correction",
            face
        );
    }
}

#[test]
fn test_ascent_reverses_descent() {
    let field = sphere_field();
    let mesh = sphere_mesh(&field);

    let descent = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &mesh.triangles,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();
    let ascent = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &mesh.triangles,
        [1.0; 3],
        GradientDirection::Ascent,
    )
    .unwrap();

    let mut reversed = 0;
    for ((d, a), original) in descent.iter().zip(&ascent).zip(&mesh.triangles) {
        if a == &[d[2], d[1], d[0]] {
            reversed += 1;
        } else {
            // Faces the correction considers degenerate are left alone by both modes
            assert_eq!(a, d);
            assert_eq!(a, original);
        }
    }
    assert!(reversed > 0);
}

#[test]
fn test_correction_is_idempotent() {
    let field = sphere_field();
    let mesh = sphere_mesh(&field);

    let once = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &mesh.triangles,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();
    let twice = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &once,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_opposite_mode_round_trip_restores_faces() {
    let field = sphere_field();
    let mesh = sphere_mesh(&field);

    let oriented = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &mesh.triangles,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();
    let flipped = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &oriented,
        [1.0; 3],
        GradientDirection::Ascent,
    )
    .unwrap();
    let restored = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &flipped,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();

    assert_eq!(restored, oriented);
}

#[test]
fn test_correction_preserves_triangles_and_input() {
    let field = sphere_field();
    let mesh = sphere_mesh(&field);
    let original = mesh.triangles.clone();

    let corrected = correct_mesh_orientation(
        field.view().into_dyn(),
        &mesh.vertices,
        &mesh.triangles,
        [1.0; 3],
        GradientDirection::Descent,
    )
    .unwrap();

    // The input face list is returned corrected as a copy, the mesh itself stays as-is
    assert_eq!(mesh.triangles, original);
    assert_eq!(corrected.len(), original.len());

    // Flipping only rewinds faces, the triangles still connect the same vertices
    for (corrected, original) in corrected.iter().zip(&original) {
        let mut c = *corrected;
        let mut o = *original;
        c.sort_unstable();
        o.sort_unstable();
        assert_eq!(c, o);
    }
}

#[test]
fn test_non_3d_volume_is_rejected() {
    let field_2d = ArrayD::<f64>::zeros(vec![4, 4]);
    let result = correct_mesh_orientation(
        field_2d.view(),
        &[],
        &[],
        [1.0; 3],
        GradientDirection::Descent,
    );
    match result {
        Err(IsosurfaceError::InvalidDimension { ndim }) => assert_eq!(ndim, 2),
        other => panic!("expected InvalidDimension, got {:?}", other),
    }
}

#[test]
fn test_direction_parsing() {
    assert_eq!(
        "descent".parse::<GradientDirection>().unwrap(),
        GradientDirection::Descent
    );
    assert_eq!(
        "ascent".parse::<GradientDirection>().unwrap(),
        GradientDirection::Ascent
    );
    assert!(matches!(
        "downhill".parse::<GradientDirection>(),
        Err(IsosurfaceError::InvalidMode(s)) if s == "downhill"
    ));
}
