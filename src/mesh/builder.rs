//! Mesh construction utilities.
//!
//! This module builds [`PolyMesh`]es from face-vertex lists as found in mesh
//! files, checking the input on the way in, and generates flat grids for
//! experiments and tests.

use nalgebra::Point3;

use super::index::{MeshIndex, VertexId};
use super::polymesh::{check_key_range, PolyMesh};
use crate::error::{MeshError, Result};

/// Build a polygon mesh from vertex positions and faces given as index lists.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of faces, each a sequence of at least three vertex indices
///
/// # Errors
/// * [`MeshError::EmptyMesh`] if there are no faces
/// * [`MeshError::InvalidVertexIndex`] if a face names a missing vertex
/// * [`MeshError::DegenerateFace`] if a face has fewer than three corners or
///   repeats one
/// * [`MeshError::InvalidParameter`] if there are more vertices or faces
///   than the key type can address
///
/// # Example
/// ```
/// use tessera::mesh::{build_from_polygons, PolyMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![vec![0, 1, 2, 3]];
///
/// let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 4);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_polygons<I, F>(vertices: &[Point3<f64>], faces: &[F]) -> Result<PolyMesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    check_key_range::<I>("vertices", vertices.len())?;
    check_key_range::<I>("faces", faces.len())?;

    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (ci, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..ci].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
    }

    let mut mesh = PolyMesh::with_capacity(vertices.len(), faces.len());
    for &p in vertices {
        mesh.add_vertex(p);
    }
    for face in faces {
        mesh.add_face(face.as_ref().iter().map(|&vi| VertexId::new(vi)));
    }

    Ok(mesh)
}

/// Build a mesh from triangles given as index triples.
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<PolyMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Convert a mesh back to positions and index lists.
pub fn to_face_vertex<I: MeshIndex>(mesh: &PolyMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let vertices = mesh.positions().to_vec();
    let faces: Vec<Vec<usize>> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).iter().map(|v| v.index()).collect::<Vec<_>>())
        .collect();
    (vertices, faces)
}

/// Generate a flat grid of `nx` by `ny` quads in the XY plane.
///
/// Vertices are numbered row by row: vertex `j * (nx + 1) + i` sits at
/// `(i * spacing, j * spacing, 0)`. Interior vertices have exactly four edge
/// neighbors.
///
/// # Example
/// ```
/// use tessera::mesh::{build_grid, PolyMesh};
///
/// let grid: PolyMesh = build_grid(2, 2, 1.0).unwrap();
/// assert_eq!(grid.num_vertices(), 9);
/// assert_eq!(grid.num_faces(), 4);
/// assert_eq!(grid.boundary_vertices().len(), 8);
/// ```
pub fn build_grid<I: MeshIndex>(nx: usize, ny: usize, spacing: f64) -> Result<PolyMesh<I>> {
    if nx == 0 {
        return Err(MeshError::invalid_param("nx", nx, "must be at least 1"));
    }
    if ny == 0 {
        return Err(MeshError::invalid_param("ny", ny, "must be at least 1"));
    }
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(MeshError::invalid_param("spacing", spacing, "must be positive"));
    }

    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }

    let mut faces = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let v00 = j * (nx + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (nx + 1);
            let v11 = v01 + 1;
            faces.push([v00, v10, v11, v01]);
        }
    }

    build_from_polygons(&vertices, &faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    #[test]
    fn test_mixed_polygons() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];

        let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face_vertices(FaceId::new(1)).len(), 3);
        assert_eq!(mesh.num_edges(), 6);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_roundtrip() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];

        let mesh: PolyMesh = build_from_triangles(&vertices, &faces).unwrap();
        let (v2, f2) = to_face_vertex(&mesh);

        assert_eq!(v2, vertices);
        assert_eq!(f2, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_empty_faces_rejected() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces: Vec<[usize; 3]> = Vec::new();
        let result: Result<PolyMesh> = build_from_polygons(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 5]];

        let result: Result<PolyMesh> = build_from_polygons(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 5 })
        ));
    }

    #[test]
    fn test_repeated_corner_is_degenerate() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let faces = vec![vec![0, 1, 2], vec![0, 1, 0]];

        let result: Result<PolyMesh> = build_from_polygons(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 1 })));
    }

    #[test]
    fn test_too_many_vertices_for_small_keys() {
        let vertices = vec![Point3::origin(); 70_000];
        let faces = vec![[0, 1, 2]];

        let result: Result<PolyMesh<u16>> = build_from_polygons(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_grid_layout() {
        let grid: PolyMesh = build_grid(3, 2, 0.5).unwrap();

        assert_eq!(grid.num_vertices(), 12);
        assert_eq!(grid.num_faces(), 6);
        assert_eq!(grid.num_edges(), 17);
        assert_eq!(*grid.position(VertexId::new(5)), Point3::new(0.5, 0.5, 0.0));
        assert!((grid.surface_area() - 1.5).abs() < 1e-12);

        // The two interior vertices are the only ones off the boundary.
        assert_eq!(grid.boundary_vertices().len(), 10);
        assert_eq!(grid.vertex_degree(VertexId::new(5)), 4);
    }

    #[test]
    fn test_grid_rejects_bad_parameters() {
        assert!(build_grid::<u32>(0, 2, 1.0).is_err());
        assert!(build_grid::<u32>(2, 0, 1.0).is_err());
        assert!(build_grid::<u32>(2, 2, -1.0).is_err());
        assert!(build_grid::<u32>(2, 2, f64::NAN).is_err());
    }
}
