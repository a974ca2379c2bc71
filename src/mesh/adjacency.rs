//! Frozen vertex adjacency tables.
//!
//! [`Adjacency`] records, for every vertex, its edge neighbors and incident
//! faces in compressed form (one offsets array plus one flat array per
//! relation). It is built once from a [`PolyMesh`] and stays valid as long as
//! the mesh topology does not change; moving vertices does not invalidate it.

use super::index::{FaceId, MeshIndex, VertexId};
use super::polymesh::PolyMesh;

/// Vertex-to-neighbor and vertex-to-face lookup tables.
#[derive(Debug, Clone)]
pub struct Adjacency<I: MeshIndex = u32> {
    neighbor_offsets: Vec<usize>,
    neighbors: Vec<VertexId<I>>,
    face_offsets: Vec<usize>,
    faces: Vec<FaceId<I>>,
}

impl<I: MeshIndex> Adjacency<I> {
    /// Build the tables for `mesh`.
    ///
    /// Corners naming vertices outside the mesh are skipped; callers that care
    /// should [`validate`](PolyMesh::validate) first.
    pub fn new(mesh: &PolyMesh<I>) -> Self {
        let n = mesh.num_vertices();
        let mut neighbor_lists: Vec<Vec<VertexId<I>>> = vec![Vec::new(); n];
        let mut face_lists: Vec<Vec<FaceId<I>>> = vec![Vec::new(); n];

        for f in mesh.face_ids() {
            for (a, b) in mesh.face_edges(f) {
                if a == b || !mesh.contains_vertex(a) || !mesh.contains_vertex(b) {
                    continue;
                }
                neighbor_lists[a.index()].push(b);
                neighbor_lists[b.index()].push(a);
            }
            for &v in mesh.face_vertices(f) {
                if mesh.contains_vertex(v) {
                    face_lists[v.index()].push(f);
                }
            }
        }

        let (neighbor_offsets, neighbors) = compress(neighbor_lists);
        let (face_offsets, faces) = compress(face_lists);

        Self {
            neighbor_offsets,
            neighbors,
            face_offsets,
            faces,
        }
    }

    /// Number of vertices covered.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.neighbor_offsets.len() - 1
    }

    /// Distinct edge neighbors of `v`, sorted by key.
    #[inline]
    pub fn neighbors(&self, v: VertexId<I>) -> &[VertexId<I>] {
        let i = v.index();
        &self.neighbors[self.neighbor_offsets[i]..self.neighbor_offsets[i + 1]]
    }

    /// Distinct faces incident to `v`, sorted by key.
    #[inline]
    pub fn faces(&self, v: VertexId<I>) -> &[FaceId<I>] {
        let i = v.index();
        &self.faces[self.face_offsets[i]..self.face_offsets[i + 1]]
    }

    /// Number of distinct neighbors of `v`.
    #[inline]
    pub fn degree(&self, v: VertexId<I>) -> usize {
        self.neighbors(v).len()
    }
}

/// Sort, dedup and flatten per-vertex lists.
fn compress<T: Ord + Copy>(lists: Vec<Vec<T>>) -> (Vec<usize>, Vec<T>) {
    let mut offsets = Vec::with_capacity(lists.len() + 1);
    let mut flat = Vec::with_capacity(lists.iter().map(Vec::len).sum());
    offsets.push(0);
    for mut list in lists {
        list.sort_unstable();
        list.dedup();
        flat.extend_from_slice(&list);
        offsets.push(flat.len());
    }
    (offsets, flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    /// A fan of four triangles around vertex 4.
    fn fan() -> PolyMesh {
        let mut mesh = PolyMesh::new();
        for p in [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [1.0, 1.0]] {
            mesh.add_vertex(Point3::new(p[0], p[1], 0.0));
        }
        for face in [[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]] {
            mesh.add_face(face.map(VertexId::new));
        }
        mesh
    }

    #[test]
    fn test_fan_center_sees_every_rim_vertex() {
        let mesh = fan();
        let adj = Adjacency::new(&mesh);
        let center = VertexId::new(4);

        assert_eq!(adj.num_vertices(), 5);
        assert_eq!(adj.degree(center), 4);
        assert_eq!(adj.faces(center).len(), 4);
        assert_eq!(adj.neighbors(center), mesh.vertex_neighbors(center).as_slice());
    }

    #[test]
    fn test_rim_vertex_neighbors_are_deduplicated() {
        let mesh = fan();
        let adj = Adjacency::new(&mesh);

        // Vertex 1 meets vertex 4 through two faces but counts it once.
        assert_eq!(
            adj.neighbors(VertexId::new(1)),
            &[VertexId::new(0), VertexId::new(2), VertexId::new(4)]
        );
        assert_eq!(adj.faces(VertexId::new(1)), &[FaceId::new(0), FaceId::new(1)]);
    }

    #[test]
    fn test_dangling_corners_are_skipped() {
        let mut mesh = fan();
        let lonely = mesh.add_vertex(Point3::new(9.0, 9.0, 0.0));
        mesh.add_face([0, 1, 42].map(VertexId::new));

        let adj = Adjacency::new(&mesh);
        assert!(adj.neighbors(lonely).is_empty());
        assert!(adj.faces(lonely).is_empty());
        // The bogus face still registers on its real corners.
        assert_eq!(adj.faces(VertexId::new(0)).len(), 3);
    }
}
