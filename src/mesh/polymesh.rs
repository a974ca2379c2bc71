//! Face-vertex polygon mesh.
//!
//! [`PolyMesh`] stores vertex positions and polygon faces as ordered lists of
//! vertex keys. Edges are implied by consecutive corners of each face
//! (cyclically). Faces may have any number of corners; triangles and quads
//! are just the common cases.
//!
//! Neighbor queries on [`PolyMesh`] scan the face list. Algorithms that ask
//! many of them should freeze an [`Adjacency`](super::Adjacency) once instead.

use std::collections::{BTreeSet, HashMap};

use nalgebra::{Point3, Vector3};

use super::index::{FaceId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Faces with an area at or below this are treated as degenerate.
pub const AREA_EPSILON: f64 = 1e-12;

/// A polygon mesh in face-vertex form.
#[derive(Debug, Clone)]
pub struct PolyMesh<I: MeshIndex = u32> {
    pub(crate) positions: Vec<Point3<f64>>,
    pub(crate) faces: Vec<Vec<VertexId<I>>>,
}

impl<I: MeshIndex> Default for PolyMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> PolyMesh<I> {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create an empty mesh with room for the given number of elements.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        Self {
            positions: Vec::with_capacity(num_vertices),
            faces: Vec::with_capacity(num_faces),
        }
    }

    // ==================== Accessors ====================

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of distinct undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edges().len()
    }

    /// Whether `v` names a vertex of this mesh.
    #[inline]
    pub fn contains_vertex(&self, v: VertexId<I>) -> bool {
        v.index() < self.positions.len()
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// Move a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.positions[v.index()] = pos;
    }

    /// All vertex positions, indexed by vertex key.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Corners of a face, in order.
    #[inline]
    pub fn face_vertices(&self, f: FaceId<I>) -> &[VertexId<I>] {
        &self.faces[f.index()]
    }

    /// Iterate over all vertex keys.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Iterate over all face keys.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over the directed edges of a face, closing the loop.
    pub fn face_edges(
        &self,
        f: FaceId<I>,
    ) -> impl Iterator<Item = (VertexId<I>, VertexId<I>)> + '_ {
        let corners = self.face_vertices(f);
        let n = corners.len();
        (0..n).map(move |i| (corners[i], corners[(i + 1) % n]))
    }

    // ==================== Topology Queries ====================

    /// All undirected edges, each once as `(low, high)`, sorted.
    pub fn edges(&self) -> Vec<(VertexId<I>, VertexId<I>)> {
        let mut edges = BTreeSet::new();
        for f in self.face_ids() {
            for (a, b) in self.face_edges(f) {
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
        edges.into_iter().collect()
    }

    /// Vertices sharing an edge with `v`, sorted and without repeats.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> Vec<VertexId<I>> {
        let mut neighbors = BTreeSet::new();
        for f in self.face_ids() {
            for (a, b) in self.face_edges(f) {
                if a == v && b != v {
                    neighbors.insert(b);
                } else if b == v && a != v {
                    neighbors.insert(a);
                }
            }
        }
        neighbors.into_iter().collect()
    }

    /// Faces that have `v` as a corner.
    pub fn vertex_faces(&self, v: VertexId<I>) -> Vec<FaceId<I>> {
        self.face_ids()
            .filter(|&f| self.face_vertices(f).contains(&v))
            .collect()
    }

    /// Number of distinct neighbors of `v`.
    pub fn vertex_degree(&self, v: VertexId<I>) -> usize {
        self.vertex_neighbors(v).len()
    }

    /// Vertices on an edge that belongs to exactly one face, sorted.
    pub fn boundary_vertices(&self) -> Vec<VertexId<I>> {
        let mut uses: HashMap<(VertexId<I>, VertexId<I>), usize> = HashMap::new();
        for f in self.face_ids() {
            for (a, b) in self.face_edges(f) {
                if a != b {
                    *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
                }
            }
        }

        let boundary: BTreeSet<VertexId<I>> = uses
            .into_iter()
            .filter(|&(_, count)| count == 1)
            .flat_map(|((a, b), _)| [a, b])
            .collect();
        boundary.into_iter().collect()
    }

    /// Whether `v` lies on the mesh boundary.
    ///
    /// Computes the whole boundary; collect [`boundary_vertices`](Self::boundary_vertices)
    /// once when testing many vertices.
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        self.boundary_vertices().binary_search(&v).is_ok()
    }

    // ==================== Geometry ====================

    /// Mean of the corner positions of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        polygon_centroid(&self.positions, self.face_vertices(f))
    }

    /// Area of a face, as the triangle fan about its centroid.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        polygon_area(&self.positions, self.face_vertices(f))
    }

    /// Unit normal of a face, or zero for a degenerate face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let n = polygon_normal(&self.positions, self.face_vertices(f));
        let len = n.norm();
        if len > AREA_EPSILON {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Total area of all faces.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Distance between two vertices.
    pub fn edge_length(&self, a: VertexId<I>, b: VertexId<I>) -> f64 {
        (self.position(b) - self.position(a)).norm()
    }

    /// Mean length over all distinct edges, or 0 without edges.
    pub fn average_edge_length(&self) -> f64 {
        let edges = self.edges();
        if edges.is_empty() {
            return 0.0;
        }
        let total: f64 = edges.iter().map(|&(a, b)| self.edge_length(a, b)).sum();
        total / edges.len() as f64
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let (mut min, mut max) = (first, first);
        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }

    // ==================== Construction ====================

    /// Add a vertex and return its key.
    ///
    /// Keys beyond the range of `I` are not unique; such a mesh fails
    /// [`check_references`](Self::check_references).
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.positions.len());
        self.positions.push(position);
        id
    }

    /// Add a face and return its key.
    ///
    /// The corners are stored as given. Use [`validate`](Self::validate) or
    /// build through [`build_from_polygons`](super::build_from_polygons) to
    /// reject keys the mesh does not own.
    pub fn add_face<K>(&mut self, corners: K) -> FaceId<I>
    where
        K: IntoIterator<Item = VertexId<I>>,
    {
        let id = FaceId::new(self.faces.len());
        self.faces.push(corners.into_iter().collect());
        id
    }

    // ==================== Validation ====================

    /// Check that every element has its own key and that every face corner
    /// names an existing vertex.
    ///
    /// A mesh grown with [`add_vertex`](Self::add_vertex) past the range of
    /// `I` is reported as [`MeshError::InvalidParameter`]. Otherwise the
    /// first offending corner in face order is reported as
    /// [`MeshError::InvalidMesh`].
    pub fn check_references(&self) -> Result<()> {
        check_key_range::<I>("vertices", self.positions.len())?;
        check_key_range::<I>("faces", self.faces.len())?;

        for f in self.face_ids() {
            let corners = self.face_vertices(f);
            if let Some(&bad) = corners.iter().find(|&&v| !self.contains_vertex(v)) {
                return Err(MeshError::InvalidMesh {
                    face: f.index(),
                    vertex: bad.index(),
                });
            }
        }
        Ok(())
    }

    /// Check references (see [`check_references`](Self::check_references)) and
    /// that every face has at least three corners.
    pub fn validate(&self) -> Result<()> {
        self.check_references()?;
        match self.faces.iter().position(|corners| corners.len() < 3) {
            Some(face) => Err(MeshError::DegenerateFace { face }),
            None => Ok(()),
        }
    }

    /// Whether [`validate`](Self::validate) succeeds.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// `count` elements need keys `0..count`, all of which must fit in `I`.
pub(crate) fn check_key_range<I: MeshIndex>(name: &'static str, count: usize) -> Result<()> {
    match count.checked_sub(1) {
        Some(last) if I::try_from_usize(last).is_none() => Err(MeshError::invalid_param(
            name,
            count,
            "too many elements for the key type",
        )),
        _ => Ok(()),
    }
}

/// Mean of the positions of `corners`.
pub(crate) fn polygon_centroid<I: MeshIndex>(
    positions: &[Point3<f64>],
    corners: &[VertexId<I>],
) -> Point3<f64> {
    let sum: Vector3<f64> = corners.iter().map(|v| positions[v.index()].coords).sum();
    Point3::from(sum / corners.len().max(1) as f64)
}

/// Area-weighted normal (unnormalized) of the fan about the centroid.
pub(crate) fn polygon_normal<I: MeshIndex>(
    positions: &[Point3<f64>],
    corners: &[VertexId<I>],
) -> Vector3<f64> {
    let o = polygon_centroid(positions, corners);
    let n = corners.len();
    (0..n)
        .map(|i| {
            let a = positions[corners[i].index()] - o;
            let b = positions[corners[(i + 1) % n].index()] - o;
            a.cross(&b)
        })
        .sum::<Vector3<f64>>()
        * 0.5
}

/// Area of the triangle fan about the centroid of `corners`.
///
/// Each fan triangle contributes its unsigned area, so non-planar and
/// non-convex polygons still get a positive, well-defined value.
pub(crate) fn polygon_area<I: MeshIndex>(
    positions: &[Point3<f64>],
    corners: &[VertexId<I>],
) -> f64 {
    let o = polygon_centroid(positions, corners);
    let n = corners.len();
    (0..n)
        .map(|i| {
            let a = positions[corners[i].index()] - o;
            let b = positions[corners[(i + 1) % n].index()] - o;
            0.5 * a.cross(&b).norm()
        })
        .sum()
}
