//! Core mesh data structures.
//!
//! This module provides the polygon mesh representation used by the
//! relaxation engine and the I/O layer.
//!
//! # Overview
//!
//! The primary type is [`PolyMesh`], a face-vertex mesh: a list of vertex
//! positions and a list of polygon faces, each an ordered list of vertex
//! keys. Edges are implied by consecutive corners of a face.
//!
//! Algorithms that walk neighborhoods repeatedly take an [`Adjacency`]
//! snapshot, which stays valid for as long as the topology is unchanged.
//!
//! # Keys
//!
//! Elements are identified by [`VertexId`] and [`FaceId`], generic over the
//! key integer ([`MeshIndex`]): `u16`, `u32` (default) or `u64`.
//!
//! # Construction
//!
//! ```
//! use tessera::mesh::{PolyMesh, build_from_polygons};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: PolyMesh = build_from_polygons(&vertices, &faces).unwrap();
//! ```

mod adjacency;
mod builder;
mod index;
mod polymesh;

pub use adjacency::Adjacency;
pub use builder::{build_from_polygons, build_from_triangles, build_grid, to_face_vertex};
pub use index::{FaceId, MeshIndex, VertexId};
pub use polymesh::{PolyMesh, AREA_EPSILON};

pub(crate) use polymesh::{polygon_area, polygon_centroid};
