//! # Tessera
//!
//! Polygon mesh relaxation.
//!
//! Tessera moves the free vertices of a polygon mesh toward a local
//! geometric target, sweep after sweep, while a chosen set of vertices stays
//! fixed. It is the smoothing step of form-finding and remeshing workflows:
//! flatten a perturbed patch, even out a triangulation, or relax a mesh onto
//! a guide surface.
//!
//! ## Features
//!
//! - **Polygon meshes**: faces with any number of corners, typed vertex and
//!   face keys over 16-, 32- or 64-bit integers
//! - **Two relaxation targets**: neighbor centroid and area-weighted face
//!   centroid
//! - **Synchronous sweeps**: results do not depend on vertex order, and
//!   sweeps run on rayon without changing them
//! - **Callbacks**: observe, constrain or cancel after every sweep
//! - **File formats**: OBJ and PLY
//!
//! ## Quick Start
//!
//! ```
//! use std::collections::HashSet;
//! use tessera::prelude::*;
//! use nalgebra::Point3;
//!
//! // A 2x2 quad grid whose center vertex was lifted off the plane
//! let mut mesh: PolyMesh = build_grid(2, 2, 1.0).unwrap();
//! let center = VertexId::new(4);
//! mesh.set_position(center, Point3::new(1.2, 0.9, 0.7));
//!
//! // Keep the rim where it is and relax the rest
//! let fixed: HashSet<VertexId> = mesh.boundary_vertices().into_iter().collect();
//! let options = RelaxOptions::default()
//!     .with_iterations(20)
//!     .with_strategy(Strategy::AreaCentroid);
//! relax(&mut mesh, &fixed, &options).unwrap();
//!
//! assert!((mesh.position(center) - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-6);
//! ```
//!
//! ## Loading and Saving
//!
//! ```no_run
//! use tessera::prelude::*;
//!
//! let mesh: PolyMesh = tessera::io::load("patch.obj").unwrap();
//! println!("Vertices: {}", mesh.num_vertices());
//! println!("Faces: {}", mesh.num_faces());
//! tessera::io::save(&mesh, "patch.ply").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{
        relax, relax_with, IterationContext, RelaxOptions, RelaxReport, Strategy,
    };
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, build_grid, Adjacency, FaceId, MeshIndex,
        PolyMesh, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
