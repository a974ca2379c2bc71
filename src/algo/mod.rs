//! Mesh processing algorithms.
//!
//! - **Relaxation**: centroid and area-weighted vertex relaxation with fixed
//!   vertices and per-iteration callbacks ([`relax`])
//! - **Constraints**: guide surfaces callbacks can project onto
//!   ([`constraint`])

pub mod constraint;
pub mod relax;

pub use constraint::{project_onto, Constraint, Plane, Sphere};
pub use relax::{
    relax, relax_with, smooth_area, smooth_centroid, IterationContext, RelaxOptions, RelaxReport,
    Strategy,
};
