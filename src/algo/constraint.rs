//! Guide surfaces for constrained relaxation.
//!
//! A [`Constraint`] maps a point to the closest admissible point. Relaxation
//! callbacks use it to pull free vertices back onto a target surface after
//! every sweep:
//!
//! ```
//! use std::collections::HashSet;
//! use tessera::prelude::*;
//! use tessera::algo::constraint::{project_onto, Plane};
//! use tessera::algo::relax::{relax_with, RelaxOptions};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut mesh: PolyMesh = build_grid(3, 3, 1.0).unwrap();
//! mesh.set_position(VertexId::new(5), Point3::new(1.0, 1.0, 2.0));
//! let fixed: HashSet<VertexId> = mesh.boundary_vertices().into_iter().collect();
//!
//! let plane = Plane::new(Point3::new(0.0, 0.0, 0.25), Vector3::z());
//! let options = RelaxOptions::default().with_iterations(5);
//! relax_with(&mut mesh, &fixed, &options, project_onto(plane)).unwrap();
//!
//! assert!((mesh.position(VertexId::new(5)).z - 0.25).abs() < 1e-12);
//! ```

use std::ops::ControlFlow;

use nalgebra::{Point3, Unit, Vector3};

use super::relax::IterationContext;
use crate::mesh::MeshIndex;

/// A surface points can be projected onto.
pub trait Constraint: Send + Sync {
    /// Closest point on the surface to `p`.
    fn project(&self, p: &Point3<f64>) -> Point3<f64>;
}

impl<C: Constraint + ?Sized> Constraint for &C {
    fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        (**self).project(p)
    }
}

impl<C: Constraint + ?Sized> Constraint for Box<C> {
    fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        (**self).project(p)
    }
}

/// An infinite plane through `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3<f64>,
    /// Unit normal.
    pub normal: Unit<Vector3<f64>>,
}

impl Plane {
    /// Plane through `origin` with the given normal (normalized here).
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            origin,
            normal: Unit::new_normalize(normal),
        }
    }

    /// The horizontal plane `z = height`.
    pub fn horizontal(height: f64) -> Self {
        Self::new(Point3::new(0.0, 0.0, height), Vector3::z())
    }

    /// Signed distance from the plane along its normal.
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&(p - self.origin))
    }
}

impl Constraint for Plane {
    fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        p - self.normal.into_inner() * self.signed_distance(p)
    }
}

/// A sphere surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center.
    pub center: Point3<f64>,
    /// Radius.
    pub radius: f64,
}

impl Sphere {
    /// Sphere with the given center and radius.
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Constraint for Sphere {
    /// Radial projection. The center has no closest point and is returned
    /// unchanged.
    fn project(&self, p: &Point3<f64>) -> Point3<f64> {
        let d = p - self.center;
        let len = d.norm();
        if len <= f64::EPSILON {
            return *p;
        }
        self.center + d * (self.radius / len)
    }
}

impl<'a, I: MeshIndex> IterationContext<'a, I> {
    /// Project every free vertex onto `constraint`.
    ///
    /// Returns the largest distance a vertex was moved.
    pub fn project_free<C: Constraint + ?Sized>(&mut self, constraint: &C) -> f64 {
        let free: Vec<_> = self.free_vertices().collect();
        let mut max_correction = 0.0_f64;
        for v in free {
            let p = *self.position(v);
            let q = constraint.project(&p);
            max_correction = max_correction.max((q - p).norm());
            self.set_position(v, q);
        }
        max_correction
    }
}

/// Callback for [`relax_with`](super::relax::relax_with) that projects the
/// free vertices onto `constraint` after every sweep.
pub fn project_onto<I, C>(
    constraint: C,
) -> impl FnMut(&mut IterationContext<'_, I>) -> ControlFlow<()>
where
    I: MeshIndex,
    C: Constraint,
{
    move |ctx| {
        ctx.project_free(&constraint);
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::relax::{relax_with, RelaxOptions, Strategy};
    use crate::mesh::{build_grid, PolyMesh, VertexId};
    use std::collections::HashSet;

    #[test]
    fn test_plane_projection() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 3.0));
        let q = plane.project(&Point3::new(2.0, -1.0, 5.0));
        assert!((q - Point3::new(2.0, -1.0, 1.0)).norm() < 1e-12);
        assert!((plane.signed_distance(&Point3::new(0.0, 0.0, -1.0)) + 2.0).abs() < 1e-12);
        assert_eq!(Plane::horizontal(1.0), plane);
    }

    #[test]
    fn test_tilted_plane_projection_lands_on_plane() {
        let plane = Plane::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 1.0));
        let q = plane.project(&Point3::new(-4.0, 0.5, 9.0));
        assert!(plane.signed_distance(&q).abs() < 1e-12);
    }

    #[test]
    fn test_sphere_projection() {
        let sphere = Sphere::new(Point3::new(1.0, 0.0, 0.0), 2.0);
        let q = sphere.project(&Point3::new(1.0, 0.0, 5.0));
        assert!((q - Point3::new(1.0, 0.0, 2.0)).norm() < 1e-12);
        assert_eq!(sphere.project(&sphere.center), sphere.center);
    }

    #[test]
    fn test_callback_keeps_free_vertices_on_plane() {
        let mut mesh: PolyMesh = build_grid(4, 4, 1.0).unwrap();
        for v in [6, 12, 18] {
            let p = *mesh.position(VertexId::new(v));
            mesh.set_position(VertexId::new(v), Point3::new(p.x, p.y, 3.0));
        }
        let fixed: HashSet<VertexId> = mesh.boundary_vertices().into_iter().collect();
        let plane = Plane::horizontal(-0.5);

        for strategy in Strategy::ALL {
            let mut mesh = mesh.clone();
            let options = RelaxOptions::default()
                .with_iterations(3)
                .with_strategy(strategy);
            relax_with(&mut mesh, &fixed, &options, project_onto(plane)).unwrap();

            for v in mesh.vertex_ids() {
                let z = mesh.position(v).z;
                if fixed.contains(&v) {
                    assert_eq!(z, 0.0);
                } else {
                    assert!((z + 0.5).abs() < 1e-12, "{} left the plane: z = {}", v, z);
                }
            }
        }
    }

    #[test]
    fn test_project_free_reports_correction() {
        let mut mesh: PolyMesh = build_grid(2, 2, 1.0).unwrap();
        let fixed: HashSet<VertexId> = mesh.boundary_vertices().into_iter().collect();
        let sphere: Box<dyn Constraint> = Box::new(Sphere::new(Point3::new(1.0, 1.0, -1.0), 2.0));
        let mut corrections = Vec::new();

        let options = RelaxOptions::default().with_iterations(2);
        relax_with(&mut mesh, &fixed, &options, |ctx| {
            corrections.push(ctx.project_free(&sphere));
            ControlFlow::Continue(())
        })
        .unwrap();

        // Each sweep flattens the center to z = 0 and the projection lifts
        // it back to z = 1.
        assert_eq!(corrections.len(), 2);
        assert!(corrections.iter().all(|c| (c - 1.0).abs() < 1e-12));
        assert!((mesh.position(VertexId::new(4)).z - 1.0).abs() < 1e-12);
    }
}
