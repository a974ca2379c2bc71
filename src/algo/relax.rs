//! Mesh relaxation.
//!
//! Relaxation repeatedly moves every free vertex of a [`PolyMesh`] to a
//! local geometric target while a set of fixed vertices stays put. Two
//! targets are available (see [`Strategy`]):
//!
//! - [`Strategy::Centroid`]: the mean of the vertex's edge neighbors
//!   (umbrella weighting).
//! - [`Strategy::AreaCentroid`]: the mean of the centroids of the incident
//!   faces, each weighted by its area.
//!
//! Every sweep is synchronous: all targets are computed from the positions
//! as they were at the start of the sweep, then written together. The order
//! in which vertices are visited therefore never matters, and the sweep can
//! run on the rayon pool without changing the result.
//!
//! After each sweep an optional callback sees the mesh through an
//! [`IterationContext`]. It may move vertices (for example to pull them back
//! onto a guide surface, see [`constraint`](super::constraint)) and its
//! changes are what the next sweep reads. Returning
//! [`ControlFlow::Break`] ends the run with
//! [`MeshError::RelaxationCancelled`].
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use tessera::prelude::*;
//! use tessera::algo::relax::{relax, RelaxOptions, Strategy};
//! use nalgebra::Point3;
//!
//! let mut mesh: PolyMesh = build_grid(2, 2, 1.0).unwrap();
//! let center = VertexId::new(4);
//! mesh.set_position(center, Point3::new(1.0, 1.0, 0.5));
//!
//! let fixed: HashSet<VertexId> = mesh.boundary_vertices().into_iter().collect();
//! let options = RelaxOptions::default()
//!     .with_iterations(10)
//!     .with_strategy(Strategy::Centroid);
//! let report = relax(&mut mesh, &fixed, &options).unwrap();
//!
//! assert_eq!(report.iterations, 10);
//! assert!(mesh.position(center).z.abs() < 1e-12);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use log::{debug, trace, warn};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::mesh::{
    polygon_area, polygon_centroid, Adjacency, MeshIndex, PolyMesh, VertexId, AREA_EPSILON,
};

/// Where a free vertex moves during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Mean position of the distinct edge neighbors.
    #[default]
    Centroid,
    /// Area-weighted mean of the centroids of the incident faces.
    ///
    /// Faces with (near) zero area carry no weight. A vertex whose incident
    /// faces are all degenerate stays where it is.
    AreaCentroid,
}

impl Strategy {
    /// All strategies.
    pub const ALL: [Strategy; 2] = [Strategy::Centroid, Strategy::AreaCentroid];

    /// Short name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Centroid => "centroid",
            Strategy::AreaCentroid => "area",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "centroid" | "umbrella" => Ok(Strategy::Centroid),
            "area" | "area-centroid" => Ok(Strategy::AreaCentroid),
            _ => Err(MeshError::invalid_param(
                "strategy",
                s,
                "expected `centroid` or `area`",
            )),
        }
    }
}

/// Options for [`relax`] and [`relax_with`].
#[derive(Debug, Clone)]
pub struct RelaxOptions {
    /// Maximum number of sweeps (`kmax`).
    pub iterations: usize,

    /// Target each free vertex moves to.
    pub strategy: Strategy,

    /// Stop early once no vertex moved more than this in a sweep.
    /// `None` (the default) always runs all iterations.
    pub tolerance: Option<f64>,

    /// Whether to compute sweeps on the rayon pool (default: true).
    pub parallel: bool,
}

impl Default for RelaxOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            strategy: Strategy::Centroid,
            tolerance: None,
            parallel: true,
        }
    }
}

impl RelaxOptions {
    /// Set the number of sweeps.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable early stopping below the given displacement.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    fn check(&self) -> Result<()> {
        match self.tolerance {
            Some(tol) if !(tol.is_finite() && tol >= 0.0) => Err(MeshError::invalid_param(
                "tolerance",
                tol,
                "must be finite and non-negative",
            )),
            _ => Ok(()),
        }
    }
}

/// Outcome of a completed relaxation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxReport {
    /// Sweeps performed.
    pub iterations: usize,
    /// Largest vertex displacement of the last sweep (0 if none ran).
    pub max_displacement: f64,
    /// Whether the run stopped early on the tolerance.
    pub converged: bool,
}

/// View of the mesh handed to the iteration callback.
///
/// Positions may be read and written; topology is read-only.
pub struct IterationContext<'a, I: MeshIndex = u32> {
    pub(crate) iteration: usize,
    pub(crate) iterations: usize,
    pub(crate) max_displacement: f64,
    pub(crate) mesh: &'a mut PolyMesh<I>,
    pub(crate) fixed: &'a [bool],
}

impl<'a, I: MeshIndex> IterationContext<'a, I> {
    /// 1-based index of the sweep that just finished.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Sweep budget of the run.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Largest displacement caused by the sweep itself.
    #[inline]
    pub fn max_displacement(&self) -> f64 {
        self.max_displacement
    }

    /// The mesh, read-only.
    #[inline]
    pub fn mesh(&self) -> &PolyMesh<I> {
        self.mesh
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        self.mesh.position(v)
    }

    /// Move a vertex. Fixed vertices may be moved too; the engine itself
    /// never does.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.mesh.set_position(v, pos);
    }

    /// Whether `v` is in the fixed set of this run.
    #[inline]
    pub fn is_fixed(&self, v: VertexId<I>) -> bool {
        self.fixed.get(v.index()).copied().unwrap_or(false)
    }

    /// Keys of all vertices the engine is allowed to move.
    pub fn free_vertices(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.fixed
            .iter()
            .enumerate()
            .filter(|&(_, &fixed)| !fixed)
            .map(|(i, _)| VertexId::new(i))
    }
}

impl<I: MeshIndex> fmt::Debug for IterationContext<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationContext")
            .field("iteration", &self.iteration)
            .field("iterations", &self.iterations)
            .field("max_displacement", &self.max_displacement)
            .finish_non_exhaustive()
    }
}

/// Relax `mesh` without a callback.
///
/// See [`relax_with`].
pub fn relax<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    fixed: &HashSet<VertexId<I>>,
    options: &RelaxOptions,
) -> Result<RelaxReport> {
    relax_with(mesh, fixed, options, |_| ControlFlow::Continue(()))
}

/// Relax `mesh`, calling `callback` after every sweep.
///
/// # Arguments
///
/// * `mesh` - The mesh to relax (positions modified in place, topology kept)
/// * `fixed` - Vertices that never move; keys not in the mesh are ignored
/// * `options` - Sweep count, strategy, optional tolerance
/// * `callback` - Runs after each sweep, may move vertices or stop the run
///
/// # Errors
///
/// * [`MeshError::InvalidMesh`] if a face references a missing vertex. This
///   is checked before anything moves, so the mesh is left untouched.
/// * [`MeshError::InvalidParameter`] for a negative or non-finite tolerance.
/// * [`MeshError::RelaxationCancelled`] if the callback breaks. The sweep it
///   was called for, and its own edits, stay applied.
///
/// # Algorithm
///
/// For each sweep:
/// 1. Compute the target of every free vertex from the current positions
/// 2. Write all targets at once; vertices without neighbors (or without
///    non-degenerate faces under [`Strategy::AreaCentroid`]) stay put
/// 3. Hand the mesh to `callback`
pub fn relax_with<I, F>(
    mesh: &mut PolyMesh<I>,
    fixed: &HashSet<VertexId<I>>,
    options: &RelaxOptions,
    mut callback: F,
) -> Result<RelaxReport>
where
    I: MeshIndex,
    F: FnMut(&mut IterationContext<'_, I>) -> ControlFlow<()>,
{
    options.check()?;
    mesh.check_references()?;

    let mut report = RelaxReport {
        iterations: 0,
        max_displacement: 0.0,
        converged: false,
    };
    if options.iterations == 0 {
        return Ok(report);
    }

    let num_vertices = mesh.num_vertices();
    let mut fixed_mask = vec![false; num_vertices];
    let mut ignored = 0;
    for &v in fixed {
        match fixed_mask.get_mut(v.index()) {
            Some(slot) => *slot = true,
            None => ignored += 1,
        }
    }
    if ignored > 0 {
        warn!("ignoring {} fixed keys that are not in the mesh", ignored);
    }

    let free: Vec<VertexId<I>> = (0..num_vertices)
        .filter(|&i| !fixed_mask[i])
        .map(VertexId::new)
        .collect();
    let adjacency = Adjacency::new(mesh);

    debug!(
        "relaxing {} of {} vertices: {} strategy, up to {} iterations",
        free.len(),
        num_vertices,
        options.strategy,
        options.iterations
    );

    for k in 1..=options.iterations {
        let updates = compute_sweep(mesh, &adjacency, &free, options.strategy, options.parallel);

        let mut max_displacement = 0.0_f64;
        for (v, target) in updates {
            let moved = (target - mesh.position(v)).norm();
            max_displacement = max_displacement.max(moved);
            mesh.set_position(v, target);
        }
        trace!("iteration {}: max displacement {:.3e}", k, max_displacement);

        report.iterations = k;
        report.max_displacement = max_displacement;
        let converged = options.tolerance.is_some_and(|tol| max_displacement <= tol);

        let mut ctx = IterationContext {
            iteration: k,
            iterations: options.iterations,
            max_displacement,
            mesh: &mut *mesh,
            fixed: &fixed_mask,
        };
        if callback(&mut ctx).is_break() {
            debug!("relaxation cancelled by callback after iteration {}", k);
            return Err(MeshError::RelaxationCancelled { iteration: k });
        }

        if converged {
            debug!("relaxation converged after {} iterations", k);
            report.converged = true;
            break;
        }
    }

    Ok(report)
}

/// Relax with [`Strategy::Centroid`] for `kmax` sweeps.
pub fn smooth_centroid<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    fixed: &HashSet<VertexId<I>>,
    kmax: usize,
) -> Result<RelaxReport> {
    let options = RelaxOptions::default()
        .with_iterations(kmax)
        .with_strategy(Strategy::Centroid);
    relax(mesh, fixed, &options)
}

/// Relax with [`Strategy::AreaCentroid`] for `kmax` sweeps.
pub fn smooth_area<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    fixed: &HashSet<VertexId<I>>,
    kmax: usize,
) -> Result<RelaxReport> {
    let options = RelaxOptions::default()
        .with_iterations(kmax)
        .with_strategy(Strategy::AreaCentroid);
    relax(mesh, fixed, &options)
}

/// Centroid and area of one face, sampled at the start of a sweep.
#[derive(Debug, Clone, Copy)]
struct FaceSample {
    centroid: Point3<f64>,
    area: f64,
}

/// Targets of all free vertices that have one, from the current positions.
fn compute_sweep<I: MeshIndex>(
    mesh: &PolyMesh<I>,
    adjacency: &Adjacency<I>,
    free: &[VertexId<I>],
    strategy: Strategy,
    parallel: bool,
) -> Vec<(VertexId<I>, Point3<f64>)> {
    let positions = mesh.positions();

    match strategy {
        Strategy::Centroid => {
            let target = |&v: &VertexId<I>| centroid_target(positions, adjacency, v).map(|p| (v, p));
            if parallel {
                free.par_iter().filter_map(target).collect()
            } else {
                free.iter().filter_map(target).collect()
            }
        }
        Strategy::AreaCentroid => {
            let sample = |corners: &Vec<VertexId<I>>| FaceSample {
                centroid: polygon_centroid(positions, corners),
                area: polygon_area(positions, corners),
            };
            let samples: Vec<FaceSample> = if parallel {
                mesh.faces.par_iter().map(sample).collect()
            } else {
                mesh.faces.iter().map(sample).collect()
            };

            let target =
                |&v: &VertexId<I>| area_centroid_target(&samples, adjacency, v).map(|p| (v, p));
            if parallel {
                free.par_iter().filter_map(target).collect()
            } else {
                free.iter().filter_map(target).collect()
            }
        }
    }
}

/// Mean of the neighbor positions, or `None` for an isolated vertex.
fn centroid_target<I: MeshIndex>(
    positions: &[Point3<f64>],
    adjacency: &Adjacency<I>,
    v: VertexId<I>,
) -> Option<Point3<f64>> {
    let neighbors = adjacency.neighbors(v);
    if neighbors.is_empty() {
        return None;
    }
    let sum: Vector3<f64> = neighbors.iter().map(|n| positions[n.index()].coords).sum();
    Some(Point3::from(sum / neighbors.len() as f64))
}

/// Area-weighted mean of incident face centroids, or `None` when the vertex
/// has no face with positive area.
fn area_centroid_target<I: MeshIndex>(
    samples: &[FaceSample],
    adjacency: &Adjacency<I>,
    v: VertexId<I>,
) -> Option<Point3<f64>> {
    let mut weighted = Vector3::zeros();
    let mut total = 0.0;
    for f in adjacency.faces(v) {
        let FaceSample { centroid, area } = samples[f.index()];
        if area <= AREA_EPSILON {
            continue;
        }
        weighted += centroid.coords * area;
        total += area;
    }
    if total <= AREA_EPSILON {
        return None;
    }
    Some(Point3::from(weighted / total))
}
