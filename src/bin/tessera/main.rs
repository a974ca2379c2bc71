//! Tessera CLI - mesh relaxation command-line tool.
//!
//! Usage: tessera <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `tessera --help` for available commands. Set `RUST_LOG=debug` to see
//! per-run details, `RUST_LOG=trace` for per-sweep displacements.

use std::collections::HashSet;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use nalgebra::Point3;

use tessera::algo::{relax_with, Plane, RelaxOptions, Strategy};
use tessera::io;
use tessera::mesh::{build_grid, MeshIndex, PolyMesh, VertexId};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Polygon mesh relaxation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Relax the free vertices of a mesh
    Relax {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Relaxation target
        #[arg(short, long, value_enum, default_value = "centroid")]
        strategy: StrategyArg,

        /// Number of sweeps
        #[arg(short = 'k', long, default_value = "10")]
        iterations: usize,

        /// Stop early once no vertex moves farther than this in one sweep
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// Allow boundary vertices to move
        #[arg(long)]
        move_boundary: bool,

        /// Additional vertex keys to keep fixed (0-based)
        #[arg(long = "fix", value_name = "KEY")]
        fix: Vec<usize>,

        /// Project free vertices onto the plane z = Z after every sweep
        #[arg(long, value_name = "Z")]
        plane_z: Option<f64>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Write a quad grid with its interior lifted off the plane
    Grid {
        /// Output mesh file
        output: PathBuf,

        /// Cells along x
        #[arg(long, default_value = "8")]
        nx: usize,

        /// Cells along y
        #[arg(long, default_value = "8")]
        ny: usize,

        /// Cell size
        #[arg(long, default_value = "1.0")]
        spacing: f64,

        /// Height of the interior lift, as a fraction of the spacing
        #[arg(long, default_value = "0.25")]
        jitter: f64,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Mean of the edge neighbors
    Centroid,
    /// Area-weighted mean of the incident face centroids
    Area,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Centroid => Strategy::Centroid,
            StrategyArg::Area => Strategy::AreaCentroid,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Relax {
            input,
            output,
            strategy,
            iterations,
            tolerance,
            move_boundary,
            fix,
            plane_z,
            sequential,
        } => {
            let mut options = RelaxOptions::default()
                .with_iterations(iterations)
                .with_strategy(strategy.into())
                .with_parallel(!sequential);
            if let Some(tol) = tolerance {
                options = options.with_tolerance(tol);
            }
            cmd_relax(&input, &output, &options, move_boundary, &fix, plane_z)?;
        }

        Commands::Grid {
            output,
            nx,
            ny,
            spacing,
            jitter,
        } => {
            cmd_grid(&output, nx, ny, spacing, jitter)?;
        }
    }

    Ok(())
}

/// Draw a progress bar on stderr for sweep `current` of `total`.
///
/// Only redraws when the percentage changes.
fn draw_progress(current: usize, total: usize, last_percent: &mut Option<usize>, message: &str) {
    if total == 0 {
        return;
    }

    let percent = if current >= total {
        100
    } else {
        ((current * 100) + (total / 2)) / total
    };
    if *last_percent == Some(percent) && current < total {
        return;
    }
    *last_percent = Some(percent);

    let bar_width = 30;
    let filled = (percent * bar_width) / 100;
    let bar = "=".repeat(filled);
    let space = " ".repeat(bar_width - filled);

    eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
    let _ = std::io::stderr().flush();
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: PolyMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.num_edges());

    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for fid in mesh.face_ids() {
        let area = mesh.face_area(fid);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }

    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    println!("Average edge length: {:.6}", mesh.average_edge_length());

    let mut arities: Vec<usize> = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).len())
        .collect();
    arities.sort_unstable();
    arities.dedup();
    match arities.as_slice() {
        [3] => println!("Mesh type: Triangle mesh"),
        [4] => println!("Mesh type: Quad mesh"),
        _ => println!("Mesh type: Mixed polygon mesh"),
    }

    let boundary = mesh.boundary_vertices();
    if boundary.is_empty() {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary.len());
    }

    let isolated = mesh
        .vertex_ids()
        .filter(|&v| mesh.vertex_degree(v) == 0)
        .count();
    if isolated > 0 {
        println!("Isolated vertices: {}", isolated);
    }

    Ok(())
}

/// The boundary (unless it may move) plus the `--fix` keys.
///
/// Keys past the mesh are kept, since relaxation ignores them; keys that do
/// not fit a vertex key at all are dropped.
fn fixed_vertices(mesh: &PolyMesh, move_boundary: bool, fix: &[usize]) -> HashSet<VertexId> {
    let mut fixed: HashSet<VertexId> = if move_boundary {
        HashSet::new()
    } else {
        mesh.boundary_vertices().into_iter().collect()
    };
    for &key in fix {
        if u32::try_from_usize(key).is_none() {
            warn!("--fix {} is out of the vertex key range, skipped", key);
            continue;
        }
        if key >= mesh.num_vertices() {
            warn!("--fix {} is not a vertex of the mesh", key);
        }
        fixed.insert(VertexId::new(key));
    }
    fixed
}

fn cmd_relax(
    input: &Path,
    output: &Path,
    options: &RelaxOptions,
    move_boundary: bool,
    fix: &[usize],
    plane_z: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: PolyMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let fixed = fixed_vertices(&mesh, move_boundary, fix);
    info!("{} vertices fixed", fixed.len());

    let plane = plane_z.map(Plane::horizontal);
    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Applying {} relaxation ({} iterations, {})...",
        options.strategy, options.iterations, mode
    );

    let mut last_percent = None;
    let start = Instant::now();
    let report = relax_with(&mut mesh, &fixed, options, |ctx| {
        if let Some(plane) = &plane {
            ctx.project_free(plane);
        }
        let message = format!("max displacement {:.3e}", ctx.max_displacement());
        draw_progress(ctx.iteration(), ctx.iterations(), &mut last_percent, &message);
        ControlFlow::Continue(())
    })?;
    let elapsed = start.elapsed();
    eprintln!();

    if report.converged {
        println!(
            "Converged after {} iterations (last max displacement {:.3e})",
            report.iterations, report.max_displacement
        );
    } else {
        println!(
            "Ran {} iterations (last max displacement {:.3e})",
            report.iterations, report.max_displacement
        );
    }

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_grid(
    output: &Path,
    nx: usize,
    ny: usize,
    spacing: f64,
    jitter: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: PolyMesh = build_grid(nx, ny, spacing)?;

    // Checkerboard lift of the interior; the rim stays flat so relaxing with
    // a fixed boundary restores the plane.
    for j in 1..ny {
        for i in 1..nx {
            let v = VertexId::new(j * (nx + 1) + i);
            let p = *mesh.position(v);
            let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
            mesh.set_position(v, Point3::new(p.x, p.y, sign * jitter * spacing));
        }
    }

    io::save(&mesh, output)?;
    println!(
        "Saved: {} ({} vertices, {} faces)",
        output.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_vertices_default_to_boundary() {
        let mesh: PolyMesh = build_grid(2, 2, 1.0).unwrap();

        let fixed = fixed_vertices(&mesh, false, &[4]);
        assert_eq!(fixed.len(), 9);

        let fixed = fixed_vertices(&mesh, true, &[4]);
        assert_eq!(fixed, HashSet::from([VertexId::new(4)]));
    }

    #[test]
    fn test_fix_key_past_key_range_is_skipped() {
        let mesh: PolyMesh = build_grid(1, 1, 1.0).unwrap();
        let huge = u32::MAX as usize + 1;

        let fixed = fixed_vertices(&mesh, true, &[1, huge, 17]);

        assert_eq!(fixed, HashSet::from([VertexId::new(1), VertexId::new(17)]));
    }
}
