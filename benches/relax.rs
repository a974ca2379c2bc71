//! Benchmarks for mesh relaxation.

use std::collections::HashSet;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;
use tessera::prelude::*;

/// A quad grid with every interior vertex pushed off the plane.
fn create_lifted_grid(n: usize) -> (PolyMesh, HashSet<VertexId>) {
    let mut mesh: PolyMesh = build_grid(n, n, 1.0).unwrap();
    let fixed: HashSet<VertexId> = mesh.boundary_vertices().into_iter().collect();
    for v in mesh.vertex_ids().collect::<Vec<_>>() {
        if !fixed.contains(&v) {
            let p = *mesh.position(v);
            let z = if v.index() % 2 == 0 { 0.5 } else { -0.5 };
            mesh.set_position(v, Point3::new(p.x, p.y, z));
        }
    }
    (mesh, fixed)
}

fn bench_adjacency(c: &mut Criterion) {
    let (mesh, _) = create_lifted_grid(100);

    c.bench_function("adjacency_100x100", |b| {
        b.iter(|| Adjacency::new(&mesh));
    });
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("relax_10_sweeps");
    let (mesh, fixed) = create_lifted_grid(50);

    for strategy in Strategy::ALL {
        let options = RelaxOptions::default()
            .with_iterations(10)
            .with_strategy(strategy);
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &options, |b, options| {
            b.iter(|| {
                let mut mesh = mesh.clone();
                relax(&mut mesh, &fixed, options).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_parallel_vs_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("relax_200x200");
    group.sample_size(10);
    let (mesh, fixed) = create_lifted_grid(200);

    for (name, parallel) in [("parallel", true), ("sequential", false)] {
        let options = RelaxOptions::default()
            .with_iterations(5)
            .with_strategy(Strategy::AreaCentroid)
            .with_parallel(parallel);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut mesh = mesh.clone();
                relax(&mut mesh, &fixed, &options).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_adjacency,
    bench_strategies,
    bench_parallel_vs_sequential
);
criterion_main!(benches);
