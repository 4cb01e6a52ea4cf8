//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use meshl::mesh::ConnectivityOptions;
use meshl::prelude::*;
use nalgebra::Point3;

fn create_grid_mesh(n: usize) -> Mesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_mesh_construction(c: &mut Criterion) {
    c.bench_function("build_quad_grid_20x20", |b| {
        b.iter(|| {
            let mesh: Mesh = grid(20, 20);
            mesh
        });
    });

    c.bench_function("create_connectivity_50x50", |b| {
        let mut mesh = create_grid_mesh(50);
        mesh.delete_connectivity();
        b.iter_batched(
            || mesh.clone(),
            |mut m| m.create_connectivity(&ConnectivityOptions::default()),
            BatchSize::LargeInput,
        );
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);

    c.bench_function("vertex_neighbors_all", |b| {
        b.iter(|| {
            let mut count = 0;
            for v in mesh.vertex_ids() {
                count += mesh.vertex_neighbors(v).count();
            }
            count
        });
    });

    c.bench_function("count_unique_edges", |b| {
        b.iter(|| mesh.count_unique_edges());
    });
}

fn bench_euler_ops(c: &mut Criterion) {
    let mesh: Mesh = grid(20, 20);

    c.bench_function("split_and_kill_edge_vertex", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut m| {
                let mut ops = EulerOps::new(&mut m);
                let v = ops
                    .make_edge_vertex(VertexId::new(1), VertexId::new(22), Point3::new(1.0, 0.5, 0.0))
                    .unwrap();
                ops.kill_edge_vertex(v).unwrap();
                m
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_mesh_construction, bench_mesh_traversal, bench_euler_ops);
criterion_main!(benches);
