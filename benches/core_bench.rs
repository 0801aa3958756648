use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::DVec2;
use std::hint::black_box;
use track_network_engine::geometry::{arc_from_heading, free_curve};
use track_network_engine::{EditMode, EditSession, EditSettings, Tolerance, World, WorldBounds};

fn bench_solvers(c: &mut Criterion) {
    let tolerance = Tolerance::default();
    let mut group = c.benchmark_group("solvers");

    group.bench_function("arc_from_heading", |b| {
        b.iter(|| {
            arc_from_heading(
                black_box(DVec2::new(10.0, 0.0)),
                black_box(0.0),
                black_box(DVec2::new(20.0, 10.0)),
                &tolerance,
            )
        })
    });

    group.bench_function("free_curve", |b| {
        b.iter(|| {
            free_curve(
                black_box(DVec2::ZERO),
                black_box(0.0),
                black_box(DVec2::new(20.0, 10.0)),
                black_box(0.3),
                &tolerance,
            )
        })
    });

    group.finish();
}

/// Welt mit `count` hintereinander liegenden Geraden.
fn build_synthetic_world(count: usize) -> World {
    let mut world = World::new(WorldBounds::centered(1.0e6), 100.0);
    let mut session = EditSession::new(EditSettings::default());
    let Some(mut end) = session
        .create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0))
        .applied()
    else {
        return world;
    };
    for i in 1..count {
        let row = (i / 1000) as f64 * 50.0;
        let column = (i % 1000) as f64 * 10.0;
        let next = if i % 1000 == 0 {
            session
                .create_track(&world, DVec2::new(0.0, row), DVec2::new(10.0, row))
                .applied()
        } else {
            session
                .extend_track(&world, end, DVec2::new(column + 10.0, row), EditMode::Default)
                .applied()
                .map(|track| session.unit_of_work().track(track).vertices[1])
        };
        match next {
            Some(vertex) => end = vertex,
            None => break,
        }
    }
    if let Err(e) = session.commit(&mut world) {
        eprintln!("Commit fehlgeschlagen: {e}");
    }
    world
}

fn bench_edit_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit_chain");

    for &length in &[10usize, 100usize] {
        group.bench_with_input(BenchmarkId::new("extend_and_commit", length), &length, |b, &n| {
            b.iter(|| black_box(build_synthetic_world(n).track_count()))
        });
    }

    group.finish();
}

fn bench_spatial_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_queries");
    let world = build_synthetic_world(5_000);
    let query_points: Vec<DVec2> = (0..1024)
        .map(|i| DVec2::new((i % 1000) as f64 * 9.7 + 0.37, ((i * 7) % 5) as f64 * 50.0 + 0.63))
        .collect();

    group.bench_function("nearest_batch", |b| {
        b.iter(|| {
            let hits = query_points
                .iter()
                .filter(|p| world.nearest_vertex(black_box(**p)).is_some())
                .count();
            black_box(hits)
        })
    });

    group.bench_function("within_radius", |b| {
        b.iter(|| black_box(world.vertices_within(black_box(DVec2::new(500.0, 50.0)), 25.0).len()))
    });

    group.finish();
}

criterion_group!(core_benches, bench_solvers, bench_edit_chain, bench_spatial_queries);
criterion_main!(core_benches);
