//! Measure planning routes through a scattered island field, the geometry
//! that exercises corridor widening
//!

use bevy_sea_lane_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

/// Scatter rectangular islands over a 512x512 ocean with a fixed seed so
/// every sample sees the same map
fn prepare_engine() -> (WaterGrid, WaterGrid, RoutePlanner) {
	let mut rng = StdRng::seed_from_u64(97);
	let mut fine = WaterGrid::new(512, 512);
	for _ in 0..2000 {
		let column = rng.random_range(0..500);
		let row = rng.random_range(0..500);
		let width = rng.random_range(2..12);
		let height = rng.random_range(2..12);
		for r in row..row + height {
			for c in column..column + width {
				fine.set_water(fine.tile_at(c, r), false);
			}
		}
	}
	// keep the rim open so the benchmark route always exists
	for i in 0..512 {
		fine.set_water(fine.tile_at(i, 0), true);
		fine.set_water(fine.tile_at(i, 511), true);
		fine.set_water(fine.tile_at(0, i), true);
		fine.set_water(fine.tile_at(511, i), true);
	}
	let coarse = fine.downsample(8).expect("512 divides by 8");
	let planner = RoutePlanner::new(&fine, Some(&coarse));
	(fine, coarse, planner)
}

/// Drive one query across the island field
fn calc(fine: &WaterGrid, coarse: &WaterGrid, planner: &mut RoutePlanner) {
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 511))];
	let targets = vec![fine.tile_at(511, 0)];
	let route = planner
		.find_route(
			fine,
			Some(coarse),
			&seeds,
			&targets,
			&RouteQueryOptions::default(),
		)
		.expect("the rim keeps the corners connected");
	black_box(route);
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let (fine, coarse, mut planner) = prepare_engine();
	group.bench_function("plan_route_archipelago", |b| {
		b.iter(|| calc(black_box(&fine), black_box(&coarse), &mut planner))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
