//! Drive the whole engine against the scenarios a route must survive:
//! open oceans, thin straits, disconnected basins and corridors that start
//! too tight
//!

use bevy_sea_lane_plugin::prelude::*;
use rand::prelude::*;

/// Build a grid from rows of `.` (water) and `x` (land)
fn grid_from_rows(rows: &[&str]) -> WaterGrid {
	let height = rows.len() as u32;
	let width = rows[0].len() as u32;
	let mut tiles = Vec::new();
	for row in rows.iter() {
		for tile in row.chars() {
			tiles.push(tile == '.');
		}
	}
	WaterGrid::from_tiles(width, height, tiles)
}

/// Assert every tile of a route is water and every consecutive pair is
/// grid-adjacent and legal under the move rules
fn assert_route_valid(grid: &WaterGrid, tiles: &[TileIndex], rules: MoveRules) {
	for tile in tiles.iter() {
		assert!(grid.is_water(*tile), "route tile {:?} is not water", tile);
	}
	for pair in tiles.windows(2) {
		let from = (grid.column(pair[0]), grid.row(pair[0]));
		let to = (grid.column(pair[1]), grid.row(pair[1]));
		assert_eq!(
			1,
			chebyshev_distance(from, to),
			"route tiles {:?} and {:?} are not adjacent",
			pair[0],
			pair[1]
		);
		if from.0 != to.0 && from.1 != to.1 {
			assert!(rules.king_moves, "diagonal step taken without king moves");
			if rules.no_corner_cutting {
				let shoulder_a = grid.tile_at(to.0, from.1);
				let shoulder_b = grid.tile_at(from.0, to.1);
				assert!(
					grid.is_water(shoulder_a) && grid.is_water(shoulder_b),
					"diagonal step between {:?} and {:?} cuts a corner",
					pair[0],
					pair[1]
				);
			}
		}
	}
}

#[test]
fn open_water_diagonal_line() {
	let fine = grid_from_rows(&[".....", ".....", ".....", ".....", "....."]);
	let mut planner = RoutePlanner::new(&fine, None);
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
	let targets = vec![fine.tile_at(4, 4)];
	let options = RouteQueryOptions::default();
	let route = planner
		.find_route(&fine, None, &seeds, &targets, &options)
		.unwrap();
	assert_eq!(5, route.get_tiles().len());
	assert_route_valid(&fine, route.get_tiles(), options.move_rules());
}

#[test]
fn strait_gap_rejects_corner_cutting() {
	// a land wall across column 2 pierced only at (2, 2): the route must
	// thread the gap and may not slip diagonally between the wall tiles
	let fine = grid_from_rows(&[
		"..x..",
		"..x..",
		".....",
		"..x..",
		"..x..",
	]);
	let mut planner = RoutePlanner::new(&fine, None);
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
	let targets = vec![fine.tile_at(4, 0)];
	let options = RouteQueryOptions::default();
	let route = planner
		.find_route(&fine, None, &seeds, &targets, &options)
		.unwrap();
	let gap = fine.tile_at(2, 2);
	assert!(route.get_tiles().contains(&gap), "route must pass the gap");
	assert_route_valid(&fine, route.get_tiles(), options.move_rules());
	// the two orthogonal approaches to the gap cost more than a cut corner
	// would: 7 tiles instead of 5
	assert_eq!(7, route.get_tiles().len());
}

#[test]
fn disconnected_basins_return_nothing() {
	let fine = grid_from_rows(&[
		"....x....",
		"....x....",
		"....x....",
		"....x....",
		"....x....",
	]);
	let coarse = fine.downsample(1).unwrap();
	let mut planner = RoutePlanner::new(&fine, Some(&coarse));
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 2))];
	let targets = vec![fine.tile_at(8, 2)];
	let result = planner.find_route(
		&fine,
		Some(&coarse),
		&seeds,
		&targets,
		&RouteQueryOptions::default(),
	);
	assert!(result.is_none());
}

/// A 12x6 map whose land wall at column 6 is pierced only at the bottom,
/// while the coarse grid (downsample factor 2) sees the wall's regions as
/// water and plans straight across the top row
fn tight_corridor_map() -> WaterGrid {
	grid_from_rows(&[
		"......x.....",
		"......x.....",
		"......x.....",
		"......x.....",
		"......x.....",
		"............",
	])
}

#[test]
fn tight_corridor_widens_to_the_gap() {
	let fine = tight_corridor_map();
	let coarse = fine.downsample(2).unwrap();
	let mut planner = RoutePlanner::new(&fine, Some(&coarse));
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
	let targets = vec![fine.tile_at(11, 0)];
	let options = RouteQueryOptions {
		corridor_radius: 0,
		..Default::default()
	};
	let route = planner
		.find_route(&fine, Some(&coarse), &seeds, &targets, &options)
		.unwrap();
	let diagnostics = route.get_diagnostics();
	assert!(
		diagnostics.get_widen_rounds() >= 1,
		"the tight corridor must widen at least once"
	);
	assert!(!diagnostics.is_fallback_used());
	assert_route_valid(&fine, route.get_tiles(), options.move_rules());
	assert!(route.get_tiles().contains(&fine.tile_at(6, 5)));
}

#[test]
fn exhausted_attempts_fall_back() {
	let fine = tight_corridor_map();
	let coarse = fine.downsample(2).unwrap();
	let mut planner = RoutePlanner::new(&fine, Some(&coarse));
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
	let targets = vec![fine.tile_at(11, 0)];
	// forbidding widening forces the correctness backstop to produce the
	// route instead
	let options = RouteQueryOptions {
		corridor_radius: 0,
		max_attempts: 1,
		..Default::default()
	};
	let route = planner
		.find_route(&fine, Some(&coarse), &seeds, &targets, &options)
		.unwrap();
	let diagnostics = route.get_diagnostics();
	assert_eq!(0, diagnostics.get_widen_rounds());
	assert!(diagnostics.is_fallback_used());
	assert_route_valid(&fine, route.get_tiles(), options.move_rules());
}

/// Scatter islands over a 64x64 ocean with a fixed seed so every run sees
/// the same map
fn archipelago(seed: u64) -> WaterGrid {
	let mut rng = StdRng::seed_from_u64(seed);
	let mut grid = WaterGrid::new(64, 64);
	for _ in 0..120 {
		let column = rng.random_range(0..60);
		let row = rng.random_range(0..60);
		let width = rng.random_range(1..4);
		let height = rng.random_range(1..4);
		for r in row..row + height {
			for c in column..column + width {
				grid.set_water(grid.tile_at(c, r), false);
			}
		}
	}
	grid
}

#[test]
fn corridor_and_fallback_agree_on_reachability() {
	let fine = archipelago(7);
	let coarse = fine.downsample(8).unwrap();
	let mut hierarchical = RoutePlanner::new(&fine, Some(&coarse));
	let mut unrestricted = RoutePlanner::new(&fine, None);
	let options = RouteQueryOptions::default();
	let mut rng = StdRng::seed_from_u64(11);
	let mut compared = 0;
	for _ in 0..40 {
		let seed_tile = fine.tile_at(rng.random_range(0..64), rng.random_range(0..64));
		let goal_tile = fine.tile_at(rng.random_range(0..64), rng.random_range(0..64));
		if !fine.is_water(seed_tile) || !fine.is_water(goal_tile) {
			continue;
		}
		let seeds = vec![RouteSeed::from_entry(seed_tile)];
		let targets = vec![goal_tile];
		let with_corridor =
			hierarchical.find_route(&fine, Some(&coarse), &seeds, &targets, &options);
		let without = unrestricted.find_route(&fine, None, &seeds, &targets, &options);
		assert_eq!(
			with_corridor.is_some(),
			without.is_some(),
			"corridor and unrestricted searches disagree on {:?} -> {:?}",
			seed_tile,
			goal_tile
		);
		if let Some(route) = with_corridor {
			assert_route_valid(&fine, route.get_tiles(), options.move_rules());
		}
		compared += 1;
	}
	assert!(compared > 0, "no water pairs sampled");
}

#[test]
fn routes_are_deterministic() {
	let fine = archipelago(23);
	let coarse = fine.downsample(8).unwrap();
	let mut planner = RoutePlanner::new(&fine, Some(&coarse));
	let seeds = vec![
		RouteSeed::from_entry(fine.tile_at(0, 63)),
		RouteSeed::from_entry(fine.tile_at(0, 0)),
	];
	let targets = vec![fine.tile_at(63, 0), fine.tile_at(63, 63)];
	let options = RouteQueryOptions::default();
	let first = planner.find_route(&fine, Some(&coarse), &seeds, &targets, &options);
	let second = planner.find_route(&fine, Some(&coarse), &seeds, &targets, &options);
	match (first, second) {
		(Some(a), Some(b)) => {
			assert_eq!(a.get_source(), b.get_source());
			assert_eq!(a.get_target(), b.get_target());
			assert_eq!(a.take_tiles(), b.take_tiles());
		}
		(None, None) => {}
		_ => panic!("reachability flipped between identical queries"),
	}
}

#[test]
fn multiple_targets_any_satisfies() {
	let fine = grid_from_rows(&[
		"..........",
		"..........",
		"..........",
		"..........",
		"..........",
	]);
	let mut planner = RoutePlanner::new(&fine, None);
	let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 2))];
	// the nearest of three goals must win
	let targets = vec![
		fine.tile_at(9, 0),
		fine.tile_at(3, 2),
		fine.tile_at(9, 4),
	];
	let route = planner
		.find_route(&fine, None, &seeds, &targets, &RouteQueryOptions::default())
		.unwrap();
	assert_eq!(fine.tile_at(3, 2), route.get_target());
}
