//! The coarse-to-fine route orchestrator
//!
//! A query runs through up to four stages: a cheap plan on the downsampled
//! grid, construction of a corridor of coarse regions around that plan, a
//! corridor-restricted fine search that widens the corridor on demand, and
//! an unrestricted fine search as the correctness backstop. The coarse grid
//! is a lossy abstraction so its failure must never veto a route the full
//! resolution grid supports - every degraded stage falls through to the
//! next rather than reporting failure early. Only the unrestricted search
//! saying "no path" is authoritative.
//!

use std::time::{Duration, Instant};

use crate::prelude::*;
use bevy::prelude::*;

/// Movement rules of every coarse planning pass. The coarse grid only seeds
/// the corridor, so corner cutting stays legal there: the fine search
/// enforces the real rule, and a stricter coarse pass could starve the
/// corridor of regions a fine route legitimately threads through
const COARSE_RULES: MoveRules = MoveRules {
	king_moves: true,
	no_corner_cutting: false,
};

/// Tunable options of a single route query
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct RouteQueryOptions {
	/// Whether diagonal moves are permitted
	pub king_moves: bool,
	/// Whether a diagonal move requires both orthogonal shoulder tiles to be
	/// open water
	pub no_corner_cutting: bool,
	/// Chebyshev radius of coarse regions stamped around every tile of the
	/// coarse route when building the corridor
	pub corridor_radius: u32,
	/// Budget of corridor-restricted fine searches: the initial refinement
	/// counts as the first attempt and every widening round consumes one
	/// more, so a value of `1` forbids widening entirely. Values below `1`
	/// are treated as `1`
	pub max_attempts: u32,
	/// When enabled every seed or target dropped for being out of bounds or
	/// on land is reported through a `warn` log. Defaults to off: dropped
	/// inputs are silently skipped so callers can pass raw candidate lists
	pub strict_inputs: bool,
}

impl Default for RouteQueryOptions {
	fn default() -> Self {
		RouteQueryOptions {
			king_moves: true,
			no_corner_cutting: true,
			corridor_radius: 2,
			max_attempts: 6,
			strict_inputs: false,
		}
	}
}

impl RouteQueryOptions {
	/// The [MoveRules] of the fine-resolution searches
	pub fn move_rules(&self) -> MoveRules {
		MoveRules {
			king_moves: self.king_moves,
			no_corner_cutting: self.no_corner_cutting,
		}
	}
}

/// Work and timing counters of one query, recorded per stage so a slow
/// query can be attributed to the stage that dominated it
#[derive(Clone, Copy, Debug, Default)]
pub struct RouteDiagnostics {
	/// Tiles dequeued and expanded across all stages
	expanded: usize,
	/// Tiles placed on a frontier across all stages
	enqueued: usize,
	/// Corridor widening rounds performed
	widen_rounds: u32,
	/// Total coarse regions newly allowed by widening
	regions_added: u32,
	/// Wall-clock time of the coarse planning stage
	coarse_phase: Duration,
	/// Wall-clock time of corridor construction
	corridor_build: Duration,
	/// Wall-clock time of the corridor-restricted fine search
	fine_refine_phase: Duration,
	/// Wall-clock time of the unrestricted fallback search
	fallback_phase: Duration,
	/// Whether the unrestricted fallback search ran
	fallback_used: bool,
}

impl RouteDiagnostics {
	/// Tiles dequeued and expanded across all stages
	pub fn get_expanded(&self) -> usize {
		self.expanded
	}
	/// Tiles placed on a frontier across all stages
	pub fn get_enqueued(&self) -> usize {
		self.enqueued
	}
	/// Corridor widening rounds performed
	pub fn get_widen_rounds(&self) -> u32 {
		self.widen_rounds
	}
	/// Total coarse regions newly allowed by widening
	pub fn get_regions_added(&self) -> u32 {
		self.regions_added
	}
	/// Wall-clock time of the coarse planning stage
	pub fn get_coarse_phase(&self) -> Duration {
		self.coarse_phase
	}
	/// Wall-clock time of corridor construction
	pub fn get_corridor_build(&self) -> Duration {
		self.corridor_build
	}
	/// Wall-clock time of the corridor-restricted fine search
	pub fn get_fine_refine_phase(&self) -> Duration {
		self.fine_refine_phase
	}
	/// Wall-clock time of the unrestricted fallback search
	pub fn get_fallback_phase(&self) -> Duration {
		self.fallback_phase
	}
	/// Whether the unrestricted fallback search ran
	pub fn is_fallback_used(&self) -> bool {
		self.fallback_used
	}
	/// Fold a search's counters into the stage totals
	fn absorb(&mut self, telemetry: &SearchTelemetry) {
		self.expanded += telemetry.get_expanded();
		self.enqueued += telemetry.get_enqueued();
		self.widen_rounds += telemetry.get_widen_rounds();
		self.regions_added += telemetry.get_regions_added();
	}
}

/// A finished route: the origin tile of the winning seed, the target tile
/// reached, the ordered tiles from the seed's entry to the target inclusive
/// and the work counters of the query that produced it. Consecutive tiles
/// are grid-adjacent open water under the query's move rules; any geometric
/// smoothing or waypoint compression is the consumer's business
#[derive(Clone, Debug)]
pub struct SeaRoute {
	/// Origin tile of the winning seed
	source: TileIndex,
	/// The target tile that was reached
	target: TileIndex,
	/// Ordered tiles from the winning seed's entry tile to the target
	tiles: Vec<TileIndex>,
	/// Work and timing counters of the query
	diagnostics: RouteDiagnostics,
}

impl SeaRoute {
	/// Get the origin tile of the winning seed
	pub fn get_source(&self) -> TileIndex {
		self.source
	}
	/// Get the target tile that was reached
	pub fn get_target(&self) -> TileIndex {
		self.target
	}
	/// Get the ordered tiles of the route
	pub fn get_tiles(&self) -> &Vec<TileIndex> {
		&self.tiles
	}
	/// Get the work and timing counters of the query
	pub fn get_diagnostics(&self) -> &RouteDiagnostics {
		&self.diagnostics
	}
	/// Consume the route taking ownership of its tiles
	pub fn take_tiles(self) -> Vec<TileIndex> {
		self.tiles
	}
}

/// The engine instance answering route queries against one pair of grids.
/// Owns every reusable scratch structure - per-tile search state for both
/// resolutions, the corridor mask, the mapping registry and the query
/// buffers - so the steady state allocates nothing per query. A planner is
/// not reentrant mid-query: issue queries serially or give each worker its
/// own planner
#[derive(Component)]
pub struct RoutePlanner {
	/// Per-tile search state of the full resolution grid
	fine_scratch: SearchScratch,
	/// Per-tile search state of the downsampled grid
	coarse_scratch: SearchScratch,
	/// The corridor of coarse regions the fine search may explore
	mask: CorridorMask,
	/// Memoized fine-to-coarse mappings keyed by grid-pair identity
	mappings: MappingRegistry,
	/// Dedup set for mapping fine seeds and targets to coarse regions
	region_seen: StampSet,
	/// Filtered fine seeds of the in-flight query
	seed_buffer: Vec<RouteSeed>,
	/// Filtered fine targets of the in-flight query
	target_buffer: Vec<TileIndex>,
	/// Deduplicated coarse seeds of the in-flight query
	coarse_seed_buffer: Vec<RouteSeed>,
	/// Deduplicated coarse targets of the in-flight query
	coarse_target_buffer: Vec<TileIndex>,
	/// Snapshot of last-phase visited regions while a widening ring grows
	ring_buffer: Vec<u32>,
}

impl RoutePlanner {
	/// Create a new instance of [RoutePlanner] with scratch state sized for
	/// the given grids. The fine-to-coarse mapping is resolved eagerly so a
	/// malformed pairing is detected here rather than on the first query
	pub fn new(fine: &WaterGrid, coarse: Option<&WaterGrid>) -> Self {
		let mut planner = RoutePlanner {
			fine_scratch: SearchScratch::new(fine.tile_count()),
			coarse_scratch: SearchScratch::new(coarse.map_or(0, |c| c.tile_count())),
			mask: CorridorMask::new(),
			mappings: MappingRegistry::new(),
			region_seen: StampSet::new(0),
			seed_buffer: Vec::new(),
			target_buffer: Vec::new(),
			coarse_seed_buffer: Vec::new(),
			coarse_target_buffer: Vec::new(),
			ring_buffer: Vec::new(),
		};
		if let Some(coarse_grid) = coarse {
			if let Some(pair) = planner.mappings.resolve(fine, coarse_grid) {
				planner.mask.ensure_regions(pair);
			} else {
				debug!(
					"Coarse grid ({}, {}) does not divide fine grid ({}, {}), queries will run unrestricted",
					coarse_grid.width(),
					coarse_grid.height(),
					fine.width(),
					fine.height()
				);
			}
		}
		planner
	}
	/// Find a route from any seed to any target, or [None] when no
	/// traversable route exists under the move rules. Seeds and targets
	/// outside the grid or on land are dropped from consideration; if
	/// nothing valid remains no search is performed. The returned route is
	/// deterministic for fixed grid contents, inputs and options
	pub fn find_route(
		&mut self,
		fine: &WaterGrid,
		coarse: Option<&WaterGrid>,
		seeds: &[RouteSeed],
		targets: &[TileIndex],
		options: &RouteQueryOptions,
	) -> Option<SeaRoute> {
		let RoutePlanner {
			fine_scratch,
			coarse_scratch,
			mask,
			mappings,
			region_seen,
			seed_buffer,
			target_buffer,
			coarse_seed_buffer,
			coarse_target_buffer,
			ring_buffer,
		} = self;
		let mut diagnostics = RouteDiagnostics::default();
		// filter the raw candidate lists down to in-bounds water tiles
		seed_buffer.clear();
		for seed in seeds.iter() {
			let entry = seed.get_entry();
			if fine.contains(entry) && fine.is_water(entry) {
				seed_buffer.push(*seed);
			} else if options.strict_inputs {
				warn!("Dropped route seed with entry tile {:?}, out of bounds or not water", entry);
			}
		}
		target_buffer.clear();
		for target in targets.iter() {
			if fine.contains(*target) && fine.is_water(*target) {
				target_buffer.push(*target);
			} else if options.strict_inputs {
				warn!("Dropped route target tile {:?}, out of bounds or not water", target);
			}
		}
		if seed_buffer.is_empty() || target_buffer.is_empty() {
			return None;
		}
		let rules = options.move_rules();
		// coarse plan and corridor-restricted refinement, when a usable
		// planning grid exists
		if let Some(coarse_grid) = coarse {
			if let Some(pair) = mappings.resolve(fine, coarse_grid) {
				let timer = Instant::now();
				if region_seen.len() != pair.region_count() {
					region_seen.resize(pair.region_count());
				}
				region_seen.begin();
				coarse_seed_buffer.clear();
				for seed in seed_buffer.iter() {
					let region = pair.region_of(seed.get_entry());
					if region_seen.insert(region as usize) {
						coarse_seed_buffer.push(RouteSeed::from_entry(TileIndex::new(region)));
					}
				}
				region_seen.begin();
				coarse_target_buffer.clear();
				for target in target_buffer.iter() {
					let region = pair.region_of(*target);
					if region_seen.insert(region as usize) {
						coarse_target_buffer.push(TileIndex::new(region));
					}
				}
				let (coarse_outcome, coarse_telemetry) = flood_search(
					coarse_grid,
					coarse_scratch,
					coarse_seed_buffer,
					coarse_target_buffer,
					COARSE_RULES,
					None,
				);
				diagnostics.absorb(&coarse_telemetry);
				diagnostics.coarse_phase = timer.elapsed();
				if let Some(coarse_route) = coarse_outcome {
					// corridor build: stamp every region within the
					// Chebyshev radius of every tile on the coarse route
					let timer = Instant::now();
					mask.ensure_regions(pair);
					mask.begin_query();
					for region_tile in coarse_route.get_tiles().iter() {
						let (column, row) = pair.region_position(region_tile.get());
						let column_from = column.saturating_sub(options.corridor_radius);
						let column_to =
							(column + options.corridor_radius).min(pair.get_coarse_width() - 1);
						let row_from = row.saturating_sub(options.corridor_radius);
						let row_to =
							(row + options.corridor_radius).min(pair.get_coarse_height() - 1);
						for allow_row in row_from..=row_to {
							for allow_column in column_from..=column_to {
								mask.allow(pair.region_at(allow_column, allow_row));
							}
						}
					}
					diagnostics.corridor_build = timer.elapsed();
					// corridor-restricted fine search with on-demand widening
					let timer = Instant::now();
					let max_attempts = options.max_attempts.max(1);
					let mut attempts = 1;
					let widen = |mask: &mut CorridorMask| -> u32 {
						if attempts >= max_attempts {
							return 0;
						}
						attempts += 1;
						// grow one 8-connected ring around the regions the
						// most recent phase touched
						ring_buffer.clear();
						ring_buffer.extend_from_slice(mask.visited_regions());
						let mut added = 0;
						for region in ring_buffer.iter() {
							let (column, row) = pair.region_position(*region);
							for ordinal in SWEEP_KING.iter() {
								let (delta_column, delta_row) = ordinal.offset();
								let ring_column = column as i64 + delta_column as i64;
								let ring_row = row as i64 + delta_row as i64;
								if ring_column < 0
									|| ring_row < 0 || ring_column >= pair.get_coarse_width() as i64
									|| ring_row >= pair.get_coarse_height() as i64
								{
									continue;
								}
								if mask.allow(
									pair.region_at(ring_column as u32, ring_row as u32),
								) {
									added += 1;
								}
							}
						}
						mask.begin_phase();
						added
					};
					let (fine_outcome, fine_telemetry) = corridor_search(
						fine,
						fine_scratch,
						mask,
						pair,
						seed_buffer,
						target_buffer,
						rules,
						widen,
					);
					diagnostics.absorb(&fine_telemetry);
					diagnostics.fine_refine_phase = timer.elapsed();
					if let Some(outcome) = fine_outcome {
						return Some(package(outcome, diagnostics));
					}
					debug!(
						"Corridor search exhausted after {} widening rounds, engaging fallback",
						fine_telemetry.get_widen_rounds()
					);
				} else {
					debug!("Coarse plan found no route, engaging fallback");
				}
			}
		}
		// unrestricted fallback: the correctness backstop, always finds a
		// route if one exists at the cost of potentially flooding the whole
		// connected water body
		let timer = Instant::now();
		let (outcome, telemetry) =
			flood_search(fine, fine_scratch, seed_buffer, target_buffer, rules, None);
		diagnostics.absorb(&telemetry);
		diagnostics.fallback_phase = timer.elapsed();
		diagnostics.fallback_used = true;
		outcome.map(|o| package(o, diagnostics))
	}
}

/// Wrap a search outcome and the accumulated diagnostics into a [SeaRoute]
fn package(outcome: FloodOutcome, diagnostics: RouteDiagnostics) -> SeaRoute {
	let source = outcome.get_source();
	let target = outcome.get_target();
	SeaRoute {
		source,
		target,
		tiles: outcome.take_tiles(),
		diagnostics,
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
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
	#[test]
	fn no_coarse_grid_uses_fallback() {
		let fine = grid_from_rows(&[
			".....",
			".....",
			".....",
		]);
		let mut planner = RoutePlanner::new(&fine, None);
		let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
		let targets = vec![fine.tile_at(4, 2)];
		let route = planner
			.find_route(&fine, None, &seeds, &targets, &RouteQueryOptions::default())
			.unwrap();
		assert!(route.get_diagnostics().is_fallback_used());
	}
	#[test]
	fn corridor_route_avoids_fallback() {
		let fine = grid_from_rows(&[
			"..........",
			"..........",
			"..........",
			"..........",
			"..........",
			"..........",
			"..........",
			"..........",
			"..........",
			"..........",
		]);
		let coarse = fine.downsample(2).unwrap();
		let mut planner = RoutePlanner::new(&fine, Some(&coarse));
		let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
		let targets = vec![fine.tile_at(9, 9)];
		let route = planner
			.find_route(&fine, Some(&coarse), &seeds, &targets, &RouteQueryOptions::default())
			.unwrap();
		assert!(!route.get_diagnostics().is_fallback_used());
		assert_eq!(10, route.get_tiles().len());
	}
	#[test]
	fn empty_inputs_no_search() {
		let fine = grid_from_rows(&[
			"..x",
		]);
		let mut planner = RoutePlanner::new(&fine, None);
		// target on land leaves nothing to search for
		let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
		let targets = vec![fine.tile_at(2, 0)];
		let result =
			planner.find_route(&fine, None, &seeds, &targets, &RouteQueryOptions::default());
		assert!(result.is_none());
	}
	#[test]
	fn malformed_coarse_pairing_degrades() {
		let fine = grid_from_rows(&[
			".....",
			".....",
			".....",
		]);
		// 2x2 does not divide 5x3
		let coarse = WaterGrid::new(2, 2);
		let mut planner = RoutePlanner::new(&fine, Some(&coarse));
		let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 0))];
		let targets = vec![fine.tile_at(4, 2)];
		let route = planner
			.find_route(&fine, Some(&coarse), &seeds, &targets, &RouteQueryOptions::default())
			.unwrap();
		assert!(route.get_diagnostics().is_fallback_used());
	}
	#[test]
	fn determinism_across_runs() {
		let fine = grid_from_rows(&[
			"..........",
			".xx..xx...",
			"..........",
			"...xx..xx.",
			"..........",
			".xx..xx...",
			"..........",
			"...xx..xx.",
			"..........",
			"..........",
		]);
		let coarse = fine.downsample(2).unwrap();
		let mut planner = RoutePlanner::new(&fine, Some(&coarse));
		let seeds = vec![
			RouteSeed::from_entry(fine.tile_at(0, 0)),
			RouteSeed::from_entry(fine.tile_at(0, 9)),
		];
		let targets = vec![fine.tile_at(9, 0), fine.tile_at(9, 9)];
		let options = RouteQueryOptions::default();
		let first = planner
			.find_route(&fine, Some(&coarse), &seeds, &targets, &options)
			.unwrap();
		let second = planner
			.find_route(&fine, Some(&coarse), &seeds, &targets, &options)
			.unwrap();
		assert_eq!(first.get_source(), second.get_source());
		assert_eq!(first.get_target(), second.get_target());
		assert_eq!(first.get_tiles(), second.get_tiles());
	}
	#[test]
	fn disconnected_basins_no_route() {
		let fine = grid_from_rows(&[
			"..x..",
			"..x..",
			"..x..",
			"..x..",
			"..x..",
		]);
		let coarse = fine.downsample(5);
		let mut planner = RoutePlanner::new(&fine, coarse.as_ref());
		let seeds = vec![RouteSeed::from_entry(fine.tile_at(0, 2))];
		let targets = vec![fine.tile_at(4, 2)];
		let result = planner.find_route(
			&fine,
			coarse.as_ref(),
			&seeds,
			&targets,
			&RouteQueryOptions::default(),
		);
		assert!(result.is_none());
	}
}
