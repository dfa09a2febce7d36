//! The multi-source / any-target unweighted search primitive
//!
//! Every route query bottoms out here: seeds are planted on the frontier at
//! distance zero, each tagged with the origin tile that produced it, and the
//! grid is explored breadth-first until a target tile is *dequeued*. All
//! traversable moves cost one unit (diagonals included) so the first target
//! to leave the queue is reached by a shortest hop-count path. Termination
//! must be checked at dequeue time rather than at discovery: two equal-cost
//! frontiers can discover the same tile in one wave and only the dequeue
//! order decides the winner deterministically.
//!

use crate::prelude::*;

/// A point the search frontier is planted at. The `entry` tile is where
/// exploration starts and must be open water; the `origin` tile is carried
/// to every tile reached from this seed and identifies which start point
/// produced the winning path - for a boat launching from a pier the origin
/// is the pier tile while the entry is the water tile beside it. Multiple
/// seeds may share one origin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteSeed {
	/// Water tile the frontier is planted at
	entry: TileIndex,
	/// Tile reported as the source of any route found through this seed
	origin: TileIndex,
}

impl RouteSeed {
	/// Create a new instance of [RouteSeed]
	pub fn new(entry: TileIndex, origin: TileIndex) -> Self {
		RouteSeed { entry, origin }
	}
	/// Create a [RouteSeed] whose origin is the entry tile itself
	pub fn from_entry(entry: TileIndex) -> Self {
		RouteSeed {
			entry,
			origin: entry,
		}
	}
	/// Get the tile the frontier is planted at
	pub fn get_entry(&self) -> TileIndex {
		self.entry
	}
	/// Get the tile reported as the source of routes through this seed
	pub fn get_origin(&self) -> TileIndex {
		self.origin
	}
}

/// Movement rules of a query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRules {
	/// Whether diagonal moves are permitted alongside the orthogonal four
	pub king_moves: bool,
	/// Whether a diagonal move additionally requires both of its orthogonal
	/// shoulder tiles to be open water
	pub no_corner_cutting: bool,
}

impl Default for MoveRules {
	fn default() -> Self {
		MoveRules {
			king_moves: true,
			no_corner_cutting: true,
		}
	}
}

impl MoveRules {
	/// The fixed neighbour enumeration order of these rules
	pub fn sweep(&self) -> &'static [Ordinal] {
		if self.king_moves {
			&SWEEP_KING
		} else {
			&SWEEP_ORTHOGONAL
		}
	}
}

/// A successful search: the origin of the winning seed, the target tile that
/// was reached and the ordered tiles walked from the seed's entry tile to
/// the target inclusive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloodOutcome {
	/// Origin tile of the seed the winning path grew from
	source: TileIndex,
	/// The target tile that was reached
	target: TileIndex,
	/// Ordered tiles from the winning seed's entry tile to the target
	tiles: Vec<TileIndex>,
}

impl FloodOutcome {
	/// Get the origin tile of the winning seed
	pub fn get_source(&self) -> TileIndex {
		self.source
	}
	/// Get the target tile that was reached
	pub fn get_target(&self) -> TileIndex {
		self.target
	}
	/// Get the ordered tiles of the path
	pub fn get_tiles(&self) -> &Vec<TileIndex> {
		&self.tiles
	}
	/// Consume the outcome taking ownership of the path tiles
	pub fn take_tiles(self) -> Vec<TileIndex> {
		self.tiles
	}
}

/// Work counters accumulated by a search. The dominant cost driver of a
/// query is the number of tiles actually visited rather than the length of
/// the resulting path, so these are reported alongside every result
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchTelemetry {
	/// Tiles dequeued and expanded
	pub(crate) expanded: usize,
	/// Tiles placed on the frontier, seeds included
	pub(crate) enqueued: usize,
	/// Corridor widening rounds performed
	pub(crate) widen_rounds: u32,
	/// Total coarse regions newly allowed across all widening rounds
	pub(crate) regions_added: u32,
}

impl SearchTelemetry {
	/// Number of tiles dequeued and expanded
	pub fn get_expanded(&self) -> usize {
		self.expanded
	}
	/// Number of tiles placed on the frontier
	pub fn get_enqueued(&self) -> usize {
		self.enqueued
	}
	/// Number of corridor widening rounds performed
	pub fn get_widen_rounds(&self) -> u32 {
		self.widen_rounds
	}
	/// Total coarse regions newly allowed by widening
	pub fn get_regions_added(&self) -> u32 {
		self.regions_added
	}
	/// Fold another search's counters into this one
	pub(crate) fn accumulate(&mut self, other: &SearchTelemetry) {
		self.expanded += other.expanded;
		self.enqueued += other.enqueued;
		self.widen_rounds += other.widen_rounds;
		self.regions_added += other.regions_added;
	}
}

/// Step one tile from `from` towards `ordinal` if the move is legal under
/// the rules: the neighbour must exist, be open water, and a diagonal step
/// must clear both orthogonal shoulder tiles when corner cutting is
/// forbidden
pub(crate) fn legal_step<G: TileGrid>(
	grid: &G,
	from: TileIndex,
	ordinal: Ordinal,
	rules: MoveRules,
) -> Option<TileIndex> {
	let next = grid.neighbour(from, ordinal)?;
	if !grid.is_water(next) {
		return None;
	}
	if rules.no_corner_cutting {
		if let Some((first, second)) = ordinal.shoulders() {
			let first_tile = grid.neighbour(from, first)?;
			let second_tile = grid.neighbour(from, second)?;
			if !grid.is_water(first_tile) || !grid.is_water(second_tile) {
				return None;
			}
		}
	}
	Some(next)
}

/// Walk the recorded parent chain back from a dequeued target and package
/// the ordered path
pub(crate) fn assemble_outcome(scratch: &SearchScratch, target: TileIndex) -> FloodOutcome {
	let mut tiles = Vec::new();
	let mut cursor = Some(target);
	while let Some(tile) = cursor {
		tiles.push(tile);
		cursor = scratch.parent_of(tile);
	}
	tiles.reverse();
	FloodOutcome {
		source: scratch.origin_of(target),
		target,
		tiles,
	}
}

/// Plant every valid seed and flag every valid target, returning how many of
/// each survived filtering. Seeds and targets outside the grid or sitting on
/// land are silently skipped so callers can pass raw candidate lists
pub(crate) fn plant_query<G: TileGrid>(
	grid: &G,
	scratch: &mut SearchScratch,
	seeds: &[RouteSeed],
	targets: &[TileIndex],
	telemetry: &mut SearchTelemetry,
) -> (usize, usize) {
	let mut target_count = 0;
	for target in targets.iter() {
		if grid.contains(*target) && grid.is_water(*target) {
			scratch.mark_target(*target);
			target_count += 1;
		}
	}
	if target_count == 0 {
		return (0, 0);
	}
	let mut seed_count = 0;
	for seed in seeds.iter() {
		let entry = seed.get_entry();
		if grid.contains(entry) && grid.is_water(entry) && scratch.visit(entry, None, seed.get_origin())
		{
			telemetry.enqueued += 1;
			seed_count += 1;
		}
	}
	(seed_count, target_count)
}

/// Explore the grid breadth-first from multiple seeds until any target tile
/// is dequeued, returning the first target reached together with an ordered
/// tile path from the winning seed to it, or [None] if no target is
/// reachable. When a corridor mask and mapping are supplied the search runs
/// in hard-restriction mode: neighbours whose coarse region is not allowed
/// are dropped outright
pub fn flood_search<G: TileGrid>(
	grid: &G,
	scratch: &mut SearchScratch,
	seeds: &[RouteSeed],
	targets: &[TileIndex],
	rules: MoveRules,
	corridor: Option<(&CorridorMask, &GridPair)>,
) -> (Option<FloodOutcome>, SearchTelemetry) {
	let mut telemetry = SearchTelemetry::default();
	if scratch.tile_count() != grid.tile_count() {
		scratch.resize(grid.tile_count());
	}
	scratch.begin();
	let (seed_count, target_count) = plant_query(grid, scratch, seeds, targets, &mut telemetry);
	if seed_count == 0 || target_count == 0 {
		return (None, telemetry);
	}
	while let Some(tile) = scratch.pop() {
		telemetry.expanded += 1;
		if scratch.is_target(tile) {
			return (Some(assemble_outcome(scratch, tile)), telemetry);
		}
		let origin = scratch.origin_of(tile);
		for ordinal in rules.sweep().iter() {
			if let Some(next) = legal_step(grid, tile, *ordinal, rules) {
				if scratch.is_visited(next) {
					continue;
				}
				if let Some((mask, pair)) = corridor {
					if !mask.is_allowed(pair.region_of(next)) {
						continue;
					}
				}
				if scratch.visit(next, Some(tile), origin) {
					telemetry.enqueued += 1;
				}
			}
		}
	}
	(None, telemetry)
}
