//! Corridor restriction and the mask-expanding search variant
//!
//! A corridor is the set of coarse regions the fine search is currently
//! permitted to explore. Rather than dropping discoveries that fall outside
//! it, the mask-expanding search parks them on a per-region deferred list;
//! when the frontier runs dry a caller-supplied callback may grow the
//! corridor and every parked tile of a freshly allowed region is activated,
//! resuming the search without repeating any work already done.
//!

use crate::prelude::*;

/// Value of a deferred-list head slot holding no tile
const NO_HEAD: i64 = -1;

/// The set of coarse regions permitted for fine-grid exploration, plus the
/// side-channels the widening step feeds on: which regions the most recent
/// search phase actually touched and which regions were freshly allowed and
/// still hold parked frontier tiles. Allowed membership is cumulative across
/// one query, a region is never revoked
pub struct CorridorMask {
	/// Regions the fine search may explore
	allowed: StampSet,
	/// Regions touched by the current search phase
	visited: StampSet,
	/// Insertion-ordered regions touched by the current search phase
	visited_list: Vec<u32>,
	/// Regions allowed since the last activation sweep, in allow order
	newly_allowed: Vec<u32>,
	/// Head tile of each region's deferred list
	deferred_heads: Vec<i64>,
	/// Which deferred list heads belong to the current query
	head_set: StampSet,
	/// Running count of allowed regions this query
	allowed_total: usize,
	/// Columns of the coarse grid the mask spans
	coarse_width: u32,
	/// Rows of the coarse grid the mask spans
	coarse_height: u32,
}

impl CorridorMask {
	/// Create a new instance of [CorridorMask] spanning zero regions, sized
	/// on first use
	pub fn new() -> Self {
		CorridorMask {
			allowed: StampSet::new(0),
			visited: StampSet::new(0),
			visited_list: Vec::new(),
			newly_allowed: Vec::new(),
			deferred_heads: Vec::new(),
			head_set: StampSet::new(0),
			allowed_total: 0,
			coarse_width: 0,
			coarse_height: 0,
		}
	}
	/// Resize the mask for the coarse grid of a mapping if its dimensions
	/// changed, dropping all recorded state when they did
	pub fn ensure_regions(&mut self, pair: &GridPair) {
		if self.coarse_width == pair.get_coarse_width()
			&& self.coarse_height == pair.get_coarse_height()
		{
			return;
		}
		self.coarse_width = pair.get_coarse_width();
		self.coarse_height = pair.get_coarse_height();
		let count = pair.region_count();
		self.allowed.resize(count);
		self.visited.resize(count);
		self.head_set.resize(count);
		self.deferred_heads.clear();
		self.deferred_heads.resize(count, NO_HEAD);
		self.visited_list.clear();
		self.newly_allowed.clear();
		self.allowed_total = 0;
	}
	/// Number of regions the mask spans
	pub fn region_count(&self) -> usize {
		self.deferred_heads.len()
	}
	/// Columns of the coarse grid the mask spans
	pub fn get_coarse_width(&self) -> u32 {
		self.coarse_width
	}
	/// Rows of the coarse grid the mask spans
	pub fn get_coarse_height(&self) -> u32 {
		self.coarse_height
	}
	/// Logically reset the mask for a fresh query
	pub fn begin_query(&mut self) {
		self.allowed.begin();
		self.visited.begin();
		self.head_set.begin();
		self.visited_list.clear();
		self.newly_allowed.clear();
		self.allowed_total = 0;
	}
	/// Permit a region for exploration, returning `true` if it was not
	/// already allowed. Growth is one way: nothing ever removes a region
	/// within a query
	pub fn allow(&mut self, region: u32) -> bool {
		if self.allowed.insert(region as usize) {
			self.allowed_total += 1;
			self.newly_allowed.push(region);
			true
		} else {
			false
		}
	}
	/// Whether a region is permitted for exploration
	pub fn is_allowed(&self, region: u32) -> bool {
		self.allowed.contains(region as usize)
	}
	/// Number of regions allowed so far this query
	pub fn allowed_count(&self) -> usize {
		self.allowed_total
	}
	/// Restamp the visited-region side-channel so the next widening ring is
	/// computed from the most recent search phase only
	pub fn begin_phase(&mut self) {
		self.visited.begin();
		self.visited_list.clear();
	}
	/// Record that the current search phase touched a region
	pub fn mark_visited(&mut self, region: u32) {
		if self.visited.insert(region as usize) {
			self.visited_list.push(region);
		}
	}
	/// The regions touched by the current search phase, in first-touch order
	pub fn visited_regions(&self) -> &[u32] {
		&self.visited_list
	}
	/// Head of a region's deferred list
	fn head_of(&self, region: u32) -> Option<TileIndex> {
		if self.head_set.contains(region as usize) && self.deferred_heads[region as usize] != NO_HEAD
		{
			Some(TileIndex::new(self.deferred_heads[region as usize] as u32))
		} else {
			None
		}
	}
	/// Replace the head of a region's deferred list
	fn set_head(&mut self, region: u32, tile: TileIndex) {
		self.head_set.insert(region as usize);
		self.deferred_heads[region as usize] = tile.get() as i64;
	}
	/// Drop a region's deferred list after its tiles were activated
	fn clear_head(&mut self, region: u32) {
		self.deferred_heads[region as usize] = NO_HEAD;
	}
	/// Number of regions allowed since the last activation sweep
	fn newly_allowed_len(&self) -> usize {
		self.newly_allowed.len()
	}
	/// A region allowed since the last activation sweep
	fn newly_allowed_at(&self, index: usize) -> u32 {
		self.newly_allowed[index]
	}
	/// Forget which regions were freshly allowed, once their deferred tiles
	/// have been activated
	fn clear_newly_allowed(&mut self) {
		self.newly_allowed.clear();
	}
}

impl Default for CorridorMask {
	fn default() -> Self {
		CorridorMask::new()
	}
}

/// Explore the grid exactly as [flood_search] does but restricted to the
/// allowed regions of the mask. Neighbours landing in a disallowed region
/// are deferred rather than dropped; when the frontier is exhausted the
/// `widen` callback may permit further regions and report how many it added.
/// Zero added regions ends the search with no path, otherwise every deferred
/// tile of a freshly allowed region is activated and exploration resumes
/// with all visited state intact
#[allow(clippy::too_many_arguments)]
pub fn corridor_search<G: TileGrid, W: FnMut(&mut CorridorMask) -> u32>(
	grid: &G,
	scratch: &mut SearchScratch,
	mask: &mut CorridorMask,
	pair: &GridPair,
	seeds: &[RouteSeed],
	targets: &[TileIndex],
	rules: MoveRules,
	mut widen: W,
) -> (Option<FloodOutcome>, SearchTelemetry) {
	let mut telemetry = SearchTelemetry::default();
	if scratch.tile_count() != grid.tile_count() {
		scratch.resize(grid.tile_count());
	}
	mask.ensure_regions(pair);
	mask.clear_newly_allowed();
	scratch.begin();
	let (seed_count, target_count) = plant_query(grid, scratch, seeds, targets, &mut telemetry);
	if seed_count == 0 || target_count == 0 {
		return (None, telemetry);
	}
	// seeds count as touched regions so the first widening ring can grow
	// around them even if the frontier dies immediately
	for seed in seeds.iter() {
		let entry = seed.get_entry();
		if grid.contains(entry) && grid.is_water(entry) {
			mask.mark_visited(pair.region_of(entry));
		}
	}
	loop {
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
					let region = pair.region_of(next);
					if mask.is_allowed(region) {
						if scratch.visit(next, Some(tile), origin) {
							telemetry.enqueued += 1;
							mask.mark_visited(region);
						}
					} else if let Some(head) = mask.head_of(region) {
						if scratch.defer(next, tile, origin, Some(head)) {
							mask.set_head(region, next);
						}
					} else if scratch.defer(next, tile, origin, None) {
						mask.set_head(region, next);
					}
				}
			}
		}
		let added = widen(mask);
		if added == 0 {
			return (None, telemetry);
		}
		telemetry.widen_rounds += 1;
		telemetry.regions_added += added;
		// walk the deferred list of every freshly allowed region once,
		// activating any tile not already reached through an allowed route
		let mut index = 0;
		while index < mask.newly_allowed_len() {
			let region = mask.newly_allowed_at(index);
			let mut cursor = mask.head_of(region);
			while let Some(tile) = cursor {
				cursor = scratch.deferred_next(tile);
				if grid.is_water(tile) && scratch.activate_deferred(tile) {
					telemetry.enqueued += 1;
					mask.mark_visited(region);
				}
			}
			mask.clear_head(region);
			index += 1;
		}
		mask.clear_newly_allowed();
	}
}
