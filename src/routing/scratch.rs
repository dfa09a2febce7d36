//! Reusable generation-stamped search state
//!
//! Searches run many times per simulation step over grids with millions of
//! tiles, so the per-tile bookkeeping arrays are allocated once per grid
//! size and never cleared. Instead every array entry carries the stamp of
//! the query that last wrote it: an entry belongs to the current query only
//! when its stamp equals the current generation, so a logical reset is a
//! single counter increment no matter how large the grid is.
//!

use crate::prelude::*;

/// A set of indices backed by a stamp array. Membership is recorded by
/// writing the current generation into the slot of an index, so `begin`
/// empties the set in O(1). Stamp value `0` means "never touched" and the
/// generation counter skips it on wraparound
pub struct StampSet {
	/// The stamp of the query that last inserted each index
	stamps: Vec<u32>,
	/// Stamp of the currently active query
	current: u32,
}

impl StampSet {
	/// Create a new instance of [StampSet] able to hold indices `0..len`
	pub fn new(len: usize) -> Self {
		StampSet {
			stamps: vec![0; len],
			current: 0,
		}
	}
	/// Number of index slots
	pub fn len(&self) -> usize {
		self.stamps.len()
	}
	/// Whether the set holds zero slots
	pub fn is_empty(&self) -> bool {
		self.stamps.is_empty()
	}
	/// Resize the slot array for a different index range, invalidating all
	/// recorded membership
	pub fn resize(&mut self, len: usize) {
		self.stamps.clear();
		self.stamps.resize(len, 0);
		self.current = 0;
	}
	/// Start a fresh empty set, invalidating all previous membership in O(1)
	pub fn begin(&mut self) {
		self.current = self.current.wrapping_add(1);
		// stamp 0 is reserved for "never touched" so wrapping must clear the
		// slots before reusing low stamp values
		if self.current == 0 {
			self.stamps.fill(0);
			self.current = 1;
		}
	}
	/// Insert an index, returning `true` if it was not already a member
	pub fn insert(&mut self, index: usize) -> bool {
		if self.stamps[index] == self.current {
			false
		} else {
			self.stamps[index] = self.current;
			true
		}
	}
	/// Whether the index is a member of the current set
	pub fn contains(&self, index: usize) -> bool {
		self.stamps[index] == self.current
	}
}

/// Tile value meaning "no parent/origin recorded"
const NO_TILE: i64 = -1;

/// Per-tile state of one in-flight search: visited membership, the parent
/// tile each visited tile was discovered from, the origin tile its seed was
/// planted for, the FIFO frontier queue and the deferred-frontier links used
/// by corridor-restricted searches. One instance is bound to a single grid
/// size and reused for every query against that grid
pub struct SearchScratch {
	/// Tiles already discovered by the current query
	visited: StampSet,
	/// Tiles flagged as targets of the current query
	targets: StampSet,
	/// Tiles parked on a deferred-frontier list of the current query
	deferred: StampSet,
	/// The tile each visited tile was discovered from, [NO_TILE] for seeds
	parents: Vec<i64>,
	/// The origin propagated from the seed that discovered each tile
	origins: Vec<i64>,
	/// Intrusive singly linked list: the next deferred tile of the same
	/// coarse region, [NO_TILE] at the list tail
	deferred_next: Vec<i64>,
	/// FIFO frontier storage, drained by index rather than popped so the
	/// allocation is reused across queries
	queue: Vec<TileIndex>,
	/// Index of the next tile to dequeue
	queue_head: usize,
}

impl SearchScratch {
	/// Create a new instance of [SearchScratch] for a grid of `tile_count`
	/// tiles
	pub fn new(tile_count: usize) -> Self {
		SearchScratch {
			visited: StampSet::new(tile_count),
			targets: StampSet::new(tile_count),
			deferred: StampSet::new(tile_count),
			parents: vec![NO_TILE; tile_count],
			origins: vec![NO_TILE; tile_count],
			deferred_next: vec![NO_TILE; tile_count],
			queue: Vec::with_capacity(tile_count.min(4096)),
			queue_head: 0,
		}
	}
	/// Number of tiles the scratch state covers
	pub fn tile_count(&self) -> usize {
		self.parents.len()
	}
	/// Resize for a different grid, dropping all recorded state
	pub fn resize(&mut self, tile_count: usize) {
		self.visited.resize(tile_count);
		self.targets.resize(tile_count);
		self.deferred.resize(tile_count);
		self.parents.clear();
		self.parents.resize(tile_count, NO_TILE);
		self.origins.clear();
		self.origins.resize(tile_count, NO_TILE);
		self.deferred_next.clear();
		self.deferred_next.resize(tile_count, NO_TILE);
		self.queue.clear();
		self.queue_head = 0;
	}
	/// Logically reset all per-tile state for a fresh query
	pub fn begin(&mut self) {
		self.visited.begin();
		self.targets.begin();
		self.deferred.begin();
		self.queue.clear();
		self.queue_head = 0;
	}
	/// Record a tile as discovered with the parent it was reached from and
	/// the origin of its seed, and push it onto the frontier. Returns `false`
	/// without enqueueing if the tile was already visited
	pub fn visit(&mut self, tile: TileIndex, parent: Option<TileIndex>, origin: TileIndex) -> bool {
		if !self.visited.insert(tile.usize()) {
			return false;
		}
		self.parents[tile.usize()] = parent.map_or(NO_TILE, |p| p.get() as i64);
		self.origins[tile.usize()] = origin.get() as i64;
		self.queue.push(tile);
		true
	}
	/// Whether a tile was discovered by the current query
	pub fn is_visited(&self, tile: TileIndex) -> bool {
		self.visited.contains(tile.usize())
	}
	/// Dequeue the next frontier tile in strict insertion order
	pub fn pop(&mut self) -> Option<TileIndex> {
		let tile = self.queue.get(self.queue_head).copied();
		if tile.is_some() {
			self.queue_head += 1;
		}
		tile
	}
	/// Flag a tile as a target of the current query
	pub fn mark_target(&mut self, tile: TileIndex) {
		self.targets.insert(tile.usize());
	}
	/// Whether a tile is a target of the current query
	pub fn is_target(&self, tile: TileIndex) -> bool {
		self.targets.contains(tile.usize())
	}
	/// The tile a visited tile was discovered from, [None] for seed entries
	pub fn parent_of(&self, tile: TileIndex) -> Option<TileIndex> {
		let parent = self.parents[tile.usize()];
		if parent == NO_TILE {
			None
		} else {
			Some(TileIndex::new(parent as u32))
		}
	}
	/// The origin tile propagated to a visited tile from its seed
	pub fn origin_of(&self, tile: TileIndex) -> TileIndex {
		TileIndex::new(self.origins[tile.usize()] as u32)
	}
	/// Park a discovered-but-disallowed tile on a deferred list, recording
	/// the parent and origin it was discovered with and the previous list
	/// head as its successor. Returns `false` if the tile is already parked
	pub fn defer(
		&mut self,
		tile: TileIndex,
		parent: TileIndex,
		origin: TileIndex,
		list_head: Option<TileIndex>,
	) -> bool {
		if !self.deferred.insert(tile.usize()) {
			return false;
		}
		self.parents[tile.usize()] = parent.get() as i64;
		self.origins[tile.usize()] = origin.get() as i64;
		self.deferred_next[tile.usize()] = list_head.map_or(NO_TILE, |h| h.get() as i64);
		true
	}
	/// The next tile on the same deferred list, [None] at the tail
	pub fn deferred_next(&self, tile: TileIndex) -> Option<TileIndex> {
		let next = self.deferred_next[tile.usize()];
		if next == NO_TILE {
			None
		} else {
			Some(TileIndex::new(next as u32))
		}
	}
	/// Move a previously deferred tile onto the frontier with the parent and
	/// origin recorded at discovery time. Returns `false` if the tile was
	/// reached through an allowed route in the meantime
	pub fn activate_deferred(&mut self, tile: TileIndex) -> bool {
		if !self.visited.insert(tile.usize()) {
			return false;
		}
		self.queue.push(tile);
		true
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn stamp_set_membership() {
		let mut set = StampSet::new(8);
		set.begin();
		assert!(set.insert(3));
		assert!(!set.insert(3));
		assert!(set.contains(3));
		assert!(!set.contains(4));
	}
	#[test]
	fn stamp_set_begin_clears() {
		let mut set = StampSet::new(8);
		set.begin();
		set.insert(5);
		set.begin();
		let result = set.contains(5);
		assert!(!result);
	}
	#[test]
	fn stamp_set_wrap_guard() {
		let mut set = StampSet::new(4);
		// drive the counter to the wrap point, membership must not resurrect
		set.current = u32::MAX;
		set.insert(2);
		set.begin();
		assert_eq!(1, set.current);
		assert!(!set.contains(2));
	}
	#[test]
	fn scratch_visit_and_pop_in_order() {
		let mut scratch = SearchScratch::new(16);
		scratch.begin();
		scratch.visit(TileIndex::new(4), None, TileIndex::new(4));
		scratch.visit(TileIndex::new(9), None, TileIndex::new(9));
		scratch.visit(TileIndex::new(2), Some(TileIndex::new(4)), TileIndex::new(4));
		let result = vec![scratch.pop(), scratch.pop(), scratch.pop(), scratch.pop()];
		let actual = vec![
			Some(TileIndex::new(4)),
			Some(TileIndex::new(9)),
			Some(TileIndex::new(2)),
			None,
		];
		assert_eq!(actual, result);
	}
	#[test]
	fn scratch_visit_rejects_duplicates() {
		let mut scratch = SearchScratch::new(16);
		scratch.begin();
		assert!(scratch.visit(TileIndex::new(7), None, TileIndex::new(7)));
		assert!(!scratch.visit(TileIndex::new(7), None, TileIndex::new(7)));
	}
	#[test]
	fn scratch_parent_chain() {
		let mut scratch = SearchScratch::new(16);
		scratch.begin();
		scratch.visit(TileIndex::new(0), None, TileIndex::new(0));
		scratch.visit(TileIndex::new(1), Some(TileIndex::new(0)), TileIndex::new(0));
		scratch.visit(TileIndex::new(2), Some(TileIndex::new(1)), TileIndex::new(0));
		let result = scratch.parent_of(TileIndex::new(2)).unwrap();
		let actual = TileIndex::new(1);
		assert_eq!(actual, result);
		assert!(scratch.parent_of(TileIndex::new(0)).is_none());
		assert_eq!(TileIndex::new(0), scratch.origin_of(TileIndex::new(2)));
	}
	#[test]
	fn scratch_defer_links_list() {
		let mut scratch = SearchScratch::new(16);
		scratch.begin();
		let parent = TileIndex::new(0);
		scratch.defer(TileIndex::new(5), parent, parent, None);
		scratch.defer(TileIndex::new(6), parent, parent, Some(TileIndex::new(5)));
		let result = scratch.deferred_next(TileIndex::new(6)).unwrap();
		let actual = TileIndex::new(5);
		assert_eq!(actual, result);
		assert!(scratch.deferred_next(TileIndex::new(5)).is_none());
	}
	#[test]
	fn scratch_activate_deferred_once() {
		let mut scratch = SearchScratch::new(16);
		scratch.begin();
		let parent = TileIndex::new(0);
		scratch.defer(TileIndex::new(5), parent, parent, None);
		assert!(scratch.activate_deferred(TileIndex::new(5)));
		assert!(!scratch.activate_deferred(TileIndex::new(5)));
	}
	#[test]
	fn scratch_begin_resets_queue() {
		let mut scratch = SearchScratch::new(16);
		scratch.begin();
		scratch.visit(TileIndex::new(3), None, TileIndex::new(3));
		scratch.begin();
		let result = scratch.pop();
		assert!(result.is_none());
	}
}
