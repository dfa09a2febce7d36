//! Mapping between the full resolution grid and a downsampled planning grid
//!
//! A coarse region index is identical to the coarse grid's own [TileIndex]
//! addressing, so the mapping is a single memoized lookup table from fine
//! tile to coarse tile. The table is built once per grid pair by rectangular
//! block assignment rather than recomputing a division for every tile the
//! searches touch.
//!

use std::collections::HashMap;

use crate::prelude::*;

/// Memoized lookup from fine [TileIndex] to the coarse region containing it.
/// Only exists for grid pairs whose dimensions divide exactly in both axes
pub struct GridPair {
	/// Columns of the coarse grid
	coarse_width: u32,
	/// Rows of the coarse grid
	coarse_height: u32,
	/// Coarse region of each fine tile, indexed by fine [TileIndex]
	lookup: Vec<u32>,
}

impl GridPair {
	/// Build the mapping for a fine/coarse dimension pairing. Returns [None]
	/// when the coarse dimensions do not evenly divide the fine dimensions,
	/// in which case callers must skip coarse planning entirely
	pub fn build(
		fine_width: u32,
		fine_height: u32,
		coarse_width: u32,
		coarse_height: u32,
	) -> Option<GridPair> {
		if coarse_width == 0
			|| coarse_height == 0
			|| fine_width % coarse_width != 0
			|| fine_height % coarse_height != 0
		{
			return None;
		}
		let block_width = fine_width / coarse_width;
		let block_height = fine_height / coarse_height;
		let mut lookup = vec![0u32; fine_width as usize * fine_height as usize];
		for region_row in 0..coarse_height {
			for region_column in 0..coarse_width {
				let region = region_row * coarse_width + region_column;
				for row in region_row * block_height..(region_row + 1) * block_height {
					for column in region_column * block_width..(region_column + 1) * block_width {
						lookup[(row * fine_width + column) as usize] = region;
					}
				}
			}
		}
		Some(GridPair {
			coarse_width,
			coarse_height,
			lookup,
		})
	}
	/// The coarse region containing a fine tile
	pub fn region_of(&self, fine_tile: TileIndex) -> u32 {
		self.lookup[fine_tile.usize()]
	}
	/// Total number of coarse regions
	pub fn region_count(&self) -> usize {
		self.coarse_width as usize * self.coarse_height as usize
	}
	/// Columns of the coarse grid
	pub fn get_coarse_width(&self) -> u32 {
		self.coarse_width
	}
	/// Rows of the coarse grid
	pub fn get_coarse_height(&self) -> u32 {
		self.coarse_height
	}
	/// The `(column, row)` position of a region on the coarse grid
	pub fn region_position(&self, region: u32) -> (u32, u32) {
		(region % self.coarse_width, region / self.coarse_width)
	}
	/// The region at a `(column, row)` position on the coarse grid
	pub fn region_at(&self, column: u32, row: u32) -> u32 {
		row * self.coarse_width + column
	}
}

/// Identity of a fine/coarse grid pairing
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct GridPairKey {
	/// Fine grid `(width, height)`
	fine: (u32, u32),
	/// Coarse grid `(width, height)`
	coarse: (u32, u32),
}

/// Explicit registry of mappings keyed by grid-pair identity, owned by the
/// engine instance. A malformed pairing is cached as [None] once so broken
/// pairs are never repeatedly rebuilt and queries degrade straight to an
/// unrestricted search
#[derive(Default)]
pub struct MappingRegistry {
	/// Built mappings, [None] recording an unsupported dimension pairing
	cached: HashMap<GridPairKey, Option<GridPair>>,
}

impl MappingRegistry {
	/// Create a new empty instance of [MappingRegistry]
	pub fn new() -> Self {
		MappingRegistry::default()
	}
	/// Get the mapping for a grid pair, building and caching it on first
	/// sight. Returns [None] for unsupported pairings
	pub fn resolve<F: TileGrid, C: TileGrid>(&mut self, fine: &F, coarse: &C) -> Option<&GridPair> {
		let key = GridPairKey {
			fine: (fine.width(), fine.height()),
			coarse: (coarse.width(), coarse.height()),
		};
		self.cached
			.entry(key)
			.or_insert_with(|| {
				GridPair::build(fine.width(), fine.height(), coarse.width(), coarse.height())
			})
			.as_ref()
	}
	/// Number of grid pairs seen so far, supported or not
	pub fn len(&self) -> usize {
		self.cached.len()
	}
	/// Whether no grid pair has been resolved yet
	pub fn is_empty(&self) -> bool {
		self.cached.is_empty()
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn block_assignment() {
		let pair = GridPair::build(10, 10, 5, 5).unwrap();
		// 2x2 blocks: fine (0,0) and (1,1) share region 0, (2,0) starts region 1
		let fine = WaterGrid::new(10, 10);
		assert_eq!(0, pair.region_of(fine.tile_at(0, 0)));
		assert_eq!(0, pair.region_of(fine.tile_at(1, 1)));
		assert_eq!(1, pair.region_of(fine.tile_at(2, 0)));
		assert_eq!(24, pair.region_of(fine.tile_at(9, 9)));
	}
	#[test]
	fn block_assignment_rectangular() {
		let pair = GridPair::build(12, 6, 4, 2).unwrap();
		// 3x3 blocks on a 4x2 coarse grid
		let fine = WaterGrid::new(12, 6);
		assert_eq!(0, pair.region_of(fine.tile_at(2, 2)));
		assert_eq!(3, pair.region_of(fine.tile_at(11, 0)));
		assert_eq!(4, pair.region_of(fine.tile_at(0, 3)));
		assert_eq!(7, pair.region_of(fine.tile_at(11, 5)));
	}
	#[test]
	fn ragged_pairing_unsupported() {
		let result = GridPair::build(10, 10, 3, 5);
		assert!(result.is_none());
	}
	#[test]
	fn region_position_round_trip() {
		let pair = GridPair::build(20, 20, 4, 4).unwrap();
		let region = pair.region_at(3, 2);
		let result = pair.region_position(region);
		let actual = (3, 2);
		assert_eq!(actual, result);
	}
	#[test]
	fn registry_caches_pairs() {
		let fine = WaterGrid::new(10, 10);
		let coarse = WaterGrid::new(5, 5);
		let mut registry = MappingRegistry::new();
		assert!(registry.resolve(&fine, &coarse).is_some());
		assert!(registry.resolve(&fine, &coarse).is_some());
		let result = registry.len();
		let actual = 1;
		assert_eq!(actual, result);
	}
	#[test]
	fn registry_caches_unsupported_pairs() {
		let fine = WaterGrid::new(10, 10);
		let coarse = WaterGrid::new(3, 5);
		let mut registry = MappingRegistry::new();
		assert!(registry.resolve(&fine, &coarse).is_none());
		assert!(registry.resolve(&fine, &coarse).is_none());
		let result = registry.len();
		let actual = 1;
		assert_eq!(actual, result);
	}
}
