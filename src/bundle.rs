//!
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Everything an entity needs to answer route requests over a water map:
/// the full resolution grid, the optional downsampled planning grid, the
/// world-space dimensions, the planner owning all reusable search state and
/// the cache finished routes are published to
#[derive(Bundle)]
pub struct SeaLaneBundle {
	/// The authoritative full resolution water grid
	water_grid: WaterGrid,
	/// The optional downsampled planning grid
	coarse_grid: CoarseGrid,
	/// World-space dimensions for position-to-tile conversion
	map_dimensions: MapDimensions,
	/// The engine instance bound to the grids
	route_planner: RoutePlanner,
	/// Finished routes keyed by request
	route_cache: RouteCache,
}

impl SeaLaneBundle {
	/// Create a new instance of [SeaLaneBundle] from a prepared [WaterGrid].
	/// A `coarse_factor` of `0` disables coarse planning, otherwise it must
	/// exactly divide both grid dimensions. Panics if the grid does not
	/// match the tile counts of `map_dimensions`
	pub fn new(map_dimensions: MapDimensions, water_grid: WaterGrid, coarse_factor: u32) -> Self {
		if water_grid.width() != map_dimensions.get_tile_columns()
			|| water_grid.height() != map_dimensions.get_tile_rows()
		{
			panic!(
				"WaterGrid of ({}, {}) does not match MapDimensions of ({}, {}) tiles",
				water_grid.width(),
				water_grid.height(),
				map_dimensions.get_tile_columns(),
				map_dimensions.get_tile_rows()
			);
		}
		let coarse_grid = if coarse_factor == 0 {
			CoarseGrid::none()
		} else {
			CoarseGrid::from_factor(&water_grid, coarse_factor)
		};
		let route_planner = RoutePlanner::new(&water_grid, coarse_grid.get());
		SeaLaneBundle {
			water_grid,
			coarse_grid,
			map_dimensions,
			route_planner,
			route_cache: RouteCache::default(),
		}
	}
	/// Create a new instance of [SeaLaneBundle] where the [WaterGrid] is
	/// derived from disk
	#[cfg(feature = "ron")]
	pub fn new_from_disk(map_dimensions: MapDimensions, path: &str, coarse_factor: u32) -> Self {
		let water_grid = WaterGrid::from_ron(path.to_string());
		SeaLaneBundle::new(map_dimensions, water_grid, coarse_factor)
	}
}

// #[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn new_bundle() {
		let map_dimensions = MapDimensions::new(30, 30, 1);
		let _ = SeaLaneBundle::new(map_dimensions, WaterGrid::new(30, 30), 10);
		assert!(true)
	}
	#[test]
	fn new_bundle_without_coarse() {
		let map_dimensions = MapDimensions::new(30, 30, 1);
		let _ = SeaLaneBundle::new(map_dimensions, WaterGrid::new(30, 30), 0);
		assert!(true)
	}
	#[test]
	#[should_panic]
	fn mismatched_grid_dimensions() {
		let map_dimensions = MapDimensions::new(30, 30, 1);
		SeaLaneBundle::new(map_dimensions, WaterGrid::new(20, 30), 10);
	}
}
