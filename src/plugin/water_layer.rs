//! Logic for handling changes to a [WaterGrid] which in turn refreshes the
//! downsampled planning grid and cleans cached routes which may of been
//! made invalid by the change
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Used to change a tile of the [WaterGrid] between water and land
#[derive(Event)]
pub struct EventUpdateWaterTile {
	/// Tile to update
	tile: TileIndex,
	/// Whether the tile becomes open water
	water: bool,
}

impl EventUpdateWaterTile {
	/// Create a new instance of [EventUpdateWaterTile]
	#[cfg(not(tarpaulin_include))]
	pub fn new(tile: TileIndex, water: bool) -> Self {
		EventUpdateWaterTile { tile, water }
	}
	/// Get the tile to update
	#[cfg(not(tarpaulin_include))]
	pub fn get_tile(&self) -> TileIndex {
		self.tile
	}
	/// Get whether the tile becomes open water
	#[cfg(not(tarpaulin_include))]
	pub fn get_water(&self) -> bool {
		self.water
	}
}

/// For the given tile any cached route making use of it needs to have its
/// cache entry removed and a new request made to regenerate the route
#[derive(Event)]
pub struct EventCleanRoutes(TileIndex);

/// Read [EventUpdateWaterTile] and update the values within [WaterGrid] and
/// the downsampled planning grid
#[cfg(not(tarpaulin_include))]
pub fn process_water_updates(
	mut events: EventReader<EventUpdateWaterTile>,
	mut query: Query<(&mut WaterGrid, &mut CoarseGrid)>,
	mut event_cache_clean: EventWriter<EventCleanRoutes>,
) {
	// coalesce events to avoid cleaning the cache for duplicates
	let mut coalesced_tiles = Vec::new();
	for event in events.read() {
		let tile = event.get_tile();
		for (mut water_grid, mut coarse_grid) in query.iter_mut() {
			if !water_grid.contains(tile) {
				error!(
					"Cannot update water tile {:?}, grid only holds {} tiles",
					tile,
					water_grid.tile_count()
				);
				continue;
			}
			water_grid.set_water(tile, event.get_water());
			coarse_grid.refresh_block(water_grid.as_ref(), tile);
			if !coalesced_tiles.contains(&tile) {
				coalesced_tiles.push(tile);
			}
		}
	}
	for tile in coalesced_tiles.iter() {
		debug!("Water changed at tile {:?}, cleaning dependent routes", tile.get());
		event_cache_clean.write(EventCleanRoutes(*tile));
	}
}

/// Lookup any cached routes making use of tiles that have had their water
/// changed and remove them from the cache. Only routes that actually pass
/// through the changed tile (or start or end on it) can have been
/// invalidated - water opening elsewhere never breaks an existing route
#[cfg(not(tarpaulin_include))]
pub fn clean_cache(mut events: EventReader<EventCleanRoutes>, mut q_route: Query<&mut RouteCache>) {
	let mut tiles = Vec::new();
	for event in events.read() {
		tiles.push(event.0);
	}
	if !tiles.is_empty() {
		for mut route_cache in q_route.iter_mut() {
			let mut to_purge = Vec::new();
			let map = route_cache.get_mut();
			for tile in tiles.iter() {
				'next: for (metadata, route) in map.iter() {
					if *tile == metadata.get_source() {
						to_purge.push(*metadata);
						continue 'next;
					}
					if *tile == metadata.get_goal() {
						to_purge.push(*metadata);
						continue 'next;
					}
					for route_tile in route.get_tiles().iter() {
						if *tile == *route_tile {
							to_purge.push(*metadata);
							continue 'next;
						}
					}
				}
			}
			for purge_me in to_purge.iter() {
				route_cache.remove_route(*purge_me);
			}
		}
	}
}
