//! Logic relating to answering route requests and caching the results
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A request to find a route from a source tile to a goal tile. The source
/// does not need to be open water: a request from a land tile (a pier, a
/// shipyard) plants seeds on every adjacent water tile instead, all carrying
/// the land tile as their origin
#[derive(Event)]
pub struct EventRouteRequest {
	/// Tile the route should start from
	source: TileIndex,
	/// Tile the route should reach
	goal: TileIndex,
	/// Query options forwarded to the planner
	options: RouteQueryOptions,
}

impl EventRouteRequest {
	/// Create a new instance of [EventRouteRequest]
	pub fn new(source: TileIndex, goal: TileIndex, options: RouteQueryOptions) -> Self {
		EventRouteRequest {
			source,
			goal,
			options,
		}
	}
	/// Get the tile the route should start from
	pub fn get_source(&self) -> TileIndex {
		self.source
	}
	/// Get the tile the route should reach
	pub fn get_goal(&self) -> TileIndex {
		self.goal
	}
	/// Get the query options
	pub fn get_options(&self) -> &RouteQueryOptions {
		&self.options
	}
}

/// The seeds a route query should start from. A water source seeds itself;
/// a land source seeds every adjacent water tile with the land tile as the
/// propagated origin, so the winning path still reports where the boat
/// launched from
pub fn launch_seeds(grid: &WaterGrid, source: TileIndex) -> Vec<RouteSeed> {
	if !grid.contains(source) {
		return Vec::new();
	}
	if grid.is_water(source) {
		return vec![RouteSeed::from_entry(source)];
	}
	let mut seeds = Vec::new();
	for ordinal in SWEEP_KING.iter() {
		if let Some(entry) = grid.neighbour(source, *ordinal) {
			if grid.is_water(entry) {
				seeds.push(RouteSeed::new(entry, source));
			}
		}
	}
	seeds
}

/// Process [EventRouteRequest] and generate routes to go into the
/// [RouteCache]
#[cfg(not(tarpaulin_include))]
pub fn process_route_requests(
	mut events: EventReader<EventRouteRequest>,
	mut cache_q: Query<(
		&WaterGrid,
		&CoarseGrid,
		&mut RoutePlanner,
		&mut RouteCache,
	)>,
	time: Res<Time>,
) {
	for event in events.read() {
		for (water_grid, coarse_grid, mut planner, mut cache) in cache_q.iter_mut() {
			// only run if the cache doesn't contain the route already
			if cache.contains_route(event.get_source(), event.get_goal()) {
				continue;
			}
			let seeds = launch_seeds(water_grid, event.get_source());
			if seeds.is_empty() {
				debug!(
					"Route request from {:?} has no water to launch from",
					event.get_source()
				);
				continue;
			}
			let targets = [event.get_goal()];
			if let Some(route) = planner.find_route(
				water_grid,
				coarse_grid.get(),
				&seeds,
				&targets,
				event.get_options(),
			) {
				cache.insert_route(
					event.get_source(),
					event.get_goal(),
					time.elapsed(),
					route,
				);
			} else {
				debug!(
					"No route exists from {:?} to {:?}",
					event.get_source(),
					event.get_goal()
				);
			}
		}
	}
}

/// Purge any routes older than 15 minutes
#[cfg(not(tarpaulin_include))]
pub fn cleanup_old_routes(mut q_route_cache: Query<&mut RouteCache>, time: Res<Time>) {
	for mut cache in q_route_cache.iter_mut() {
		let mut routes_to_purge = Vec::new();
		for data in cache.get_mut().keys() {
			let elapsed = time.elapsed();
			let diff = elapsed.saturating_sub(data.get_time_generated());
			if diff.as_secs() > 900 {
				routes_to_purge.push(*data);
			}
		}
		for purge in routes_to_purge.iter() {
			cache.remove_route(*purge);
		}
	}
}
