//! Defines the Bevy [Plugin] for SeaLane route searching
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod route_layer;
pub mod water_layer;

/// Ordering of the plugin systems: cache tidying always runs before any
/// grid mutation or route calculation of the same tick
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Cache purging
	Tidy,
	/// Grid mutation and route calculation
	Calculate,
}

/// Registers the events, types and systems that service water changes and
/// route requests
pub struct SeaLanePlugin;

impl Plugin for SeaLanePlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<TileIndex>()
			.register_type::<WaterGrid>()
			.register_type::<MapDimensions>()
			.register_type::<RouteQueryOptions>()
			.register_type::<RouteMetadata>()
			.add_event::<water_layer::EventUpdateWaterTile>()
			.add_event::<water_layer::EventCleanRoutes>()
			.add_event::<route_layer::EventRouteRequest>()
			.configure_sets(Update, (OrderingSet::Tidy, OrderingSet::Calculate).chain())
			.add_systems(
				Update,
				(
					route_layer::cleanup_old_routes.in_set(OrderingSet::Tidy),
					(
						water_layer::process_water_updates,
						water_layer::clean_cache,
						route_layer::process_route_requests,
					)
						.chain()
						.in_set(OrderingSet::Calculate),
				),
			);
	}
}
