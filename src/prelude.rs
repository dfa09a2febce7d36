//! `use bevy_sea_lane_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::routing::{
	corridor::*, grid::*, mapping::*, planner::*, scratch::*, search::*, utilities::*, *,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{route_layer::*, water_layer::*, *},
};
