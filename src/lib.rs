//! This is a plugin for Bevy game engine to find navigable water routes
//! across large tile maps with a hierarchical coarse-to-fine search
//!

pub mod bundle;
pub mod plugin;
pub mod routing;

pub mod prelude;
