//! Tile addressing and the water grids searched by the engine
//!
//! A map is a row-major `W×H` grid of tiles where each tile is either open
//! water or land. Two grids exist side by side: the full resolution grid
//! that authoritative routes are found on and an optional downsampled grid
//! used for cheap global planning. Both are represented by [WaterGrid] and
//! a tile of one grid must never be compared against a tile of the other
//! without going through [crate::prelude::GridPair].
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Dense row-major address of one tile of a grid. For a grid of width `w`
/// the tile at `(column, row)` has the index `row * w + column` and valid
/// indices sit in `[0, w * h)`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct TileIndex(u32);

impl TileIndex {
	/// Create a new instance of [TileIndex]
	pub fn new(index: u32) -> Self {
		TileIndex(index)
	}
	/// Get the raw index
	pub fn get(&self) -> u32 {
		self.0
	}
	/// Get the raw index widened for array addressing
	pub fn usize(&self) -> usize {
		self.0 as usize
	}
}

/// Defines required access to a searchable tile grid. Searches only ever ask
/// a grid for its dimensions and whether a tile is open water, everything
/// else is derived
pub trait TileGrid {
	/// Number of tile columns
	fn width(&self) -> u32;
	/// Number of tile rows
	fn height(&self) -> u32;
	/// Whether the tile is open water, i.e traversable. Must only be called
	/// with a tile inside the grid bounds
	fn is_water(&self, tile: TileIndex) -> bool;
	/// Total number of tiles in the grid
	fn tile_count(&self) -> usize {
		self.width() as usize * self.height() as usize
	}
	/// Whether the tile index addresses a tile inside the grid
	fn contains(&self, tile: TileIndex) -> bool {
		tile.usize() < self.tile_count()
	}
	/// The column of a tile
	fn column(&self, tile: TileIndex) -> u32 {
		tile.get() % self.width()
	}
	/// The row of a tile
	fn row(&self, tile: TileIndex) -> u32 {
		tile.get() / self.width()
	}
	/// Create a [TileIndex] from a `(column, row)` position. Panics if the
	/// position is outside the grid
	fn tile_at(&self, column: u32, row: u32) -> TileIndex {
		if column >= self.width() || row >= self.height() {
			panic!(
				"Tile ({}, {}) is outside of a {}x{} grid",
				column,
				row,
				self.width(),
				self.height()
			);
		}
		TileIndex::new(row * self.width() + column)
	}
	/// Step one tile towards an [Ordinal], returning [None] at the grid edge
	fn neighbour(&self, tile: TileIndex, ordinal: Ordinal) -> Option<TileIndex> {
		let (delta_column, delta_row) = ordinal.offset();
		let column = self.column(tile) as i64 + delta_column as i64;
		let row = self.row(tile) as i64 + delta_row as i64;
		if column < 0 || row < 0 || column >= self.width() as i64 || row >= self.height() as i64 {
			None
		} else {
			Some(TileIndex::new(
				row as u32 * self.width() + column as u32,
			))
		}
	}
}

/// Row-major storage of which tiles of a map are open water. Used both for
/// the authoritative full resolution grid and for downsampled planning grids
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Component, Clone, Default, Reflect)]
pub struct WaterGrid {
	/// Number of tile columns
	width: u32,
	/// Number of tile rows
	height: u32,
	/// Whether each tile is open water, indexed by [TileIndex]
	tiles: Vec<bool>,
}

impl TileGrid for WaterGrid {
	fn width(&self) -> u32 {
		self.width
	}
	fn height(&self) -> u32 {
		self.height
	}
	fn is_water(&self, tile: TileIndex) -> bool {
		self.tiles[tile.usize()]
	}
}

impl WaterGrid {
	/// Create a new instance of [WaterGrid] where every tile is open water
	pub fn new(width: u32, height: u32) -> Self {
		if width == 0 || height == 0 {
			panic!("WaterGrid dimensions must be non-zero, got ({}, {})", width, height);
		}
		WaterGrid {
			width,
			height,
			tiles: vec![true; width as usize * height as usize],
		}
	}
	/// Create a new instance of [WaterGrid] from raw row-major tile data.
	/// Panics if the data length does not match the dimensions
	pub fn from_tiles(width: u32, height: u32, tiles: Vec<bool>) -> Self {
		if tiles.len() != width as usize * height as usize {
			panic!(
				"WaterGrid of ({}, {}) requires {} tiles, got {}",
				width,
				height,
				width as usize * height as usize,
				tiles.len()
			);
		}
		WaterGrid {
			width,
			height,
			tiles,
		}
	}
	/// Mark a tile as open water or land. Panics if the tile is outside the
	/// grid
	pub fn set_water(&mut self, tile: TileIndex, water: bool) {
		if !self.contains(tile) {
			panic!(
				"Cannot set tile {}, grid only holds {} tiles",
				tile.get(),
				self.tile_count()
			);
		}
		self.tiles[tile.usize()] = water;
	}
	/// Build a downsampled planning grid where one coarse tile covers a
	/// `factor x factor` block of this grid. A coarse tile is open water when
	/// any tile of its block is, so the coarse grid never hides a route that
	/// exists at full resolution. Returns [None] when the dimensions are not
	/// an exact multiple of `factor`
	pub fn downsample(&self, factor: u32) -> Option<WaterGrid> {
		if factor == 0 || self.width % factor != 0 || self.height % factor != 0 {
			return None;
		}
		let coarse_width = self.width / factor;
		let coarse_height = self.height / factor;
		let mut coarse = WaterGrid {
			width: coarse_width,
			height: coarse_height,
			tiles: vec![false; coarse_width as usize * coarse_height as usize],
		};
		for coarse_row in 0..coarse_height {
			for coarse_column in 0..coarse_width {
				let coarse_tile = coarse.tile_at(coarse_column, coarse_row);
				coarse.tiles[coarse_tile.usize()] =
					self.is_block_water(coarse_column, coarse_row, factor);
			}
		}
		Some(coarse)
	}
	/// Whether any tile of the `factor x factor` block starting at
	/// `(block_column * factor, block_row * factor)` is open water
	fn is_block_water(&self, block_column: u32, block_row: u32, factor: u32) -> bool {
		for row in block_row * factor..(block_row + 1) * factor {
			for column in block_column * factor..(block_column + 1) * factor {
				if self.is_water(self.tile_at(column, row)) {
					return true;
				}
			}
		}
		false
	}
	/// From a `ron` file generate the [WaterGrid]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: String) -> Self {
		let file = std::fs::File::open(path).expect("Failed opening WaterGrid file");
		let grid: WaterGrid = match ron::de::from_reader(file) {
			Ok(grid) => grid,
			Err(e) => panic!("Failed deserializing WaterGrid: {}", e),
		};
		if grid.tiles.len() != grid.width as usize * grid.height as usize {
			panic!(
				"WaterGrid file of ({}, {}) holds {} tiles",
				grid.width,
				grid.height,
				grid.tiles.len()
			);
		}
		grid
	}
	/// From a `csv` sheet of `0` (land) and `1` (water) values generate the
	/// [WaterGrid], one record per tile row
	#[cfg(feature = "csv")]
	pub fn from_csv(path: String) -> Self {
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(false)
			.from_path(path)
			.expect("Failed opening WaterGrid csv");
		let mut width = 0;
		let mut height = 0;
		let mut tiles = Vec::new();
		for record in reader.records() {
			let record = record.expect("Failed reading WaterGrid csv record");
			if width == 0 {
				width = record.len() as u32;
			} else if width != record.len() as u32 {
				panic!(
					"WaterGrid csv rows must share a length, found {} and {}",
					width,
					record.len()
				);
			}
			for value in record.iter() {
				match value.trim() {
					"0" => tiles.push(false),
					"1" => tiles.push(true),
					v => panic!("WaterGrid csv values must be 0 or 1, found `{}`", v),
				}
			}
			height += 1;
		}
		WaterGrid::from_tiles(width, height, tiles)
	}
}

/// The optional downsampled planning grid of a map. Holds the factor used
/// to derive it from the full resolution [WaterGrid] so individual blocks
/// can be refreshed when the water changes. An absent planning grid is a
/// valid state and simply degrades queries to unrestricted full resolution
/// searches
#[derive(Component, Default)]
pub struct CoarseGrid {
	/// Number of full resolution tiles per side of one coarse tile
	factor: u32,
	/// The downsampled grid, [None] when coarse planning is disabled
	grid: Option<WaterGrid>,
}

impl CoarseGrid {
	/// Create a new instance of [CoarseGrid] with no planning grid
	pub fn none() -> Self {
		CoarseGrid::default()
	}
	/// Create a new instance of [CoarseGrid] by downsampling a full
	/// resolution grid. Panics if the grid dimensions are not an exact
	/// multiple of `factor`
	pub fn from_factor(fine: &WaterGrid, factor: u32) -> Self {
		match fine.downsample(factor) {
			Some(grid) => CoarseGrid {
				factor,
				grid: Some(grid),
			},
			None => panic!(
				"Cannot downsample a ({}, {}) grid by {}, dimensions must be exact multiples",
				fine.width(),
				fine.height(),
				factor
			),
		}
	}
	/// Get the planning grid if one is enabled
	pub fn get(&self) -> Option<&WaterGrid> {
		self.grid.as_ref()
	}
	/// Get the downsampling factor
	pub fn get_factor(&self) -> u32 {
		self.factor
	}
	/// Recompute the single coarse tile covering a full resolution tile
	/// after the water there changed
	pub fn refresh_block(&mut self, fine: &WaterGrid, changed: TileIndex) {
		if let Some(coarse) = self.grid.as_mut() {
			let block_column = fine.column(changed) / self.factor;
			let block_row = fine.row(changed) / self.factor;
			let coarse_tile = coarse.tile_at(block_column, block_row);
			let water = fine.is_block_water(block_column, block_row, self.factor);
			coarse.set_water(coarse_tile, water);
		}
	}
}

/// The dimensions of the world and the number of world units covered by a
/// single tile. Used to translate between world-space positions and the
/// [TileIndex] addresses the engine works in
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Component, Default, Clone, Copy, Reflect)]
pub struct MapDimensions {
	/// Dimensions of the world
	///
	/// ## In 3d
	///
	/// This is taken as `(x, z)` dimensions of the world
	///
	/// ## In 2d
	///
	/// This is taken as the `(x, y)` pixel dimensions of the world
	size: (u32, u32),
	/// The number of world units along each side of a tile. The world
	/// dimensions must be perfectly divisible by this number
	tile_resolution: u32,
}

impl MapDimensions {
	/// Create a new instance of [MapDimensions]. In 2d the dimensions should
	/// be measured in pixels, for 3d the recommendation is for a `unit` of
	/// space to be 1 meter
	pub fn new(length: u32, depth: u32, tile_resolution: u32) -> Self {
		if tile_resolution == 0 {
			panic!("Tile resolution cannot be zero");
		}
		let length_rem = length % tile_resolution;
		let depth_rem = depth % tile_resolution;
		if length_rem > 0 || depth_rem > 0 {
			panic!(
				"Map dimensions `({}, {})` cannot support tiles, dimensions must be exact factors of {}",
				length, depth, tile_resolution
			);
		}
		MapDimensions {
			size: (length, depth),
			tile_resolution,
		}
	}
	/// Number of `x` units in size
	pub fn get_length(&self) -> u32 {
		self.size.0
	}
	/// 2d: number of `y` units in size
	///
	/// 3d: number of `z` units in size
	pub fn get_depth(&self) -> u32 {
		self.size.1
	}
	/// Get the number of world units along each side of a tile
	pub fn get_tile_resolution(&self) -> u32 {
		self.tile_resolution
	}
	/// Number of tile columns the world is divided into
	pub fn get_tile_columns(&self) -> u32 {
		self.size.0 / self.tile_resolution
	}
	/// Number of tile rows the world is divided into
	pub fn get_tile_rows(&self) -> u32 {
		self.size.1 / self.tile_resolution
	}
	/// From a position in 2D `x, y` space with an origin at `(0, 0)` in the
	/// centre of the world calculate the tile that point resides in. The
	/// tile grid is positioned from the top-left corner of the map
	#[cfg(feature = "2d")]
	pub fn get_tile_from_xy(&self, position: Vec2) -> Option<TileIndex> {
		if position.x < -((self.get_length() / 2) as f32)
			|| position.x > (self.get_length() / 2) as f32
			|| position.y < -((self.get_depth() / 2) as f32)
			|| position.y > (self.get_depth() / 2) as f32
		{
			error!("Position is out of bounds of MapDimensions, x {}, y {}, cannot calculate TileIndex. Is the actor outside of the map or trying to request a route outside of it?", position.x, position.y);
			return None;
		}
		// translate world coords into a coordinate system with a (0, 0)
		// origin in the top left by offsetting with half the map dimensions
		let x_origin = position.x + (self.get_length() / 2) as f32;
		let y_origin = (self.get_depth() / 2) as f32 - position.y;
		let mut column = (x_origin / self.tile_resolution as f32).floor() as u32;
		let mut row = (y_origin / self.tile_resolution as f32).floor() as u32;
		// safety for x-y being at the exact limits of map size
		if column >= self.get_tile_columns() {
			column = self.get_tile_columns() - 1;
		}
		if row >= self.get_tile_rows() {
			row = self.get_tile_rows() - 1;
		}
		Some(TileIndex::new(row * self.get_tile_columns() + column))
	}
	/// From a tile retrieve the 2d `Vec2` of its centre in world space. If
	/// the tile sits outside of the world then [None] is returned
	#[cfg(feature = "2d")]
	pub fn get_xy_from_tile(&self, tile: TileIndex) -> Option<Vec2> {
		let columns = self.get_tile_columns();
		let rows = self.get_tile_rows();
		if tile.get() >= columns * rows {
			return None;
		}
		let column = tile.get() % columns;
		let row = tile.get() / columns;
		// the tile grid begins in the top left of a world centred at origin
		let x_origin = -(self.get_length() as f32) / 2.0;
		let y_origin = self.get_depth() as f32 / 2.0;
		let half_tile = self.tile_resolution as f32 / 2.0;
		let x = x_origin + column as f32 * self.tile_resolution as f32 + half_tile;
		let y = y_origin - (row as f32 * self.tile_resolution as f32 + half_tile);
		Some(Vec2::new(x, y))
	}
	/// From a position in `x, y, z` space calculate the tile that point
	/// resides in, where the water surface lies in the x-z plane
	#[cfg(feature = "3d")]
	pub fn get_tile_from_xyz(&self, position: Vec3) -> Option<TileIndex> {
		if position.x < -((self.get_length() / 2) as f32)
			|| position.x > (self.get_length() / 2) as f32
			|| position.z < -((self.get_depth() / 2) as f32)
			|| position.z > (self.get_depth() / 2) as f32
		{
			error!("Position is out of bounds of MapDimensions, x {}, z {}, cannot calculate TileIndex. Is the actor outside of the map or trying to request a route outside of it?", position.x, position.z);
			return None;
		}
		let x_origin = position.x + (self.get_length() / 2) as f32;
		let z_origin = (self.get_depth() / 2) as f32 + position.z;
		let mut column = (x_origin / self.tile_resolution as f32).floor() as u32;
		let mut row = (z_origin / self.tile_resolution as f32).floor() as u32;
		// safety for x-z being at the exact limits of map size
		if column >= self.get_tile_columns() {
			column = self.get_tile_columns() - 1;
		}
		if row >= self.get_tile_rows() {
			row = self.get_tile_rows() - 1;
		}
		Some(TileIndex::new(row * self.get_tile_columns() + column))
	}
	/// From a tile retrieve the `Vec3` of its centre in world space where
	/// the water surface lies in the x-z plane. The `y` coordinate is
	/// defaulted to `0.0`. If the tile sits outside of the world then [None]
	/// is returned
	#[cfg(feature = "3d")]
	pub fn get_xyz_from_tile(&self, tile: TileIndex) -> Option<Vec3> {
		let columns = self.get_tile_columns();
		let rows = self.get_tile_rows();
		if tile.get() >= columns * rows {
			return None;
		}
		let column = tile.get() % columns;
		let row = tile.get() / columns;
		let x_origin = -(self.get_length() as f32) / 2.0;
		let z_origin = -(self.get_depth() as f32) / 2.0;
		let half_tile = self.tile_resolution as f32 / 2.0;
		let x = x_origin + column as f32 * self.tile_resolution as f32 + half_tile;
		let z = z_origin + row as f32 * self.tile_resolution as f32 + half_tile;
		Some(Vec3::new(x, 0.0, z))
	}
}
