//! Useful structures and tools used by the grids and searches
//!

/// Convenience way of accessing the 4 orthogonal sides of a tile and the 8
/// directions of movement used when king-moves are enabled
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
}

/// Expansion order of a 4-connected search
pub const SWEEP_ORTHOGONAL: [Ordinal; 4] =
	[Ordinal::North, Ordinal::East, Ordinal::South, Ordinal::West];

/// Expansion order of an 8-connected search. Searches must always walk
/// neighbours in this order so that equal-length routes resolve identically
/// on every run and every platform
pub const SWEEP_KING: [Ordinal; 8] = [
	Ordinal::North,
	Ordinal::East,
	Ordinal::South,
	Ordinal::West,
	Ordinal::NorthEast,
	Ordinal::SouthEast,
	Ordinal::SouthWest,
	Ordinal::NorthWest,
];

impl Ordinal {
	/// The `(column, row)` delta of stepping one tile towards the [Ordinal]
	pub fn offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (0, -1),
			Ordinal::East => (1, 0),
			Ordinal::South => (0, 1),
			Ordinal::West => (-1, 0),
			Ordinal::NorthEast => (1, -1),
			Ordinal::SouthEast => (1, 1),
			Ordinal::SouthWest => (-1, 1),
			Ordinal::NorthWest => (-1, -1),
		}
	}
	/// Whether the [Ordinal] is one of the four diagonal directions
	pub fn is_diagonal(&self) -> bool {
		matches!(
			self,
			Ordinal::NorthEast | Ordinal::SouthEast | Ordinal::SouthWest | Ordinal::NorthWest
		)
	}
	/// For a diagonal [Ordinal] the two orthogonal directions either side of
	/// it - the "shoulders" a boat must clear for the diagonal move to be
	/// legal when corner cutting is forbidden. Returns [None] for orthogonal
	/// directions
	pub fn shoulders(&self) -> Option<(Ordinal, Ordinal)> {
		match self {
			Ordinal::NorthEast => Some((Ordinal::North, Ordinal::East)),
			Ordinal::SouthEast => Some((Ordinal::South, Ordinal::East)),
			Ordinal::SouthWest => Some((Ordinal::South, Ordinal::West)),
			Ordinal::NorthWest => Some((Ordinal::North, Ordinal::West)),
			_ => None,
		}
	}
	/// Returns the opposite [Ordinal] of the current
	pub fn inverse(&self) -> Ordinal {
		match self {
			Ordinal::North => Ordinal::South,
			Ordinal::East => Ordinal::West,
			Ordinal::South => Ordinal::North,
			Ordinal::West => Ordinal::East,
			Ordinal::NorthEast => Ordinal::SouthWest,
			Ordinal::SouthEast => Ordinal::NorthWest,
			Ordinal::SouthWest => Ordinal::NorthEast,
			Ordinal::NorthWest => Ordinal::SouthEast,
		}
	}
}

/// Chebyshev (king-move) distance between two `(column, row)` positions
pub fn chebyshev_distance(a: (u32, u32), b: (u32, u32)) -> u32 {
	let dc = a.0.abs_diff(b.0);
	let dr = a.1.abs_diff(b.1);
	dc.max(dr)
}
