use serde::{Deserialize, Serialize};

use crate::core::constants::MAX_LATITUDE;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a new GeoPoint coordinate
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when the latitude lies inside the band the mercator plane can represent
    pub fn is_projectable(&self) -> bool {
        self.lat > -MAX_LATITUDE && self.lat < MAX_LATITUDE && self.lon.is_finite()
    }

    /// Wraps longitude to the [-180, 180) range
    pub fn wrap_lon(lon: f64) -> f64 {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }

    /// Returns a copy with the longitude wrapped, latitude untouched
    pub fn wrapped(&self) -> Self {
        Self::new(self.lat, Self::wrap_lon(self.lon))
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A position on the global projected pixel plane
pub type ProjectedPoint = Point;

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    /// Drops the fractional part of both axes, rounding toward zero
    pub fn trunc(&self) -> Point {
        Point::new(self.x.trunc(), self.y.trunc())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Pixel dimensions of a viewport or container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Number of tile columns and rows a viewport window spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    /// Creates a grid size; both axes are raised to at least one tile
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Tiles needed to cover `viewport` plus `buffer` spare tiles on each side
    pub fn covering(viewport: Size, tile_size: u32, buffer: u32) -> Self {
        let tile_size = tile_size.max(1) as f64;
        let across = |px: f64| (px.max(0.0) / tile_size).ceil() as u32;
        Self::new(
            buffer * 2 + across(viewport.width),
            buffer * 2 + across(viewport.height),
        )
    }

    pub fn tile_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Represents a tile address in the slippy map tile system.
///
/// Columns and rows are signed: a viewport window may extend past the edges of
/// the `2^z` grid, see [`TileAddress::wrapped`] and [`TileAddress::is_in_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    pub x: i64,
    pub y: i64,
    pub z: u8,
}

impl TileAddress {
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Number of columns (and rows) in the grid at this address' zoom
    pub fn grid_extent(&self) -> i64 {
        1i64 << self.z
    }

    /// Rows outside the grid have no tile on any server
    pub fn is_in_grid(&self) -> bool {
        (0..self.grid_extent()).contains(&self.y)
    }

    /// Wraps the column into `[0, 2^z)`; longitude repeats, latitude does not
    pub fn wrapped(&self) -> Self {
        Self::new(self.x.rem_euclid(self.grid_extent()), self.y, self.z)
    }

    /// Origin of the tile on the global projected plane
    pub fn origin_pixel(&self, tile_size: u32) -> Point {
        Point::new(
            self.x as f64 * tile_size as f64,
            self.y as f64 * tile_size as f64,
        )
    }
}

impl std::fmt::Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lon() {
        assert_eq!(GeoPoint::wrap_lon(0.0), 0.0);
        assert_eq!(GeoPoint::wrap_lon(180.0), -180.0);
        assert_eq!(GeoPoint::wrap_lon(-180.0), -180.0);
        assert!((GeoPoint::wrap_lon(190.0) - -170.0).abs() < 1e-9);
        assert!((GeoPoint::wrap_lon(-540.0) - -180.0).abs() < 1e-9);
    }

    #[test]
    fn test_projectable_band() {
        assert!(GeoPoint::new(85.0, 10.0).is_projectable());
        assert!(!GeoPoint::new(85.06, 10.0).is_projectable());
        assert!(!GeoPoint::new(-90.0, 10.0).is_projectable());
    }

    #[test]
    fn test_grid_size_covering() {
        let grid = GridSize::covering(Size::new(800.0, 600.0), 256, 1);
        assert_eq!(grid, GridSize::new(6, 5));
        assert_eq!(grid.tile_count(), 30);

        let empty = GridSize::covering(Size::default(), 256, 0);
        assert_eq!(empty, GridSize::new(1, 1));
    }

    #[test]
    fn test_tile_address_wrapping() {
        let tile = TileAddress::new(-1, 2, 2);
        assert_eq!(tile.wrapped(), TileAddress::new(3, 2, 2));
        assert!(tile.is_in_grid());
        assert!(!TileAddress::new(0, 4, 2).is_in_grid());
        assert!(!TileAddress::new(0, -1, 2).is_in_grid());
        assert_eq!(TileAddress::new(5, 1, 2).wrapped().x, 1);
    }

    #[test]
    fn test_tile_address_display() {
        assert_eq!(TileAddress::new(3, 5, 10).to_string(), "10/3/5");
    }
}
