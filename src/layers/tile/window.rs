//! The rectangle of tile addresses currently materialized as visuals.

use serde::{Deserialize, Serialize};

use crate::core::geo::{GridSize, Point, TileAddress};

/// Column/row position inside the tile grid, zoom implied by the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i64,
    pub y: i64,
}

impl GridPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Whole-tile pan offset of the layer container
pub type TileOffset = GridPoint;

/// Side of the window rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    pub fn opposite(self) -> Edge {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
            Edge::Top => Edge::Bottom,
            Edge::Bottom => Edge::Top,
        }
    }
}

/// Visible tile rectangle plus the pixel alignment of its central tile.
///
/// `left_top` and `right_bottom` are inclusive. Both are kept ordered after
/// every mutation; an inverted rectangle is a bug and panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportWindow {
    pub(crate) left_top: GridPoint,
    pub(crate) right_bottom: GridPoint,
    pub(crate) central_tile: TileAddress,
    pub(crate) central_tile_pixel: Point,
    pub(crate) container_offset: TileOffset,
}

impl ViewportWindow {
    /// Window of `grid` tiles around `central_tile`.
    ///
    /// The central tile sits at column `width / 2` and row `height / 2` of the
    /// window so the rectangle holds exactly `width * height` tiles.
    pub fn around(central_tile: TileAddress, central_tile_pixel: Point, grid: GridSize) -> Self {
        let grid = GridSize::new(grid.width, grid.height);
        let left_top = GridPoint::new(
            central_tile.x - (grid.width / 2) as i64,
            central_tile.y - (grid.height / 2) as i64,
        );
        let right_bottom = GridPoint::new(
            left_top.x + grid.width as i64 - 1,
            left_top.y + grid.height as i64 - 1,
        );

        let window = Self {
            left_top,
            right_bottom,
            central_tile,
            central_tile_pixel,
            container_offset: TileOffset::default(),
        };
        window.assert_ordered();
        window
    }

    pub fn left_top(&self) -> GridPoint {
        self.left_top
    }

    pub fn right_bottom(&self) -> GridPoint {
        self.right_bottom
    }

    pub fn central_tile(&self) -> TileAddress {
        self.central_tile
    }

    pub fn central_tile_pixel(&self) -> Point {
        self.central_tile_pixel
    }

    pub fn container_offset(&self) -> TileOffset {
        self.container_offset
    }

    pub fn zoom(&self) -> u8 {
        self.central_tile.z
    }

    pub fn width(&self) -> u64 {
        (self.right_bottom.x - self.left_top.x + 1) as u64
    }

    pub fn height(&self) -> u64 {
        (self.right_bottom.y - self.left_top.y + 1) as u64
    }

    pub fn tile_count(&self) -> u64 {
        self.width() * self.height()
    }

    pub fn contains(&self, address: &TileAddress) -> bool {
        address.z == self.zoom()
            && (self.left_top.x..=self.right_bottom.x).contains(&address.x)
            && (self.left_top.y..=self.right_bottom.y).contains(&address.y)
    }

    /// Every address in the window, row by row
    pub fn addresses(&self) -> impl Iterator<Item = TileAddress> + '_ {
        let z = self.zoom();
        (self.left_top.y..=self.right_bottom.y).flat_map(move |y| {
            (self.left_top.x..=self.right_bottom.x).map(move |x| TileAddress::new(x, y, z))
        })
    }

    /// Addresses forming the current line along `edge`
    pub fn edge_line(&self, edge: Edge) -> Vec<TileAddress> {
        let z = self.zoom();
        match edge {
            Edge::Left | Edge::Right => {
                let x = if edge == Edge::Left {
                    self.left_top.x
                } else {
                    self.right_bottom.x
                };
                (self.left_top.y..=self.right_bottom.y)
                    .map(|y| TileAddress::new(x, y, z))
                    .collect()
            }
            Edge::Top | Edge::Bottom => {
                let y = if edge == Edge::Top {
                    self.left_top.y
                } else {
                    self.right_bottom.y
                };
                (self.left_top.x..=self.right_bottom.x)
                    .map(|x| TileAddress::new(x, y, z))
                    .collect()
            }
        }
    }

    /// Edges of the window `address` lies on; empty for interior tiles
    pub fn edges_of(&self, address: &TileAddress) -> Vec<Edge> {
        if !self.contains(address) {
            return Vec::new();
        }
        Edge::ALL
            .into_iter()
            .filter(|edge| match edge {
                Edge::Left => address.x == self.left_top.x,
                Edge::Right => address.x == self.right_bottom.x,
                Edge::Top => address.y == self.left_top.y,
                Edge::Bottom => address.y == self.right_bottom.y,
            })
            .collect()
    }

    /// Screen position of `address` relative to the central tile
    pub fn pixel_for(&self, address: &TileAddress, tile_size: u32) -> Point {
        let size = tile_size as f64;
        Point::new(
            self.central_tile_pixel.x + (address.x - self.central_tile.x) as f64 * size,
            self.central_tile_pixel.y + (address.y - self.central_tile.y) as f64 * size,
        )
    }

    /// Grow by one line beyond `edge`; returns the new line's addresses
    pub(crate) fn extend(&mut self, edge: Edge) -> Vec<TileAddress> {
        match edge {
            Edge::Left => self.left_top.x -= 1,
            Edge::Right => self.right_bottom.x += 1,
            Edge::Top => self.left_top.y -= 1,
            Edge::Bottom => self.right_bottom.y += 1,
        }
        self.edge_line(edge)
    }

    /// Drop the line along `edge`; returns the dropped addresses
    pub(crate) fn retract(&mut self, edge: Edge) -> Vec<TileAddress> {
        let dropped = self.edge_line(edge);
        match edge {
            Edge::Left => self.left_top.x += 1,
            Edge::Right => self.right_bottom.x -= 1,
            Edge::Top => self.left_top.y += 1,
            Edge::Bottom => self.right_bottom.y -= 1,
        }
        self.assert_ordered();
        dropped
    }

    pub(crate) fn assert_ordered(&self) {
        assert!(
            self.left_top.x <= self.right_bottom.x && self.left_top.y <= self.right_bottom.y,
            "viewport window inverted: {:?} .. {:?}",
            self.left_top,
            self.right_bottom
        );
    }
}
