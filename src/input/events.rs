use serde::{Deserialize, Serialize};

use crate::core::geo::{GeoPoint, Point, Size};

/// Map notifications a tile layer reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// Map center moved without a drag
    CenterChanged { center: GeoPoint },
    /// Zoom level changed
    ZoomChanged { zoom: u8 },
    /// Pointer pressed on the map, a drag may follow
    DragStart,
    /// Drag in progress; pixels are in viewport coordinates
    Drag {
        start_pixel: Point,
        current_pixel: Point,
    },
    /// Drag finished
    DragEnd,
    /// Map container resized
    Resize { size: Size },
}

/// Whether an event was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

/// Snapshot of the map a layer is added to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    pub size: Size,
}

impl MapView {
    pub fn new(center: GeoPoint, zoom: u8, size: Size) -> Self {
        Self { center, zoom, size }
    }
}
