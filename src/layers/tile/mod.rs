//! Tile layer implementation
//!
//! This module provides the tile-grid viewport engine and its collaborators:
//! - A viewport window of tile addresses kept in sync with a render surface
//! - Incremental edge swapping while the map is dragged
//! - Load tracking with fade-in and error placeholders
//! - A map-facing layer that reacts to center, zoom, drag and resize events

pub mod engine;
pub mod events;
pub mod layer;
pub mod sink;
pub mod window;

pub use engine::{EngineState, TileGridEngine, TileLoadState};
pub use events::{
    CommandSender, EngineCommand, LoadEvent, LoadOutcome, RecordingObserver, TileDescriptor,
    TileEventObserver, TileHandle,
};
pub use layer::TileLayer;
#[cfg(feature = "fetch")]
pub use sink::FetchingSink;
pub use sink::{LoadCallback, MemorySink, MemoryVisual, RenderSink};
pub use window::{Edge, GridPoint, TileOffset, ViewportWindow};
