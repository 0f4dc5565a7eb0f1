//! Prelude module for common tilegrid types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tilegrid::prelude::*;`

pub use crate::core::{
    config::{ConfigError, TileLayerOptions},
    geo::{GeoPoint, GridSize, Point, ProjectedPoint, Size, TileAddress},
    projection::{global_size, Projection, SphericalMercator},
};

pub use crate::layers::tile::{
    CommandSender, Edge, EngineCommand, EngineState, LoadCallback, LoadOutcome, MemorySink,
    RecordingObserver, RenderSink, TileDescriptor, TileEventObserver, TileGridEngine, TileHandle,
    TileLayer, TileLoadState, ViewportWindow,
};

#[cfg(feature = "fetch")]
pub use crate::layers::tile::FetchingSink;

pub use crate::input::events::{EventHandled, MapEvent, MapView};

pub use crate::tiles::source::{address_for, url_for, TemplateSource, TileSource};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
