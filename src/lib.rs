//! # tilegrid
//!
//! A tile-grid viewport engine for pannable, zoomable raster maps.
//!
//! The engine converts a geographic center and zoom into a window of tile
//! addresses, keeps one visual per address on a pluggable render surface and
//! follows drag gestures by swapping single rows and columns at the window's
//! edges instead of redrawing everything.

pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{ConfigError, TileLayerOptions},
    geo::{GeoPoint, GridSize, Point, ProjectedPoint, Size, TileAddress},
    projection::{Projection, SphericalMercator},
};

pub use layers::tile::{
    MemorySink, RenderSink, TileDescriptor, TileEventObserver, TileGridEngine, TileHandle,
    TileLayer, ViewportWindow,
};

pub use input::events::{EventHandled, MapEvent, MapView};

pub use tiles::source::{address_for, url_for, TemplateSource, TileSource};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tile engine has no window yet; call full_redraw first")]
    NotReady,

    #[error("Tile layer is not added to a map")]
    NotAttached,

    #[cfg(feature = "fetch")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[cfg(feature = "fetch")]
    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[cfg(feature = "fetch")]
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
}

/// Error type alias for convenience
pub type Error = MapError;
