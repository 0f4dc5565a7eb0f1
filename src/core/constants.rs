//! Core constants derived from common web-map conventions.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude at which the spherical mercator plane becomes square.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Highest zoom level the engine draws; deeper requests are clamped to it.
pub const MAX_ZOOM: u8 = 30;

/// Spare tiles kept on each side of the visible area.
pub const DEFAULT_TILE_BUFFER: u32 = 1;

/// Fade-in applied to a tile once its image has loaded.
pub const FADE_IN_MS: u64 = 250;

/// Scheme prepended to every tile URL.
pub const TILE_URL_SCHEME: &str = "http://";
