//! Tile layer configuration
//!
//! Options are plain serde data so they can be loaded from JSON or built in
//! code. [`TileLayerOptions::validate`] runs before any engine is created; an
//! engine never exists with invalid options.

use serde::{Deserialize, Serialize};

use crate::core::constants::{DEFAULT_TILE_BUFFER, FADE_IN_MS, TILE_SIZE};

/// Configuration errors surfaced when a tile layer is constructed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("tile url template must not be empty")]
    EmptyUrl,

    #[error("at least one tile server subdomain is required")]
    NoSubdomains,

    #[error("subdomain at index {0} is empty")]
    EmptySubdomain(usize),

    #[error("tile size must be a positive number of pixels, got {0}")]
    InvalidTileSize(u32),
}

fn default_tile_buffer() -> u32 {
    DEFAULT_TILE_BUFFER
}

fn default_fade_in_ms() -> u64 {
    FADE_IN_MS
}

/// Configuration for a tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerOptions {
    /// URL template without scheme, e.g. `"tile.example.org/{z}/{x}/{y}.png"`
    pub url: String,
    /// Tile server shards; one is picked per tile
    pub subdomains: Vec<String>,
    /// Tile size in pixels
    pub tile_size: u32,
    /// Image shown in place of a tile that failed to load
    pub error_tile_url: String,
    /// Spare tiles kept on each side of the viewport
    #[serde(default = "default_tile_buffer")]
    pub tile_buffer_size: u32,
    /// Fade-in duration once a tile image has loaded
    #[serde(default = "default_fade_in_ms")]
    pub fade_in_ms: u64,
}

impl TileLayerOptions {
    pub fn new(
        url: impl Into<String>,
        subdomains: Vec<String>,
        tile_size: u32,
        error_tile_url: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            subdomains,
            tile_size,
            error_tile_url: error_tile_url.into(),
            tile_buffer_size: DEFAULT_TILE_BUFFER,
            fade_in_ms: FADE_IN_MS,
        }
    }

    /// OpenStreetMap standard tiles sharded over `a`, `b` and `c`
    pub fn openstreetmap() -> Self {
        Self::new(
            "tile.openstreetmap.org/{z}/{x}/{y}.png",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            TILE_SIZE,
            "",
        )
    }

    pub fn with_tile_buffer_size(mut self, buffer: u32) -> Self {
        self.tile_buffer_size = buffer;
        self
    }

    pub fn with_fade_in_ms(mut self, fade_in_ms: u64) -> Self {
        self.fade_in_ms = fade_in_ms;
        self
    }

    /// Parse and validate options from a JSON document
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        if self.subdomains.is_empty() {
            return Err(ConfigError::NoSubdomains);
        }
        if let Some(index) = self.subdomains.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptySubdomain(index));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize(self.tile_size));
        }
        Ok(())
    }

    pub fn fade_in(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fade_in_ms)
    }
}
