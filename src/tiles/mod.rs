#[cfg(feature = "fetch")]
pub mod loader;
pub mod source;

// Re-exports for convenience
#[cfg(feature = "fetch")]
pub use loader::TileLoader;
pub use source::{address_for, url_for, TemplateSource, TileSource};
