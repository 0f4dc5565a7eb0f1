use std::thread;

use crossbeam_channel::Sender;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;

use crate::layers::tile::{events::TileHandle, sink::LoadCallback};
use crate::{MapError, Result};

#[cfg(feature = "debug")]
use log;

/// Shared blocking HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. Building the client
/// once avoids the cost of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("tilegrid/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// A decoded tile image delivered by the loader
#[derive(Debug, Clone)]
pub struct FetchedTile {
    pub handle: TileHandle,
    pub url: String,
    pub image: image::RgbaImage,
}

/// Tile loader that fetches tiles on background threads.
///
/// Each download makes exactly one attempt. The outcome is reported through
/// the tile's [`LoadCallback`]; decoded pixels go to the loader's sender.
#[derive(Debug, Clone)]
pub struct TileLoader {
    tx: Sender<FetchedTile>,
}

impl TileLoader {
    /// Create a new tile loader given a sender to report decoded tiles.
    pub fn new(tx: Sender<FetchedTile>) -> Self {
        Self { tx }
    }

    /// Start downloading `url` on a detached thread for the tile `on_load` reports on.
    pub fn start_download(&self, url: String, on_load: LoadCallback) {
        let tx = self.tx.clone();
        let handle = on_load.handle();

        thread::spawn(move || match fetch_and_decode(&url) {
            Ok(image) => {
                #[cfg(feature = "debug")]
                log::debug!("downloaded tile {} ({}x{})", url, image.width(), image.height());
                // The receiver may be gone if the sink was dropped mid-download.
                let _ = tx.send(FetchedTile { handle, url, image });
                on_load.loaded();
            }
            Err(e) => {
                #[cfg(feature = "debug")]
                log::warn!("tile {} failed to load: {}", url, e);
                on_load.failed(e.to_string());
            }
        });
    }
}

/// Download `url` and decode the body as an image
pub fn fetch_and_decode(url: &str) -> Result<image::RgbaImage> {
    let resp = HTTP_CLIENT.get(url).send()?;
    if !resp.status().is_success() {
        return Err(MapError::Http {
            url: url.to_string(),
            status: resp.status().as_u16(),
        });
    }
    let bytes = resp.bytes()?;
    decode(&bytes)
}

/// Decode raw tile bytes into RGBA pixels
pub fn decode(bytes: &[u8]) -> Result<image::RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, MapError::Image(_)));
    }

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();

        let decoded = decode(&png).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgba([10, 20, 30, 255]));
    }
}
