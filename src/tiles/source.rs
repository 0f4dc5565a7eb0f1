//! Tile addressing: which tile holds a point, and where to fetch it from.

use std::f64::consts::PI;

use crate::core::{
    config::TileLayerOptions,
    constants::TILE_URL_SCHEME,
    geo::{GeoPoint, TileAddress},
};

/// Tile column/row containing `point` at `zoom`.
///
/// Longitude is wrapped first so that 180° maps to column 0 rather than one
/// past the last column. Latitude outside the mercator band yields a row
/// outside the grid.
pub fn address_for(point: GeoPoint, zoom: u8) -> TileAddress {
    let n = 2_f64.powi(zoom as i32);
    let lon = GeoPoint::wrap_lon(point.lon);
    let lat_rad = point.lat * PI / 180.0;

    let x = ((lon + 180.0) / 360.0 * n).floor() as i64;
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor() as i64;

    TileAddress::new(x, y, zoom)
}

/// Shard serving `address`: `subdomains[(x + y) mod len]`.
///
/// Adjacent tiles land on different hosts so per-host connection limits do
/// not serialize a contiguous block.
pub fn subdomain_for<'a>(address: &TileAddress, subdomains: &'a [String]) -> Option<&'a str> {
    if subdomains.is_empty() {
        return None;
    }
    let index = (address.x + address.y).rem_euclid(subdomains.len() as i64) as usize;
    Some(subdomains[index].as_str())
}

/// Build the URL for `address` from `template`.
///
/// `{x}`, `{y}` and `{z}` are each replaced once with the decimal coordinate,
/// and the result is prefixed with `http://<subdomain>.`.
pub fn url_for(address: &TileAddress, template: &str, subdomains: &[String]) -> String {
    let path = template
        .replacen("{x}", &address.x.to_string(), 1)
        .replacen("{y}", &address.y.to_string(), 1)
        .replacen("{z}", &address.z.to_string(), 1);

    match subdomain_for(address, subdomains) {
        Some(subdomain) => format!("{}{}.{}", TILE_URL_SCHEME, subdomain, path),
        None => format!("{}{}", TILE_URL_SCHEME, path),
    }
}

/// Trait representing anything that can produce tile URLs for a given address.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `address`, or `None` when no such tile exists.
    fn url(&self, address: TileAddress) -> Option<String>;
}

/// Template-driven source backed by validated layer options.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSource {
    template: String,
    subdomains: Vec<String>,
}

impl TemplateSource {
    pub fn new(template: impl Into<String>, subdomains: Vec<String>) -> Self {
        Self {
            template: template.into(),
            subdomains,
        }
    }

    pub fn from_options(options: &TileLayerOptions) -> Self {
        Self::new(options.url.clone(), options.subdomains.clone())
    }
}

impl TileSource for TemplateSource {
    fn url(&self, address: TileAddress) -> Option<String> {
        if !address.is_in_grid() {
            return None;
        }
        Some(url_for(&address.wrapped(), &self.template, &self.subdomains))
    }
}
