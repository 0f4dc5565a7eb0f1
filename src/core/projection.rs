//! Map projections between geographic coordinates and the global pixel plane.
//!
//! The global plane at zoom `z` is a square of `tile_size * 2^z` pixels with
//! its origin at the north-west corner of the projected world.

use std::f64::consts::PI;

use crate::core::geo::{GeoPoint, ProjectedPoint};

/// Side length in pixels of the global projected plane
pub fn global_size(tile_size: u32, zoom: u8) -> f64 {
    tile_size as f64 * 2_f64.powi(zoom as i32)
}

/// Maps geographic points onto the global projected pixel plane and back.
///
/// Implementations are pure functions of their inputs and may be shared
/// between any number of engines.
pub trait Projection: Send + Sync {
    /// Short identifier used in diagnostics
    fn name(&self) -> &'static str;

    /// Project a geographic point to global pixel coordinates
    fn to_global_pixel(&self, point: GeoPoint, tile_size: u32, zoom: u8) -> ProjectedPoint;

    /// Inverse of [`Projection::to_global_pixel`]
    fn to_geo_point(&self, point: ProjectedPoint, tile_size: u32, zoom: u8) -> GeoPoint;
}

/// Spherical (web) mercator, EPSG:3857 as used by slippy map tile servers.
///
/// Longitude wraps into `[-180, 180)`. Latitude is projected as given: values
/// outside ±85.0511° land outside the plane and are the caller's concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SphericalMercator;

impl Projection for SphericalMercator {
    fn name(&self) -> &'static str {
        "spherical-mercator"
    }

    fn to_global_pixel(&self, point: GeoPoint, tile_size: u32, zoom: u8) -> ProjectedPoint {
        let size = global_size(tile_size, zoom);
        let lon = GeoPoint::wrap_lon(point.lon);
        let lat_rad = point.lat.to_radians();

        let x = (lon + 180.0) / 360.0 * size;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * size;
        ProjectedPoint::new(x, y)
    }

    fn to_geo_point(&self, point: ProjectedPoint, tile_size: u32, zoom: u8) -> GeoPoint {
        let size = global_size(tile_size, zoom);
        let lon = GeoPoint::wrap_lon(point.x / size * 360.0 - 180.0);
        let lat = (PI * (1.0 - 2.0 * point.y / size)).sinh().atan().to_degrees();
        GeoPoint::new(lat, lon)
    }
}
