//! Geospatial grid cells and distance math.
//!
//! Points are quantized onto a fixed-resolution grid of 2^16 steps per axis
//! (roughly 300 m of latitude and 600 m of longitude at the equator per cell).
//! A cell identifier interleaves the quantized latitude and longitude bits, so
//! nearby cells share code prefixes and a bounding region maps to a bounded set
//! of codes. Cell probes over-approximate; every candidate is filtered by the
//! exact haversine or box test afterwards.

use serde_json::Value;

/// Earth radius used by the haversine distance, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Grid steps per axis.
const GRID_STEPS: u32 = 1 << 16;

/// Covers larger than this fall back to scanning the path's whole geo subtree.
const MAX_COVER_CELLS: usize = 4096;

/// Metres per degree of latitude.
const METRES_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Validate coordinate ranges: lat in [-90, 90], lon in [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    /// Interpret a JSON value as a geo point.
    ///
    /// Any object carrying numeric `lat` and `lon` fields in range qualifies;
    /// extra fields are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let lat = map.get("lat")?.as_f64()?;
        let lon = map.get("lon")?.as_f64()?;
        Self::new(lat, lon)
    }

    /// The grid cell containing this point.
    pub fn cell(&self) -> u64 {
        morton(quantize_lat(self.lat), quantize_lon(self.lon))
    }
}

/// The set of cells a query region resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoCover {
    /// Probe exactly these cells.
    Cells(Vec<u64>),
    /// The region spans too many cells; scan the path's whole geo subtree.
    FullPath,
}

fn quantize_lat(lat: f64) -> u32 {
    let step = ((lat + 90.0) / 180.0 * GRID_STEPS as f64).floor();
    (step as i64).clamp(0, GRID_STEPS as i64 - 1) as u32
}

fn quantize_lon(lon: f64) -> u32 {
    let step = ((lon + 180.0) / 360.0 * GRID_STEPS as f64).floor();
    (step as i64).clamp(0, GRID_STEPS as i64 - 1) as u32
}

/// Spread the low 16 bits of `v` onto even bit positions.
fn spread(v: u32) -> u64 {
    let mut x = u64::from(v) & 0xFFFF;
    x = (x | (x << 8)) & 0x00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

/// Interleave quantized (lat, lon) into a single cell code.
fn morton(qlat: u32, qlon: u32) -> u64 {
    spread(qlat) | (spread(qlon) << 1)
}

/// Haversine distance between two points, in metres.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Axis-aligned containment test.
pub fn box_contains(
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
    point: GeoPoint,
) -> bool {
    point.lat >= min_lat && point.lat <= max_lat && point.lon >= min_lon && point.lon <= max_lon
}

/// Cells intersecting an axis-aligned box.
pub fn cover_box(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> GeoCover {
    let lat_lo = quantize_lat(min_lat.min(max_lat));
    let lat_hi = quantize_lat(min_lat.max(max_lat));
    let lon_lo = quantize_lon(min_lon.min(max_lon));
    let lon_hi = quantize_lon(min_lon.max(max_lon));

    let count = (u64::from(lat_hi - lat_lo) + 1) * (u64::from(lon_hi - lon_lo) + 1);
    if count as usize > MAX_COVER_CELLS {
        return GeoCover::FullPath;
    }

    let mut cells = Vec::with_capacity(count as usize);
    for qlat in lat_lo..=lat_hi {
        for qlon in lon_lo..=lon_hi {
            cells.push(morton(qlat, qlon));
        }
    }
    GeoCover::Cells(cells)
}

/// Cells intersecting the bounding box of `centre ± radius`.
///
/// The box is clamped to valid coordinate ranges rather than wrapped across
/// the antimeridian; the exact distance filter keeps results correct, at the
/// cost of missing neighbours on the far side of the date line.
pub fn cover_radius(centre: GeoPoint, radius_m: f64) -> GeoCover {
    let d_lat = radius_m / METRES_PER_DEGREE;
    let cos_lat = centre.lat.to_radians().cos();

    let min_lat = (centre.lat - d_lat).max(-90.0);
    let max_lat = (centre.lat + d_lat).min(90.0);

    // Near the poles a radius spans every longitude.
    if cos_lat < 1e-6 {
        return cover_box(min_lat, -180.0, max_lat, 180.0);
    }

    let d_lon = radius_m / (METRES_PER_DEGREE * cos_lat);
    let min_lon = (centre.lon - d_lon).max(-180.0);
    let max_lon = (centre.lon + d_lon).min(180.0);

    cover_box(min_lat, min_lon, max_lat, max_lon)
}
