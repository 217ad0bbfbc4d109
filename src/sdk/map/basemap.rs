// Slippy-map tiles (Web Mercator) resampled into the lon/lat canvas.
use image::{Rgba, RgbaImage};
use reqwest::blocking::Client;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Duration;
use tiny_skia::{ColorU8, PremultipliedColorU8};

use super::canvas::Canvas;
use super::RenderError;
use crate::sdk::config::MapConfig;
use crate::sdk::geo::GeoExtent;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_USER_AGENT: &str = concat!("drive_routes/", env!("CARGO_PKG_VERSION"));
pub const TILE_SIZE: u32 = 256;
pub const MAX_ZOOM: u8 = 18;
pub const MAX_TILES: usize = 36;
const TILE_TIMEOUT_SECS: u64 = 15;
// Web Mercator is undefined beyond this latitude.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

pub trait TileSource {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, RenderError>;
}

impl<T: TileSource + ?Sized> TileSource for &T {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, RenderError> {
        (**self).fetch_tile(zoom, x, y)
    }
}

impl<T: TileSource + ?Sized> TileSource for Box<T> {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, RenderError> {
        (**self).fetch_tile(zoom, x, y)
    }
}

/// Raster tiles fetched over HTTP from a `{z}/{x}/{y}` URL template.
pub struct OsmTileSource {
    client: Client,
    url_template: String,
}

impl OsmTileSource {
    pub fn new(url_template: String, user_agent: &str) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TILE_TIMEOUT_SECS))
            .user_agent(user_agent)
            .build()
            .map_err(|e| RenderError::Basemap {
                zoom: 0,
                x: 0,
                y: 0,
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            url_template,
        })
    }

    pub fn from_config(config: &MapConfig) -> Result<Self, RenderError> {
        Self::new(config.tile_url.clone(), &config.user_agent)
    }

    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

impl TileSource for OsmTileSource {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, RenderError> {
        let url = self.tile_url(zoom, x, y);
        log::debug!("Fetching basemap tile {}", url);
        let fail = |reason: String| RenderError::Basemap { zoom, x, y, reason };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            log::error!("Tile server returned {} for {}", status, url);
            return Err(fail(format!("HTTP {status}")));
        }
        let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
        let tile = image::load_from_memory(&bytes).map_err(|e| fail(e.to_string()))?;
        Ok(tile.to_rgba8())
    }
}

/// Uniform tiles for offline rendering.
#[derive(Debug, Clone, Copy)]
pub struct BlankTileSource {
    pub color: Rgba<u8>,
}

impl Default for BlankTileSource {
    fn default() -> Self {
        Self {
            color: Rgba([245, 240, 229, 255]),
        }
    }
}

impl TileSource for BlankTileSource {
    fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage, RenderError> {
        Ok(RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, self.color))
    }
}

// https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames
/// Position in tile units (integer part = tile index) at `zoom`.
pub fn lng_lat_to_tile_xy(lng: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = f64::powi(2.0, i32::from(zoom));
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = ((lng + 180.0) / 360.0) * n;
    let y = (1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI)) / 2.0 * n;
    (x, y)
}

#[cfg(test)]
fn tile_xy_to_lng_lat(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = f64::powi(2.0, i32::from(zoom));
    let lng = (x / n) * 360.0 - 180.0;
    let lat = f64::atan(f64::sinh(PI * (1.0 - (2.0 * y) / n))).to_degrees();
    (lng, lat)
}

/// Inclusive tile index range covering an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRange {
    pub fn covering(extent: &GeoExtent, zoom: u8) -> Self {
        let last = (1u32 << zoom) - 1;
        let index = |v: f64| (v.floor().max(0.0) as u32).min(last);
        let (left, top) = lng_lat_to_tile_xy(extent.min_lon, extent.max_lat, zoom);
        let (right, bottom) = lng_lat_to_tile_xy(extent.max_lon, extent.min_lat, zoom);
        Self {
            zoom,
            min_x: index(left),
            min_y: index(top),
            max_x: index(right),
            max_y: index(bottom),
        }
    }

    pub fn len(&self) -> usize {
        ((self.max_x - self.min_x + 1) * (self.max_y - self.min_y + 1)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.min_y..=self.max_y).flat_map(move |y| (self.min_x..=self.max_x).map(move |x| (x, y)))
    }
}

/// Picks the zoom whose tile resolution roughly matches the canvas, capped
/// so that at most [`MAX_TILES`] tiles are requested.
pub fn choose_zoom(extent: &GeoExtent, width_px: u32) -> u8 {
    let span = extent.lon_span().max(1e-9);
    let ideal = (f64::from(width_px) * 360.0 / (f64::from(TILE_SIZE) * span)).log2();
    let mut zoom = ideal.round().clamp(0.0, f64::from(MAX_ZOOM)) as u8;
    while zoom > 0 && TileRange::covering(extent, zoom).len() > MAX_TILES {
        zoom -= 1;
    }
    zoom
}

/// Fills the whole canvas with basemap imagery from `source`.
pub fn paint_basemap<T: TileSource + ?Sized>(canvas: &mut Canvas, source: &T) -> Result<(), RenderError> {
    let extent = *canvas.extent();
    let zoom = choose_zoom(&extent, canvas.width());
    let range = TileRange::covering(&extent, zoom);
    log::debug!("Basemap at zoom {} needs {} tiles", zoom, range.len());

    let mut tiles = HashMap::with_capacity(range.len());
    for (x, y) in range.tiles() {
        tiles.insert((x, y), source.fetch_tile(zoom, x, y)?);
    }

    let (width, height) = (canvas.width(), canvas.height());
    let mut resampled = Vec::with_capacity((width * height) as usize);
    for py in 0..height {
        for px in 0..width {
            // sample at the pixel centre
            let (lon, lat) = canvas.unproject(f64::from(px) + 0.5, f64::from(py) + 0.5);
            let (tx, ty) = lng_lat_to_tile_xy(lon, lat, zoom);
            let key = (
                (tx.floor().max(0.0) as u32).clamp(range.min_x, range.max_x),
                (ty.floor().max(0.0) as u32).clamp(range.min_y, range.max_y),
            );
            let color = match tiles.get(&key) {
                Some(tile) => {
                    let sample = |frac: f64, size: u32| ((frac * f64::from(size)) as u32).min(size - 1);
                    let sx = sample(tx - f64::from(key.0), tile.width());
                    let sy = sample(ty - f64::from(key.1), tile.height());
                    let Rgba([r, g, b, a]) = *tile.get_pixel(sx, sy);
                    ColorU8::from_rgba(r, g, b, a).premultiply()
                }
                None => PremultipliedColorU8::TRANSPARENT,
            };
            resampled.push(color);
        }
    }
    canvas.pixmap_mut().pixels_mut().copy_from_slice(&resampled);
    Ok(())
}
