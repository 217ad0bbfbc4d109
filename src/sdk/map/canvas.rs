use image::RgbImage;
use tiny_skia::Pixmap;

use super::RenderError;
use crate::sdk::geo::{Coordinate, GeoExtent};

/// A composed map: raster pixels over an unprojected lon/lat extent,
/// plus the title and axis labels drawn around it on export.
pub struct Canvas {
    pixmap: Pixmap,
    extent: GeoExtent,
    title: String,
    x_label: String,
    y_label: String,
}

impl Canvas {
    pub fn new(width: u32, height: u32, extent: GeoExtent) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::CanvasSize { width, height })?;
        Ok(Self {
            pixmap,
            extent,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
        })
    }

    pub fn set_labels(&mut self, title: &str, x_label: &str, y_label: &str) {
        self.title = title.to_string();
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        self.extent.contains(point)
    }

    /// Pixel position of a coordinate; y grows downwards.
    pub fn project(&self, point: Coordinate) -> (f32, f32) {
        let x = (point.lon() - self.extent.min_lon) / self.extent.lon_span() * f64::from(self.width());
        let y = (self.extent.max_lat - point.lat()) / self.extent.lat_span() * f64::from(self.height());
        (x as f32, y as f32)
    }

    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.extent.min_lon + x / f64::from(self.width()) * self.extent.lon_span();
        let lat = self.extent.max_lat - y / f64::from(self.height()) * self.extent.lat_span();
        (lon, lat)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    /// Opaque RGB copy of the pixels, alpha removed.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut img = RgbImage::new(self.width(), self.height());
        for (dst, src) in img.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue()];
        }
        img
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("extent", &self.extent)
            .field("title", &self.title)
            .finish()
    }
}
