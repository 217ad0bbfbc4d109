pub mod basemap;
pub mod canvas;

pub use basemap::{BlankTileSource, OsmTileSource, TileSource};
pub use canvas::Canvas;

use thiserror::Error;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Stroke, Transform};

use super::batch::RenderItem;
use super::geo::{Coordinate, GeoExtent};

pub const DEFAULT_CANVAS_WIDTH: u32 = 1000;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1000;
pub const MAP_TITLE: &str = "Drive Routes";
pub const X_AXIS_LABEL: &str = "Longitude";
pub const Y_AXIS_LABEL: &str = "Latitude";

const PADDING_FRACTION: f64 = 0.05;
const MIN_SPAN_DEG: f64 = 0.01;
const ROUTE_WIDTH: f32 = 3.0;
const MARKER_RADIUS: f32 = 6.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render: no route was computed")]
    NothingToRender,

    #[error("Cannot allocate a {width}x{height} canvas")]
    CanvasSize { width: u32, height: u32 },

    #[error("Basemap tile {zoom}/{x}/{y} unavailable: {reason}")]
    Basemap {
        zoom: u8,
        x: u32,
        y: u32,
        reason: String,
    },

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to build document: {0}")]
    Export(String),
}

/// Extent holding every route vertex and endpoint, padded and widened so a
/// degree of longitude and latitude cover the same ground per pixel.
///
/// Longitudes are not unwrapped: routes crossing the antimeridian yield a
/// whole-world extent.
pub fn fit_extent(items: &[RenderItem], width: u32, height: u32) -> Option<GeoExtent> {
    let points = items.iter().flat_map(|item| {
        item.geometry
            .iter()
            .copied()
            .chain([item.origin, item.destination])
    });
    let padded = GeoExtent::enclosing(points)?.padded(PADDING_FRACTION, MIN_SPAN_DEG);

    let (cx, cy) = padded.center();
    let ground_scale = cy.to_radians().cos().max(0.01);
    let deg_per_px_x = padded.lon_span() * ground_scale / f64::from(width);
    let deg_per_px_y = padded.lat_span() / f64::from(height);

    let (half_w, half_h) = if deg_per_px_x > deg_per_px_y {
        (padded.lon_span() / 2.0, deg_per_px_x * f64::from(height) / 2.0)
    } else {
        (
            deg_per_px_y * f64::from(width) / ground_scale / 2.0,
            padded.lat_span() / 2.0,
        )
    };
    Some(GeoExtent {
        min_lon: (cx - half_w).max(-180.0).min(padded.min_lon),
        min_lat: (cy - half_h).max(-90.0).min(padded.min_lat),
        max_lon: (cx + half_w).min(180.0).max(padded.max_lon),
        max_lat: (cy + half_h).min(90.0).max(padded.max_lat),
    })
}

/// Draws every route onto one basemap-backed canvas.
pub struct MapComposer<T: TileSource> {
    tiles: T,
    width: u32,
    height: u32,
}

impl<T: TileSource> MapComposer<T> {
    pub fn new(tiles: T) -> Self {
        Self {
            tiles,
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn render(&self, items: &[RenderItem]) -> Result<Canvas, RenderError> {
        let extent =
            fit_extent(items, self.width, self.height).ok_or(RenderError::NothingToRender)?;
        let mut canvas = Canvas::new(self.width, self.height, extent)?;
        log::info!(
            "Rendering {} routes over lon [{:.4}, {:.4}] lat [{:.4}, {:.4}]",
            items.len(),
            extent.min_lon,
            extent.max_lon,
            extent.min_lat,
            extent.max_lat
        );

        basemap::paint_basemap(&mut canvas, &self.tiles)?;
        for item in items {
            draw_route(&mut canvas, &item.geometry);
        }
        // markers last so no route line covers an endpoint
        for item in items {
            draw_marker(&mut canvas, item.origin);
            draw_marker(&mut canvas, item.destination);
        }

        canvas.set_labels(MAP_TITLE, X_AXIS_LABEL, Y_AXIS_LABEL);
        Ok(canvas)
    }
}

fn draw_route(canvas: &mut Canvas, geometry: &[Coordinate]) {
    let mut pb = PathBuilder::new();
    for (i, point) in geometry.iter().enumerate() {
        let (x, y) = canvas.project(*point);
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 128);
    paint.anti_alias = true;
    let stroke = Stroke {
        width: ROUTE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    canvas
        .pixmap_mut()
        .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

fn draw_marker(canvas: &mut Canvas, at: Coordinate) {
    let (x, y) = canvas.project(at);
    let Some(circle) = PathBuilder::from_circle(x, y, MARKER_RADIUS) else {
        return;
    };

    let mut fill = Paint::default();
    fill.set_color_rgba8(220, 20, 20, 255);
    fill.anti_alias = true;
    let mut outline = Paint::default();
    outline.set_color_rgba8(90, 0, 0, 255);
    outline.anti_alias = true;

    let pixmap = canvas.pixmap_mut();
    pixmap.fill_path(&circle, &fill, FillRule::Winding, Transform::identity(), None);
    pixmap.stroke_path(
        &circle,
        &outline,
        &Stroke {
            width: 1.5,
            ..Stroke::default()
        },
        Transform::identity(),
        None,
    );
}
