//! Integration tests for map composition and PDF export

use std::sync::atomic::{AtomicUsize, Ordering};

use drive_routes::sdk::map::{MAP_TITLE, X_AXIS_LABEL, Y_AXIS_LABEL};
use drive_routes::{
    BlankTileSource, Coordinate, MapComposer, PairId, RenderError, RenderItem, ReportExporter,
    TileSource,
};
use image::RgbaImage;

fn item(index: usize, path: &[(f64, f64)]) -> RenderItem {
    let geometry: Vec<Coordinate> = path
        .iter()
        .map(|&(lat, lon)| Coordinate::new(lat, lon).unwrap())
        .collect();
    RenderItem {
        pair_id: PairId {
            index,
            label: format!("Pair {}", index + 1),
        },
        origin: geometry[0],
        destination: geometry[geometry.len() - 1],
        geometry,
    }
}

fn dubai_items() -> Vec<RenderItem> {
    vec![
        item(0, &[(25.003, 55.167), (25.10, 55.21), (25.257, 55.297)]),
        item(1, &[(25.08, 55.14), (25.15, 55.25), (25.2532, 55.3657)]),
    ]
}

struct CountingTiles {
    fetched: AtomicUsize,
}

impl TileSource for CountingTiles {
    fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<RgbaImage, RenderError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        Ok(RgbaImage::from_pixel(256, 256, image::Rgba([200, 220, 200, 255])))
    }
}

struct OfflineTiles;

impl TileSource for OfflineTiles {
    fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<RgbaImage, RenderError> {
        Err(RenderError::Basemap {
            zoom,
            x,
            y,
            reason: "connection refused".to_string(),
        })
    }
}

#[test]
fn test_canvas_extent_contains_every_endpoint() {
    let items = dubai_items();
    let canvas = MapComposer::new(BlankTileSource::default())
        .with_size(400, 300)
        .render(&items)
        .unwrap();

    assert_eq!((canvas.width(), canvas.height()), (400, 300));
    for it in &items {
        assert!(canvas.contains(it.origin));
        assert!(canvas.contains(it.destination));
        let (x, y) = canvas.project(it.origin);
        assert!((0.0..=400.0).contains(&x));
        assert!((0.0..=300.0).contains(&y));
    }
}

#[test]
fn test_labels_are_set_once() {
    let canvas = MapComposer::new(BlankTileSource::default())
        .with_size(200, 200)
        .render(&dubai_items())
        .unwrap();
    assert_eq!(canvas.title(), MAP_TITLE);
    assert_eq!(canvas.x_label(), X_AXIS_LABEL);
    assert_eq!(canvas.y_label(), Y_AXIS_LABEL);
}

#[test]
fn test_markers_and_routes_are_drawn_over_basemap() {
    let items = dubai_items();
    let canvas = MapComposer::new(BlankTileSource::default())
        .with_size(300, 300)
        .render(&items)
        .unwrap();

    let rgb = canvas.to_rgb_image();
    let (x, y) = canvas.project(items[0].origin);
    let marker = rgb.get_pixel(x as u32, y as u32).0;
    assert!(marker[0] > 150 && marker[1] < 80, "expected red marker, got {marker:?}");

    let background = rgb.get_pixel(0, 0).0;
    assert_eq!(background, [245, 240, 229]);
}

#[test]
fn test_basemap_tiles_are_fetched_once_each() {
    let tiles = CountingTiles {
        fetched: AtomicUsize::new(0),
    };
    MapComposer::new(&tiles)
        .with_size(300, 300)
        .render(&dubai_items())
        .unwrap();
    let fetched = tiles.fetched.load(Ordering::SeqCst);
    assert!(fetched >= 1 && fetched <= drive_routes::sdk::map::basemap::MAX_TILES);
}

#[test]
fn test_basemap_failure_is_render_error() {
    let err = MapComposer::new(OfflineTiles)
        .render(&dubai_items())
        .unwrap_err();
    assert!(matches!(err, RenderError::Basemap { .. }));
}

#[test]
fn test_empty_items_are_not_rendered() {
    let err = MapComposer::new(BlankTileSource::default())
        .render(&[])
        .unwrap_err();
    assert!(matches!(err, RenderError::NothingToRender));
}

#[test]
fn test_single_stationary_route_still_renders() {
    let items = vec![item(0, &[(10.0, 10.0), (10.0, 10.0)])];
    let canvas = MapComposer::new(BlankTileSource::default())
        .with_size(100, 100)
        .render(&items)
        .unwrap();
    assert!(canvas.contains(items[0].origin));
    assert!(canvas.extent().lon_span() > 0.0);
}

#[test]
fn test_export_is_single_page_pdf() {
    let canvas = MapComposer::new(BlankTileSource::default())
        .with_size(200, 150)
        .render(&dubai_items())
        .unwrap();
    let bytes = ReportExporter::default().export(&canvas).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[test]
fn test_png_encoding_for_display() {
    let canvas = MapComposer::new(BlankTileSource::default())
        .with_size(64, 64)
        .render(&dubai_items())
        .unwrap();
    let png = canvas.encode_png().unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 64));
}
