use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::map::{Canvas, RenderError};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DEFAULT_FILE_NAME: &str = "drive_routes.pdf";

const MARGIN_LEFT: f32 = 80.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_BOTTOM: f32 = 60.0;
const MARGIN_TOP: f32 = 50.0;
const TITLE_SIZE: f32 = 16.0;
const LABEL_SIZE: f32 = 11.0;
const TICK_SIZE: f32 = 8.0;
const TICKS: u32 = 4;

/// Writes a canvas into a single-page PDF.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    /// Points per canvas pixel.
    pub scale: f32,
    pub jpeg_quality: u8,
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self {
            scale: 0.6,
            jpeg_quality: 90,
        }
    }
}

// Rough Helvetica advance, good enough for centring short labels.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

fn text_at(ops: &mut Vec<Operation>, text: &str, size: f32, x: f32, y: f32) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    ops.push(Operation::new("ET", vec![]));
}

fn line(ops: &mut Vec<Operation>, from: (f32, f32), to: (f32, f32)) {
    ops.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
    ops.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
    ops.push(Operation::new("S", vec![]));
}

impl ReportExporter {
    pub fn export(&self, canvas: &Canvas) -> Result<Vec<u8>, RenderError> {
        let image_w = canvas.width() as f32 * self.scale;
        let image_h = canvas.height() as f32 * self.scale;
        let page_w = MARGIN_LEFT + image_w + MARGIN_RIGHT;
        let page_h = MARGIN_BOTTOM + image_h + MARGIN_TOP;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode_image(&canvas.to_rgb_image())
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(canvas.width()),
                "Height" => i64::from(canvas.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im1" => image_id },
        });

        let content = Content {
            operations: self.page_operations(canvas, image_w, image_h),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Export(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(canvas.title()),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| RenderError::Export(e.to_string()))?;
        log::info!("Exported map as {} byte PDF", buf.len());
        Ok(buf)
    }

    fn page_operations(&self, canvas: &Canvas, image_w: f32, image_h: f32) -> Vec<Operation> {
        let (left, bottom) = (MARGIN_LEFT, MARGIN_BOTTOM);
        let extent = canvas.extent();
        let mut ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    image_w.into(),
                    0.into(),
                    0.into(),
                    image_h.into(),
                    left.into(),
                    bottom.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
            Operation::new("w", vec![1.into()]),
            Operation::new(
                "re",
                vec![left.into(), bottom.into(), image_w.into(), image_h.into()],
            ),
            Operation::new("S", vec![]),
        ];

        for i in 0..=TICKS {
            let t = i as f32 / TICKS as f32;

            let x = left + t * image_w;
            let lon = extent.min_lon + f64::from(t) * extent.lon_span();
            let label = format!("{lon:.3}");
            line(&mut ops, (x, bottom), (x, bottom - 4.0));
            text_at(&mut ops, &label, TICK_SIZE, x - text_width(&label, TICK_SIZE) / 2.0, bottom - 14.0);

            let y = bottom + t * image_h;
            let lat = extent.min_lat + f64::from(t) * extent.lat_span();
            let label = format!("{lat:.3}");
            line(&mut ops, (left, y), (left - 4.0, y));
            text_at(&mut ops, &label, TICK_SIZE, left - 8.0 - text_width(&label, TICK_SIZE), y - TICK_SIZE / 3.0);
        }

        let title = canvas.title();
        text_at(
            &mut ops,
            title,
            TITLE_SIZE,
            left + (image_w - text_width(title, TITLE_SIZE)) / 2.0,
            bottom + image_h + 20.0,
        );
        let x_label = canvas.x_label();
        text_at(
            &mut ops,
            x_label,
            LABEL_SIZE,
            left + (image_w - text_width(x_label, LABEL_SIZE)) / 2.0,
            bottom - 40.0,
        );

        // y label reads bottom-to-top
        let y_label = canvas.y_label();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), LABEL_SIZE.into()]));
        ops.push(Operation::new(
            "Tm",
            vec![
                0.into(),
                1.into(),
                (-1).into(),
                0.into(),
                (left - 56.0).into(),
                (bottom + (image_h - text_width(y_label, LABEL_SIZE)) / 2.0).into(),
            ],
        ));
        ops.push(Operation::new("Tj", vec![Object::string_literal(y_label)]));
        ops.push(Operation::new("ET", vec![]));
        ops
    }
}
