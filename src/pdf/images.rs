//! Build a PDF with one image per page.

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, Rgb, RgbImage, Rgba};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Deserialize;
use thiserror::Error;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait width and height in millimetres.
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A3 => (297.0, 420.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Margin must be a non-negative number of millimetres, got {margin_mm}")]
    InvalidMargin { margin_mm: f32 },

    #[error("A {margin_mm} mm margin leaves no room on a {width_mm} x {height_mm} mm page")]
    MarginTooLarge {
        margin_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },

    #[error("Image quality must be between 1 and 100, got {quality}")]
    InvalidQuality { quality: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub size: PageSize,
    pub orientation: Orientation,
    pub margin_mm: f32,
    /// JPEG quality (1-100) for images that have to be re-encoded.
    pub quality: u8,
}

impl Default for PageLayout {
    fn default() -> Self {
        PageLayout {
            size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin_mm: 10.0,
            quality: 100,
        }
    }
}

/// Image placement on a page, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageLayout {
    /// The margin must leave some of the page free, and the quality must be a
    /// JPEG quality.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let margin_mm = self.margin_mm;
        if !margin_mm.is_finite() || margin_mm < 0.0 {
            return Err(LayoutError::InvalidMargin { margin_mm });
        }
        let (width_mm, height_mm) = self.size.dimensions_mm();
        if margin_mm * 2.0 >= width_mm.min(height_mm) {
            return Err(LayoutError::MarginTooLarge {
                margin_mm,
                width_mm,
                height_mm,
            });
        }
        if !(1..=100).contains(&self.quality) {
            return Err(LayoutError::InvalidQuality {
                quality: self.quality,
            });
        }
        Ok(())
    }

    /// Page width and height in points, after applying the orientation.
    pub fn page_points(&self) -> (f32, f32) {
        let (w, h) = self.size.dimensions_mm();
        let (w, h) = match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        (w * POINTS_PER_MM, h * POINTS_PER_MM)
    }

    /// Fit an image of the given pixel size inside the margins, keeping its
    /// aspect ratio, centred on the page.
    pub fn place(&self, image_width: u32, image_height: u32) -> Placement {
        let (page_w, page_h) = self.page_points();
        let margin = self.margin_mm * POINTS_PER_MM;
        let usable_w = (page_w - 2.0 * margin).max(1.0);
        let usable_h = (page_h - 2.0 * margin).max(1.0);

        let aspect = image_width as f32 / image_height.max(1) as f32;
        let mut width = usable_w;
        let mut height = width / aspect;
        if height > usable_h {
            height = usable_h;
            width = height * aspect;
        }

        Placement {
            x: margin + (usable_w - width) / 2.0,
            y: margin + (usable_h - height) / 2.0,
            width,
            height,
        }
    }
}

/// Decode each image and place it on its own page.
///
/// `on_page` is called with the index of each image once its page is built.
pub fn images_to_pdf<F>(images: &[Vec<u8>], layout: &PageLayout, mut on_page: F) -> Result<Vec<u8>>
where
    F: FnMut(usize),
{
    if images.is_empty() {
        bail!("No images to convert");
    }
    layout.validate()?;

    let (page_w, page_h) = layout.page_points();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(images.len());
    for (i, bytes) in images.iter().enumerate() {
        let encoded = encode_image(bytes, layout.quality)
            .with_context(|| format!("Failed to decode image {}", i + 1))?;
        let (px_w, px_h) = (encoded.width, encoded.height);

        let mut xobject = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_w as i64,
                "Height" => px_h as i64,
                "ColorSpace" => encoded.color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            encoded.data,
        );
        xobject.allows_compression = false;
        let image_id = doc.add_object(xobject);

        let at = layout.place(px_w, px_h);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(at.width),
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(at.height),
                        Object::Real(at.x),
                        Object::Real(at.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w),
                Object::Real(page_h),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(Object::Reference(page_id));
        on_page(i);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).context("Failed to serialize PDF")?;
    Ok(buffer)
}

/// JPEG data for an image XObject.
struct EncodedImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    data: Vec<u8>,
}

/// Embed JPEGs as they are; re-encode everything else as JPEG at `quality`.
fn encode_image(bytes: &[u8], quality: u8) -> Result<EncodedImage> {
    if let Some(jpeg) = embeddable_jpeg(bytes) {
        return Ok(jpeg);
    }

    let rgb = flatten_onto_white(image::load_from_memory(bytes)?);
    let (width, height) = rgb.dimensions();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality).encode_image(&rgb)?;
    Ok(EncodedImage {
        width,
        height,
        color_space: "DeviceRGB",
        data,
    })
}

/// A grey or RGB baseline JPEG that PDF readers can decode directly.
fn embeddable_jpeg(bytes: &[u8]) -> Option<EncodedImage> {
    if image::guess_format(bytes).ok()? != ImageFormat::Jpeg {
        return None;
    }
    let decoder = JpegDecoder::new(Cursor::new(bytes)).ok()?;
    let color_space = match decoder.original_color_type() {
        ExtendedColorType::L8 => "DeviceGray",
        ExtendedColorType::Rgb8 => "DeviceRGB",
        _ => return None,
    };
    let (width, height) = decoder.dimensions();
    Some(EncodedImage {
        width,
        height,
        color_space,
        data: bytes.to_vec(),
    })
}

/// Composite transparent pixels onto a white page.
fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let (a, inv) = (u16::from(a), 255 - u16::from(a));
        let blend = |c: u8| ((u16::from(c) * a + 255 * inv + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
