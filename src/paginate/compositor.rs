//! Page composition and multi-page PDF serialisation.
//!
//! Every accepted crop is pasted at the top-left corner of a white canvas of
//! exactly one page size, so short pages keep their content at the top and
//! the rest of the sheet stays blank. The canvases are then written, in
//! order, as the pages of a single PDF: one DCT (JPEG) image XObject per page,
//! drawn to fill the page's MediaBox.

use super::slicer::PageCrop;
use crate::config::PageGeometry;
use crate::error::ReportError;
use image::{imageops, ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Cursor;
use tracing::debug;

/// Background colour of every page.
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Places crops onto fixed-size canvases.
#[derive(Debug, Clone, Copy)]
pub struct PageCompositor {
    geometry: PageGeometry,
}

impl PageCompositor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    /// One canvas per crop, in input order.
    ///
    /// # Errors
    /// [`ReportError::PaginationEmpty`] when `crops` is empty.
    pub fn compose(&self, crops: &[PageCrop]) -> Result<Vec<RgbImage>, ReportError> {
        if crops.is_empty() {
            return Err(ReportError::PaginationEmpty {
                crops: 0,
                width: self.geometry.width,
                height: self.geometry.height,
            });
        }

        Ok(crops.iter().map(|crop| self.canvas(&crop.image)).collect())
    }

    /// Paste `crop` at `(0, 0)` on a white page. Anything beyond the page
    /// bounds is clipped.
    pub fn canvas(&self, crop: &RgbImage) -> RgbImage {
        let mut page = RgbImage::from_pixel(self.geometry.width, self.geometry.height, BACKGROUND);
        imageops::replace(&mut page, crop, 0, 0);
        page
    }
}

/// Serialise canvases as a multi-page PDF.
///
/// The first canvas becomes page 1 and the rest follow in order. Pixel sizes
/// are converted to points at `resolution` DPI.
pub fn write_pdf(
    canvases: &[RgbImage],
    resolution: f32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ReportError> {
    if canvases.is_empty() {
        return Err(ReportError::PaginationEmpty {
            crops: 0,
            width: 0,
            height: 0,
        });
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let scale = 72.0 / resolution;
    let mut kids = Vec::with_capacity(canvases.len());

    for (index, canvas) in canvases.iter().enumerate() {
        let (width, height) = canvas.dimensions();
        let jpeg = encode_jpeg(canvas, jpeg_quality)?;
        debug!("PDF page {}: {}x{} px, {} bytes JPEG", index + 1, width, height, jpeg.len());

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let width_pt = width as f32 * scale;
        let height_pt = height as f32 * scale;

        let resources_id = doc.add_object(dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        });
        let content = format!("q {width_pt:.2} 0 0 {height_pt:.2} 0 0 cm /Im0 Do Q").into_bytes();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pt),
                Object::Real(height_pt),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
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

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ReportError::Serialize(e.to_string()))?;
    Ok(buf)
}

fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    if quality >= 100 {
        canvas
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .map_err(|e| ReportError::Serialize(format!("JPEG encoding failed: {e}")))?;
    } else {
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(canvas)
            .map_err(|e| ReportError::Serialize(format!("JPEG encoding failed: {e}")))?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::{CropInterval, CutKind};

    fn crop(h: u32, marker: u8) -> PageCrop {
        let mut image = RgbImage::from_pixel(1240, h, BACKGROUND);
        image.put_pixel(0, 0, Rgb([marker, 0, 0]));
        PageCrop {
            interval: CropInterval {
                top: 0,
                bottom: h,
                kind: CutKind::Blank,
                accepted: true,
            },
            image,
        }
    }

    #[test]
    fn empty_input_is_fatal() {
        let compositor = PageCompositor::new(PageGeometry::default());
        let err = compositor.compose(&[]).unwrap_err();
        assert!(matches!(err, ReportError::PaginationEmpty { .. }));
        assert!(matches!(
            write_pdf(&[], 100.0, 90),
            Err(ReportError::PaginationEmpty { .. })
        ));
    }

    #[test]
    fn canvases_are_page_sized_and_ordered() {
        let compositor = PageCompositor::new(PageGeometry::default());
        let pages = compositor
            .compose(&[crop(1200, 10), crop(300, 20), crop(1754, 30)])
            .unwrap();
        assert_eq!(pages.len(), 3);
        for page in &pages {
            assert_eq!(page.dimensions(), (1240, 1754));
        }
        assert_eq!(pages[0].get_pixel(0, 0)[0], 10);
        assert_eq!(pages[1].get_pixel(0, 0)[0], 20);
        assert_eq!(pages[2].get_pixel(0, 0)[0], 30);
    }

    #[test]
    fn short_crop_is_padded_white_below() {
        let compositor = PageCompositor::new(PageGeometry::default());
        let page = compositor.canvas(&RgbImage::from_pixel(1240, 100, Rgb([0, 0, 0])));
        assert_eq!(*page.get_pixel(600, 99), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(600, 100), BACKGROUND);
        assert_eq!(*page.get_pixel(600, 1753), BACKGROUND);
    }

    #[test]
    fn narrow_crop_is_padded_white_right() {
        let compositor = PageCompositor::new(PageGeometry::default());
        let page = compositor.canvas(&RgbImage::from_pixel(600, 100, Rgb([0, 0, 0])));
        assert_eq!(*page.get_pixel(599, 50), Rgb([0, 0, 0]));
        assert_eq!(*page.get_pixel(600, 50), BACKGROUND);
    }

    #[test]
    fn pdf_has_one_page_per_canvas() {
        let canvases = vec![
            RgbImage::from_pixel(124, 175, BACKGROUND),
            RgbImage::from_pixel(124, 175, Rgb([0, 0, 0])),
        ];
        let bytes = write_pdf(&canvases, 100.0, 80).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn media_box_uses_resolution() {
        let canvases = vec![RgbImage::from_pixel(1240, 1754, BACKGROUND)];
        let bytes = write_pdf(&canvases, 100.0, 50).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let width = media_box[2].as_float().unwrap();
        let height = media_box[3].as_float().unwrap();
        assert!((width - 892.8).abs() < 0.01, "width {width}");
        assert!((height - 1262.88).abs() < 0.01, "height {height}");
    }
}
