//! Report generation with a stand-in rasterizer.

use async_trait::async_trait;
use bid_report::{
    generate_pdf, generate_pdf_to_file, FieldMap, HtmlRasterizer, ReportConfig, ReportError,
};
use image::{Rgb, RgbImage};
use std::sync::Mutex;

/// Returns a fixed bitmap and remembers the HTML it was given.
struct FixedBitmap {
    bitmap: RgbImage,
    seen: Mutex<Option<(String, u32, u32)>>,
}

impl FixedBitmap {
    fn new(bitmap: RgbImage) -> Self {
        Self {
            bitmap,
            seen: Mutex::new(None),
        }
    }
}

#[async_trait]
impl HtmlRasterizer for FixedBitmap {
    async fn rasterize(&self, html: &str, width: u32, height: u32) -> Result<RgbImage, ReportError> {
        *self.seen.lock().unwrap() = Some((html.to_string(), width, height));
        Ok(self.bitmap.clone())
    }
}

/// Text-like 20px rows separated by 20px blank gaps, 4200px tall.
fn report_bitmap() -> RgbImage {
    let mut img = RgbImage::from_pixel(1240, 4200, Rgb([255, 255, 255]));
    for y in (0..4200).filter(|y| y % 40 < 20) {
        for x in (120..900).step_by(7) {
            img.put_pixel(x, y, Rgb([20, 20, 20]));
        }
    }
    img
}

fn sample_fields() -> FieldMap {
    serde_json::from_str(
        r#"{
            "Project_Name": "Construction of <Rural> Roads",
            "Issuing_Authority": "Public Works Department",
            "EMD_Amount": "Not Specified",
            "Eligibility": {"Min_Turnover": "INR 5 Cr"}
        }"#,
    )
    .unwrap()
}

#[tokio::test]
async fn renders_fields_into_multi_page_pdf() {
    let rasterizer = FixedBitmap::new(report_bitmap());
    let config = ReportConfig::default();

    let pdf = generate_pdf(&sample_fields(), &rasterizer, &config).await.unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    // Cuts land on the topmost gap of each window: 1156, 2312, 3468.
    assert_eq!(doc.get_pages().len(), 4);

    let (html, width, height) = rasterizer.seen.lock().unwrap().clone().unwrap();
    assert_eq!(width, config.geometry.width);
    assert_eq!(height, config.render_height);
    assert!(html.contains("Construction of &lt;Rural&gt; Roads"));
    assert!(html.contains("Public Works Department"));
    assert!(html.contains("INR 5 Cr"));
    assert!(!html.contains("Not Specified"));
    assert!(!html.contains("EMD Amount"));
}

#[tokio::test]
async fn blank_render_is_pagination_empty() {
    let rasterizer = FixedBitmap::new(RgbImage::from_pixel(1240, 3508, Rgb([255, 255, 255])));
    let err = generate_pdf(&sample_fields(), &rasterizer, &ReportConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::PaginationEmpty { .. }), "got {err}");
}

#[tokio::test]
async fn empty_data_never_reaches_the_rasterizer() {
    let rasterizer = FixedBitmap::new(report_bitmap());
    let err = generate_pdf(&FieldMap::new(), &rasterizer, &ReportConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::MissingInput(_)));
    assert!(rasterizer.seen.lock().unwrap().is_none());
}

#[tokio::test]
async fn writes_report_to_nested_path() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reports/tender.pdf");
    let rasterizer = FixedBitmap::new(report_bitmap());

    let written = generate_pdf_to_file(&sample_fields(), &rasterizer, &out, &ReportConfig::default())
        .await
        .unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(bytes.len(), written);
    assert!(!out.with_extension("pdf.tmp").exists());
}
