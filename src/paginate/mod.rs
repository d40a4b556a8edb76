//! Content-aware pagination of a tall rendered report.
//!
//! ```text
//! RgbImage (W' x H')
//!   -> row.rs        classify sampled rows as blank / border / content
//!   -> cut.rs        pick the cut row for the current page
//!   -> slicer.rs     crop [top, cut), drop blank crops, advance
//!   -> compositor.rs paste each crop on a white page, write the PDF
//! ```
//!
//! The whole stage is synchronous and CPU-bound. Async callers run it on the
//! blocking pool.

pub mod compositor;
pub mod cut;
pub mod row;
pub mod slicer;

pub use compositor::{write_pdf, PageCompositor};
pub use cut::{CutKind, CutPoint, CutPointFinder};
pub use row::{brightness, RowClass, RowClassifier};
pub use slicer::{has_content, CropInterval, PageCrop, PageSlicer, Slicing};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::progress::or_noop;
use image::{DynamicImage, RgbImage};

/// Paginate a rendered report into multi-page PDF bytes.
///
/// Fails with [`ReportError::PaginationEmpty`] when every crop is blank.
pub fn paginate(image: &DynamicImage, config: &ReportConfig) -> Result<Vec<u8>, ReportError> {
    paginate_rgb(&image.to_rgb8(), config)
}

/// [`paginate`] for a bitmap that is already RGB.
///
/// Fails with [`ReportError::InvalidConfig`] when either page dimension is
/// zero, since `ReportConfig` fields can be set without the builder.
pub fn paginate_rgb(rgb: &RgbImage, config: &ReportConfig) -> Result<Vec<u8>, ReportError> {
    let geometry = config.geometry;
    if geometry.width == 0 || geometry.height == 0 {
        return Err(ReportError::InvalidConfig(format!(
            "Page size must be non-zero, got {}x{}",
            geometry.width, geometry.height
        )));
    }

    let slicer = PageSlicer::new(config.geometry, config.tuning)
        .with_progress(or_noop(config.progress_callback.as_ref()));
    let slicing = slicer.slice(rgb);

    if slicing.pages.is_empty() {
        return Err(ReportError::PaginationEmpty {
            crops: slicing.intervals.len(),
            width: rgb.width(),
            height: rgb.height(),
        });
    }

    let canvases = PageCompositor::new(config.geometry).compose(&slicing.pages)?;
    write_pdf(&canvases, config.pdf_resolution, config.jpeg_quality)
}
