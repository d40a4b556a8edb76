//! Page slicing: partition a tall bitmap into page-sized crops.
//!
//! Starting at the top, each iteration asks the [`CutPointFinder`] where the
//! current page ends, crops `[top, cut)` at the page width, and keeps the crop
//! only if it has at least one non-background pixel. The next page always
//! starts exactly at the previous cut, so the crops tile the bitmap top to
//! bottom with no gaps or overlaps, whether or not they were kept.

use super::cut::{CutKind, CutPointFinder};
use crate::config::{PageGeometry, ScanTuning};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use image::{imageops, Rgb, RgbImage};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// One `[top, bottom)` interval of the source bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropInterval {
    pub top: u32,
    pub bottom: u32,
    pub kind: CutKind,
    /// False when the crop was blank and discarded.
    pub accepted: bool,
}

impl CropInterval {
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// An accepted page crop.
#[derive(Debug, Clone)]
pub struct PageCrop {
    pub interval: CropInterval,
    pub image: RgbImage,
}

/// Result of slicing one bitmap.
#[derive(Debug, Clone, Default)]
pub struct Slicing {
    /// Accepted crops, top to bottom.
    pub pages: Vec<PageCrop>,
    /// Every crop interval, accepted or not, top to bottom.
    pub intervals: Vec<CropInterval>,
}

/// Splits a full-height render into page crops.
#[derive(Clone)]
pub struct PageSlicer {
    finder: CutPointFinder,
    page_width: u32,
    progress: ProgressCallback,
}

impl PageSlicer {
    pub fn new(geometry: PageGeometry, tuning: ScanTuning) -> Self {
        Self {
            finder: CutPointFinder::new(geometry, tuning),
            page_width: geometry.width,
            progress: Arc::new(NoopProgressCallback),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Slice `image` into pages.
    ///
    /// Crops wider than the page are cut at the page width, never scaled. An
    /// empty [`Slicing::pages`] means the whole bitmap was blank; callers must
    /// treat that as fatal rather than emitting an empty document.
    pub fn slice(&self, image: &RgbImage) -> Slicing {
        let height = image.height();
        let crop_width = self.page_width.min(image.width());
        let mut slicing = Slicing::default();
        let mut top = 0;

        while top < height {
            let cut = self.finder.find(image, top);
            let crop = imageops::crop_imm(image, 0, top, crop_width, cut.y - top).to_image();
            let accepted = has_content(&crop);
            let interval = CropInterval {
                top,
                bottom: cut.y,
                kind: cut.kind,
                accepted,
            };

            if accepted {
                debug!(
                    "Page {}: rows {}..{} ({:?})",
                    slicing.pages.len() + 1,
                    top,
                    cut.y,
                    cut.kind
                );
                slicing.pages.push(PageCrop {
                    interval,
                    image: crop,
                });
                self.progress
                    .on_cut(slicing.pages.len(), top, cut.y, cut.kind);
            } else {
                debug!("Dropping blank crop {}..{}", top, cut.y);
                self.progress.on_page_dropped(top, cut.y);
            }

            slicing.intervals.push(interval);
            top = cut.y;
        }

        info!(
            "Sliced {}x{} render into {} page(s) ({} crop(s) examined)",
            image.width(),
            height,
            slicing.pages.len(),
            slicing.intervals.len()
        );
        self.progress.on_pagination_complete(slicing.pages.len());
        slicing
    }
}

/// True when any pixel is darker than pure white in 8-bit luma.
///
/// Luma uses the ITU-R 601-2 weights with the usual fixed-point rounding, so
/// pixels that round to 255 (e.g. `(255, 255, 254)`) count as background.
pub fn has_content(image: &RgbImage) -> bool {
    image.pixels().any(|&Rgb(px)| luma(px) < u8::MAX)
}

fn luma([r, g, b]: [u8; 3]) -> u8 {
    let weighted = r as u32 * 19_595 + g as u32 * 38_470 + b as u32 * 7_471 + 0x8000;
    (weighted >> 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slicer() -> PageSlicer {
        PageSlicer::new(PageGeometry::default(), ScanTuning::default())
    }

    fn white(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    #[test]
    fn luma_of_extremes() {
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 255, 254]), 255);
        assert!(luma([250, 250, 250]) < 255);
    }

    #[test]
    fn has_content_detects_single_pixel() {
        let mut img = white(50, 50);
        assert!(!has_content(&img));
        img.put_pixel(49, 49, Rgb([200, 200, 200]));
        assert!(has_content(&img));
    }

    #[test]
    fn short_image_yields_one_full_page() {
        let mut img = white(1240, 900);
        img.put_pixel(10, 10, Rgb([0, 0, 0]));
        let slicing = slicer().slice(&img);
        assert_eq!(slicing.pages.len(), 1);
        let page = &slicing.pages[0];
        assert_eq!(page.interval.kind, CutKind::FinalPage);
        assert_eq!((page.interval.top, page.interval.bottom), (0, 900));
        assert_eq!(page.image, img);
    }

    #[test]
    fn wide_image_is_cropped_not_scaled() {
        let mut img = white(2000, 500);
        img.put_pixel(1500, 100, Rgb([0, 0, 0]));
        img.put_pixel(5, 5, Rgb([0, 0, 0]));
        let slicing = slicer().slice(&img);
        assert_eq!(slicing.pages.len(), 1);
        assert_eq!(slicing.pages[0].image.dimensions(), (1240, 500));
        assert_eq!(*slicing.pages[0].image.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn blank_image_yields_no_pages_but_full_coverage() {
        let img = white(1240, 5000);
        let slicing = slicer().slice(&img);
        assert!(slicing.pages.is_empty());
        assert_eq!(slicing.intervals.first().map(|i| i.top), Some(0));
        assert_eq!(slicing.intervals.last().map(|i| i.bottom), Some(5000));
        assert!(slicing.intervals.iter().all(|i| !i.accepted));
    }

    #[test]
    fn intervals_are_contiguous() {
        let mut img = white(1240, 6000);
        for y in (0..6000).step_by(37) {
            img.put_pixel(600, y, Rgb([0, 0, 0]));
        }
        let slicing = slicer().slice(&img);
        for pair in slicing.intervals.windows(2) {
            assert_eq!(pair[0].bottom, pair[1].top);
        }
        assert!(slicing.intervals.iter().all(|i| i.height() > 0));
    }

    #[test]
    fn empty_image_yields_nothing() {
        let img = RgbImage::new(1240, 0);
        let slicing = slicer().slice(&img);
        assert!(slicing.pages.is_empty());
        assert!(slicing.intervals.is_empty());
    }

    #[test]
    fn zero_page_height_terminates() {
        let geometry = PageGeometry { width: 1240, height: 0 };
        let mut img = white(1240, 300);
        img.put_pixel(600, 150, Rgb([0, 0, 0]));
        let slicing = PageSlicer::new(geometry, ScanTuning::default()).slice(&img);
        assert_eq!(slicing.intervals.len(), 300);
        assert_eq!(slicing.intervals.last().map(|i| i.bottom), Some(300));
        assert_eq!(slicing.pages.len(), 1);
        assert_eq!(slicing.pages[0].interval.top, 150);
    }
}
