//! Cut-point search: where should the current page end?
//!
//! Given the top of the current page, the hard limit is one page height
//! further down (or the bottom of the bitmap). Rather than slicing blindly at
//! that limit, the rows above it are scanned upward, every [`ScanTuning::step`]
//! pixels, looking for a uniform row to cut on.
//!
//! The scan is a fold over `limit, limit - step, …` down to (but excluding)
//! `max(top + min_page_height, limit - lookback)`. Each uniform row replaces
//! the previous candidate, so the row that wins is the *topmost* uniform row
//! in the window, not the one nearest the ideal page boundary. It produces
//! shorter pages than strictly necessary when a page ends in a long stretch
//! of blank rows, up to `lookback` pixels early.
//!
//! The scan deliberately does not stop at the first blank row below the
//! limit. Short-circuiting there keeps pages near full height but changes
//! where every cut lands; the full fold is the documented behaviour.

use super::row::{RowClass, RowClassifier};
use crate::config::{PageGeometry, ScanTuning};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// How a cut was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutKind {
    /// The limit reached the bottom of the bitmap; no scan was needed.
    FinalPage,
    /// Cut on a blank row found by the scan.
    Blank,
    /// Cut on a uniform non-white row (table border, rule).
    Border,
    /// No uniform row in the window; cut at the hard limit.
    HardLimit,
}

/// A chosen cut: the page ends just above row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutPoint {
    pub y: u32,
    pub kind: CutKind,
}

/// Finds cut points in one bitmap.
#[derive(Debug, Clone, Copy)]
pub struct CutPointFinder {
    classifier: RowClassifier,
    page_height: u32,
    tuning: ScanTuning,
}

impl CutPointFinder {
    pub fn new(geometry: PageGeometry, tuning: ScanTuning) -> Self {
        Self {
            classifier: RowClassifier::new(tuning, geometry.width),
            page_height: geometry.height,
            tuning,
        }
    }

    /// Choose where the page starting at `top` ends.
    ///
    /// The returned `y` is always greater than `top` when `top` lies inside
    /// the image, and never greater than the image height.
    pub fn find(&self, image: &RgbImage, top: u32) -> CutPoint {
        let height = image.height();
        // A zero page height would never advance past `top`.
        let limit = top.saturating_add(self.page_height.max(1)).min(height);

        if limit == height {
            return CutPoint {
                y: limit,
                kind: CutKind::FinalPage,
            };
        }

        let scan_end = top
            .saturating_add(self.tuning.min_page_height)
            .max(limit.saturating_sub(self.tuning.lookback));

        let last_uniform = scan_rows(limit, scan_end, self.tuning.step).fold(None, |found, y| {
            match self.classifier.classify(image, y) {
                RowClass::Content => found,
                class => Some((y, class)),
            }
        });

        match last_uniform {
            Some((y, RowClass::Blank)) => CutPoint {
                y,
                kind: CutKind::Blank,
            },
            Some((y, _)) => CutPoint {
                y,
                kind: CutKind::Border,
            },
            None => CutPoint {
                y: limit,
                kind: CutKind::HardLimit,
            },
        }
    }
}

/// Rows `limit, limit - step, …` strictly above `scan_end`. Empty when
/// `scan_end >= limit`.
fn scan_rows(limit: u32, scan_end: u32, step: u32) -> impl Iterator<Item = u32> {
    (scan_end.saturating_add(1)..=limit)
        .rev()
        .step_by(step.max(1) as usize)
}
