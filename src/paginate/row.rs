//! Row classification: is a horizontal pixel row a safe place to cut?
//!
//! A row is sampled at fixed horizontal steps across its central span and each
//! sample reduced to its brightness (sum of R, G and B, 0–765). Rows whose
//! samples all stay within [`ScanTuning::tolerance`] of the first one are
//! *uniform*: either blank paper or a full-width rule such as a table border.
//! Anything else carries content and must not be cut through.

use crate::config::ScanTuning;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Classification of a single pixel row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowClass {
    /// Uniform and near-white.
    Blank,
    /// Uniform but darker than the blank threshold (gridline, rule, band).
    Border,
    /// Samples disagree: text or graphics cross this row.
    Content,
}

impl RowClass {
    /// Blank and border rows are both admissible cut points.
    pub fn is_uniform(self) -> bool {
        !matches!(self, RowClass::Content)
    }
}

/// Classifies rows of one bitmap, sampling at most `span` pixels wide.
#[derive(Debug, Clone, Copy)]
pub struct RowClassifier {
    tuning: ScanTuning,
    span: u32,
}

impl RowClassifier {
    /// `span` is the page width; samples never reach past it even when the
    /// source bitmap is wider.
    pub fn new(tuning: ScanTuning, span: u32) -> Self {
        Self { tuning, span }
    }

    /// Classify row `y`. Rows outside the image are reported as
    /// [`RowClass::Content`] so they can never be chosen as a cut.
    pub fn classify(&self, image: &RgbImage, y: u32) -> RowClass {
        if y >= image.height() || image.width() == 0 {
            return RowClass::Content;
        }

        let mut samples = self
            .sample_columns(image.width())
            .map(|x| brightness(image.get_pixel(x, y).0));

        let Some(first) = samples.next() else {
            return RowClass::Content;
        };

        let tolerance = self.tuning.tolerance;
        if samples.any(|b| b.abs_diff(first) > tolerance) {
            RowClass::Content
        } else if first > self.tuning.blank_brightness {
            RowClass::Blank
        } else {
            RowClass::Border
        }
    }

    /// Sampled x positions: `margin, margin + stride, …` strictly below
    /// `min(span, width) - margin`. Bitmaps too narrow for the margins are
    /// sampled across their full width instead.
    fn sample_columns(&self, width: u32) -> std::iter::StepBy<std::ops::Range<u32>> {
        let right = self.span.min(width);
        let margin = self.tuning.edge_margin;
        let stride = self.tuning.sample_stride.max(1) as usize;
        let inner = margin..right.saturating_sub(margin);
        if inner.is_empty() {
            (0..right).step_by(stride)
        } else {
            inner.step_by(stride)
        }
    }
}

/// Sum of the three channels (0–765 for 8-bit RGB).
pub fn brightness([r, g, b]: [u8; 3]) -> u16 {
    r as u16 + g as u16 + b as u16
}
