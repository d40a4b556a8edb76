//! End-to-end pagination properties on synthetic renders.

use bid_report::paginate::{
    has_content, paginate_rgb, write_pdf, CutKind, CutPointFinder, PageCompositor, PageSlicer,
};
use bid_report::{PageGeometry, ReportConfig, ReportError, ScanTuning};
use image::{Rgb, RgbImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GREY: Rgb<u8> = Rgb([128, 128, 128]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

fn slicer() -> PageSlicer {
    PageSlicer::new(PageGeometry::default(), ScanTuning::default())
}

fn white(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, WHITE)
}

/// A row whose first sampled pixel is dark, so it never counts as uniform.
fn mark_content_row(img: &mut RgbImage, y: u32) {
    img.put_pixel(100, y, BLACK);
}

/// 1240×3508, grey band at rows 1750..1760, one black pixel at (600, 3000).
fn banded_render() -> RgbImage {
    let mut img = white(1240, 3508);
    for y in 1750..1760 {
        for x in 0..1240 {
            img.put_pixel(x, y, GREY);
        }
    }
    img.put_pixel(600, 3000, BLACK);
    img
}

#[test]
fn short_render_is_a_single_page() {
    for h in [1, 250, 1753, 1754] {
        let mut img = white(1240, h);
        img.put_pixel(3, 0, BLACK);
        let slicing = slicer().slice(&img);
        assert_eq!(slicing.pages.len(), 1, "height {h}");
        assert_eq!(slicing.pages[0].interval.kind, CutKind::FinalPage);
        assert_eq!(slicing.pages[0].image, img, "height {h}");
    }
}

#[test]
fn crops_tile_the_render_exactly() {
    let mut img = white(1240, 9000);
    for y in (0..9000).step_by(3) {
        mark_content_row(&mut img, y);
    }
    for y in (0..9000).filter(|y| y % 997 < 20) {
        for x in 0..1240 {
            img.put_pixel(x, y, GREY);
        }
    }

    let slicing = slicer().slice(&img);
    let intervals = &slicing.intervals;
    assert_eq!(intervals.first().unwrap().top, 0);
    assert_eq!(intervals.last().unwrap().bottom, 9000);
    for pair in intervals.windows(2) {
        assert_eq!(pair[0].bottom, pair[1].top);
    }
    for interval in intervals {
        assert!(interval.bottom > interval.top);
        assert!(interval.height() <= 1754);
    }
    let accepted = intervals.iter().filter(|i| i.accepted).count();
    assert_eq!(accepted, slicing.pages.len());
}

#[test]
fn blank_row_in_window_beats_hard_limit() {
    let mut img = white(1240, 5000);
    for y in 0..5000 {
        mark_content_row(&mut img, y);
    }
    // Clear one row inside the first window (1154, 1754].
    img.put_pixel(100, 1500, WHITE);

    let finder = CutPointFinder::new(PageGeometry::default(), ScanTuning::default());
    let cut = finder.find(&img, 0);
    assert_eq!(cut.y, 1500);
    assert_eq!(cut.kind, CutKind::Blank);

    // Without it, the hard limit is the only option.
    img.put_pixel(100, 1500, BLACK);
    let cut = finder.find(&img, 0);
    assert_eq!(cut.y, 1754);
    assert_eq!(cut.kind, CutKind::HardLimit);
}

#[test]
fn compositor_preserves_count_and_order() {
    let mut img = white(1240, 5262);
    for y in 0..5262 {
        mark_content_row(&mut img, y);
    }
    for (i, y) in [10u32, 1800, 3600].into_iter().enumerate() {
        img.put_pixel(700, y, Rgb([i as u8 + 1, 0, 0]));
    }

    let slicing = slicer().slice(&img);
    let canvases = PageCompositor::new(PageGeometry::default())
        .compose(&slicing.pages)
        .unwrap();
    assert_eq!(canvases.len(), slicing.pages.len());
    for (canvas, crop) in canvases.iter().zip(&slicing.pages) {
        assert_eq!(canvas.dimensions(), (1240, 1754));
        let top = crop.interval.top;
        for (i, y) in [10u32, 1800, 3600].into_iter().enumerate() {
            if (top..crop.interval.bottom).contains(&y) {
                assert_eq!(canvas.get_pixel(700, y - top)[0], i as u8 + 1);
            }
        }
    }

    assert!(matches!(
        PageCompositor::new(PageGeometry::default()).compose(&[]),
        Err(ReportError::PaginationEmpty { .. })
    ));
}

#[test]
fn banded_render_yields_two_pages() {
    let img = banded_render();
    let slicing = slicer().slice(&img);

    assert_eq!(slicing.pages.len(), 2);
    assert!(slicing.intervals.iter().any(|i| !i.accepted));

    let first = &slicing.pages[0];
    assert!(first.interval.height() <= 1754);
    assert!(first.interval.top <= 1750 && first.interval.bottom >= 1760);
    let band_y = 1750 - first.interval.top;
    assert_eq!(*first.image.get_pixel(600, band_y), GREY);

    let second = &slicing.pages[1];
    assert!((second.interval.top..second.interval.bottom).contains(&3000));
    assert_eq!(second.interval.kind, CutKind::FinalPage);

    let canvases = PageCompositor::new(PageGeometry::default())
        .compose(&slicing.pages)
        .unwrap();
    assert_eq!(*canvases[1].get_pixel(600, 3000 - second.interval.top), BLACK);
    assert!(canvases.iter().all(has_content));
}

#[test]
fn banded_render_pdf_has_two_pages() {
    let pdf = paginate_rgb(&banded_render(), &ReportConfig::default()).unwrap();
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn all_white_render_is_pagination_empty() {
    let err = paginate_rgb(&white(1240, 3508), &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::PaginationEmpty { .. }), "got {err}");
    assert!(err.to_string().contains("1240x3508"));
}

#[test]
fn wide_render_is_cropped_not_scaled() {
    let mut img = white(2000, 900);
    img.put_pixel(1239, 5, BLACK);
    img.put_pixel(1500, 5, BLACK);
    let slicing = slicer().slice(&img);
    assert_eq!(slicing.pages.len(), 1);
    assert_eq!(slicing.pages[0].image.dimensions(), (1240, 900));
    assert_eq!(*slicing.pages[0].image.get_pixel(1239, 5), BLACK);
}

#[test]
fn pdf_writer_rejects_empty_input() {
    assert!(matches!(
        write_pdf(&[], 100.0, 90),
        Err(ReportError::PaginationEmpty { .. })
    ));
}
