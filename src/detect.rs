//! Plate candidate detection: preprocessing, contour search, crop.

use image::{imageops, GrayImage, RgbImage};
use imageproc::contours::find_contours;
use imageproc::contrast::{adaptive_threshold, otsu_level, threshold, ThresholdType};
use imageproc::edges::canny;
use imageproc::filter::{bilateral_filter, gaussian_blur_f32};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use imageproc::rect::Rect;

use std::cmp::Ordering;

// Equivalent of a 5x5 Gaussian kernel
const BLUR_SIGMA: f32 = 1.1;
// 11x11 neighbourhood for the adaptive threshold
const ADAPTIVE_BLOCK_RADIUS: u32 = 5;
const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;
const MAX_CONTOURS: usize = 30;
// Polygon simplification tolerance as a fraction of the contour perimeter
const POLY_TOLERANCE: f64 = 0.02;
const BILATERAL_WINDOW: u32 = 11;
const BILATERAL_SIGMA_COLOR: f32 = 17.0;
const BILATERAL_SIGMA_SPATIAL: f32 = 17.0;

/// The single plate region considered for one frame.
pub struct PlateCandidate {
    /// Axis-aligned bounding box of the winning contour, in frame coordinates.
    pub bounds: Rect,
    /// Crop of the thresholded (pre-edge) grayscale image under `bounds`.
    pub plate: GrayImage,
}

/// Search one frame for a plate-shaped region.
///
/// Grayscale, blur, adaptive threshold and Canny produce an edge map; among
/// the 30 largest contours of that map, the first one (by descending area)
/// whose simplified polygon has exactly 4 vertices wins. Returns `None` when
/// no contour qualifies, which is the normal outcome for most frames.
pub fn detect_plate(frame: &RgbImage) -> Option<PlateCandidate> {
    let gray = imageops::grayscale(frame);
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    let binary = adaptive_threshold(&blurred, ADAPTIVE_BLOCK_RADIUS);
    let edges = canny(&binary, CANNY_LOW, CANNY_HIGH);

    // Flat hierarchy: parent links from find_contours are ignored.
    let mut contours: Vec<(f64, Vec<Point<i32>>)> = find_contours::<i32>(&edges)
        .into_iter()
        .map(|c| (contour_area(&c.points), c.points))
        .collect();
    contours.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    contours.truncate(MAX_CONTOURS);

    for (_, points) in &contours {
        let perimeter = arc_length(points, true);
        let approx = approximate_polygon_dp(points, POLY_TOLERANCE * perimeter, true);
        if approx.len() == 4 {
            // Bounding box of the full contour, not of the simplified polygon.
            let bounds = bounding_rect(points)?;
            let plate = imageops::crop_imm(
                &binary,
                bounds.left() as u32,
                bounds.top() as u32,
                bounds.width(),
                bounds.height(),
            )
            .to_image();
            return Some(PlateCandidate { bounds, plate });
        }
    }
    None
}

/// Denoise a plate crop and binarize it with an Otsu-selected level.
pub fn binarize_plate(plate: &GrayImage) -> GrayImage {
    let denoised = bilateral_filter(
        plate,
        BILATERAL_WINDOW,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPATIAL,
    );
    let level = otsu_level(&denoised);
    threshold(&denoised, level, ThresholdType::Binary)
}

// Shoelace formula over the closed contour.
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        sum += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    sum.abs() as f64 / 2.0
}

fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y) = (first.x, first.y);
    let (mut max_x, mut max_y) = (first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let width = (max_x - min_x + 1) as u32;
    let height = (max_y - min_y + 1) as u32;
    Some(Rect::at(min_x, min_y).of_size(width, height))
}

#[cfg(test)]
mod test {
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;

    use super::*;

    // Detected boxes may sit a few pixels off the drawn region because the
    // blur and the adaptive threshold both smear the boundary.
    const TOLERANCE: i32 = 12;

    fn frame_with_plate(x: i32, y: i32, width: u32, height: u32) -> RgbImage {
        let mut frame = RgbImage::new(640, 480);
        draw_filled_rect_mut(
            &mut frame,
            Rect::at(x, y).of_size(width, height),
            Rgb([255, 255, 255]),
        );
        frame
    }

    #[test]
    fn blank_frame_has_no_candidate() {
        let frame = RgbImage::new(640, 480);
        assert!(detect_plate(&frame).is_none());
    }

    #[test]
    fn detects_synthetic_plate_region() {
        let frame = frame_with_plate(100, 100, 200, 50);
        let candidate = detect_plate(&frame).expect("no candidate found on synthetic frame");
        let bounds = candidate.bounds;
        assert!((bounds.left() - 100).abs() <= TOLERANCE, "left = {}", bounds.left());
        assert!((bounds.top() - 100).abs() <= TOLERANCE, "top = {}", bounds.top());
        let right = bounds.left() + bounds.width() as i32;
        let bottom = bounds.top() + bounds.height() as i32;
        assert!((right - 300).abs() <= TOLERANCE, "right = {}", right);
        assert!((bottom - 150).abs() <= TOLERANCE, "bottom = {}", bottom);
        assert_eq!(candidate.plate.dimensions(), (bounds.width(), bounds.height()));
    }

    #[test]
    fn detection_is_deterministic() {
        let frame = frame_with_plate(100, 100, 200, 50);
        let first = detect_plate(&frame).expect("no candidate on first run");
        let second = detect_plate(&frame).expect("no candidate on second run");
        assert_eq!(first.bounds, second.bounds);
        assert_eq!(first.plate.as_raw(), second.plate.as_raw());
    }

    #[test]
    fn contour_area_of_square() {
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        assert_eq!(contour_area(&square), 100.0);
    }

    #[test]
    fn bounding_rect_spans_all_points() {
        let points = vec![Point::new(4, 7), Point::new(20, 3), Point::new(12, 15)];
        let rect = bounding_rect(&points).unwrap();
        assert_eq!(rect, Rect::at(4, 3).of_size(17, 13));
    }

    #[test]
    fn bounding_rect_of_nothing() {
        assert!(bounding_rect(&[]).is_none());
    }
}
