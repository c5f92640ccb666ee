//! Live license plate detection and OCR.
//!
//! One frame at a time: find a rectangular contour, crop and binarize it,
//! read it with tesseract, annotate the frame. No state survives between
//! frames.

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing;
use imageproc::rect::Rect;
use log::warn;

pub mod capture;
pub mod detect;
#[cfg(feature = "display-window")]
pub mod display;
pub mod error;
pub mod ocr;

use capture::CaptureSource;
use error::PlateError;
use ocr::OcrEngine;

const FONT_DATA: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");
const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_SCALE: f32 = 24.0;

/// One successful detection: where the plate sits and what it read as.
/// The text may be empty when OCR produced nothing usable.
pub struct Detection {
    pub bounds: Rect,
    pub text: String,
}

/// Per-frame processor. Stateless across frames.
pub struct PlateReader {
    ocr: OcrEngine,
    font: FontRef<'static>,
}

impl PlateReader {

    /// Fails only when the embedded annotation font cannot be parsed.
    pub fn new(ocr: OcrEngine) -> Result<Self, PlateError> {
        let font = FontRef::try_from_slice(FONT_DATA)?;
        Ok(PlateReader { ocr, font })
    }

    /// Process one captured frame into a frame for display and, when a plate
    /// candidate was found, the recognized text.
    ///
    /// When nothing qualifies the input frame is returned untouched; that is
    /// the normal case, not an error.
    pub fn process(&self, frame: &RgbImage) -> Result<(RgbImage, Option<Detection>), PlateError> {
        let candidate = match detect::detect_plate(frame) {
            Some(candidate) => candidate,
            None => return Ok((frame.clone(), None)),
        };
        let plate = detect::binarize_plate(&candidate.plate);
        let text = self.ocr.recognize(&plate)?;
        let mut annotated = frame.clone();
        draw_detection(&mut annotated, candidate.bounds, &text, &self.font);
        let detection = Detection {
            bounds: candidate.bounds,
            text,
        };
        Ok((annotated, Some(detection)))
    }
}

fn draw_detection(frame: &mut RgbImage, bounds: Rect, text: &str, font: &FontRef<'_>) {
    drawing::draw_hollow_rect_mut(frame, bounds, BOX_COLOR);
    // Text sits above and left of the box, clamped to the frame.
    let x = (bounds.left() - 100).max(0);
    let y = (bounds.top() - 20).max(0);
    drawing::draw_text_mut(
        frame,
        TEXT_COLOR,
        x,
        y,
        PxScale::from(TEXT_SCALE),
        font,
        text,
    );
}

/// Capture frames from `source` and hand each to `handler` until the source
/// fails or the handler asks to stop.
///
/// A failed capture ends the run: it is logged and the loop exits normally,
/// with no retry. Processing errors from the handler propagate.
pub fn run<S, F>(source: &mut S, mut handler: F) -> Result<(), PlateError>
where
    S: CaptureSource,
    F: FnMut(RgbImage) -> Result<bool, PlateError>,
{
    loop {
        let frame = match source.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("frame capture failed, stopping: {}", e);
                break;
            }
        };
        if !handler(frame)? {
            break;
        }
    }
    Ok(())
}
