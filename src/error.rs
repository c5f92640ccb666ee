use ab_glyph::InvalidFont;
use image::ImageError;
use rusty_tesseract::TessError;

use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

#[derive(Debug)]
pub struct PlateError(PlateErrorKind);

#[derive(Debug)]
pub enum PlateErrorKind {
    IOError(IOError),
    ImageError(ImageError),
    OcrError(TessError),
    FontError(InvalidFont),
    CaptureError(String),
    ConfigError(String),
    DisplayError(String),
}

impl PlateError {
    fn kind(&self) -> &PlateErrorKind {
        &self.0
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self(PlateErrorKind::CaptureError(msg.into()))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self(PlateErrorKind::ConfigError(msg.into()))
    }

    pub fn display(msg: impl fmt::Display) -> Self {
        Self(PlateErrorKind::DisplayError(msg.to_string()))
    }
}

impl<T> From<T> for PlateError
where T: Into<PlateErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for PlateError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            PlateErrorKind::IOError(e) => e.fmt(f),
            PlateErrorKind::ImageError(e) => e.fmt(f),
            PlateErrorKind::OcrError(e) => e.fmt(f),
            PlateErrorKind::FontError(e) => e.fmt(f),
            PlateErrorKind::CaptureError(msg) => write!(f, "capture error: {}", msg),
            PlateErrorKind::ConfigError(msg) => write!(f, "config error: {}", msg),
            PlateErrorKind::DisplayError(msg) => write!(f, "display error: {}", msg),
        }
    }
}

impl Error for PlateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.kind() {
            PlateErrorKind::IOError(e) => e.source(),
            PlateErrorKind::ImageError(e) => e.source(),
            PlateErrorKind::FontError(e) => e.source(),
            _ => None,
        }
    }
}

impl From<IOError> for PlateErrorKind {
    fn from(e: IOError) -> Self {
        Self::IOError(e)
    }
}

impl From<ImageError> for PlateErrorKind {
    fn from(e: ImageError) -> Self {
        Self::ImageError(e)
    }
}

impl From<TessError> for PlateErrorKind {
    fn from(e: TessError) -> Self {
        Self::OcrError(e)
    }
}

impl From<InvalidFont> for PlateErrorKind {
    fn from(e: InvalidFont) -> Self {
        Self::FontError(e)
    }
}
