//! Frame acquisition from a V4L2 camera device.

use image::{ImageFormat, RgbImage};
use log::info;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::error::PlateError;

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;
const BUFFER_COUNT: u32 = 4;

/// A source of frames for the processing loop.
pub trait CaptureSource {
    /// Capture a single frame. An error here ends the run.
    fn capture_frame(&mut self) -> Result<RgbImage, PlateError>;

    /// Resolution of captured frames.
    fn resolution(&self) -> (u32, u32);
}

/// Webcam streaming over memory-mapped V4L2 buffers.
///
/// Both the device and the stream close on drop, so the camera handle is
/// released on every exit path.
pub struct Webcam {
    stream: Stream<'static>,
    _dev: Device,
    fourcc: FourCC,
    width: u32,
    height: u32,
}

impl Webcam {

    /// Open the camera at `index` (`/dev/video<index>`) and negotiate a
    /// 640x480 format, preferring MJPG and falling back to raw YUYV.
    pub fn open(index: usize) -> Result<Self, PlateError> {
        let dev = Device::new(index)?;
        let mut fmt = dev.format()?;
        fmt.width = CAPTURE_WIDTH;
        fmt.height = CAPTURE_HEIGHT;
        fmt.fourcc = FourCC::new(b"MJPG");
        let mut fmt = dev.set_format(&fmt)?;
        if fmt.fourcc != FourCC::new(b"MJPG") {
            fmt.fourcc = FourCC::new(b"YUYV");
            fmt = dev.set_format(&fmt)?;
            if fmt.fourcc != FourCC::new(b"YUYV") {
                return Err(PlateError::capture(format!(
                    "device {} offers neither MJPG nor YUYV (got {})",
                    index, fmt.fourcc
                )));
            }
        }
        info!(
            "camera {}: {}x{} {}",
            index, fmt.width, fmt.height, fmt.fourcc
        );
        let stream = Stream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT)?;
        Ok(Webcam {
            stream,
            _dev: dev,
            fourcc: fmt.fourcc,
            width: fmt.width,
            height: fmt.height,
        })
    }
}

impl CaptureSource for Webcam {
    fn capture_frame(&mut self) -> Result<RgbImage, PlateError> {
        let fourcc = self.fourcc;
        let (width, height) = (self.width, self.height);
        let (buf, meta) = self.stream.next()?;
        let bytes = &buf[..(meta.bytesused as usize).min(buf.len())];
        if bytes.is_empty() {
            return Err(PlateError::capture("driver returned an empty frame"));
        }
        match &fourcc.repr {
            b"MJPG" => {
                let frame = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
                Ok(frame.to_rgb8())
            }
            b"YUYV" => yuyv_to_rgb(bytes, width, height),
            other => Err(PlateError::capture(format!(
                "unsupported pixel format {:?}",
                other
            ))),
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

// ITU-R BT.601 conversion, two pixels per YUYV quad.
fn yuyv_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage, PlateError> {
    let expected = (width * height * 2) as usize;
    if data.len() < expected {
        return Err(PlateError::capture(format!(
            "short YUYV frame: {} bytes, expected {}",
            data.len(),
            expected
        )));
    }
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for quad in data[..expected].chunks_exact(4) {
        let (y0, u, y1, v) = (
            quad[0] as i32,
            quad[1] as i32,
            quad[2] as i32,
            quad[3] as i32,
        );
        let d = u - 128;
        let e = v - 128;
        for &y in &[y0, y1] {
            let c = y - 16;
            rgb.push(clamp((298 * c + 409 * e + 128) >> 8));
            rgb.push(clamp((298 * c - 100 * d - 208 * e + 128) >> 8));
            rgb.push(clamp((298 * c + 516 * d + 128) >> 8));
        }
    }
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| PlateError::capture("YUYV conversion produced a missized buffer"))
}

fn clamp(v: i32) -> u8 {
    v.max(0).min(255) as u8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yuyv_mid_gray() {
        // Y=128, U=V=128 is a neutral gray.
        let data = vec![128u8; 2 * 2 * 2];
        let rgb = yuyv_to_rgb(&data, 2, 2).unwrap();
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [130, 130, 130]);
        }
    }

    #[test]
    fn yuyv_black_and_white() {
        // One quad: both pixels at Y=16 (black), one at Y=235 (white).
        let black = yuyv_to_rgb(&[16, 128, 16, 128], 2, 1).unwrap();
        assert_eq!(black.get_pixel(0, 0).0, [0, 0, 0]);
        let white = yuyv_to_rgb(&[235, 128, 235, 128], 2, 1).unwrap();
        assert_eq!(white.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn yuyv_rejects_short_buffer() {
        assert!(yuyv_to_rgb(&[0u8; 10], 640, 480).is_err());
    }
}
