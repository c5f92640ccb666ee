use clap::{App, Arg};
use log::info;

use std::error::Error;

use platecam::capture::{CaptureSource, Webcam};
use platecam::ocr::{self, OcrEngine};
use platecam::{run, PlateReader};

#[cfg(feature = "display-window")]
use platecam::display::DisplayWindow;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let matches = App::new("platecam")
        .version("0.1.0")
        .about("Detects license plates in a live camera feed and reads them with tesseract")
        .arg(
            Arg::with_name("DEVICE")
                .help("V4L2 camera device index")
                .index(1),
        )
        .get_matches();
    let device: usize = matches.value_of("DEVICE").unwrap_or("0").parse()?;

    // Fail fast on a missing OCR engine, before touching the camera.
    ocr::resolve_tesseract()?;
    let reader = PlateReader::new(OcrEngine::new())?;

    let mut camera = Webcam::open(device)?;
    let resolution = camera.resolution();
    info!(
        "processing frames from device {} at {}x{}",
        device, resolution.0, resolution.1
    );

    #[cfg(feature = "display-window")]
    let mut window = DisplayWindow::new("License Plate Detection", resolution)?;

    run(&mut camera, |frame| {
        let (annotated, detection) = reader.process(&frame)?;
        if let Some(detection) = &detection {
            println!("License Plate: {}", detection.text);
        }
        #[cfg(feature = "display-window")]
        {
            window.update(&annotated)?;
            if window.poll_quit() {
                return Ok(false);
            }
        }
        #[cfg(not(feature = "display-window"))]
        drop(annotated);
        Ok(true)
    })?;

    Ok(())
}
