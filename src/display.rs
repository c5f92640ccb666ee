//! Live annotated-frame window and quit-key polling, over SDL2.

use image::RgbImage;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::Canvas;
use sdl2::video::Window;
use sdl2::EventPump;

use crate::error::PlateError;

pub struct DisplayWindow {
    canvas: Canvas<Window>,
    event_pump: EventPump,
}

impl DisplayWindow {

    pub fn new(title: &str, (width, height): (u32, u32)) -> Result<Self, PlateError> {
        let sdl = sdl2::init().map_err(PlateError::display)?;
        let video = sdl.video().map_err(PlateError::display)?;
        let window = video
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(PlateError::display)?;
        let canvas = window.into_canvas().build().map_err(PlateError::display)?;
        let event_pump = sdl.event_pump().map_err(PlateError::display)?;
        Ok(DisplayWindow { canvas, event_pump })
    }

    /// Push one frame to the window.
    pub fn update(&mut self, frame: &RgbImage) -> Result<(), PlateError> {
        let (width, height) = frame.dimensions();
        let creator = self.canvas.texture_creator();
        let mut texture = creator
            .create_texture_streaming(PixelFormatEnum::RGB24, width, height)
            .map_err(PlateError::display)?;
        texture
            .update(None, frame.as_raw(), (width * 3) as usize)
            .map_err(PlateError::display)?;
        self.canvas.copy(&texture, None, None).map_err(PlateError::display)?;
        self.canvas.present();
        Ok(())
    }

    /// Drain pending window events; true once the user asked to quit
    /// (`q`, ESC or window close). Polled once per loop iteration.
    pub fn poll_quit(&mut self) -> bool {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Q),
                    ..
                }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return true,
                _ => {}
            }
        }
        false
    }
}
