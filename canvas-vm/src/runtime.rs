//! # Runtime capability
//!
//! The drawing and query operations the interpreter invokes. The raster
//! surface, window, noise and random sources live behind this trait.

use crate::color::Color;
use std::collections::HashMap;

pub trait Runtime {
    fn fill(&mut self, color: Color);
    fn draw_pixel(&mut self, x: i32, y: i32, color: Color);
    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color);
    fn write_text(&mut self, x: i32, y: i32, size: i32, text: &str, color: Color);
    fn get_pixel(&self, x: i32, y: i32) -> Color;
    /// Noise value in `[0, 255]`
    fn noise(&mut self, x: i32, y: i32) -> i32;
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn random(&mut self, min: i32, max: i32) -> i32;
    /// Ask the host to present the surface
    fn request_redraw(&mut self);
}

/// A side effect observed by [`RecordingRuntime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fill(Color),
    DrawPixel { x: i32, y: i32, color: Color },
    DrawRect { x: i32, y: i32, w: i32, h: i32, color: Color },
    WriteText { x: i32, y: i32, size: i32, text: String, color: Color },
    Redraw,
}

/// Runtime that records every side effect and answers queries from fixed
/// values. Useful for tests and for dry runs.
#[derive(Debug, Clone)]
pub struct RecordingRuntime {
    pub width: i32,
    pub height: i32,
    /// Returned by `noise` for every coordinate
    pub noise_value: i32,
    /// `random` returns `min` when unset
    pub random_value: Option<i32>,
    pixels: HashMap<(i32, i32), Color>,
    calls: Vec<Call>,
}

impl RecordingRuntime {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            noise_value: 0,
            random_value: None,
            pixels: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// Preset the colour returned by `get_pixel`
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.pixels.insert((x, y), color);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls other than redraw requests
    pub fn drawing_calls(&self) -> Vec<&Call> {
        self.calls.iter().filter(|c| **c != Call::Redraw).collect()
    }

    pub fn redraws(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Redraw).count()
    }
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl Runtime for RecordingRuntime {
    fn fill(&mut self, color: Color) {
        self.calls.push(Call::Fill(color));
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.pixels.insert((x, y), color);
        self.calls.push(Call::DrawPixel { x, y, color });
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        self.calls.push(Call::DrawRect { x, y, w, h, color });
    }

    fn write_text(&mut self, x: i32, y: i32, size: i32, text: &str, color: Color) {
        self.calls.push(Call::WriteText {
            x,
            y,
            size,
            text: text.to_string(),
            color,
        });
    }

    fn get_pixel(&self, x: i32, y: i32) -> Color {
        self.pixels.get(&(x, y)).copied().unwrap_or(Color::TRANSPARENT)
    }

    fn noise(&mut self, _x: i32, _y: i32) -> i32 {
        self.noise_value
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn random(&mut self, min: i32, _max: i32) -> i32 {
        self.random_value.unwrap_or(min)
    }

    fn request_redraw(&mut self) {
        self.calls.push(Call::Redraw);
    }
}
