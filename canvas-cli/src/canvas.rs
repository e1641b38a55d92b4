//! # Headless canvas
//!
//! In-memory ARGB surface implementing [`Runtime`], so scripts can be run
//! without a window and the result written out as a PPM image.

use canvas_vm::{Color, Error, ErrorKind, Result, Runtime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::path::Path;

/// Base lattice spacing of the noise field, in pixels
const NOISE_SCALE: f64 = 512.0;

/// Largest accepted width or height
pub const MAX_DIMENSION: u32 = 8192;

/// Frequency multiplier and weight of each noise octave
const OCTAVES: [(f64, f64); 3] = [(2.0, 0.7), (4.0, 0.2), (8.0, 0.1)];

pub struct HeadlessCanvas {
    width: i32,
    height: i32,
    pixels: Vec<Color>,
    seed: u64,
    rng: StdRng,
    texts: usize,
    redraws: usize,
}

impl HeadlessCanvas {
    /// Create a canvas filled with transparent black. Without a seed,
    /// noise and random numbers differ from run to run.
    pub fn new(width: u32, height: u32, seed: Option<u64>) -> Result<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                format!(
                    "canvas {}x{} exceeds the {}x{} limit",
                    width, height, MAX_DIMENSION, MAX_DIMENSION
                ),
            )
            .with_operation("canvas::new"));
        }

        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        Ok(Self {
            width: width as i32,
            height: height as i32,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
            seed,
            rng: StdRng::seed_from_u64(seed),
            texts: 0,
            redraws: 0,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of text runs requested so far
    pub fn texts(&self) -> usize {
        self.texts
    }

    pub fn redraws(&self) -> usize {
        self.redraws
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Binary PPM (P6); alpha is dropped
    pub fn write_ppm(&self, out: &mut impl Write) -> Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut body = Vec::with_capacity(self.pixels.len() * 3);
        for c in &self.pixels {
            body.extend_from_slice(&[c.r, c.g, c.b]);
        }
        out.write_all(&body)?;
        Ok(())
    }

    pub fn save_ppm(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = std::fs::File::create(path).map_err(|e| {
            Error::new(ErrorKind::IoFailed, format!("failed to create {}", path.display()))
                .with_operation("canvas::save_ppm")
                .set_source(e)
        })?;
        self.write_ppm(&mut file)?;
        tracing::info!(path = %path.display(), "image saved");
        Ok(())
    }

    /// Value noise at a lattice resolution of `frequency / NOISE_SCALE`, in [0, 1]
    fn value_noise(&self, x: f64, y: f64, octave: u64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = smooth(x - x0);
        let ty = smooth(y - y0);
        let (ix, iy) = (x0 as i64, y0 as i64);

        let corner = |dx: i64, dy: i64| lattice(self.seed ^ octave, ix + dx, iy + dy);
        let top = lerp(corner(0, 0), corner(1, 0), tx);
        let bottom = lerp(corner(0, 1), corner(1, 1), tx);
        lerp(top, bottom, ty)
    }
}

fn smooth(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hash a lattice point to [0, 1]
fn lattice(seed: u64, x: i64, y: i64) -> f64 {
    let mut h = seed
        .wrapping_add((x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
    h ^= h >> 30;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    (h >> 11) as f64 / (1u64 << 53) as f64
}

impl Runtime for HeadlessCanvas {
    fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let x0 = x.clamp(0, self.width);
        let y0 = y.clamp(0, self.height);
        let x1 = x.saturating_add(w.max(0)).clamp(0, self.width);
        let y1 = y.saturating_add(h.max(0)).clamp(0, self.height);
        for row in y0..y1 {
            let start = row as usize * self.width as usize;
            self.pixels[start + x0 as usize..start + x1 as usize].fill(color);
        }
    }

    fn write_text(&mut self, x: i32, y: i32, size: i32, text: &str, color: Color) {
        self.texts += 1;
        tracing::info!(x, y, size, color = %color, "text: {}", text);
    }

    fn get_pixel(&self, x: i32, y: i32) -> Color {
        self.pixel(x, y).unwrap_or(Color::TRANSPARENT)
    }

    fn noise(&mut self, x: i32, y: i32) -> i32 {
        let value: f64 = OCTAVES
            .iter()
            .enumerate()
            .map(|(octave, &(frequency, weight))| {
                let scale = frequency / NOISE_SCALE;
                weight * self.value_noise(x as f64 * scale, y as f64 * scale, octave as u64)
            })
            .sum();
        (value * 255.0).round().clamp(0.0, 255.0) as i32
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn random(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
        tracing::debug!(redraws = self.redraws, "redraw");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_canvas_is_transparent() {
        let canvas = HeadlessCanvas::new(4, 3, Some(1)).unwrap();
        assert_eq!(canvas.width(), 4);
        assert_eq!(canvas.height(), 3);
        assert_eq!(canvas.pixel(3, 2), Some(Color::TRANSPARENT));
        assert_eq!(canvas.pixel(4, 0), None);
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let err = HeadlessCanvas::new(100_000, 100_000, Some(1)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(HeadlessCanvas::new(MAX_DIMENSION + 1, 1, Some(1)).is_err());
        assert!(HeadlessCanvas::new(1, MAX_DIMENSION, Some(1)).is_ok());
    }

    #[test]
    fn test_fill_and_pixel() {
        let mut canvas = HeadlessCanvas::new(4, 4, Some(1)).unwrap();
        canvas.fill(Color::WHITE);
        canvas.draw_pixel(1, 2, Color::BLACK);
        canvas.draw_pixel(-1, 2, Color::BLACK);
        canvas.draw_pixel(1, 99, Color::BLACK);

        assert_eq!(canvas.get_pixel(1, 2), Color::BLACK);
        assert_eq!(canvas.get_pixel(0, 0), Color::WHITE);
        assert_eq!(canvas.get_pixel(-5, 0), Color::TRANSPARENT);
    }

    #[test]
    fn test_rect_is_clipped() {
        let mut canvas = HeadlessCanvas::new(4, 4, Some(1)).unwrap();
        let red = Color::rgb(255, 0, 0);
        canvas.draw_rect(2, -1, 10, 2, red);

        assert_eq!(canvas.get_pixel(2, 0), red);
        assert_eq!(canvas.get_pixel(3, 0), red);
        assert_eq!(canvas.get_pixel(1, 0), Color::TRANSPARENT);
        assert_eq!(canvas.get_pixel(2, 1), Color::TRANSPARENT);
    }

    #[test]
    fn test_negative_rect_draws_nothing() {
        let mut canvas = HeadlessCanvas::new(4, 4, Some(1)).unwrap();
        canvas.draw_rect(1, 1, -2, 3, Color::WHITE);
        assert!((0..4).all(|x| (0..4).all(|y| canvas.get_pixel(x, y) == Color::TRANSPARENT)));
    }

    #[test]
    fn test_text_is_counted() {
        let mut canvas = HeadlessCanvas::new(4, 4, Some(1)).unwrap();
        canvas.write_text(0, 0, 12, "hello", Color::WHITE);
        assert_eq!(canvas.texts(), 1);
        assert_eq!(canvas.get_pixel(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn test_noise_is_seeded() {
        let mut a = HeadlessCanvas::new(8, 8, Some(42)).unwrap();
        let mut b = HeadlessCanvas::new(8, 8, Some(42)).unwrap();
        let first: Vec<i32> = (0..50).map(|i| a.noise(i * 13, i * 7)).collect();
        let second: Vec<i32> = (0..50).map(|i| b.noise(i * 13, i * 7)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_degenerate_range() {
        let mut canvas = HeadlessCanvas::new(1, 1, Some(3)).unwrap();
        assert_eq!(canvas.random(5, 5), 5);
        assert_eq!(canvas.random(9, 2), 9);
    }

    #[test]
    fn test_write_ppm() {
        let mut canvas = HeadlessCanvas::new(2, 1, Some(1)).unwrap();
        canvas.draw_pixel(1, 0, Color::rgb(1, 2, 3));
        let mut out = Vec::new();
        canvas.write_ppm(&mut out).unwrap();

        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 1, 2, 3]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_save_ppm() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out.ppm");
        let canvas = HeadlessCanvas::new(3, 3, Some(1)).unwrap();
        canvas.save_ppm(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), "P6\n3 3\n255\n".len() + 27);
    }

    #[test]
    fn test_save_ppm_missing_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let canvas = HeadlessCanvas::new(1, 1, Some(1)).unwrap();
        let err = canvas.save_ppm(temp.path().join("nope").join("out.ppm")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailed);
    }

    #[test]
    fn test_redraw_counter() {
        let mut canvas = HeadlessCanvas::new(1, 1, None).unwrap();
        canvas.request_redraw();
        canvas.request_redraw();
        assert_eq!(canvas.redraws(), 2);
    }

    proptest! {
        #[test]
        fn prop_noise_in_byte_range(seed: u64, x in -10_000i32..10_000, y in -10_000i32..10_000) {
            let mut canvas = HeadlessCanvas::new(1, 1, Some(seed)).unwrap();
            let n = canvas.noise(x, y);
            prop_assert!((0..=255).contains(&n));
        }

        #[test]
        fn prop_random_in_half_open_range(seed: u64, min in -1000i32..1000, span in 1i32..1000) {
            let mut canvas = HeadlessCanvas::new(1, 1, Some(seed)).unwrap();
            let n = canvas.random(min, min + span);
            prop_assert!(n >= min && n < min + span);
        }
    }
}
